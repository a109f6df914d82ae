use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::docx::{Block, Document, Paragraph};

static CONTEXT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("valid context field regex"));

// Unknown fields stay in place; `{{TABLE}}` and friends are consumed by later steps.
fn substitute(text: &str, context: &BTreeMap<String, String>) -> Option<String> {
    let mut hit = false;
    let replaced = CONTEXT_FIELD.replace_all(text, |caps: &Captures| match context.get(&caps[1]) {
        Some(value) => {
            hit = true;
            value.clone()
        }
        None => caps[0].to_string(),
    });
    hit.then(|| replaced.into_owned())
}

fn fill_paragraph(paragraph: &mut Paragraph, context: &BTreeMap<String, String>) -> bool {
    let mut touched = false;
    for run in paragraph.runs_mut() {
        if let Some(text) = substitute(&run.text(), context) {
            run.set_text(&text);
            touched = true;
        }
    }
    // A field split across runs collapses the paragraph into its first run's formatting.
    if let Some(text) = substitute(&paragraph.text(), context) {
        paragraph.set_text_keep_style(&text);
        touched = true;
    }
    touched
}

fn fill_blocks(blocks: &mut [Block], context: &BTreeMap<String, String>) -> usize {
    let mut replaced = 0;
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => replaced += usize::from(fill_paragraph(paragraph, context)),
            Block::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        replaced += fill_blocks(&mut cell.blocks, context);
                    }
                }
            }
            Block::Raw(_) => {}
        }
    }
    replaced
}

/// Replaces `{{ key }}` and `{{key}}` in body paragraphs and table cells; returns the paragraphs touched.
pub fn fill_context(doc: &mut Document, context: &BTreeMap<String, String>) -> usize {
    if context.is_empty() {
        debug!("no context fields");
        return 0;
    }
    let replaced = fill_blocks(&mut doc.body, context);
    info!(fields = context.len(), replaced, "filled context fields");
    replaced
}

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::docx::{Block, Document, Paragraph, Table};
use crate::engine::locator::first_table_after;
use crate::error::{EngineError, EngineResult};
use crate::text::{match_key, strip_test_prefix};

pub const TABLE_PLACEHOLDERS: [&str; 4] = ["{{TABLE}}", "{{ TABLE }}", "__TABLE__", "___TABLE_PLACEHOLDER___"];

// Inserted tests are numbered inside this protocol section.
const TEST_SECTION: u32 = 11;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankInsertion {
    pub inserted: usize,
    pub missing: Vec<String>,
}

fn title_pattern(test_title: &str) -> Option<Regex> {
    let word = regex::escape(test_title.trim());
    Regex::new(&format!(r"(?i)^\s*({word})\s*\d+(?:\.\d+)?\.?\s*(.+)$")).ok()
}

fn find_bank_table<'a>(bank: &'a Document, title: &str) -> EngineResult<&'a Table> {
    let key = match_key(&strip_test_prefix(title));
    if key.is_empty() {
        return Err(EngineError::not_found("empty test title"));
    }

    if let Some((_, table)) = bank
        .tables()
        .find(|(_, table)| match_key(&table.text()).contains(&key))
    {
        return Ok(table);
    }

    bank.paragraphs()
        .filter(|(_, paragraph)| match_key(&paragraph.text()).contains(&key))
        .find_map(|(index, _)| first_table_after(bank, index))
        .and_then(|index| bank.table(index))
        .ok_or_else(|| EngineError::not_found(format!("test table \"{title}\" in the test bank")))
}

// Renumbers the first-cell title to "<Test> 11.<number> <rest>" in bold.
pub fn retitle(table: &mut Table, number: usize, config: &EngineConfig) -> bool {
    let Some(pattern) = title_pattern(&config.vocabulary.test_title) else {
        return false;
    };
    let Some(paragraph) = table
        .row_mut(0)
        .and_then(|row| row.cell_mut(0))
        .and_then(|cell| cell.paragraphs_mut().next())
    else {
        return false;
    };

    let current = paragraph.text();
    let Some(caps) = pattern.captures(current.trim()) else {
        return false;
    };
    let title = format!("{} {TEST_SECTION}.{number} {}", &caps[1], caps[2].trim());
    paragraph.set_text_keep_style(&title);
    for run in paragraph.runs_mut() {
        run.set_font(&config.caption.font);
        run.set_bold(true);
    }
    true
}

fn anchor_paragraph(doc: &Document) -> Option<usize> {
    doc.paragraphs()
        .find(|(_, paragraph)| {
            let text = paragraph.text();
            TABLE_PLACEHOLDERS.iter().any(|placeholder| text.contains(placeholder))
        })
        .map(|(index, _)| index)
}

pub fn insert_test_tables(
    doc: &mut Document,
    bank: &Document,
    selected: &[String],
    config: &EngineConfig,
) -> EngineResult<BankInsertion> {
    let mut tables = Vec::new();
    let mut missing = Vec::new();
    for (position, title) in selected.iter().enumerate() {
        match find_bank_table(bank, title) {
            Ok(found) => {
                let mut table = found.clone();
                let renamed = retitle(&mut table, position + 1, config);
                table.set_fixed_layout();
                debug!(title = %title, renamed, "test table taken from bank");
                tables.push(table);
            }
            Err(err) => {
                warn!(title = %title, error = %err, "test table missing from bank");
                missing.push(format!("{title}: {err}"));
            }
        }
    }

    let anchor = anchor_paragraph(doc).ok_or_else(|| {
        EngineError::not_found(format!("test table placeholder ({})", TABLE_PLACEHOLDERS.join(", ")))
    })?;

    let inserted = tables.len();
    let mut blocks = Vec::with_capacity(inserted * 2);
    for (position, table) in tables.into_iter().enumerate() {
        if position > 0 {
            blocks.push(Block::Paragraph(Paragraph::page_break()));
        }
        blocks.push(Block::Table(table));
    }
    doc.remove_block(anchor);
    doc.insert_blocks_at(anchor, blocks);

    info!(inserted, missing = missing.len(), "inserted test tables");
    Ok(BankInsertion { inserted, missing })
}

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{InspectArgs, SplitBudgetArgs};
use crate::commands::load_config;
use crate::docx::{Block, Document, DocxPackage};
use crate::model::TableSummary;
use crate::text::{condense_whitespace, normalize};
use crate::util::write_json_stdout;

const FIRST_ROW_PREVIEW: usize = 80;

fn caption_text(doc: &Document, index: usize, caption_prefix: &str) -> Option<String> {
    let prefix = normalize(caption_prefix);
    doc.body[..index]
        .iter()
        .rev()
        .map_while(Block::as_paragraph)
        .map(|paragraph| paragraph.text())
        .find(|text| !text.trim().is_empty())
        .filter(|text| normalize(text).starts_with(&prefix))
        .map(|text| condense_whitespace(&text))
}

fn preview(text: &str) -> String {
    let condensed = condense_whitespace(text);
    if condensed.chars().count() <= FIRST_ROW_PREVIEW {
        return condensed;
    }
    let cut: String = condensed.chars().take(FIRST_ROW_PREVIEW).collect();
    format!("{cut}…")
}

pub fn summarize_tables(doc: &Document, caption_prefix: &str) -> Vec<TableSummary> {
    doc.tables()
        .enumerate()
        .map(|(ordinal, (index, table))| TableSummary {
            ordinal: ordinal + 1,
            body_index: index,
            caption: caption_text(doc, index, caption_prefix),
            rows: table.rows.len(),
            columns: table.grid_width(),
            first_row: table.rows.first().map(|row| preview(&row.text())).unwrap_or_default(),
        })
        .collect()
}

fn write_text(summaries: &[TableSummary]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Tables: {}", summaries.len())?;
    for summary in summaries {
        writeln!(
            output,
            "#{} body={} rows={} columns={} caption={}",
            summary.ordinal,
            summary.body_index,
            summary.rows,
            summary.columns,
            summary.caption.as_deref().unwrap_or("-"),
        )?;
        writeln!(output, "    {}", summary.first_row)?;
    }
    output.flush()?;
    Ok(())
}

pub fn run(args: InspectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), &SplitBudgetArgs::default())?;
    let package = DocxPackage::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    let summaries = summarize_tables(&package.document, &config.vocabulary.table_caption);
    info!(
        path = %args.input.display(),
        tables = summaries.len(),
        parts = package.part_names().len(),
        "inspected document"
    );

    if args.json {
        write_json_stdout(&summaries)
    } else {
        write_text(&summaries)
    }
}

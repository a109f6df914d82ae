use tracing::{info, warn};

use crate::config::Vocabulary;
use crate::docx::{Block, Document};
use crate::engine::locator::{Keywords, find_caption, first_table_after, header_contains};
use crate::engine::{PlaceholderTable, RowTemplate, find_anchor_row, find_table};
use crate::error::{EngineError, EngineResult};
use crate::model::ReportRow;
use crate::text::{match_key, strip_test_prefix};

pub const REPORT_PLACEHOLDERS: &PlaceholderTable = &[
    ("#T2_TEST", "test"),
    ("#T2_CRIT", "crit"),
    ("#T2_FACT", "fact"),
    ("#T2_EVAL", "eval"),
];

const REPORT_TOKENS: [&str; 4] = ["#T2_TEST", "#T2_CRIT", "#T2_FACT", "#T2_EVAL"];

fn report_key(name: &str) -> String {
    match_key(&strip_test_prefix(name))
}

fn find_report_row<'a>(rows: &'a [ReportRow], selected: &str) -> Option<&'a ReportRow> {
    let key = report_key(selected);
    if key.is_empty() {
        return None;
    }
    rows.iter().find(|row| report_key(&row.test) == key)
}

// Returns the selected tests that have no report row.
pub fn fill_report_table(
    doc: &mut Document,
    vocabulary: &Vocabulary,
    selected: &[String],
    report_rows: &[ReportRow],
) -> EngineResult<Vec<String>> {
    let index = find_table(doc, header_contains(Keywords::all(&vocabulary.report_table)))
        .ok_or_else(|| EngineError::not_found("report summary table"))?;
    let table = doc
        .table_mut(index)
        .ok_or_else(|| EngineError::not_found("report summary table"))?;

    let anchor = match find_anchor_row(table, |row| {
        let cells: Vec<String> = row.cells.iter().map(|cell| cell.text().trim().to_string()).collect();
        REPORT_TOKENS.iter().all(|token| cells.iter().any(|cell| cell.as_str() == *token))
    }) {
        Some(anchor) => anchor,
        None if table.rows.len() >= 2 => {
            warn!("report table has no #T2_* row; reusing its second row");
            1
        }
        None => return Err(EngineError::not_found("report summary template row")),
    };
    let template = RowTemplate::capture(table, anchor, REPORT_PLACEHOLDERS)
        .ok_or_else(|| EngineError::not_found("report summary template row"))?;

    let mut missing = Vec::new();
    let mut chosen = Vec::new();
    for name in selected {
        match find_report_row(report_rows, name) {
            Some(row) => {
                let mut row = row.clone();
                if row.eval.trim().is_empty() {
                    row.eval = vocabulary.default_eval.clone();
                }
                chosen.push(row);
            }
            None => missing.push(name.clone()),
        }
    }

    let blank = ReportRow {
        eval: vocabulary.default_eval.clone(),
        ..ReportRow::default()
    };
    let need = chosen.len().max(1);
    while table.rows.len() - anchor < need {
        table.append_row(template.row().clone());
    }
    for offset in 0..need {
        let Some(row) = table.row_mut(anchor + offset) else {
            break;
        };
        match chosen.get(offset) {
            Some(record) => template.fill(row, record),
            None => template.fill(row, &blank),
        }
    }

    info!(rows = chosen.len(), missing = missing.len(), "filled report summary table");
    Ok(missing)
}

/// Drops blank paragraphs between a numbered caption and its table and keeps the caption with it.
pub fn glue_caption(doc: &mut Document, caption_prefix: &str, number: u32) -> EngineResult<bool> {
    let caption = find_caption(doc, caption_prefix, number)
        .ok_or_else(|| EngineError::not_found(format!("caption of table {number}")))?;
    let Some(table) = first_table_after(doc, caption) else {
        return Ok(false);
    };
    let gap_is_blank = doc.body[caption + 1..table]
        .iter()
        .all(|block| block.as_paragraph().is_some_and(|paragraph| paragraph.is_blank()));
    if !gap_is_blank {
        return Ok(false);
    }

    for _ in caption + 1..table {
        doc.remove_block(caption + 1);
    }
    if let Some(Block::Paragraph(paragraph)) = doc.body.get_mut(caption) {
        paragraph.set_keep_with_next();
    }
    info!(table = number, removed = table - caption - 1, "glued caption to its table");
    Ok(true)
}

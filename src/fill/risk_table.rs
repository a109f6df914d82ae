use tracing::{debug, info};

use crate::docx::{Alignment, Block, Cell, Document};
use crate::engine::locator::{find_anchor_row, row_contains_token};
use crate::engine::{PlaceholderTable, RowGroup, expand_grouped};
use crate::error::{EngineError, EngineResult};
use crate::model::{Grade, RiskRow};
use crate::text::match_key;

use super::records::RiskRecord;

pub const RISK_TEMPLATE_MARKER: &str = "<<T5_RISK>>";

const RISK_PLACEHOLDERS: &PlaceholderTable = &[
    ("<<T5_RISK>>", "risk"),
    ("<<T5_CAUSE>>", "cause"),
];

const RISK_COLUMN: usize = 0;
const CAUSE_COLUMN: usize = 1;
const GRADE_COLUMNS: [usize; 4] = [2, 3, 4, 5];
const TESTS_COLUMN: usize = 6;

// Two paragraphs: letter in the top-left corner, score in the bottom-right.
fn write_diagonal(cell: &mut Cell, grade: &Grade) {
    let template = cell.paragraphs().next().cloned().unwrap_or_default();

    let mut top = template.clone();
    top.set_text_keep_style(&grade.letter);
    top.set_alignment(Alignment::Left);
    top.set_spacing_pt(0.0, 3.0);

    let mut bottom = template;
    bottom.set_text_keep_style(&grade.score);
    bottom.set_alignment(Alignment::Right);
    bottom.set_spacing_pt(36.0, 3.0);

    cell.blocks = vec![Block::Paragraph(top), Block::Paragraph(bottom)];
}

fn test_lines(tests: &[String]) -> Vec<String> {
    tests
        .iter()
        .map(|test| test.trim())
        .filter(|test| !test.is_empty())
        .map(|test| format!("•\t{test}"))
        .collect()
}

fn equal_risk_groups(rows: &[RiskRow]) -> Vec<RowGroup<RiskRecord<'_>>> {
    let mut groups: Vec<RowGroup<RiskRecord<'_>>> = Vec::new();
    let mut last_key: Option<String> = None;
    for row in rows {
        let key = match_key(&row.risk);
        let continues = last_key.as_deref() == Some(key.as_str()) && !key.is_empty();
        match groups.last_mut() {
            Some(group) if continues => group.rows.push(RiskRecord(row)),
            _ => groups.push(RowGroup {
                rows: vec![RiskRecord(row)],
                shared: vec![(RISK_COLUMN, row.risk.clone())],
            }),
        }
        last_key = Some(key);
    }
    groups
}

pub fn fill_risk_table(doc: &mut Document, rows: &[RiskRow]) -> EngineResult<usize> {
    let markers = [RISK_TEMPLATE_MARKER];
    let located = doc
        .tables()
        .find_map(|(index, table)| find_anchor_row(table, row_contains_token(&markers)).map(|anchor| (index, anchor)));
    let (index, anchor) = located.ok_or_else(|| EngineError::not_found(format!("risk table row {RISK_TEMPLATE_MARKER}")))?;
    let table = doc
        .table_mut(index)
        .ok_or_else(|| EngineError::not_found("risk table"))?;

    if table.row(anchor).is_some_and(|row| row.cells.len() <= TESTS_COLUMN) {
        return Err(EngineError::mismatch(format!(
            "risk template row has fewer than {} cells",
            TESTS_COLUMN + 1
        )));
    }

    let groups = equal_risk_groups(rows);
    let ranges = expand_grouped(table, anchor, &groups, RISK_PLACEHOLDERS)?;

    for (offset, row) in rows.iter().enumerate() {
        let Some(target) = table.row_mut(anchor + offset) else {
            break;
        };
        if let Some(cell) = target.cell_mut(CAUSE_COLUMN) {
            cell.set_lines(&[row.cause.as_str()]);
        }
        let grades = [&row.probability, &row.severity, &row.detection, &row.level];
        for (column, grade) in GRADE_COLUMNS.iter().zip(grades) {
            if let Some(cell) = target.cell_mut(*column) {
                write_diagonal(cell, grade);
            }
        }
        if let Some(cell) = target.cell_mut(TESTS_COLUMN) {
            let lines = test_lines(&row.tests);
            if lines.is_empty() {
                cell.set_lines(&[""]);
            } else {
                cell.set_lines(&lines);
            }
        }
    }

    let merged = ranges.iter().filter(|range| range.len() > 1).count();
    debug!(anchor, groups = ranges.len(), merged, "risk rows grouped");
    info!(rows = rows.len(), "filled risk table");
    Ok(rows.len())
}

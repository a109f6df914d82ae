use tracing::{info, warn};

use crate::docx::{Block, Document, Row, Table};
use crate::error::{EngineError, EngineResult};

use super::locator::{Keywords, row_text};

pub fn mark_repeat_headers(table: &mut Table, header_rows: usize) {
    table.mark_header_rows(header_rows.min(table.rows.len()));
}

// Splits each matching table so the row after the marker row opens a new table.
pub fn split_after_marker_row<P>(
    doc: &mut Document,
    predicate: P,
    marker: &Keywords,
    header_rows: usize,
) -> EngineResult<usize>
where
    P: Fn(&Table) -> bool,
{
    let targets: Vec<usize> = doc
        .tables()
        .filter(|(_, table)| predicate(table))
        .map(|(index, _)| index)
        .collect();

    let mut split = 0;
    // Back to front so inserting a table keeps earlier indices valid.
    for index in targets.into_iter().rev() {
        match split_one(doc, index, marker, header_rows) {
            Ok(true) => split += 1,
            Ok(false) => {}
            Err(err @ EngineError::StructuralMismatch { .. }) => {
                warn!(index, error = %err, "skipped marker split");
            }
            Err(err) => return Err(err),
        }
    }
    info!(tables = split, "split tables after marker row");
    Ok(split)
}

fn split_one(
    doc: &mut Document,
    index: usize,
    marker: &Keywords,
    header_rows: usize,
) -> EngineResult<bool> {
    let table = doc
        .table_mut(index)
        .ok_or_else(|| EngineError::not_found(format!("table at body index {index}")))?;
    if table.has_wrapped_rows() {
        return Err(EngineError::mismatch(format!(
            "table at body index {index} has rows the parser cannot address"
        )));
    }

    let Some(marker_row) = table
        .rows
        .iter()
        .position(|row: &Row| marker.matches_normalized(&row_text(row)))
    else {
        return Ok(false);
    };
    let start = marker_row + 1;
    if start >= table.rows.len() {
        return Ok(false);
    }

    let mut follower = table.empty_like();
    follower.rows = table.truncate_rows(start);
    mark_repeat_headers(&mut follower, header_rows);

    doc.insert_blocks_after(index, vec![Block::Table(follower)])
        .ok_or_else(|| EngineError::structural("marker split insert point out of range"))?;
    Ok(true)
}

use tracing::{debug, info};

use crate::config::Vocabulary;
use crate::docx::{Alignment, Document, Row, Table};
use crate::engine::locator::{Keywords, find_anchor_row, find_anchor_row_from, row_text};
use crate::engine::{find_column, find_columns, pad_rows};
use crate::error::{EngineError, EngineResult};
use crate::model::Room;
use crate::text::normalize;

fn is_exchange_table(table: &Table, vocabulary: &Vocabulary) -> bool {
    let Some(head) = table.rows.first() else {
        return false;
    };
    // "11,2" and "11.2" both appear in templates.
    let text = row_text(head).replace(',', ".");
    Keywords::all(&vocabulary.exchange_table).matches_normalized(&text)
        && Keywords::all(&vocabulary.exchange_markers).matches_any_normalized(&text)
}

fn columns_row(table: &Table, vocabulary: &Vocabulary) -> Option<usize> {
    let results = normalize(&vocabulary.results_marker);
    let totals = Keywords::all(&vocabulary.total_flow_column);
    find_anchor_row(table, |row| row_text(row).contains(&results))
        .map(|index| index + 1)
        .filter(|index| *index < table.rows.len())
        .or_else(|| find_anchor_row(table, |row| totals.matches_normalized(&row_text(row))))
}

fn is_spacer(row: &Row) -> bool {
    row.cells.iter().all(|cell| {
        let text = normalize(&cell.text());
        text.is_empty() || text == "¤"
    })
}

fn write_centered(row: &mut Row, column: usize, text: &str) {
    if let Some(cell) = row.cell_at_grid_mut(column) {
        cell.set_text(text, true);
        cell.set_alignment(Alignment::Center);
    }
}

pub fn fill_exchange_table(doc: &mut Document, vocabulary: &Vocabulary, rooms: &[Room]) -> EngineResult<usize> {
    let index = doc
        .tables()
        .find(|(_, table)| is_exchange_table(table, vocabulary))
        .map(|(index, _)| index)
        .ok_or_else(|| EngineError::not_found("air exchange table"))?;
    let table = doc
        .table_mut(index)
        .ok_or_else(|| EngineError::not_found("air exchange table"))?;

    let header = columns_row(table, vocabulary)
        .ok_or_else(|| EngineError::mismatch("air exchange table has no column header row"))?;
    let total_columns = find_columns(&table.rows[header], &vocabulary.total_flow_column);
    let actual_column = find_column(&table.rows[header], &[vocabulary.actual_column.as_str()]);
    if total_columns.is_empty() && actual_column.is_none() {
        return Err(EngineError::mismatch("air exchange table has neither total nor actual column"));
    }

    // The column header spans two rows.
    let mut start = header + 2;
    while start < table.rows.len() && is_spacer(&table.rows[start]) {
        start += 1;
    }
    let comments = normalize(&vocabulary.comments_marker);
    let end = find_anchor_row_from(table, start, |row| {
        row.cell(0)
            .is_some_and(|cell| normalize(&cell.text()).starts_with(&comments))
    })
    .unwrap_or(table.rows.len());
    if end <= start {
        return Err(EngineError::not_found("air exchange data rows"));
    }

    let added = pad_rows(table, start, end - start, rooms.len())?;
    for (offset, room) in rooms.iter().enumerate() {
        let Some(row) = table.row_mut(start + offset) else {
            break;
        };
        if !room.total_flow.trim().is_empty() {
            for column in &total_columns {
                write_centered(row, *column, room.total_flow.trim());
            }
        }
        if let (Some(column), false) = (actual_column, room.exchange_actual.trim().is_empty()) {
            write_centered(row, column, room.exchange_actual.trim());
        }
    }

    debug!(header, start, added, "air exchange rows prepared");
    info!(rooms = rooms.len(), "filled air exchange table");
    Ok(rooms.len())
}

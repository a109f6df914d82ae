use std::ops::Range;

use tracing::{debug, info, warn};

use crate::aggregate::calc_points;
use crate::config::Vocabulary;
use crate::docx::{Alignment, Document, Row, Table};
use crate::engine::locator::{Keywords, find_anchor_row_from, row_contains_token, row_text};
use crate::engine::{ExpandOptions, PlaceholderTable, RowRecord, expand, merge_column_range};
use crate::error::{EngineError, EngineResult};
use crate::model::Room;
use crate::text::normalize;

pub const POINT_PLACEHOLDERS: &PlaceholderTable = &[
    ("{room}", "label"),
    ("{room_num}", "num"),
    ("{room_name}", "name"),
    ("{class}", "class"),
    ("{area}", "area"),
    ("{point}", "point"),
];

const POINT_TOKEN: [&str; 1] = ["{point}"];
const FALLBACK_POINT_COLUMN: usize = 2;
const MERGED_COLUMNS: [usize; 2] = [0, 1];

struct PointRecord<'a> {
    room: &'a Room,
    point: u32,
}

impl RowRecord for PointRecord<'_> {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "point" => Some(self.point.to_string()),
            other => <Room as RowRecord>::field(self.room, other),
        }
    }
}

fn results_header(table: &Table, vocabulary: &Vocabulary) -> Option<usize> {
    let required = Keywords::all(&vocabulary.results_header);
    let points = Keywords::all(&vocabulary.point_markers);
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            let text = row_text(row);
            required.matches_normalized(&text) && points.matches_any_normalized(&text)
        })
        .map(|(index, _)| index)
        .last()
}

fn point_column(header: &Row, vocabulary: &Vocabulary) -> Option<usize> {
    let markers: Vec<String> = vocabulary.point_markers.iter().map(|marker| normalize(marker)).collect();
    let stem = markers.first()?;
    header
        .grid_texts()
        .iter()
        .map(|text| normalize(text))
        .position(|text| text.contains(stem.as_str()) || markers.iter().any(|marker| text == *marker))
}

fn point_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|ch| !ch.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

// Contiguous point rows; a point numbered 1 opens a new block.
fn point_blocks(table: &Table, rows: Range<usize>, column: usize) -> Vec<Range<usize>> {
    let mut blocks = Vec::new();
    let mut open: Option<usize> = None;
    for index in rows.clone() {
        let number = table
            .row(index)
            .and_then(|row| row.cell_at_grid(column))
            .and_then(|cell| point_number(&cell.text()));
        match (number, open) {
            (None, Some(start)) => {
                blocks.push(start..index);
                open = None;
            }
            (None, None) => {}
            (Some(1), Some(start)) => {
                blocks.push(start..index);
                open = Some(index);
            }
            (Some(_), None) => open = Some(index),
            (Some(_), Some(_)) => {}
        }
    }
    if let Some(start) = open {
        blocks.push(start..rows.end);
    }
    blocks
}

fn expand_points(table: &mut Table, header: usize, rooms: &[Room]) -> EngineResult<usize> {
    let Some(template) = find_anchor_row_from(table, header + 1, row_contains_token(&POINT_TOKEN)) else {
        return Ok(0);
    };
    let records: Vec<PointRecord<'_>> = rooms
        .iter()
        .flat_map(|room| (1..=calc_points(&room.area)).map(move |point| PointRecord { room, point }))
        .collect();

    let tail = table.truncate_rows(template + 1);
    let written = expand(table, template, &records, POINT_PLACEHOLDERS, ExpandOptions::default())?;
    table.rows.extend(tail);
    Ok(written)
}

fn format_results(table: &mut Table, vocabulary: &Vocabulary, rooms: &[Room]) -> EngineResult<usize> {
    let header = results_header(table, vocabulary)
        .ok_or_else(|| EngineError::not_found("test results header row"))?;
    let column = point_column(&table.rows[header], vocabulary).unwrap_or(FALLBACK_POINT_COLUMN);
    let expanded = expand_points(table, header, rooms)?;

    let comments = normalize(&vocabulary.comments_marker);
    let end = find_anchor_row_from(table, header + 1, |row| {
        row.cell(0)
            .is_some_and(|cell| normalize(&cell.text()).contains(&comments))
    })
    .unwrap_or(table.rows.len());

    let blocks = point_blocks(table, header + 1..end, column);
    for block in blocks.iter().filter(|block| block.len() > 1) {
        for merged in MERGED_COLUMNS {
            let top = table
                .row(block.start)
                .and_then(|row| row.cell_at_grid(merged))
                .map(|cell| cell.text().trim().to_string())
                .unwrap_or_default();
            if let Err(err) = merge_column_range(table, merged, block.clone(), &top) {
                warn!(rows = ?block, column = merged, error = %err, "point block left unmerged");
            }
        }
        for row in &mut table.rows[block.clone()] {
            for cell in row.cells.iter_mut().skip(MERGED_COLUMNS.len()) {
                cell.set_alignment(Alignment::Center);
            }
        }
    }

    debug!(header, column, expanded, blocks = blocks.len(), "test results formatted");
    Ok(blocks.len())
}

pub fn fill_test_results(doc: &mut Document, vocabulary: &Vocabulary, rooms: &[Room]) -> EngineResult<usize> {
    let indices: Vec<usize> = doc
        .tables()
        .filter(|(_, table)| results_header(table, vocabulary).is_some())
        .map(|(index, _)| index)
        .collect();
    if indices.is_empty() {
        return Err(EngineError::not_found("test results tables"));
    }

    let mut blocks = 0;
    for index in &indices {
        let Some(table) = doc.table_mut(*index) else {
            continue;
        };
        blocks += format_results(table, vocabulary, rooms)?;
    }
    info!(tables = indices.len(), blocks, "formatted test results tables");
    Ok(indices.len())
}

use tracing::{debug, info};

use crate::config::Vocabulary;
use crate::docx::{Alignment, Document, Table};
use crate::engine::locator::{find_anchor_row_from, row_has_exact_token};
use crate::engine::{ExpandOptions, PlaceholderTable, expand};
use crate::error::{EngineError, EngineResult};
use crate::model::Room;
use crate::text::normalize;

pub const ROOM_PLACEHOLDERS: &PlaceholderTable = &[
    ("#", "num"),
    ("##", "name"),
    ("###", "class"),
    ("####", "area"),
    ("#$", "volume"),
    ("#$$", "pressure_delta"),
    ("#$$$", "airflow"),
    ("#%", "exchange_rate"),
    ("#%%", "temperature"),
    ("#%%%", "humidity"),
];

const ROOM_TOKENS: [&str; 10] = ["#", "##", "###", "####", "#$", "#$$", "#$$$", "#%", "#%%", "#%%%"];

fn is_rooms_table(table: &Table, header: &str) -> bool {
    let header = normalize(header);
    table
        .rows
        .first()
        .and_then(|row| row.cell(0))
        .is_some_and(|cell| normalize(&cell.text()).contains(&header))
}

fn has_room_tokens(table: &Table) -> bool {
    table.rows.iter().any(|row| {
        let tokens: Vec<String> = row.cells.iter().map(|cell| cell.text().trim().to_string()).collect();
        ["#", "##", "#%%%"]
            .iter()
            .all(|token| tokens.iter().any(|text| text == token))
    })
}

fn locate(doc: &Document, vocabulary: &Vocabulary) -> Option<usize> {
    doc.tables()
        .find(|(_, table)| is_rooms_table(table, &vocabulary.rooms_header))
        .or_else(|| doc.tables().find(|(_, table)| has_room_tokens(table)))
        .map(|(index, _)| index)
}

fn label_header(table: &mut Table, vocabulary: &Vocabulary) -> usize {
    let Some(header) = table.row_mut(0) else {
        return 0;
    };
    let mut labelled = 0;
    for cell in &mut header.cells {
        for paragraph in cell.paragraphs_mut() {
            paragraph.set_alignment(Alignment::Center);
            for run in paragraph.runs_mut() {
                let token = run.text();
                if let Some(label) = vocabulary.room_header_labels.get(token.trim()) {
                    run.set_text(label);
                    labelled += 1;
                }
            }
        }
    }
    labelled
}

pub fn fill_rooms(doc: &mut Document, vocabulary: &Vocabulary, rooms: &[Room]) -> EngineResult<usize> {
    let index = locate(doc, vocabulary)
        .ok_or_else(|| EngineError::not_found(format!("rooms table (\"{}\")", vocabulary.rooms_header)))?;
    let table = doc
        .table_mut(index)
        .ok_or_else(|| EngineError::not_found("rooms table"))?;

    let labelled = label_header(table, vocabulary);
    let anchor = find_anchor_row_from(table, 1, row_has_exact_token(&ROOM_TOKENS))
        .ok_or_else(|| EngineError::not_found("room placeholder row"))?;

    let filled = expand(table, anchor, rooms, ROOM_PLACEHOLDERS, ExpandOptions::default())?;
    for row in table.rows.iter_mut().skip(anchor) {
        for cell in &mut row.cells {
            cell.set_vertical_center();
        }
    }

    debug!(labelled, anchor, "rooms header labelled");
    info!(rooms = filled, "filled rooms table");
    Ok(filled)
}

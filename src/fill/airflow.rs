use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::aggregate::RoomAirflow;
use crate::config::Vocabulary;
use crate::docx::{Document, Row, Table};
use crate::engine::locator::{Keywords, find_anchor_row, find_column, find_column_in_rows, row_text};
use crate::engine::merge_or_write;
use crate::error::{EngineError, EngineResult};
use crate::text::{format_decimal, normalize, parse_number};

static ROOM_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)((?:помещени[ея]|room)\s*[:=—\-]?\s*)(.*)$").expect("valid room caption regex")
});

#[derive(Debug, Default)]
struct TemplateScan {
    filter: Option<usize>,
    area: Option<usize>,
    point: Option<usize>,
    speed: Option<usize>,
    facts: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    filter: usize,
    area: usize,
    point: usize,
    speed: usize,
    fact_left: usize,
    fact_right: Option<usize>,
}

impl TemplateScan {
    fn of(row: &Row) -> Self {
        let mut scan = Self::default();
        for (index, cell) in row.cells.iter().enumerate() {
            let Some(column) = row.grid_index_of(index) else {
                continue;
            };
            let text = cell.text();
            if text.contains("{filter_num}") {
                scan.filter.get_or_insert(column);
            }
            if text.contains("{S}") {
                scan.area.get_or_insert(column);
            }
            if text.contains("{num}") {
                scan.point.get_or_insert(column);
            }
            if text.contains("{avg_speed}") {
                scan.speed.get_or_insert(column);
            }
            if text.contains("{fact}") {
                scan.facts.push(column);
            }
        }
        scan
    }

    fn is_complete(&self) -> bool {
        self.filter.is_some() && self.area.is_some() && self.point.is_some() && self.speed.is_some()
    }

    fn columns(&self) -> EngineResult<Columns> {
        let missing: Vec<&str> = [
            ("{filter_num}", self.filter.is_none()),
            ("{S}", self.area.is_none()),
            ("{num}", self.point.is_none()),
            ("{avg_speed}", self.speed.is_none()),
            ("{fact}", self.facts.is_empty()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(token, _)| *token)
        .collect();

        match (self.filter, self.area, self.point, self.speed, self.facts.first()) {
            (Some(filter), Some(area), Some(point), Some(speed), Some(fact_left)) => Ok(Columns {
                filter,
                area,
                point,
                speed,
                fact_left: *fact_left,
                fact_right: self.facts.get(1).copied(),
            }),
            _ => Err(EngineError::mismatch(format!(
                "airflow template row lacks columns: {}",
                missing.join(", ")
            ))),
        }
    }
}

fn locate_template(doc: &Document) -> EngineResult<(usize, usize, TemplateScan)> {
    let mut partial = None;
    for (index, table) in doc.tables() {
        for (row_index, row) in table.rows.iter().enumerate() {
            if !row.cells.iter().any(|cell| cell.text().contains("{num}")) {
                continue;
            }
            let scan = TemplateScan::of(row);
            if scan.is_complete() {
                return Ok((index, row_index, scan));
            }
            partial.get_or_insert(scan);
        }
    }
    Err(match partial.and_then(|scan| scan.columns().err()) {
        Some(err) => err,
        None => EngineError::not_found("airflow template row ({num})"),
    })
}

fn room_header_row(table: &Table, template: usize, vocabulary: &Vocabulary) -> Option<usize> {
    let markers = Keywords::all(&vocabulary.room_markers);
    (0..template)
        .rev()
        .find(|index| table.rows[*index].cells.iter().any(|cell| markers.matches_any_normalized(&normalize(&cell.text()))))
}

fn letters(text: &str) -> String {
    normalize(text).chars().filter(|ch| ch.is_alphabetic()).collect()
}

fn yes_no_columns(table: &Table, template: usize, vocabulary: &Vocabulary) -> (Option<usize>, Option<usize>) {
    let yes = letters(&vocabulary.yes);
    let no = letters(&vocabulary.no);
    let (mut yes_column, mut no_column) = (None, None);
    for row in table.rows[..template].iter().rev() {
        for (index, cell) in row.cells.iter().enumerate() {
            let text = letters(&cell.text());
            let column = row.grid_index_of(index);
            if yes_column.is_none() && text == yes {
                yes_column = column;
            }
            if no_column.is_none() && text == no {
                no_column = column;
            }
        }
        if yes_column.is_some() && no_column.is_some() {
            break;
        }
    }
    (yes_column, no_column)
}

fn mean_row(table: &Table, template: usize, points: usize, vocabulary: &Vocabulary) -> Option<usize> {
    let markers = Keywords::all(&vocabulary.mean_markers);
    let end = (template + points + 2).min(table.rows.len());
    (template + 1..end).find(|index| markers.matches_any_normalized(&row_text(&table.rows[*index])))
}

fn capitalized(text: &str) -> String {
    let mut chars = text.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn write_room(row: &mut Row, label: &str, class: &str, vocabulary: &Vocabulary) {
    let class = class.trim();
    let substitute = |text: &str| {
        let mut out = text
            .replace("{$#}", label)
            .replace("{room}", label)
            .replace("{ROOM}", label);
        if !class.is_empty() {
            out = out
                .replace("###", class)
                .replace("{klass}", class)
                .replace("{KLASS}", class);
        }
        out
    };

    let mut replaced_any = false;
    for cell in &mut row.cells {
        let text = cell.text();
        let replaced = substitute(&text);
        if replaced != text {
            cell.set_text(&replaced, true);
            replaced_any = true;
        }
    }
    if replaced_any {
        return;
    }

    let stem = vocabulary
        .room_markers
        .first()
        .map(|marker| normalize(marker))
        .unwrap_or_default();
    if !stem.is_empty() {
        for cell in &mut row.cells {
            let text = cell.text();
            if !normalize(&text).contains(&stem) {
                continue;
            }
            let relabelled = if ROOM_CAPTION.is_match(&text) {
                ROOM_CAPTION
                    .replace(&text, |caps: &Captures| format!("{}{label}", &caps[1]))
                    .into_owned()
            } else {
                format!("{} {label}", text.trim())
            };
            cell.set_text(&substitute(&relabelled), true);
            return;
        }
    }

    if let Some(cell) = row.cell_mut(0) {
        cell.set_text(&format!("{} {label}", capitalized(&vocabulary.room_prefix)), true);
    }
}

fn write_at(row: &mut Row, column: usize, text: &str) {
    if let Some(cell) = row.cell_at_grid_mut(column) {
        cell.set_text(text, true);
    }
}

fn text_at(table: &Table, row: usize, column: usize) -> String {
    table
        .row(row)
        .and_then(|row| row.cell_at_grid(column))
        .map(|cell| cell.text().trim().to_string())
        .unwrap_or_default()
}

pub fn fill_airflow_table(doc: &mut Document, vocabulary: &Vocabulary, rooms: &[RoomAirflow]) -> EngineResult<usize> {
    if rooms.is_empty() {
        return Err(EngineError::not_found("airflow measurements"));
    }
    let (index, template, scan) = locate_template(doc)?;
    let columns = scan.columns()?;
    let table = doc
        .table_mut(index)
        .ok_or_else(|| EngineError::not_found("airflow table"))?;

    let header = room_header_row(table, template, vocabulary)
        .ok_or_else(|| EngineError::mismatch("no room header row above the airflow template"))?;
    let (yes, no) = yes_no_columns(table, template, vocabulary);
    let criterion = [yes, no]
        .into_iter()
        .flatten()
        .min()
        .filter(|column| *column > 0)
        .map(|column| column - 1)
        .filter(|column| Some(*column) != yes && Some(*column) != no);
    let first_points = rooms[0].filters.first().map_or(1, |filter| filter.speeds.len());
    let mean = mean_row(table, template, first_points, vocabulary);
    debug!(template, header, ?yes, ?no, ?criterion, ?mean, "airflow template located");

    let room_block: Vec<Row> = table.rows[header..template].to_vec();
    let data_row = table.rows[template].clone();
    let mean_template = mean.map(|row| table.rows[row].clone());
    let tail = table.truncate_rows(mean.unwrap_or(template) + 1);
    table.truncate_rows(header);

    let mut written = 0;
    for room in rooms {
        for (offset, row) in room_block.iter().enumerate() {
            let mut row = row.clone();
            if offset == 0 {
                write_room(&mut row, &room.label(), &room.class, vocabulary);
            }
            table.append_row(row);
        }

        let segment_start = table.rows.len();
        for filter in &room.filters {
            let block_start = table.rows.len();
            let flow = format_decimal(filter.flow, 2);
            for (point, speed) in filter.speeds.iter().enumerate() {
                let mut row = data_row.clone();
                write_at(&mut row, columns.point, &(point + 1).to_string());
                write_at(&mut row, columns.speed, &format_decimal(*speed, 2));
                write_at(&mut row, columns.fact_left, if point == 0 { flow.as_str() } else { "" });
                if let Some(column) = columns.fact_right {
                    write_at(&mut row, column, "");
                }
                table.append_row(row);
            }
            if let Some(mean_template) = &mean_template {
                let mut row = mean_template.clone();
                write_at(&mut row, columns.speed, &format_decimal(filter.avg_speed, 2));
                table.append_row(row);
            }

            let block = block_start..table.rows.len();
            merge_or_write(table, columns.filter, block.clone(), &filter.filter_num)?;
            merge_or_write(table, columns.area, block.clone(), &format_decimal(room.area, 2))?;
            merge_or_write(table, columns.fact_left, block, &flow)?;
        }

        let segment = segment_start..table.rows.len();
        written += segment.len();
        if let Some(column) = columns.fact_right {
            merge_or_write(table, column, segment.clone(), &format_decimal(room.total, 2))?;
        }
        if let Some(column) = criterion {
            let top = room
                .criterion_text
                .clone()
                .unwrap_or_else(|| text_at(table, segment.start, column));
            merge_or_write(table, column, segment.clone(), &top)?;
        }
        let passed = room.passed();
        for (column, marked) in [(yes, passed == Some(true)), (no, passed == Some(false))] {
            if let Some(column) = column {
                merge_or_write(table, column, segment.clone(), if marked { "+" } else { "" })?;
            }
        }
        debug!(room = %room.label(), total = room.total, passed = ?passed, "airflow room written");
    }
    table.rows.extend(tail);

    info!(rooms = rooms.len(), rows = written, "filled airflow table");
    Ok(written)
}

fn leading_number(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, ',' | '.' | '-'))
        .collect();
    parse_number(&digits)
}

fn totals_from_summary_column(doc: &Document, vocabulary: &Vocabulary) -> Vec<Option<f64>> {
    let heading = Keywords::all(&vocabulary.total_flow_table);
    let Some(column_label) = vocabulary.total_flow_table.last() else {
        return Vec::new();
    };

    for (_, table) in doc.tables() {
        let Some(head) = table.rows.first() else {
            continue;
        };
        if !heading.matches_normalized(&row_text(head)) {
            continue;
        }
        let Some(column) = find_column(head, &[column_label]) else {
            continue;
        };

        let mut totals = Vec::new();
        let mut last_seen = String::new();
        for row in &table.rows[1..] {
            let Some(cell) = row.cell_at_grid(column) else {
                continue;
            };
            let text = normalize(&cell.text());
            if text.is_empty() || text == last_seen {
                continue;
            }
            if let Some(value) = leading_number(&text) {
                totals.push(Some(value));
            }
            last_seen = text;
        }
        return totals;
    }
    Vec::new()
}

fn totals_from_room_sections(doc: &Document, vocabulary: &Vocabulary) -> Vec<Option<f64>> {
    let heading = Keywords::all(&vocabulary.airflow_test_markers);
    let results = normalize(&vocabulary.results_marker);
    let comments = normalize(&vocabulary.comments_marker);
    let room_prefix = normalize(&vocabulary.room_prefix);
    let mut flows = Vec::new();

    for (_, table) in doc.tables() {
        let Some(head) = table.rows.first() else {
            continue;
        };
        if !heading.matches_normalized(&row_text(head)) {
            continue;
        }
        let Some(header) = find_anchor_row(table, |row| row_text(row).contains(&results))
            .map(|index| index + 1)
            .filter(|index| *index < table.rows.len())
        else {
            continue;
        };

        let header_rows: Vec<&Row> = table.rows[header..(header + 2).min(table.rows.len())]
            .iter()
            .collect();
        let actual_column = find_column_in_rows(&header_rows, &[vocabulary.actual_column.as_str()]);
        let total_column = find_column_in_rows(&header_rows, &vocabulary.room_total_column);

        let mut current: Option<f64> = None;
        let mut in_room = false;
        for row in &table.rows[header + header_rows.len()..] {
            let text = row_text(row);
            if text.starts_with(&comments) {
                break;
            }
            if text.starts_with(&room_prefix) {
                if in_room {
                    flows.push(current);
                }
                in_room = true;
                current = None;
                continue;
            }
            if !in_room {
                continue;
            }
            let value_at = |column: usize| row.cell_at_grid(column).and_then(|cell| parse_number(&cell.text()));
            // A room total column wins; otherwise the per-filter flows are summed.
            match (total_column, actual_column) {
                (Some(column), _) => {
                    if let Some(total) = value_at(column) {
                        current = Some(total);
                    }
                }
                (None, Some(column)) => {
                    if let Some(actual) = value_at(column) {
                        current = Some(current.unwrap_or(0.0) + actual);
                    }
                }
                (None, None) => {}
            }
        }
        if in_room {
            flows.push(current);
        }
    }
    flows
}

// Per-room measured totals, in table order; index-aligned with the job's rooms.
pub fn extract_total_flows(doc: &Document, vocabulary: &Vocabulary) -> Vec<Option<f64>> {
    let totals = totals_from_summary_column(doc, vocabulary);
    if totals.iter().any(Option::is_some) {
        debug!(rooms = totals.len(), "totals read from summary column");
        return totals;
    }
    let totals = totals_from_room_sections(doc, vocabulary);
    debug!(rooms = totals.len(), "totals read from room sections");
    totals
}

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::info;

use crate::docx::Document;
use crate::engine::locator::{find_anchor_row, row_contains_token};
use crate::engine::{ExpandOptions, PlaceholderTable, expand};
use crate::error::{EngineError, EngineResult};
use crate::model::EquipmentItem;

pub const EQUIPMENT_PLACEHOLDERS: &PlaceholderTable = &[
    ("@1", "name_serial"),
    ("@2", "parameters"),
    ("@3", "certificate"),
    ("@4", "validity"),
];

const EQUIPMENT_TOKENS: [&str; 4] = ["@1", "@2", "@3", "@4"];

const DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%d.%m.%Y", "%d-%m-%Y", "%Y.%m.%d", "%d/%m/%Y", "%Y/%m/%d"];

static GLUED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\.(\d{2})(\d{4})$").expect("valid glued year regex"));
static DATE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{1,2}-\d{1,2}|\d{1,2}\.\d{1,2}\.\d{4}|\d{1,2}\.\d{2}\d{4}")
        .expect("valid date-like regex")
});

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.replace('\u{00A0}', " ").replace("г.", "").replace('г', "");
    let token = cleaned.split_whitespace().next()?.trim_matches(|ch: char| ch == ' ' || ch == '.');
    if token.is_empty() {
        return None;
    }
    // "1.022024" is a common spreadsheet export of "1.02.2024".
    let token = GLUED_YEAR.replace(token, "$1.$2.$3");
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&token, format).ok())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

// Normalizes "calibrated / valid until" text to "DD.MM.YYYY / DD.MM.YYYY"; unparseable text is kept.
pub fn format_validity(text: &str) -> String {
    let raw = text.split_whitespace().collect::<Vec<&str>>().join(" ");
    if raw.is_empty() {
        return raw;
    }

    if raw.contains('/') {
        let parts: Vec<&str> = raw.split('/').map(str::trim).filter(|part| !part.is_empty()).collect();
        if parts.len() >= 2 {
            return match (parse_date(parts[0]), parse_date(parts[1])) {
                (Some(from), Some(until)) => format!("{} / {}", format_date(from), format_date(until)),
                _ => raw,
            };
        }
    }

    let dates: Vec<&str> = DATE_LIKE.find_iter(&raw).map(|found| found.as_str()).collect();
    if dates.len() >= 2 {
        if let (Some(from), Some(until)) = (parse_date(dates[0]), parse_date(dates[1])) {
            return format!("{} / {}", format_date(from), format_date(until));
        }
    }

    parse_date(&raw).map(format_date).unwrap_or(raw)
}

pub fn fill_equipment(doc: &mut Document, equipment: &[EquipmentItem]) -> EngineResult<usize> {
    let located = doc.tables().find_map(|(index, table)| {
        find_anchor_row(table, row_contains_token(&EQUIPMENT_TOKENS)).map(|anchor| (index, anchor))
    });
    let (index, anchor) = located.ok_or_else(|| EngineError::not_found("equipment table (@1..@4)"))?;
    let table = doc
        .table_mut(index)
        .ok_or_else(|| EngineError::not_found("equipment table"))?;

    let filled = expand(table, anchor, equipment, EQUIPMENT_PLACEHOLDERS, ExpandOptions::default())?;
    info!(items = filled, anchor, "filled equipment table");
    Ok(filled)
}

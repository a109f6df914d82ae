use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use crate::docx::{Row, Table};
use crate::error::{EngineError, EngineResult};

use super::vmerge::merge_or_write;

pub type PlaceholderTable = [(&'static str, &'static str)];

pub trait RowRecord {
    fn field(&self, name: &str) -> Option<String>;
}

impl RowRecord for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl RowRecord for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Whole(&'static str),
    Inline(Vec<(&'static str, &'static str)>),
}

fn is_inline_token(token: &str) -> bool {
    (token.starts_with('{') && token.ends_with('}'))
        || (token.starts_with("<<") && token.ends_with(">>"))
}

#[derive(Debug, Clone)]
pub struct RowTemplate {
    row: Row,
    slots: Vec<(usize, Slot)>,
}

impl RowTemplate {
    pub fn from_row(row: &Row, placeholders: &PlaceholderTable) -> Self {
        let mut slots = Vec::new();
        for (index, cell) in row.cells.iter().enumerate() {
            let text = cell.text();
            let token = text.trim();
            if let Some((_, field)) = placeholders.iter().find(|(candidate, _)| *candidate == token) {
                slots.push((index, Slot::Whole(*field)));
                continue;
            }

            let inline: Vec<(&'static str, &'static str)> = placeholders
                .iter()
                .filter(|(candidate, _)| is_inline_token(candidate) && text.contains(candidate))
                .copied()
                .collect();
            if !inline.is_empty() {
                slots.push((index, Slot::Inline(inline)));
            }
        }

        Self {
            row: row.clone(),
            slots,
        }
    }

    pub fn capture(table: &Table, index: usize, placeholders: &PlaceholderTable) -> Option<Self> {
        table
            .row(index)
            .map(|row| Self::from_row(row, placeholders))
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn render<R: RowRecord + ?Sized>(&self, record: &R) -> Row {
        let mut row = self.row.clone();
        self.write_into(&mut row, |field| record.field(field).unwrap_or_default());
        row
    }

    pub fn blank(&self) -> Row {
        let mut row = self.row.clone();
        self.write_into(&mut row, |_| String::new());
        row
    }

    // Rewrites an existing row that shares this template's cell layout.
    pub fn fill<R: RowRecord + ?Sized>(&self, row: &mut Row, record: &R) {
        self.write_into(row, |field| record.field(field).unwrap_or_default());
    }

    fn write_into<F>(&self, row: &mut Row, value: F)
    where
        F: Fn(&str) -> String,
    {
        for (index, slot) in &self.slots {
            let Some(cell) = row.cell_mut(*index) else {
                continue;
            };
            match slot {
                Slot::Whole(field) => cell.set_text(&value(*field), true),
                Slot::Inline(tokens) => {
                    let Some(original) = self.row.cell(*index).map(|cell| cell.text()) else {
                        continue;
                    };
                    let mut text = original;
                    for (token, field) in tokens {
                        text = text.replace(*token, &value(*field));
                    }
                    cell.set_text(&text, true);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandOptions {
    pub allow_empty: bool,
}

pub fn expand<R: RowRecord>(
    table: &mut Table,
    anchor: usize,
    records: &[R],
    placeholders: &PlaceholderTable,
    options: ExpandOptions,
) -> EngineResult<usize> {
    let template = RowTemplate::capture(table, anchor, placeholders)
        .ok_or_else(|| EngineError::not_found(format!("template row {anchor}")))?;

    table.truncate_rows(anchor);
    for record in records {
        table.append_row(template.render(record));
    }
    if records.is_empty() && !options.allow_empty {
        table.append_row(template.blank());
    }
    Ok(records.len())
}

#[derive(Debug, Clone)]
pub struct RowGroup<R> {
    pub rows: Vec<R>,
    pub shared: Vec<(usize, String)>,
}

pub fn expand_grouped<R: RowRecord>(
    table: &mut Table,
    anchor: usize,
    groups: &[RowGroup<R>],
    placeholders: &PlaceholderTable,
) -> EngineResult<Vec<Range<usize>>> {
    let template = RowTemplate::capture(table, anchor, placeholders)
        .ok_or_else(|| EngineError::not_found(format!("template row {anchor}")))?;

    table.truncate_rows(anchor);
    let mut ranges = Vec::with_capacity(groups.len());
    for group in groups {
        let start = table.rows.len();
        for record in &group.rows {
            table.append_row(template.render(record));
        }
        let range = start..table.rows.len();
        for (column, value) in &group.shared {
            merge_or_write(table, *column, range.clone(), value)?;
        }
        ranges.push(range);
    }
    Ok(ranges)
}

// Clones the last available data row until `need` rows follow `start`.
pub fn pad_rows(table: &mut Table, start: usize, have: usize, need: usize) -> EngineResult<usize> {
    if need <= have {
        return Ok(0);
    }
    if have == 0 {
        return Err(EngineError::not_found(format!(
            "no data row to clone at {start}"
        )));
    }

    let last = start + have - 1;
    let template = table
        .clone_row(last)
        .ok_or_else(|| EngineError::mismatch(format!("row {last} is outside the table")))?;

    let added = need - have;
    for offset in 0..added {
        table.rows.insert(last + 1 + offset, template.clone());
    }
    Ok(added)
}

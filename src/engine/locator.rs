use regex::Regex;

use crate::docx::{Block, Document, Row, Table};
use crate::text::normalize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    words: Vec<String>,
}

impl Keywords {
    pub fn all<S: AsRef<str>>(words: &[S]) -> Self {
        Self {
            words: words
                .iter()
                .map(|word| normalize(word.as_ref()))
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matches_normalized(&normalize(text))
    }

    pub fn matches_normalized(&self, normalized: &str) -> bool {
        !self.words.is_empty() && self.words.iter().all(|word| normalized.contains(word.as_str()))
    }

    pub fn matches_any_normalized(&self, normalized: &str) -> bool {
        self.words.iter().any(|word| normalized.contains(word.as_str()))
    }
}

pub fn row_text(row: &Row) -> String {
    normalize(&row.text())
}

pub fn table_text(table: &Table, max_rows: usize) -> String {
    normalize(
        &table
            .rows
            .iter()
            .take(max_rows)
            .map(Row::text)
            .collect::<Vec<String>>()
            .join(" "),
    )
}

pub fn find_table<P>(doc: &Document, predicate: P) -> Option<usize>
where
    P: Fn(&Table) -> bool,
{
    doc.tables()
        .find(|(_, table)| predicate(table))
        .map(|(index, _)| index)
}

pub fn find_anchor_row<P>(table: &Table, predicate: P) -> Option<usize>
where
    P: Fn(&Row) -> bool,
{
    find_anchor_row_from(table, 0, predicate)
}

pub fn find_anchor_row_from<P>(table: &Table, start: usize, predicate: P) -> Option<usize>
where
    P: Fn(&Row) -> bool,
{
    table
        .rows
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, row)| predicate(row))
        .map(|(index, _)| index)
}

pub fn find_column<S: AsRef<str>>(row: &Row, keywords: &[S]) -> Option<usize> {
    find_columns(row, keywords).into_iter().next()
}

// Grid-column indices; a spanned header cell yields every column it covers.
pub fn find_columns<S: AsRef<str>>(row: &Row, keywords: &[S]) -> Vec<usize> {
    let keywords = Keywords::all(keywords);
    row.grid_texts()
        .iter()
        .enumerate()
        .filter(|(_, text)| keywords.matches(text))
        .map(|(index, _)| index)
        .collect()
}

pub fn find_column_in_rows<S: AsRef<str>>(rows: &[&Row], keywords: &[S]) -> Option<usize> {
    rows.iter().find_map(|row| find_column(row, keywords))
}

pub fn header_contains(keywords: Keywords) -> impl Fn(&Table) -> bool {
    move |table| {
        table
            .rows
            .first()
            .is_some_and(|row| keywords.matches_normalized(&row_text(row)))
    }
}

pub fn first_rows_contain(keywords: Keywords, max_rows: usize) -> impl Fn(&Table) -> bool {
    move |table| keywords.matches_normalized(&table_text(table, max_rows))
}

pub fn any_row_contains(keywords: Keywords) -> impl Fn(&Table) -> bool {
    move |table| {
        table
            .rows
            .iter()
            .any(|row| keywords.matches_normalized(&row_text(row)))
    }
}

pub fn row_has_exact_token<'a>(tokens: &'a [&'a str]) -> impl Fn(&Row) -> bool + 'a {
    move |row| {
        row.cells
            .iter()
            .any(|cell| tokens.contains(&cell.text().trim()))
    }
}

pub fn row_contains_token<'a>(tokens: &'a [&'a str]) -> impl Fn(&Row) -> bool + 'a {
    move |row| {
        row.cells.iter().any(|cell| {
            let text = cell.text();
            tokens.iter().any(|token| text.contains(token))
        })
    }
}

pub fn find_paragraph<P>(doc: &Document, predicate: P) -> Option<usize>
where
    P: Fn(&str) -> bool,
{
    doc.paragraphs()
        .find(|(_, paragraph)| predicate(&normalize(&paragraph.text())))
        .map(|(index, _)| index)
}

pub fn caption_pattern(caption_prefix: &str, number: u32) -> Option<Regex> {
    let prefix = regex::escape(&normalize(caption_prefix));
    Regex::new(&format!(r"^{prefix}\s*{number}(?:\D|$)")).ok()
}

pub fn find_caption(doc: &Document, caption_prefix: &str, number: u32) -> Option<usize> {
    let pattern = caption_pattern(caption_prefix, number)?;
    find_paragraph(doc, |text| pattern.is_match(text))
}

pub fn first_table_after(doc: &Document, index: usize) -> Option<usize> {
    doc.body
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, block)| matches!(block, Block::Table(_)))
        .map(|(position, _)| position)
}

pub fn locate_numbered_table(doc: &Document, caption_prefix: &str, number: u32) -> Option<usize> {
    let caption = find_caption(doc, caption_prefix, number)?;
    first_table_after(doc, caption)
}

// Nearest caption paragraph above the table, skipping blank paragraphs.
pub fn caption_above(doc: &Document, table_index: usize, caption_prefix: &str, number: u32) -> Option<usize> {
    let pattern = caption_pattern(caption_prefix, number)?;
    let mut index = table_index;
    while index > 0 {
        index -= 1;
        match doc.block(index)? {
            Block::Paragraph(paragraph) => {
                let text = normalize(&paragraph.text());
                if pattern.is_match(&text) {
                    return Some(index);
                }
                if !text.is_empty() {
                    return None;
                }
            }
            _ => return None,
        }
    }
    None
}

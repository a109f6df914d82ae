use super::*;
use crate::docx::{Block, Paragraph, Row};

fn table_of(rows: &[&[&str]]) -> Table {
    Table::from_rows(rows.iter().map(|cells| Row::from_texts(cells)).collect())
}

fn results_doc() -> Document {
    Document::from_blocks(vec![
        Block::Paragraph(Paragraph::with_text("Protocol")),
        Block::Table(table_of(&[
            &["Test 11.1 Check of supply air flow", ""],
            &["Test results", ""],
            &["Filter", "Actual flow"],
            &["1", "900,00"],
        ])),
        Block::Table(table_of(&[&["Test results", ""], &["Other", "1"]])),
    ])
}

#[test]
fn results_table_needs_heading_and_marker() {
    let vocabulary = Vocabulary::english();
    let matches = results_table(&vocabulary);
    let doc = results_doc();
    let found: Vec<bool> = doc.tables().map(|(_, table)| matches(table)).collect();
    assert_eq!(found, vec![true, false]);
}

#[test]
fn results_split_starts_new_table_after_marker() {
    let mut doc = results_doc();
    let split = split_results_tables(&mut doc, &EngineConfig::english(), 2).expect("split");
    assert_eq!(split, 1);

    let tables: Vec<&Table> = doc.tables().map(|(_, table)| table).collect();
    assert_eq!(tables.len(), 3);
    assert_eq!(tables[0].rows.len(), 2);
    assert_eq!(tables[1].rows[0].text(), "Filter Actual flow");
    assert!(tables[1].rows[0].is_header());
    assert!(tables[1].rows[1].is_header());
    assert_eq!(tables[2].rows[0].text().trim(), "Test results");
}

#[test]
fn results_split_leaves_tables_without_rows_after_marker() {
    let mut doc = Document::from_blocks(vec![Block::Table(table_of(&[
        &["Check of supply air flow"],
        &["Test results"],
    ]))]);
    let split = split_results_tables(&mut doc, &EngineConfig::english(), 2).expect("split");
    assert_eq!(split, 0);
    assert_eq!(doc.tables().count(), 1);
}

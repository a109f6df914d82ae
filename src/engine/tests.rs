use std::collections::BTreeMap;

use super::*;
use crate::config::{EngineConfig, SplitProfile};
use crate::docx::{Block, Document, Paragraph, Row, Table, VMerge};
use crate::error::EngineError;

const EQUIPMENT: &PlaceholderTable = &[
    ("@1", "name"),
    ("@2", "params"),
    ("@3", "cert"),
    ("@4", "valid"),
];

fn table_of(rows: &[&[&str]]) -> Table {
    Table::from_rows(rows.iter().map(|cells| Row::from_texts(cells)).collect())
}

fn numbered_table(header_rows: usize, data_rows: usize) -> Table {
    let mut rows = Vec::new();
    for index in 0..header_rows {
        let label = format!("head {index}");
        rows.push(Row::from_texts(&[label.as_str(), "cause", "tests"]));
    }
    for index in 0..data_rows {
        let label = format!("risk {index}");
        rows.push(Row::from_texts(&[label.as_str(), "cause", "test"]));
    }
    Table::from_rows(rows)
}

fn captioned(table: Table, trailing: Vec<Block>) -> Document {
    let mut body = vec![
        Block::Paragraph(Paragraph::with_text("Table 5 - Risk assessment")),
        Block::Table(table),
    ];
    body.extend(trailing);
    Document::from_blocks(body)
}

fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn budget(config: &EngineConfig) -> RowBudgetOracle {
    RowBudgetOracle::from_profile(&config.split_profile(5))
}

fn continuation_count(doc: &Document, text: &str) -> usize {
    doc.paragraphs()
        .filter(|(_, paragraph)| paragraph.text() == text)
        .count()
}

#[test]
fn equipment_rows_expand_from_template() {
    let mut table = table_of(&[&["Name", "Parameters", "Certificate", "Valid"], &["@1", "@2", "@3", "@4"]]);
    let records = vec![
        record(&[("name", "Anemometer / 17"), ("params", "0-30 m/s"), ("cert", "C-1"), ("valid", "2025 / 2026")]),
        record(&[("name", "Counter / 9"), ("params", "0.3 um"), ("cert", "C-2"), ("valid", "2025")]),
        record(&[("name", "Manometer / 3")]),
    ];

    let written = expand(&mut table, 1, &records, EQUIPMENT, ExpandOptions::default()).expect("expand");
    assert_eq!(written, 3);
    assert_eq!(table.rows.len(), 4);
    assert_eq!(table.rows[1].text(), "Anemometer / 17 0-30 m/s C-1 2025 / 2026");
    assert_eq!(table.rows[2].cells[1].text(), "0.3 um");
    assert_eq!(table.rows[3].cells[2].text(), "");
}

#[test]
fn empty_records_leave_blanked_template_unless_allowed() {
    let mut table = table_of(&[&["Name"], &["@1"]]);
    let none: Vec<BTreeMap<String, String>> = Vec::new();
    expand(&mut table, 1, &none, EQUIPMENT, ExpandOptions::default()).expect("expand");
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1].cells[0].text(), "");

    let mut table = table_of(&[&["Name"], &["@1"]]);
    expand(&mut table, 1, &none, EQUIPMENT, ExpandOptions { allow_empty: true }).expect("expand");
    assert_eq!(table.rows.len(), 1);
}

#[test]
fn inline_tokens_substitute_inside_text() {
    const TOKENS: &PlaceholderTable = &[("{num}", "num"), ("{fact}", "fact")];
    let mut table = table_of(&[&["Room {num}", "{fact} m3/h"]]);
    let records = vec![record(&[("num", "101"), ("fact", "540")])];
    expand(&mut table, 0, &records, TOKENS, ExpandOptions::default()).expect("expand");
    assert_eq!(table.rows[0].text(), "Room 101 540 m3/h");
}

#[test]
fn missing_template_row_is_not_found() {
    let mut table = table_of(&[&["only"]]);
    let records = vec![record(&[])];
    let err = expand(&mut table, 4, &records, EQUIPMENT, ExpandOptions::default()).expect_err("absent row");
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[test]
fn padding_clones_last_data_row() {
    let mut table = table_of(&[&["Test", "Criterion"], &["a", "1"], &["b", "2"], &["c", "3"], &["Comments", ""]]);
    let added = pad_rows(&mut table, 1, 3, 5).expect("pad");
    assert_eq!(added, 2);
    assert_eq!(table.rows.len(), 7);
    assert_eq!(table.rows[4].text(), "c 3");
    assert_eq!(table.rows[5].text(), "c 3");
    assert_eq!(table.rows[6].text(), "Comments ");

    assert_eq!(pad_rows(&mut table, 1, 5, 5).expect("no-op"), 0);
    assert!(pad_rows(&mut table, 1, 0, 2).is_err());
}

#[test]
fn grouped_expansion_merges_shared_columns() {
    const TOKENS: &PlaceholderTable = &[("{num}", "num"), ("{point}", "point")];
    let mut table = table_of(&[&["Room", "Point"], &["{num}", "{point}"]]);
    let groups = vec![
        RowGroup {
            rows: vec![record(&[("point", "1")]), record(&[("point", "2")]), record(&[("point", "3")])],
            shared: vec![(0, "101".to_string())],
        },
        RowGroup {
            rows: vec![record(&[("point", "1")])],
            shared: vec![(0, "102".to_string())],
        },
    ];

    let ranges = expand_grouped(&mut table, 1, &groups, TOKENS).expect("grouped");
    assert_eq!(ranges, vec![1..4, 4..5]);
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.rows[1].cells[0].text(), "101");
    assert_eq!(table.rows[1].cells[0].vmerge(), VMerge::Start);
    assert_eq!(table.rows[2].cells[0].vmerge(), VMerge::Continue);
    assert_eq!(table.rows[3].cells[0].text(), "");
    assert_eq!(table.rows[4].cells[0].vmerge(), VMerge::None);
    assert_eq!(table.rows[4].cells[0].text(), "102");
    assert_eq!(table.rows[4].cells[1].text(), "1");
    assert_eq!(merge_blocks(&table, 0), vec![1..4]);
}

#[test]
fn merge_rejects_rows_without_the_column() {
    let mut table = table_of(&[&["a", "b"], &["c"]]);
    let err = merge_column_range(&mut table, 1, 0..2, "top").expect_err("short row");
    assert!(matches!(err, EngineError::StructuralMismatch { .. }));
    assert_eq!(table.rows[0].cells[1].vmerge(), VMerge::None);
}

#[test]
fn equal_runs_become_blocks() {
    let mut table = table_of(&[&["Risk"], &["Leak"], &["leak "], &["Dust"], &["Dust"], &["Noise"]]);
    let built = vmerge::merge_equal_runs(&mut table, 0, 1..6, crate::text::match_key).expect("merge");
    assert_eq!(built, 2);
    assert_eq!(table.rows[1].cells[0].text(), "Leak");
    assert_eq!(table.rows[2].cells[0].vmerge(), VMerge::Continue);
    assert_eq!(table.rows[5].cells[0].vmerge(), VMerge::None);
}

#[test]
fn locator_resolves_columns_through_spans() {
    let mut header = Row::from_texts(&["Room number", "Point", "Area, m2"]);
    header.cells[0].set_grid_span(2);
    assert_eq!(find_column(&header, &["point"]), Some(2));
    assert_eq!(find_columns(&header, &["room"]), vec![0, 1]);
    assert_eq!(find_column(&header, &["volume"]), None);
}

#[test]
fn captions_match_whole_numbers_only() {
    let doc = Document::from_blocks(vec![
        Block::Paragraph(Paragraph::with_text("Таблица 51")),
        Block::Table(table_of(&[&["wrong"]])),
        Block::Paragraph(Paragraph::with_text("Таблица\u{00A0}5. Риски")),
        Block::Paragraph(Paragraph::new()),
        Block::Table(table_of(&[&["right"]])),
    ]);
    assert_eq!(locator::find_caption(&doc, "таблица", 5), Some(2));
    assert_eq!(locator::locate_numbered_table(&doc, "таблица", 5), Some(4));
    assert_eq!(locator::caption_above(&doc, 4, "таблица", 5), Some(2));
    assert_eq!(locator::caption_above(&doc, 1, "таблица", 5), None);
    assert_eq!(find_table(&doc, locator::any_row_contains(Keywords::all(&["right"]))), Some(4));
}

#[test]
fn split_moves_overflow_into_continuation() {
    let config = EngineConfig::english();
    let oracle = budget(&config);
    let mut doc = captioned(numbered_table(2, 10), vec![Block::Paragraph(Paragraph::with_text("Notes"))]);

    let outcome = TableSplitter::new(&config, &oracle).split(&mut doc, 5).expect("split");
    assert_eq!(
        outcome,
        SplitOutcome::Split {
            fragments: 2,
            cut_rows: vec![6]
        }
    );

    assert_eq!(doc.body.len(), 6);
    assert_eq!(doc.table(1).expect("first fragment").rows.len(), 6);
    assert!(doc.body[2].as_paragraph().expect("break").has_page_break());

    let caption = doc.body[3].as_paragraph().expect("caption");
    assert_eq!(caption.text(), "Continuation of Table 5");
    assert_eq!(caption.alignment(), Some("right"));
    assert!(caption.props.has("keepNext"));
    assert!(caption.runs().all(|run| run.is_bold()));

    let second = doc.table(4).expect("second fragment");
    assert_eq!(second.rows.len(), 8);
    assert!(second.rows[0].is_header() && second.rows[1].is_header());
    assert!(!second.rows[2].is_header());
    assert_eq!(second.rows[2].cells[0].text(), "risk 4");
    assert_eq!(continuation_count(&doc, "Continuation of Table 5"), 1);
}

#[test]
fn split_is_idempotent() {
    let config = EngineConfig::english();
    let oracle = budget(&config);
    let mut doc = captioned(numbered_table(2, 10), Vec::new());
    let splitter = TableSplitter::new(&config, &oracle);

    splitter.split(&mut doc, 5).expect("first split");
    let after_first = doc.clone();
    let second = splitter.split(&mut doc, 5).expect("second split");
    assert_eq!(second, SplitOutcome::AlreadySplit);
    assert_eq!(doc, after_first);
}

#[test]
fn split_preserves_every_data_row_once() {
    let config = EngineConfig::english();
    let oracle = budget(&config);
    let mut doc = captioned(numbered_table(2, 20), Vec::new());

    let outcome = TableSplitter::new(&config, &oracle).split(&mut doc, 5).expect("split");
    assert_eq!(
        outcome,
        SplitOutcome::Split {
            fragments: 4,
            cut_rows: vec![6, 12, 18]
        }
    );

    let data: Vec<String> = doc
        .tables()
        .flat_map(|(_, table)| table.rows.iter().skip(2))
        .map(|row| row.cells[0].text())
        .collect();
    let expected: Vec<String> = (0..20).map(|index| format!("risk {index}")).collect();
    assert_eq!(data, expected);
    assert_eq!(continuation_count(&doc, "Continuation of Table 5"), 3);
}

#[test]
fn split_never_tears_a_merge_block() {
    let config = EngineConfig::english();
    let oracle = budget(&config);
    let mut table = numbered_table(2, 10);
    merge_column_range(&mut table, 0, 5..9, "risk 3").expect("merge");
    let mut doc = captioned(table, Vec::new());

    let outcome = TableSplitter::new(&config, &oracle).split(&mut doc, 5).expect("split");
    assert_eq!(
        outcome,
        SplitOutcome::Split {
            fragments: 3,
            cut_rows: vec![5, 11]
        }
    );
    let continuation = doc.table(4).expect("continuation");
    assert_eq!(continuation.rows[2].cells[0].vmerge(), VMerge::Start);
    assert_eq!(continuation.rows[2].cells[0].text(), "risk 3");
    assert_eq!(merge_blocks(continuation, 0), vec![2..6]);
    assert!(merge_blocks(doc.table(1).expect("first"), 0).is_empty());
}

fn data_rows_per_fragment(doc: &Document, header_rows: usize) -> Vec<usize> {
    doc.tables()
        .map(|(_, table)| table.rows.len().saturating_sub(header_rows))
        .collect()
}

#[test]
fn cut_moved_before_a_block_restarts_the_page_budget() {
    let config = EngineConfig::english();
    let oracle = budget(&config);
    let mut table = numbered_table(2, 20);
    merge_column_range(&mut table, 0, 5..9, "risk 3").expect("merge");
    let mut doc = captioned(table, Vec::new());

    let outcome = TableSplitter::new(&config, &oracle).split(&mut doc, 5).expect("split");
    assert_eq!(
        outcome,
        SplitOutcome::Split {
            fragments: 4,
            cut_rows: vec![5, 11, 17]
        }
    );
    let sizes = data_rows_per_fragment(&doc, 2);
    assert_eq!(sizes, vec![3, 6, 6, 5]);
    assert!(sizes.iter().skip(1).all(|rows| *rows <= 6));
}

#[test]
fn page_map_cuts_are_measured_from_the_aligned_cut() {
    let mut pages = Vec::new();
    for row in 0..18 {
        let page = if row < 6 { 1 } else if row < 12 { 2 } else { 3 };
        pages.push(format!("[{page},{page}]"));
    }
    let oracle = PageMapOracle::from_json(&format!(r#"{{"tables": {{"0": [{}]}}}}"#, pages.join(",")))
        .expect("page map");
    let config = EngineConfig::english();
    let profile = SplitProfile {
        table_number: 5,
        header_rows: 2,
        ..SplitProfile::table5()
    };
    let mut table = numbered_table(2, 16);
    merge_column_range(&mut table, 0, 5..8, "risk 3").expect("merge");
    let mut doc = captioned(table, Vec::new());

    let outcome = TableSplitter::new(&config, &oracle)
        .split_at(&mut doc, 1, &profile)
        .expect("split");
    assert_eq!(
        outcome,
        SplitOutcome::Split {
            fragments: 4,
            cut_rows: vec![5, 11, 17]
        }
    );
    assert_eq!(data_rows_per_fragment(&doc, 2), vec![3, 6, 6, 1]);
}

#[test]
fn continuation_of_another_table_number_is_not_a_prior_split() {
    let config = EngineConfig::english();
    let profile = SplitProfile {
        table_number: 1,
        ..SplitProfile::table5()
    };
    let oracle = RowBudgetOracle::from_profile(&profile);
    let mut doc = Document::from_blocks(vec![
        Block::Paragraph(Paragraph::with_text("Table 1 - Rooms")),
        Block::Table(numbered_table(2, 10)),
        Block::Paragraph(Paragraph::with_text("Continuation of Table 12")),
    ]);

    let outcome = TableSplitter::new(&config, &oracle)
        .split_at(&mut doc, 1, &profile)
        .expect("split");
    assert!(matches!(outcome, SplitOutcome::Split { .. }));
    assert_eq!(continuation_count(&doc, "Continuation of Table 1"), 1);
}

#[test]
fn short_table_needs_no_split() {
    let config = EngineConfig::english();
    let oracle = budget(&config);
    let mut doc = captioned(numbered_table(2, 4), Vec::new());
    let before = doc.clone();
    let outcome = TableSplitter::new(&config, &oracle).split(&mut doc, 5).expect("split");
    assert_eq!(outcome, SplitOutcome::NotNeeded);
    assert_eq!(doc, before);
}

#[test]
fn missing_caption_is_not_found() {
    let config = EngineConfig::english();
    let oracle = budget(&config);
    let mut doc = captioned(numbered_table(2, 10), Vec::new());
    let err = TableSplitter::new(&config, &oracle).split(&mut doc, 7).expect_err("no table 7");
    assert!(err.is_recoverable());
}

#[test]
fn table_after_last_fragment_gets_guard_paragraph() {
    let config = EngineConfig::english();
    let oracle = budget(&config);
    let mut doc = captioned(numbered_table(2, 10), vec![Block::Table(table_of(&[&["next"]]))]);

    TableSplitter::new(&config, &oracle).split(&mut doc, 5).expect("split");
    assert_eq!(doc.body.len(), 7);
    assert!(doc.body[5].as_paragraph().is_some_and(Paragraph::is_blank));
    assert_eq!(doc.table(6).expect("following table").rows[0].text(), "next");
}

#[test]
fn page_map_oracle_cuts_at_straddling_row() {
    let oracle = PageMapOracle::from_json(
        r#"{"tables": {"0": [[1,1],[1,1],[1,1],[1,2],[2,2],[2,2]]}}"#,
    )
    .expect("page map");
    let config = EngineConfig::english();
    let profile = SplitProfile {
        table_number: 5,
        header_rows: 2,
        ..SplitProfile::table5()
    };
    let mut doc = captioned(numbered_table(2, 4), Vec::new());

    let outcome = TableSplitter::new(&config, &oracle)
        .split_at(&mut doc, 1, &profile)
        .expect("split");
    assert_eq!(
        outcome,
        SplitOutcome::Split {
            fragments: 2,
            cut_rows: vec![3]
        }
    );
    assert_eq!(doc.table(4).expect("continuation").rows.len(), 5);
}

#[test]
fn page_map_without_entries_is_unavailable() {
    let missing = PageMapOracle::load(std::path::Path::new("/nonexistent/pages.json")).expect_err("missing file");
    assert!(matches!(missing, EngineError::ExternalToolUnavailable { .. }));

    let oracle = PageMapOracle::from_json(r#"{"tables": {}}"#).expect("empty map");
    let config = EngineConfig::english();
    let mut doc = captioned(numbered_table(2, 10), Vec::new());
    let before = doc.clone();
    let err = TableSplitter::new(&config, &oracle).split(&mut doc, 5).expect_err("no spans");
    assert!(matches!(err, EngineError::ExternalToolUnavailable { .. }));
    assert_eq!(doc, before);
}

#[test]
fn adjacent_tables_join_across_blank_paragraphs() {
    let mut doc = Document::from_blocks(vec![
        Block::Table(table_of(&[&["a"]])),
        Block::Paragraph(Paragraph::new()),
        Block::Paragraph(Paragraph::with_text("  ")),
        Block::Table(table_of(&[&["b"], &["c"]])),
        Block::Paragraph(Paragraph::with_text("tail")),
    ]);
    assert!(join_adjacent_tables(&mut doc, 0).expect("join"));
    assert_eq!(doc.body.len(), 2);
    assert_eq!(doc.table(0).expect("joined").rows.len(), 3);

    let mut doc = Document::from_blocks(vec![
        Block::Table(table_of(&[&["a"]])),
        Block::Paragraph(Paragraph::with_text("text")),
        Block::Table(table_of(&[&["b"]])),
    ]);
    assert!(!join_adjacent_tables(&mut doc, 0).expect("no join"));
    assert_eq!(doc.body.len(), 3);
}

#[test]
fn marker_split_starts_new_table_after_marker() {
    let mut doc = Document::from_blocks(vec![
        Block::Table(table_of(&[
            &["Test 4. Pressure"],
            &["Test results"],
            &["Room", "Pa"],
            &["101", "15"],
            &["102", "12"],
        ])),
        Block::Table(table_of(&[&["unrelated"]])),
    ]);

    let predicate = locator::first_rows_contain(Keywords::all(&["test"]), 1);
    let split = split_after_marker_row(&mut doc, predicate, &Keywords::all(&["test results"]), 1).expect("split");
    assert_eq!(split, 1);
    assert_eq!(doc.body.len(), 3);
    assert_eq!(doc.table(0).expect("head").rows.len(), 2);

    let tail = doc.table(1).expect("tail");
    assert_eq!(tail.rows.len(), 3);
    assert!(tail.rows[0].is_header());
    assert!(!tail.rows[1].is_header());
    assert_eq!(doc.table(2).expect("untouched").rows[0].text(), "unrelated");
}

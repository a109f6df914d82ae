use std::io::Write;

use super::*;

#[test]
fn default_profiles_match_observed_templates() {
    let config = EngineConfig::default();
    let table5 = config.split_profile(5);
    assert_eq!(table5.header_rows, 2);
    assert_eq!(table5.first_page_rows, 4);
    assert_eq!(table5.next_page_rows, 6);

    let table2 = config.split_profile(2);
    assert_eq!(table2.header_rows, 1);
    assert_eq!(table2.max_splits, 20);
}

#[test]
fn unknown_table_number_falls_back_to_table5_budgets() {
    let profile = EngineConfig::default().split_profile(9);
    assert_eq!(profile.table_number, 9);
    assert_eq!(profile.first_page_rows, 4);
}

#[test]
fn continuation_text_substitutes_number() {
    assert_eq!(
        Vocabulary::english().continuation_text(5),
        "Continuation of Table 5"
    );
    assert_eq!(
        Vocabulary::russian().continuation_text(2),
        "Продолжение таблицы 2"
    );
}

#[test]
fn load_merges_partial_json_with_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    write!(
        file,
        r#"{{"split_profiles": [{{"table_number": 5, "first_page_rows": 3}}], "caption": {{"size_pt": 11.0}}}}"#
    )
    .expect("write config");

    let config = EngineConfig::load(Some(file.path())).expect("load config");
    let profile = config.split_profile(5);
    assert_eq!(profile.first_page_rows, 3);
    assert_eq!(profile.header_rows, 2);
    assert_eq!(config.caption.size_pt, 11.0);
    assert_eq!(config.caption.font, "Times New Roman");
    assert_eq!(config.vocabulary.rooms_header, "номер помещения");
    assert_eq!(config.idempotency_window, 8);
}

#[test]
fn load_without_path_returns_defaults() {
    let config = EngineConfig::load(None).expect("defaults");
    assert_eq!(config.split_profiles.len(), 2);
}

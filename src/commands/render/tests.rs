use std::path::Path;

use serde_json::json;

use super::*;
use crate::config::EngineConfig;
use crate::docx::{Block, Document, DocxPackage, Paragraph, Row, Table};
use crate::model::{RenderManifest, StepOutcome};
use crate::util::{read_json, write_json_pretty};

fn table_of(rows: &[&[&str]]) -> Table {
    Table::from_rows(rows.iter().map(|cells| Row::from_texts(cells)).collect())
}

fn save(path: &Path, blocks: Vec<Block>) {
    DocxPackage::from_document(Document::from_blocks(blocks))
        .save(path)
        .expect("save fixture");
}

fn template_with(path: &Path, with_rooms: bool, with_equipment: bool) {
    let mut blocks = vec![Block::Paragraph(Paragraph::with_text("Protocol {{ number }}"))];
    if with_rooms {
        blocks.push(Block::Table(table_of(&[&["Room number", "##", "####"], &["#", "##", "####"]])));
    }
    if with_equipment {
        blocks.push(Block::Table(table_of(&[
            &["Name", "Parameters", "Certificate", "Validity"],
            &["@1", "@2", "@3", "@4"],
        ])));
    }
    blocks.push(Block::Paragraph(Paragraph::with_text("{{TABLE}}")));
    blocks.push(Block::Paragraph(Paragraph::with_text("End")));
    save(path, blocks);
}

fn template(path: &Path, with_equipment: bool) {
    template_with(path, true, with_equipment);
}

fn test_bank(path: &Path) {
    save(
        path,
        vec![Block::Table(table_of(&[
            &["Test 5. Check of supply air flow", "", "", "", "", "", "", "", ""],
            &["Test results", "", "", "", "", "", "", "", ""],
            &["Filter", "S", "Point", "Speed", "Actual flow", "Actual total", "Criterion", "YES", "NO"],
            &["Room {room}", "", "", "", "", "", "", "", ""],
            &["{filter_num}", "{S}", "{num}", "{avg_speed}", "{fact}", "{fact}", "", "", ""],
            &["Comments", "", "", "", "", "", "", "", ""],
        ]))],
    );
}

fn report_template(path: &Path) {
    save(
        path,
        vec![
            Block::Paragraph(Paragraph::with_text("Report {{number}} for {{ object }}")),
            Block::Table(table_of(&[&["Room number", "##", "####"], &["#", "##", "####"]])),
            Block::Paragraph(Paragraph::with_text("Table 2 Summary of results")),
            Block::Paragraph(Paragraph::with_text("")),
            Block::Table(table_of(&[
                &["Test", "Acceptance criteria", "Actual result", "Assessment"],
                &["#T2_TEST", "#T2_CRIT", "#T2_FACT", "#T2_EVAL"],
            ])),
        ],
    );
}

fn job(path: &Path) {
    let job = json!({
        "context": {"number": "P-7", "object": "Block A"},
        "report_context": {"number": "R-7"},
        "rooms": [
            {"num": "101", "name": "Gowning", "area": "12,5", "volume": 30},
            {"num": "102", "name": "Store", "area": 8, "volume": "24"}
        ],
        "equipment": [
            {"name_sn": "Anemometer / 17", "params": "0-30 m/s", "cert": "C-1", "date": "2024-03-01", "until": "2025-03-01"}
        ],
        "selected_tests": ["1. Check of supply air flow"],
        "report_rows": [
            {"test": "Check of supply air flow", "crit": "≥ design", "fact": "1800", "eval": ""}
        ],
        "airflow": [
            {"num": "101", "name": "Gowning", "S": "0,5", "criterion": 1500,
             "filters": [{"speeds": ["0,5", "0,5"]}]},
            {"num": "102", "name": "Store", "S": 1,
             "filters": [{"speeds": [0.2]}]}
        ]
    });
    write_json_pretty(path, &job).expect("write job");
}

fn request(dir: &Path) -> RenderRequest {
    RenderRequest {
        job: dir.join("job.json"),
        template: dir.join("template.docx"),
        test_bank: Some(dir.join("bank.docx")),
        output: dir.join("out").join("protocol.docx"),
        manifest_path: dir.join("out").join("protocol.manifest.json"),
        page_map: None,
        split: true,
        report: None,
        config: EngineConfig::english(),
    }
}

fn outcome<'a>(manifest: &'a RenderManifest, step: &str) -> Option<&'a StepOutcome> {
    manifest
        .steps
        .iter()
        .find(|record| record.step == step)
        .map(|record| &record.outcome)
}

#[test]
fn render_fills_template_and_writes_manifest() {
    let dir = tempfile::tempdir().expect("tempdir");
    template(&dir.path().join("template.docx"), true);
    test_bank(&dir.path().join("bank.docx"));
    job(&dir.path().join("job.json"));
    let request = request(dir.path());

    let mut stages = Vec::new();
    let manifest = render(&request, &mut |step: usize, message: &str| stages.push((step, message.to_string())))
        .expect("render");

    assert_eq!(stages.first().map(|(step, _)| *step), Some(1));
    assert!(stages.windows(2).all(|pair| pair[1].0 == pair[0].0 + 1));
    assert_eq!(outcome(&manifest, "context"), Some(&StepOutcome::Applied));
    assert_eq!(outcome(&manifest, "rooms"), Some(&StepOutcome::Applied));
    assert_eq!(outcome(&manifest, "equipment"), Some(&StepOutcome::Applied));
    assert_eq!(outcome(&manifest, "test11_airflow"), Some(&StepOutcome::Applied));
    assert_eq!(outcome(&manifest, "test_tables"), Some(&StepOutcome::Applied));
    assert!(matches!(outcome(&manifest, "risk_table"), Some(StepOutcome::Skipped(_))));
    assert!(matches!(outcome(&manifest, "split"), Some(StepOutcome::Skipped(_))));
    assert!(manifest.missing.is_empty());
    assert_eq!(manifest.splits.len(), 2);
    assert_eq!(manifest.output.sha256.len(), 64);
    assert!(manifest.report.is_none());

    let written: RenderManifest = read_json(&request.manifest_path).expect("manifest json");
    assert_eq!(written.run_id, manifest.run_id);

    let output = DocxPackage::open(&request.output).expect("open output");
    assert_eq!(output.document.body[0].as_paragraph().map(Paragraph::text).as_deref(), Some("Protocol P-7"));
    let tables: Vec<&Table> = output.document.tables().map(|(_, table)| table).collect();
    assert_eq!(tables.len(), 3);
    assert_eq!(tables[0].rows[1].text(), "101 Gowning 12,5");
    assert_eq!(tables[0].rows[2].text(), "102 Store 8");
    assert_eq!(tables[1].rows[1].cells[3].text(), "01.03.2024 / 01.03.2025");
    assert_eq!(tables[2].rows[0].cells[0].text(), "Test 11.1 Check of supply air flow");
    assert_eq!(tables[2].rows[3].cells[0].text(), "Room 101:Gowning");
    assert_eq!(tables[2].rows[4].cells[5].text(), "900,00");
    assert_eq!(tables[2].rows[6].cells[0].text(), "Room 102:Store");
    assert!(tables[2].is_fixed_layout());
}

#[test]
fn render_aborts_when_equipment_table_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    template(&dir.path().join("template.docx"), false);
    test_bank(&dir.path().join("bank.docx"));
    job(&dir.path().join("job.json"));
    let request = request(dir.path());

    let err = render(&request, &mut |_: usize, _: &str| {}).expect_err("equipment is required");
    assert!(format!("{err:#}").contains("equipment"));
    assert!(!request.output.exists());
}

#[test]
fn render_aborts_when_rooms_table_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    template_with(&dir.path().join("template.docx"), false, true);
    test_bank(&dir.path().join("bank.docx"));
    job(&dir.path().join("job.json"));
    let request = request(dir.path());

    let err = render(&request, &mut |_: usize, _: &str| {}).expect_err("rooms table is required");
    let message = format!("{err:#}");
    assert!(message.contains("rooms"));
    assert!(message.contains("room number"));
    assert!(!request.output.exists());
    assert!(!request.manifest_path.exists());
}

#[test]
fn render_writes_report_alongside_protocol() {
    let dir = tempfile::tempdir().expect("tempdir");
    template(&dir.path().join("template.docx"), true);
    test_bank(&dir.path().join("bank.docx"));
    report_template(&dir.path().join("report_template.docx"));
    job(&dir.path().join("job.json"));
    let mut request = request(dir.path());
    request.report = Some(ReportTarget {
        template: dir.path().join("report_template.docx"),
        output: dir.path().join("out").join("report.docx"),
    });

    let manifest = render(&request, &mut |_: usize, _: &str| {}).expect("render");
    assert_eq!(outcome(&manifest, "report_rooms"), Some(&StepOutcome::Applied));
    assert_eq!(outcome(&manifest, "report_summary"), Some(&StepOutcome::Applied));
    assert_eq!(outcome(&manifest, "report_caption"), Some(&StepOutcome::Applied));
    assert_eq!(outcome(&manifest, "report_save"), Some(&StepOutcome::Applied));
    assert!(manifest.missing.is_empty());
    assert_eq!(manifest.report.as_ref().map(|digest| digest.sha256.len()), Some(64));

    let report = DocxPackage::open(&dir.path().join("out").join("report.docx")).expect("open report");
    let body = &report.document.body;
    assert_eq!(body[0].as_paragraph().map(Paragraph::text).as_deref(), Some("Report R-7 for Block A"));
    assert!(matches!(body[3], Block::Table(_)));
    let tables: Vec<&Table> = report.document.tables().map(|(_, table)| table).collect();
    assert_eq!(tables[0].rows[1].text(), "101 Gowning 12,5");
    assert_eq!(tables[1].rows[1].text(), "Check of supply air flow ≥ design 1800 Compliant");
}

#[test]
fn output_may_not_replace_template() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut onto_template = request(dir.path());
    onto_template.output = onto_template.template.clone();
    assert!(ensure_distinct_output(&onto_template).is_err());

    let mut onto_report_template = request(dir.path());
    onto_report_template.report = Some(ReportTarget {
        template: dir.path().join("report.docx"),
        output: dir.path().join("report.docx"),
    });
    assert!(ensure_distinct_output(&onto_report_template).is_err());
}

#[test]
fn worker_reports_failure_through_events() {
    let dir = tempfile::tempdir().expect("tempdir");
    let worker = RenderWorker::spawn(request(dir.path())).expect("spawn");

    let events: Vec<RenderEvent> = worker.events.iter().collect();
    assert_eq!(
        events.first(),
        Some(&RenderEvent::Progress {
            step: 1,
            message: "validating inputs".to_string(),
        })
    );
    match events.last() {
        Some(RenderEvent::Finished {
            success,
            message,
            missing,
        }) => {
            assert!(!success);
            assert!(message.contains("job.json"));
            assert!(missing.is_empty());
        }
        other => panic!("unexpected final event: {other:?}"),
    }
    assert!(worker.join().expect("join").is_none());
}

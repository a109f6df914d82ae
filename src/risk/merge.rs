use std::collections::HashMap;

use tracing::debug;

use crate::error::EngineResult;
use crate::model::{Grade, RiskRow, RiskSourceRow};
use crate::text::{is_match, match_key, strip_test_prefix};

use super::source::{SourceRiskRow, read_source_rows};

type DedupKey = (String, String, Grade, Grade, Grade, Grade);

pub fn selected_names(selected_tests: &[String]) -> Vec<String> {
    selected_tests
        .iter()
        .map(|test| strip_test_prefix(test))
        .filter(|name| !name.is_empty())
        .collect()
}

// Tests of the row that match the selection, in selection order.
pub fn filter_tests(tests: &[String], selection: &[String]) -> Vec<String> {
    if selection.is_empty() {
        return tests.to_vec();
    }

    let mut matched: Vec<String> = Vec::new();
    for name in selection {
        for test in tests {
            if is_match(name, test) && !matched.contains(test) {
                matched.push(test.clone());
            }
        }
    }
    matched
}

fn to_risk_row(source: SourceRiskRow, tests: Vec<String>) -> RiskRow {
    RiskRow {
        risk: source.risk,
        cause: source.cause,
        probability: Grade::new(&source.probability.0, &source.probability.1),
        severity: Grade::new(&source.severity.0, &source.severity.1),
        detection: Grade::new(&source.detection.0, &source.detection.1),
        level: Grade::new(&source.level, &source.rpn),
        tests,
    }
}

fn dedup_key(row: &RiskRow) -> DedupKey {
    (
        match_key(&row.risk),
        match_key(&row.cause),
        row.probability.clone(),
        row.severity.clone(),
        row.detection.clone(),
        row.level.clone(),
    )
}

pub fn merge_rows(rows: Vec<RiskRow>) -> Vec<RiskRow> {
    let mut merged: Vec<RiskRow> = Vec::new();
    let mut index: HashMap<DedupKey, usize> = HashMap::new();

    for row in rows {
        let key = dedup_key(&row);
        match index.get(&key) {
            Some(position) => {
                let existing = &mut merged[*position];
                for test in row.tests {
                    if !existing.tests.contains(&test) {
                        existing.tests.push(test);
                    }
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(row);
            }
        }
    }
    merged
}

pub fn build_risk_rows(
    source_rows: &[RiskSourceRow],
    selected_tests: &[String],
) -> EngineResult<Vec<RiskRow>> {
    let selection = selected_names(selected_tests);
    let mut rows = Vec::new();
    for source in read_source_rows(source_rows)? {
        let tests = filter_tests(&source.tests, &selection);
        if !selection.is_empty() && tests.is_empty() {
            continue;
        }
        rows.push(to_risk_row(source, tests));
    }

    let before = rows.len();
    let merged = merge_rows(rows);
    debug!(source = before, merged = merged.len(), "merged risk rows");
    Ok(merged)
}

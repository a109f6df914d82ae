use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::model::{RiskSourceRow, value_text};
use crate::text::{format_score, normalize, split_test_list};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskColumn {
    Risk,
    Cause,
    ProbabilityLetter,
    ProbabilityScore,
    SeverityLetter,
    SeverityScore,
    DetectionLetter,
    DetectionScore,
    Level,
    Rpn,
    Tests,
}

impl RiskColumn {
    pub const ALL: [RiskColumn; 11] = [
        RiskColumn::Risk,
        RiskColumn::Cause,
        RiskColumn::ProbabilityLetter,
        RiskColumn::ProbabilityScore,
        RiskColumn::SeverityLetter,
        RiskColumn::SeverityScore,
        RiskColumn::DetectionLetter,
        RiskColumn::DetectionScore,
        RiskColumn::Level,
        RiskColumn::Rpn,
        RiskColumn::Tests,
    ];

    fn aliases(self) -> &'static [&'static str] {
        match self {
            RiskColumn::Risk => &["риск", "risk"],
            RiskColumn::Cause => &["возможная причина", "possible cause", "cause"],
            RiskColumn::ProbabilityLetter => &["вероятность оценка", "probability grade"],
            RiskColumn::ProbabilityScore => &["вероятность балл", "probability score"],
            RiskColumn::SeverityLetter => &["тяжесть оценка", "severity grade"],
            RiskColumn::SeverityScore => &["тяжесть балл", "severity score"],
            RiskColumn::DetectionLetter => &["необнаружение оценка", "detection grade"],
            RiskColumn::DetectionScore => &["необнаружение балл", "detection score"],
            RiskColumn::Level => &["уровень риска", "risk level"],
            RiskColumn::Rpn => &["пчр", "rpn"],
            RiskColumn::Tests => &[
                "аттестационное испытание",
                "квалификационное испытание",
                "qualification test",
                "qualification tests",
            ],
        }
    }

    fn is_score(self) -> bool {
        matches!(
            self,
            RiskColumn::ProbabilityScore
                | RiskColumn::SeverityScore
                | RiskColumn::DetectionScore
                | RiskColumn::Rpn
        )
    }
}

pub fn header_key(header: &str) -> String {
    normalize(&header.replace('_', " "))
}

// Resolved sheet header for each logical column.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    columns: BTreeMap<RiskColumn, String>,
}

impl HeaderMap {
    pub fn resolve(rows: &[RiskSourceRow]) -> EngineResult<Self> {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            for key in row.keys() {
                headers
                    .entry(header_key(key))
                    .or_insert_with(|| key.clone());
            }
        }

        let mut columns = BTreeMap::new();
        let mut missing = Vec::new();
        for column in RiskColumn::ALL {
            let found = column
                .aliases()
                .iter()
                .find_map(|alias| headers.get(*alias));
            match found {
                Some(header) => {
                    columns.insert(column, header.clone());
                }
                None => missing.push(column.aliases()[0]),
            }
        }

        if !rows.is_empty() && !missing.is_empty() {
            return Err(EngineError::mismatch(format!(
                "risk sheet lacks columns: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { columns })
    }

    pub fn value(&self, row: &RiskSourceRow, column: RiskColumn) -> String {
        let raw = self
            .columns
            .get(&column)
            .and_then(|header| row.get(header))
            .map(value_text)
            .unwrap_or_default();
        if column.is_score() {
            format_score(&raw)
        } else {
            raw
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRiskRow {
    pub risk: String,
    pub cause: String,
    pub probability: (String, String),
    pub severity: (String, String),
    pub detection: (String, String),
    pub level: String,
    pub rpn: String,
    pub tests: Vec<String>,
}

impl SourceRiskRow {
    pub fn is_empty(&self) -> bool {
        self.risk.is_empty() && self.cause.is_empty() && self.tests.is_empty()
    }
}

pub fn read_source_rows(rows: &[RiskSourceRow]) -> EngineResult<Vec<SourceRiskRow>> {
    let header = HeaderMap::resolve(rows)?;
    Ok(rows
        .iter()
        .map(|row| SourceRiskRow {
            risk: header.value(row, RiskColumn::Risk),
            cause: header.value(row, RiskColumn::Cause),
            probability: (
                header.value(row, RiskColumn::ProbabilityLetter),
                header.value(row, RiskColumn::ProbabilityScore),
            ),
            severity: (
                header.value(row, RiskColumn::SeverityLetter),
                header.value(row, RiskColumn::SeverityScore),
            ),
            detection: (
                header.value(row, RiskColumn::DetectionLetter),
                header.value(row, RiskColumn::DetectionScore),
            ),
            level: header.value(row, RiskColumn::Level),
            rpn: header.value(row, RiskColumn::Rpn),
            tests: split_test_list(&header.value(row, RiskColumn::Tests)),
        })
        .filter(|row| !row.is_empty())
        .collect())
}

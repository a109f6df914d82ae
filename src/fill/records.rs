use crate::engine::RowRecord;
use crate::model::{EquipmentItem, ReportRow, RiskRow, Room};

use super::equipment::format_validity;

impl RowRecord for Room {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "label" => Some(self.label()),
            other => Room::field(self, other).map(str::to_string),
        }
    }
}

impl RowRecord for EquipmentItem {
    fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "name_serial" => self.name_serial.clone(),
            "parameters" => self.parameters.clone(),
            "certificate" => self.certificate.clone(),
            "validity" => format_validity(&self.validity()),
            _ => return None,
        };
        Some(value)
    }
}

impl RowRecord for ReportRow {
    fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "test" => &self.test,
            "crit" => &self.crit,
            "fact" => &self.fact,
            "eval" => &self.eval,
            _ => return None,
        };
        Some(value.clone())
    }
}

// Risk rows expose their grades through the `<<T5_*>>` marker names.
#[derive(Debug, Clone, Copy)]
pub struct RiskRecord<'a>(pub &'a RiskRow);

impl RowRecord for RiskRecord<'_> {
    fn field(&self, name: &str) -> Option<String> {
        let row = self.0;
        let value = match name {
            "risk" => row.risk.clone(),
            "cause" => row.cause.clone(),
            "probability" => row.probability.letter.clone(),
            "probability_score" => row.probability.score.clone(),
            "severity" => row.severity.letter.clone(),
            "severity_score" => row.severity.score.clone(),
            "detection" => row.detection.letter.clone(),
            "detection_score" => row.detection.score.clone(),
            "level" => row.level.letter.clone(),
            "rpn" => row.level.score.clone(),
            "tests" => row.tests.join("\n"),
            _ => return None,
        };
        Some(value)
    }
}

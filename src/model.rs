use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Job files come from spreadsheets; numbers and nulls are accepted wherever text is expected.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(&Value::deserialize(deserializer)?))
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values.iter().map(value_text).collect())
}

fn lenient_optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = value_text(&Value::deserialize(deserializer)?);
    Ok(Some(text).filter(|text| !text.trim().is_empty()))
}

fn lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .map(|(key, value)| (key.trim().to_string(), value_text(&value)))
        .collect())
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    #[serde(deserialize_with = "lenient_string")]
    pub num: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(alias = "klass", deserialize_with = "lenient_string")]
    pub class: String,
    #[serde(deserialize_with = "lenient_string")]
    pub area: String,
    #[serde(deserialize_with = "lenient_string")]
    pub volume: String,
    #[serde(alias = "dp", deserialize_with = "lenient_string")]
    pub pressure_delta: String,
    #[serde(deserialize_with = "lenient_string")]
    pub airflow: String,
    #[serde(alias = "exchange", deserialize_with = "lenient_string")]
    pub exchange_rate: String,
    #[serde(alias = "temp", deserialize_with = "lenient_string")]
    pub temperature: String,
    #[serde(alias = "rh", deserialize_with = "lenient_string")]
    pub humidity: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_flow: String,
    #[serde(deserialize_with = "lenient_string")]
    pub exchange_actual: String,
}

impl Room {
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "num" => &self.num,
            "name" => &self.name,
            "class" => &self.class,
            "area" => &self.area,
            "volume" => &self.volume,
            "pressure_delta" => &self.pressure_delta,
            "airflow" => &self.airflow,
            "exchange_rate" => &self.exchange_rate,
            "temperature" => &self.temperature,
            "humidity" => &self.humidity,
            "total_flow" => &self.total_flow,
            "exchange_actual" => &self.exchange_actual,
            _ => return None,
        };
        Some(value.as_str())
    }

    // "101:Corridor" when both parts are present.
    pub fn label(&self) -> String {
        let num = self.num.trim();
        let name = self.name.trim();
        match (num.is_empty(), name.is_empty()) {
            (false, false) => format!("{num}:{name}"),
            (false, true) => num.to_string(),
            _ => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentItem {
    #[serde(alias = "name_sn", deserialize_with = "lenient_string")]
    pub name_serial: String,
    #[serde(alias = "params", deserialize_with = "lenient_string")]
    pub parameters: String,
    #[serde(alias = "cert", deserialize_with = "lenient_string")]
    pub certificate: String,
    #[serde(alias = "date", deserialize_with = "lenient_string")]
    pub calibration_date: String,
    #[serde(alias = "until", deserialize_with = "lenient_string")]
    pub valid_until: String,
}

impl EquipmentItem {
    pub fn validity(&self) -> String {
        format!("{} / {}", self.calibration_date.trim(), self.valid_until.trim())
            .trim_matches(|ch: char| ch == ' ' || ch == '/')
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Grade {
    pub letter: String,
    pub score: String,
}

impl Grade {
    pub fn new(letter: &str, score: &str) -> Self {
        Self {
            letter: letter.trim().to_string(),
            score: score.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskRow {
    pub risk: String,
    pub cause: String,
    pub probability: Grade,
    pub severity: Grade,
    pub detection: Grade,
    pub level: Grade,
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRow {
    #[serde(deserialize_with = "lenient_string")]
    pub test: String,
    #[serde(deserialize_with = "lenient_string")]
    pub crit: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fact: String,
    #[serde(deserialize_with = "lenient_string")]
    pub eval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirflowFilter {
    #[serde(deserialize_with = "lenient_string")]
    pub filter_num: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub speeds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirflowRoom {
    #[serde(deserialize_with = "lenient_string")]
    pub num: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(alias = "klass", deserialize_with = "lenient_string")]
    pub class: String,
    #[serde(alias = "S", deserialize_with = "lenient_string")]
    pub area: String,
    #[serde(deserialize_with = "lenient_optional")]
    pub criterion: Option<String>,
    pub filters: Vec<AirflowFilter>,
}

pub type RiskSourceRow = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderJob {
    /// Scalar `{{ field }}` values: protocol number, object name, dates.
    #[serde(alias = "ctx_fields", deserialize_with = "lenient_map")]
    pub context: BTreeMap<String, String>,
    /// Overrides `context` in the report document.
    #[serde(alias = "ctx_fields_report", deserialize_with = "lenient_map")]
    pub report_context: BTreeMap<String, String>,
    pub rooms: Vec<Room>,
    pub equipment: Vec<EquipmentItem>,
    pub selected_tests: Vec<String>,
    pub risk_rows: Vec<RiskSourceRow>,
    pub report_rows: Vec<ReportRow>,
    pub airflow: Vec<AirflowRoom>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum StepOutcome {
    Applied,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDigest {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRecord {
    pub table: u32,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub run_id: String,
    pub template: FileDigest,
    pub test_bank: Option<FileDigest>,
    pub output: FileDigest,
    #[serde(default)]
    pub report: Option<FileDigest>,
    pub steps: Vec<StepRecord>,
    pub missing: Vec<String>,
    pub splits: Vec<SplitRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub ordinal: usize,
    pub body_index: usize,
    pub caption: Option<String>,
    pub rows: usize,
    pub columns: usize,
    pub first_row: String,
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::docx::Alignment;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vocabulary: Vocabulary,
    pub caption: CaptionStyle,
    pub split_profiles: Vec<SplitProfile>,
    pub idempotency_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::russian(),
            caption: CaptionStyle::default(),
            split_profiles: vec![SplitProfile::table5(), SplitProfile::report_table2()],
            idempotency_window: 8,
        }
    }
}

impl EngineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config json: {}", path.display()))?;
        Ok(config)
    }

    pub fn english() -> Self {
        Self {
            vocabulary: Vocabulary::english(),
            ..Self::default()
        }
    }

    pub fn split_profile(&self, table_number: u32) -> SplitProfile {
        self.split_profiles
            .iter()
            .find(|profile| profile.table_number == table_number)
            .cloned()
            .unwrap_or_else(|| SplitProfile {
                table_number,
                ..SplitProfile::table5()
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitProfile {
    pub table_number: u32,
    pub header_rows: usize,
    pub first_page_rows: usize,
    pub next_page_rows: usize,
    pub max_splits: usize,
}

impl Default for SplitProfile {
    fn default() -> Self {
        Self::table5()
    }
}

impl SplitProfile {
    pub fn table5() -> Self {
        Self {
            table_number: 5,
            header_rows: 2,
            first_page_rows: 4,
            next_page_rows: 6,
            max_splits: 20,
        }
    }

    pub fn report_table2() -> Self {
        Self {
            table_number: 2,
            header_rows: 1,
            first_page_rows: 8,
            next_page_rows: 14,
            max_splits: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub font: String,
    pub size_pt: f32,
    pub bold: bool,
    pub alignment: Alignment,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font: "Times New Roman".to_string(),
            size_pt: 12.0,
            bold: true,
            alignment: Alignment::Right,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub table_caption: String,
    pub continuation_caption: String,
    pub test_title: String,
    pub rooms_header: String,
    pub room_header_labels: BTreeMap<String, String>,
    pub results_header: Vec<String>,
    pub point_markers: Vec<String>,
    pub results_marker: String,
    pub comments_marker: String,
    pub mean_markers: Vec<String>,
    pub room_markers: Vec<String>,
    pub yes: String,
    pub no: String,
    pub total_flow_table: Vec<String>,
    pub airflow_test_markers: Vec<String>,
    pub room_prefix: String,
    pub room_total_column: Vec<String>,
    pub exchange_table: Vec<String>,
    pub exchange_markers: Vec<String>,
    pub total_flow_column: Vec<String>,
    pub actual_column: String,
    pub volume_column: String,
    pub legend_markers: Vec<String>,
    pub legend_level_markers: Vec<String>,
    pub report_table: Vec<String>,
    pub default_eval: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::russian()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn labels(values: &[(&str, &str)]) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(token, label)| (token.to_string(), label.to_string()))
        .collect()
}

impl Vocabulary {
    pub fn russian() -> Self {
        Self {
            table_caption: "таблица".to_string(),
            continuation_caption: "Продолжение таблицы {n}".to_string(),
            test_title: "Тест".to_string(),
            rooms_header: "номер помещения".to_string(),
            room_header_labels: labels(&[
                ("#", "Номер помещения"),
                ("##", "Наименование помещений"),
                ("###", "Класс чистоты"),
                ("####", "Площадь, м²"),
                ("#$", "Объём, м³"),
                ("#$$", "Перепад давления, Па (±5 Па)"),
                ("#$$$", "Расход приточного воздуха, м³/ч"),
                ("#%", "Кратность воздухообмена, ч⁻¹, не менее"),
                ("#%%", "Температура, °C"),
                ("#%%%", "Относительная влажность, %"),
            ]),
            results_header: strings(&["номер помещени", "площад"]),
            point_markers: strings(&["точк", "№"]),
            results_marker: "результаты испытани".to_string(),
            comments_marker: "комментари".to_string(),
            mean_markers: strings(&["средне", "average"]),
            room_markers: strings(&["помещен", "{$#}", "{room}", "###"]),
            yes: "ДА".to_string(),
            no: "НЕТ".to_string(),
            total_flow_table: strings(&["расход приточного воздуха", "фактический суммарный"]),
            airflow_test_markers: strings(&["проверка", "расхода", "приточ"]),
            room_prefix: "помещение".to_string(),
            room_total_column: strings(&["фактическ", "суммарн"]),
            exchange_table: strings(&["тест", "11.2"]),
            exchange_markers: strings(&["кратност", "чп"]),
            total_flow_column: strings(&["общий", "расход"]),
            actual_column: "фактическ".to_string(),
            volume_column: "объем".to_string(),
            legend_markers: strings(&["вероятност", "балл"]),
            legend_level_markers: strings(&["уровен", "риска"]),
            report_table: strings(&["тест", "критер", "фактичес", "оценк"]),
            default_eval: "Соответствует".to_string(),
        }
    }

    pub fn english() -> Self {
        Self {
            table_caption: "table".to_string(),
            continuation_caption: "Continuation of Table {n}".to_string(),
            test_title: "Test".to_string(),
            rooms_header: "room number".to_string(),
            room_header_labels: labels(&[
                ("#", "Room number"),
                ("##", "Room name"),
                ("###", "Cleanliness class"),
                ("####", "Area, m²"),
                ("#$", "Volume, m³"),
                ("#$$", "Pressure differential, Pa (±5 Pa)"),
                ("#$$$", "Supply air flow, m³/h"),
                ("#%", "Air exchange rate, h⁻¹, min"),
                ("#%%", "Temperature, °C"),
                ("#%%%", "Relative humidity, %"),
            ]),
            results_header: strings(&["room number", "area"]),
            point_markers: strings(&["point", "№"]),
            results_marker: "test results".to_string(),
            comments_marker: "comments".to_string(),
            mean_markers: strings(&["mean", "average"]),
            room_markers: strings(&["room", "{$#}", "{room}", "###"]),
            yes: "YES".to_string(),
            no: "NO".to_string(),
            total_flow_table: strings(&["supply air flow", "actual total"]),
            airflow_test_markers: strings(&["check", "supply", "air"]),
            room_prefix: "room".to_string(),
            room_total_column: strings(&["actual", "total"]),
            exchange_table: strings(&["test", "11.2"]),
            exchange_markers: strings(&["exchange", "ach"]),
            total_flow_column: strings(&["total", "flow"]),
            actual_column: "actual".to_string(),
            volume_column: "volume".to_string(),
            legend_markers: strings(&["probability", "score"]),
            legend_level_markers: strings(&["level", "risk"]),
            report_table: strings(&["test", "criteri", "actual", "assessment"]),
            default_eval: "Compliant".to_string(),
        }
    }

    pub fn continuation_text(&self, table_number: u32) -> String {
        self.continuation_caption
            .replace("{n}", &table_number.to_string())
    }
}

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{RoomAirflow, compute_airflow};
use crate::cli::{AirflowArgs, SplitBudgetArgs};
use crate::commands::load_config;
use crate::docx::DocxPackage;
use crate::fill::fill_airflow_table;
use crate::model::AirflowRoom;
use crate::text::format_decimal;
use crate::util::{read_json, write_json_stdout};

#[derive(Debug, Serialize)]
struct FilterSummary {
    filter_num: String,
    avg_speed: String,
    flow: String,
}

#[derive(Debug, Serialize)]
struct RoomSummary {
    room: String,
    area: String,
    filters: Vec<FilterSummary>,
    total: String,
    criterion: Option<String>,
    passed: Option<bool>,
}

fn summarize(room: &RoomAirflow) -> RoomSummary {
    RoomSummary {
        room: room.label(),
        area: format_decimal(room.area, 2),
        filters: room
            .filters
            .iter()
            .map(|filter| FilterSummary {
                filter_num: filter.filter_num.clone(),
                avg_speed: format_decimal(filter.avg_speed, 2),
                flow: format_decimal(filter.flow, 2),
            })
            .collect(),
        total: format_decimal(room.total, 2),
        criterion: room.criterion_text.clone(),
        passed: room.passed(),
    }
}

pub fn run(args: AirflowArgs) -> Result<()> {
    let measurements: Vec<AirflowRoom> = read_json(&args.measurements)?;
    let rooms = compute_airflow(&measurements)
        .with_context(|| format!("invalid airflow measurements in {}", args.measurements.display()))?;

    for room in &rooms {
        info!(
            room = %room.label(),
            filters = room.filters.len(),
            total = %format_decimal(room.total, 2),
            passed = ?room.passed(),
            "airflow computed"
        );
    }

    if let Some(input) = &args.input {
        let config = load_config(args.config.as_deref(), &SplitBudgetArgs::default())?;
        let mut package =
            DocxPackage::open(input).with_context(|| format!("failed to open {}", input.display()))?;
        let rows = fill_airflow_table(&mut package.document, &config.vocabulary, &rooms)
            .with_context(|| format!("failed to fill the airflow table in {}", input.display()))?;
        let output = args.output.clone().unwrap_or_else(|| input.clone());
        package
            .save(&output)
            .with_context(|| format!("failed to save {}", output.display()))?;
        info!(rows, path = %output.display(), "airflow table written");
    } else if args.output.is_some() {
        warn!("--output needs --input; no document written");
    }

    if args.json {
        let summary: Vec<RoomSummary> = rooms.iter().map(summarize).collect();
        write_json_stdout(&summary)?;
    }
    Ok(())
}

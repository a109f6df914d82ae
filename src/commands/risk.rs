use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RiskArgs;
use crate::model::RiskSourceRow;
use crate::risk::build_risk_rows;
use crate::text::split_test_list;
use crate::util::{read_json, write_json_pretty, write_json_stdout};

pub fn run(args: RiskArgs) -> Result<()> {
    let source: Vec<RiskSourceRow> = read_json(&args.sheet)?;

    let mut selected = args.tests.clone();
    if let Some(path) = &args.tests_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read test selection: {}", path.display()))?;
        selected.extend(split_test_list(&raw));
    }

    let rows = build_risk_rows(&source, &selected)
        .with_context(|| format!("failed to build risk rows from {}", args.sheet.display()))?;
    info!(
        source_rows = source.len(),
        selected = selected.len(),
        risk_rows = rows.len(),
        "risk rows built"
    );

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &rows)?;
            info!(path = %path.display(), "wrote risk rows");
        }
        None => write_json_stdout(&rows)?,
    }
    Ok(())
}

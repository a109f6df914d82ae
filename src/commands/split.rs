#[cfg(test)]
mod tests;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::cli::SplitArgs;
use crate::commands::{load_config, pagination_oracle};
use crate::config::{EngineConfig, Vocabulary};
use crate::docx::{Document, DocxPackage, Table};
use crate::engine::locator::{first_rows_contain, locate_numbered_table};
use crate::engine::{Keywords, TableSplitter, split_after_marker_row};

const RESULTS_PROBE_ROWS: usize = 10;
const RESULTS_HEADER_ROWS: usize = 2;

/// Matches airflow results tables: the test heading and the results row within the first rows.
pub fn results_table(vocabulary: &Vocabulary) -> impl Fn(&Table) -> bool {
    let heading = first_rows_contain(Keywords::all(&vocabulary.airflow_test_markers), RESULTS_PROBE_ROWS);
    let results = first_rows_contain(
        Keywords::all(&[vocabulary.results_marker.as_str()]),
        RESULTS_PROBE_ROWS,
    );
    move |table| heading(table) && results(table)
}

pub fn split_results_tables(doc: &mut Document, config: &EngineConfig, header_rows: usize) -> Result<usize> {
    let vocabulary = &config.vocabulary;
    let marker = Keywords::all(&[vocabulary.results_marker.as_str()]);
    split_after_marker_row(doc, results_table(vocabulary), &marker, header_rows)
        .context("failed to split results tables")
}

fn save(package: &DocxPackage, args: &SplitArgs) -> Result<std::path::PathBuf> {
    let output = args.output.clone().unwrap_or_else(|| args.input.clone());
    package
        .save(&output)
        .with_context(|| format!("failed to save {}", output.display()))?;
    Ok(output)
}

pub fn run(args: SplitArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), &args.budgets)?;
    let mut package = DocxPackage::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    if args.after_results {
        let header_rows = args.budgets.header_rows.unwrap_or(RESULTS_HEADER_ROWS);
        let split = split_results_tables(&mut package.document, &config, header_rows)?;
        let output = save(&package, &args)?;
        info!(tables = split, header_rows, path = %output.display(), "results split finished");
        return Ok(());
    }

    let mut profile = config.split_profile(args.table);
    args.budgets.apply(&mut profile);
    let index = locate_numbered_table(&package.document, &config.vocabulary.table_caption, args.table)
        .ok_or_else(|| anyhow!("table {} not found in {}", args.table, args.input.display()))?;

    let oracle = pagination_oracle(args.page_map.as_deref(), &profile)
        .with_context(|| format!("failed to prepare pagination for table {}", args.table))?;
    let splitter = TableSplitter::new(&config, oracle.as_ref());
    let outcome = splitter
        .split_at(&mut package.document, index, &profile)
        .with_context(|| format!("failed to split table {}", args.table))?;

    let output = save(&package, &args)?;
    info!(
        table = args.table,
        oracle = oracle.name(),
        outcome = %outcome.describe(),
        path = %output.display(),
        "split finished"
    );
    Ok(())
}

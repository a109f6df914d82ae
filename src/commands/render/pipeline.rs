use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aggregate::{RoomAirflow, apply_exchange, compute_airflow};
use crate::commands::pagination_oracle;
use crate::config::EngineConfig;
use crate::docx::{DocxPackage, ScopedDocx};
use crate::engine::{RowBudgetOracle, SplitOutcome, TableSplitter};
use crate::error::{EngineError, EngineResult};
use crate::fill::{
    extract_total_flows, fill_airflow_table, fill_context, fill_equipment, fill_exchange_table,
    fill_report_table, fill_risk_table, fill_rooms, fill_test_results, glue_caption, insert_test_tables,
};
use crate::model::{
    FileDigest, RenderJob, RenderManifest, RiskRow, Room, SplitRecord, StepOutcome, StepRecord,
};
use crate::risk::build_risk_rows;
use crate::util::{file_digest, now_utc_string, read_json, utc_compact_string, write_json_pretty};

const MANIFEST_VERSION: u32 = 1;
const REPORT_SUMMARY_TABLE: u32 = 2;

#[derive(Debug, Clone)]
pub struct ReportTarget {
    pub template: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub job: PathBuf,
    pub template: PathBuf,
    pub test_bank: Option<PathBuf>,
    pub output: PathBuf,
    pub manifest_path: PathBuf,
    pub page_map: Option<PathBuf>,
    pub split: bool,
    pub report: Option<ReportTarget>,
    pub config: EngineConfig,
}

impl RenderRequest {
    pub fn default_manifest_path(output: &std::path::Path) -> PathBuf {
        output.with_extension("manifest.json")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    // Any failure is recorded and the run continues.
    BestEffort,
    // Missing or mismatched, the run aborts.
    Required,
}

struct StepLog<'a> {
    records: Vec<StepRecord>,
    stage: usize,
    progress: &'a mut dyn FnMut(usize, &str),
}

impl<'a> StepLog<'a> {
    fn new(progress: &'a mut dyn FnMut(usize, &str)) -> Self {
        Self {
            records: Vec::new(),
            stage: 0,
            progress,
        }
    }

    fn begin(&mut self, message: &str) {
        self.stage += 1;
        (self.progress)(self.stage, message);
    }

    fn record(&mut self, step: &str, outcome: StepOutcome) {
        self.records.push(StepRecord {
            step: step.to_string(),
            outcome,
        });
    }

    fn skip(&mut self, step: &str, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(step, reason = %reason, "step skipped");
        self.record(step, StepOutcome::Skipped(reason));
    }

    fn settle<T>(&mut self, step: &str, policy: Policy, result: EngineResult<T>) -> Result<Option<T>> {
        let err = match result {
            Ok(value) => {
                self.record(step, StepOutcome::Applied);
                return Ok(Some(value));
            }
            Err(err) => err,
        };

        let fatal = match (&err, policy) {
            (EngineError::FatalIo { .. } | EngineError::Zip { .. } | EngineError::Structural { .. }, _) => true,
            (EngineError::NotFound { .. } | EngineError::StructuralMismatch { .. }, Policy::Required) => true,
            _ => false,
        };
        if fatal {
            self.record(step, StepOutcome::Failed(err.to_string()));
            return Err(anyhow::Error::new(err).context(format!("render step `{step}` failed")));
        }

        warn!(step, error = %err, "render step did not apply");
        let outcome = if err.is_recoverable() {
            StepOutcome::Skipped(err.to_string())
        } else {
            StepOutcome::Failed(err.to_string())
        };
        self.record(step, outcome);
        Ok(None)
    }
}

fn open_package(path: &std::path::Path, what: &str) -> Result<DocxPackage> {
    DocxPackage::open(path).with_context(|| format!("failed to open {what}: {}", path.display()))
}

// The filled bank is written out and read back so totals come from the saved tables.
fn reload(bank: &DocxPackage) -> EngineResult<DocxPackage> {
    let scratch = ScopedDocx::new()?;
    bank.save(scratch.path())?;
    DocxPackage::open(scratch.path())
}

fn split_tables(
    package: &mut DocxPackage,
    request: &RenderRequest,
    log: &mut StepLog<'_>,
) -> Result<Vec<SplitRecord>> {
    if !request.split {
        log.skip("split", "disabled");
        return Ok(Vec::new());
    }

    let config = &request.config;
    let mut records = Vec::new();
    let mut applied = false;
    for profile in &config.split_profiles {
        let table = profile.table_number;
        let oracle = match pagination_oracle(request.page_map.as_deref(), profile) {
            Ok(oracle) => oracle,
            Err(err) => {
                warn!(table, error = %err, "pagination unavailable; splitting skipped");
                log.skip("split", err.to_string());
                return Ok(records);
            }
        };
        let splitter = TableSplitter::new(config, oracle.as_ref());
        let outcome = match splitter.split(&mut package.document, table) {
            Ok(outcome) => {
                applied |= matches!(outcome, SplitOutcome::Split { .. });
                outcome.describe()
            }
            Err(err) => {
                warn!(table, error = %err, "table split skipped");
                format!("skipped: {err}")
            }
        };
        info!(table, outcome = %outcome, "split pass");
        records.push(SplitRecord { table, outcome });
    }

    if applied {
        log.record("split", StepOutcome::Applied);
    } else {
        log.skip("split", "no table needed splitting");
    }
    Ok(records)
}

// The report is a second document: rooms in Table 1, the test summary in Table 2.
struct ReportPass<'r, 'l> {
    request: &'r RenderRequest,
    job: &'r RenderJob,
    rooms: &'r [Room],
    log: &'r mut StepLog<'l>,
    missing: &'r mut Vec<String>,
    splits: &'r mut Vec<SplitRecord>,
}

impl ReportPass<'_, '_> {
    fn run(&mut self, target: &ReportTarget) -> Result<FileDigest> {
        let config = &self.request.config;
        let vocabulary = &config.vocabulary;
        self.log.begin("rendering report");
        let mut report = open_package(&target.template, "report template")?;

        let mut context = self.job.context.clone();
        context.extend(self.job.report_context.clone());
        fill_context(&mut report.document, &context);

        self.log.settle(
            "report_rooms",
            Policy::BestEffort,
            fill_rooms(&mut report.document, vocabulary, self.rooms),
        )?;

        if self.job.report_rows.is_empty() {
            self.log.skip("report_summary", "no report rows");
        } else {
            let absent = self.log.settle(
                "report_summary",
                Policy::BestEffort,
                fill_report_table(
                    &mut report.document,
                    vocabulary,
                    &self.job.selected_tests,
                    &self.job.report_rows,
                ),
            )?;
            for name in absent.unwrap_or_default() {
                let entry = format!("{name}: no report row");
                if !self.missing.contains(&entry) {
                    self.missing.push(entry);
                }
            }
        }

        self.log.settle(
            "report_caption",
            Policy::BestEffort,
            glue_caption(&mut report.document, &vocabulary.table_caption, REPORT_SUMMARY_TABLE),
        )?;

        if self.request.split {
            let oracle = RowBudgetOracle::from_profile(&config.split_profile(REPORT_SUMMARY_TABLE));
            let outcome = self.log.settle(
                "report_split",
                Policy::BestEffort,
                TableSplitter::new(config, &oracle).split(&mut report.document, REPORT_SUMMARY_TABLE),
            )?;
            if let Some(outcome) = outcome {
                info!(table = REPORT_SUMMARY_TABLE, outcome = %outcome.describe(), "report split pass");
                self.splits.push(SplitRecord {
                    table: REPORT_SUMMARY_TABLE,
                    outcome: format!("report: {}", outcome.describe()),
                });
            }
        } else {
            self.log.skip("report_split", "disabled");
        }

        report
            .save(&target.output)
            .with_context(|| format!("failed to save report {}", target.output.display()))?;
        self.log.record("report_save", StepOutcome::Applied);
        info!(path = %target.output.display(), "saved report");
        file_digest(&target.output)
    }
}

pub fn render(request: &RenderRequest, progress: &mut dyn FnMut(usize, &str)) -> Result<RenderManifest> {
    let started = Utc::now();
    let run_id = format!("render-{}", utc_compact_string(started));
    let vocabulary = &request.config.vocabulary;
    let mut log = StepLog::new(progress);
    let mut missing = Vec::new();
    info!(run_id = %run_id, template = %request.template.display(), "starting render");

    log.begin("validating inputs");
    let job: RenderJob = read_json(&request.job)?;
    let mut package = open_package(&request.template, "template")?;
    let mut bank = match &request.test_bank {
        Some(path) => Some(open_package(path, "test bank")?),
        None => None,
    };
    log.record("validate", StepOutcome::Applied);
    let selected = job.selected_tests.clone();
    let mut rooms = job.rooms.clone();

    log.begin("filling context fields");
    let mut filled = fill_context(&mut package.document, &job.context);
    if let Some(bank) = bank.as_mut() {
        filled += fill_context(&mut bank.document, &job.context);
    }
    if filled > 0 {
        log.record("context", StepOutcome::Applied);
    } else if job.context.is_empty() {
        log.skip("context", "no context fields");
    } else {
        log.skip("context", "no context fields in template");
    }

    log.begin("aggregating measurements");
    let airflow: Option<Vec<RoomAirflow>> = if job.airflow.is_empty() {
        log.skip("airflow", "no airflow measurements");
        None
    } else {
        log.settle("airflow", Policy::BestEffort, compute_airflow(&job.airflow))?
    };
    let risk_rows: Option<Vec<RiskRow>> = if job.risk_rows.is_empty() {
        log.skip("risk_rows", "no risk sheet rows");
        None
    } else {
        log.settle("risk_rows", Policy::BestEffort, build_risk_rows(&job.risk_rows, &selected))?
    };

    log.begin("filling test bank calculations");
    match (bank.as_mut(), &airflow) {
        (Some(bank), Some(airflow)) => {
            log.settle(
                "test11_airflow",
                Policy::BestEffort,
                fill_airflow_table(&mut bank.document, vocabulary, airflow),
            )?;
        }
        (None, _) => log.skip("test11_airflow", "no test bank"),
        (Some(_), None) => log.skip("test11_airflow", "no airflow results"),
    }
    if let Some(filled) = bank.as_ref() {
        let reloaded = reload(filled).context("failed to reload the filled test bank")?;
        bank = Some(reloaded);
    }

    let totals = bank
        .as_ref()
        .map(|bank| extract_total_flows(&bank.document, vocabulary))
        .unwrap_or_default();
    apply_exchange(&mut rooms, &totals);
    debug!(
        totals = totals.len(),
        measured = totals.iter().filter(|total| total.is_some()).count(),
        "room totals applied"
    );

    log.begin("filling rooms table");
    log.settle("rooms", Policy::Required, fill_rooms(&mut package.document, vocabulary, &rooms))?;

    log.begin("filling equipment table");
    log.settle("equipment", Policy::Required, fill_equipment(&mut package.document, &job.equipment))?;

    log.begin("inserting test tables");
    match (&bank, selected.is_empty()) {
        (_, true) => log.skip("test_tables", "no tests selected"),
        (None, false) => log.skip("test_tables", "no test bank"),
        (Some(bank), false) => {
            let inserted = log.settle(
                "test_tables",
                Policy::BestEffort,
                insert_test_tables(&mut package.document, &bank.document, &selected, &request.config),
            )?;
            if let Some(inserted) = inserted {
                missing.extend(inserted.missing);
            }
        }
    }

    log.begin("filling risk table 5");
    match &risk_rows {
        Some(rows) if !rows.is_empty() => {
            log.settle("risk_table", Policy::BestEffort, fill_risk_table(&mut package.document, rows))?;
        }
        _ => log.skip("risk_table", "no risk rows"),
    }

    log.begin("filling test results");
    log.settle(
        "test_results",
        Policy::BestEffort,
        fill_test_results(&mut package.document, vocabulary, &rooms),
    )?;
    log.settle(
        "air_exchange",
        Policy::BestEffort,
        fill_exchange_table(&mut package.document, vocabulary, &rooms),
    )?;

    log.begin("filling report table 2");
    if job.report_rows.is_empty() {
        log.skip("report_table", "no report rows");
    } else {
        let absent = log.settle(
            "report_table",
            Policy::BestEffort,
            fill_report_table(&mut package.document, vocabulary, &selected, &job.report_rows),
        )?;
        missing.extend(
            absent
                .unwrap_or_default()
                .into_iter()
                .map(|name| format!("{name}: no report row")),
        );
    }

    log.begin("splitting long tables");
    let mut splits = split_tables(&mut package, request, &mut log)?;

    log.begin("saving document");
    package
        .save(&request.output)
        .with_context(|| format!("failed to save {}", request.output.display()))?;
    log.record("save", StepOutcome::Applied);

    let report = match &request.report {
        Some(target) => {
            let mut pass = ReportPass {
                request,
                job: &job,
                rooms: &rooms,
                log: &mut log,
                missing: &mut missing,
                splits: &mut splits,
            };
            Some(pass.run(target)?)
        }
        None => None,
    };

    let manifest = RenderManifest {
        manifest_version: MANIFEST_VERSION,
        generated_at: now_utc_string(),
        run_id,
        template: file_digest(&request.template)?,
        test_bank: match &request.test_bank {
            Some(path) => Some(file_digest(path)?),
            None => None,
        },
        output: file_digest(&request.output)?,
        report,
        steps: log.records,
        missing,
        splits,
    };
    write_json_pretty(&request.manifest_path, &manifest)?;
    info!(
        path = %request.manifest_path.display(),
        missing = manifest.missing.len(),
        "wrote render manifest"
    );

    if manifest.steps.iter().any(|step| matches!(step.outcome, StepOutcome::Failed(_))) {
        warn!(run_id = %manifest.run_id, "render finished with failed steps");
    }
    Ok(manifest)
}

pub fn ensure_distinct_output(request: &RenderRequest) -> Result<()> {
    if request.output == request.template {
        return Err(anyhow!(
            "output {} would overwrite the template",
            request.output.display()
        ));
    }
    if let Some(report) = &request.report {
        if report.output == report.template || report.output == request.output {
            return Err(anyhow!(
                "report output {} would overwrite an input or the protocol",
                report.output.display()
            ));
        }
    }
    Ok(())
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "qualdoc",
    version,
    about = "Qualification document table engine for cleanroom and HVAC protocols"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Render(RenderArgs),
    Split(SplitArgs),
    Risk(RiskArgs),
    Airflow(AirflowArgs),
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SplitBudgetArgs {
    #[arg(long)]
    pub header_rows: Option<usize>,

    #[arg(long)]
    pub first_page_rows: Option<usize>,

    #[arg(long)]
    pub next_page_rows: Option<usize>,

    #[arg(long)]
    pub max_splits: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[arg(long)]
    pub job: PathBuf,

    #[arg(long)]
    pub template: PathBuf,

    #[arg(long)]
    pub test_bank: Option<PathBuf>,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Optional report (Table 1 rooms, Table 2 summary) rendered in the same run.
    #[arg(long, requires = "report_output")]
    pub report_template: Option<PathBuf>,

    #[arg(long, requires = "report_template")]
    pub report_output: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub page_map: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_split: bool,

    #[command(flatten)]
    pub budgets: SplitBudgetArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 5)]
    pub table: u32,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub page_map: Option<PathBuf>,

    /// Cut the airflow results tables after their "test results" row instead of paginating.
    #[arg(long, conflicts_with = "page_map")]
    pub after_results: bool,

    #[command(flatten)]
    pub budgets: SplitBudgetArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RiskArgs {
    #[arg(long)]
    pub sheet: PathBuf,

    #[arg(long = "test")]
    pub tests: Vec<String>,

    #[arg(long)]
    pub tests_file: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AirflowArgs {
    #[arg(long)]
    pub measurements: PathBuf,

    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

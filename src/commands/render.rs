mod pipeline;
mod worker;

#[cfg(test)]
mod tests;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::RenderArgs;
use crate::commands::load_config;

pub use pipeline::{RenderRequest, ReportTarget, ensure_distinct_output, render};
pub use worker::{RenderEvent, RenderWorker};

pub fn run(args: RenderArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), &args.budgets)?;
    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| RenderRequest::default_manifest_path(&args.output));
    let request = RenderRequest {
        job: args.job,
        template: args.template,
        test_bank: args.test_bank,
        output: args.output,
        manifest_path,
        page_map: args.page_map,
        split: !args.no_split,
        report: args
            .report_template
            .zip(args.report_output)
            .map(|(template, output)| ReportTarget { template, output }),
        config,
    };
    ensure_distinct_output(&request)?;

    let worker = RenderWorker::spawn(request)?;
    let mut failure = None;
    for event in worker.events.iter() {
        match event {
            RenderEvent::Progress { step, message } => info!(step, "{message}"),
            RenderEvent::Finished {
                success: true,
                message,
                missing,
            } => {
                for title in &missing {
                    warn!(test = %title, "selected test not rendered");
                }
                info!(missing = missing.len(), "{message}");
            }
            RenderEvent::Finished { message, .. } => failure = Some(message),
        }
    }

    let manifest = worker.join()?;
    match (manifest, failure) {
        (Some(manifest), _) => {
            info!(run_id = %manifest.run_id, steps = manifest.steps.len(), "render completed");
            Ok(())
        }
        (None, Some(message)) => bail!("render failed: {message}"),
        (None, None) => bail!("render worker stopped without a result"),
    }
}

//! Stage and pipeline command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use gantry::{resolve_target, standard_registry, PipelinePlan, PipelineReport, Sequencer};
use std::sync::Arc;

/// Targets that run until interrupted
const LONG_RUNNING: &[&str] = &["watch", "watch-cycle", "run-tests-interactive"];

/// Stages that never write to the terminal themselves
const SILENT_STAGES: &[&str] = &["clean", "prune-coverage", "patch-vendor", "restore-vendor"];

/// A spinner would garble output from tools and console reports
fn shows_spinner(plan: &PipelinePlan) -> bool {
    plan.stage_names().all(|name| SILENT_STAGES.contains(&name))
}

/// Run a stage or composite pipeline by name
pub async fn execute_pipeline(
    config: &CliConfig,
    target: &str,
    reporter: &mut ProgressReporter,
) -> CliResult<()> {
    let report = run_target(config, target, reporter).await?;
    reporter.report(&report);
    report
        .into_result()
        .map_err(|e| CliError::pipeline_failed(target, e))
}

/// Resolve, validate and run a target, returning its report
pub async fn run_target(
    config: &CliConfig,
    target: &str,
    reporter: &mut ProgressReporter,
) -> CliResult<PipelineReport> {
    let pipeline = Arc::new(config.load_pipeline()?);
    let sequencer = Sequencer::new(standard_registry(&pipeline)?);
    let plan = resolve_target(target, &pipeline);
    tracing::debug!(pipeline = target, stages = ?plan.stage_names().collect::<Vec<_>>(), "resolved plan");

    if LONG_RUNNING.contains(&target) {
        reporter.info(&format!("Running {target} until interrupted (Ctrl-C to stop)"));
    } else if shows_spinner(&plan) {
        reporter.start_spinner(&format!("Running {target}"));
    }
    let report = sequencer.run(&plan).await;
    reporter.finish_spinner();
    report.map_err(CliError::from)
}

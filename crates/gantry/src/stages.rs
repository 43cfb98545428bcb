//! Standard stages and composite pipelines
//!
//! [`standard_registry`] binds every stage name the command surface exposes
//! to its operation; [`pipeline_plan`] builds the composites out of them.

use crate::config::{PipelineConfig, ReportFormat, ToolCommand};
use crate::coverage::{report_pruned, ReportFilter};
use crate::pipeline::{PipelinePlan, StageRegistry};
use crate::result::GantryResult;
use crate::tools::ToolRunner;
use crate::vendor::VendorPatch;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Prefix of host-build hook stage names
pub const HOST_STAGE_PREFIX: &str = "host:";

/// Composite pipelines and what they do
pub const PIPELINES: &[(&str, &str)] = &[
    ("test-build", "clean, host hooks in parallel, then build"),
    ("test", "test-build, then run the tests once"),
    (
        "test-and-report",
        "patch vendor, bundle, run tests, restore, then remap, prune and report coverage",
    ),
    ("watch-cycle", "test-build, then watch and rebuild on change"),
];

/// Stage name of a host-build hook
#[must_use]
pub fn host_stage(task: &str) -> String {
    format!("{HOST_STAGE_PREFIX}{task}")
}

/// Register every standard stage for a configuration
pub fn standard_registry(config: &Arc<PipelineConfig>) -> GantryResult<StageRegistry> {
    let mut registry = StageRegistry::new();
    let tools = ToolRunner::new(Arc::clone(config));

    let dest = config.test_dest_path();
    registry.register_fn("clean", "remove the test build output", move || {
        clean(dest.clone())
    })?;

    let tool_stages = [
        ("lint", "lint the app sources", &config.tools.lint),
        ("build", "compile app and test sources", &config.tools.build),
        ("build-e2e", "compile end-to-end sources", &config.tools.build_e2e),
        ("bundle", "bundle the spec files", &config.tools.bundle),
        ("host-build", "run the host build", &config.tools.host_build),
        ("run-tests", "run the tests once, headless", &config.tools.run_tests),
        (
            "run-tests-interactive",
            "run the tests in a browser left open",
            &config.tools.run_tests_interactive,
        ),
        (
            "remap-coverage",
            "remap raw coverage through source maps",
            &config.tools.remap_coverage,
        ),
    ];
    for (name, description, command) in tool_stages {
        register_tool(&mut registry, &tools, name, description, command.clone())?;
    }
    for (task, command) in &config.host_tasks {
        let description = format!("host build hook '{task}'");
        register_tool(&mut registry, &tools, &host_stage(task), &description, command.clone())?;
    }

    let prune_config = Arc::clone(config);
    registry.register_fn("prune-coverage", "drop excluded files from coverage", move || {
        let config = Arc::clone(&prune_config);
        async move {
            let filter = ReportFilter::from_config(&config.prune);
            let _ = filter
                .prune_file(&config.coverage_remapped(), &config.coverage_pruned())
                .await?;
            Ok(())
        }
    })?;

    let report_config = Arc::clone(config);
    registry.register_fn("report-coverage", "write coverage reports", move || {
        let config = Arc::clone(&report_config);
        async move {
            let reports = report_pruned(&config).await?;
            if config.quiet {
                return Ok(());
            }
            let mut stdout = tokio::io::stdout();
            for report in reports.iter().filter(|r| r.format == ReportFormat::Text) {
                stdout.write_all(report.content.as_bytes()).await?;
            }
            stdout.flush().await?;
            Ok(())
        }
    })?;

    let vendor = Arc::new(VendorPatch::from_config(config));
    let patch = Arc::clone(&vendor);
    registry.register_fn("patch-vendor", "swap the vendor file for its stub", move || {
        let vendor = Arc::clone(&patch);
        async move { vendor.patch().await }
    })?;
    registry.register_fn("restore-vendor", "put the original vendor file back", move || {
        let vendor = Arc::clone(&vendor);
        async move { vendor.restore().await }
    })?;

    #[cfg(feature = "watch")]
    register_watch(&mut registry, config)?;

    Ok(registry)
}

fn register_tool(
    registry: &mut StageRegistry,
    tools: &ToolRunner,
    name: &str,
    description: &str,
    command: ToolCommand,
) -> GantryResult<()> {
    let tools = tools.clone();
    let command = Arc::new(command);
    registry.register_fn(name, description, move || {
        let tools = tools.clone();
        let command = Arc::clone(&command);
        async move { tools.run(&command).await }
    })
}

#[cfg(feature = "watch")]
fn register_watch(registry: &mut StageRegistry, config: &Arc<PipelineConfig>) -> GantryResult<()> {
    use crate::pipeline::Sequencer;
    use crate::watch::SourceWatcher;

    let rebuild = test_build_plan(config);
    rebuild.validate(registry)?;
    let sequencer = Arc::new(Sequencer::new(registry.clone()));
    let watcher = Arc::new(SourceWatcher::from_config(config));
    let rebuild = Arc::new(rebuild);

    registry.register_fn("watch", "rebuild whenever app sources change", move || {
        let sequencer = Arc::clone(&sequencer);
        let watcher = Arc::clone(&watcher);
        let rebuild = Arc::clone(&rebuild);
        async move {
            let rebuilds = watcher
                .run_until(&sequencer, &rebuild, async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
            tracing::info!(rebuilds, "watch stopped");
            Ok(())
        }
    })
}

async fn clean(dest: PathBuf) -> GantryResult<()> {
    match tokio::fs::remove_dir_all(&dest).await {
        Ok(()) => tracing::info!(path = %dest.display(), "cleaned"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = "-", "nothing to clean");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn host_hooks(config: &PipelineConfig) -> Vec<String> {
    ["sass", "fonts", "html"]
        .into_iter()
        .filter(|task| config.host_tasks.contains_key(*task))
        .map(host_stage)
        .chain(
            config
                .host_tasks
                .keys()
                .filter(|task| !matches!(task.as_str(), "sass" | "fonts" | "html"))
                .map(|task| host_stage(task)),
        )
        .collect()
}

fn test_build_plan(config: &PipelineConfig) -> PipelinePlan {
    let plan = PipelinePlan::new("test-build").then("clean");
    let hooks = host_hooks(config);
    let plan = if hooks.is_empty() {
        plan
    } else {
        plan.parallel(hooks)
    };
    plan.then("build")
}

/// Build a composite pipeline by name
#[must_use]
pub fn pipeline_plan(name: &str, config: &PipelineConfig) -> Option<PipelinePlan> {
    let plan = match name {
        "test-build" => test_build_plan(config),
        "test" => PipelinePlan::new("test")
            .extend(&test_build_plan(config))
            .then("run-tests"),
        "test-and-report" => {
            let plan = PipelinePlan::new("test-and-report")
                .then("patch-vendor")
                .then("clean");
            let plan = if config.host_tasks.contains_key("html") {
                plan.then(host_stage("html"))
            } else {
                plan
            };
            plan.then("bundle")
                .parallel(["run-tests", "restore-vendor"])
                .then("remap-coverage")
                .then("prune-coverage")
                .then("report-coverage")
                .finally("patch-vendor", "restore-vendor")
        }
        "watch-cycle" => PipelinePlan::new("watch-cycle")
            .extend(&test_build_plan(config))
            .then("watch"),
        _ => return None,
    };
    Some(plan)
}

/// Plan for a command target: a composite pipeline or a single stage
#[must_use]
pub fn resolve_target(name: &str, config: &PipelineConfig) -> PipelinePlan {
    pipeline_plan(name, config).unwrap_or_else(|| PipelinePlan::single(name))
}

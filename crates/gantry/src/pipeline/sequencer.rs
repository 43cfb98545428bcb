//! Pipeline Sequencer
//!
//! Runs a [`PipelinePlan`] group by group on the caller's task. Members of
//! a parallel group are polled together with `join_all`, so they interleave
//! at I/O suspension points without any thread hand-off. A failing group is
//! always awaited in full before the run stops; later groups never start.

use super::plan::PipelinePlan;
use super::registry::StageRegistry;
use super::report::{PipelineReport, StageRecord, StageStatus};
use crate::result::{GantryError, GantryResult};
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Instant;

/// Executes plans against a registry
#[derive(Debug, Clone)]
pub struct Sequencer {
    registry: StageRegistry,
}

impl Sequencer {
    /// Create a sequencer over a registry
    #[must_use]
    pub const fn new(registry: StageRegistry) -> Self {
        Self { registry }
    }

    /// The registry stages are looked up in
    #[must_use]
    pub const fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Run a plan and report every stage
    ///
    /// Returns `Err` only when the plan fails validation, in which case
    /// nothing was started. Stage failures are carried by the report.
    pub async fn run(&self, plan: &PipelinePlan) -> GantryResult<PipelineReport> {
        plan.validate(&self.registry)?;

        let started = Instant::now();
        let mut report = PipelineReport::new(plan.name());
        let mut passed: HashSet<&str> = HashSet::new();
        let mut ran: HashSet<&str> = HashSet::new();

        tracing::info!(pipeline = plan.name(), groups = plan.groups().len(), "pipeline started");

        for group in plan.groups() {
            if !report.succeeded() {
                break;
            }
            let names = group.names();
            let outcomes = join_all(names.iter().map(|name| self.run_stage(name))).await;

            for (name, (record, error)) in names.iter().zip(outcomes) {
                let _ = ran.insert(name.as_str());
                if record.status == StageStatus::Passed {
                    let _ = passed.insert(name.as_str());
                }
                report.push(record);
                if let Some(error) = error {
                    report.fail(name, error);
                }
            }
        }

        if !report.succeeded() {
            for finalizer in plan.finalizers() {
                if !passed.contains(finalizer.trigger.as_str())
                    || ran.contains(finalizer.cleanup.as_str())
                {
                    continue;
                }
                tracing::info!(
                    trigger = %finalizer.trigger,
                    cleanup = %finalizer.cleanup,
                    "running finalizer after failure"
                );
                let (mut record, error) = self.run_stage(&finalizer.cleanup).await;
                record.finalizer = true;
                if let Some(error) = error {
                    tracing::error!(stage = %finalizer.cleanup, %error, "finalizer failed");
                }
                let _ = ran.insert(finalizer.cleanup.as_str());
                report.push(record);
            }
        }

        for name in plan.stage_names() {
            if !ran.contains(name) {
                report.push(StageRecord::skipped(name));
            }
        }

        report.finish(started.elapsed());
        match report.failed_stage() {
            None => tracing::info!(
                pipeline = plan.name(),
                elapsed_ms = report.elapsed().as_millis(),
                "pipeline passed"
            ),
            Some(stage) => tracing::error!(
                pipeline = plan.name(),
                stage,
                elapsed_ms = report.elapsed().as_millis(),
                "pipeline failed"
            ),
        }
        Ok(report)
    }

    /// Run a plan and collapse the report into a single result
    pub async fn execute(&self, plan: &PipelinePlan) -> GantryResult<()> {
        self.run(plan).await?.into_result()
    }

    async fn run_stage(&self, name: &str) -> (StageRecord, Option<GantryError>) {
        let started = Instant::now();
        let result = match self.registry.require(name) {
            Ok(stage) => {
                tracing::info!(stage = name, "stage started");
                stage.operation().run().await
            }
            Err(e) => Err(e),
        };
        let duration = started.elapsed();

        let (status, error) = match result {
            Ok(()) => {
                tracing::info!(stage = name, elapsed_ms = duration.as_millis(), "stage passed");
                (StageStatus::Passed, None)
            }
            Err(error) => {
                tracing::warn!(stage = name, elapsed_ms = duration.as_millis(), %error, "stage failed");
                (StageStatus::Failed, Some(error))
            }
        };

        let record = StageRecord {
            name: name.to_string(),
            status,
            duration,
            error: error.as_ref().map(ToString::to_string),
            finalizer: false,
        };
        (record, error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Event log shared by test stages
    type Log = Arc<Mutex<Vec<String>>>;

    fn record_stage(registry: &mut StageRegistry, log: &Log, name: &str, delay_ms: u64, fail: bool) {
        let log = Arc::clone(log);
        let stage = name.to_string();
        registry
            .register_fn(name, "test stage", move || {
                let log = Arc::clone(&log);
                let stage = stage.clone();
                async move {
                    log.lock().unwrap().push(format!("start:{stage}"));
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    log.lock().unwrap().push(format!("end:{stage}"));
                    if fail {
                        Err(GantryError::ToolFailed {
                            tool: stage,
                            code: Some(1),
                            message: "boom".to_string(),
                        })
                    } else {
                        Ok(())
                    }
                }
            })
            .unwrap();
    }

    fn events(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    mod sequential {
        use super::*;

        #[tokio::test]
        async fn test_all_pass_in_order() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "a", 0, false);
            record_stage(&mut registry, &log, "b", 0, false);

            let plan = PipelinePlan::new("p").then("a").then("b");
            let report = Sequencer::new(registry).run(&plan).await.unwrap();

            assert!(report.succeeded());
            assert_eq!(report.count(StageStatus::Passed), 2);
            assert_eq!(events(&log), vec!["start:a", "end:a", "start:b", "end:b"]);
        }

        #[tokio::test]
        async fn test_failure_stops_later_stages() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "a", 0, false);
            record_stage(&mut registry, &log, "b", 0, true);
            record_stage(&mut registry, &log, "c", 0, false);

            let plan = PipelinePlan::new("p").then("a").then("b").then("c");
            let report = Sequencer::new(registry).run(&plan).await.unwrap();

            assert_eq!(report.failed_stage(), Some("b"));
            assert!(!events(&log).iter().any(|e| e.ends_with(":c")));
            let skipped: Vec<_> = report
                .records()
                .iter()
                .filter(|r| r.status == StageStatus::Skipped)
                .map(|r| r.name.as_str())
                .collect();
            assert_eq!(skipped, vec!["c"]);

            let err = report.into_result().unwrap_err();
            assert!(err.to_string().contains("'b'"));
            assert!(err.to_string().contains("boom"));
        }

        #[tokio::test]
        async fn test_invalid_plan_starts_nothing() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "a", 0, false);

            let plan = PipelinePlan::new("p").then("a").then("missing");
            let err = Sequencer::new(registry).run(&plan).await.unwrap_err();

            assert!(matches!(err, GantryError::UnknownStage { .. }));
            assert!(events(&log).is_empty());
        }
    }

    mod parallel {
        use super::*;

        #[tokio::test]
        async fn test_group_members_interleave() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "c", 20, false);
            record_stage(&mut registry, &log, "d", 5, false);

            let plan = PipelinePlan::new("p").parallel(["c", "d"]);
            Sequencer::new(registry).execute(&plan).await.unwrap();

            let ev = events(&log);
            assert_eq!(&ev[..2], &["start:c", "start:d"]);
            assert_eq!(ev.len(), 4);
        }

        #[tokio::test]
        async fn test_failing_group_awaits_all_members() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "c", 30, false);
            record_stage(&mut registry, &log, "d", 1, true);
            record_stage(&mut registry, &log, "e", 0, false);

            let plan = PipelinePlan::new("p").parallel(["c", "d"]).then("e");
            let report = Sequencer::new(registry).run(&plan).await.unwrap();

            let ev = events(&log);
            assert!(ev.contains(&"end:c".to_string()));
            assert!(ev.contains(&"end:d".to_string()));
            assert!(!ev.contains(&"start:e".to_string()));
            assert_eq!(report.failed_stage(), Some("d"));
            assert_eq!(report.count(StageStatus::Passed), 1);
            assert_eq!(report.count(StageStatus::Failed), 1);
        }

        #[tokio::test]
        async fn test_first_failure_in_declaration_order() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "slow", 20, true);
            record_stage(&mut registry, &log, "fast", 0, true);

            let plan = PipelinePlan::new("p").parallel(["slow", "fast"]);
            let report = Sequencer::new(registry).run(&plan).await.unwrap();
            assert_eq!(report.failed_stage(), Some("slow"));
        }
    }

    mod finalizers {
        use super::*;

        #[tokio::test]
        async fn test_cleanup_runs_after_failure() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "patch", 0, false);
            record_stage(&mut registry, &log, "build", 0, true);
            record_stage(&mut registry, &log, "restore", 0, false);

            let plan = PipelinePlan::new("p")
                .then("patch")
                .then("build")
                .then("restore")
                .finally("patch", "restore");
            let report = Sequencer::new(registry).run(&plan).await.unwrap();

            assert_eq!(report.failed_stage(), Some("build"));
            assert!(events(&log).contains(&"end:restore".to_string()));
            let restore = report.records().iter().find(|r| r.name == "restore").unwrap();
            assert!(restore.finalizer);
            assert_eq!(restore.status, StageStatus::Passed);
            assert_eq!(report.count(StageStatus::Skipped), 0);
        }

        #[tokio::test]
        async fn test_cleanup_not_repeated() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "patch", 0, false);
            record_stage(&mut registry, &log, "tests", 0, true);
            record_stage(&mut registry, &log, "restore", 0, false);

            let plan = PipelinePlan::new("p")
                .then("patch")
                .parallel(["tests", "restore"])
                .finally("patch", "restore");
            let _ = Sequencer::new(registry).run(&plan).await.unwrap();

            let restores = events(&log).iter().filter(|e| *e == "start:restore").count();
            assert_eq!(restores, 1);
        }

        #[tokio::test]
        async fn test_cleanup_skipped_when_trigger_failed() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "patch", 0, true);
            record_stage(&mut registry, &log, "restore", 0, false);

            let plan = PipelinePlan::new("p")
                .then("patch")
                .then("restore")
                .finally("patch", "restore");
            let _ = Sequencer::new(registry).run(&plan).await.unwrap();
            assert!(!events(&log).contains(&"start:restore".to_string()));
        }

        #[tokio::test]
        async fn test_cleanup_failure_does_not_mask_original() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "patch", 0, false);
            record_stage(&mut registry, &log, "tests", 0, true);
            record_stage(&mut registry, &log, "restore", 0, true);

            let plan = PipelinePlan::new("p")
                .then("patch")
                .then("tests")
                .finally("patch", "restore");
            let report = Sequencer::new(registry).run(&plan).await.unwrap();

            assert_eq!(report.failed_stage(), Some("tests"));
            assert_eq!(report.count(StageStatus::Failed), 2);
        }

        #[tokio::test]
        async fn test_no_cleanup_on_success() {
            let log = Log::default();
            let mut registry = StageRegistry::new();
            record_stage(&mut registry, &log, "patch", 0, false);
            record_stage(&mut registry, &log, "restore", 0, false);

            let plan = PipelinePlan::new("p").then("patch").finally("patch", "restore");
            Sequencer::new(registry).execute(&plan).await.unwrap();
            assert_eq!(events(&log), vec!["start:patch", "end:patch"]);
        }
    }
}

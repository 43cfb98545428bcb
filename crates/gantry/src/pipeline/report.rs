//! Run results

use crate::result::{GantryError, GantryResult};
use std::time::Duration;

/// Outcome of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Completed successfully
    Passed,
    /// Completed with an error
    Failed,
    /// Never started because an earlier group failed
    Skipped,
}

impl StageStatus {
    /// Short lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Record of one stage in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    /// Stage name
    pub name: String,
    /// Outcome
    pub status: StageStatus,
    /// Wall time, zero for skipped stages
    pub duration: Duration,
    /// Error message for failed stages
    pub error: Option<String>,
    /// Ran as a finalizer after the pipeline failed
    pub finalizer: bool,
}

impl StageRecord {
    pub(crate) fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: StageStatus::Skipped,
            duration: Duration::ZERO,
            error: None,
            finalizer: false,
        }
    }
}

/// Result of one pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    pipeline: String,
    records: Vec<StageRecord>,
    failure: Option<GantryError>,
    elapsed: Duration,
}

impl PipelineReport {
    pub(crate) fn new(pipeline: &str) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            records: Vec::new(),
            failure: None,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn push(&mut self, record: StageRecord) {
        self.records.push(record);
    }

    /// Keep only the first failure
    pub(crate) fn fail(&mut self, stage: &str, error: GantryError) {
        if self.failure.is_none() {
            self.failure = Some(GantryError::stage_failed(stage, error));
        }
    }

    pub(crate) fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Pipeline name
    #[must_use]
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Stage records in the order they finished; skipped stages last
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Whether every scheduled stage passed
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Name of the stage the run failed on
    #[must_use]
    pub fn failed_stage(&self) -> Option<&str> {
        self.failure.as_ref().and_then(GantryError::failed_stage)
    }

    /// Total wall time
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Count of records with a given status
    #[must_use]
    pub fn count(&self, status: StageStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// The run's single success/failure signal
    pub fn into_result(self) -> GantryResult<()> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

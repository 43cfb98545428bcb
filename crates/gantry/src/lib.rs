//! Gantry: test-pipeline sequencing for mobile-web apps
//!
//! Gantry drives the external compiler, bundler and test runner of a
//! mobile-web project through named stages, keeps a vendor file swapped for
//! a stub only while instrumented tests run, and turns the raw coverage
//! those tests produce into pruned text/LCOV/JSON reports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    GANTRY Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Stage      │    │ Sequencer  │    │ External   │            │
//! │   │ Registry   │───►│ (groups,   │───►│ tools      │            │
//! │   │            │    │ finalizers)│    │ (tsc, ...) │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │                                      │
//! │            ┌──────────────┼──────────────┐                       │
//! │            ▼              ▼              ▼                       │
//! │     ┌────────────┐ ┌────────────┐ ┌────────────┐                 │
//! │     │ Vendor     │ │ Report     │ │ Report     │                 │
//! │     │ Patch Swap │ │ Filter     │ │ Aggregator │                 │
//! │     └────────────┘ └────────────┘ └────────────┘                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gantry::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo() -> GantryResult<()> {
//! let config = Arc::new(PipelineConfig::discover(std::path::Path::new("."))?);
//! let sequencer = Sequencer::new(standard_registry(&config)?);
//! let report = sequencer.run(&resolve_target("test", &config)).await?;
//! report.into_result()
//! # }
//! ```

#![warn(missing_docs)]

/// Pipeline configuration (`gantry.yaml`)
pub mod config;

/// Coverage filtering, aggregation and report formatting
#[allow(clippy::cast_precision_loss, clippy::doc_markdown)]
pub mod coverage;

/// Stage registry, plans and the sequencer
pub mod pipeline;

mod result;

/// Standard stages and composite pipelines
pub mod stages;

/// External tool invocation
pub mod tools;

/// Vendor Patch Swap
pub mod vendor;

/// Watch mode
/// Note: requires filesystem notifications
#[cfg(feature = "watch")]
pub mod watch;

pub use config::{
    MergePolicy, PipelineConfig, PruneConfig, ReportConfig, ReportFormat, ToolCommand,
    ToolsConfig, VendorConfig, WatchConfig, CONFIG_FILE_NAME,
};
pub use coverage::{
    CoverageAggregator, CoverageDocument, CoverageSummary, ExclusionSet, FileCoverage,
    FilterOutcome, RenderedReport, ReportFilter,
};
pub use pipeline::{
    Finalizer, PipelinePlan, PipelineReport, Sequencer, Stage, StageFn, StageGroup,
    StageOperation, StageRecord, StageRegistry, StageStatus,
};
pub use result::{GantryError, GantryResult};
pub use stages::{pipeline_plan, resolve_target, standard_registry, PIPELINES};
pub use tools::ToolRunner;
pub use vendor::{VendorPatch, VendorState};
#[cfg(feature = "watch")]
pub use watch::SourceWatcher;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::{PipelineConfig, ReportFormat};
    pub use super::coverage::{CoverageAggregator, CoverageDocument, ReportFilter};
    pub use super::pipeline::{PipelinePlan, PipelineReport, Sequencer, StageRegistry};
    pub use super::result::{GantryError, GantryResult};
    pub use super::stages::{pipeline_plan, resolve_target, standard_registry};
    pub use super::vendor::VendorPatch;
}

//! Coverage post-processing
//!
//! ```text
//! coverage-remapped.json ─► ReportFilter ─► coverage-pruned.json
//!                                                  │
//!                                                  ▼
//!                 text / lcov.info / coverage-summary.json ◄─ CoverageAggregator
//! ```
//!
//! The filter never interprets records beyond their `path` field; the
//! aggregator decodes them into [`FileCoverage`] to compute totals.

mod aggregator;
mod document;
mod filter;
pub mod formatters;
mod model;
mod summary;

pub use aggregator::{report_pruned, write_reports, CoverageAggregator, RenderedReport};
pub use document::{CoverageDocument, PATH_FIELD};
pub use filter::{ExclusionSet, FilterOutcome, ReportFilter};
pub use formatters::{JsonSummaryFormatter, LcovFormatter, TextFormatter};
pub use model::{BranchMeta, FileCoverage, FunctionMeta, Position, Range};
pub use summary::{CoverageSummary, FileSummary, Totals};

//! Coverage Report Formatters
//!
//! Text, LCOV and JSON summary generators over aggregated coverage.

mod json_summary;
mod lcov;
mod text;

pub use json_summary::JsonSummaryFormatter;
pub use lcov::LcovFormatter;
pub use text::TextFormatter;

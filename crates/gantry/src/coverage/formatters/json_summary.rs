//! JSON Summary Formatter
//!
//! Mirrors istanbul's `coverage-summary.json`: a `total` entry followed by
//! one entry per file, each carrying `lines`, `statements`, `functions` and
//! `branches` counters with a percentage.

use crate::coverage::summary::{CoverageSummary, FileSummary, Totals};
use crate::result::GantryResult;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
struct MetricJson {
    total: usize,
    covered: usize,
    skipped: usize,
    pct: f64,
}

impl From<Totals> for MetricJson {
    fn from(totals: Totals) -> Self {
        Self {
            total: totals.total,
            covered: totals.covered,
            skipped: 0,
            pct: (totals.pct() * 100.0).round() / 100.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct FileJson {
    lines: MetricJson,
    statements: MetricJson,
    functions: MetricJson,
    branches: MetricJson,
}

impl From<&FileSummary> for FileJson {
    fn from(file: &FileSummary) -> Self {
        Self {
            lines: file.lines.into(),
            statements: file.statements.into(),
            functions: file.functions.into(),
            branches: file.branches.into(),
        }
    }
}

/// JSON summary generator
#[derive(Debug)]
pub struct JsonSummaryFormatter<'a> {
    summary: &'a CoverageSummary,
}

impl<'a> JsonSummaryFormatter<'a> {
    /// Create a formatter over a summary
    #[must_use]
    pub const fn new(summary: &'a CoverageSummary) -> Self {
        Self { summary }
    }

    /// Build the summary as a JSON value
    pub fn to_value(&self) -> GantryResult<Value> {
        let mut root = Map::new();
        let _ = root.insert(
            "total".to_string(),
            serde_json::to_value(FileJson::from(&self.summary.total))?,
        );
        for (path, file) in &self.summary.files {
            let _ = root.insert(path.clone(), serde_json::to_value(FileJson::from(file))?);
        }
        Ok(Value::Object(root))
    }

    /// Render as JSON text
    pub fn generate(&self) -> GantryResult<String> {
        Ok(serde_json::to_string(&self.to_value()?)?)
    }
}

//! Coverage summary statistics

use super::model::FileCoverage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Covered/total counter for one metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Number of items found
    pub total: usize,
    /// Number of items hit at least once
    pub covered: usize,
}

impl Totals {
    /// Count items from their hit counts
    pub fn from_hits<I: IntoIterator<Item = u64>>(hits: I) -> Self {
        let mut totals = Self::default();
        for count in hits {
            totals.total += 1;
            if count > 0 {
                totals.covered += 1;
            }
        }
        totals
    }

    /// Coverage percentage; an empty metric counts as fully covered
    #[must_use]
    pub fn pct(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.covered as f64 / self.total as f64) * 100.0
    }

    fn add(&mut self, other: Self) {
        self.total += other.total;
        self.covered += other.covered;
    }
}

/// Statement, branch, function and line totals for one file (or a whole run)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// Statements
    pub statements: Totals,
    /// Branch arms
    pub branches: Totals,
    /// Functions
    pub functions: Totals,
    /// Lines
    pub lines: Totals,
    /// Lines with zero hits, ascending
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub uncovered_lines: Vec<u32>,
}

impl FileSummary {
    /// Summarize one file
    #[must_use]
    pub fn of(file: &FileCoverage) -> Self {
        let line_hits = file.line_hits();
        Self {
            statements: Totals::from_hits(file.s.values().copied()),
            branches: Totals::from_hits(file.b.values().flatten().copied()),
            functions: Totals::from_hits(file.f.values().copied()),
            lines: Totals::from_hits(line_hits.values().copied()),
            uncovered_lines: line_hits
                .iter()
                .filter(|(_, hits)| **hits == 0)
                .map(|(line, _)| *line)
                .collect(),
        }
    }

    fn accumulate(&mut self, other: &Self) {
        self.statements.add(other.statements);
        self.branches.add(other.branches);
        self.functions.add(other.functions);
        self.lines.add(other.lines);
    }
}

/// Summary of a whole aggregated run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Totals across all files
    pub total: FileSummary,
    /// Per-file summaries keyed by path
    pub files: BTreeMap<String, FileSummary>,
}

impl CoverageSummary {
    /// Build a summary from per-file records
    pub fn from_files<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a FileCoverage)>,
    {
        let mut summary = Self::default();
        for (path, file) in files {
            let file_summary = FileSummary::of(file);
            summary.total.accumulate(&file_summary);
            let _ = summary.files.insert(path.clone(), file_summary);
        }
        summary
    }

    /// Whether any file was summarized
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

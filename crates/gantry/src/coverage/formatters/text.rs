//! Text Report Formatter
//!
//! Per-file table in the layout CI logs usually expect:
//!
//! ```text
//! ----------|---------|----------|---------|---------|-------------------
//! File      | % Stmts | % Branch | % Funcs | % Lines | Uncovered Line #s
//! ----------|---------|----------|---------|---------|-------------------
//! All files |   83.33 |       50 |     100 |   83.33 |
//!  app.ts   |   83.33 |       50 |     100 |   83.33 | 12
//! ----------|---------|----------|---------|---------|-------------------
//! ```

use crate::coverage::summary::{CoverageSummary, FileSummary};
use std::fmt::Write;

const HEADERS: [&str; 6] = [
    "File",
    "% Stmts",
    "% Branch",
    "% Funcs",
    "% Lines",
    "Uncovered Line #s",
];

/// Text table generator
#[derive(Debug)]
pub struct TextFormatter<'a> {
    summary: &'a CoverageSummary,
}

impl<'a> TextFormatter<'a> {
    /// Create a formatter over a summary
    #[must_use]
    pub const fn new(summary: &'a CoverageSummary) -> Self {
        Self { summary }
    }

    /// Render the table
    #[must_use]
    pub fn generate(&self) -> String {
        let mut rows = vec![Self::row("All files", &self.summary.total)];
        for (path, file) in &self.summary.files {
            rows.push(Self::row(&format!(" {path}"), file));
        }

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let rule = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|");
        let header: Vec<String> = HEADERS.iter().map(|h| (*h).to_string()).collect();

        let mut output = String::new();
        let _ = writeln!(output, "{rule}");
        let _ = writeln!(output, "{}", Self::render_row(&header, &widths));
        let _ = writeln!(output, "{rule}");
        for row in &rows {
            let _ = writeln!(output, "{}", Self::render_row(row, &widths));
        }
        let _ = writeln!(output, "{rule}");
        output
    }

    fn row(label: &str, file: &FileSummary) -> Vec<String> {
        vec![
            label.to_string(),
            format_pct(file.statements.pct()),
            format_pct(file.branches.pct()),
            format_pct(file.functions.pct()),
            format_pct(file.lines.pct()),
            compact_lines(&file.uncovered_lines),
        ]
    }

    fn render_row(cells: &[String], widths: &[usize]) -> String {
        cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                // first and last columns left-aligned, numbers right-aligned
                if i == 0 || i == cells.len() - 1 {
                    format!(" {cell:<width$} ")
                } else {
                    format!(" {cell:>width$} ")
                }
            })
            .collect::<Vec<_>>()
            .join("|")
            .trim_end()
            .to_string()
    }
}

/// Two decimals, trailing zeros dropped (`100`, `83.33`, `50.5`)
fn format_pct(pct: f64) -> String {
    let fixed = format!("{pct:.2}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Collapse consecutive line numbers into ranges: `3-5,9`
fn compact_lines(lines: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = lines.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            let _ = iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
    }
    parts.join(",")
}

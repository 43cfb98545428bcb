//! Output formatting and progress reporting

use console::{style, Style, Term};
use gantry::{PipelineReport, StageRecord, StageStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for pipeline runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Show a spinner while a pipeline runs
    pub fn start_spinner(&mut self, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    /// Clear the spinner
    pub fn finish_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn line(&self, message: &str) {
        let _ = self.term.write_line(message);
    }

    fn prefix(&self, symbol: &str, plain: &str, color: Style) -> String {
        if self.use_color {
            color.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&format!("{} {message}", self.prefix("✓", "PASS", Style::new().green())));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.line(&format!("{} {message}", self.prefix("✗", "FAIL", Style::new().red())));
    }

    /// Print a skipped-stage message
    pub fn skipped(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&format!("{} {message}", self.prefix("-", "SKIP", Style::new().dim())));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&format!("{} {message}", self.prefix("ℹ", "INFO", Style::new().blue())));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.line(&styled);
    }

    /// Print one stage outcome
    pub fn stage(&self, record: &StageRecord) {
        let label = if record.finalizer {
            format!("{} (finalizer)", record.name)
        } else {
            record.name.clone()
        };
        match record.status {
            StageStatus::Passed => {
                self.success(&format!("{label} ({})", format_duration(record.duration)));
            }
            StageStatus::Failed => {
                let error = record.error.as_deref().unwrap_or("failed");
                self.failure(&format!(
                    "{label} ({}): {error}",
                    format_duration(record.duration)
                ));
            }
            StageStatus::Skipped => self.skipped(&label),
        }
    }

    /// Print every stage outcome under the pipeline name, then a summary line
    pub fn report(&self, report: &PipelineReport) {
        self.header(report.pipeline());
        for record in report.records() {
            self.stage(record);
        }
        self.summary(report);
    }

    /// Print the summary line of a run
    pub fn summary(&self, report: &PipelineReport) {
        if self.quiet {
            return;
        }

        let passed = report.count(StageStatus::Passed);
        let failed = report.count(StageStatus::Failed);
        let skipped = report.count(StageStatus::Skipped);
        let elapsed = format_duration(report.elapsed());

        let status = if report.succeeded() {
            if self.use_color {
                style("PASSED").green().bold().to_string()
            } else {
                "PASSED".to_string()
            }
        } else if self.use_color {
            style("FAILED").red().bold().to_string()
        } else {
            "FAILED".to_string()
        };

        self.line("");
        self.line(&format!(
            "{status} {}: {passed} passed, {failed} failed, {skipped} skipped in {elapsed}",
            report.pipeline()
        ));
    }
}

/// Format a duration for stage lines
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

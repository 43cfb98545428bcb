//! Coverage aggregation and report emission
//!
//! Documents are merged by source path under a [`MergePolicy`]. Finalizing
//! renders one [`RenderedReport`] per requested format.

use super::document::CoverageDocument;
use super::formatters::{JsonSummaryFormatter, LcovFormatter, TextFormatter};
use super::model::FileCoverage;
use super::summary::CoverageSummary;
use crate::config::{MergePolicy, PipelineConfig, ReportFormat};
use crate::result::{GantryError, GantryResult};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A report rendered in one format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// Output format
    pub format: ReportFormat,
    /// Rendered content
    pub content: String,
}

/// Accumulates coverage documents over a run
#[derive(Debug, Clone, Default)]
pub struct CoverageAggregator {
    policy: MergePolicy,
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageAggregator {
    /// Create an empty aggregator
    #[must_use]
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            files: BTreeMap::new(),
        }
    }

    /// Merge a document; returns the number of records merged
    ///
    /// A record whose counters do not decode fails the whole document and
    /// leaves the aggregator unchanged.
    pub fn add_document(&mut self, document: &CoverageDocument) -> GantryResult<usize> {
        let decoded = document
            .iter()
            .map(|(key, record)| FileCoverage::from_record(key, record))
            .collect::<GantryResult<Vec<_>>>()?;

        let merged = decoded.len();
        for file in decoded {
            match self.files.get_mut(&file.path) {
                Some(existing) => {
                    tracing::debug!(path = %file.path, policy = ?self.policy, "path seen again");
                    existing.merge(file, self.policy);
                }
                None => {
                    let _ = self.files.insert(file.path.clone(), file);
                }
            }
        }
        Ok(merged)
    }

    /// Number of distinct paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been merged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Merged records by path
    #[must_use]
    pub const fn files(&self) -> &BTreeMap<String, FileCoverage> {
        &self.files
    }

    /// Summary statistics over the merged records
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary::from_files(&self.files)
    }

    /// Render every requested format
    ///
    /// Fails with `NoData` when nothing was merged.
    pub fn finalize(&self, formats: &[ReportFormat]) -> GantryResult<Vec<RenderedReport>> {
        if self.is_empty() {
            return Err(GantryError::NoData);
        }
        self.render_all(formats)
    }

    /// Like [`finalize`](Self::finalize), but an empty run yields empty
    /// reports and a warning instead of `NoData`
    pub fn finalize_lenient(&self, formats: &[ReportFormat]) -> GantryResult<Vec<RenderedReport>> {
        match self.finalize(formats) {
            Err(e) if e.is_recoverable() => {
                tracing::warn!(error = %e, "emitting empty reports");
                self.render_all(formats)
            }
            other => other,
        }
    }

    fn render_all(&self, formats: &[ReportFormat]) -> GantryResult<Vec<RenderedReport>> {
        let summary = self.summary();
        formats
            .iter()
            .map(|&format| {
                let content = match format {
                    ReportFormat::Text => TextFormatter::new(&summary).generate(),
                    ReportFormat::Lcov => LcovFormatter::new(&self.files).generate(),
                    ReportFormat::JsonSummary => JsonSummaryFormatter::new(&summary).generate()?,
                };
                Ok(RenderedReport { format, content })
            })
            .collect()
    }
}

/// Write file-backed reports under the coverage directory
///
/// Returns the paths written; console-only formats are skipped.
pub async fn write_reports(
    config: &PipelineConfig,
    reports: &[RenderedReport],
) -> GantryResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for report in reports {
        let Some(path) = config.report_path(report.format) else {
            continue;
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &report.content).await?;
        tracing::info!(format = report.format.as_str(), path = %path.display(), "wrote report");
        written.push(path);
    }
    Ok(written)
}

/// Load the pruned document and render the configured reports
pub async fn report_pruned(config: &PipelineConfig) -> GantryResult<Vec<RenderedReport>> {
    let document = CoverageDocument::read(&config.coverage_pruned()).await?;
    let mut aggregator = CoverageAggregator::new(config.reports.merge);
    let merged = aggregator.add_document(&document)?;
    tracing::debug!(merged, files = aggregator.len(), "aggregated coverage");

    let reports = aggregator.finalize_lenient(&config.reports.formats)?;
    let _ = write_reports(config, &reports).await?;
    Ok(reports)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::coverage::ReportFilter;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: serde_json::Value) -> CoverageDocument {
        CoverageDocument::from_value(value).unwrap()
    }

    fn one_file(hits: u64) -> CoverageDocument {
        doc(json!({
            "a.ts": {
                "path": "a.ts",
                "statementMap": {"1": {"start": {"line": 1}}},
                "s": {"1": hits}
            }
        }))
    }

    mod merging {
        use super::*;

        #[test]
        fn test_add_document_counts_records() {
            let mut agg = CoverageAggregator::new(MergePolicy::Replace);
            let merged = agg
                .add_document(&doc(json!({"a.ts": {"path": "a.ts"}, "b.ts": {"path": "b.ts"}})))
                .unwrap();
            assert_eq!(merged, 2);
            assert_eq!(agg.len(), 2);
        }

        #[test]
        fn test_replace_last_write_wins() {
            let mut agg = CoverageAggregator::new(MergePolicy::Replace);
            let _ = agg.add_document(&one_file(1)).unwrap();
            let _ = agg.add_document(&one_file(5)).unwrap();
            assert_eq!(agg.len(), 1);
            assert_eq!(agg.files()["a.ts"].s["1"], 5);
        }

        #[test]
        fn test_sum_adds_counts() {
            let mut agg = CoverageAggregator::new(MergePolicy::Sum);
            let _ = agg.add_document(&one_file(1)).unwrap();
            let _ = agg.add_document(&one_file(5)).unwrap();
            assert_eq!(agg.files()["a.ts"].s["1"], 6);
        }

        #[test]
        fn test_bad_record_leaves_aggregator_unchanged() {
            let mut agg = CoverageAggregator::new(MergePolicy::Replace);
            let err = agg
                .add_document(&doc(json!({
                    "a.ts": {"path": "a.ts"},
                    "b.ts": {"s": {"1": "x"}}
                })))
                .unwrap_err();
            assert!(matches!(err, GantryError::MalformedDocument { .. }));
            assert!(agg.is_empty());
        }

        #[test]
        fn test_merge_uses_path_field() {
            let mut agg = CoverageAggregator::new(MergePolicy::Replace);
            let _ = agg
                .add_document(&doc(json!({"/source/a.ts": {"path": "a.ts"}})))
                .unwrap();
            assert!(agg.files().contains_key("a.ts"));
        }
    }

    mod finalizing {
        use super::*;

        #[test]
        fn test_finalize_empty_is_no_data() {
            let agg = CoverageAggregator::new(MergePolicy::Replace);
            let err = agg.finalize(&[ReportFormat::Text]).unwrap_err();
            assert!(matches!(err, GantryError::NoData));
            assert!(err.is_recoverable());
        }

        #[test]
        fn test_finalize_lenient_emits_empty_reports() {
            let agg = CoverageAggregator::new(MergePolicy::Replace);
            let reports = agg
                .finalize_lenient(&[ReportFormat::Text, ReportFormat::Lcov])
                .unwrap();
            assert_eq!(reports.len(), 2);
            assert!(reports[0].content.contains("All files"));
            assert_eq!(reports[1].content, "");
        }

        #[test]
        fn test_finalize_one_report_per_format() {
            let mut agg = CoverageAggregator::new(MergePolicy::Replace);
            let _ = agg.add_document(&one_file(2)).unwrap();
            let reports = agg
                .finalize(&[ReportFormat::Lcov, ReportFormat::JsonSummary, ReportFormat::Text])
                .unwrap();

            let formats: Vec<_> = reports.iter().map(|r| r.format).collect();
            assert_eq!(
                formats,
                vec![ReportFormat::Lcov, ReportFormat::JsonSummary, ReportFormat::Text]
            );
            assert!(reports[0].content.contains("SF:a.ts"));
            assert!(reports[1].content.contains("\"a.ts\""));
            assert!(reports[2].content.contains(" a.ts"));
        }
    }

    mod files {
        use super::*;

        #[tokio::test]
        async fn test_write_reports_skips_text() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new(temp.path());
            let reports = vec![
                RenderedReport {
                    format: ReportFormat::Text,
                    content: "table".to_string(),
                },
                RenderedReport {
                    format: ReportFormat::Lcov,
                    content: "TN:\n".to_string(),
                },
            ];

            let written = write_reports(&config, &reports).await.unwrap();
            assert_eq!(written, vec![temp.path().join("coverage").join("lcov.info")]);
            assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "TN:\n");
        }

        #[tokio::test]
        async fn test_report_pruned_end_to_end() {
            let temp = TempDir::new().unwrap();
            let mut config = PipelineConfig::new(temp.path());
            config.reports.formats = vec![ReportFormat::Lcov, ReportFormat::JsonSummary];
            one_file(3).write(&config.coverage_pruned()).await.unwrap();

            let reports = report_pruned(&config).await.unwrap();
            assert_eq!(reports.len(), 2);
            let lcov = std::fs::read_to_string(temp.path().join("coverage/lcov.info")).unwrap();
            assert!(lcov.contains("DA:1,3"));
            assert!(temp.path().join("coverage/coverage-summary.json").is_file());
        }

        #[tokio::test]
        async fn test_report_pruned_empty_document() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new(temp.path());
            CoverageDocument::new()
                .write(&config.coverage_pruned())
                .await
                .unwrap();

            let reports = report_pruned(&config).await.unwrap();
            assert_eq!(reports.len(), 2);
        }

        #[tokio::test]
        async fn test_report_after_prune_with_non_string_path() {
            let temp = TempDir::new().unwrap();
            let mut config = PipelineConfig::new(temp.path());
            config.reports.formats = vec![ReportFormat::Lcov];
            doc(json!({
                "/source/e.ts": {
                    "path": 42,
                    "statementMap": {"1": {"start": {"line": 4}}},
                    "s": {"1": 1}
                }
            }))
            .write(&config.coverage_remapped())
            .await
            .unwrap();

            let outcome = ReportFilter::from_config(&config.prune)
                .prune_file(&config.coverage_remapped(), &config.coverage_pruned())
                .await
                .unwrap();
            assert_eq!(outcome.warnings.len(), 1);

            let _ = report_pruned(&config).await.unwrap();
            let lcov = std::fs::read_to_string(temp.path().join("coverage/lcov.info")).unwrap();
            assert!(lcov.contains("SF:e.ts"));
            assert!(lcov.contains("DA:4,1"));
        }

        #[tokio::test]
        async fn test_report_pruned_missing_input() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new(temp.path());
            let err = report_pruned(&config).await.unwrap_err();
            assert!(matches!(err, GantryError::Io(_)));
        }
    }
}

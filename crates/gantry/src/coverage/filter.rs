//! Report Filter: drops excluded entries from a coverage document and
//! strips the build prefix from the survivors.

use super::document::{CoverageDocument, PATH_FIELD};
use crate::config::PruneConfig;
use crate::result::{GantryError, GantryResult};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Ordered set of literal substrings; a key containing any of them is excluded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl ExclusionSet {
    /// Create an exclusion set
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// First pattern contained in `key`, if any
    #[must_use]
    pub fn first_match(&self, key: &str) -> Option<&str> {
        self.patterns
            .iter()
            .map(String::as_str)
            .find(|pattern| key.contains(pattern))
    }

    /// Whether `key` is excluded
    #[must_use]
    pub fn excludes(&self, key: &str) -> bool {
        self.first_match(key).is_some()
    }

    /// Patterns in configured order
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Result of filtering one document
#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// The filtered document
    pub document: CoverageDocument,
    /// Keys that were dropped, in input order
    pub dropped: Vec<String>,
    /// Non-fatal problems (entries kept without full rewriting)
    pub warnings: Vec<GantryError>,
}

/// Removes excluded entries and strips a literal prefix from paths
#[derive(Debug, Clone)]
pub struct ReportFilter {
    exclusions: ExclusionSet,
    strip_prefix: String,
}

impl ReportFilter {
    /// Create a filter
    #[must_use]
    pub fn new(exclusions: ExclusionSet, strip_prefix: impl Into<String>) -> Self {
        Self {
            exclusions,
            strip_prefix: strip_prefix.into(),
        }
    }

    /// Create a filter from configuration
    #[must_use]
    pub fn from_config(config: &PruneConfig) -> Self {
        Self::new(
            ExclusionSet::new(config.exclude.iter().cloned()),
            config.strip_prefix.clone(),
        )
    }

    /// Exclusion set in use
    #[must_use]
    pub const fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Strip the configured prefix; paths without it are returned unchanged
    #[must_use]
    pub fn strip<'a>(&self, path: &'a str) -> &'a str {
        if self.strip_prefix.is_empty() {
            return path;
        }
        path.strip_prefix(self.strip_prefix.as_str()).unwrap_or(path)
    }

    /// Filter `document`, leaving the input untouched
    ///
    /// Survivors keep their input order. Keys and `path` fields both lose
    /// the prefix. An entry without a string `path` is kept as-is and
    /// reported as a `MissingField` warning. A prefixed key whose stripped
    /// form would clash with another survivor keeps its original key and is
    /// reported as a `KeyCollision` warning, so no survivor is lost.
    #[must_use]
    pub fn apply(&self, document: &CoverageDocument) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        let mut survivors = Vec::with_capacity(document.len());
        for (key, record) in document.iter() {
            if let Some(pattern) = self.exclusions.first_match(key) {
                tracing::debug!(key, pattern, "pruning coverage entry");
                outcome.dropped.push(key.to_string());
            } else {
                survivors.push((key, record));
            }
        }

        let keys: Vec<&str> = survivors.iter().map(|(key, _)| *key).collect();
        let unstripped = self.colliding_keys(&keys);

        for (key, record) in survivors {
            let mut record = record.clone();
            let rewritten = match record.get(PATH_FIELD) {
                Some(Value::String(path)) => Some(self.strip(path).to_string()),
                _ => None,
            };
            match rewritten {
                Some(path) => {
                    let _ = record.insert(PATH_FIELD.to_string(), Value::String(path));
                }
                None => {
                    tracing::warn!(key, "coverage entry has no path field; kept unchanged");
                    outcome.warnings.push(GantryError::MissingField {
                        key: key.to_string(),
                        field: PATH_FIELD.to_string(),
                    });
                }
            }

            if unstripped.contains(key) {
                let stripped = self.strip(key);
                tracing::warn!(key, stripped, "stripped key collides; kept unstripped");
                outcome.warnings.push(GantryError::KeyCollision {
                    key: key.to_string(),
                    stripped: stripped.to_string(),
                });
                outcome.document.insert(key, record);
            } else {
                outcome.document.insert(self.strip(key), record);
            }
        }

        outcome
    }

    /// Prefixed keys that must stay unstripped for every output key to be unique
    ///
    /// Keeping one key unstripped can expose a clash with another stripped
    /// key, so this repeats until no new key is added.
    fn colliding_keys<'a>(&self, keys: &[&'a str]) -> HashSet<&'a str> {
        let mut unstripped = HashSet::new();
        loop {
            let mut grew = false;
            let mut targets: HashMap<&str, &str> = HashMap::with_capacity(keys.len());
            for &key in keys {
                let target = if unstripped.contains(key) {
                    key
                } else {
                    self.strip(key)
                };
                match targets.get(target) {
                    Some(&other) => {
                        for candidate in [other, key] {
                            if self.strip(candidate) != candidate {
                                grew |= unstripped.insert(candidate);
                            }
                        }
                    }
                    None => {
                        let _ = targets.insert(target, key);
                    }
                }
            }
            if !grew {
                return unstripped;
            }
        }
    }

    /// Read `input`, filter it and write the result to `output`
    pub async fn prune_file(&self, input: &Path, output: &Path) -> GantryResult<FilterOutcome> {
        let document = CoverageDocument::read(input).await?;
        let outcome = self.apply(&document);
        outcome.document.write(output).await?;
        tracing::info!(
            kept = outcome.document.len(),
            dropped = outcome.dropped.len(),
            output = %output.display(),
            "pruned coverage"
        );
        Ok(outcome)
    }
}

//! Typed view of one istanbul per-file coverage record.
//!
//! Only the aggregator interprets records; the filter treats them as opaque.
//! Unknown fields are ignored and every map defaults to empty, so partially
//! populated records (e.g. a remapped file with no functions) still load.

use super::document::PATH_FIELD;
use crate::config::MergePolicy;
use crate::result::{GantryError, GantryResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A position in a source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line
    pub line: u32,
    /// Column, absent in some remapped output
    #[serde(default)]
    pub column: Option<u32>,
}

/// A source range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Start position
    pub start: Position,
    /// End position
    #[serde(default)]
    pub end: Position,
}

/// Function declaration metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMeta {
    /// Function name (istanbul uses `(anonymous_N)` for unnamed functions)
    #[serde(default)]
    pub name: String,
    /// Declaration line
    #[serde(default)]
    pub line: u32,
    /// Declaration range
    #[serde(default)]
    pub loc: Option<Range>,
}

impl FunctionMeta {
    /// Line of the declaration, falling back to the range start
    #[must_use]
    pub fn decl_line(&self) -> u32 {
        if self.line > 0 {
            self.line
        } else {
            self.loc.map_or(0, |loc| loc.start.line)
        }
    }
}

/// Branch point metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMeta {
    /// Line of the branch point
    #[serde(default)]
    pub line: u32,
    /// Branch kind (`if`, `cond-expr`, `switch`, ...)
    #[serde(default, rename = "type")]
    pub kind: String,
    /// One range per arm
    #[serde(default)]
    pub locations: Vec<Range>,
}

/// Per-file coverage record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCoverage {
    /// Source path
    #[serde(default)]
    pub path: String,
    /// Statement locations by id
    #[serde(default, rename = "statementMap")]
    pub statement_map: BTreeMap<String, Range>,
    /// Statement hit counts by id
    #[serde(default)]
    pub s: BTreeMap<String, u64>,
    /// Function metadata by id
    #[serde(default, rename = "fnMap")]
    pub fn_map: BTreeMap<String, FunctionMeta>,
    /// Function hit counts by id
    #[serde(default)]
    pub f: BTreeMap<String, u64>,
    /// Branch metadata by id
    #[serde(default, rename = "branchMap")]
    pub branch_map: BTreeMap<String, BranchMeta>,
    /// Per-arm branch hit counts by id
    #[serde(default)]
    pub b: BTreeMap<String, Vec<u64>>,
}

impl FileCoverage {
    /// Decode a raw document record
    pub fn from_record(key: &str, record: &Map<String, Value>) -> GantryResult<Self> {
        let mut record = record.clone();
        if record.get(PATH_FIELD).is_some_and(|path| !path.is_string()) {
            tracing::warn!(key, "coverage entry path is not a string; using its key");
            let _ = record.remove(PATH_FIELD);
        }
        let mut file: Self = serde_json::from_value(Value::Object(record))
            .map_err(|e| GantryError::malformed(format!("entry '{key}': {e}")))?;
        if file.path.is_empty() {
            file.path = key.to_string();
        }
        Ok(file)
    }

    /// Line hit counts: the highest count of any statement starting on a line
    #[must_use]
    pub fn line_hits(&self) -> BTreeMap<u32, u64> {
        let mut lines = BTreeMap::new();
        for (id, range) in &self.statement_map {
            let count = self.s.get(id).copied().unwrap_or(0);
            let entry = lines.entry(range.start.line).or_insert(0);
            *entry = (*entry).max(count);
        }
        lines
    }

    /// Combine another record for the same path into this one
    pub fn merge(&mut self, other: Self, policy: MergePolicy) {
        match policy {
            MergePolicy::Replace => *self = other,
            MergePolicy::Sum => {
                add_counts(&mut self.s, other.s);
                add_counts(&mut self.f, other.f);
                for (id, arms) in other.b {
                    let existing = self.b.entry(id).or_default();
                    if existing.len() < arms.len() {
                        existing.resize(arms.len(), 0);
                    }
                    for (slot, hits) in existing.iter_mut().zip(arms) {
                        *slot += hits;
                    }
                }
                for (id, range) in other.statement_map {
                    let _ = self.statement_map.entry(id).or_insert(range);
                }
                for (id, meta) in other.fn_map {
                    let _ = self.fn_map.entry(id).or_insert(meta);
                }
                for (id, meta) in other.branch_map {
                    let _ = self.branch_map.entry(id).or_insert(meta);
                }
            }
        }
    }
}

fn add_counts(into: &mut BTreeMap<String, u64>, from: BTreeMap<String, u64>) {
    for (id, hits) in from {
        *into.entry(id).or_insert(0) += hits;
    }
}

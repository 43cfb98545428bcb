//! Coverage document: a flat, insertion-ordered map from source path to an
//! opaque per-file record.

use crate::result::{GantryError, GantryResult};
use serde_json::{Map, Value};
use std::path::Path;

/// Field holding the source path inside each record
pub const PATH_FIELD: &str = "path";

/// A coverage document as produced by the instrumentation/remap tools
///
/// Records are kept as raw JSON objects; only the `path` field is ever
/// interpreted by the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageDocument {
    entries: Map<String, Value>,
}

impl CoverageDocument {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a parsed JSON value
    ///
    /// Fails with `MalformedDocument` unless `value` is an object whose
    /// every member is itself an object.
    pub fn from_value(value: Value) -> GantryResult<Self> {
        let Value::Object(entries) = value else {
            return Err(GantryError::malformed(format!(
                "expected an object at top level, found {}",
                kind_of(&value)
            )));
        };
        if let Some((key, record)) = entries.iter().find(|(_, v)| !v.is_object()) {
            return Err(GantryError::malformed(format!(
                "entry '{key}' is {}, expected an object",
                kind_of(record)
            )));
        }
        Ok(Self { entries })
    }

    /// Parse a document from JSON text
    pub fn from_json_str(json: &str) -> GantryResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| GantryError::malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Read a document from disk
    pub async fn read(path: &Path) -> GantryResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    /// Write the document to disk as compact JSON, creating parent directories
    pub async fn write(&self, path: &Path) -> GantryResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_json_string()?).await?;
        Ok(())
    }

    /// Serialize as compact JSON
    pub fn to_json_string(&self) -> GantryResult<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Insert or replace a record
    ///
    /// Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, record: Map<String, Value>) {
        let _ = self.entries.insert(key.into(), Value::Object(record));
    }

    /// Look up a record by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Map<String, Value>> {
        self.entries.get(key).and_then(Value::as_object)
    }

    /// Whether the document has a record for `key`
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_object().map(|record| (k.as_str(), record)))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

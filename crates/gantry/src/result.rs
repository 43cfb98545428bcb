//! Result and error types for Gantry.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Gantry operations
pub type GantryResult<T> = Result<T, GantryError>;

/// Errors that can occur in Gantry
#[derive(Debug, Error)]
pub enum GantryError {
    /// Coverage document is not a flat mapping of string to object
    #[error("Malformed coverage document: {message}")]
    MalformedDocument {
        /// Error message
        message: String,
    },

    /// A coverage entry lacks a field the caller expected
    #[error("Coverage entry {key} has no `{field}` field")]
    MissingField {
        /// Document key of the entry
        key: String,
        /// Name of the missing field
        field: String,
    },

    /// Two coverage keys would become identical once the prefix is stripped
    #[error("Coverage entry {key} would collide as {stripped}; key kept unstripped")]
    KeyCollision {
        /// Original document key, kept as-is
        key: String,
        /// Stripped form it would have taken
        stripped: String,
    },

    /// Report finalized with zero merged entries
    #[error("No coverage data to report")]
    NoData,

    /// `patch()` called while the vendor file is already patched
    #[error("Vendor file {} is already patched (backup at {})", live.display(), backup.display())]
    AlreadyPatched {
        /// Live vendor file
        live: PathBuf,
        /// Backup of the original
        backup: PathBuf,
    },

    /// `restore()` called without a backup to restore from
    #[error("No backup to restore at {}", backup.display())]
    NoBackup {
        /// Expected backup location
        backup: PathBuf,
    },

    /// A pipeline stage failed
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        /// Name of the failing stage
        stage: String,
        /// Underlying error
        #[source]
        source: Box<GantryError>,
    },

    /// An external tool exited unsuccessfully
    #[error("{tool} failed{}: {message}", code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    ToolFailed {
        /// Program name
        tool: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Error message
        message: String,
    },

    /// A plan referenced a stage the registry does not know
    #[error("Unknown stage: {name}")]
    UnknownStage {
        /// Stage name
        name: String,
    },

    /// A stage name was registered or scheduled twice
    #[error("Duplicate stage: {name}")]
    DuplicateStage {
        /// Stage name
        name: String,
    },

    /// Structurally invalid pipeline plan
    #[error("Invalid pipeline plan: {message}")]
    InvalidPlan {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// File watcher error
    #[error("Watch error: {message}")]
    Watch {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl GantryError {
    /// Create a malformed document error
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid plan error
    #[must_use]
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan {
            message: message.into(),
        }
    }

    /// Wrap an error with the name of the stage that produced it
    #[must_use]
    pub fn stage_failed(stage: impl Into<String>, source: Self) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// Name of the failing stage, if this is a stage failure
    #[must_use]
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            Self::StageFailed { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Whether the pipeline may continue after this error
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::KeyCollision { .. } | Self::NoData
        )
    }
}

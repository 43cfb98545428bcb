//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Pipeline run failed
    #[error("Pipeline '{pipeline}' failed: {source}")]
    PipelineFailed {
        /// Pipeline or stage the command ran
        pipeline: String,
        /// First stage failure
        #[source]
        source: gantry::GantryError,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Gantry library error
    #[error("{0}")]
    Gantry(#[from] gantry::GantryError),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a pipeline failure
    #[must_use]
    pub fn pipeline_failed(pipeline: impl Into<String>, source: gantry::GantryError) -> Self {
        Self::PipelineFailed {
            pipeline: pipeline.into(),
            source,
        }
    }
}

//! Error types for pyterp.
//!
//! Discovery problems (a broken interpreter, an unreadable PATH entry) are
//! never surfaced as errors; they are logged and skipped. The variants here
//! cover persistence and explicit user operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the pyterp library.
#[derive(Debug, Error)]
pub enum PyterpError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Registry errors
    #[error("Interpreter not found: {id}")]
    InterpreterNotFound { id: String },

    #[error("Duplicate interpreter id: {id}")]
    DuplicateInterpreterId { id: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for pyterp operations.
pub type Result<T> = std::result::Result<T, PyterpError>;

impl From<std::io::Error> for PyterpError {
    fn from(err: std::io::Error) -> Self {
        PyterpError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for PyterpError {
    fn from(err: serde_json::Error) -> Self {
        PyterpError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl PyterpError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PyterpError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether the error refers to a missing interpreter id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PyterpError::InterpreterNotFound { .. })
    }
}

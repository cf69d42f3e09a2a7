//! Error types for corpusgen.
//!
//! Library crates use [`CorpusError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all corpusgen operations.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Raw record data did not match the expected shape.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The exported data literal could not be located or parsed.
    #[error("extraction error: {message}")]
    Extract { message: String },

    /// JSON serialization of an output artifact failed.
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CorpusError>;

impl CorpusError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extract(msg: impl Into<String>) -> Self {
        Self::Extract {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only affects a single source file.
    ///
    /// Recoverable errors are logged and the file is skipped; everything
    /// else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Extract { .. })
    }
}

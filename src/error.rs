//! Error types for mailvault

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mailvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mailvault operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// A blob could not be written. Nothing is left at `path` when this is returned.
    #[error("Write failed at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Integrity mismatch for {key}: stored content hashes to {actual}")]
    IntegrityMismatch { key: String, actual: String },

    #[error("Size mismatch for {key}: record says {recorded} bytes, stored body has {stored}")]
    SizeMismatch {
        key: String,
        recorded: u64,
        stored: u64,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Message parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

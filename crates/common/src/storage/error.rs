//! Storage error types
//!
//! Defines error types for the key-value store layer, integrating with the
//! workspace error classification.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::error::{BoxError, ErrorClassification, ErrorSeverity};

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing file exists but could not be read
    #[error("Failed to read store file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file could not be written or replaced
    #[error("Failed to write store file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file does not hold a JSON object
    #[error("Store file {} is not a JSON object: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be converted to or from JSON
    #[error("Failed to convert value for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The populate-on-miss producer for a key failed
    #[error("Producer for key '{key}' failed: {source}")]
    Producer {
        key: String,
        #[source]
        source: BoxError,
    },
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Key or path the failure relates to, for log fields
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } | Self::Corrupt { path, .. } => {
                path.display().to_string()
            }
            Self::Serialization { key, .. } | Self::Producer { key, .. } => key.clone(),
        }
    }
}

impl ErrorClassification for StorageError {
    /// Store failures are never retried by the store itself; a failed
    /// producer is retried implicitly by the next `get_or_create`.
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Corrupt { .. } => ErrorSeverity::Critical,
            Self::Read { .. }
            | Self::Write { .. }
            | Self::Serialization { .. }
            | Self::Producer { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

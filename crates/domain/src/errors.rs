//! Error types used throughout the bunq crates

use std::time::Duration;

use bunq_common::error::{ErrorClassification, ErrorSeverity};
use bunq_common::storage::StorageError;
use thiserror::Error;

use crate::impl_wire_name_conversions;

/// Handshake stage a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeStage {
    ClientKeyPair,
    Installation,
    DeviceRegistration,
    Session,
}

impl_wire_name_conversions!(HandshakeStage {
    ClientKeyPair => "client_key_pair",
    Installation => "installation",
    DeviceRegistration => "device_registration",
    Session => "session",
});

/// Categories of errors for logging and recovery decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401/403 rejections and expired sessions
    Authentication,
    /// 429 responses
    RateLimit,
    /// 5xx responses
    Server,
    /// Other 4xx responses and malformed responses
    Client,
    /// Connection, TLS and timeout failures
    Network,
    /// Store read/write failures
    Storage,
    /// A handshake stage could not complete
    Handshake,
    /// Invalid configuration or key material
    Config,
}

/// Main error type for bunq operations
#[derive(Debug, Error)]
pub enum BunqError {
    #[error("Store error: {0}")]
    Storage(#[source] StorageError),

    #[error("Handshake failed at {stage}: {message}")]
    Handshake { stage: HandshakeStage, message: String },

    /// The request was rejected again after one forced re-authentication
    #[error("Session expired and re-authentication did not help (HTTP {status}): {message}")]
    AuthExpired { status: u16, message: String },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for bunq operations
pub type BunqResult<T> = std::result::Result<T, BunqError>;

impl BunqError {
    pub fn handshake(stage: HandshakeStage, message: impl Into<String>) -> Self {
        Self::Handshake { stage, message: message.into() }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status { status, message: message.into() }
    }

    /// HTTP status of a remote rejection, if this is one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::AuthExpired { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Handshake { .. } => ErrorCategory::Handshake,
            Self::AuthExpired { .. } => ErrorCategory::Authentication,
            Self::Status { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            Self::Transport(_) => ErrorCategory::Network,
            Self::InvalidResponse(_) => ErrorCategory::Client,
            Self::Crypto(_) | Self::Config(_) => ErrorCategory::Config,
        }
    }
}

/// Store failures surface as `Storage`, except that an error raised by a
/// populate-on-miss producer comes back as the `BunqError` it was.
impl From<StorageError> for BunqError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Producer { key, source } => match source.downcast::<Self>() {
                Ok(inner) => *inner,
                Err(source) => Self::Storage(StorageError::Producer { key, source }),
            },
            other => Self::Storage(other),
        }
    }
}

impl ErrorClassification for BunqError {
    /// Only worth retrying at a higher level; this crate never retries
    /// except for the single re-authentication in the dispatcher.
    fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Server | ErrorCategory::Network
        )
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Storage(inner) => inner.severity(),
            Self::Status { .. } | Self::AuthExpired { .. } => match self.category() {
                ErrorCategory::RateLimit | ErrorCategory::Authentication => ErrorSeverity::Warning,
                _ => ErrorSeverity::Error,
            },
            Self::Handshake { .. }
            | Self::Transport(_)
            | Self::InvalidResponse(_)
            | Self::Crypto(_)
            | Self::Config(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Storage(inner) if inner.is_critical())
    }

    fn retry_after(&self) -> Option<Duration> {
        match self.category() {
            // One throttle window
            ErrorCategory::RateLimit => Some(Duration::from_secs(3)),
            ErrorCategory::Server | ErrorCategory::Network => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}

//! Error types for the store module.

use arcjet_core::DecodeError;
use thiserror::Error;

/// Transport failures talking to a remote store or index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The server answered with an unexpected status.
    #[error("unexpected status {0}")]
    BadStatus(u16),
}

/// Errors that can occur during store and index operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No blob stored under the given content hash.
    #[error("content not found: {0}")]
    NotFound(String),

    /// Remote transport failure.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A response body exceeded the configured size limit.
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    /// Response or request body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An index entry is missing derived fields or carries malformed ones.
    #[error("invalid index entry: {0}")]
    InvalidEntry(#[from] DecodeError),

    /// The configured base URL cannot be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

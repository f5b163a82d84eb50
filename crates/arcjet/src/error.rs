//! Error types for the Arcjet client.

use arcjet_core::{
    CryptoError, DecodeError, EncodingError, IntegrityError, RecordError, Sha512Hash,
};
use arcjet_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Arcjet operations.
#[derive(Debug, Error)]
pub enum ArcjetError {
    /// Content or metadata could not be encoded for signing.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Key material missing or unusable.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A record failed verification.
    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// An index entry could not be turned back into a record.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Store or index failure, including network errors.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The store reported or served a different hash than expected.
    #[error("content hash mismatch: expected {expected:?}, got {actual:?}")]
    HashMismatch {
        expected: Sha512Hash,
        actual: Sha512Hash,
    },
}

impl From<RecordError> for ArcjetError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Encoding(e) => Self::Encoding(e),
            RecordError::Crypto(e) => Self::Crypto(e),
        }
    }
}

/// Why an index entry returned by `find` was not accepted.
#[derive(Debug, Error)]
pub enum RejectReason {
    /// Derived fields missing or malformed.
    #[error("malformed entry: {0}")]
    Malformed(#[from] DecodeError),

    /// The store has no content under the entry's content hash.
    #[error("content not found")]
    ContentMissing,

    /// The store served bytes whose hash differs from the entry's.
    #[error("store served mismatched content")]
    HashMismatch,

    /// The rebuilt record failed verification.
    #[error("verification failed: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Result type for Arcjet operations.
pub type Result<T> = std::result::Result<T, ArcjetError>;

//! Error types for Arcjet Core.

use thiserror::Error;

/// Errors raised while turning content and metadata into signable bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("record content is empty")]
    EmptyContent,

    #[error("unsupported metadata value: {0}")]
    Unsupported(String),

    #[error("metadata must be a mapping at the top level")]
    NotAnObject,

    #[error("metadata nesting exceeds {} levels", crate::canonical::MAX_DEPTH)]
    TooDeep,

    #[error("metadata key {0:?} is reserved for signature-derived fields")]
    ReservedField(String),

    #[error("metadata number is not finite")]
    NonFiniteNumber,
}

/// Errors from key handling and the signature primitive.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("no usable private key available")]
    KeyUnavailable,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("key store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The specific invariant a verification found broken.
///
/// Each variant names exactly one diverging field so callers can tell a
/// tampered payload from a forged identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("content does not match content hash")]
    ContentTamper,

    #[error("metadata does not match metadata hash")]
    MetadataTamper,

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("record id does not match signature and hashes")]
    IdMismatch,
}

/// Errors decoding a record from the wire layout or an index document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated record: need {needed} more bytes")]
    Truncated { needed: usize },

    #[error("record carries no content")]
    EmptyContent,

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("missing field {0}")]
    MissingField(&'static str),
}

/// Errors that can occur while signing a record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

//! Record verification.

use crate::crypto::{PublicKey, Sha512Hash};
use crate::error::IntegrityError;
use crate::record::{metadata_hash, Record};

/// Verify a record.
///
/// Checks, in order:
/// 1. content hash against the content
/// 2. metadata hash against the current metadata
/// 3. signature over `content_hash || metadata_hash`, under `trusted_key`
///    or, when none is given, the key embedded in metadata
/// 4. id against `signature || content_hash || metadata_hash`
///
/// The first broken invariant is reported. Missing or malformed keys and
/// signatures fail closed as [`IntegrityError::SignatureInvalid`].
pub fn verify_record(
    record: &Record,
    trusted_key: Option<&PublicKey>,
) -> Result<(), IntegrityError> {
    // 1-2. Hashes
    verify_hashes(record)?;

    // 3. Signature
    let embedded;
    let key = match trusted_key {
        Some(key) => key,
        None => {
            embedded = record
                .public_key()
                .map_err(|_| IntegrityError::SignatureInvalid)?;
            &embedded
        }
    };
    key.verify(&record.signed_message(), &record.signature)
        .map_err(|_| IntegrityError::SignatureInvalid)?;

    // 4. Id
    if record.compute_id() != record.id {
        return Err(IntegrityError::IdMismatch);
    }

    Ok(())
}

/// Check only the content and metadata hashes.
///
/// Useful before fetching keys, or to test a record read back from storage
/// whose signature was already checked.
pub fn verify_hashes(record: &Record) -> Result<(), IntegrityError> {
    if Sha512Hash::hash(&record.content) != record.content_hash {
        return Err(IntegrityError::ContentTamper);
    }

    // Metadata that no longer encodes cannot match what was signed.
    let computed =
        metadata_hash(&record.metadata).map_err(|_| IntegrityError::MetadataTamper)?;
    if computed != record.metadata_hash {
        return Err(IntegrityError::MetadataTamper);
    }

    Ok(())
}

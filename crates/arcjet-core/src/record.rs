//! Record: content plus metadata, bound by hashes and a signature.
//!
//! A record is immutable once signed. Changing content or metadata means
//! signing a new record, which gets a new id.

use bytes::Bytes;

use crate::canonical::{canonicalize, id_hash, signed_message};
use crate::crypto::{PublicKey, Sha512Hash, Signature, SigningKeyPair};
use crate::error::{CryptoError, DecodeError, EncodingError, IntegrityError, RecordError};
use crate::keystore::KeyStore;
use crate::types::{Metadata, RecordId};
use crate::wire::RecordFrame;

/// Metadata key holding the signer's public key as a JWK object.
pub const PUBLIC_KEY_FIELD: &str = "publicKey";
/// Index document key for the record id.
pub const ID_FIELD: &str = "id";
/// Index document key for the signature.
pub const SIGNATURE_FIELD: &str = "signature";
/// Index document key for the content hash.
pub const CONTENT_HASH_FIELD: &str = "contentHash";
/// Index document key for the metadata hash.
pub const METADATA_HASH_FIELD: &str = "metadataHash";
/// Index document key for the content type.
pub const TYPE_FIELD: &str = "type";

/// Fields produced by signing. Never part of the metadata hash.
pub const DERIVED_FIELDS: [&str; 5] = [
    ID_FIELD,
    SIGNATURE_FIELD,
    CONTENT_HASH_FIELD,
    METADATA_HASH_FIELD,
    PUBLIC_KEY_FIELD,
];

/// Fields an index document carries beside the record metadata. Stripping
/// them from a document leaves the metadata, embedded key included.
pub const INDEX_FIELDS: [&str; 5] = [
    ID_FIELD,
    SIGNATURE_FIELD,
    CONTENT_HASH_FIELD,
    METADATA_HASH_FIELD,
    TYPE_FIELD,
];

/// Check whether a metadata key is set by signing rather than by the caller.
pub fn is_reserved_field(key: &str) -> bool {
    DERIVED_FIELDS.contains(&key) || INDEX_FIELDS.contains(&key)
}

/// Compute the metadata hash: SHA-512 over the canonical encoding of
/// metadata with derived and index fields removed.
pub fn metadata_hash(metadata: &Metadata) -> Result<Sha512Hash, EncodingError> {
    let bytes = if metadata.iter().any(|(k, _)| is_reserved_field(k)) {
        let stripped: Metadata = metadata
            .iter()
            .filter(|(k, _)| !is_reserved_field(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        canonicalize(&stripped)?
    } else {
        canonicalize(metadata)?
    };
    Ok(Sha512Hash::hash(&bytes))
}

/// A signed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The opaque payload.
    pub content: Bytes,

    /// MIME type of the content.
    pub content_type: String,

    /// Caller metadata plus the embedded `publicKey`.
    pub metadata: Metadata,

    /// SHA-512 of `content`.
    pub content_hash: Sha512Hash,

    /// SHA-512 of the canonical metadata encoding.
    pub metadata_hash: Sha512Hash,

    /// ECDSA P-521 signature over `content_hash || metadata_hash`.
    pub signature: Signature,

    /// SHA-512 over `signature || content_hash || metadata_hash`.
    pub id: RecordId,
}

impl Record {
    /// Compute the id from the current signature and hashes.
    pub fn compute_id(&self) -> RecordId {
        RecordId(id_hash(&self.signature, &self.content_hash, &self.metadata_hash).0)
    }

    /// The bytes covered by the signature.
    pub fn signed_message(&self) -> Vec<u8> {
        signed_message(&self.content_hash, &self.metadata_hash)
    }

    /// Parse the public key embedded in metadata.
    pub fn public_key(&self) -> Result<PublicKey, CryptoError> {
        let jwk = self
            .metadata
            .get(PUBLIC_KEY_FIELD)
            .ok_or(CryptoError::KeyUnavailable)?;
        PublicKey::from_jwk_value(jwk)
    }

    /// Verify every record invariant.
    ///
    /// With `trusted_key` the signature must verify under that key; without
    /// it only self-consistency against the embedded key is checked.
    pub fn verify(&self, trusted_key: Option<&PublicKey>) -> Result<(), IntegrityError> {
        crate::validation::verify_record(self, trusted_key)
    }

    /// Serialize to the wire layout.
    pub fn to_bytes(&self) -> Result<Bytes, EncodingError> {
        crate::wire::encode_record(self)
    }

    /// Rebuild a record from a decoded wire frame and the metadata and
    /// content type carried out of band (e.g. by the index).
    ///
    /// No verification is performed here.
    pub fn from_frame(frame: RecordFrame, metadata: Metadata, content_type: impl Into<String>) -> Self {
        Self {
            content: frame.content,
            content_type: content_type.into(),
            metadata,
            content_hash: frame.content_hash,
            metadata_hash: frame.metadata_hash,
            signature: frame.signature,
            id: frame.id,
        }
    }

    /// Decode the wire layout and attach metadata and content type.
    pub fn from_bytes(
        bytes: impl Into<Bytes>,
        metadata: Metadata,
        content_type: impl Into<String>,
    ) -> Result<Self, DecodeError> {
        let frame = crate::wire::decode_record(bytes)?;
        Ok(Self::from_frame(frame, metadata, content_type))
    }
}

/// Builder for creating records.
///
/// Holds the unsigned state; [`RecordBuilder::sign`] consumes it, so a
/// record can never be observed half-signed.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    content: Bytes,
    content_type: String,
    metadata: Metadata,
}

impl RecordBuilder {
    /// Start building a record.
    pub fn new(content: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
            metadata: Metadata::new(),
        }
    }

    /// Replace the metadata.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set a single metadata attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Sign with a key pair.
    pub fn sign(self, keypair: &SigningKeyPair) -> Result<Record, RecordError> {
        if self.content.is_empty() {
            return Err(EncodingError::EmptyContent.into());
        }
        if let Some((key, _)) = self.metadata.iter().find(|(k, _)| is_reserved_field(k)) {
            return Err(EncodingError::ReservedField(key.clone()).into());
        }

        let content_hash = Sha512Hash::hash(&self.content);
        let metadata_hash = metadata_hash(&self.metadata)?;

        let mut metadata = self.metadata;
        metadata.insert(PUBLIC_KEY_FIELD, keypair.public_key().to_jwk_value()?);

        // Sign: content_hash || metadata_hash
        let signature = keypair.sign(&signed_message(&content_hash, &metadata_hash));
        let id = RecordId(id_hash(&signature, &content_hash, &metadata_hash).0);

        Ok(Record {
            content: self.content,
            content_type: self.content_type,
            metadata,
            content_hash,
            metadata_hash,
            signature,
            id,
        })
    }

    /// Sign with the key pair held by a key store.
    pub fn sign_with(self, keys: &dyn KeyStore) -> Result<Record, RecordError> {
        let keypair = keys.load_keypair()?;
        self.sign(&keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::MemoryKeyStore;
    use serde_json::json;

    fn test_keypair() -> SigningKeyPair {
        SigningKeyPair::from_secret_bytes(&[0x42; 32]).unwrap()
    }

    #[test]
    fn test_record_builder() {
        let keypair = test_keypair();
        let record = RecordBuilder::new(b"hello".to_vec(), "text/plain")
            .attr("tag", "demo")
            .sign(&keypair)
            .unwrap();

        assert_eq!(record.content.as_ref(), b"hello");
        assert_eq!(record.content_type, "text/plain");
        assert_eq!(record.metadata.get("tag"), Some(&json!("demo")));
        assert_eq!(record.content_hash, Sha512Hash::hash(b"hello"));
        assert_eq!(record.public_key().unwrap(), keypair.public_key());
        assert_eq!(record.id, record.compute_id());
    }

    #[test]
    fn test_public_key_excluded_from_metadata_hash() {
        let keypair = test_keypair();
        let record = RecordBuilder::new(b"x".to_vec(), "text/plain")
            .attr("tag", "demo")
            .sign(&keypair)
            .unwrap();
        assert!(record.metadata.contains_key(PUBLIC_KEY_FIELD));

        let caller_metadata = Metadata::new().with("tag", "demo");
        let expected = Sha512Hash::hash(&canonicalize(&caller_metadata).unwrap());
        assert_eq!(record.metadata_hash, expected);
        assert_eq!(metadata_hash(&record.metadata).unwrap(), expected);

        let mut without_key = record.metadata.clone();
        without_key.remove(PUBLIC_KEY_FIELD);
        assert_eq!(metadata_hash(&without_key).unwrap(), record.metadata_hash);
    }

    #[test]
    fn test_derived_fields_excluded_from_hash() {
        let metadata = Metadata::new().with("tag", "demo");
        let with_derived = metadata
            .clone()
            .with(ID_FIELD, "ab")
            .with(CONTENT_HASH_FIELD, "cd")
            .with(PUBLIC_KEY_FIELD, serde_json::json!({ "kty": "EC" }))
            .with(TYPE_FIELD, "text/plain");
        assert_eq!(
            metadata_hash(&metadata).unwrap(),
            metadata_hash(&with_derived).unwrap()
        );
    }

    #[test]
    fn test_empty_content_rejected() {
        let result = RecordBuilder::new(Bytes::new(), "text/plain").sign(&test_keypair());
        assert!(matches!(
            result,
            Err(RecordError::Encoding(EncodingError::EmptyContent))
        ));
    }

    #[test]
    fn test_reserved_fields_rejected() {
        for field in [PUBLIC_KEY_FIELD, ID_FIELD, SIGNATURE_FIELD, TYPE_FIELD] {
            let result = RecordBuilder::new(b"x".to_vec(), "text/plain")
                .attr(field, "caller value")
                .sign(&test_keypair());
            match result {
                Err(RecordError::Encoding(EncodingError::ReservedField(key))) => {
                    assert_eq!(key, field)
                }
                other => panic!("expected ReservedField for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_too_deep_metadata_rejected() {
        let mut value = json!(1);
        for _ in 0..100 {
            value = json!({ "n": value });
        }
        let result = RecordBuilder::new(b"x".to_vec(), "text/plain")
            .attr("deep", value)
            .sign(&test_keypair());
        assert!(matches!(
            result,
            Err(RecordError::Encoding(EncodingError::TooDeep))
        ));
    }

    #[test]
    fn test_signing_twice_gives_different_ids() {
        let keypair = test_keypair();
        let builder = RecordBuilder::new(b"same".to_vec(), "text/plain").attr("k", 1);
        let r1 = builder.clone().sign(&keypair).unwrap();
        let r2 = builder.sign(&keypair).unwrap();

        assert_eq!(r1.content_hash, r2.content_hash);
        assert_eq!(r1.metadata_hash, r2.metadata_hash);
        assert_ne!(r1.signature, r2.signature);
        assert_ne!(r1.id, r2.id);
        r1.verify(None).unwrap();
        r2.verify(None).unwrap();
    }

    #[test]
    fn test_sign_with_key_store() {
        let keys = MemoryKeyStore::new();
        let result = RecordBuilder::new(b"x".to_vec(), "text/plain").sign_with(&keys);
        assert!(matches!(
            result,
            Err(RecordError::Crypto(CryptoError::KeyUnavailable))
        ));

        let keypair = keys.generate().unwrap();
        let record = RecordBuilder::new(b"x".to_vec(), "text/plain")
            .sign_with(&keys)
            .unwrap();
        record.verify(Some(&keypair.public_key())).unwrap();
    }

    #[test]
    fn test_wire_roundtrip_through_record() {
        let record = RecordBuilder::new(b"payload".to_vec(), "application/octet-stream")
            .attr("tag", "demo")
            .sign(&test_keypair())
            .unwrap();

        let bytes = record.to_bytes().unwrap();
        let recovered =
            Record::from_bytes(bytes, record.metadata.clone(), record.content_type.clone())
                .unwrap();
        assert_eq!(recovered, record);
        recovered.verify(None).unwrap();
    }
}

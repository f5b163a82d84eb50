//! Index entries and queries.
//!
//! An index entry is the flattened document registered with the index:
//! caller metadata, the embedded `publicKey`, and the signature-derived
//! fields as lowercase hex plus the content `type`.
//!
//! ```json
//! {
//!   "tag": "demo",
//!   "publicKey": {"kty": "EC", "crv": "P-521", "x": "...", "y": "..."},
//!   "id": "<128 hex>",
//!   "signature": "<264 hex>",
//!   "contentHash": "<128 hex>",
//!   "metadataHash": "<128 hex>",
//!   "type": "text/plain"
//! }
//! ```

use arcjet_core::record::{
    CONTENT_HASH_FIELD, ID_FIELD, INDEX_FIELDS, METADATA_HASH_FIELD, SIGNATURE_FIELD,
    TYPE_FIELD,
};
use arcjet_core::{DecodeError, EncodingError, Metadata, Record, RecordId, Sha512Hash, Signature};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document held by the index.
///
/// Any JSON object deserializes; the derived fields are checked only when
/// they are read, so malformed entries from an untrusted index surface as
/// [`DecodeError`]s rather than disappearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexEntry(Map<String, Value>);

impl IndexEntry {
    /// Flatten a signed record into its index document.
    pub fn from_record(record: &Record) -> Self {
        let mut doc = record.metadata.as_map().clone();
        doc.insert(ID_FIELD.into(), record.id.to_hex().into());
        doc.insert(SIGNATURE_FIELD.into(), record.signature.to_hex().into());
        doc.insert(CONTENT_HASH_FIELD.into(), record.content_hash.to_hex().into());
        doc.insert(METADATA_HASH_FIELD.into(), record.metadata_hash.to_hex().into());
        doc.insert(TYPE_FIELD.into(), record.content_type.clone().into());
        Self(doc)
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(EncodingError::NotAnObject),
        }
    }

    /// Check that every derived field is present and well-formed.
    pub fn validate(&self) -> Result<(), DecodeError> {
        self.id()?;
        self.signature()?;
        self.content_hash()?;
        self.metadata_hash()?;
        self.content_type()?;
        Ok(())
    }

    pub fn id(&self) -> Result<RecordId, DecodeError> {
        let s = self.str_field(ID_FIELD)?;
        RecordId::from_hex(s).map_err(|e| invalid(ID_FIELD, e))
    }

    pub fn signature(&self) -> Result<Signature, DecodeError> {
        let s = self.str_field(SIGNATURE_FIELD)?;
        Signature::from_hex(s).map_err(|e| invalid(SIGNATURE_FIELD, e))
    }

    pub fn content_hash(&self) -> Result<Sha512Hash, DecodeError> {
        let s = self.str_field(CONTENT_HASH_FIELD)?;
        Sha512Hash::from_hex(s).map_err(|e| invalid(CONTENT_HASH_FIELD, e))
    }

    pub fn metadata_hash(&self) -> Result<Sha512Hash, DecodeError> {
        let s = self.str_field(METADATA_HASH_FIELD)?;
        Sha512Hash::from_hex(s).map_err(|e| invalid(METADATA_HASH_FIELD, e))
    }

    pub fn content_type(&self) -> Result<&str, DecodeError> {
        self.str_field(TYPE_FIELD)
    }

    /// The record metadata: the document without index fields. The embedded
    /// public key stays.
    pub fn metadata(&self) -> Metadata {
        self.0
            .iter()
            .filter(|(k, _)| !INDEX_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Rebuild the record from this entry and content fetched from a store.
    ///
    /// No verification is performed here.
    pub fn into_record(self, content: Bytes) -> Result<Record, DecodeError> {
        if content.is_empty() {
            return Err(DecodeError::EmptyContent);
        }
        Ok(Record {
            content_type: self.content_type()?.to_owned(),
            content_hash: self.content_hash()?,
            metadata_hash: self.metadata_hash()?,
            signature: self.signature()?,
            id: self.id()?,
            metadata: self.metadata(),
            content,
        })
    }

    /// Whether this entry satisfies `query`.
    pub fn matches(&self, query: &Query) -> bool {
        query.0.iter().all(|(k, v)| self.0.get(k) == Some(v))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn str_field(&self, field: &'static str) -> Result<&str, DecodeError> {
        match self.0.get(field) {
            None => Err(DecodeError::MissingField(field)),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(DecodeError::InvalidField {
                field,
                reason: format!("expected string, got {other}"),
            }),
        }
    }
}

fn invalid(field: &'static str, e: hex::FromHexError) -> DecodeError {
    DecodeError::InvalidField {
        field,
        reason: e.to_string(),
    }
}

/// A metadata query: an entry matches when every query key is present in
/// the entry with an equal value.
///
/// The empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(Map<String, Value>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style constraint.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(EncodingError::NotAnObject),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Metadata> for Query {
    fn from(metadata: Metadata) -> Self {
        match metadata.into_value() {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

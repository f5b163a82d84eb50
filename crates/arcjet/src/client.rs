//! The Arcjet client: unified API over keys, a content store and an index.
//!
//! Neither the store nor the index is trusted. Everything read back is
//! rebuilt into a [`Record`] and verified before it is returned.

use arcjet_core::{
    CryptoError, EncodingError, IntegrityError, KeyStore, Metadata, PublicKey, Record, RecordBuilder,
    Sha512Hash, SigningKeyPair,
};
use arcjet_store::{
    HttpClient, HttpClientConfig, IndexClient, IndexEntry, Query, StoreClient, StoreError,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ArcjetError, RejectReason, Result};

/// Content type used by [`Arcjet::set_json`].
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct ArcjetConfig {
    /// Key every fetched record must be signed by. `None` accepts any
    /// self-consistent record, checking only against its embedded key.
    pub trusted_key: Option<PublicKey>,

    /// Compare content hashes reported or served by the store with the
    /// expected ones.
    pub check_store_hash: bool,
}

impl Default for ArcjetConfig {
    fn default() -> Self {
        Self {
            trusted_key: None,
            check_store_hash: true,
        }
    }
}

/// An index entry `find` did not accept.
#[derive(Debug)]
pub struct Rejected {
    pub entry: IndexEntry,
    pub reason: RejectReason,
}

/// Outcome of [`Arcjet::find`].
#[derive(Debug, Default)]
pub struct FindReport {
    /// Records that passed verification.
    pub verified: Vec<Record>,

    /// Entries that could not be fetched, rebuilt or verified.
    pub rejected: Vec<Rejected>,
}

/// The main client struct.
///
/// Provides:
/// - Key generation and loading through a [`KeyStore`]
/// - Signing and publishing records
/// - Fetching content by hash
/// - Discovering and verifying records through the index
pub struct Arcjet<S: StoreClient, I: IndexClient> {
    /// Signing key pair; `None` for a read-only client.
    keypair: Option<SigningKeyPair>,
    store: S,
    index: I,
    config: ArcjetConfig,
}

impl<S: StoreClient, I: IndexClient> Arcjet<S, I> {
    /// Create a client signing with `keypair`.
    pub fn new(keypair: SigningKeyPair, store: S, index: I, config: ArcjetConfig) -> Self {
        Self {
            keypair: Some(keypair),
            store,
            index,
            config,
        }
    }

    /// Create a client that can find and verify but not sign.
    pub fn read_only(store: S, index: I, config: ArcjetConfig) -> Self {
        Self {
            keypair: None,
            store,
            index,
            config,
        }
    }

    /// Generate a fresh key pair, persist it in `keys`, and sign with it.
    pub fn generate(keys: &dyn KeyStore, store: S, index: I, config: ArcjetConfig) -> Result<Self> {
        let keypair = keys.generate()?;
        info!(public_key = ?keypair.public_key(), "generated signing key");
        Ok(Self::new(keypair, store, index, config))
    }

    /// Load the key pair held by `keys`. Fails with `KeyUnavailable` if
    /// none has been generated.
    pub fn open(keys: &dyn KeyStore, store: S, index: I, config: ArcjetConfig) -> Result<Self> {
        let keypair = keys.load_keypair()?;
        Ok(Self::new(keypair, store, index, config))
    }

    /// The signing public key, if this client can sign.
    pub fn public_key(&self) -> Option<PublicKey> {
        self.keypair.as_ref().map(SigningKeyPair::public_key)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn config(&self) -> &ArcjetConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publishing
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign a record and publish it to the store and index.
    pub async fn set(
        &self,
        content: impl Into<Bytes>,
        content_type: &str,
        metadata: Metadata,
    ) -> Result<Record> {
        let keypair = self.keypair.as_ref().ok_or(CryptoError::KeyUnavailable)?;
        let record = RecordBuilder::new(content, content_type)
            .metadata(metadata)
            .sign(keypair)?;
        debug!(id = %record.id, "signed record");

        self.publish(&record).await?;
        Ok(record)
    }

    /// Serialize `value` as JSON and [`set`](Self::set) it as
    /// `application/json`.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        metadata: Metadata,
    ) -> Result<Record> {
        let content = serde_json::to_vec(value)
            .map_err(|e| EncodingError::Unsupported(format!("JSON content: {e}")))?;
        self.set(content, JSON_CONTENT_TYPE, metadata).await
    }

    /// Publish an already signed record: content to the store, then the
    /// entry to the index.
    ///
    /// Not retried. A failure after the store write leaves unindexed
    /// content behind.
    pub async fn publish(&self, record: &Record) -> Result<()> {
        let hash = self
            .store
            .put(record.content.clone(), &record.content_type)
            .await?;
        if self.config.check_store_hash && hash != record.content_hash {
            return Err(ArcjetError::HashMismatch {
                expected: record.content_hash,
                actual: hash,
            });
        }

        self.index.put(&IndexEntry::from_record(record)).await?;
        info!(id = %record.id, "published record");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Retrieval
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch content by hash.
    pub async fn get(&self, hash: &Sha512Hash) -> Result<Bytes> {
        let content = self.store.get(hash).await?;
        if self.config.check_store_hash {
            let actual = Sha512Hash::hash(&content);
            if actual != *hash {
                return Err(ArcjetError::HashMismatch {
                    expected: *hash,
                    actual,
                });
            }
        }
        Ok(content)
    }

    /// Fetch the content for an index entry and verify the rebuilt record.
    pub async fn fetch(&self, entry: IndexEntry) -> Result<Record> {
        let hash = entry.content_hash()?;
        let content = self.get(&hash).await?;
        let record = entry.into_record(content)?;
        self.verify(&record)?;
        Ok(record)
    }

    /// Find records whose index entries match `query`.
    ///
    /// Every candidate is fetched and verified. Candidates that fail are
    /// reported in [`FindReport::rejected`]; transport failures abort.
    pub async fn find(&self, query: &Query) -> Result<FindReport> {
        let entries = self.index.find(query).await?;
        let mut report = FindReport::default();

        for entry in entries {
            match self.fetch(entry.clone()).await {
                Ok(record) => report.verified.push(record),
                Err(e) => {
                    let reason = match e {
                        ArcjetError::Decode(e) => RejectReason::Malformed(e),
                        ArcjetError::Store(StoreError::NotFound(_)) => {
                            RejectReason::ContentMissing
                        }
                        ArcjetError::HashMismatch { .. } => RejectReason::HashMismatch,
                        ArcjetError::Integrity(e) => RejectReason::Integrity(e),
                        other => return Err(other),
                    };
                    warn!(id = ?entry.get("id"), %reason, "rejected index entry");
                    report.rejected.push(Rejected { entry, reason });
                }
            }
        }

        debug!(
            verified = report.verified.len(),
            rejected = report.rejected.len(),
            "find"
        );
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify a record under the configured trusted key, or its embedded
    /// key when none is configured.
    pub fn verify(&self, record: &Record) -> std::result::Result<(), IntegrityError> {
        record.verify(self.config.trusted_key.as_ref())
    }
}

impl Arcjet<HttpClient, HttpClient> {
    /// Create a client talking to a remote server for both store and index.
    pub fn remote(
        keypair: Option<SigningKeyPair>,
        http: HttpClientConfig,
        config: ArcjetConfig,
    ) -> Result<Self> {
        let client = HttpClient::new(http)?;
        Ok(match keypair {
            Some(keypair) => Self::new(keypair, client.clone(), client, config),
            None => Self::read_only(client.clone(), client, config),
        })
    }
}

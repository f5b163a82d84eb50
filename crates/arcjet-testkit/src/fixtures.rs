//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use arcjet_core::{Metadata, PublicKey, Record, RecordBuilder, SigningKeyPair};
use arcjet_store::{IndexClient, IndexEntry, MemoryIndex, MemoryStore, StoreClient, StoreError};

/// A test fixture with a key pair, a memory store and a memory index.
pub struct TestFixture {
    pub keypair: SigningKeyPair,
    pub store: MemoryStore,
    pub index: MemoryIndex,
}

impl TestFixture {
    /// Create a new test fixture with a random key pair.
    pub fn new() -> Self {
        Self::with_keypair(SigningKeyPair::generate())
    }

    /// Create with a deterministic key pair. An all-zero seed is not a
    /// valid scalar and panics.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let keypair = SigningKeyPair::from_secret_bytes(&seed).expect("non-zero seed");
        Self::with_keypair(keypair)
    }

    fn with_keypair(keypair: SigningKeyPair) -> Self {
        Self {
            keypair,
            store: MemoryStore::new(),
            index: MemoryIndex::new(),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Sign a record with the fixture's key.
    pub fn make_record(&self, content: &[u8], content_type: &str, metadata: Metadata) -> Record {
        RecordBuilder::new(content.to_vec(), content_type)
            .metadata(metadata)
            .sign(&self.keypair)
            .expect("valid record")
    }

    /// Sign a `text/plain` record carrying `{"tag": tag}`.
    pub fn make_tagged(&self, content: &[u8], tag: &str) -> Record {
        self.make_record(content, "text/plain", Metadata::new().with("tag", tag))
    }

    /// Write a record's content to the store and its entry to the index.
    pub async fn publish(&self, record: &Record) -> Result<(), StoreError> {
        StoreClient::put(&self.store, record.content.clone(), &record.content_type).await?;
        IndexClient::put(&self.index, &IndexEntry::from_record(record)).await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create `n` fixtures with distinct deterministic keys.
pub fn multi_party_fixtures(n: usize) -> Vec<TestFixture> {
    (0..n)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
            TestFixture::with_seed(seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcjet_store::Query;

    #[test]
    fn test_fixture_records_verify() {
        let fixture = TestFixture::new();
        let record = fixture.make_tagged(b"hello", "demo");
        assert!(record.verify(Some(&fixture.public_key())).is_ok());
    }

    #[test]
    fn test_seeded_fixtures_are_deterministic() {
        let a = TestFixture::with_seed([7; 32]);
        let b = TestFixture::with_seed([7; 32]);
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_multi_party_keys_are_distinct() {
        let parties = multi_party_fixtures(3);
        assert_ne!(parties[0].public_key(), parties[1].public_key());
        assert_ne!(parties[1].public_key(), parties[2].public_key());

        let record = parties[0].make_tagged(b"x", "demo");
        assert!(record.verify(Some(&parties[1].public_key())).is_err());
    }

    #[tokio::test]
    async fn test_publish() {
        let fixture = TestFixture::new();
        let record = fixture.make_tagged(b"hello", "demo");
        fixture.publish(&record).await.unwrap();

        assert_eq!(fixture.store.get(&record.content_hash).await.unwrap(), record.content);
        let found = fixture.index.find(&Query::new().with("tag", "demo")).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}

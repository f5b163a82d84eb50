//! Client traits: the abstract interface to the content store and the
//! metadata index.
//!
//! Both services are untrusted. Everything read back through these traits
//! must be verified before use.

use arcjet_core::Sha512Hash;
use async_trait::async_trait;
use bytes::Bytes;

use crate::entry::{IndexEntry, Query};
use crate::error::Result;

/// A blob as held by a content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content: Bytes,

    /// The content type given at upload, when the store keeps it.
    pub content_type: Option<String>,
}

/// Content-addressable blob storage keyed by SHA-512.
///
/// # Design Notes
///
/// - **Idempotent puts**: storing the same bytes twice returns the same hash.
/// - **Returned hash is a claim**: a remote store computes the hash itself;
///   callers compare it against the hash they expect.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Store content, returning its content hash.
    async fn put(&self, content: Bytes, content_type: &str) -> Result<Sha512Hash>;

    /// Fetch content and its content type. `NotFound` if absent.
    async fn get_blob(&self, hash: &Sha512Hash) -> Result<Blob>;

    /// Fetch content. `NotFound` if absent.
    async fn get(&self, hash: &Sha512Hash) -> Result<Bytes> {
        Ok(self.get_blob(hash).await?.content)
    }
}

/// Metadata search over index entries.
#[async_trait]
pub trait IndexClient: Send + Sync {
    /// Register an entry. Re-registering the same id replaces it.
    async fn put(&self, entry: &IndexEntry) -> Result<()>;

    /// Return every entry matching `query`.
    ///
    /// Entries come back as stored; malformed ones are returned too so the
    /// caller can report them.
    async fn find(&self, query: &Query) -> Result<Vec<IndexEntry>>;
}

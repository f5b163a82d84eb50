//! In-memory store and index.
//!
//! Primarily for tests and embedding. Same semantics as the filesystem
//! store and the HTTP server, no persistence.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use arcjet_core::Sha512Hash;
use async_trait::async_trait;
use bytes::Bytes;

use crate::entry::{IndexEntry, Query};
use crate::error::{Result, StoreError};
use crate::traits::{Blob, IndexClient, StoreClient};

/// In-memory content store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<Sha512Hash, Blob>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the blob under `hash` without rehashing.
    ///
    /// Lets tests model a store that serves bytes not matching their key.
    pub fn insert_raw(&self, hash: Sha512Hash, content: Bytes, content_type: Option<String>) {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hash, Blob { content, content_type });
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn put(&self, content: Bytes, content_type: &str) -> Result<Sha512Hash> {
        let hash = Sha512Hash::hash(&content);
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(hash)
            .or_insert_with(|| Blob {
                content,
                content_type: Some(content_type.to_owned()),
            });
        Ok(hash)
    }

    async fn get_blob(&self, hash: &Sha512Hash) -> Result<Blob> {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash.to_hex()))
    }
}

/// In-memory metadata index.
///
/// Entries keep registration order; an entry with an id already present
/// replaces the old one in place.
#[derive(Default)]
pub struct MemoryIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl MemoryIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register an entry without checking its derived fields.
    ///
    /// Lets tests model an index serving malformed or forged documents.
    pub fn insert_raw(&self, entry: IndexEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[async_trait]
impl IndexClient for MemoryIndex {
    async fn put(&self, entry: &IndexEntry) -> Result<()> {
        entry.validate()?;
        let id = entry.id()?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|e| e.id().ok() == Some(id)) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        Ok(())
    }

    async fn find(&self, query: &Query) -> Result<Vec<IndexEntry>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.matches(query))
            .cloned()
            .collect())
    }
}

//! Filesystem content store.
//!
//! Each blob lives in `<dir>/<hex content hash>`, its content type in a
//! `<hex>.type` sidecar. Writes go to a temporary file first and are renamed
//! into place, so readers never observe a partial blob.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use arcjet_core::Sha512Hash;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::error::{Result, StoreError};
use crate::traits::{Blob, StoreClient};

const TYPE_SUFFIX: &str = "type";

/// Content store over a data directory.
#[derive(Debug)]
pub struct FsStore {
    dir: PathBuf,
    tmp_counter: AtomicU64,
}

impl FsStore {
    /// Open a store, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "opened filesystem store");
        Ok(Self {
            dir,
            tmp_counter: AtomicU64::new(0),
        })
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, hash: &Sha512Hash) -> PathBuf {
        self.dir.join(hash.to_hex())
    }

    fn type_path(&self, hash: &Sha512Hash) -> PathBuf {
        self.dir.join(format!("{}.{TYPE_SUFFIX}", hash.to_hex()))
    }

    /// Write `data` to `path` through a temporary file in the same directory.
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!(".tmp-{}-{n}", std::process::id()));
        fs::write(&tmp, data).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for FsStore {
    async fn put(&self, content: Bytes, content_type: &str) -> Result<Sha512Hash> {
        let hash = Sha512Hash::hash(&content);
        let path = self.blob_path(&hash);

        if fs::try_exists(&path).await? {
            return Ok(hash);
        }

        // Sidecar first: a visible blob always has its type.
        self.write_atomic(&self.type_path(&hash), content_type.as_bytes())
            .await?;
        self.write_atomic(&path, &content).await?;
        tracing::debug!(hash = %&hash.to_hex()[..16], len = content.len(), "stored blob");
        Ok(hash)
    }

    async fn get_blob(&self, hash: &Sha512Hash) -> Result<Blob> {
        let content = match fs::read(self.blob_path(hash)).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(hash.to_hex()))
            }
            Err(e) => return Err(e.into()),
        };

        let content_type = match fs::read_to_string(self.type_path(hash)).await {
            Ok(t) => Some(t),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Blob {
            content,
            content_type,
        })
    }
}

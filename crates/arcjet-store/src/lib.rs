//! # Arcjet Store
//!
//! Clients for the two untrusted services records live in: a
//! content-addressable blob store and a metadata index.
//!
//! ## Implementations
//!
//! - [`MemoryStore`] / [`MemoryIndex`] - in memory, for tests and embedding
//! - [`FsStore`] - blobs under a data directory, keyed by SHA-512 hex
//! - [`HttpClient`] - a remote Arcjet server, implements both traits

pub mod entry;
pub mod error;
pub mod fs;
pub mod http;
pub mod memory;
pub mod traits;

pub use entry::{IndexEntry, Query};
pub use error::{NetworkError, Result, StoreError};
pub use fs::FsStore;
pub use http::{HttpClient, HttpClientConfig};
pub use memory::{MemoryIndex, MemoryStore};
pub use traits::{Blob, IndexClient, StoreClient};

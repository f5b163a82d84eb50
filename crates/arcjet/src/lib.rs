//! # Arcjet
//!
//! Signed, content-addressed records over an untrusted content store and
//! metadata index.
//!
//! ## Overview
//!
//! - **Record**: opaque content plus JSON metadata, bound by SHA-512 hashes
//!   and an ECDSA P-521 signature. Immutable once signed.
//! - **Store**: keeps content under its SHA-512 hash.
//! - **Index**: keeps a flattened metadata document per record and answers
//!   equality queries.
//!
//! Any holder of a record can detect tampering with its content, metadata,
//! signature or id without trusting either service.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arcjet::{Arcjet, ArcjetConfig, Metadata, Query};
//! use arcjet::core::MemoryKeyStore;
//! use arcjet::store::{MemoryIndex, MemoryStore};
//!
//! async fn example() {
//!     let keys = MemoryKeyStore::new();
//!     let arcjet = Arcjet::generate(
//!         &keys,
//!         MemoryStore::new(),
//!         MemoryIndex::new(),
//!         ArcjetConfig::default(),
//!     )
//!     .unwrap();
//!
//!     let record = arcjet
//!         .set(b"hello".to_vec(), "text/plain", Metadata::new().with("tag", "demo"))
//!         .await
//!         .unwrap();
//!
//!     let report = arcjet.find(&Query::new().with("tag", "demo")).await.unwrap();
//!     assert_eq!(report.verified[0].id, record.id);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `arcjet::core` - Records, hashing, signatures, key stores
//! - `arcjet::store` - Store and index clients

pub mod client;
pub mod error;

// Re-export component crates
pub use arcjet_core as core;
pub use arcjet_store as store;

// Re-export main types for convenience
pub use client::{Arcjet, ArcjetConfig, FindReport, Rejected, JSON_CONTENT_TYPE};
pub use error::{ArcjetError, RejectReason, Result};

// Re-export commonly used types
pub use arcjet_core::{
    IntegrityError, Metadata, PublicKey, Record, RecordBuilder, RecordId, Sha512Hash,
    SigningKeyPair,
};
pub use arcjet_store::{HttpClient, HttpClientConfig, IndexEntry, Query};

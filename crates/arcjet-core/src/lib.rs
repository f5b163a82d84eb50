//! # Arcjet Core
//!
//! Pure primitives for Arcjet: signed, content-addressed records.
//!
//! This crate contains no networking. Apart from [`DirKeyStore`] it performs
//! no I/O; it is computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Record`] - Content plus metadata, bound by hashes and a signature
//! - [`RecordBuilder`] - Unsigned record state, consumed by signing
//! - [`RecordId`] - SHA-512 over `signature || contentHash || metadataHash`
//! - [`Metadata`] - Caller attributes, a JSON object
//!
//! ## Canonicalization
//!
//! Metadata is hashed over a deterministic CBOR encoding. See [`canonical`].
//!
//! ## Example
//!
//! ```
//! use arcjet_core::{RecordBuilder, SigningKeyPair};
//!
//! let keypair = SigningKeyPair::generate();
//! let record = RecordBuilder::new(b"hello".to_vec(), "text/plain")
//!     .attr("tag", "demo")
//!     .sign(&keypair)
//!     .unwrap();
//!
//! assert!(record.verify(Some(&keypair.public_key())).is_ok());
//! ```

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod record;
pub mod types;
pub mod validation;
pub mod wire;

pub use canonical::{canonicalize, signed_message};
pub use crypto::{PublicKey, Sha512Hash, Signature, SigningKeyPair, SIGNATURE_LEN};
pub use error::{CryptoError, DecodeError, EncodingError, IntegrityError, RecordError};
pub use keystore::{DirKeyStore, KeyStore, MemoryKeyStore};
pub use record::{metadata_hash, Record, RecordBuilder};
pub use types::{Metadata, RecordId};
pub use validation::{verify_hashes, verify_record};
pub use wire::{decode_record, encode_record, RecordFrame};

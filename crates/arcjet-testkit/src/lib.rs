//! # Arcjet Testkit
//!
//! Testing utilities for Arcjet.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Metadata with known canonical encodings and hashes,
//!   plus a fixed signature over a known message
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A key pair with an in-memory store and index
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the canonical metadata encoding byte for byte:
//!
//! ```rust
//! use arcjet_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, hex) in verify_all_vectors() {
//!     assert!(ok, "{name}: {hex}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use arcjet_testkit::generators::{record_from_params, RecordParams};
//!
//! proptest! {
//!     #[test]
//!     fn signed_records_verify(params: RecordParams) {
//!         let record = record_from_params(&params);
//!         prop_assert!(record.verify(None).is_ok());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use arcjet_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let record = fixture.make_tagged(b"hello", "demo");
//! assert!(record.verify(Some(&fixture.public_key())).is_ok());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
pub use generators::{record_from_params, RecordParams};
pub use vectors::{
    all_vectors, signature_vector, verify_all_vectors, verify_signature_vector, GoldenVector,
    SignatureVector,
};

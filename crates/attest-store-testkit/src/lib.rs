//! # Attest Store Testkit
//!
//! Testing utilities for the attestation store.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Builders for collection envelopes in their JSON wire form
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! Describe subjects and attestation types, get envelope bytes:
//!
//! ```rust
//! use attest_store_testkit::CollectionFixture;
//!
//! let bytes = CollectionFixture::new("build")
//!     .subject("bin", &[("sha256", "deadbeef")])
//!     .attestation("https://witness.dev/attestations/git/v0.1")
//!     .signed_by("ci-key")
//!     .envelope_bytes();
//! assert!(!bytes.is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use attest_store_testkit::CollectionParams;
//!
//! proptest! {
//!     #[test]
//!     fn fixtures_decode(params: CollectionParams) {
//!         let bytes = params.fixture().envelope_bytes();
//!         prop_assert!(!bytes.is_empty());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{digest_set, numbered_fixtures, types, CollectionFixture};
pub use generators::CollectionParams;

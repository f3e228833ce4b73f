//! # Attest Store
//!
//! In-memory store of signed attestation collections, indexed for lookup by
//! subject digest and attestation type.
//!
//! ## Overview
//!
//! Envelopes are loaded under a caller-chosen [`Reference`]. Each load
//! decodes three layers (DSSE envelope, in-toto statement, attestation
//! collection) and then updates three indexes as one atomic step:
//!
//! - [`ReferenceIndex`] - reference to decoded record, in load order
//! - [`DigestIndex`] - subject digests each reference attests to
//! - [`TypeIndex`] - attestation types each reference contains
//!
//! Searches ask for collections that cover an artifact (any overlapping
//! digest, under any algorithm) and contain every required attestation type.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use attest_store::{DigestSet, MemorySource};
//!
//! let store = MemorySource::new();
//! store.load_file("attestations/build.json").unwrap();
//!
//! let target: DigestSet = [("sha256", "6dcd4ce2...")].into_iter().collect();
//! let result = store.search("build", &target, &["https://witness.dev/attestations/git/v0.1"]).unwrap();
//!
//! for record in &result.matches {
//!     println!("{} covers the artifact", record.reference);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic overwrite**: re-loading a reference replaces all of its index entries
//! - **All-or-nothing loads**: a failed load leaves the prior record untouched
//! - **Stable order**: matches come back in the order references were first loaded
//! - **Presence-only types**: duplicate attestation types count once

pub mod config;
pub mod digest_index;
pub mod error;
pub mod memory;
pub mod multi;
pub mod reference_index;
pub mod search;
pub mod traits;
pub mod type_index;

pub use config::SourceConfig;
pub use digest_index::DigestIndex;
pub use error::{Result, StoreError};
pub use memory::MemorySource;
pub use multi::MultiSource;
pub use reference_index::ReferenceIndex;
pub use search::{validate_query, SearchResult};
pub use traits::{BoxError, EnvelopeVerifier, FileReader, FsReader, Source};
pub use type_index::TypeIndex;

// Re-export the core model so callers need a single dependency
pub use attest_store_core as core;
pub use attest_store_core::{
    Collection, CollectionAttestation, CollectionEnvelope, Digest, DigestAlgorithm, DigestSet,
    Envelope, Reference, Statement, Subject,
};

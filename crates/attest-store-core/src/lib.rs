//! # Attest Store Core
//!
//! Pure model for the attestation store: DSSE envelopes, in-toto statements,
//! attestation collections and digest sets.
//!
//! This crate contains no I/O and no indexing. It decodes bytes into typed
//! records and answers digest-overlap questions about them.
//!
//! ## Key Types
//!
//! - [`Envelope`] - Signed container around a statement payload
//! - [`Statement`] - Subjects plus a predicate type and raw predicate
//! - [`Collection`] - Named list of typed attestations (the predicate)
//! - [`CollectionEnvelope`] - The three decoded layers under one [`Reference`]
//! - [`DigestSet`] - Algorithm-to-value mapping with any-overlap matching
//!
//! ## Decoding
//!
//! ```rust
//! use attest_store_core::{decode_statement, CodecError};
//!
//! let err = decode_statement(br#"{"_type":"t","subject":[]}"#).unwrap_err();
//! assert!(matches!(err, CodecError::Decode(_)));
//! ```

pub mod collection;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod record;
pub mod statement;
pub mod types;

pub use collection::{decode_predicate, Collection, CollectionAttestation, COLLECTION_PREDICATE_TYPE};
pub use digest::{Digest, DigestAlgorithm, DigestSet};
pub use envelope::{pae, Envelope, Signature, SignatureTimestamp, IN_TOTO_PAYLOAD_TYPE};
pub use error::{CodecError, Result};
pub use record::{CollectionEnvelope, DecodeConfig};
pub use statement::{decode_statement, Statement, Subject, STATEMENT_TYPE_V01, STATEMENT_TYPE_V1};
pub use types::Reference;

//! Seams to the store's collaborators and consumers.
//!
//! - [`Source`]: anything that can answer collection searches.
//! - [`EnvelopeVerifier`]: signature checking, run before an envelope is indexed.
//! - [`FileReader`]: the only I/O the store performs.

use std::path::Path;
use std::sync::Arc;

use attest_store_core::{CollectionEnvelope, DigestSet, Envelope, Reference};

use crate::error::Result;
use crate::search::SearchResult;

/// Boxed error returned by collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A searchable source of collection envelopes.
pub trait Source: Send + Sync {
    /// Find collections that cover `target` and contain every required type.
    ///
    /// An empty `collection_name` matches any collection.
    fn search(
        &self,
        collection_name: &str,
        target: &DigestSet,
        required_types: &[String],
    ) -> Result<SearchResult>;

    /// Get the record loaded under `reference`.
    fn get(&self, reference: &str) -> Option<Arc<CollectionEnvelope>>;
}

/// Verifies an envelope's signatures before it is indexed.
///
/// A returned error prevents indexing and surfaces as
/// [`StoreError::VerificationFailed`](crate::StoreError::VerificationFailed).
pub trait EnvelopeVerifier: Send + Sync {
    fn verify(&self, reference: &Reference, envelope: &Envelope) -> std::result::Result<(), BoxError>;
}

impl<F> EnvelopeVerifier for F
where
    F: Fn(&Reference, &Envelope) -> std::result::Result<(), BoxError> + Send + Sync,
{
    fn verify(&self, reference: &Reference, envelope: &Envelope) -> std::result::Result<(), BoxError> {
        self(reference, envelope)
    }
}

/// Reads envelope bytes from a path.
pub trait FileReader: Send + Sync {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// [`FileReader`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

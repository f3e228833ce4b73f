//! Error types for the store.

use std::path::PathBuf;

use attest_store_core::CodecError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing file or reference.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reading an envelope failed for a reason other than absence.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Envelope, statement or collection could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A search constrained on neither digests nor attestation types.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The signature verifier rejected the envelope.
    #[error("verification failed for {reference}: {reason}")]
    VerificationFailed { reference: String, reason: String },

    /// Cancellation was requested before the next load started.
    #[error("operation cancelled")]
    Cancelled,
}

impl StoreError {
    /// Map an I/O error for `path`, splitting out absence as [`StoreError::NotFound`].
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.display().to_string())
        } else {
            StoreError::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Malformed envelope, statement or collection bytes.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            StoreError::Codec(CodecError::Decode(_))
                | StoreError::Codec(CodecError::UnexpectedPayloadType { .. })
        )
    }

    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, StoreError::Codec(CodecError::SchemaMismatch { .. }))
    }

    pub fn is_invalid_query(&self) -> bool {
        matches!(self, StoreError::InvalidQuery(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

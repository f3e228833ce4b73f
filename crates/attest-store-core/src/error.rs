//! Error types for the attestation store core.

use thiserror::Error;

/// Errors raised while decoding envelopes, statements and collections.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Bytes are not well-formed, or a required field is absent or empty.
    #[error("decode error: {0}")]
    Decode(String),

    /// The statement's predicate type is not the expected collection schema.
    #[error("predicate type mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    /// The envelope does not carry a statement payload.
    #[error("unexpected payload type: expected {expected}, got {actual}")]
    UnexpectedPayloadType { expected: String, actual: String },
}

impl CodecError {
    /// Shorthand for a [`CodecError::Decode`] with a message.
    pub fn decode(msg: impl Into<String>) -> Self {
        CodecError::Decode(msg.into())
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Decode(e.to_string())
    }
}

impl From<base64::DecodeError> for CodecError {
    fn from(e: base64::DecodeError) -> Self {
        CodecError::Decode(format!("invalid base64: {e}"))
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

//! Store configuration.

use attest_store_core::DecodeConfig;
use serde::Deserialize;

/// Configuration for a [`MemorySource`](crate::MemorySource).
///
/// Deserializable so callers can embed it in their own config files; every
/// field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Payload, predicate and statement types accepted at load time.
    #[serde(flatten)]
    pub decode: DecodeConfig,
    /// Reject envelopes larger than this many bytes before decoding.
    pub max_envelope_bytes: Option<usize>,
}

impl SourceConfig {
    /// Override the expected collection predicate type.
    pub fn with_collection_predicate_type(mut self, predicate_type: impl Into<String>) -> Self {
        self.decode.collection_predicate_type = predicate_type.into();
        self
    }

    /// Cap the size of envelopes accepted by the loaders.
    pub fn with_max_envelope_bytes(mut self, max: usize) -> Self {
        self.max_envelope_bytes = Some(max);
        self
    }
}

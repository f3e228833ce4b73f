//! The stored record: envelope, statement and collection decoded together.

use serde::Deserialize;

use crate::collection::{decode_predicate, Collection, COLLECTION_PREDICATE_TYPE};
use crate::digest::{Digest, DigestSet};
use crate::envelope::{Envelope, IN_TOTO_PAYLOAD_TYPE};
use crate::error::{CodecError, Result};
use crate::statement::{decode_statement, Statement};
use crate::types::Reference;

/// What a decodable collection envelope must look like.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Envelope payload type that denotes a statement.
    pub statement_payload_type: String,
    /// Predicate type a collection statement must declare.
    pub collection_predicate_type: String,
    /// Accepted statement `_type` URIs. Empty accepts any non-empty type.
    pub statement_types: Vec<String>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            statement_payload_type: IN_TOTO_PAYLOAD_TYPE.to_string(),
            collection_predicate_type: COLLECTION_PREDICATE_TYPE.to_string(),
            statement_types: Vec::new(),
        }
    }
}

/// A fully decoded collection envelope, keyed by its reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEnvelope {
    pub reference: Reference,
    pub envelope: Envelope,
    pub statement: Statement,
    pub collection: Collection,
}

impl CollectionEnvelope {
    /// Decode the statement and collection carried by `envelope`.
    ///
    /// Pure: nothing is indexed. Errors surface from whichever layer failed.
    pub fn decode(reference: Reference, envelope: Envelope, config: &DecodeConfig) -> Result<Self> {
        if !envelope.has_payload_type(&config.statement_payload_type) {
            return Err(CodecError::UnexpectedPayloadType {
                expected: config.statement_payload_type.clone(),
                actual: envelope.payload_type.clone(),
            });
        }

        let statement = decode_statement(&envelope.payload)?;
        if !config.statement_types.is_empty()
            && !config.statement_types.contains(&statement.statement_type)
        {
            return Err(CodecError::decode(format!(
                "unsupported statement type {}",
                statement.statement_type
            )));
        }

        let collection = decode_predicate(&statement, &config.collection_predicate_type)?;

        Ok(Self {
            reference,
            envelope,
            statement,
            collection,
        })
    }

    /// Decode from the envelope's JSON bytes.
    pub fn from_json_slice(
        reference: Reference,
        bytes: &[u8],
        config: &DecodeConfig,
    ) -> Result<Self> {
        let envelope = Envelope::from_json_slice(bytes)?;
        Self::decode(reference, envelope, config)
    }

    /// All `(algorithm, value)` pairs of subjects whose digest overlaps `target`.
    pub fn matched_subject_digests<'a>(
        &'a self,
        target: &'a DigestSet,
    ) -> impl Iterator<Item = Digest> + 'a {
        self.statement
            .subjects
            .iter()
            .filter(move |s| s.digest.matches(target))
            .flat_map(|s| s.digest.digests())
    }
}

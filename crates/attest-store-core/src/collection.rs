//! Attestation collections: the predicate of a collection statement.
//!
//! A collection is a named, ordered list of attestations recorded during one
//! step. Each attestation carries a type URI and an opaque payload; the store
//! only reads the type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CodecError, Result};
use crate::statement::Statement;

/// Predicate type of an attestation collection.
pub const COLLECTION_PREDICATE_TYPE: &str =
    "https://witness.testifysec.com/attestation-collection/v0.1";

/// A named collection of attestations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub attestations: Vec<CollectionAttestation>,
}

/// One attestation inside a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionAttestation {
    /// Attestation type URI, used for indexing.
    #[serde(rename = "type")]
    pub attestation_type: String,
    /// Kind-specific payload, carried through untouched.
    #[serde(default)]
    pub attestation: Value,
    #[serde(default, rename = "starttime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "endtime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Collection {
    /// Attestation types in collection order. Duplicates are kept.
    pub fn attestation_types(&self) -> impl Iterator<Item = &str> {
        self.attestations
            .iter()
            .map(|a| a.attestation_type.as_str())
    }

    /// Whether at least one attestation has the given type.
    pub fn has_type(&self, attestation_type: &str) -> bool {
        self.attestation_types().any(|t| t == attestation_type)
    }
}

impl CollectionAttestation {
    /// Whether `at` falls inside the attestation's validity window.
    ///
    /// A missing bound is treated as open.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.start_time.map_or(true, |start| start <= at)
            && self.end_time.map_or(true, |end| at <= end)
    }
}

/// Decode a statement's predicate as an attestation collection.
///
/// Fails with [`CodecError::SchemaMismatch`] if the statement's predicate type
/// is not `expected_schema`, and with [`CodecError::Decode`] if the predicate is
/// empty or does not parse as a collection.
pub fn decode_predicate(statement: &Statement, expected_schema: &str) -> Result<Collection> {
    if statement.predicate_type != expected_schema {
        return Err(CodecError::SchemaMismatch {
            expected: expected_schema.to_string(),
            actual: statement.predicate_type.clone(),
        });
    }
    if statement.predicate.is_empty() {
        return Err(CodecError::decode("collection predicate is empty"));
    }

    serde_json::from_slice(&statement.predicate)
        .map_err(|e| CodecError::decode(format!("predicate is not a collection: {e}")))
}

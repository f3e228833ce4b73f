//! in-toto statement: subjects plus a typed predicate.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::digest::DigestSet;
use crate::error::{CodecError, Result};

/// in-toto statement type, version 0.1.
pub const STATEMENT_TYPE_V01: &str = "https://in-toto.io/Statement/v0.1";

/// in-toto statement type, version 1.
pub const STATEMENT_TYPE_V1: &str = "https://in-toto.io/Statement/v1";

/// A decoded, well-formed statement.
///
/// `statement_type`, `predicate_type` and `subjects` are guaranteed
/// non-empty. The predicate is kept as raw JSON bytes; its schema is only
/// known once `predicate_type` is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub statement_type: String,
    pub subjects: Vec<Subject>,
    pub predicate_type: String,
    /// Raw predicate JSON. Empty when the statement carried no predicate.
    pub predicate: Vec<u8>,
}

/// An artifact the statement is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub name: String,
    pub digest: DigestSet,
}

impl Statement {
    /// Whether any subject's digest set overlaps `target`.
    pub fn attests_to(&self, target: &DigestSet) -> bool {
        self.subjects.iter().any(|s| s.digest.matches(target))
    }

    /// Encode to the JSON wire form.
    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        let predicate = if self.predicate.is_empty() {
            None
        } else {
            Some(serde_json::from_slice::<Value>(&self.predicate)?)
        };
        let wire = WireStatementOut {
            statement_type: &self.statement_type,
            subject: &self.subjects,
            predicate_type: &self.predicate_type,
            predicate,
        };
        Ok(serde_json::to_vec(&wire)?)
    }
}

/// Decode a statement from an envelope payload.
///
/// Fails with [`CodecError::Decode`] if the payload is not JSON, or if
/// `_type`, `predicateType` or `subject` are absent or empty, or if a subject
/// digest has an empty algorithm or value.
pub fn decode_statement(payload: &[u8]) -> Result<Statement> {
    let wire: WireStatementIn = serde_json::from_slice(payload)?;

    if wire.statement_type.trim().is_empty() {
        return Err(CodecError::decode("statement _type is missing or empty"));
    }
    if wire.predicate_type.trim().is_empty() {
        return Err(CodecError::decode("statement predicateType is missing or empty"));
    }
    if wire.subject.is_empty() {
        return Err(CodecError::decode("statement has no subjects"));
    }
    if let Some(subject) = wire.subject.iter().find(|s| s.digest.has_blank_entry()) {
        return Err(CodecError::decode(format!(
            "subject {:?} has a digest with an empty algorithm or value",
            subject.name
        )));
    }

    let predicate = match wire.predicate {
        Some(raw) if raw.get() != "null" => raw.get().as_bytes().to_vec(),
        _ => Vec::new(),
    };

    Ok(Statement {
        statement_type: wire.statement_type,
        subjects: wire.subject,
        predicate_type: wire.predicate_type,
        predicate,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStatementIn {
    #[serde(rename = "_type", alias = "type", default)]
    statement_type: String,
    #[serde(default)]
    subject: Vec<Subject>,
    #[serde(default)]
    predicate_type: String,
    #[serde(default)]
    predicate: Option<Box<RawValue>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireStatementOut<'a> {
    #[serde(rename = "_type")]
    statement_type: &'a str,
    subject: &'a [Subject],
    predicate_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    predicate: Option<Value>,
}

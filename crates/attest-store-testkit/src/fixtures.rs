//! Test fixtures and helpers.
//!
//! Builders for collection envelopes, so tests describe subjects and
//! attestation types instead of hand-writing nested JSON.

use std::io;
use std::path::Path;

use attest_store_core::{
    DigestAlgorithm, DigestSet, Envelope, Signature, COLLECTION_PREDICATE_TYPE,
    IN_TOTO_PAYLOAD_TYPE, STATEMENT_TYPE_V01,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

/// Builder for a collection statement wrapped in a DSSE envelope.
#[derive(Debug, Clone)]
pub struct CollectionFixture {
    name: String,
    subjects: Vec<(String, DigestSet)>,
    attestations: Vec<Value>,
    statement_type: String,
    predicate_type: String,
    payload_type: String,
    predicate: Option<Value>,
    signatures: Vec<Signature>,
}

impl CollectionFixture {
    /// Start a fixture for a collection called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subjects: Vec::new(),
            attestations: Vec::new(),
            statement_type: STATEMENT_TYPE_V01.to_string(),
            predicate_type: COLLECTION_PREDICATE_TYPE.to_string(),
            payload_type: IN_TOTO_PAYLOAD_TYPE.to_string(),
            predicate: None,
            signatures: Vec::new(),
        }
    }

    /// Add a subject with explicit digests.
    pub fn subject(mut self, name: &str, digests: &[(&str, &str)]) -> Self {
        self.subjects.push((name.to_string(), digest_set(digests)));
        self
    }

    /// Add a subject whose sha256 and blake3 digests are computed from `content`.
    pub fn artifact(mut self, name: &str, content: &[u8]) -> Self {
        let digests = DigestSet::calculate(content, &[DigestAlgorithm::Sha256, DigestAlgorithm::Blake3]);
        self.subjects.push((name.to_string(), digests));
        self
    }

    /// Add an attestation of `attestation_type` with an empty payload.
    pub fn attestation(self, attestation_type: &str) -> Self {
        self.attestation_with(attestation_type, json!({}))
    }

    /// Add an attestation with a specific payload.
    pub fn attestation_with(mut self, attestation_type: &str, payload: Value) -> Self {
        self.attestations
            .push(json!({"type": attestation_type, "attestation": payload}));
        self
    }

    /// Add an attestation with a validity window.
    pub fn attestation_between(
        mut self,
        attestation_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        self.attestations.push(json!({
            "type": attestation_type,
            "attestation": {},
            "starttime": start.to_rfc3339(),
            "endtime": end.to_rfc3339(),
        }));
        self
    }

    pub fn statement_type(mut self, statement_type: &str) -> Self {
        self.statement_type = statement_type.to_string();
        self
    }

    pub fn predicate_type(mut self, predicate_type: &str) -> Self {
        self.predicate_type = predicate_type.to_string();
        self
    }

    pub fn payload_type(mut self, payload_type: &str) -> Self {
        self.payload_type = payload_type.to_string();
        self
    }

    /// Replace the generated collection predicate with an arbitrary value.
    pub fn raw_predicate(mut self, predicate: Value) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Attach a placeholder signature under `keyid`.
    pub fn signed_by(mut self, keyid: &str) -> Self {
        self.signatures.push(Signature {
            keyid: keyid.to_string(),
            sig: format!("sig:{keyid}").into_bytes(),
            certificate: None,
            intermediates: Vec::new(),
            timestamps: Vec::new(),
        });
        self
    }

    /// The statement as a JSON value.
    pub fn statement_value(&self) -> Value {
        let subject: Vec<Value> = self
            .subjects
            .iter()
            .map(|(name, digests)| {
                let digest: Map<String, Value> = digests
                    .iter()
                    .map(|(alg, value)| (alg.to_string(), Value::from(value)))
                    .collect();
                json!({"name": name, "digest": digest})
            })
            .collect();

        let predicate = self.predicate.clone().unwrap_or_else(|| {
            json!({"name": self.name, "attestations": self.attestations})
        });

        json!({
            "_type": self.statement_type,
            "subject": subject,
            "predicateType": self.predicate_type,
            "predicate": predicate,
        })
    }

    pub fn envelope(&self) -> Envelope {
        Envelope {
            payload: self.statement_value().to_string().into_bytes(),
            payload_type: self.payload_type.clone(),
            signatures: self.signatures.clone(),
        }
    }

    /// The envelope in its JSON wire form.
    pub fn envelope_bytes(&self) -> Vec<u8> {
        self.envelope()
            .to_json_vec()
            .expect("fixture envelope serializes")
    }

    /// Write the envelope JSON to `path`.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.envelope_bytes())
    }
}

/// Build a digest set from `(algorithm, value)` pairs.
pub fn digest_set(pairs: &[(&str, &str)]) -> DigestSet {
    pairs.iter().copied().collect()
}

/// Owned attestation type list, as taken by `Source::search`.
pub fn types(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// `count` fixtures for distinct artifacts, all in collection `name`.
///
/// Fixture `i` has subject digest `sha256 = {i:064x}` and one attestation
/// of type `type-{i}`.
pub fn numbered_fixtures(name: &str, count: usize) -> Vec<CollectionFixture> {
    (0..count)
        .map(|i| {
            let digest = format!("{i:064x}");
            CollectionFixture::new(name)
                .subject(&format!("artifact-{i}"), &[("sha256", &digest)])
                .attestation(&format!("type-{i}"))
        })
        .collect()
}

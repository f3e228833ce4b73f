//! DSSE envelope: the signed container around a statement payload.
//!
//! The store never interprets signatures. It decodes them so they can be
//! carried through to callers (and to an optional verifier) unchanged.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CodecError, Result};

/// Media type of an in-toto statement payload.
pub const IN_TOTO_PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";

/// Timestamp kind for RFC 3161 timestamp authority proofs.
pub const TIMESTAMP_RFC3161: &str = "tsp";

/// A decoded DSSE envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Raw payload bytes (already base64-decoded).
    pub payload: Vec<u8>,
    /// Media type of the payload.
    pub payload_type: String,
    pub signatures: Vec<Signature>,
}

/// One signature over an envelope payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub keyid: String,
    pub sig: Vec<u8>,
    /// DER or PEM certificate of the signer, if keyless.
    pub certificate: Option<Vec<u8>>,
    /// Intermediate certificates, leaf-most first.
    pub intermediates: Vec<Vec<u8>>,
    pub timestamps: Vec<SignatureTimestamp>,
}

/// A timestamp proof attached to a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTimestamp {
    pub kind: String,
    pub data: Vec<u8>,
}

impl Envelope {
    /// Decode an envelope from its JSON wire form.
    ///
    /// `payload` may be base64 (standard or URL-safe, padded or not) or an
    /// inline JSON object, which is taken verbatim as the payload bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let wire: wire::Envelope = serde_json::from_slice(bytes)?;
        Self::try_from(wire)
    }

    /// Encode the envelope to its JSON wire form (standard base64).
    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        let wire = wire::Envelope::from(self);
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Whether the payload is declared as the given media type.
    pub fn has_payload_type(&self, payload_type: &str) -> bool {
        self.payload_type == payload_type
    }

    /// DSSE pre-authentication encoding of this envelope's payload.
    ///
    /// This is the byte string signatures are computed over.
    pub fn pae(&self) -> Vec<u8> {
        pae(&self.payload_type, &self.payload)
    }
}

/// Compute `PAE(type, body)` as defined by DSSE v1.
///
/// ```text
/// "DSSEv1" SP LEN(type) SP type SP LEN(body) SP body
/// ```
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let header = format!(
        "DSSEv1 {} {} {} ",
        payload_type.len(),
        payload_type,
        payload.len()
    );
    let mut out = Vec::with_capacity(header.len() + payload.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// Decode base64 in any of the encodings DSSE producers are seen to emit.
pub fn decode_base64(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    STANDARD
        .decode(s)
        .or_else(|_| URL_SAFE.decode(s))
        .or_else(|_| STANDARD_NO_PAD.decode(s))
        .or_else(|_| URL_SAFE_NO_PAD.decode(s))
        .map_err(CodecError::from)
}

mod wire {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Envelope {
        pub payload: Value,
        pub payload_type: String,
        #[serde(default)]
        pub signatures: Vec<Signature>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Signature {
        #[serde(default)]
        pub keyid: String,
        pub sig: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub certificate: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub intermediates: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub timestamps: Vec<Timestamp>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Timestamp {
        #[serde(rename = "type")]
        pub kind: String,
        pub data: String,
    }
}

impl TryFrom<wire::Envelope> for Envelope {
    type Error = CodecError;

    fn try_from(envelope: wire::Envelope) -> Result<Self> {
        let wire::Envelope {
            payload,
            payload_type,
            signatures,
        } = envelope;

        let payload = match payload {
            Value::String(s) => decode_base64(&s)?,
            Value::Object(_) => serde_json::to_vec(&payload)?,
            other => {
                return Err(CodecError::decode(format!(
                    "envelope payload must be a base64 string or an object, got {other}"
                )))
            }
        };

        let signatures = signatures
            .into_iter()
            .map(Signature::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            payload,
            payload_type,
            signatures,
        })
    }
}

impl TryFrom<wire::Signature> for Signature {
    type Error = CodecError;

    fn try_from(signature: wire::Signature) -> Result<Self> {
        let wire::Signature {
            keyid,
            sig,
            certificate,
            intermediates,
            timestamps,
        } = signature;

        Ok(Self {
            keyid,
            sig: decode_base64(&sig)?,
            certificate: certificate.as_deref().map(decode_base64).transpose()?,
            intermediates: intermediates
                .iter()
                .map(|i| decode_base64(i))
                .collect::<Result<Vec<_>>>()?,
            timestamps: timestamps
                .into_iter()
                .map(|t| {
                    Ok(SignatureTimestamp {
                        kind: t.kind,
                        data: decode_base64(&t.data)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl From<&Envelope> for wire::Envelope {
    fn from(envelope: &Envelope) -> Self {
        Self {
            payload: Value::String(STANDARD.encode(&envelope.payload)),
            payload_type: envelope.payload_type.clone(),
            signatures: envelope.signatures.iter().map(Into::into).collect(),
        }
    }
}

impl From<&Signature> for wire::Signature {
    fn from(signature: &Signature) -> Self {
        Self {
            keyid: signature.keyid.clone(),
            sig: STANDARD.encode(&signature.sig),
            certificate: signature.certificate.as_ref().map(|c| STANDARD.encode(c)),
            intermediates: signature
                .intermediates
                .iter()
                .map(|i| STANDARD.encode(i))
                .collect(),
            timestamps: signature
                .timestamps
                .iter()
                .map(|t| wire::Timestamp {
                    kind: t.kind.clone(),
                    data: STANDARD.encode(&t.data),
                })
                .collect(),
        }
    }
}

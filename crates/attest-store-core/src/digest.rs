//! Digest sets: the per-artifact mapping from hash algorithm to hex value.
//!
//! Two digest sets match when they share at least one `(algorithm, value)`
//! pair. Producers and consumers often hash the same artifact with different
//! algorithms, so agreement on every algorithm is never required.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha512};
use std::collections::BTreeMap;
use std::fmt;

/// Hash algorithms the store can compute itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
    Blake3,
}

impl DigestAlgorithm {
    /// The algorithm name as it appears in in-toto digest sets.
    pub const fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
            DigestAlgorithm::Blake3 => "blake3",
        }
    }

    /// Hash `data`, returning lowercase hex.
    pub fn hash_hex(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            DigestAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
            DigestAlgorithm::Blake3 => blake3::hash(data).to_hex().to_string(),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single `(algorithm, value)` pair, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest {
    pub algorithm: String,
    pub value: String,
}

impl Digest {
    /// Create a normalized digest pair.
    pub fn new(algorithm: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        Self {
            algorithm: normalize(algorithm.as_ref()),
            value: normalize(value.as_ref()),
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

/// Mapping from hash algorithm name to digest value.
///
/// Keys and values are trimmed and lowercased on insertion, including when
/// deserialized, so `{"SHA256": "ABC"}` and `{"sha256": "abc"}` are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct DigestSet(BTreeMap<String, String>);

impl DigestSet {
    /// Create an empty digest set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Compute a digest set over `data` with each of `algorithms`.
    pub fn calculate(data: &[u8], algorithms: &[DigestAlgorithm]) -> Self {
        algorithms
            .iter()
            .map(|alg| (alg.name(), alg.hash_hex(data)))
            .collect()
    }

    /// Insert a digest, replacing any previous value for the algorithm.
    pub fn insert(&mut self, algorithm: impl AsRef<str>, value: impl AsRef<str>) -> Option<String> {
        self.0
            .insert(normalize(algorithm.as_ref()), normalize(value.as_ref()))
    }

    /// Look up the value recorded for an algorithm.
    pub fn get(&self, algorithm: &str) -> Option<&str> {
        self.0.get(&normalize(algorithm)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether some entry has an empty algorithm or value after normalization.
    pub fn has_blank_entry(&self) -> bool {
        self.0.iter().any(|(alg, value)| alg.is_empty() || value.is_empty())
    }

    /// Iterate `(algorithm, value)` in algorithm order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, v)| (a.as_str(), v.as_str()))
    }

    /// Iterate the set as owned [`Digest`] pairs.
    pub fn digests(&self) -> impl Iterator<Item = Digest> + '_ {
        self.0.iter().map(|(a, v)| Digest {
            algorithm: a.clone(),
            value: v.clone(),
        })
    }

    /// Whether this set holds exactly the pair `digest`.
    pub fn contains(&self, digest: &Digest) -> bool {
        self.0.get(&digest.algorithm) == Some(&digest.value)
    }

    /// Any-overlap match: true if some `(algorithm, value)` is in both sets.
    ///
    /// Algorithms present in only one set, or present in both with different
    /// values, do not prevent a match.
    pub fn matches(&self, other: &DigestSet) -> bool {
        self.0
            .iter()
            .any(|(alg, value)| other.0.get(alg) == Some(value))
    }

    /// The pairs present in both sets.
    pub fn overlap(&self, other: &DigestSet) -> Vec<Digest> {
        self.0
            .iter()
            .filter(|(alg, value)| other.0.get(*alg) == Some(*value))
            .map(|(alg, value)| Digest {
                algorithm: alg.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for DigestSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = DigestSet::new();
        for (alg, value) in iter {
            set.insert(alg, value);
        }
        set
    }
}

impl From<BTreeMap<String, String>> for DigestSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<DigestSet> for BTreeMap<String, String> {
    fn from(set: DigestSet) -> Self {
        set.0
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

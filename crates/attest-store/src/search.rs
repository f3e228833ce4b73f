//! Collection search over the reference, digest and type indexes.
//!
//! Candidates come from the cheapest index that constrains the query: the
//! digest index when a target digest set is given, the type index otherwise.
//! They are narrowed by collection name and required types, then
//! materialized from the reference index in load order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use attest_store_core::{CollectionEnvelope, Digest, DigestSet, Reference};

use crate::digest_index::DigestIndex;
use crate::error::{Result, StoreError};
use crate::reference_index::ReferenceIndex;
use crate::type_index::TypeIndex;

/// Outcome of a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Matching records, in load order.
    pub matches: Vec<Arc<CollectionEnvelope>>,
    /// Every `(algorithm, value)` pair of the matched subjects of the matches.
    ///
    /// A subject is matched when its digest set overlaps the target. Empty
    /// when the query had no digest constraint.
    pub matched_digests: BTreeSet<Digest>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// References of the matches, in load order.
    pub fn references(&self) -> Vec<&Reference> {
        self.matches.iter().map(|m| &m.reference).collect()
    }

    /// Matched digests grouped per algorithm.
    pub fn matched_digest_sets(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for digest in &self.matched_digests {
            grouped
                .entry(digest.algorithm.clone())
                .or_default()
                .insert(digest.value.clone());
        }
        grouped
    }

    /// Append another result for the same `target`, skipping matches whose
    /// reference is already present.
    ///
    /// Matched digests are recomputed from the appended records only, so a
    /// skipped duplicate contributes nothing.
    pub fn merge(&mut self, other: SearchResult, target: &DigestSet) {
        for m in other.matches {
            if self.matches.iter().any(|e| e.reference == m.reference) {
                continue;
            }
            if !target.is_empty() {
                self.matched_digests
                    .extend(m.matched_subject_digests(target));
            }
            self.matches.push(m);
        }
    }
}

/// Reject queries that constrain neither digests nor attestation types, and
/// targets holding a digest with an empty algorithm or value.
pub fn validate_query<S: AsRef<str>>(target: &DigestSet, required_types: &[S]) -> Result<()> {
    if target.has_blank_entry() {
        return Err(StoreError::InvalidQuery(
            "target digest has an empty algorithm or value".into(),
        ));
    }
    if target.is_empty() && required_types.is_empty() {
        return Err(StoreError::InvalidQuery(
            "a search needs a target digest or at least one required attestation type".into(),
        ));
    }
    Ok(())
}

/// Run a search against a consistent snapshot of the three indexes.
pub(crate) fn execute<S: AsRef<str>>(
    references: &ReferenceIndex,
    digests: &DigestIndex,
    types: &TypeIndex,
    collection_name: &str,
    target: &DigestSet,
    required_types: &[S],
) -> Result<SearchResult> {
    validate_query(target, required_types)?;

    let candidates: BTreeSet<Reference> = if target.is_empty() {
        types.references_with_all(required_types)
    } else {
        digests.lookup(target)
    };

    let mut seqs: BTreeSet<u64> = candidates
        .iter()
        .filter_map(|r| references.seq_of(r.as_str()))
        .collect();
    if !collection_name.is_empty() {
        let named = references.seqs_named(collection_name);
        seqs.retain(|seq| named.contains(seq));
    }

    let mut result = SearchResult::default();
    for seq in seqs {
        let Some(record) = references.by_seq(seq) else {
            continue;
        };
        if !collection_name.is_empty() && record.collection.name != collection_name {
            continue;
        }
        if !types.has_all(record.reference.as_str(), required_types) {
            continue;
        }

        if !target.is_empty() {
            result
                .matched_digests
                .extend(record.matched_subject_digests(target));
        }
        result.matches.push(Arc::clone(record));
    }

    tracing::debug!(
        collection = collection_name,
        candidates = candidates.len(),
        matches = result.matches.len(),
        "search complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query() {
        let empty = DigestSet::new();
        let target: DigestSet = [("sha256", "deadbeef")].into_iter().collect();

        assert!(validate_query::<&str>(&empty, &[]).unwrap_err().is_invalid_query());
        assert!(validate_query::<&str>(&target, &[]).is_ok());
        assert!(validate_query(&empty, &["dummy-prods"]).is_ok());
    }

    #[test]
    fn test_blank_target_digest_rejected() {
        let blank: DigestSet = [("sha256", "   ")].into_iter().collect();
        assert!(validate_query::<&str>(&blank, &[]).unwrap_err().is_invalid_query());
        assert!(validate_query(&blank, &["dummy-prods"])
            .unwrap_err()
            .is_invalid_query());

        let mixed: DigestSet = [("sha256", "deadbeef"), ("", "abcd")].into_iter().collect();
        assert!(validate_query::<&str>(&mixed, &[]).unwrap_err().is_invalid_query());
    }

    #[test]
    fn test_matched_digest_sets_groups_per_algorithm() {
        let result = SearchResult {
            matches: vec![],
            matched_digests: [
                Digest::new("sha256", "aa"),
                Digest::new("sha256", "bb"),
                Digest::new("sha1", "cc"),
            ]
            .into_iter()
            .collect(),
        };
        let grouped = result.matched_digest_sets();
        assert_eq!(grouped["sha256"].len(), 2);
        assert_eq!(grouped["sha1"].len(), 1);
    }
}

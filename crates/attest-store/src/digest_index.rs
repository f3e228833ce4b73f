//! Digest index: which references attest to which subject digests.
//!
//! Kept in two directions. The forward map (reference to digest to subject
//! names) lets an overwrite remove exactly what the previous load added; the
//! reverse map (digest to references) answers lookups without scanning.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use attest_store_core::{Digest, DigestSet, Reference, Statement};

#[derive(Debug, Default)]
pub struct DigestIndex {
    by_reference: HashMap<Reference, BTreeMap<Digest, BTreeSet<String>>>,
    by_digest: HashMap<Digest, BTreeSet<Reference>>,
}

impl DigestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every subject digest of `statement` under `reference`.
    ///
    /// Any entries previously indexed for `reference` are dropped first.
    pub fn insert(&mut self, reference: &Reference, statement: &Statement) {
        self.remove(reference.as_str());

        let mut entries: BTreeMap<Digest, BTreeSet<String>> = BTreeMap::new();
        for subject in &statement.subjects {
            for digest in subject.digest.digests() {
                entries
                    .entry(digest)
                    .or_default()
                    .insert(subject.name.clone());
            }
        }

        for digest in entries.keys() {
            self.by_digest
                .entry(digest.clone())
                .or_default()
                .insert(reference.clone());
        }
        self.by_reference.insert(reference.clone(), entries);
    }

    /// Remove everything indexed for `reference`. Returns whether it was present.
    pub fn remove(&mut self, reference: &str) -> bool {
        let Some(entries) = self.by_reference.remove(reference) else {
            return false;
        };

        for digest in entries.keys() {
            if let Some(refs) = self.by_digest.get_mut(digest) {
                refs.remove(reference);
                if refs.is_empty() {
                    self.by_digest.remove(digest);
                }
            }
        }
        true
    }

    /// Every reference with at least one `(algorithm, value)` in `target`.
    pub fn lookup(&self, target: &DigestSet) -> BTreeSet<Reference> {
        target
            .digests()
            .filter_map(|digest| self.by_digest.get(&digest))
            .flatten()
            .cloned()
            .collect()
    }

    /// Whether `reference` attests to any digest in `target`.
    pub fn attests_to(&self, reference: &str, target: &DigestSet) -> bool {
        self.by_reference
            .get(reference)
            .is_some_and(|entries| target.digests().any(|d| entries.contains_key(&d)))
    }

    /// Subject names `reference` recorded for `digest`.
    pub fn subjects_for(&self, reference: &str, digest: &Digest) -> Option<&BTreeSet<String>> {
        self.by_reference.get(reference)?.get(digest)
    }

    /// All digests indexed for `reference`, in sorted order.
    pub fn digests_for(&self, reference: &str) -> Vec<Digest> {
        self.by_reference
            .get(reference)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct digests indexed across all references.
    pub fn digest_count(&self) -> usize {
        self.by_digest.len()
    }

    /// Number of references with at least one indexed digest.
    pub fn reference_count(&self) -> usize {
        self.by_reference.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_store_core::{Subject, COLLECTION_PREDICATE_TYPE, STATEMENT_TYPE_V01};

    fn statement(subjects: &[(&str, &[(&str, &str)])]) -> Statement {
        Statement {
            statement_type: STATEMENT_TYPE_V01.into(),
            subjects: subjects
                .iter()
                .map(|(name, digests)| Subject {
                    name: name.to_string(),
                    digest: digests.iter().copied().collect(),
                })
                .collect(),
            predicate_type: COLLECTION_PREDICATE_TYPE.into(),
            predicate: Vec::new(),
        }
    }

    fn set(pairs: &[(&str, &str)]) -> DigestSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_lookup_any_overlap() {
        let mut index = DigestIndex::new();
        let r1 = Reference::from("ref1");
        index.insert(
            &r1,
            &statement(&[("bin", &[("sha1", "aaaa"), ("sha256", "bbbb")])]),
        );

        assert_eq!(index.lookup(&set(&[("sha1", "aaaa")])).len(), 1);
        assert_eq!(
            index
                .lookup(&set(&[("sha1", "aaaa"), ("sha256", "cccc")]))
                .len(),
            1
        );
        assert!(index.lookup(&set(&[("sha256", "cccc")])).is_empty());
        assert!(index.attests_to("ref1", &set(&[("SHA256", "BBBB")])));
    }

    #[test]
    fn test_subject_names_recorded() {
        let mut index = DigestIndex::new();
        let r1 = Reference::from("ref1");
        index.insert(
            &r1,
            &statement(&[
                ("bin", &[("sha256", "aaaa")]),
                ("copy-of-bin", &[("sha256", "aaaa")]),
            ]),
        );

        let names = index
            .subjects_for("ref1", &Digest::new("sha256", "aaaa"))
            .unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("copy-of-bin"));
    }

    #[test]
    fn test_reinsert_drops_stale_entries() {
        let mut index = DigestIndex::new();
        let r1 = Reference::from("ref1");
        index.insert(&r1, &statement(&[("a", &[("sha256", "old")])]));
        index.insert(&r1, &statement(&[("a", &[("sha256", "new")])]));

        assert!(index.lookup(&set(&[("sha256", "old")])).is_empty());
        assert_eq!(index.digests_for("ref1"), vec![Digest::new("sha256", "new")]);
        assert_eq!(index.digest_count(), 1);
    }

    #[test]
    fn test_remove_is_scoped_to_reference() {
        let mut index = DigestIndex::new();
        let shared = statement(&[("a", &[("sha256", "same")])]);
        index.insert(&Reference::from("ref1"), &shared);
        index.insert(&Reference::from("ref2"), &shared);

        assert!(index.remove("ref1"));
        assert!(!index.remove("ref1"));

        let found = index.lookup(&set(&[("sha256", "same")]));
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![Reference::from("ref2")]);
        assert_eq!(index.reference_count(), 1);
    }
}

//! Attestation-type index: which attestation types each reference contains.
//!
//! Presence only. A collection that lists the same type twice is indexed the
//! same as one that lists it once.

use std::collections::{BTreeSet, HashMap};

use attest_store_core::{Collection, Reference};

#[derive(Debug, Default)]
pub struct TypeIndex {
    by_reference: HashMap<Reference, BTreeSet<String>>,
    by_type: HashMap<String, BTreeSet<Reference>>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the attestation types of `collection` under `reference`,
    /// replacing whatever was indexed for it before.
    pub fn insert(&mut self, reference: &Reference, collection: &Collection) {
        self.remove(reference.as_str());

        let types: BTreeSet<String> = collection
            .attestation_types()
            .map(str::to_owned)
            .collect();

        for t in &types {
            self.by_type
                .entry(t.clone())
                .or_default()
                .insert(reference.clone());
        }
        self.by_reference.insert(reference.clone(), types);
    }

    /// Remove everything indexed for `reference`. Returns whether it was present.
    pub fn remove(&mut self, reference: &str) -> bool {
        let Some(types) = self.by_reference.remove(reference) else {
            return false;
        };

        for t in &types {
            if let Some(refs) = self.by_type.get_mut(t) {
                refs.remove(reference);
                if refs.is_empty() {
                    self.by_type.remove(t);
                }
            }
        }
        true
    }

    pub fn has(&self, reference: &str, attestation_type: &str) -> bool {
        self.by_reference
            .get(reference)
            .is_some_and(|types| types.contains(attestation_type))
    }

    /// True iff every type in `required` is present for `reference`.
    ///
    /// An empty `required` is always satisfied, even for unknown references.
    pub fn has_all<S: AsRef<str>>(&self, reference: &str, required: &[S]) -> bool {
        if required.is_empty() {
            return true;
        }
        match self.by_reference.get(reference) {
            Some(types) => required.iter().all(|t| types.contains(t.as_ref())),
            None => false,
        }
    }

    /// References containing every type in `required`.
    ///
    /// `required` must be non-empty; an empty requirement has no finite
    /// candidate set to return here and yields an empty set.
    pub fn references_with_all<S: AsRef<str>>(&self, required: &[S]) -> BTreeSet<Reference> {
        let mut sets = required
            .iter()
            .map(|t| self.by_type.get(t.as_ref()));

        let Some(Some(first)) = sets.next() else {
            return BTreeSet::new();
        };

        let mut result = first.clone();
        for set in sets {
            match set {
                Some(set) => result.retain(|r| set.contains(r)),
                None => return BTreeSet::new(),
            }
        }
        result
    }

    pub fn types_for(&self, reference: &str) -> Vec<String> {
        self.by_reference
            .get(reference)
            .map(|types| types.iter().cloned().collect())
            .unwrap_or_default()
    }
}

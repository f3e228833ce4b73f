//! Reference index: the primary map from reference to decoded record.
//!
//! Every record is assigned a load sequence number the first time its
//! reference is seen. Overwrites keep that number, so iteration order is the
//! order in which references were first loaded.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use attest_store_core::{CollectionEnvelope, Reference};

#[derive(Debug)]
struct Slot {
    seq: u64,
    record: Arc<CollectionEnvelope>,
}

/// Primary store of decoded records, plus the collection-name index.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    records: HashMap<Reference, Slot>,
    order: BTreeMap<u64, Reference>,
    by_collection_name: HashMap<String, BTreeSet<u64>>,
    next_seq: u64,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `record.reference`.
    ///
    /// Returns the record that was replaced, if any.
    pub fn insert(&mut self, record: Arc<CollectionEnvelope>) -> Option<Arc<CollectionEnvelope>> {
        let reference = record.reference.clone();
        let name = record.collection.name.clone();

        let (seq, previous) = match self.records.remove(&reference) {
            Some(slot) => {
                self.unlink_name(&slot.record.collection.name, slot.seq);
                (slot.seq, Some(slot.record))
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.order.insert(seq, reference.clone());
                (seq, None)
            }
        };

        self.by_collection_name.entry(name).or_default().insert(seq);
        self.records.insert(reference, Slot { seq, record });
        previous
    }

    /// Remove the record for `reference`.
    pub fn remove(&mut self, reference: &str) -> Option<Arc<CollectionEnvelope>> {
        let slot = self.records.remove(reference)?;
        self.order.remove(&slot.seq);
        self.unlink_name(&slot.record.collection.name, slot.seq);
        Some(slot.record)
    }

    pub fn get(&self, reference: &str) -> Option<&Arc<CollectionEnvelope>> {
        self.records.get(reference).map(|slot| &slot.record)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.records.contains_key(reference)
    }

    /// Load sequence number of `reference`.
    pub fn seq_of(&self, reference: &str) -> Option<u64> {
        self.records.get(reference).map(|slot| slot.seq)
    }

    /// Record at a load sequence number.
    pub fn by_seq(&self, seq: u64) -> Option<&Arc<CollectionEnvelope>> {
        self.order.get(&seq).and_then(|r| self.get(r.as_str()))
    }

    /// Load sequence numbers of every record whose collection is named `name`.
    pub fn seqs_named(&self, name: &str) -> BTreeSet<u64> {
        self.by_collection_name
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// References in load order.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.order.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn unlink_name(&mut self, name: &str, seq: u64) {
        if let Some(seqs) = self.by_collection_name.get_mut(name) {
            seqs.remove(&seq);
            if seqs.is_empty() {
                self.by_collection_name.remove(name);
            }
        }
    }
}

//! Property tests for index consistency across loads and overwrites.

use attest_store::{DigestSet, MemorySource};
use attest_store_testkit::generators::attestation_type;
use attest_store_testkit::CollectionParams;
use proptest::prelude::*;

/// Index view of one reference: sorted digests and types.
fn snapshot(store: &MemorySource, reference: &str) -> (Vec<String>, Vec<String>) {
    let digests = store
        .digests_for(reference)
        .into_iter()
        .map(|d| d.to_string())
        .collect();
    (digests, store.types_for(reference))
}

/// Merge digest sets; a later value replaces an earlier one for the same algorithm.
fn union(sets: &[DigestSet]) -> DigestSet {
    let mut all = DigestSet::new();
    for set in sets {
        for (alg, value) in set.iter() {
            all.insert(alg, value);
        }
    }
    all
}

proptest! {
    #[test]
    fn test_loading_twice_is_idempotent(params: CollectionParams) {
        let bytes = params.fixture().envelope_bytes();

        let once = MemorySource::new();
        once.load_bytes("r", &bytes).unwrap();

        let twice = MemorySource::new();
        twice.load_bytes("r", &bytes).unwrap();
        twice.load_bytes("r", &bytes).unwrap();

        prop_assert_eq!(snapshot(&once, "r"), snapshot(&twice, "r"));
        prop_assert_eq!(once.len(), twice.len());
        prop_assert_eq!(once.get("r"), twice.get("r"));
    }

    #[test]
    fn test_overwrite_leaves_no_stale_entries(a: CollectionParams, b: CollectionParams) {
        let overwritten = MemorySource::new();
        overwritten.load_bytes("r", &a.fixture().envelope_bytes()).unwrap();
        overwritten.load_bytes("r", &b.fixture().envelope_bytes()).unwrap();

        let fresh = MemorySource::new();
        fresh.load_bytes("r", &b.fixture().envelope_bytes()).unwrap();

        prop_assert_eq!(snapshot(&overwritten, "r"), snapshot(&fresh, "r"));

        // A's digests only hit if one of B's subjects also carries them
        let a_digests = union(&a.subjects);
        let carried = b.subjects.iter().any(|s| s.matches(&a_digests));
        let hits = overwritten.lookup_digests(&a_digests);
        prop_assert_eq!(hits.is_empty(), !carried);
    }

    #[test]
    fn test_every_subject_finds_its_reference(params: CollectionParams) {
        let store = MemorySource::new();
        store.load_bytes("r", &params.fixture().envelope_bytes()).unwrap();

        for digests in params.subject_digests() {
            let found = store.search::<&str>("", digests, &[]).unwrap();
            prop_assert_eq!(found.len(), 1);
            for digest in digests.digests() {
                prop_assert!(found.matched_digests.contains(&digest));
            }
        }
    }

    #[test]
    fn test_required_types_respected(
        params in any::<CollectionParams>(),
        required in attestation_type(),
    ) {
        let store = MemorySource::new();
        store.load_bytes("r", &params.fixture().envelope_bytes()).unwrap();

        let found = store
            .search(&params.name, &union(&params.subjects), &[required.as_str()])
            .unwrap();
        prop_assert_eq!(found.len() == 1, params.attestation_types.contains(&required));
    }
}

//! Proptest generators for property-based testing.

use proptest::prelude::*;

use attest_store_core::DigestSet;

use crate::fixtures::CollectionFixture;

/// Generate a hash algorithm name.
pub fn algorithm() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("sha1".to_string()),
        Just("sha256".to_string()),
        Just("sha512".to_string()),
        Just("gitoid:sha256".to_string()),
    ]
}

/// Generate a short lowercase hex value.
///
/// Short values keep collisions between independently generated sets likely
/// enough to exercise the matching paths.
pub fn hex_value() -> impl Strategy<Value = String> {
    "[0-9a-f]{2}".prop_map(String::from)
}

/// Generate a digest set with up to `max` algorithms.
pub fn digest_set(max: usize) -> impl Strategy<Value = DigestSet> {
    prop::collection::btree_map(algorithm(), hex_value(), 0..=max).prop_map(DigestSet::from)
}

/// Generate an attestation type name.
pub fn attestation_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("dummy-prods".to_string()),
        Just("dummy-mats".to_string()),
        Just("https://witness.dev/attestations/git/v0.1".to_string()),
        Just("https://witness.dev/attestations/environment/v0.1".to_string()),
    ]
}

/// Generate a collection name.
pub fn collection_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("build".to_string()), Just("test".to_string())]
}

/// Parameters for generating a collection envelope.
#[derive(Debug, Clone)]
pub struct CollectionParams {
    pub name: String,
    /// One digest set per subject; always at least one non-empty subject.
    pub subjects: Vec<DigestSet>,
    /// May contain duplicates.
    pub attestation_types: Vec<String>,
}

impl CollectionParams {
    pub fn fixture(&self) -> CollectionFixture {
        let mut fixture = CollectionFixture::new(&self.name);
        for (i, digests) in self.subjects.iter().enumerate() {
            let pairs: Vec<(&str, &str)> = digests.iter().collect();
            fixture = fixture.subject(&format!("subject-{i}"), &pairs);
        }
        for t in &self.attestation_types {
            fixture = fixture.attestation(t);
        }
        fixture
    }

    /// Digest set of each subject, in subject order.
    pub fn subject_digests(&self) -> &[DigestSet] {
        &self.subjects
    }
}

impl Arbitrary for CollectionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            collection_name(),
            prop::collection::vec(digest_set(3).prop_filter("non-empty", |d| !d.is_empty()), 1..4),
            prop::collection::vec(attestation_type(), 0..5),
        )
            .prop_map(|(name, subjects, attestation_types)| CollectionParams {
                name,
                subjects,
                attestation_types,
            })
            .boxed()
    }
}

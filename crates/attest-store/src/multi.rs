//! Fan a search out over several sources.

use std::sync::Arc;

use attest_store_core::{CollectionEnvelope, DigestSet};

use crate::error::Result;
use crate::search::{validate_query, SearchResult};
use crate::traits::Source;

/// A [`Source`] that queries each of its sources in turn.
///
/// Matches are concatenated in source order. A reference already returned
/// by an earlier source is not repeated. The first source error aborts the
/// search.
#[derive(Default)]
pub struct MultiSource {
    sources: Vec<Arc<dyn Source>>,
}

impl MultiSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source; it is searched after all previously added ones.
    pub fn add(&mut self, source: Arc<dyn Source>) -> &mut Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Source for MultiSource {
    fn search(
        &self,
        collection_name: &str,
        target: &DigestSet,
        required_types: &[String],
    ) -> Result<SearchResult> {
        validate_query(target, required_types)?;

        let mut result = SearchResult::default();
        for source in &self.sources {
            result.merge(source.search(collection_name, target, required_types)?, target);
        }

        tracing::debug!(
            sources = self.sources.len(),
            matches = result.matches.len(),
            "multi-source search complete"
        );
        Ok(result)
    }

    fn get(&self, reference: &str) -> Option<Arc<CollectionEnvelope>> {
        self.sources.iter().find_map(|s| s.get(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::MemorySource;
    use attest_store_core::{Digest, Reference};
    use attest_store_testkit::{digest_set, types, CollectionFixture};

    #[test]
    fn test_search_across_sources() {
        let first = Arc::new(MemorySource::new());
        let second = Arc::new(MemorySource::new());

        first
            .load_bytes(
                "ref1",
                &CollectionFixture::new("step1")
                    .subject("bin", &[("sha256", "deadbeef")])
                    .attestation("dummy-prods")
                    .envelope_bytes(),
            )
            .unwrap();
        second
            .load_bytes(
                "ref2",
                &CollectionFixture::new("step1")
                    .subject("bin", &[("sha256", "deadbeef"), ("sha1", "abcd")])
                    .attestation("dummy-prods")
                    .envelope_bytes(),
            )
            .unwrap();

        let mut multi = MultiSource::new();
        multi.add(first).add(second);
        assert_eq!(multi.len(), 2);

        let result = multi
            .search("", &digest_set(&[("sha256", "deadbeef")]), &types(&["dummy-prods"]))
            .unwrap();
        let refs: Vec<_> = result
            .references()
            .into_iter()
            .map(Reference::as_str)
            .collect();
        assert_eq!(refs, vec!["ref1", "ref2"]);
        assert_eq!(result.matched_digest_sets()["sha1"].len(), 1);

        assert!(multi.get("ref2").is_some());
        assert!(multi.get("ref3").is_none());
    }

    #[test]
    fn test_shadowed_duplicate_adds_no_digests() {
        let first = Arc::new(MemorySource::new());
        let second = Arc::new(MemorySource::new());

        first
            .load_bytes(
                "ref1",
                &CollectionFixture::new("step1")
                    .subject("bin", &[("sha256", "deadbeef")])
                    .envelope_bytes(),
            )
            .unwrap();
        second
            .load_bytes(
                "ref1",
                &CollectionFixture::new("step1")
                    .subject("bin", &[("sha256", "deadbeef"), ("sha1", "9999")])
                    .envelope_bytes(),
            )
            .unwrap();

        let mut multi = MultiSource::new();
        multi.add(first).add(second);

        let result = multi
            .search("", &digest_set(&[("sha256", "deadbeef")]), &[])
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.matched_digests.into_iter().collect::<Vec<_>>(),
            vec![Digest::new("sha256", "deadbeef")]
        );
    }

    #[test]
    fn test_empty_query_rejected_without_sources() {
        let multi = MultiSource::new();
        let err = multi.search("", &DigestSet::new(), &[]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }
}

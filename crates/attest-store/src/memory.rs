//! In-memory attestation source.
//!
//! The reference, digest and type indexes form one consistency unit behind a
//! single `RwLock`. Loads decode, verify and read files before taking the
//! write lock; the locked section only swaps index entries, so readers see
//! either the old or the new state of a reference and never a mix.

use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use attest_store_core::{CollectionEnvelope, Digest, DigestSet, Envelope, Reference};

use crate::config::SourceConfig;
use crate::digest_index::DigestIndex;
use crate::error::{Result, StoreError};
use crate::reference_index::ReferenceIndex;
use crate::search::{self, SearchResult};
use crate::traits::{EnvelopeVerifier, FileReader, FsReader, Source};
use crate::type_index::TypeIndex;

/// In-memory store of collection envelopes.
///
/// All data is lost when the source is dropped. Thread-safe via RwLock.
pub struct MemorySource {
    inner: RwLock<MemorySourceInner>,
    config: SourceConfig,
    verifier: Option<Arc<dyn EnvelopeVerifier>>,
    reader: Arc<dyn FileReader>,
}

#[derive(Default)]
struct MemorySourceInner {
    references: ReferenceIndex,
    digests: DigestIndex,
    types: TypeIndex,
}

impl MemorySourceInner {
    fn put(&mut self, record: Arc<CollectionEnvelope>) -> Option<Arc<CollectionEnvelope>> {
        let reference = record.reference.clone();
        self.digests.insert(&reference, &record.statement);
        self.types.insert(&reference, &record.collection);
        self.references.insert(record)
    }

    fn remove(&mut self, reference: &str) -> Option<Arc<CollectionEnvelope>> {
        let removed = self.references.remove(reference)?;
        self.digests.remove(reference);
        self.types.remove(reference);
        Some(removed)
    }
}

impl MemorySource {
    /// Create an empty source with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SourceConfig::default())
    }

    pub fn with_config(config: SourceConfig) -> Self {
        Self {
            inner: RwLock::new(MemorySourceInner::default()),
            config,
            verifier: None,
            reader: Arc::new(FsReader),
        }
    }

    /// Run `verifier` on every envelope before it is indexed.
    pub fn with_verifier(mut self, verifier: impl EnvelopeVerifier + 'static) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    /// Read files through `reader` instead of the local filesystem.
    pub fn with_file_reader(mut self, reader: impl FileReader + 'static) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    /// Index an already decoded record, replacing any record under the same reference.
    ///
    /// Returns the replaced record. No verification is performed.
    pub fn put(&self, record: CollectionEnvelope) -> Option<Arc<CollectionEnvelope>> {
        self.write().put(Arc::new(record))
    }

    /// Decode, verify and index `envelope` under `reference`.
    ///
    /// On any error the store is left exactly as it was for `reference`.
    pub fn load_envelope(&self, reference: impl Into<Reference>, envelope: Envelope) -> Result<()> {
        let reference = reference.into();
        let result = self.decode_and_verify(reference.clone(), envelope);

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(reference = %reference, error = %e, "rejected envelope");
                return Err(e);
            }
        };

        let subjects = record.statement.subjects.len();
        let attestations = record.collection.attestations.len();
        let replaced = self.write().put(Arc::new(record)).is_some();

        tracing::debug!(
            reference = %reference,
            subjects,
            attestations,
            replaced,
            "loaded collection envelope"
        );
        Ok(())
    }

    /// Decode envelope JSON bytes and index them under `reference`.
    pub fn load_bytes(&self, reference: impl Into<Reference>, bytes: &[u8]) -> Result<()> {
        let reference = reference.into();

        if let Some(max) = self.config.max_envelope_bytes {
            if bytes.len() > max {
                let e = StoreError::Codec(attest_store_core::CodecError::decode(format!(
                    "envelope is {} bytes, limit is {max}",
                    bytes.len()
                )));
                tracing::warn!(reference = %reference, error = %e, "rejected envelope");
                return Err(e);
            }
        }

        let envelope = match Envelope::from_json_slice(bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(reference = %reference, error = %e, "rejected envelope");
                return Err(e.into());
            }
        };
        self.load_envelope(reference, envelope)
    }

    /// Read an envelope from `reader` and index it under `reference`.
    pub fn load_reader<R: Read>(&self, reference: impl Into<Reference>, mut reader: R) -> Result<()> {
        let reference = reference.into();
        let mut bytes = Vec::new();
        if let Err(e) = reader.read_to_end(&mut bytes) {
            let e = StoreError::from_io(reference.as_str(), e);
            tracing::warn!(reference = %reference, error = %e, "rejected envelope");
            return Err(e);
        }
        self.load_bytes(reference, &bytes)
    }

    /// Read the envelope at `path` and index it with the path as reference.
    ///
    /// A missing file is [`StoreError::NotFound`]; other read failures are
    /// [`StoreError::Io`]. The file is read before any lock is taken.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = match self.reader.read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let e = StoreError::from_io(path, e);
                tracing::warn!(path = %path.display(), error = %e, "rejected envelope");
                return Err(e);
            }
        };
        self.load_bytes(Reference::from_path(path), &bytes)
    }

    /// Load several files in order, stopping early once `cancel` is set.
    ///
    /// The flag is checked before each file; a load already in progress
    /// always completes. Returns the number of files loaded.
    pub fn load_files<I, P>(&self, paths: I, cancel: &AtomicBool) -> Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut loaded = 0;
        for path in paths {
            if cancel.load(Ordering::Acquire) {
                return Err(StoreError::Cancelled);
            }
            self.load_file(path)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Remove the record for `reference` and all of its index entries.
    pub fn remove(&self, reference: &str) -> Option<Arc<CollectionEnvelope>> {
        self.write().remove(reference)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the record loaded under `reference`.
    pub fn get(&self, reference: &str) -> Option<Arc<CollectionEnvelope>> {
        self.read().references.get(reference).cloned()
    }

    /// Find collections covering `target` that contain every required type.
    ///
    /// An empty `collection_name` matches any collection. Fails with
    /// [`StoreError::InvalidQuery`] when both `target` and `required_types`
    /// are empty. No match is an empty result, not an error.
    pub fn search<S: AsRef<str>>(
        &self,
        collection_name: &str,
        target: &DigestSet,
        required_types: &[S],
    ) -> Result<SearchResult> {
        let inner = self.read();
        search::execute(
            &inner.references,
            &inner.digests,
            &inner.types,
            collection_name,
            target,
            required_types,
        )
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.read().references.contains(reference)
    }

    pub fn len(&self) -> usize {
        self.read().references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().references.is_empty()
    }

    /// All references, in load order.
    pub fn references(&self) -> Vec<Reference> {
        self.read().references.references().cloned().collect()
    }

    /// Subject digests indexed for `reference`.
    pub fn digests_for(&self, reference: &str) -> Vec<Digest> {
        self.read().digests.digests_for(reference)
    }

    /// Attestation types indexed for `reference`.
    pub fn types_for(&self, reference: &str) -> Vec<String> {
        self.read().types.types_for(reference)
    }

    /// Whether `reference` contains every type in `required`.
    pub fn has_all_types<S: AsRef<str>>(&self, reference: &str, required: &[S]) -> bool {
        self.read().types.has_all(reference, required)
    }

    /// References whose subjects overlap `target`, in load order.
    pub fn lookup_digests(&self, target: &DigestSet) -> Vec<Reference> {
        let inner = self.read();
        let mut refs: Vec<(u64, Reference)> = inner
            .digests
            .lookup(target)
            .into_iter()
            .filter_map(|r| inner.references.seq_of(r.as_str()).map(|seq| (seq, r)))
            .collect();
        refs.sort_by_key(|(seq, _)| *seq);
        refs.into_iter().map(|(_, r)| r).collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn decode_and_verify(&self, reference: Reference, envelope: Envelope) -> Result<CollectionEnvelope> {
        if let Some(verifier) = &self.verifier {
            verifier
                .verify(&reference, &envelope)
                .map_err(|e| StoreError::VerificationFailed {
                    reference: reference.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(CollectionEnvelope::decode(reference, envelope, &self.config.decode)?)
    }

    fn read(&self) -> RwLockReadGuard<'_, MemorySourceInner> {
        // Every write either completes or leaves the prior state, so a
        // poisoned lock still guards consistent indexes.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemorySourceInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for MemorySource {
    fn search(
        &self,
        collection_name: &str,
        target: &DigestSet,
        required_types: &[String],
    ) -> Result<SearchResult> {
        MemorySource::search(self, collection_name, target, required_types)
    }

    fn get(&self, reference: &str) -> Option<Arc<CollectionEnvelope>> {
        MemorySource::get(self, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_store_core::{
        Collection, CollectionAttestation, Statement, Subject, COLLECTION_PREDICATE_TYPE,
        IN_TOTO_PAYLOAD_TYPE, STATEMENT_TYPE_V01,
    };
    use serde_json::{json, Value};

    fn envelope(digest: &str, name: &str, types: &[&str]) -> Envelope {
        let predicate = json!({
            "name": name,
            "attestations": types
                .iter()
                .map(|t| json!({"type": t, "attestation": {}}))
                .collect::<Vec<_>>(),
        });
        let statement = json!({
            "_type": STATEMENT_TYPE_V01,
            "subject": [{"name": "artifact", "digest": {"sha256": digest}}],
            "predicateType": COLLECTION_PREDICATE_TYPE,
            "predicate": predicate,
        });
        Envelope {
            payload: serde_json::to_vec(&statement).unwrap(),
            payload_type: IN_TOTO_PAYLOAD_TYPE.into(),
            signatures: vec![],
        }
    }

    fn sha256(value: &str) -> DigestSet {
        [("sha256", value)].into_iter().collect()
    }

    #[test]
    fn test_load_and_get() {
        let source = MemorySource::new();
        source
            .load_envelope("ref1", envelope("deadbeef", "step1", &["dummy-prods"]))
            .unwrap();

        let record = source.get("ref1").unwrap();
        assert_eq!(record.collection.name, "step1");
        assert!(source.get("ref2").is_none());
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_search_scenario() {
        let source = MemorySource::new();
        source
            .load_envelope("ref1", envelope("deadbeef", "step1", &["dummy-prods"]))
            .unwrap();

        let found = source.search("", &sha256("deadbeef"), &["dummy-prods"]).unwrap();
        assert_eq!(found.references(), vec![&Reference::from("ref1")]);

        let none = source.search::<&str>("", &sha256("cafef00d"), &[]).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_failed_load_keeps_prior_state() {
        let source = MemorySource::new();
        source
            .load_envelope("ref1", envelope("deadbeef", "step1", &["dummy-prods"]))
            .unwrap();

        let mut bad = envelope("cafef00d", "step2", &["other"]);
        bad.payload_type = "text/plain".into();
        assert!(source.load_envelope("ref1", bad).unwrap_err().is_decode());

        assert_eq!(source.get("ref1").unwrap().collection.name, "step1");
        assert_eq!(source.digests_for("ref1"), vec![Digest::new("sha256", "deadbeef")]);
        assert_eq!(source.types_for("ref1"), vec!["dummy-prods".to_string()]);
    }

    #[test]
    fn test_verifier_rejection_prevents_indexing() {
        let source = MemorySource::new().with_verifier(
            |_: &Reference, envelope: &Envelope| -> std::result::Result<(), crate::BoxError> {
                if envelope.signatures.is_empty() {
                    Err("no signatures".into())
                } else {
                    Ok(())
                }
            },
        );

        let err = source
            .load_envelope("ref1", envelope("deadbeef", "step1", &[]))
            .unwrap_err();
        assert!(matches!(err, StoreError::VerificationFailed { .. }));
        assert!(!source.contains("ref1"));
        assert!(source.lookup_digests(&sha256("deadbeef")).is_empty());
    }

    #[test]
    fn test_put_decoded_record() {
        let source = MemorySource::new();
        let record = CollectionEnvelope {
            reference: Reference::from("manual"),
            envelope: Envelope {
                payload: vec![],
                payload_type: IN_TOTO_PAYLOAD_TYPE.into(),
                signatures: vec![],
            },
            statement: Statement {
                statement_type: STATEMENT_TYPE_V01.into(),
                subjects: vec![Subject {
                    name: "a".into(),
                    digest: sha256("abcd"),
                }],
                predicate_type: COLLECTION_PREDICATE_TYPE.into(),
                predicate: vec![],
            },
            collection: Collection {
                name: "build".into(),
                attestations: vec![CollectionAttestation {
                    attestation_type: "material".into(),
                    attestation: Value::Null,
                    start_time: None,
                    end_time: None,
                }],
            },
        };

        assert!(source.put(record.clone()).is_none());
        assert!(source.put(record).is_some());
        assert!(source.has_all_types("manual", &["material"]));
        assert_eq!(source.lookup_digests(&sha256("abcd")).len(), 1);
    }

    #[test]
    fn test_remove_clears_indexes() {
        let source = MemorySource::new();
        source
            .load_envelope("ref1", envelope("deadbeef", "step1", &["a"]))
            .unwrap();

        assert!(source.remove("ref1").is_some());
        assert!(source.is_empty());
        assert!(source.digests_for("ref1").is_empty());
        assert!(source.types_for("ref1").is_empty());
        assert!(source.search("", &DigestSet::new(), &["a"]).unwrap().is_empty());
    }

    #[test]
    fn test_max_envelope_bytes() {
        let source = MemorySource::with_config(SourceConfig::default().with_max_envelope_bytes(16));
        let bytes = envelope("deadbeef", "step1", &[]).to_json_vec().unwrap();

        assert!(source.load_bytes("ref1", &bytes).unwrap_err().is_decode());
        assert!(!source.contains("ref1"));
    }

    #[test]
    fn test_load_reader() {
        let source = MemorySource::new();
        let bytes = envelope("deadbeef", "step1", &["dummy-prods"]).to_json_vec().unwrap();

        source.load_reader("ref1", bytes.as_slice()).unwrap();
        assert!(source.has_all_types("ref1", &["dummy-prods"]));
    }

    struct FailingReader(std::io::ErrorKind);

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(self.0))
        }
    }

    #[test]
    fn test_load_reader_io_error() {
        let source = MemorySource::new();

        let err = source
            .load_reader("ref1", FailingReader(std::io::ErrorKind::BrokenPipe))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!source.contains("ref1"));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_file_read_is_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let source = MemorySource::new();
        let err = tracing::subscriber::with_default(subscriber, || {
            source.load_file(&missing).unwrap_err()
        });

        assert!(err.is_not_found());
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("rejected envelope"));
        assert!(output.contains("missing.json"));
    }

    #[test]
    fn test_load_files_cancelled() {
        let source = MemorySource::new();
        let cancel = AtomicBool::new(true);
        let err = source.load_files(["a.json"], &cancel).unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }
}

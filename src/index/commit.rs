//! The commit pipeline.
//!
//! [`CommitOperation::commit`] turns a stream of raw documents into one
//! immutable index generation. The work runs in two phases of concurrent
//! tasks joined by bounded channels:
//!
//! ```text
//! phase 1   source ──hash/dedup──┬──▶ document writer ──▶ address writer
//!                                └──▶ analyzer ──▶ trie builder
//!           (barrier: source drained, all queues drained, tries complete)
//! phase 2   ┌─▶ postings writer (walks terminal nodes, back-writes addresses)
//!           ├─▶ trie serializer (parallel per field)
//!           └─▶ primary-key writer
//!           (barrier)
//!           manifest write (last, atomic)
//! ```
//!
//! A channel disconnecting after its senders drop is the "no more input"
//! signal; each consumer drains its queue and finishes. Duplicate primary
//! keys are dropped with a warning and never stored, indexed, or counted.
//! Any I/O or source error fails the whole commit; the partially written
//! generation keeps no manifest and is therefore invisible to readers.

use std::io::Write;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use crossbeam_channel::bounded;
use log::{debug, warn};
use rayon::prelude::*;

use crate::analysis::{Analyzer, Posting};
use crate::block::writer::BlockWriter;
use crate::block::{BlockInfo, BlockInfoCodec, DocHashCodec, JsonCodec};
use crate::data::{DocHash, Document, HashedDocument, primary_key_hash};
use crate::error::{Result, SylvaError};
use crate::index::builder::TrieBuilder;
use crate::index::manifest::IxInfo;
use crate::index::trie::TermTrie;
use crate::index::{
    IndexConfig, doc_address_file, doc_file, postings_file, primary_key_file, trie_file,
};
use crate::storage::Storage;
use crate::util::version::{TimestampVersionAllocator, VersionAllocator};

/// Default capacity of the pipeline queues.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A finite stream of raw documents feeding a commit.
pub trait DocumentSource: Send {
    /// Produce the next document, `None` when the source is exhausted.
    ///
    /// A source error fails the whole commit.
    fn next_document(&mut self) -> Result<Option<Document>>;
}

impl<I> DocumentSource for I
where
    I: Iterator<Item = Result<Document>> + Send,
{
    fn next_document(&mut self) -> Result<Option<Document>> {
        self.next().transpose()
    }
}

/// Tracks the primary-key hashes accepted by one commit, in source order.
#[derive(Debug, Default)]
struct PkRegistry {
    seen: AHashSet<u64>,
    accepted: Vec<u64>,
}

impl PkRegistry {
    /// Register a hash; returns false if it was already accepted.
    fn try_register(&mut self, hash: u64) -> bool {
        if self.seen.insert(hash) {
            self.accepted.push(hash);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.accepted.len()
    }
}

/// Builds one index generation from a document source.
pub struct CommitOperation {
    storage: Arc<dyn Storage>,
    analyzer: Arc<dyn Analyzer>,
    config: IndexConfig,
    allocator: Arc<dyn VersionAllocator>,
}

impl CommitOperation {
    pub fn new(storage: Arc<dyn Storage>, analyzer: Arc<dyn Analyzer>, config: IndexConfig) -> Self {
        Self {
            storage,
            analyzer,
            config,
            allocator: Arc::new(TimestampVersionAllocator::new()),
        }
    }

    /// Replace the version allocator (shared across concurrent committers).
    pub fn with_allocator(mut self, allocator: Arc<dyn VersionAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Run the commit to completion and return the generation's manifest.
    ///
    /// Fails only on I/O errors or a source error; both are propagated and
    /// leave the generation unmanifested (not committed).
    pub fn commit(&self, mut source: impl DocumentSource) -> Result<IxInfo> {
        let version = self.allocator.next();
        debug!("commit {version}: starting, analyzer={}", self.analyzer.name());

        let (pks, tries) = self.ingest(version, &mut source)?;
        let doc_count = pks.len() as u64;
        debug!(
            "commit {version}: ingested {doc_count} documents across {} fields",
            tries.len()
        );

        self.serialize_generation(version, &pks, &tries)?;

        // All other files of the generation are flushed and closed; the
        // manifest now marks it complete.
        let info = IxInfo {
            version,
            doc_count,
            compression: self.config.compression,
        };
        info.write(&self.storage)?;
        debug!("commit {version}: manifest written");
        Ok(info)
    }

    /// Phase 1: read the source, deduplicate, and fan out to the document
    /// writer (feeding the address writer) and the analyzer.
    fn ingest(
        &self,
        version: u64,
        source: &mut impl DocumentSource,
    ) -> Result<(PkRegistry, AHashMap<String, TermTrie>)> {
        let capacity = self
            .config
            .channel_capacity
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY);
        let (store_tx, store_rx) = bounded::<HashedDocument>(capacity);
        let (analyze_tx, analyze_rx) = bounded::<HashedDocument>(capacity);
        let (address_tx, address_rx) = bounded::<BlockInfo>(capacity);

        let builder = TrieBuilder::new();
        let mut pks = PkRegistry::default();
        let mut source_result: Result<()> = Ok(());

        std::thread::scope(|scope| -> Result<()> {
            let storage = &self.storage;
            let analyzer = &self.analyzer;
            let builder = &builder;

            let store_task = scope.spawn(move || -> Result<()> {
                let output = storage.create_output(&doc_file(version))?;
                let mut writer: BlockWriter<Document> =
                    BlockWriter::new(output, Arc::new(JsonCodec));
                for doc in store_rx {
                    let info = writer.write(&doc.document)?;
                    // A dead address writer surfaces its own error at join.
                    if address_tx.send(info).is_err() {
                        break;
                    }
                }
                writer.close()
            });

            let address_task = scope.spawn(move || -> Result<()> {
                let output = storage.create_output(&doc_address_file(version))?;
                let mut writer: BlockWriter<BlockInfo> =
                    BlockWriter::new(output, Arc::new(BlockInfoCodec));
                for info in address_rx {
                    writer.write(&info)?;
                }
                writer.close()
            });

            let analyze_task = scope.spawn(move || -> Result<()> {
                for doc in analyze_rx {
                    let analyzed = analyzer.analyze(&doc)?;
                    for (field, words) in &analyzed.fields {
                        builder.add(field, words);
                    }
                }
                Ok(())
            });

            loop {
                match source.next_document() {
                    Ok(Some(document)) => {
                        let hash = self.hash_document(&document)?;
                        if !pks.try_register(hash) {
                            warn!("commit {version}: dropping duplicate primary key {hash:#x}");
                            continue;
                        }
                        let doc = HashedDocument::new(hash, document);
                        // A send fails only when a writer stage already
                        // failed; stop feeding and report its error below.
                        if store_tx.send(doc.clone()).is_err() || analyze_tx.send(doc).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        source_result = Err(e);
                        break;
                    }
                }
            }
            drop(store_tx);
            drop(analyze_tx);

            join_task(store_task)?;
            join_task(address_task)?;
            join_task(analyze_task)?;
            Ok(())
        })?;
        source_result?;

        let tries = builder.complete_adding()?;
        Ok((pks, tries))
    }

    /// Phase 2: write postings (back-writing each terminal node's address),
    /// serialize the tries in parallel per field, and persist the accepted
    /// primary-key hashes.
    fn serialize_generation(
        &self,
        version: u64,
        pks: &PkRegistry,
        tries: &AHashMap<String, TermTrie>,
    ) -> Result<()> {
        // Sorted so the postings file order is deterministic and matches the
        // DFS enumeration of each trie.
        let mut fields: Vec<&String> = tries.keys().collect();
        fields.sort();
        let fields = &fields;

        std::thread::scope(|scope| -> Result<()> {
            let storage = &self.storage;

            let postings_task = scope.spawn(move || -> Result<()> {
                let output = storage.create_output(&postings_file(version))?;
                let mut writer: BlockWriter<Vec<Posting>> =
                    BlockWriter::new(output, Arc::new(JsonCodec));
                for field in fields {
                    for node in tries[*field].end_of_word_nodes() {
                        let info = writer.write(&node.postings().to_vec())?;
                        node.set_postings_address(info)?;
                    }
                }
                debug!("commit {version}: wrote {} postings lists", writer.records());
                writer.close()
            });

            let trie_task = scope.spawn(move || -> Result<()> {
                fields.par_iter().try_for_each(|field| {
                    let record = tries[*field].to_record();
                    let json = serde_json::to_vec(&record).map_err(|e| {
                        SylvaError::serialization(format!(
                            "failed to encode trie for field '{field}': {e}"
                        ))
                    })?;
                    let mut output = storage.create_output(&trie_file(version, field))?;
                    output.write_all(&json)?;
                    output.close()
                })
            });

            let pk_task = scope.spawn(move || -> Result<()> {
                let output = storage.create_output(&primary_key_file(version))?;
                let mut writer: BlockWriter<DocHash> =
                    BlockWriter::new(output, Arc::new(DocHashCodec));
                for hash in &pks.accepted {
                    writer.write(&DocHash(*hash))?;
                }
                writer.close()
            });

            join_task(postings_task)?;
            join_task(trie_task)?;
            join_task(pk_task)?;
            Ok(())
        })
    }

    /// Compute the deduplication hash for one document.
    ///
    /// With a configured primary key the field's value is hashed (a missing
    /// field is an error); otherwise the document id or a generated UUID
    /// stands in, making the document unique.
    fn hash_document(&self, document: &Document) -> Result<u64> {
        match &self.config.primary_key {
            Some(field) => {
                let value = document.get(field).ok_or_else(|| {
                    SylvaError::invalid_argument(format!(
                        "document is missing primary-key field '{field}'"
                    ))
                })?;
                Ok(primary_key_hash(value))
            }
            None => {
                let value = match &document.id {
                    Some(id) => id.clone(),
                    None => uuid::Uuid::new_v4().to_string(),
                };
                Ok(primary_key_hash(&value))
            }
        }
    }
}

impl std::fmt::Debug for CommitOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitOperation")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

fn join_task<T>(handle: std::thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .map_err(|_| SylvaError::index("commit pipeline task panicked"))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardAnalyzer;
    use crate::storage::memory::MemoryStorage;

    fn docs(source: Vec<Document>) -> impl DocumentSource {
        source.into_iter().map(Ok)
    }

    fn committer(primary_key: Option<&str>) -> (Arc<dyn Storage>, CommitOperation) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let config = match primary_key {
            Some(field) => IndexConfig::new().primary_key(field),
            None => IndexConfig::new(),
        };
        let op = CommitOperation::new(storage.clone(), Arc::new(StandardAnalyzer::new()), config);
        (storage, op)
    }

    #[test]
    fn test_pk_registry_first_wins() {
        let mut pks = PkRegistry::default();
        assert!(pks.try_register(1));
        assert!(pks.try_register(2));
        assert!(!pks.try_register(1));
        assert_eq!(pks.accepted, vec![1, 2]);
    }

    #[test]
    fn test_missing_primary_key_field_fails() {
        let (_storage, op) = committer(Some("isbn"));
        let err = op
            .commit(docs(vec![Document::new().field("title", "no isbn here")]))
            .unwrap_err();
        assert!(matches!(err, SylvaError::InvalidArgument(_)));
    }

    #[test]
    fn test_source_error_propagates_without_manifest() {
        let (storage, op) = committer(None);
        let source = vec![
            Ok(Document::new().field("title", "ok")),
            Err(SylvaError::storage("source went away")),
        ]
        .into_iter();

        assert!(op.commit(source).is_err());
        // No manifest: the partial generation is not committed.
        assert!(crate::index::manifest::versions(&storage).unwrap().is_empty());
    }

    #[test]
    fn test_postings_addresses_cover_disjoint_regions() -> Result<()> {
        let (storage, op) = committer(None);
        let source = docs(vec![
            Document::with_id("1").field("title", "fox box"),
            Document::with_id("2").field("title", "fox"),
        ]);
        let info = op.commit(source)?;

        // Two terminal nodes (box, and fox with both documents' postings
        // merged) produce a non-empty postings file.
        let postings_len = {
            let mut input = storage.open_input(&postings_file(info.version))?;
            let mut bytes = Vec::new();
            std::io::Read::read_to_end(&mut input, &mut bytes)?;
            bytes.len() as u64
        };
        assert!(postings_len > 0);
        Ok(())
    }
}

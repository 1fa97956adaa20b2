//! # Sylva
//!
//! The write path of a trie-based full-text search index.
//!
//! Sylva ingests documents, deduplicates them by primary key, analyzes their
//! fields into per-field term tries, and persists documents, postings, tries,
//! and metadata as one immutable, versioned generation of block-addressed
//! files. Re-reading those files goes through the same block-address
//! contract: every record is identified by its `(position, length)` inside
//! its stream.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sylva::{
//!     CommitOperation, Document, IndexConfig, StandardAnalyzer, StorageConfig, StorageFactory,
//! };
//!
//! fn main() -> sylva::Result<()> {
//!     let storage = StorageFactory::create(StorageConfig::File("index".into()))?;
//!     let op = CommitOperation::new(
//!         storage,
//!         Arc::new(StandardAnalyzer::new()),
//!         IndexConfig::new().primary_key("isbn"),
//!     );
//!
//!     let docs = vec![
//!         Document::new()
//!             .field("isbn", "9780261103573")
//!             .field("title", "The Fellowship of the Ring"),
//!     ];
//!     let manifest = op.commit(docs.into_iter().map(Ok))?;
//!     println!("committed generation {}", manifest.version);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod analysis;
pub mod block;
mod data;
mod error;
pub mod index;
pub mod query;
pub mod storage;
mod util;

// Re-exports for the public API
pub use analysis::{AnalyzedDocument, Analyzer, Posting, StandardAnalyzer, WordInfo};
pub use block::reader::BlockReader;
pub use block::writer::BlockWriter;
pub use block::{BlockCodec, BlockInfo, JsonCodec};
pub use data::{DocHash, Document, Field, HashedDocument, primary_key_hash};
pub use error::{Result, SylvaError};
pub use index::builder::TrieBuilder;
pub use index::commit::{CommitOperation, DocumentSource};
pub use index::manifest::{IxInfo, versions};
pub use index::trie::{TermTrie, TrieRecord};
pub use index::{Compression, IndexConfig, read_documents};
pub use query::QueryTerm;
pub use storage::{Storage, StorageConfig, StorageFactory, StorageInput, StorageOutput};
pub use util::version::{TimestampVersionAllocator, VersionAllocator};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

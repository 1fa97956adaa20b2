//! Index building and generation layout.
//!
//! One commit produces one immutable generation of index files, named by the
//! generation's version id `V`:
//!
//! | File | Content |
//! |---|---|
//! | `V.doc` | sequential document records |
//! | `V.da` | one fixed-width block address into `V.doc` per document |
//! | `V.pos` | sequential postings records, one per trie terminal node |
//! | `V-<field>.tri` | one serialized term trie per field |
//! | `V.pk` | sequential primary-key hash records |
//! | `V.ix` | manifest, written last |

pub mod builder;
pub mod commit;
pub mod manifest;
pub mod trie;

use std::io::Read;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::block::reader::BlockReader;
use crate::block::{BLOCK_INFO_SIZE, BlockCodec, BlockInfo, BlockInfoCodec, JsonCodec};
use crate::data::Document;
use crate::error::{Result, SylvaError};
use crate::storage::Storage;

/// Compression applied to stored document bytes.
///
/// The codec itself is pluggable and out of the index core's hands; the flag
/// is recorded in the manifest so readers pick the matching codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// Configuration for building an index generation.
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    /// Field whose value deduplicates documents. When unset, the document's
    /// own id (or a generated UUID) is hashed instead, so every document is
    /// unique.
    pub primary_key: Option<String>,

    /// Compression flag recorded in the manifest.
    pub compression: Compression,

    /// Capacity of the pipeline queues between commit stages. Bounded so a
    /// fast source cannot outpace the disk-writing consumers.
    pub channel_capacity: Option<usize>,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary-key field name.
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    /// Set the compression flag.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the pipeline queue capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }
}

/// File name of the document store for a generation.
pub fn doc_file(version: u64) -> String {
    format!("{version}.doc")
}

/// File name of the document-address file for a generation.
pub fn doc_address_file(version: u64) -> String {
    format!("{version}.da")
}

/// File name of the postings file for a generation.
pub fn postings_file(version: u64) -> String {
    format!("{version}.pos")
}

/// File name of one field's trie for a generation.
pub fn trie_file(version: u64, field: &str) -> String {
    format!("{version}-{field}.tri")
}

/// File name of the primary-key file for a generation.
pub fn primary_key_file(version: u64) -> String {
    format!("{version}.pk")
}

/// Load the document addresses of a generation, in write order.
pub fn read_document_addresses(
    storage: &Arc<dyn Storage>,
    version: u64,
) -> Result<Vec<BlockInfo>> {
    let mut input = storage.open_input(&doc_address_file(version))?;
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;

    if bytes.len() as u64 % BLOCK_INFO_SIZE != 0 {
        return Err(SylvaError::serialization(format!(
            "document-address file of generation {version} is truncated"
        )));
    }

    let codec = BlockInfoCodec;
    bytes
        .chunks_exact(BLOCK_INFO_SIZE as usize)
        .map(|chunk| codec.decode(chunk))
        .collect()
}

/// Stream the documents of a committed generation back out of its document
/// store, in the order they were written.
pub fn read_documents(storage: &Arc<dyn Storage>, version: u64) -> Result<Vec<Document>> {
    let addresses = read_document_addresses(storage, version)?;
    let input = storage.open_input(&doc_file(version))?;
    let mut reader: BlockReader<Document> = BlockReader::new(input, Arc::new(JsonCodec));
    reader.get(addresses).collect()
}

//! Document model and primary-key hashing.

use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};

/// A single named field of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// A document to be indexed.
///
/// A document is an ordered collection of named string fields, optionally
/// carrying an external identifier. If no primary-key field is configured and
/// no identifier is present, a UUID (v4) is generated at ingestion time so
/// every document still deduplicates against a unique key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Optional external identifier.
    pub id: Option<String>,

    /// Field data, in insertion order.
    pub fields: Vec<Field>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: None,
            fields: Vec::new(),
        }
    }

    /// Create a new document with a specific ID.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Vec::new(),
        }
    }

    /// Add a field to the document.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Get a field's value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A document whose deduplication hash has been assigned.
///
/// The hash is computed exactly once, at ingestion time, from the configured
/// primary-key field (or a generated unique value). Downstream pipeline
/// stages receive the document through this wrapper and never re-hash it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashedDocument {
    pub hash: u64,
    pub document: Document,
}

impl HashedDocument {
    pub fn new(hash: u64, document: Document) -> Self {
        Self { hash, document }
    }
}

/// A persisted record of one accepted document's primary-key hash.
///
/// One record is appended per accepted document; future commits and readers
/// use these to detect pre-existing primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocHash(pub u64);

// Fixed seeds so the persisted hash is stable across processes. Hashes are
// only ever compared against hashes produced by the same crate version.
const HASH_SEEDS: (u64, u64, u64, u64) = (
    0x5379_6c76_6120_5072,
    0x696d_6172_794b_6579,
    0x9e37_79b9_7f4a_7c15,
    0xc2b2_ae3d_27d4_eb4f,
);

/// Compute the deterministic 64-bit primary-key hash of a field value.
pub fn primary_key_hash(value: &str) -> u64 {
    let state =
        ahash::RandomState::with_seeds(HASH_SEEDS.0, HASH_SEEDS.1, HASH_SEEDS.2, HASH_SEEDS.3);
    state.hash_one(value)
}

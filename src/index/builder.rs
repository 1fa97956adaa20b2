//! Thread-safe construction of the per-field trie set.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};

use crate::analysis::WordInfo;
use crate::error::{Result, SylvaError};
use crate::index::trie::TermTrie;

/// Owns the per-field term tries while a commit populates them.
///
/// `add` may be called concurrently from any number of producers: the field
/// map is guarded by an [`RwLock`] and each field's trie by its own
/// [`Mutex`], so callers touching distinct fields never contend and
/// concurrent insertions into the same field serialize without lost updates.
///
/// `complete_adding` consumes the builder, so insertion after finalize is
/// unrepresentable.
#[derive(Debug, Default)]
pub struct TrieBuilder {
    tries: RwLock<AHashMap<String, Arc<Mutex<TermTrie>>>>,
}

impl TrieBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one field's analyzed words into that field's trie, creating
    /// the trie on first use.
    pub fn add(&self, field: &str, words: &[WordInfo]) {
        if words.is_empty() {
            return;
        }

        let trie = {
            let tries = self.tries.read();
            tries.get(field).cloned()
        };
        let trie = match trie {
            Some(trie) => trie,
            None => {
                let mut tries = self.tries.write();
                tries
                    .entry(field.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(TermTrie::new())))
                    .clone()
            }
        };

        trie.lock().insert_words(words);
    }

    /// Number of fields with at least one indexed term.
    pub fn field_count(&self) -> usize {
        self.tries.read().len()
    }

    /// Signal that no further insertions will arrive and yield the completed
    /// tries, keyed by field name. The returned tries are structurally
    /// frozen; only the write-once postings addresses on terminal nodes may
    /// still be assigned.
    pub fn complete_adding(self) -> Result<AHashMap<String, TermTrie>> {
        let tries = self.tries.into_inner();
        tries
            .into_iter()
            .map(|(field, trie)| {
                let trie = Arc::try_unwrap(trie)
                    .map_err(|_| {
                        SylvaError::index(format!(
                            "trie for field '{field}' still shared at finalize"
                        ))
                    })?
                    .into_inner();
                Ok((field, trie))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Posting;

    fn word(word: &str, doc: u64) -> WordInfo {
        let mut posting = Posting::new(doc);
        posting.record(0);
        WordInfo {
            word: word.to_string(),
            posting,
        }
    }

    #[test]
    fn test_tries_created_per_field() -> Result<()> {
        let builder = TrieBuilder::new();
        builder.add("title", &[word("fox", 1)]);
        builder.add("body", &[word("dog", 1)]);
        builder.add("title", &[word("box", 2)]);

        let tries = builder.complete_adding()?;
        assert_eq!(tries.len(), 2);
        assert_eq!(tries["title"].word_count(), 2);
        assert_eq!(tries["body"].word_count(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_word_list_creates_no_trie() -> Result<()> {
        let builder = TrieBuilder::new();
        builder.add("title", &[]);
        assert_eq!(builder.field_count(), 0);
        assert!(builder.complete_adding()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_concurrent_adds_lose_nothing() -> Result<()> {
        let builder = TrieBuilder::new();

        std::thread::scope(|s| {
            for t in 0..4 {
                let builder = &builder;
                s.spawn(move || {
                    for i in 0..100 {
                        builder.add("shared", &[word(&format!("w{t}x{i}"), 1)]);
                        builder.add(&format!("own{t}"), &[word("solo", 1)]);
                    }
                });
            }
        });

        let tries = builder.complete_adding()?;
        assert_eq!(tries["shared"].word_count(), 400);
        for t in 0..4 {
            assert_eq!(tries[&format!("own{t}")].word_count(), 1);
        }
        Ok(())
    }
}

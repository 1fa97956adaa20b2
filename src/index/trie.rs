//! Per-field term trie.
//!
//! Terms of one field accumulate in an ordered prefix tree with one node per
//! character, stored left-child/right-sibling. Nodes live in an
//! index-addressed arena, so the tree has no owned links to cycle through and
//! per-field serialization stays trivially data-parallel.
//!
//! After the builder finalizes a trie, its structure is read-only; the only
//! later mutation is the write-once postings address a terminal node receives
//! when its postings list has been written out.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::analysis::{Posting, WordInfo};
use crate::block::BlockInfo;
use crate::error::{Result, SylvaError};

/// One node of the trie: a character plus arena links.
#[derive(Debug, Default)]
pub struct TrieNode {
    ch: char,
    child: Option<u32>,
    sibling: Option<u32>,
    word_end: bool,
    postings: Vec<Posting>,
    postings_address: OnceLock<BlockInfo>,
}

impl TrieNode {
    /// The character this node carries.
    pub fn ch(&self) -> char {
        self.ch
    }

    /// Whether this node terminates a complete word.
    pub fn is_word_end(&self) -> bool {
        self.word_end
    }

    /// The postings accumulated for the word ending at this node.
    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// The address of this node's serialized postings list, once written.
    pub fn postings_address(&self) -> Option<BlockInfo> {
        self.postings_address.get().copied()
    }

    /// Record the address of this node's serialized postings list.
    ///
    /// The address is written exactly once, by the postings-writer stage.
    pub fn set_postings_address(&self, address: BlockInfo) -> Result<()> {
        self.postings_address
            .set(address)
            .map_err(|_| SylvaError::index("postings address already assigned"))
    }
}

/// An ordered prefix tree accumulating one field's terms and postings.
#[derive(Debug)]
pub struct TermTrie {
    // nodes[0] is a root sentinel; its child is the first top-level character.
    nodes: Vec<TrieNode>,
    words: u64,
}

impl Default for TermTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl TermTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            words: 0,
        }
    }

    /// Number of distinct complete words in the trie.
    pub fn word_count(&self) -> u64 {
        self.words
    }

    /// Number of arena nodes, including the root sentinel.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert `word`, merging `postings` into its terminal node.
    pub fn insert(&mut self, word: &str, postings: &[Posting]) {
        if word.is_empty() {
            return;
        }

        let mut current = 0u32;
        for ch in word.chars() {
            current = self.child_or_insert(current, ch);
        }

        let node = &mut self.nodes[current as usize];
        if !node.word_end {
            node.word_end = true;
            self.words += 1;
        }
        node.postings.extend_from_slice(postings);
    }

    /// Insert every word of an analyzed field.
    pub fn insert_words(&mut self, words: &[WordInfo]) {
        for info in words {
            self.insert(&info.word, std::slice::from_ref(&info.posting));
        }
    }

    // Find `ch` among the children of `parent`, inserting a new node in
    // character order if absent. Sorted sibling chains make every traversal
    // of the trie lexicographic.
    fn child_or_insert(&mut self, parent: u32, ch: char) -> u32 {
        let mut prev: Option<u32> = None;
        let mut cursor = self.nodes[parent as usize].child;

        while let Some(idx) = cursor {
            let node = &self.nodes[idx as usize];
            if node.ch == ch {
                return idx;
            }
            if node.ch > ch {
                break;
            }
            prev = Some(idx);
            cursor = node.sibling;
        }

        let new_idx = self.nodes.len() as u32;
        self.nodes.push(TrieNode {
            ch,
            child: None,
            sibling: cursor,
            word_end: false,
            postings: Vec::new(),
            postings_address: OnceLock::new(),
        });

        match prev {
            Some(prev_idx) => self.nodes[prev_idx as usize].sibling = Some(new_idx),
            None => self.nodes[parent as usize].child = Some(new_idx),
        }
        new_idx
    }

    /// Enumerate every terminal (end-of-word) node exactly once, in
    /// lexicographic word order.
    pub fn end_of_word_nodes(&self) -> EndOfWordNodes<'_> {
        EndOfWordNodes {
            trie: self,
            stack: self.nodes[0].child.map(|c| vec![c]).unwrap_or_default(),
        }
    }

    /// Enumerate every complete word, in lexicographic order.
    ///
    /// Intended for diagnostics; postings stay on the nodes.
    pub fn words(&self) -> Words<'_> {
        Words {
            trie: self,
            stack: self.nodes[0]
                .child
                .map(|c| vec![(c, 0usize)])
                .unwrap_or_default(),
            prefix: Vec::new(),
        }
    }

    /// Snapshot the trie structure into its serializable record form.
    ///
    /// The record carries structure and postings only, not postings
    /// addresses: those are produced concurrently by the postings pass and
    /// are recoverable from the deterministic enumeration order.
    pub fn to_record(&self) -> TrieRecord {
        TrieRecord {
            nodes: self
                .nodes
                .iter()
                .map(|n| TrieNodeRecord {
                    ch: n.ch,
                    child: n.child,
                    sibling: n.sibling,
                    word_end: n.word_end,
                })
                .collect(),
            words: self.words,
        }
    }

    /// Rebuild a trie from its record form. Postings are not restored; they
    /// live in the postings file.
    pub fn from_record(record: TrieRecord) -> Result<Self> {
        if record.nodes.is_empty() {
            return Err(SylvaError::serialization("trie record has no root node"));
        }
        let node_count = record.nodes.len() as u32;
        let nodes = record
            .nodes
            .into_iter()
            .map(|n| {
                if n.child.is_some_and(|c| c >= node_count)
                    || n.sibling.is_some_and(|s| s >= node_count)
                {
                    return Err(SylvaError::serialization("trie record link out of range"));
                }
                Ok(TrieNode {
                    ch: n.ch,
                    child: n.child,
                    sibling: n.sibling,
                    word_end: n.word_end,
                    postings: Vec::new(),
                    postings_address: OnceLock::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            nodes,
            words: record.words,
        })
    }
}

/// Serializable structure-only form of a [`TermTrie`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrieRecord {
    nodes: Vec<TrieNodeRecord>,
    words: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrieNodeRecord {
    ch: char,
    child: Option<u32>,
    sibling: Option<u32>,
    word_end: bool,
}

/// Depth-first iterator over terminal nodes.
pub struct EndOfWordNodes<'a> {
    trie: &'a TermTrie,
    stack: Vec<u32>,
}

impl<'a> Iterator for EndOfWordNodes<'a> {
    type Item = &'a TrieNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.stack.pop() {
            let node = &self.trie.nodes[idx as usize];
            // Sibling below child on the stack keeps traversal lexicographic.
            if let Some(sibling) = node.sibling {
                self.stack.push(sibling);
            }
            if let Some(child) = node.child {
                self.stack.push(child);
            }
            if node.word_end {
                return Some(node);
            }
        }
        None
    }
}

/// Depth-first iterator over complete words.
pub struct Words<'a> {
    trie: &'a TermTrie,
    stack: Vec<(u32, usize)>,
    prefix: Vec<char>,
}

impl Iterator for Words<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, depth)) = self.stack.pop() {
            let node = &self.trie.nodes[idx as usize];
            self.prefix.truncate(depth);
            self.prefix.push(node.ch);

            if let Some(sibling) = node.sibling {
                self.stack.push((sibling, depth));
            }
            if let Some(child) = node.child {
                self.stack.push((child, depth + 1));
            }
            if node.word_end {
                return Some(self.prefix.iter().collect());
            }
        }
        None
    }
}

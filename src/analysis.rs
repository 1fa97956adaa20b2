//! Text analysis port and the default analyzer.
//!
//! Analysis turns one document into field-grouped terms with postings. The
//! commit pipeline treats posting contents as opaque: whatever the analyzer
//! produces is what gets merged into the term tries and written to the
//! postings file.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::data::HashedDocument;
use crate::error::Result;

/// Per-term, per-document occurrence data produced by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Hash of the document this occurrence belongs to.
    pub doc: u64,
    /// Number of occurrences of the term in the field.
    pub frequency: u32,
    /// Token positions of the occurrences within the field.
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc: u64) -> Self {
        Self {
            doc,
            frequency: 0,
            positions: Vec::new(),
        }
    }

    /// Record one occurrence at `position`.
    pub fn record(&mut self, position: u32) {
        self.frequency += 1;
        self.positions.push(position);
    }
}

/// One analyzed term of one field: the token plus its posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordInfo {
    pub word: String,
    pub posting: Posting,
}

/// The result of analyzing one document: terms grouped by field name.
#[derive(Debug, Clone, Default)]
pub struct AnalyzedDocument {
    pub fields: AHashMap<String, Vec<WordInfo>>,
}

/// Turns a document into field-grouped scored terms.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, doc: &HashedDocument) -> Result<AnalyzedDocument>;

    /// Human-readable analyzer name for diagnostics.
    fn name(&self) -> &str;
}

/// Default analyzer: lowercases and splits on non-alphanumeric characters,
/// accumulating frequency and token positions per unique term.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardAnalyzer;

impl StandardAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(|token| token.to_lowercase())
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, doc: &HashedDocument) -> Result<AnalyzedDocument> {
        let mut fields: AHashMap<String, Vec<WordInfo>> = AHashMap::new();

        for field in &doc.document.fields {
            let mut by_word: AHashMap<String, Posting> = AHashMap::new();
            let mut order: Vec<String> = Vec::new();

            for (position, word) in Self::tokenize(&field.value).enumerate() {
                let posting = by_word.entry(word.clone()).or_insert_with(|| {
                    order.push(word);
                    Posting::new(doc.hash)
                });
                posting.record(position as u32);
            }

            let words: Vec<WordInfo> = order
                .into_iter()
                .map(|word| {
                    let posting = by_word[&word].clone();
                    WordInfo { word, posting }
                })
                .collect();

            // A document may repeat a field name; terms of repeated fields
            // accumulate under the same key.
            fields.entry(field.name.clone()).or_default().extend(words);
        }

        Ok(AnalyzedDocument { fields })
    }

    fn name(&self) -> &str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Document;

    fn analyze(text: &str) -> AnalyzedDocument {
        let doc = HashedDocument::new(7, Document::new().field("body", text));
        StandardAnalyzer::new().analyze(&doc).unwrap()
    }

    #[test]
    fn test_lowercases_and_splits() {
        let analyzed = analyze("The quick-brown FOX");
        let words: Vec<_> = analyzed.fields["body"]
            .iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(words, vec!["the", "quick", "brown", "fox"]);
    }

    #[test]
    fn test_frequency_and_positions() {
        let analyzed = analyze("to be or not to be");
        let to = analyzed.fields["body"]
            .iter()
            .find(|w| w.word == "to")
            .unwrap();
        assert_eq!(to.posting.frequency, 2);
        assert_eq!(to.posting.positions, vec![0, 4]);
        assert_eq!(to.posting.doc, 7);
    }

    #[test]
    fn test_repeated_field_accumulates() {
        let doc = HashedDocument::new(
            1,
            Document::new().field("tags", "red").field("tags", "blue"),
        );
        let analyzed = StandardAnalyzer::new().analyze(&doc).unwrap();
        let words: Vec<_> = analyzed.fields["tags"]
            .iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(words, vec!["red", "blue"]);
    }
}

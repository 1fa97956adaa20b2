//! Query term model.
//!
//! A [`QueryTerm`] is the normalized description of one query clause that
//! the matching engine consumes. The field and value are fixed at
//! construction; the boolean/prefix/fuzzy modifiers stay adjustable, with
//! the edit-distance rules enforced by the setters so a term can never claim
//! fuzziness with a zero edit budget.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default edit-distance budget for fuzzy terms (Levenshtein distance).
pub const DEFAULT_EDITS: u32 = 2;

/// One normalized query clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTerm {
    field: String,
    value: String,
    and: bool,
    not: bool,
    prefix: bool,
    fuzzy: bool,
    edits: u32,
}

impl QueryTerm {
    /// Create a term matching `value` in `field`, with no modifiers set
    /// (an optional, exact-match clause).
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            and: false,
            not: false,
            prefix: false,
            fuzzy: false,
            edits: DEFAULT_EDITS,
        }
    }

    /// The field this term matches against.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The term value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this term is required (AND semantics).
    pub fn is_and(&self) -> bool {
        self.and
    }

    /// Whether this term is excluded (NOT semantics).
    pub fn is_not(&self) -> bool {
        self.not
    }

    /// Whether this term matches by prefix.
    pub fn is_prefix(&self) -> bool {
        self.prefix
    }

    /// Whether this term matches fuzzily.
    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    /// The edit-distance budget for fuzzy matching.
    pub fn edits(&self) -> u32 {
        self.edits
    }

    /// Mark the term required.
    pub fn set_and(&mut self, and: bool) -> &mut Self {
        self.and = and;
        self
    }

    /// Mark the term excluded. Exclusion wins over requirement when both
    /// are set.
    pub fn set_not(&mut self, not: bool) -> &mut Self {
        self.not = not;
        self
    }

    /// Enable or disable prefix matching.
    pub fn set_prefix(&mut self, prefix: bool) -> &mut Self {
        self.prefix = prefix;
        self
    }

    /// Enable or disable fuzzy matching.
    ///
    /// Enabling fuzziness with a zero edit budget leaves the term exact: a
    /// fuzzy term tolerating zero edits degrades to an exact match.
    pub fn set_fuzzy(&mut self, fuzzy: bool) -> &mut Self {
        self.fuzzy = fuzzy && self.edits > 0;
        self
    }

    /// Set the edit-distance budget. A budget of zero clears the fuzzy flag.
    pub fn set_edits(&mut self, edits: u32) -> &mut Self {
        self.edits = edits;
        if edits == 0 {
            self.fuzzy = false;
        }
        self
    }

    /// Derive the edit budget from a similarity ratio in `[0, 1]`:
    /// `edits = floor(len(value) × (1 − ratio))`, measured in characters at
    /// the time of the call. Similarity is write-only; only the derived
    /// budget is stored. A derived budget of zero clears the fuzzy flag.
    pub fn set_similarity(&mut self, ratio: f64) -> &mut Self {
        let ratio = ratio.clamp(0.0, 1.0);
        let len = self.value.chars().count() as f64;
        self.set_edits((len * (1.0 - ratio)).floor() as u32)
    }
}

impl fmt::Display for QueryTerm {
    /// Renders `+`/`-` for required/excluded, then `field:value`, then `*`
    /// for prefix or `~` for fuzzy.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.not {
            write!(f, "-")?;
        } else if self.and {
            write!(f, "+")?;
        }
        write!(f, "{}:{}", self.field, self.value)?;
        if self.prefix {
            write!(f, "*")?;
        } else if self.fuzzy {
            write!(f, "~")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_term_renders_bare() {
        let term = QueryTerm::new("title", "fox");
        assert_eq!(term.to_string(), "title:fox");
    }

    #[test]
    fn test_fuzzy_rendering_and_zero_edits() {
        let mut term = QueryTerm::new("title", "fox");
        term.set_fuzzy(true).set_edits(2);
        assert_eq!(term.to_string(), "title:fox~");

        term.set_edits(0);
        assert!(!term.is_fuzzy());
        assert_eq!(term.to_string(), "title:fox");
    }

    #[test]
    fn test_fuzzy_with_zero_budget_stays_exact() {
        let mut term = QueryTerm::new("title", "fox");
        term.set_edits(0).set_fuzzy(true);
        assert!(!term.is_fuzzy());
    }

    #[test]
    fn test_similarity_derives_edits() {
        let mut term = QueryTerm::new("body", "abcdefgh");
        term.set_fuzzy(true).set_similarity(0.5);
        assert_eq!(term.edits(), 4);
        assert!(term.is_fuzzy());
    }

    #[test]
    fn test_similarity_of_one_clears_fuzzy() {
        let mut term = QueryTerm::new("body", "abcdefgh");
        term.set_fuzzy(true).set_similarity(1.0);
        assert_eq!(term.edits(), 0);
        assert!(!term.is_fuzzy());
    }

    #[test]
    fn test_boolean_prefixes() {
        let mut required = QueryTerm::new("title", "fox");
        required.set_and(true);
        assert_eq!(required.to_string(), "+title:fox");

        let mut excluded = QueryTerm::new("title", "fox");
        excluded.set_not(true).set_and(true);
        assert_eq!(excluded.to_string(), "-title:fox");
    }

    #[test]
    fn test_prefix_suffix() {
        let mut term = QueryTerm::new("title", "fo");
        term.set_prefix(true);
        assert_eq!(term.to_string(), "title:fo*");
    }

    #[test]
    fn test_value_reassignment_is_not_retroactive() {
        // Similarity derives from the value length at assignment time; the
        // field/value pair is immutable, so no later mutation can skew it.
        let mut term = QueryTerm::new("body", "abcd");
        term.set_similarity(0.5);
        assert_eq!(term.edits(), 2);
    }
}

//! Phrase trie
//!
//! Word-level prefix tree mapping normalized vocabulary phrases to canonical
//! names. Nodes live in an arena (`Vec<TrieNode>`) and refer to their
//! children by index, so ownership runs strictly from parent to child and the
//! whole structure serializes flat.
//!
//! ```text
//! university ── of ── california ─┬─ san ─┬─ diego      {University of California, San Diego}
//!                                  │       └─ francisco  {University of California, San Francisco}
//!                                  └─ berkeley           {University of California, Berkeley}
//! ```
//!
//! A node may be terminal and still have children: "university of
//! california" can resolve on its own and also prefix the campus names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pubmine_core::{PubmineError, Result, VocabularyEntry};

use crate::text::normalize_phrase;

const ROOT: usize = 0;

// ============================================================================
// Nodes
// ============================================================================

/// One trie node: outgoing edges plus the canonical names ending here
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieNode {
    /// Normalized word token -> child index
    #[serde(default)]
    children: HashMap<String, usize>,
    /// Canonical names in insertion order
    #[serde(default)]
    values: Vec<String>,
}

impl TrieNode {
    /// Whether a phrase ends at this node
    pub fn is_terminal(&self) -> bool {
        !self.values.is_empty()
    }

    /// Canonical names ending at this node, first inserted first
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Result of a sliding-window match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMatch<'a> {
    /// Number of tokens covered by the longest terminal match (at least 1)
    pub consumed: usize,
    /// First canonical name stored on the matched node
    pub canonical: &'a str,
}

// ============================================================================
// Trie
// ============================================================================

/// Immutable-after-build phrase trie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trie {
    nodes: Vec<TrieNode>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// Create a trie holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    /// Build a trie from vocabulary entries
    ///
    /// Entries with phrases that normalize to nothing are logged and skipped;
    /// the rest of the vocabulary is still inserted.
    pub fn build(entries: &[VocabularyEntry]) -> Self {
        let mut builder = TrieBuilder::new();
        for entry in entries {
            builder.add_entry(entry);
        }
        let stats = builder.stats();
        info!(
            entries = stats.entries,
            phrases = stats.phrases,
            skipped = stats.skipped,
            nodes = builder.trie.node_count(),
            "built phrase trie"
        );
        builder.finish()
    }

    /// Insert an already-normalized token sequence
    ///
    /// Returns `false` when nothing was added: the sequence is empty or
    /// `value` is already stored for it.
    pub fn insert<S: AsRef<str>>(&mut self, tokens: &[S], value: &str) -> bool {
        if tokens.is_empty() {
            return false;
        }

        let mut node = ROOT;
        for token in tokens {
            let token = token.as_ref();
            node = match self.nodes[node].children.get(token) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(token.to_string(), child);
                    child
                }
            };
        }

        let values = &mut self.nodes[node].values;
        if values.iter().any(|v| v == value) {
            return false;
        }
        values.push(value.to_string());
        true
    }

    /// Normalize `phrase` and insert it with `canonical` as terminal value
    pub fn insert_phrase(&mut self, phrase: &str, canonical: &str) -> Result<bool> {
        let tokens = normalize_phrase(phrase);
        if tokens.is_empty() {
            return Err(PubmineError::InvalidEntry {
                name: canonical.to_string(),
                phrase: phrase.to_string(),
            });
        }
        Ok(self.insert(&tokens, canonical))
    }

    /// Longest terminal prefix of `tokens`
    ///
    /// Tokens must already be lowercase. When several canonical names share
    /// the matched phrase, the first inserted one is returned.
    pub fn longest_match<S: AsRef<str>>(&self, tokens: &[S]) -> Option<&str> {
        self.longest_match_over_window(tokens, 0).map(|m| m.canonical)
    }

    /// Longest terminal match starting at `tokens[start]`
    ///
    /// Reports how many tokens the match covered so callers can skip past it.
    pub fn longest_match_over_window<S: AsRef<str>>(
        &self,
        tokens: &[S],
        start: usize,
    ) -> Option<WindowMatch<'_>> {
        let (consumed, node) = self.walk(tokens.get(start..)?)?;
        Some(WindowMatch {
            consumed,
            canonical: self.nodes[node].values.first()?.as_str(),
        })
    }

    /// All canonical names stored for exactly this token sequence
    ///
    /// Empty when the sequence is not a complete phrase.
    pub fn values_for<S: AsRef<str>>(&self, tokens: &[S]) -> &[String] {
        let mut node = ROOT;
        for token in tokens {
            match self.nodes[node].children.get(token.as_ref()) {
                Some(&child) => node = child,
                None => return &[],
            }
        }
        if node == ROOT {
            return &[];
        }
        &self.nodes[node].values
    }

    /// Descend from the root, remembering the deepest terminal node seen
    fn walk<S: AsRef<str>>(&self, tokens: &[S]) -> Option<(usize, usize)> {
        let mut node = ROOT;
        let mut best = None;

        for (depth, token) in tokens.iter().enumerate() {
            match self.nodes[node].children.get(token.as_ref()) {
                Some(&child) => node = child,
                None => break,
            }
            if self.nodes[node].is_terminal() {
                best = Some((depth + 1, node));
            }
        }

        best
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct phrases (terminal nodes)
    pub fn phrase_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_terminal()).count()
    }

    /// Whether no phrase has been inserted
    pub fn is_empty(&self) -> bool {
        self.phrase_count() == 0
    }

    /// Check arena consistency after deserialization
    ///
    /// Every child index must be in range, the root must never be a child
    /// and no node may have two parents.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("trie has no root node".to_string());
        }

        let mut parents = vec![0usize; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            for (token, &child) in &node.children {
                if token.is_empty() {
                    return Err(format!("node {index} has an empty edge label"));
                }
                if child == ROOT || child >= self.nodes.len() {
                    return Err(format!("node {index} points to invalid child {child}"));
                }
                parents[child] += 1;
                if parents[child] > 1 {
                    return Err(format!("node {child} has more than one parent"));
                }
            }
        }

        Ok(())
    }

    /// Serialize to the JSON form used by the trie cache
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize and validate a trie produced by [`Trie::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let trie: Trie = serde_json::from_str(json)?;
        trie.validate().map_err(PubmineError::InvalidTrie)?;
        Ok(trie)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Counters collected while building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Vocabulary entries processed
    pub entries: usize,
    /// Phrases (names and aliases) inserted
    pub phrases: usize,
    /// Phrases rejected as empty
    pub skipped: usize,
}

/// Incremental trie construction with per-phrase error recovery
#[derive(Debug, Default)]
pub struct TrieBuilder {
    trie: Trie,
    stats: BuildStats,
}

impl TrieBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a canonical name and all its aliases
    pub fn add_entry(&mut self, entry: &VocabularyEntry) {
        self.stats.entries += 1;
        for phrase in entry.phrases() {
            match self.trie.insert_phrase(phrase, &entry.name) {
                Ok(_) => self.stats.phrases += 1,
                Err(e) => {
                    warn!("Skipping vocabulary phrase: {}", e);
                    self.stats.skipped += 1;
                }
            }
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn finish(self) -> Trie {
        self.trie
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn uc_vocabulary() -> Vec<VocabularyEntry> {
        vec![
            VocabularyEntry::new("University of California").with_alias("UC"),
            VocabularyEntry::new("University of California, San Diego").with_alias("UCSD"),
            VocabularyEntry::new("University of California, Berkeley")
                .with_alias("UC Berkeley")
                .with_alias("Cal"),
            VocabularyEntry::new("University of Pennsylvania").with_alias("UPenn"),
        ]
    }

    #[test]
    fn test_longest_match_prefers_longer_phrase() {
        let trie = Trie::build(&uc_vocabulary());

        let tokens = ["university", "of", "california", "san", "diego"];
        assert_eq!(
            trie.longest_match(&tokens),
            Some("University of California, San Diego")
        );

        let tokens = ["university", "of", "california", "los", "angeles"];
        assert_eq!(trie.longest_match(&tokens), Some("University of California"));
    }

    #[test]
    fn test_longest_match_no_match() {
        let trie = Trie::build(&uc_vocabulary());

        assert_eq!(trie.longest_match(&["university", "of"]), None);
        assert_eq!(trie.longest_match(&["stanford"]), None);
        assert_eq!(trie.longest_match::<&str>(&[]), None);
    }

    #[test]
    fn test_window_match_reports_consumed() {
        let trie = Trie::build(&uc_vocabulary());
        let tokens = ["at", "uc", "berkeley", "and", "ucsd"];

        let m = trie.longest_match_over_window(&tokens, 1).unwrap();
        assert_eq!(m.consumed, 2);
        assert_eq!(m.canonical, "University of California, Berkeley");

        let m = trie.longest_match_over_window(&tokens, 4).unwrap();
        assert_eq!(m.consumed, 1);
        assert_eq!(m.canonical, "University of California, San Diego");

        assert!(trie.longest_match_over_window(&tokens, 0).is_none());
        assert!(trie.longest_match_over_window(&tokens, 5).is_none());
        assert!(trie.longest_match_over_window(&tokens, 99).is_none());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut trie = Trie::new();
        assert!(trie.insert(&["national", "science", "foundation"], "NSF"));
        let nodes = trie.node_count();
        assert!(!trie.insert(&["national", "science", "foundation"], "NSF"));
        assert_eq!(trie.node_count(), nodes);
        assert_eq!(trie.values_for(&["national", "science", "foundation"]).len(), 1);
    }

    #[test]
    fn test_ambiguous_alias_first_wins() {
        let entries = vec![
            VocabularyEntry::new("Medical Research Council").with_alias("MRC"),
            VocabularyEntry::new("Medical Research Council of Canada").with_alias("MRC"),
        ];
        let trie = Trie::build(&entries);

        assert_eq!(trie.longest_match(&["mrc"]), Some("Medical Research Council"));
        assert_eq!(
            trie.values_for(&["mrc"]),
            &[
                "Medical Research Council".to_string(),
                "Medical Research Council of Canada".to_string()
            ]
        );
    }

    #[test]
    fn test_empty_phrase_is_skipped() {
        let entries = vec![VocabularyEntry::new("Wellcome Trust")
            .with_alias(" , ")
            .with_alias("Wellcome")];

        let mut builder = TrieBuilder::new();
        for entry in &entries {
            builder.add_entry(entry);
        }
        let stats = builder.stats();
        assert_eq!(stats.phrases, 2);
        assert_eq!(stats.skipped, 1);

        let trie = builder.finish();
        assert_eq!(trie.longest_match(&["wellcome"]), Some("Wellcome Trust"));
    }

    #[test]
    fn test_insert_phrase_rejects_empty() {
        let mut trie = Trie::new();
        let err = trie.insert_phrase("--", "Dash Institute").unwrap_err();
        assert!(matches!(err, PubmineError::InvalidEntry { .. }));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let trie = Trie::build(&uc_vocabulary());
        let restored = Trie::from_json(&trie.to_json().unwrap()).unwrap();

        assert_eq!(restored, trie);
        assert_eq!(restored.phrase_count(), trie.phrase_count());
    }

    #[test]
    fn test_validate_rejects_bad_child() {
        let json = r#"{"nodes":[{"children":{"nih":7},"values":[]}]}"#;
        assert!(Trie::from_json(json).is_err());

        let json = r#"{"nodes":[{"children":{"a":1,"b":1},"values":[]},{"values":["A"]}]}"#;
        assert!(Trie::from_json(json).is_err());

        let json = r#"{"nodes":[]}"#;
        assert!(Trie::from_json(json).is_err());
    }
}

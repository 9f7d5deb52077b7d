//! Funding extraction
//!
//! Pairs grant numbers with the funding agency mentioned closest to them in
//! an acknowledgment / funding section:
//!
//! 1. Skip sentences before the first one mentioning a trigger word
//! 2. Scan the remaining sentences for agency phrases (trie) and grant numbers
//! 3. Give each grant its nearest agency within the distance threshold
//! 4. Drop grantless mentions of agencies that were paired elsewhere
//!
//! Token positions run on across sentence boundaries, so a grant split off
//! by an abbreviation ("Grant No. DBI-1234567") still reaches its agency.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use pubmine_core::{FundingConfig, FundingPair, GRANT_NOT_FOUND};

use crate::grant::extract_grant_number;
use crate::text::{is_stop_word, lowercase_all, split_sentences, word_tokens};
use crate::trie::Trie;

/// Default maximum token distance between a grant and its agency
pub const DEFAULT_DISTANCE_THRESHOLD: usize = 4;

/// Default words marking the start of the funding-relevant text
pub const DEFAULT_TRIGGER_WORDS: [&str; 5] = ["funds", "grant", "sponsor", "funding", "funded"];

// ============================================================================
// Candidates
// ============================================================================

/// Agency mention found while scanning a sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgencyCandidate {
    pub agency: String,
    /// Index of the last token covered by the match
    pub position: usize,
}

/// Grant number found while scanning a sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantCandidate {
    pub grant: String,
    pub position: usize,
}

/// Candidates of a funding region, in scan order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingCandidates {
    pub agencies: Vec<AgencyCandidate>,
    pub grants: Vec<GrantCandidate>,
}

impl FundingCandidates {
    /// Append `other`, shifting its positions by `offset`
    fn extend_shifted(&mut self, other: FundingCandidates, offset: usize) {
        self.agencies
            .extend(other.agencies.into_iter().map(|a| AgencyCandidate {
                position: a.position + offset,
                ..a
            }));
        self.grants
            .extend(other.grants.into_iter().map(|g| GrantCandidate {
                position: g.position + offset,
                ..g
            }));
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Proximity-based (agency, grant) pairing over free text
#[derive(Debug, Clone)]
pub struct FundingExtractor {
    /// Lowercase trigger words
    trigger_words: Vec<String>,
    distance_threshold: usize,
}

impl Default for FundingExtractor {
    fn default() -> Self {
        Self {
            trigger_words: DEFAULT_TRIGGER_WORDS.iter().map(|w| w.to_string()).collect(),
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
        }
    }
}

impl FundingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from configuration
    pub fn from_config(config: &FundingConfig) -> Self {
        Self::default()
            .with_trigger_words(config.trigger_words.iter().map(String::as_str))
            .with_distance_threshold(config.distance_threshold)
    }

    /// Replace the trigger words
    pub fn with_trigger_words<'a>(mut self, words: impl IntoIterator<Item = &'a str>) -> Self {
        self.trigger_words = words.into_iter().map(|w| w.to_lowercase()).collect();
        self
    }

    /// Set the maximum grant-to-agency token distance
    pub fn with_distance_threshold(mut self, threshold: usize) -> Self {
        self.distance_threshold = threshold;
        self
    }

    pub fn distance_threshold(&self) -> usize {
        self.distance_threshold
    }

    /// Extract deduplicated (agency, grant) pairs from `text`
    pub fn extract(&self, text: &str, trie: &Trie) -> BTreeSet<FundingPair> {
        let sentences = self.funding_sentences(text);
        let candidates = scan_region(&sentences, trie);

        let result = suppress_grantless(self.pair(&candidates));
        debug!(
            sentences = sentences.len(),
            agencies = candidates.agencies.len(),
            grants = candidates.grants.len(),
            pairs = result.len(),
            "extracted funding pairs"
        );
        result
    }

    /// Sentences from the first trigger-word sentence to the end
    ///
    /// Without any trigger sentence every sentence is kept.
    pub fn funding_sentences<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let sentences = split_sentences(text);
        let start = sentences
            .iter()
            .position(|s| self.is_trigger_sentence(s))
            .unwrap_or(0);
        sentences[start..].to_vec()
    }

    fn is_trigger_sentence(&self, sentence: &str) -> bool {
        let lower = sentence.to_lowercase();
        self.trigger_words.iter().any(|w| lower.contains(w.as_str()))
    }

    /// Pair the candidates of a funding region
    ///
    /// Each grant takes the nearest agency; on equal distance the agency seen
    /// first wins. Grants with no agency within the threshold are reported
    /// with the agency sentinel. Agencies are only reported grantless when
    /// the region has no grant at all.
    pub fn pair(&self, candidates: &FundingCandidates) -> Vec<FundingPair> {
        if candidates.grants.is_empty() {
            return candidates
                .agencies
                .iter()
                .map(|a| FundingPair::grant_not_found(&a.agency))
                .collect();
        }

        candidates
            .grants
            .iter()
            .map(|grant| {
                let nearest = candidates
                    .agencies
                    .iter()
                    .map(|a| (a.position.abs_diff(grant.position), a))
                    .min_by_key(|(distance, _)| *distance);

                match nearest {
                    Some((distance, agency)) if distance <= self.distance_threshold => {
                        FundingPair::new(&agency.agency, &grant.grant)
                    }
                    _ => FundingPair::agency_not_found(&grant.grant),
                }
            })
            .collect()
    }
}

/// Extract funding pairs with the default trigger words and threshold
pub fn extract_funding(text: &str, trie: &Trie) -> BTreeSet<FundingPair> {
    FundingExtractor::default().extract(text, trie)
}

/// Collect candidates from consecutive sentences
///
/// Positions count tokens from the start of the first sentence.
pub fn scan_region<S: AsRef<str>>(sentences: &[S], trie: &Trie) -> FundingCandidates {
    let mut candidates = FundingCandidates::default();
    let mut offset = 0;

    for sentence in sentences {
        let tokens = word_tokens(sentence.as_ref());
        candidates.extend_shifted(scan_sentence(&tokens, trie), offset);
        offset += tokens.len();
    }

    candidates
}

/// Collect agency and grant candidates from one sentence's tokens
///
/// At every index not already covered by an agency phrase, an agency match
/// is tried first and a grant number second. A match starting on a stop word
/// is ignored. Multi-token matches report the canonical name at the position
/// of their last token; single-token matches report the token as written.
pub fn scan_sentence<S: AsRef<str>>(tokens: &[S], trie: &Trie) -> FundingCandidates {
    let lowered = lowercase_all(tokens);
    let mut candidates = FundingCandidates::default();

    let mut i = 0;
    while i < tokens.len() {
        if let Some(m) = trie.longest_match_over_window(&lowered, i) {
            if !is_stop_word(&lowered[i]) {
                let last = i + m.consumed - 1;
                let agency = if m.consumed == 1 {
                    tokens[i].as_ref().to_string()
                } else {
                    m.canonical.to_string()
                };
                candidates.agencies.push(AgencyCandidate {
                    agency,
                    position: last,
                });
                i = last + 1;
                continue;
            }
        }

        if let Some(grant) = extract_grant_number(tokens[i].as_ref()) {
            candidates.grants.push(GrantCandidate { grant, position: i });
        }
        i += 1;
    }

    candidates
}

/// Drop grantless pairs for agencies that were paired with a real grant,
/// then deduplicate
pub fn suppress_grantless(pairs: Vec<FundingPair>) -> BTreeSet<FundingPair> {
    let funded: HashSet<String> = pairs
        .iter()
        .filter(|p| p.has_grant())
        .map(|p| p.agency.clone())
        .collect();

    pairs
        .into_iter()
        .filter(|p| p.has_grant() || !funded.contains(&p.agency))
        .collect()
}

// ============================================================================
// Structured grant lists
// ============================================================================

/// One `<Grant>` record from publication metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantListRecord {
    /// Free-form agency field, often several acronyms ("NCI NIH HHS")
    pub agency: String,
    /// Grant identifier, when the record has one
    #[serde(default)]
    pub grant_id: Option<String>,
}

/// Split a metadata agency field into agency mentions
///
/// Walks the whitespace tokens taking the longest vocabulary phrase at each
/// position; unmatched tokens stand alone. Mentions keep their original
/// spelling and are returned once each, in order.
pub fn split_agency_field(agency: &str, trie: &Trie) -> Vec<String> {
    let tokens: Vec<&str> = agency.split_whitespace().collect();
    let lowered = lowercase_all(&tokens);

    let mut agencies: Vec<String> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let span = trie
            .longest_match_over_window(&lowered, i)
            .map_or(1, |m| m.consumed);
        let mention = tokens[i..i + span].join(" ");
        if !agencies.contains(&mention) {
            agencies.push(mention);
        }
        i += span;
    }

    agencies
}

/// Turn structured grant records into funding pairs
pub fn grant_list_pairs(records: &[GrantListRecord], trie: &Trie) -> BTreeSet<FundingPair> {
    records
        .iter()
        .flat_map(|record| {
            let grant = record
                .grant_id
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .unwrap_or(GRANT_NOT_FOUND)
                .to_string();
            split_agency_field(&record.agency, trie)
                .into_iter()
                .map(move |agency| FundingPair::new(agency, grant.clone()))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

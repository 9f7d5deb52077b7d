//! Phrase resolver
//!
//! Owns the built trie and the funding settings, and is the single object
//! callers share (by reference or `Arc`) across documents and threads.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use pubmine_core::{AppConfig, FundingPair, Result};

use crate::cache::build_or_load;
use crate::funding::{grant_list_pairs, split_agency_field, FundingExtractor, GrantListRecord};
use crate::text::{is_stop_word, lowercase_all, normalize_phrase, split_sentences, word_tokens};
use crate::trie::Trie;
use crate::vocabulary::{MergedVocabulary, VocabularySource};
use crate::{EntityExtractor, ExtractedEntity};

/// Read-only matching context built once per process
#[derive(Debug, Clone)]
pub struct PhraseResolver {
    trie: Trie,
    funding: FundingExtractor,
}

impl PhraseResolver {
    /// Wrap an already built trie with default funding settings
    pub fn new(trie: Trie) -> Self {
        Self {
            trie,
            funding: FundingExtractor::default(),
        }
    }

    /// Load or build the trie for `source`
    pub fn build_or_load<V>(source: &V, cache_path: Option<&Path>) -> Result<Self>
    where
        V: VocabularySource + ?Sized,
    {
        Ok(Self::new(build_or_load(source, cache_path)?))
    }

    /// Build from the configured vocabulary files, cache and funding settings
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source = MergedVocabulary::from_config(&config.vocabulary);
        let resolver = Self::build_or_load(&source, config.vocabulary.cache_path.as_deref())?;
        Ok(resolver.with_funding(FundingExtractor::from_config(&config.funding)))
    }

    /// Replace the funding extractor settings
    pub fn with_funding(mut self, funding: FundingExtractor) -> Self {
        self.funding = funding;
        self
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn funding(&self) -> &FundingExtractor {
        &self.funding
    }

    /// Resolve a phrase, given as tokens, to its canonical name
    ///
    /// Tokens are folded the same way vocabulary phrases are, so raw
    /// spellings such as `["University", "of", "California,", "San", "Diego"]`
    /// resolve. The longest vocabulary prefix wins.
    pub fn resolve_phrase<S: AsRef<str>>(&self, tokens: &[S]) -> Option<&str> {
        let joined = tokens
            .iter()
            .map(|t| t.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        self.trie.longest_match(&normalize_phrase(&joined))
    }

    /// Extract deduplicated (agency, grant) pairs from a funding section
    pub fn extract_funding(&self, text: &str) -> BTreeSet<FundingPair> {
        self.funding.extract(text, &self.trie)
    }

    /// Split a metadata agency field such as `"NCI NIH HHS"`
    pub fn split_agency_field(&self, agency: &str) -> Vec<String> {
        split_agency_field(agency, &self.trie)
    }

    /// Funding pairs from structured grant records
    pub fn grant_list_pairs(&self, records: &[GrantListRecord]) -> BTreeSet<FundingPair> {
        grant_list_pairs(records, &self.trie)
    }

    /// Every vocabulary mention in `text`, longest match first, no overlaps
    pub fn find_institutions(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();

        for (sentence_index, sentence) in split_sentences(text).into_iter().enumerate() {
            let tokens = word_tokens(sentence);
            let lowered = lowercase_all(&tokens);

            let mut i = 0;
            while i < tokens.len() {
                match self.trie.longest_match_over_window(&lowered, i) {
                    Some(m) if !is_stop_word(&lowered[i]) => {
                        entities.push(ExtractedEntity {
                            canonical: m.canonical.to_string(),
                            matched: tokens[i..i + m.consumed].join(" "),
                            sentence: sentence_index,
                            start: i,
                            end: i + m.consumed,
                        });
                        i += m.consumed;
                    }
                    _ => i += 1,
                }
            }
        }

        entities
    }

    /// Distinct canonical names mentioned in `text`, in first-seen order
    pub fn institution_names(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.find_institutions(text)
            .into_iter()
            .filter(|e| seen.insert(e.canonical.clone()))
            .map(|e| e.canonical)
            .collect()
    }
}

impl EntityExtractor for PhraseResolver {
    fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        self.find_institutions(text)
    }
}

//! Pubmine Extractor - Vocabulary matching over publication text
//!
//! Resolves institution and funding-agency names with a word-level phrase
//! trie and pairs grant numbers with the nearest agency mention.
//!
//! ```no_run
//! use pubmine_extractor::{vocabulary::JsonVocabularyFile, PhraseResolver};
//! use std::path::Path;
//!
//! let source = JsonVocabularyFile::new("utilities/inst_alias.json");
//! let resolver =
//!     PhraseResolver::build_or_load(&source, Some(Path::new("utilities/cached_tree_map.json")))?;
//! for pair in resolver.extract_funding("Supported by NIH grant R01CA123456.") {
//!     println!("{pair}");
//! }
//! # Ok::<(), pubmine_core::PubmineError>(())
//! ```

use serde::{Deserialize, Serialize};

/// Vocabulary phrase found in text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Canonical name the phrase resolved to
    pub canonical: String,
    /// Surface tokens as written, space-joined
    pub matched: String,
    /// Sentence index within the text
    pub sentence: usize,
    /// Token span within the sentence (end exclusive)
    pub start: usize,
    pub end: usize,
}

/// Trait for entity extractors
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<ExtractedEntity>;
}

pub mod cache;
pub mod funding;
pub mod grant;
pub mod resolver;
pub mod text;
pub mod trie;
pub mod vocabulary;

pub use cache::{build_or_load, TrieCache};
pub use funding::{extract_funding, FundingExtractor, GrantListRecord};
pub use grant::extract_grant_number;
pub use resolver::PhraseResolver;
pub use trie::{Trie, WindowMatch};
pub use vocabulary::{JsonVocabularyFile, MergedVocabulary, VocabularySource};

//! Pubmine Core - Domain models, errors, and shared types
//!
//! This crate defines the core abstractions used throughout Pubmine:
//! - Vocabulary records (canonical names and their aliases)
//! - Funding results (agency / grant pairs and their sentinels)
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, FundingConfig, LoggingConfig, VocabularyConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Pubmine operations
#[derive(Error, Debug)]
pub enum PubmineError {
    /// A vocabulary phrase normalized to zero tokens
    #[error("Invalid vocabulary entry for {name:?}: phrase {phrase:?} has no tokens")]
    InvalidEntry { name: String, phrase: String },

    /// Cached trie could not be read or failed validation
    #[error("Trie cache {path} is unusable: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    /// Serialized trie failed structural validation
    #[error("Invalid trie: {0}")]
    InvalidTrie(String),

    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PubmineError>;

// ============================================================================
// Vocabulary
// ============================================================================

/// A canonical name together with the alternate phrasings that resolve to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    /// Authoritative name returned by lookups
    pub name: String,

    /// Alternate phrasings
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl VocabularyEntry {
    /// Create an entry without aliases
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    /// Add an alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// The canonical name followed by every alias
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

// ============================================================================
// Funding Results
// ============================================================================

/// Agency placeholder for a grant with no agency mention close enough
pub const AGENCY_NOT_FOUND: &str = "Agency not found";

/// Grant placeholder for an agency mentioned without a nearby grant number
pub const GRANT_NOT_FOUND: &str = "Grant not found";

/// One (agency, grant) association extracted from a document
///
/// Ordered so that result sets iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FundingPair {
    pub agency: String,
    pub grant: String,
}

impl FundingPair {
    pub fn new(agency: impl Into<String>, grant: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
            grant: grant.into(),
        }
    }

    /// A grant number with no agency close enough to claim it
    pub fn agency_not_found(grant: impl Into<String>) -> Self {
        Self::new(AGENCY_NOT_FOUND, grant)
    }

    /// An agency mention with no grant number
    pub fn grant_not_found(agency: impl Into<String>) -> Self {
        Self::new(agency, GRANT_NOT_FOUND)
    }

    /// Whether this pair carries an actual grant identifier
    pub fn has_grant(&self) -> bool {
        self.grant != GRANT_NOT_FOUND
    }
}

impl std::fmt::Display for FundingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}", self.agency, self.grant)
    }
}

// ============================================================================
// Tests
// ============================================================================

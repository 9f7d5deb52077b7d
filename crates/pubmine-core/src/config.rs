//! Pubmine Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults matching the reference vocabulary layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Vocabulary and trie cache locations
    pub vocabulary: VocabularyConfig,

    /// Funding extraction tuning
    pub funding: FundingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Vocabulary (comma-separated list of files)
        if let Ok(paths) = std::env::var("PUBMINE_VOCABULARY") {
            config.vocabulary.paths = paths
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Ok(path) = std::env::var("PUBMINE_CACHE") {
            config.vocabulary.cache_path = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        // Funding
        if let Ok(threshold) = std::env::var("PUBMINE_DISTANCE_THRESHOLD") {
            config.funding.distance_threshold =
                threshold.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "PUBMINE_DISTANCE_THRESHOLD".to_string(),
                    value: threshold,
                })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            config.logging.json_format = json.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LOG_JSON".to_string(),
                value: json,
            })?;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // Only override if env values differ from defaults
        if env_config.vocabulary.paths != defaults.vocabulary.paths {
            self.vocabulary.paths = env_config.vocabulary.paths;
        }
        if env_config.vocabulary.cache_path != defaults.vocabulary.cache_path {
            self.vocabulary.cache_path = env_config.vocabulary.cache_path;
        }
        if env_config.funding.distance_threshold != defaults.funding.distance_threshold {
            self.funding.distance_threshold = env_config.funding.distance_threshold;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format != defaults.logging.json_format {
            self.logging.json_format = env_config.logging.json_format;
        }

        Ok(self)
    }

    /// Check values that serde cannot constrain
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vocabulary.paths.is_empty() {
            return Err(ConfigError::MissingRequired("vocabulary.paths".to_string()));
        }
        if self.funding.trigger_words.iter().any(|w| w.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "funding.trigger_words".to_string(),
                value: format!("{:?}", self.funding.trigger_words),
            });
        }
        Ok(())
    }
}

/// Vocabulary source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// JSON vocabulary files, merged in order
    pub paths: Vec<PathBuf>,

    /// Where the built trie is cached (None disables caching)
    pub cache_path: Option<PathBuf>,

    /// Skip records whose name is a bare Wikidata item id (e.g. "Q12345")
    pub skip_wikidata_ids: bool,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("./utilities/inst_alias.json")],
            cache_path: Some(PathBuf::from("./utilities/cached_tree_map.json")),
            skip_wikidata_ids: true,
        }
    }
}

/// Funding extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingConfig {
    /// Words marking the first funding-related sentence
    pub trigger_words: Vec<String>,

    /// Maximum token distance between a grant and the agency claiming it
    pub distance_threshold: usize,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            trigger_words: ["funds", "grant", "sponsor", "funding", "funded"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
            distance_threshold: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

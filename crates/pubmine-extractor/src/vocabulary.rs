//! Vocabulary sources
//!
//! A vocabulary is an ordered list of `{name, aliases}` records. Sources
//! report a fingerprint so the trie cache can tell when it is stale without
//! parsing and rebuilding the whole vocabulary.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use pubmine_core::{PubmineError, Result, VocabularyConfig, VocabularyEntry};

/// Unlabeled Wikidata items come back with their id as label
static WIKIDATA_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Q\d{1,8}$").expect("valid wikidata id regex"));

/// Trait for anything that can supply vocabulary entries
pub trait VocabularySource: Send + Sync {
    /// Load every entry, in order
    fn entries(&self) -> Result<Vec<VocabularyEntry>>;

    /// Value that changes whenever the entries change
    fn fingerprint(&self) -> Result<u64> {
        Ok(fingerprint_entries(&self.entries()?))
    }

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Hash a list of entries, order-sensitive
pub fn fingerprint_entries(entries: &[VocabularyEntry]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for entry in entries {
        entry.name.hash(&mut hasher);
        entry.aliases.hash(&mut hasher);
    }
    hasher.finish()
}

/// Whether a name is a bare Wikidata item id such as `Q49108`
pub fn is_wikidata_id(name: &str) -> bool {
    WIKIDATA_ID.is_match(name)
}

impl VocabularySource for Vec<VocabularyEntry> {
    fn entries(&self) -> Result<Vec<VocabularyEntry>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory entries", self.len())
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// JSON array of `{"name": ..., "aliases": [...]}` records
#[derive(Debug, Clone)]
pub struct JsonVocabularyFile {
    path: PathBuf,
    skip_wikidata_ids: bool,
}

impl JsonVocabularyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            skip_wikidata_ids: true,
        }
    }

    /// Keep or drop records named by a bare Wikidata id
    pub fn with_skip_wikidata_ids(mut self, skip: bool) -> Self {
        self.skip_wikidata_ids = skip;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| PubmineError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl VocabularySource for JsonVocabularyFile {
    fn entries(&self) -> Result<Vec<VocabularyEntry>> {
        let bytes = self.read()?;
        let records: Vec<VocabularyEntry> = serde_json::from_slice(&bytes).map_err(|e| {
            PubmineError::Vocabulary(format!("{}: {}", self.path.display(), e))
        })?;

        let total = records.len();
        let entries: Vec<VocabularyEntry> = records
            .into_iter()
            .filter(|entry| !(self.skip_wikidata_ids && is_wikidata_id(&entry.name)))
            .collect();

        debug!(
            path = %self.path.display(),
            total,
            skipped = total - entries.len(),
            "loaded vocabulary file"
        );
        Ok(entries)
    }

    /// Hash of the raw file bytes, so staleness checks skip JSON parsing
    fn fingerprint(&self) -> Result<u64> {
        let bytes = self.read()?;
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        self.skip_wikidata_ids.hash(&mut hasher);
        Ok(hasher.finish())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ============================================================================
// Merged sources
// ============================================================================

/// Several sources concatenated in order (e.g. institutions, then agencies)
#[derive(Default)]
pub struct MergedVocabulary {
    sources: Vec<Box<dyn VocabularySource>>,
}

impl MergedVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source
    pub fn with_source(mut self, source: impl VocabularySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// One JSON file source per configured path
    pub fn from_config(config: &VocabularyConfig) -> Self {
        config.paths.iter().fold(Self::new(), |merged, path| {
            merged.with_source(
                JsonVocabularyFile::new(path).with_skip_wikidata_ids(config.skip_wikidata_ids),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl VocabularySource for MergedVocabulary {
    fn entries(&self) -> Result<Vec<VocabularyEntry>> {
        let mut entries = Vec::new();
        for source in &self.sources {
            let loaded = source.entries()?;
            info!(source = %source.describe(), entries = loaded.len(), "loaded vocabulary");
            entries.extend(loaded);
        }
        Ok(entries)
    }

    fn fingerprint(&self) -> Result<u64> {
        let mut hasher = DefaultHasher::new();
        for source in &self.sources {
            source.fingerprint()?.hash(&mut hasher);
        }
        Ok(hasher.finish())
    }

    fn describe(&self) -> String {
        self.sources
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_wikidata_id() {
        assert!(is_wikidata_id("Q49108"));
        assert!(!is_wikidata_id("Q123456789"));
        assert!(!is_wikidata_id("Queen's University"));
    }

    #[test]
    fn test_json_file_skips_wikidata_ids() {
        let file = write_json(
            r#"[
                {"name": "Harvard University", "aliases": ["Harvard"]},
                {"name": "Q4567", "aliases": []},
                {"name": "Queen's University"}
            ]"#,
        );

        let entries = JsonVocabularyFile::new(file.path()).entries().unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Harvard University", "Queen's University"]);

        let entries = JsonVocabularyFile::new(file.path())
            .with_skip_wikidata_ids(false)
            .entries()
            .unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_json_file_errors() {
        let missing = JsonVocabularyFile::new("/nonexistent/vocabulary.json");
        assert!(matches!(missing.entries(), Err(PubmineError::Io { .. })));

        let file = write_json(r#"{"name": "not a list"}"#);
        let invalid = JsonVocabularyFile::new(file.path());
        assert!(matches!(invalid.entries(), Err(PubmineError::Vocabulary(_))));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = vec![VocabularyEntry::new("NIH")];
        let b = vec![VocabularyEntry::new("NIH").with_alias("National Institutes of Health")];
        assert_eq!(a.fingerprint().unwrap(), a.clone().fingerprint().unwrap());
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn test_merged_preserves_order() {
        let institutions = write_json(r#"[{"name": "Stanford University", "aliases": []}]"#);
        let agencies = write_json(r#"[{"name": "National Science Foundation", "aliases": ["NSF"]}]"#);

        let merged = MergedVocabulary::new()
            .with_source(JsonVocabularyFile::new(institutions.path()))
            .with_source(JsonVocabularyFile::new(agencies.path()))
            .with_source(vec![VocabularyEntry::new("Wellcome Trust")]);

        assert_eq!(merged.len(), 3);
        let names: Vec<String> = merged.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec!["Stanford University", "National Science Foundation", "Wellcome Trust"]
        );
    }
}

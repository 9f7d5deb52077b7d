//! Trie cache
//!
//! Building the trie from a large vocabulary is the slowest step of start-up,
//! so the built trie is persisted as JSON next to the vocabulary. A cache is
//! only used when its format version and vocabulary fingerprint match;
//! anything else (missing, unreadable, invalid, stale) leads to a rebuild.
//! Loading from cache never changes matching results.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pubmine_core::{PubmineError, Result};

use crate::trie::Trie;
use crate::vocabulary::VocabularySource;

/// Bumped whenever the serialized layout changes
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// On-disk cache document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTrie {
    pub format_version: u32,
    /// Fingerprint of the vocabulary the trie was built from
    pub fingerprint: u64,
    pub built_at: DateTime<Utc>,
    pub trie: Trie,
}

/// File-backed trie cache
#[derive(Debug, Clone)]
pub struct TrieCache {
    path: PathBuf,
}

impl TrieCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached trie built from a vocabulary with `fingerprint`
    ///
    /// Returns `Ok(None)` when no cache file exists and `CacheCorrupt` when
    /// one exists but cannot be used.
    pub fn load(&self, fingerprint: u64) -> Result<Option<Trie>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.corrupt(e))?;
        let cached: CachedTrie = serde_json::from_str(&content).map_err(|e| self.corrupt(e))?;

        if cached.format_version != CACHE_FORMAT_VERSION {
            return Err(self.corrupt(format!(
                "format version {} (expected {})",
                cached.format_version, CACHE_FORMAT_VERSION
            )));
        }
        if cached.fingerprint != fingerprint {
            return Err(self.corrupt("vocabulary changed since the cache was built"));
        }
        cached.trie.validate().map_err(|reason| self.corrupt(reason))?;

        Ok(Some(cached.trie))
    }

    /// Persist `trie` atomically (write to a sibling file, then rename)
    pub fn store(&self, trie: &Trie, fingerprint: u64) -> Result<()> {
        let cached = CachedTrie {
            format_version: CACHE_FORMAT_VERSION,
            fingerprint,
            built_at: Utc::now(),
            trie: trie.clone(),
        };
        let json = serde_json::to_string(&cached)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(dir, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&self.path, e))?;
        Ok(())
    }

    fn corrupt(&self, reason: impl ToString) -> PubmineError {
        PubmineError::CacheCorrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> PubmineError {
        PubmineError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Load the trie from `cache_path` or build it from `source`
///
/// Cache problems are logged and answered with a rebuild; a failed write of
/// the fresh cache is logged and the built trie still returned. Only an
/// unreadable vocabulary is an error.
pub fn build_or_load<V>(source: &V, cache_path: Option<&Path>) -> Result<Trie>
where
    V: VocabularySource + ?Sized,
{
    let fingerprint = source.fingerprint()?;
    let cache = cache_path.map(TrieCache::new);

    if let Some(cache) = &cache {
        match cache.load(fingerprint) {
            Ok(Some(trie)) => {
                info!(
                    path = %cache.path().display(),
                    phrases = trie.phrase_count(),
                    "loaded phrase trie from cache"
                );
                return Ok(trie);
            }
            Ok(None) => info!(path = %cache.path().display(), "no trie cache, building"),
            Err(e) => warn!("Ignoring trie cache: {}", e),
        }
    }

    let entries = source.entries()?;
    let trie = Trie::build(&entries);

    if let Some(cache) = &cache {
        match cache.store(&trie, fingerprint) {
            Ok(()) => info!(path = %cache.path().display(), "saved phrase trie cache"),
            Err(e) => warn!("Failed to save trie cache: {}", e),
        }
    }

    Ok(trie)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubmine_core::VocabularyEntry;

    fn vocabulary() -> Vec<VocabularyEntry> {
        vec![
            VocabularyEntry::new("University of California").with_alias("UC"),
            VocabularyEntry::new("University of California, San Diego").with_alias("UCSD"),
        ]
    }

    #[test]
    fn test_build_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("tree_map.json");
        let source = vocabulary();

        let built = build_or_load(&source, Some(path.as_path())).unwrap();
        assert!(path.exists());

        let cached = TrieCache::new(&path)
            .load(source.fingerprint().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(cached, built);

        let loaded = build_or_load(&source, Some(path.as_path())).unwrap();
        assert_eq!(loaded, built);
    }

    #[test]
    fn test_missing_cache_is_not_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TrieCache::new(dir.path().join("absent.json"));
        assert!(cache.load(42).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_cache_falls_back_to_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree_map.json");
        std::fs::write(&path, "{ not json").unwrap();

        let source = vocabulary();
        let cache = TrieCache::new(&path);
        assert!(matches!(
            cache.load(source.fingerprint().unwrap()),
            Err(PubmineError::CacheCorrupt { .. })
        ));

        let trie = build_or_load(&source, Some(path.as_path())).unwrap();
        assert_eq!(trie.longest_match(&["ucsd"]), Some("University of California, San Diego"));
        // The rebuild replaced the bad file
        assert!(cache.load(source.fingerprint().unwrap()).unwrap().is_some());
    }

    #[test]
    fn test_stale_cache_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree_map.json");

        let old = vec![VocabularyEntry::new("National Institutes of Health")];
        build_or_load(&old, Some(path.as_path())).unwrap();

        let new = vec![VocabularyEntry::new("National Institutes of Health").with_alias("NIH")];
        let trie = build_or_load(&new, Some(path.as_path())).unwrap();
        assert_eq!(trie.longest_match(&["nih"]), Some("National Institutes of Health"));
    }

    #[test]
    fn test_structurally_invalid_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree_map.json");
        let json = format!(
            r#"{{"format_version":{},"fingerprint":7,"built_at":"2024-01-01T00:00:00Z","trie":{{"nodes":[{{"children":{{"nih":3}},"values":[]}}]}}}}"#,
            CACHE_FORMAT_VERSION
        );
        std::fs::write(&path, json).unwrap();

        let err = TrieCache::new(&path).load(7).unwrap_err();
        assert!(matches!(err, PubmineError::CacheCorrupt { .. }));
    }

    #[test]
    fn test_without_cache_path() {
        let trie = build_or_load(&vocabulary(), None).unwrap();
        assert_eq!(trie.phrase_count(), 4);
    }
}

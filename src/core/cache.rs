//! Incremental extraction cache keyed by content fingerprints.
//!
//! Two invalidation tiers:
//!
//! 1. Whole-cache: the persisted metadata (`version`, `translationIdentifier`,
//!    `configHash`, `toolVersion`, `parserSignature`) must match the current
//!    run exactly; any mismatch discards every entry. The version is derived
//!    from a schema constant combined with the registry's parser signature,
//!    so a parser logic change invalidates the cache without a manual bump.
//! 2. Per-file: a stored `(mtime_ms, size)` fingerprint mismatch re-parses
//!    only that file; all other entries are reused verbatim.
//!
//! The cache is written wholesale once at the end of a run. A corrupt or
//! unreadable cache file is treated as empty, never as an error, so deleting
//! the cache directory is always safe.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::reference::{DynamicKeyWarning, FileExtraction, TranslationReference};

/// Workspace-local directory holding persisted caches.
pub const CACHE_DIR: &str = ".keysync-cache";
/// Cache slot for plain extraction runs.
pub const EXTRACT_CACHE_FILE: &str = "references.json";
/// Cache slot for the sync loop (same format, separate lifecycle).
pub const SYNC_CACHE_FILE: &str = "sync.json";

/// Bumped when the persisted format itself changes.
const CACHE_SCHEMA_VERSION: u64 = 2;

/// Cheap per-file change proxy; not a content hash.
///
/// Trades correctness under clock manipulation for speed. The whole-cache
/// tier catches every semantic-affecting change regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFingerprint {
    pub mtime_ms: u64,
    pub size: u64,
}

impl FileFingerprint {
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to stat file: {}", path.display()))?;
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(Self {
            mtime_ms,
            size: metadata.len(),
        })
    }
}

/// One file's cached extraction, replaced wholesale on re-parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceCacheEntry {
    pub fingerprint: FileFingerprint,
    pub references: Vec<TranslationReference>,
    pub dynamic_key_warnings: Vec<DynamicKeyWarning>,
}

impl ReferenceCacheEntry {
    pub fn new(fingerprint: FileFingerprint, extraction: &FileExtraction) -> Self {
        Self {
            fingerprint,
            references: extraction.references.clone(),
            dynamic_key_warnings: extraction.dynamic_key_warnings.clone(),
        }
    }

    pub fn extraction(&self) -> FileExtraction {
        FileExtraction {
            references: self.references.clone(),
            dynamic_key_warnings: self.dynamic_key_warnings.clone(),
        }
    }
}

/// The persisted cache file; top-level fields gate whole-cache invalidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceCacheFile {
    version: u64,
    translation_identifier: String,
    config_hash: String,
    tool_version: String,
    parser_signature: String,
    files: BTreeMap<String, ReferenceCacheEntry>,
}

/// Metadata for the current run, compared against the persisted header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMetadata {
    pub translation_identifier: String,
    pub config_hash: String,
    pub tool_version: String,
    pub parser_signature: String,
}

impl CacheMetadata {
    pub fn new(translation_identifier: &str, config_hash: String, parser_signature: String) -> Self {
        Self {
            translation_identifier: translation_identifier.to_string(),
            config_hash,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            parser_signature,
        }
    }

    /// Schema constant folded with the parser signature, so parser behavior
    /// changes auto-invalidate without a manual version bump.
    fn version(&self) -> u64 {
        CACHE_SCHEMA_VERSION ^ fnv1a(self.parser_signature.as_bytes())
    }
}

/// An explicit in-memory cache value threaded through one run:
/// load, mutate in memory, save once.
#[derive(Debug)]
pub struct ReferenceCache {
    path: PathBuf,
    metadata: CacheMetadata,
    files: BTreeMap<String, ReferenceCacheEntry>,
    /// True when the persisted header did not match and everything was discarded.
    pub discarded: bool,
}

impl ReferenceCache {
    /// Load a cache slot. Any header mismatch or corruption yields an empty
    /// cache; per-file validity is checked later via `lookup`.
    pub fn load(workspace_root: &Path, slot: &str, metadata: CacheMetadata) -> Self {
        let path = workspace_root.join(CACHE_DIR).join(slot);
        let (files, discarded) = match read_cache_file(&path) {
            Some(persisted) if header_matches(&persisted, &metadata) => (persisted.files, false),
            Some(_) => (BTreeMap::new(), true),
            None => (BTreeMap::new(), false),
        };

        Self {
            path,
            metadata,
            files,
            discarded,
        }
    }

    /// Delete a persisted cache slot (the `invalidateCache` escape hatch).
    pub fn invalidate(workspace_root: &Path, slot: &str) {
        let path = workspace_root.join(CACHE_DIR).join(slot);
        let _ = fs::remove_file(path);
    }

    /// Return the cached extraction for a file iff its fingerprint matches.
    pub fn lookup(&self, relative_path: &str, fingerprint: FileFingerprint) -> Option<FileExtraction> {
        let entry = self.files.get(relative_path)?;
        if entry.fingerprint == fingerprint {
            Some(entry.extraction())
        } else {
            None
        }
    }

    /// Replace a file's entry wholesale.
    pub fn update(
        &mut self,
        relative_path: &str,
        fingerprint: FileFingerprint,
        extraction: &FileExtraction,
    ) {
        self.files.insert(
            relative_path.to_string(),
            ReferenceCacheEntry::new(fingerprint, extraction),
        );
    }

    /// Drop entries for files no longer present in the scanned set.
    pub fn retain_files(&mut self, live: &std::collections::BTreeSet<String>) {
        self.files.retain(|path, _| live.contains(path));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Serialize the whole entry map and write it once. A crash before this
    /// point loses the run's update but never corrupts the previous file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
        }

        let persisted = ReferenceCacheFile {
            version: self.metadata.version(),
            translation_identifier: self.metadata.translation_identifier.clone(),
            config_hash: self.metadata.config_hash.clone(),
            tool_version: self.metadata.tool_version.clone(),
            parser_signature: self.metadata.parser_signature.clone(),
            files: self.files.clone(),
        };

        let content = serde_json::to_string(&persisted).context("Failed to serialize cache")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))?;
        Ok(())
    }
}

fn read_cache_file(path: &Path) -> Option<ReferenceCacheFile> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn header_matches(persisted: &ReferenceCacheFile, metadata: &CacheMetadata) -> bool {
    persisted.version == metadata.version()
        && persisted.translation_identifier == metadata.translation_identifier
        && persisted.config_hash == metadata.config_hash
        && persisted.tool_version == metadata.tool_version
        && persisted.parser_signature == metadata.parser_signature
}

/// FNV-1a, used where a hash must be deterministic across processes
/// (std's hasher is randomly seeded per process).
pub fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Deterministic hex hash of any serializable config subset.
pub fn config_hash<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_string(value).unwrap_or_default();
    format!("{:016x}", fnv1a(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::Position;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn metadata(identifier: &str) -> CacheMetadata {
        CacheMetadata::new(identifier, "cfg".to_string(), "script:v1".to_string())
    }

    fn extraction(key: &str) -> FileExtraction {
        FileExtraction {
            references: vec![TranslationReference {
                key: key.to_string(),
                fallback_literal: None,
                file_path: "src/app.tsx".to_string(),
                position: Position::new(1, 1),
            }],
            dynamic_key_warnings: vec![],
        }
    }

    fn fingerprint(mtime_ms: u64, size: u64) -> FileFingerprint {
        FileFingerprint { mtime_ms, size }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();

        let mut cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        cache.update("src/app.tsx", fingerprint(100, 10), &extraction("a.b"));
        cache.save().unwrap();

        let cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        assert!(!cache.discarded);
        let hit = cache.lookup("src/app.tsx", fingerprint(100, 10)).unwrap();
        assert_eq!(hit.references[0].key, "a.b");
    }

    #[test]
    fn test_fingerprint_mismatch_misses_only_that_file() {
        let dir = tempdir().unwrap();

        let mut cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        cache.update("a.tsx", fingerprint(100, 10), &extraction("a"));
        cache.update("b.tsx", fingerprint(200, 20), &extraction("b"));
        cache.save().unwrap();

        let cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        assert!(cache.lookup("a.tsx", fingerprint(999, 10)).is_none());
        assert!(cache.lookup("b.tsx", fingerprint(200, 20)).is_some());
    }

    #[test]
    fn test_identifier_change_discards_whole_cache() {
        let dir = tempdir().unwrap();

        let mut cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        cache.update("a.tsx", fingerprint(100, 10), &extraction("a"));
        cache.save().unwrap();

        let cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("translate"));
        assert!(cache.discarded);
        assert!(cache.lookup("a.tsx", fingerprint(100, 10)).is_none());
    }

    #[test]
    fn test_parser_signature_change_discards_whole_cache() {
        let dir = tempdir().unwrap();

        let mut cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        cache.update("a.tsx", fingerprint(100, 10), &extraction("a"));
        cache.save().unwrap();

        let mut changed = metadata("t");
        changed.parser_signature = "script:v2".to_string();
        let cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, changed);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_cache_treated_as_empty() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join(CACHE_DIR);
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join(EXTRACT_CACHE_FILE), "{not json").unwrap();

        let cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        assert!(cache.is_empty());
        assert!(!cache.discarded);
    }

    #[test]
    fn test_invalidate_deletes_slot() {
        let dir = tempdir().unwrap();

        let mut cache = ReferenceCache::load(dir.path(), SYNC_CACHE_FILE, metadata("t"));
        cache.update("a.tsx", fingerprint(100, 10), &extraction("a"));
        cache.save().unwrap();

        ReferenceCache::invalidate(dir.path(), SYNC_CACHE_FILE);
        let cache = ReferenceCache::load(dir.path(), SYNC_CACHE_FILE, metadata("t"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_retain_files_drops_deleted_entries() {
        let dir = tempdir().unwrap();

        let mut cache = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        cache.update("a.tsx", fingerprint(1, 1), &extraction("a"));
        cache.update("b.tsx", fingerprint(2, 2), &extraction("b"));

        let live = std::collections::BTreeSet::from(["a.tsx".to_string()]);
        cache.retain_files(&live);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_config_hash_is_deterministic() {
        assert_eq!(config_hash(&"abc"), config_hash(&"abc"));
        assert_ne!(config_hash(&"abc"), config_hash(&"abd"));
    }

    #[test]
    fn test_slots_are_independent() {
        let dir = tempdir().unwrap();

        let mut extract = ReferenceCache::load(dir.path(), EXTRACT_CACHE_FILE, metadata("t"));
        extract.update("a.tsx", fingerprint(1, 1), &extraction("a"));
        extract.save().unwrap();

        let sync = ReferenceCache::load(dir.path(), SYNC_CACHE_FILE, metadata("t"));
        assert!(sync.is_empty());
    }
}

//! Cache-gated reference extraction over a workspace.
//!
//! Discovery produces a sorted, workspace-relative file list; cached
//! entries are reused on fingerprint match and only the misses are parsed,
//! in parallel. The merge runs over the sorted list, so two runs over an
//! unchanged tree produce byte-identical caches and indexes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use rayon::prelude::*;

use crate::core::cache::{CacheMetadata, FileFingerprint, ReferenceCache};
use crate::core::file_scanner::scan_files;
use crate::core::parsers::ParserRegistry;
use crate::core::reference::{FileExtraction, ReferenceIndex};
use crate::utils::to_workspace_relative;

/// One extraction run's inputs.
pub struct ExtractOptions<'a> {
    pub includes: &'a [String],
    pub excludes: &'a [String],
    pub translation_identifier: &'a str,
    /// Cache file name under `.keysync-cache/`.
    pub cache_slot: &'a str,
    /// Hash of the sync-relevant config subset; a change discards the cache.
    pub config_hash: String,
    pub invalidate_cache: bool,
    /// Explicit workspace-relative files; bypasses discovery when set.
    pub targets: Option<&'a [String]>,
    pub verbose: bool,
}

/// What a run produced, beyond the index itself.
pub struct ExtractOutcome {
    pub index: ReferenceIndex,
    pub files_scanned: usize,
    pub cache_hits: usize,
    pub files_parsed: usize,
}

pub struct ReferenceExtractor {
    registry: ParserRegistry,
    workspace_root: PathBuf,
}

impl ReferenceExtractor {
    pub fn new(workspace_root: &Path) -> Self {
        Self {
            registry: ParserRegistry::with_default_parsers(workspace_root),
            workspace_root: workspace_root.to_path_buf(),
        }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn extract(&self, options: &ExtractOptions) -> Result<ExtractOutcome> {
        if options.invalidate_cache {
            ReferenceCache::invalidate(&self.workspace_root, options.cache_slot);
        }

        let relative_files = self.discover(options)?;

        let metadata = CacheMetadata::new(
            options.translation_identifier,
            options.config_hash.clone(),
            self.registry.signature(),
        );
        let mut cache = ReferenceCache::load(&self.workspace_root, options.cache_slot, metadata);

        // Fingerprint pass: split into cache hits and files to parse.
        let mut extractions: BTreeMap<String, FileExtraction> = BTreeMap::new();
        let mut misses: Vec<(String, FileFingerprint)> = Vec::new();
        let mut cache_hits = 0;

        for relative in &relative_files {
            let fingerprint = match FileFingerprint::of(&self.workspace_root.join(relative)) {
                Ok(f) => f,
                Err(e) => {
                    if options.verbose {
                        eprintln!("{} Cannot stat {}: {}", "warning:".bold().yellow(), relative, e);
                    }
                    continue;
                }
            };
            match cache.lookup(relative, fingerprint) {
                Some(extraction) => {
                    cache_hits += 1;
                    extractions.insert(relative.clone(), extraction);
                }
                None => misses.push((relative.clone(), fingerprint)),
            }
        }

        let files_parsed = misses.len();
        let parsed: Vec<(String, FileFingerprint, Option<FileExtraction>)> = misses
            .par_iter()
            .map(|(relative, fingerprint)| {
                let extraction = self.parse_one(relative, options);
                (relative.clone(), *fingerprint, extraction)
            })
            .collect();

        for (relative, fingerprint, extraction) in parsed {
            if let Some(extraction) = extraction {
                cache.update(&relative, fingerprint, &extraction);
                extractions.insert(relative, extraction);
            }
        }

        // A targets-scoped run only sees a slice of the tree; pruning
        // against it would evict every other file's entry.
        if options.targets.is_none() {
            let live = extractions.keys().cloned().collect();
            cache.retain_files(&live);
        }
        cache.save()?;

        // BTreeMap iteration keeps the merge order stable.
        let mut index = ReferenceIndex::new();
        for extraction in extractions.values() {
            index.absorb(extraction);
        }

        Ok(ExtractOutcome {
            index,
            files_scanned: relative_files.len(),
            cache_hits,
            files_parsed,
        })
    }

    /// Parse one file with its dialect parser. Unknown-extension and
    /// unavailable-dialect files yield `None` (never cached); unreadable or
    /// unparseable files degrade to an empty extraction.
    fn parse_one(&self, relative: &str, options: &ExtractOptions) -> Option<FileExtraction> {
        let path = self.workspace_root.join(relative);
        let parser = self.registry.for_file(&path)?;
        if !self.registry.check_available(parser) {
            return None;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                if options.verbose {
                    eprintln!("{} Cannot read {}: {}", "warning:".bold().yellow(), relative, e);
                }
                return Some(FileExtraction::default());
            }
        };

        match parser.parse_file(relative, &content, options.translation_identifier) {
            Ok(extraction) => Some(extraction),
            Err(e) => {
                if options.verbose {
                    eprintln!("{} {}", "warning:".bold().yellow(), e);
                }
                Some(FileExtraction::default())
            }
        }
    }

    /// Discovery: explicit targets when given, glob/walk scan otherwise.
    /// Either way the result is sorted and workspace-relative.
    fn discover(&self, options: &ExtractOptions) -> Result<Vec<String>> {
        if let Some(targets) = options.targets {
            let mut relative: Vec<String> = targets
                .iter()
                .filter(|t| self.registry.for_file(Path::new(t.as_str())).is_some())
                .cloned()
                .collect();
            relative.sort();
            relative.dedup();
            return Ok(relative);
        }

        let base = self
            .workspace_root
            .to_str()
            .with_context(|| format!("Non-UTF-8 workspace root: {}", self.workspace_root.display()))?;
        let scan = scan_files(
            base,
            options.includes,
            options.excludes,
            &self.registry.extensions(),
            options.verbose,
        );
        if options.verbose && scan.skipped_count > 0 {
            eprintln!(
                "{} Skipped {} inaccessible paths during scan",
                "warning:".bold().yellow(),
                scan.skipped_count
            );
        }

        Ok(scan
            .files
            .into_iter()
            .filter_map(|f| to_workspace_relative(Path::new(&f), &self.workspace_root))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::core::cache::EXTRACT_CACHE_FILE;

    fn options(slot: &'static str) -> ExtractOptions<'static> {
        ExtractOptions {
            includes: &[],
            excludes: &[],
            translation_identifier: "t",
            cache_slot: slot,
            config_hash: "deadbeefdeadbeef".to_string(),
            invalidate_cache: false,
            targets: None,
            verbose: false,
        }
    }

    #[test]
    fn test_extract_merges_sorted_and_deterministic() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.ts"), r#"const x = t("beta.key");"#).unwrap();
        fs::write(dir.path().join("a.ts"), r#"const x = t("alpha.key");"#).unwrap();

        let extractor = ReferenceExtractor::new(dir.path());
        let outcome = extractor.extract(&options(EXTRACT_CACHE_FILE)).unwrap();

        assert_eq!(outcome.files_scanned, 2);
        assert_eq!(outcome.files_parsed, 2);
        let keys: Vec<&str> = outcome.index.keys().collect();
        assert_eq!(keys, vec!["alpha.key", "beta.key"]);
    }

    #[test]
    fn test_second_run_is_all_cache_hits() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), r#"const x = t("alpha.key");"#).unwrap();

        let extractor = ReferenceExtractor::new(dir.path());
        let first = extractor.extract(&options(EXTRACT_CACHE_FILE)).unwrap();
        assert_eq!(first.files_parsed, 1);

        let second = extractor.extract(&options(EXTRACT_CACHE_FILE)).unwrap();
        assert_eq!(second.files_parsed, 0);
        assert_eq!(second.cache_hits, 1);
        assert!(second.index.contains_key("alpha.key"));
    }

    #[test]
    fn test_identifier_change_discards_whole_cache() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), r#"const x = t("alpha.key");"#).unwrap();

        let extractor = ReferenceExtractor::new(dir.path());
        extractor.extract(&options(EXTRACT_CACHE_FILE)).unwrap();

        let mut changed = options(EXTRACT_CACHE_FILE);
        changed.translation_identifier = "translate";
        let outcome = extractor.extract(&changed).unwrap();
        assert_eq!(outcome.cache_hits, 0);
        assert_eq!(outcome.files_parsed, 1);
        assert!(!outcome.index.contains_key("alpha.key"));
    }

    #[test]
    fn test_targets_bypass_discovery() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), r#"const x = t("alpha.key");"#).unwrap();
        fs::write(dir.path().join("b.ts"), r#"const x = t("beta.key");"#).unwrap();

        let extractor = ReferenceExtractor::new(dir.path());
        let targets = vec!["a.ts".to_string()];
        let mut opts = options(EXTRACT_CACHE_FILE);
        opts.targets = Some(&targets);

        let outcome = extractor.extract(&opts).unwrap();
        assert_eq!(outcome.files_scanned, 1);
        assert!(outcome.index.contains_key("alpha.key"));
        assert!(!outcome.index.contains_key("beta.key"));
    }

    #[test]
    fn test_targets_run_keeps_other_cache_entries() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), r#"const x = t("alpha.key");"#).unwrap();
        fs::write(dir.path().join("b.ts"), r#"const x = t("beta.key");"#).unwrap();

        let extractor = ReferenceExtractor::new(dir.path());
        let full = extractor.extract(&options(EXTRACT_CACHE_FILE)).unwrap();
        assert_eq!(full.files_parsed, 2);

        let targets = vec!["a.ts".to_string()];
        let mut scoped = options(EXTRACT_CACHE_FILE);
        scoped.targets = Some(&targets);
        extractor.extract(&scoped).unwrap();

        let after = extractor.extract(&options(EXTRACT_CACHE_FILE)).unwrap();
        assert_eq!(after.files_parsed, 0);
        assert_eq!(after.cache_hits, 2);
    }

    #[test]
    fn test_unparseable_file_contributes_nothing_but_run_continues() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.ts"), "const = = =").unwrap();
        fs::write(dir.path().join("good.ts"), r#"const x = t("good.key");"#).unwrap();

        let extractor = ReferenceExtractor::new(dir.path());
        let outcome = extractor.extract(&options(EXTRACT_CACHE_FILE)).unwrap();
        assert_eq!(outcome.index.reference_count(), 1);
        assert!(outcome.index.contains_key("good.key"));
    }

    #[test]
    fn test_invalidate_cache_forces_reparse() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), r#"const x = t("alpha.key");"#).unwrap();

        let extractor = ReferenceExtractor::new(dir.path());
        extractor.extract(&options(EXTRACT_CACHE_FILE)).unwrap();

        let mut opts = options(EXTRACT_CACHE_FILE);
        opts.invalidate_cache = true;
        let outcome = extractor.extract(&opts).unwrap();
        assert_eq!(outcome.cache_hits, 0);
        assert_eq!(outcome.files_parsed, 1);
    }
}

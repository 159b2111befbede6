//! The reconciliation loop: extract, reconcile, validate, then report or
//! write. The pipeline only moves forward; a summary is always produced and
//! policy violations mark it failed instead of throwing, so callers can
//! inspect the details before deciding exit behavior.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::{Config, EmptyValuePolicy, SuspiciousKeyPolicy};
use crate::core::cache::SYNC_CACHE_FILE;
use crate::core::dynamic;
use crate::core::extract::{ExtractOptions, ReferenceExtractor};
use crate::core::locales::LocaleStore;
use crate::core::placeholders::{PlaceholderDiff, diff_placeholders};
use crate::core::reference::DynamicKeyWarning;
use crate::core::validator::SuspiciousKeyReason;

/// One sync run's knobs. Everything data-destructive is opt-in.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Apply additions to the locale stores instead of only reporting.
    pub write: bool,
    /// Also delete unused keys. Meaningless without `write`.
    pub prune: bool,
    /// Drop the persisted extraction cache up front.
    pub invalidate_cache: bool,
    /// Explicit workspace-relative files; bypasses discovery when set.
    pub targets: Option<Vec<String>>,
    /// Keys the write pass is restricted to; `None` means all.
    pub selection: Option<BTreeSet<String>>,
    /// Keys treated as referenced without a literal call site.
    pub assumed_keys: Vec<String>,
    /// Seed target locales with the source value instead of `""`.
    pub seed_target_locales: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingKey {
    pub key: String,
    pub suspicious: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SuspiciousKeyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_literal: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedKey {
    pub key: String,
    /// Every locale whose store currently contains the key.
    pub locales: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderIssue {
    pub key: String,
    pub locale: String,
    pub diff: PlaceholderDiff,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyValueViolation {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousKeyFinding {
    pub key: String,
    pub reason: SuspiciousKeyReason,
    pub suggested_fix: String,
}

/// What the write pass did to one locale's store.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleWriteStats {
    pub locale: String,
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub missing_keys: Vec<MissingKey>,
    pub unused_keys: Vec<UnusedKey>,
    pub placeholder_issues: Vec<PlaceholderIssue>,
    pub empty_value_violations: Vec<EmptyValueViolation>,
    pub suspicious_keys: Vec<SuspiciousKeyFinding>,
    pub dynamic_key_warnings: Vec<DynamicKeyWarning>,
    pub assumed_keys: Vec<String>,
    pub write_stats: Vec<LocaleWriteStats>,
    pub files_scanned: usize,
    pub cache_hits: usize,
    pub files_parsed: usize,
    /// Set by `emptyValuePolicy: fail`; never by findings alone.
    pub policy_failed: bool,
}

impl SyncSummary {
    /// False only when a policy violation occurred.
    pub fn ok(&self) -> bool {
        !self.policy_failed
    }

    /// Whether anything actionable was found.
    pub fn has_findings(&self) -> bool {
        !self.missing_keys.is_empty()
            || !self.unused_keys.is_empty()
            || !self.placeholder_issues.is_empty()
            || !self.empty_value_violations.is_empty()
            || !self.suspicious_keys.is_empty()
            || !self.dynamic_key_warnings.is_empty()
    }
}

pub struct Syncer<'a> {
    config: &'a Config,
    workspace_root: PathBuf,
}

impl<'a> Syncer<'a> {
    pub fn new(config: &'a Config, workspace_root: &Path) -> Self {
        Self {
            config,
            workspace_root: workspace_root.to_path_buf(),
        }
    }

    pub fn run(&self, options: &SyncOptions) -> Result<SyncSummary> {
        // extract
        let extractor = ReferenceExtractor::new(&self.workspace_root);
        let outcome = extractor.extract(&ExtractOptions {
            includes: &self.config.include,
            excludes: &self.config.exclude,
            translation_identifier: &self.config.sync.translation_identifier,
            cache_slot: SYNC_CACHE_FILE,
            config_hash: self.config.sync_hash(),
            invalidate_cache: options.invalidate_cache,
            targets: options.targets.as_deref(),
            verbose: options.verbose,
        })?;
        let index = outcome.index;

        let mut source = self.load_store(&self.config.source_language)?;
        let mut targets: Vec<LocaleStore> = self
            .config
            .target_languages
            .iter()
            .map(|locale| self.load_store(locale))
            .collect::<Result<_>>()?;

        let mut assumed: BTreeSet<String> = options.assumed_keys.iter().cloned().collect();
        let expanded: BTreeSet<String> =
            dynamic::expand_all(&self.config.dynamic_keys.expand).into_iter().collect();

        let referenced: BTreeSet<String> = index.keys().map(str::to_owned).collect();
        let validator = self.config.key_validator();

        // reconcile; assumed and expanded keys count as referenced
        let treated_as_referenced: BTreeSet<String> = referenced
            .iter()
            .chain(assumed.iter())
            .chain(expanded.iter())
            .cloned()
            .collect();
        let mut missing_keys = Vec::new();
        for key in &treated_as_referenced {
            if source.contains_key(key) {
                continue;
            }
            let analysis = validator.analyze(key);
            missing_keys.push(MissingKey {
                key: key.clone(),
                suspicious: analysis.suspicious,
                reason: analysis.reason,
                fallback_literal: index.fallback_literal(key).map(str::to_owned),
            });
        }

        let mut unused_keys = Vec::new();
        for key in source.keys() {
            if referenced.contains(key) || assumed.contains(key) || expanded.contains(key) {
                continue;
            }
            let mut locales = vec![self.config.source_language.clone()];
            locales.extend(
                targets
                    .iter()
                    .filter(|t| t.contains_key(key))
                    .map(|t| t.locale.clone()),
            );
            unused_keys.push(UnusedKey {
                key: key.to_owned(),
                locales,
            });
        }

        // validate
        let mut summary = SyncSummary {
            missing_keys,
            unused_keys,
            dynamic_key_warnings: index.dynamic_key_warnings.clone(),
            assumed_keys: std::mem::take(&mut assumed).into_iter().collect(),
            files_scanned: outcome.files_scanned,
            cache_hits: outcome.cache_hits,
            files_parsed: outcome.files_parsed,
            ..SyncSummary::default()
        };

        if self.config.sync.validate_interpolations {
            for target in &targets {
                for key in source.keys() {
                    let (Some(source_value), Some(target_value)) =
                        (source.get(key), target.get(key))
                    else {
                        continue;
                    };
                    if target_value.trim().is_empty() {
                        continue;
                    }
                    let diff = diff_placeholders(
                        source_value,
                        target_value,
                        &self.config.sync.placeholder_formats,
                    );
                    if !diff.is_empty() {
                        summary.placeholder_issues.push(PlaceholderIssue {
                            key: key.to_owned(),
                            locale: target.locale.clone(),
                            diff,
                        });
                    }
                }
            }
        }

        if self.config.sync.empty_value_policy != EmptyValuePolicy::Ignore {
            for key in source.keys() {
                let value = source.get(key).unwrap_or_default();
                let is_marker = self
                    .config
                    .sync
                    .empty_value_markers
                    .iter()
                    .any(|m| value == m);
                if value.trim().is_empty() || is_marker {
                    summary.empty_value_violations.push(EmptyValueViolation {
                        key: key.to_owned(),
                        value: value.to_owned(),
                    });
                }
            }
            if self.config.sync.empty_value_policy == EmptyValuePolicy::Fail
                && !summary.empty_value_violations.is_empty()
            {
                summary.policy_failed = true;
            }
        }

        let mut seen_suspicious = BTreeSet::new();
        for key in referenced.iter().map(String::as_str).chain(source.keys()) {
            if !seen_suspicious.insert(key.to_owned()) {
                continue;
            }
            let analysis = match source.get(key) {
                Some(value) => validator.analyze_with_value(key, value),
                None => validator.analyze(key),
            };
            if let Some(reason) = analysis.reason {
                summary.suspicious_keys.push(SuspiciousKeyFinding {
                    key: key.to_owned(),
                    reason,
                    suggested_fix: validator.suggest_fix(key, reason),
                });
            }
        }

        // report | write
        if options.write {
            self.apply(options, &mut summary, &mut source, &mut targets)?;
        }

        Ok(summary)
    }

    /// The write pass. Only selection-filtered additions (and, under
    /// `prune`, removals) touch the stores; suspicious additions stay out
    /// unless the policy allows them.
    fn apply(
        &self,
        options: &SyncOptions,
        summary: &mut SyncSummary,
        source: &mut LocaleStore,
        targets: &mut [LocaleStore],
    ) -> Result<()> {
        let selected = |key: &str| {
            options
                .selection
                .as_ref()
                .is_none_or(|selection| selection.contains(key))
        };
        let allow_suspicious =
            self.config.sync.suspicious_key_policy == SuspiciousKeyPolicy::Allow;

        let mut stats: BTreeMap<String, LocaleWriteStats> =
            std::iter::once(&self.config.source_language)
                .chain(self.config.target_languages.iter())
                .map(|locale| {
                    (
                        locale.clone(),
                        LocaleWriteStats {
                            locale: locale.clone(),
                            ..LocaleWriteStats::default()
                        },
                    )
                })
                .collect();

        for missing in &summary.missing_keys {
            if !selected(&missing.key) || (missing.suspicious && !allow_suspicious) {
                continue;
            }
            let value = missing
                .fallback_literal
                .clone()
                .unwrap_or_else(|| missing.key.clone());
            source.insert(&missing.key, &value);
            if let Some(s) = stats.get_mut(&self.config.source_language) {
                s.added += 1;
            }
            for target in targets.iter_mut() {
                if target.contains_key(&missing.key) {
                    continue;
                }
                let seed = if options.seed_target_locales { value.as_str() } else { "" };
                target.insert(&missing.key, seed);
                if let Some(s) = stats.get_mut(&target.locale) {
                    s.added += 1;
                }
            }
        }

        if options.prune {
            for unused in &summary.unused_keys {
                if !selected(&unused.key) {
                    continue;
                }
                if source.remove(&unused.key)
                    && let Some(s) = stats.get_mut(&self.config.source_language)
                {
                    s.removed += 1;
                }
                for target in targets.iter_mut() {
                    if target.remove(&unused.key)
                        && let Some(s) = stats.get_mut(&target.locale)
                    {
                        s.removed += 1;
                    }
                }
            }
        }

        source.save()?;
        for target in targets.iter() {
            target.save()?;
        }

        summary.write_stats = stats.into_values().collect();
        Ok(())
    }

    fn load_store(&self, locale: &str) -> Result<LocaleStore> {
        let path = self.config.locale_path(&self.workspace_root, locale);
        LocaleStore::load(&path, locale, &self.config.key_delimiter)
            .with_context(|| format!("Failed to load locale store: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::{TempDir, tempdir};

    use super::*;

    fn workspace(source_json: &str, code: &str) -> (TempDir, Config) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("locales")).unwrap();
        fs::write(dir.path().join("locales/en.json"), source_json).unwrap();
        fs::write(dir.path().join("app.ts"), code).unwrap();

        let config = Config {
            target_languages: vec!["de".to_string()],
            ..Config::default()
        };
        fs::write(
            dir.path().join("locales/de.json"),
            "{}\n",
        )
        .unwrap();
        (dir, config)
    }

    fn run(dir: &TempDir, config: &Config, options: &SyncOptions) -> SyncSummary {
        Syncer::new(config, dir.path()).run(options).unwrap()
    }

    #[test]
    fn test_missing_and_unused_partition() {
        let (dir, config) = workspace(
            r#"{ "nav": { "home": "Home" }, "stale": { "key": "Old" } }"#,
            r#"const a = t("nav.home"); const b = t("nav.about");"#,
        );

        let summary = run(&dir, &config, &SyncOptions::default());

        let missing: Vec<&str> = summary.missing_keys.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(missing, vec!["nav.about"]);
        let unused: Vec<&str> = summary.unused_keys.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(unused, vec!["stale.key"]);
        // A key is never both missing and unused.
        assert!(!summary.missing_keys.iter().any(|m| unused.contains(&m.key.as_str())));
    }

    #[test]
    fn test_assumed_and_expanded_keys_count_as_referenced() {
        let (dir, mut config) = workspace(
            r#"{ "manual": { "key": "x" }, "item": { "a": { "label": "A" } } }"#,
            "export {};",
        );
        config
            .dynamic_keys
            .expand
            .insert("item.*.label".to_string(), vec!["a".to_string()]);

        let options = SyncOptions {
            assumed_keys: vec!["manual.key".to_string()],
            ..SyncOptions::default()
        };
        let summary = run(&dir, &config, &options);

        assert!(summary.unused_keys.is_empty());
        assert_eq!(summary.assumed_keys, vec!["manual.key"]);
    }

    #[test]
    fn test_fallback_literal_seeds_source_value() {
        let (dir, mut config) = workspace(
            "{}",
            r#"const a = t("greeting") || "Hello";"#,
        );
        // "greeting" is single-word-suspicious; let it through so the
        // seeding path is exercised.
        config.sync.suspicious_key_policy = SuspiciousKeyPolicy::Allow;

        let summary = run(&dir, &config, &SyncOptions::default());
        assert_eq!(
            summary.missing_keys[0].fallback_literal.as_deref(),
            Some("Hello")
        );

        let options = SyncOptions {
            write: true,
            ..SyncOptions::default()
        };
        run(&dir, &config, &options);

        let en: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("locales/en.json")).unwrap())
                .unwrap();
        assert_eq!(en["greeting"], "Hello");
        let de: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("locales/de.json")).unwrap())
                .unwrap();
        assert_eq!(de["greeting"], "");
    }

    #[test]
    fn test_prune_gate() {
        let (dir, config) = workspace(
            r#"{ "unused": { "key": "Old" } }"#,
            "export {};",
        );

        // write without prune leaves the key untouched
        let options = SyncOptions {
            write: true,
            ..SyncOptions::default()
        };
        run(&dir, &config, &options);
        let en = fs::read_to_string(dir.path().join("locales/en.json")).unwrap();
        assert!(en.contains("unused"));

        // write + prune removes it from every locale
        let options = SyncOptions {
            write: true,
            prune: true,
            ..SyncOptions::default()
        };
        run(&dir, &config, &options);
        let en = fs::read_to_string(dir.path().join("locales/en.json")).unwrap();
        assert!(!en.contains("unused"));
    }

    #[test]
    fn test_suspicious_additions_excluded_from_write_by_default() {
        let (dir, config) = workspace("{}", r#"const a = t("Save changes now");"#);

        let summary = run(&dir, &config, &SyncOptions::default());
        assert!(summary.missing_keys[0].suspicious);
        assert_eq!(
            summary.missing_keys[0].reason,
            Some(SuspiciousKeyReason::ContainsSpaces)
        );

        let options = SyncOptions {
            write: true,
            ..SyncOptions::default()
        };
        run(&dir, &config, &options);
        let en = fs::read_to_string(dir.path().join("locales/en.json")).unwrap();
        assert!(!en.contains("Save changes now"));
    }

    #[test]
    fn test_suspicious_policy_allow_writes_anyway() {
        let (dir, mut config) = workspace("{}", r#"const a = t("Save changes now");"#);
        config.sync.suspicious_key_policy = SuspiciousKeyPolicy::Allow;

        let options = SyncOptions {
            write: true,
            ..SyncOptions::default()
        };
        run(&dir, &config, &options);
        let en = fs::read_to_string(dir.path().join("locales/en.json")).unwrap();
        assert!(en.contains("Save changes now"));
    }

    #[test]
    fn test_selection_restricts_write() {
        let (dir, config) = workspace(
            "{}",
            r#"const a = t("alpha.key"); const b = t("beta.key");"#,
        );

        let options = SyncOptions {
            write: true,
            selection: Some(["alpha.key".to_string()].into_iter().collect()),
            ..SyncOptions::default()
        };
        run(&dir, &config, &options);
        let en = fs::read_to_string(dir.path().join("locales/en.json")).unwrap();
        assert!(en.contains("alpha.key"));
        assert!(!en.contains("beta.key"));
    }

    #[test]
    fn test_empty_value_policy_fail_marks_summary_failed() {
        let (dir, mut config) = workspace(
            r#"{ "blank": { "key": "" }, "todo": { "key": "TODO" } }"#,
            r#"const a = t("blank.key"); const b = t("todo.key");"#,
        );
        config.sync.empty_value_policy = EmptyValuePolicy::Fail;

        let summary = run(&dir, &config, &SyncOptions::default());
        assert_eq!(summary.empty_value_violations.len(), 2);
        assert!(!summary.ok());
    }

    #[test]
    fn test_empty_value_policy_ignore() {
        let (dir, mut config) = workspace(
            r#"{ "blank": { "key": "" } }"#,
            r#"const a = t("blank.key");"#,
        );
        config.sync.empty_value_policy = EmptyValuePolicy::Ignore;

        let summary = run(&dir, &config, &SyncOptions::default());
        assert!(summary.empty_value_violations.is_empty());
        assert!(summary.ok());
    }

    #[test]
    fn test_placeholder_mismatch_reported() {
        let (dir, config) = workspace(
            r#"{ "welcome": "Hello {{name}}!" }"#,
            r#"const a = t("welcome");"#,
        );
        fs::write(
            dir.path().join("locales/de.json"),
            r#"{ "welcome": "Hallo {{nom}}!" }"#,
        )
        .unwrap();

        let summary = run(&dir, &config, &SyncOptions::default());
        assert_eq!(summary.placeholder_issues.len(), 1);
        let issue = &summary.placeholder_issues[0];
        assert_eq!(issue.locale, "de");
        assert_eq!(issue.diff.missing, vec!["name"]);
        assert_eq!(issue.diff.extra, vec!["nom"]);
    }

    /// The findings a repeated dry run must reproduce byte for byte. Run
    /// stats (cache hits, files parsed) legitimately differ between a cold
    /// and a warm run and are excluded.
    fn findings_json(summary: &SyncSummary) -> String {
        serde_json::to_string(&(
            &summary.missing_keys,
            &summary.unused_keys,
            &summary.placeholder_issues,
            &summary.empty_value_violations,
            &summary.suspicious_keys,
            &summary.dynamic_key_warnings,
        ))
        .unwrap()
    }

    #[test]
    fn test_idempotent_findings() {
        let (dir, config) = workspace(
            r#"{ "nav": { "home": "Home" } }"#,
            r#"const a = t("nav.home"); const b = t("nav.about");"#,
        );

        let first = findings_json(&run(&dir, &config, &SyncOptions::default()));
        let second = findings_json(&run(&dir, &config, &SyncOptions::default()));
        assert_eq!(first, second);
    }
}

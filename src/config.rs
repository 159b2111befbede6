use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::cache;
use crate::core::placeholders::PlaceholderFormat;
use crate::core::validator::{KeyValidator, NamingConvention};

pub const CONFIG_FILE_NAME: &str = ".keysyncrc.json";

/// How empty (or marker-valued) translations in the source store are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmptyValuePolicy {
    #[default]
    Warn,
    Fail,
    Ignore,
}

/// Whether suspicious keys may still be written to the locale stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuspiciousKeyPolicy {
    /// Report and keep the key out of writes.
    #[default]
    Warn,
    /// Report but write anyway.
    Allow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_source_language")]
    pub source_language: String,
    #[serde(default)]
    pub target_languages: Vec<String>,
    #[serde(default = "default_locales_dir")]
    pub locales_dir: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_key_delimiter")]
    pub key_delimiter: String,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub dynamic_keys: DynamicKeysConfig,
}

/// The sync-relevant subset; hashed into the cache header, so any change
/// here discards cached extractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default = "default_translation_identifier")]
    pub translation_identifier: String,
    #[serde(default = "default_true")]
    pub validate_interpolations: bool,
    #[serde(default = "default_placeholder_formats")]
    pub placeholder_formats: Vec<PlaceholderFormat>,
    #[serde(default)]
    pub empty_value_policy: EmptyValuePolicy,
    #[serde(default = "default_empty_value_markers")]
    pub empty_value_markers: Vec<String>,
    #[serde(default)]
    pub suspicious_key_policy: SuspiciousKeyPolicy,
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    #[serde(default)]
    pub naming_convention: NamingConvention,
    #[serde(default = "default_max_key_words")]
    pub max_key_words: usize,
    #[serde(default)]
    pub preserve_existing_convention: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicKeysConfig {
    /// `pattern -> wildcard values`, expanded in lock step.
    #[serde(default)]
    pub expand: std::collections::BTreeMap<String, Vec<String>>,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_locales_dir() -> String {
    "./locales".to_string()
}

fn default_key_delimiter() -> String {
    ".".to_string()
}

fn default_translation_identifier() -> String {
    "t".to_string()
}

fn default_true() -> bool {
    true
}

fn default_placeholder_formats() -> Vec<PlaceholderFormat> {
    vec![PlaceholderFormat::DoubleBrace, PlaceholderFormat::SingleBrace]
}

fn default_empty_value_markers() -> Vec<String> {
    vec!["__MISSING__".to_string(), "TODO".to_string()]
}

fn default_namespace() -> String {
    "common".to_string()
}

fn default_max_key_words() -> usize {
    6
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_languages: Vec::new(),
            locales_dir: default_locales_dir(),
            include: Vec::new(),
            exclude: Vec::new(),
            key_delimiter: default_key_delimiter(),
            sync: SyncConfig::default(),
            dynamic_keys: DynamicKeysConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            translation_identifier: default_translation_identifier(),
            validate_interpolations: default_true(),
            placeholder_formats: default_placeholder_formats(),
            empty_value_policy: EmptyValuePolicy::default(),
            empty_value_markers: default_empty_value_markers(),
            suspicious_key_policy: SuspiciousKeyPolicy::default(),
            default_namespace: default_namespace(),
            naming_convention: NamingConvention::default(),
            max_key_words: default_max_key_words(),
            preserve_existing_convention: false,
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error for invalid glob patterns and for a target-language
    /// list that repeats the source language.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.exclude {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern)
                    .with_context(|| format!("Invalid glob pattern in 'exclude': \"{}\"", pattern))?;
            }
        }

        // Patterns without wildcards are literal directory paths, so
        // bracketed route segments are valid without escaping.
        for pattern in &self.include {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern)
                    .with_context(|| format!("Invalid glob pattern in 'include': \"{}\"", pattern))?;
            }
        }

        if self.key_delimiter.is_empty() {
            anyhow::bail!("'keyDelimiter' must not be empty");
        }

        if self.target_languages.contains(&self.source_language) {
            anyhow::bail!(
                "'targetLanguages' must not contain the source language \"{}\"",
                self.source_language
            );
        }

        Ok(())
    }

    /// Deterministic hash over everything that affects extraction and
    /// reconciliation semantics. Feeds whole-cache invalidation.
    pub fn sync_hash(&self) -> String {
        cache::config_hash(&(
            &self.source_language,
            &self.target_languages,
            &self.key_delimiter,
            &self.include,
            &self.exclude,
            &self.sync,
            &self.dynamic_keys,
        ))
    }

    /// Validator configured from the sync section.
    pub fn key_validator(&self) -> KeyValidator {
        KeyValidator {
            default_namespace: self.sync.default_namespace.clone(),
            convention: self.sync.naming_convention,
            max_key_words: self.sync.max_key_words,
            preserve_existing_convention: self.sync.preserve_existing_convention,
        }
    }

    /// Path of one locale's store file under the locales dir.
    pub fn locale_path(&self, workspace_root: &Path, locale: &str) -> PathBuf {
        workspace_root
            .join(&self.locales_dir)
            .join(format!("{}.json", locale))
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}

//! Command dispatch.
//!
//! Resolves the workspace root and configuration, applies CLI overrides,
//! and hands off to the engine. Each command returns a `RunResult` that the
//! reporting layer prints and the exit-status layer maps to a process code.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{Context, Result};

use super::args::{Arguments, Command, CommonArgs, KeysCommand, LintCommand, SyncCommand};
use crate::config::{self, CONFIG_FILE_NAME, Config, default_config_json};
use crate::core::cache::EXTRACT_CACHE_FILE;
use crate::core::extract::{ExtractOptions, ReferenceExtractor};
use crate::core::locales::LocaleStore;
use crate::core::reference::ReferenceIndex;
use crate::core::sync::{SuspiciousKeyFinding, SyncOptions, SyncSummary, Syncer};

pub enum RunResult {
    Sync(SyncSummary),
    Keys(KeysReport),
    Lint(LintReport),
    Init(InitSummary),
}

pub struct KeysReport {
    pub index: ReferenceIndex,
    pub files_scanned: usize,
    pub cache_hits: usize,
}

pub struct LintReport {
    pub keys_checked: usize,
    pub findings: Vec<SuspiciousKeyFinding>,
}

pub struct InitSummary {
    pub path: PathBuf,
}

pub fn run(Arguments { command }: Arguments) -> Result<RunResult> {
    match command {
        Some(Command::Sync(cmd)) => sync(cmd),
        Some(Command::Keys(cmd)) => keys(cmd),
        Some(Command::Lint(cmd)) => lint(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}

fn sync(cmd: SyncCommand) -> Result<RunResult> {
    let (root, config) = resolve(&cmd.common)?;

    let options = SyncOptions {
        write: cmd.write,
        prune: cmd.prune,
        invalidate_cache: cmd.invalidate_cache,
        targets: (!cmd.targets.is_empty()).then_some(cmd.targets),
        selection: (!cmd.only.is_empty())
            .then(|| cmd.only.iter().cloned().collect::<BTreeSet<String>>()),
        assumed_keys: cmd.assume,
        seed_target_locales: cmd.seed_target_locales,
        verbose: cmd.common.verbose,
    };

    let summary = Syncer::new(&config, &root).run(&options)?;
    Ok(RunResult::Sync(summary))
}

fn keys(cmd: KeysCommand) -> Result<RunResult> {
    let (root, config) = resolve(&cmd.common)?;

    let extractor = ReferenceExtractor::new(&root);
    let outcome = extractor.extract(&ExtractOptions {
        includes: &config.include,
        excludes: &config.exclude,
        translation_identifier: &config.sync.translation_identifier,
        cache_slot: EXTRACT_CACHE_FILE,
        config_hash: config.sync_hash(),
        invalidate_cache: cmd.invalidate_cache,
        targets: (!cmd.targets.is_empty()).then_some(cmd.targets.as_slice()),
        verbose: cmd.common.verbose,
    })?;

    Ok(RunResult::Keys(KeysReport {
        index: outcome.index,
        files_scanned: outcome.files_scanned,
        cache_hits: outcome.cache_hits,
    }))
}

fn lint(cmd: LintCommand) -> Result<RunResult> {
    let (root, config) = resolve(&cmd.common)?;

    let path = config.locale_path(&root, &config.source_language);
    let store = LocaleStore::load(&path, &config.source_language, &config.key_delimiter)
        .with_context(|| format!("Failed to load locale store: {}", path.display()))?;

    let validator = config.key_validator();
    let mut findings = Vec::new();
    let mut keys_checked = 0;
    for key in store.keys() {
        keys_checked += 1;
        let analysis = match store.get(key) {
            Some(value) => validator.analyze_with_value(key, value),
            None => validator.analyze(key),
        };
        if let Some(reason) = analysis.reason {
            findings.push(SuspiciousKeyFinding {
                key: key.to_owned(),
                reason,
                suggested_fix: validator.suggest_fix(key, reason),
            });
        }
    }

    Ok(RunResult::Lint(LintReport {
        keys_checked,
        findings,
    }))
}

fn init() -> Result<RunResult> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", CONFIG_FILE_NAME);
    }

    fs::write(config_path, default_config_json()?)?;
    Ok(RunResult::Init(InitSummary {
        path: config_path.to_path_buf(),
    }))
}

/// Workspace root plus config with CLI overrides layered on top.
fn resolve(common: &CommonArgs) -> Result<(PathBuf, Config)> {
    let root = match &common.source_root {
        Some(path) => path.clone(),
        None => env::current_dir().context("Cannot determine the current directory")?,
    };

    let mut config = config::load_config(&root)?.config;
    if let Some(dir) = &common.locales_dir {
        config.locales_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(language) = &common.source_language {
        config.source_language = language.clone();
    }
    config.validate()?;

    Ok((root, config))
}

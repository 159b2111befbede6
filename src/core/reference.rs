//! Core data model for extracted translation references.
//!
//! A `TranslationReference` is produced for every call site whose key argument
//! is a compile-time literal. Call sites whose key argument is dynamic produce
//! a `DynamicKeyWarning` instead. Per-file results (`FileExtraction`) are
//! merged into a `ReferenceIndex` by the extractor; the index is append-only
//! for the duration of one run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 1-based line/column position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A literal translation key found at a call site.
///
/// `fallback_literal` captures a sibling default string in an OR/nullish
/// pattern (`t(key) || "Default"`), later used to seed an initial value
/// when the key is written to the source locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationReference {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_literal: Option<String>,
    pub file_path: String,
    pub position: Position,
}

/// Why a call site's key argument could not be treated as a literal.
///
/// Each reason implies a different remediation: templates can often be
/// declared as dynamic-key patterns, concatenation usually wants a template
/// rewrite, arbitrary expressions need an explicit assumed-keys entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicKeyReason {
    /// Substitution-bearing template: `` t(`item.${id}`) ``
    Template,
    /// String concatenation: `t("item." + id)`
    Binary,
    /// Anything else: variables, ternaries, function calls.
    Expression,
}

impl fmt::Display for DynamicKeyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicKeyReason::Template => write!(f, "template"),
            DynamicKeyReason::Binary => write!(f, "binary"),
            DynamicKeyReason::Expression => write!(f, "expression"),
        }
    }
}

/// A call site whose key argument is not a compile-time literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicKeyWarning {
    pub file_path: String,
    pub position: Position,
    /// Source text of the offending argument, for reporting.
    pub expression: String,
    pub reason: DynamicKeyReason,
}

/// Extraction result for a single source file.
///
/// This is what a dialect parser returns and what the fingerprint cache
/// stores per file. Entries are replaced wholesale on re-parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExtraction {
    pub references: Vec<TranslationReference>,
    pub dynamic_key_warnings: Vec<DynamicKeyWarning>,
}

impl FileExtraction {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.dynamic_key_warnings.is_empty()
    }
}

/// Global reference index for one extraction run.
///
/// Keys map to every call site referencing them. The map is append-only
/// during a run; a `BTreeMap` keeps iteration deterministic so repeated
/// runs over an unchanged tree produce identical summaries.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    pub references_by_key: BTreeMap<String, Vec<TranslationReference>>,
    pub dynamic_key_warnings: Vec<DynamicKeyWarning>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one file's extraction into the index.
    pub fn absorb(&mut self, extraction: &FileExtraction) {
        for reference in &extraction.references {
            self.references_by_key
                .entry(reference.key.clone())
                .or_default()
                .push(reference.clone());
        }
        self.dynamic_key_warnings
            .extend(extraction.dynamic_key_warnings.iter().cloned());
    }

    /// All distinct referenced keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.references_by_key.keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.references_by_key.contains_key(key)
    }

    /// The first captured fallback literal for a key, if any call site had one.
    pub fn fallback_literal(&self, key: &str) -> Option<&str> {
        self.references_by_key
            .get(key)?
            .iter()
            .find_map(|r| r.fallback_literal.as_deref())
    }

    /// Total number of call sites across all keys.
    pub fn reference_count(&self) -> usize {
        self.references_by_key.values().map(Vec::len).sum()
    }
}

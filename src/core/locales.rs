//! Locale store: flat or nested JSON key-value files.
//!
//! The syncer treats a store as an opaque `key -> value` map. On disk a
//! store may be flat (`"nav.title": "..."`), or nested objects joined by a
//! configurable delimiter; the shape observed at load time is reproduced on
//! save so a sync run never rewrites a file into the other layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// Flat key -> value view of one locale file. Sorted for deterministic output.
pub type LocaleMap = BTreeMap<String, String>;

/// On-disk layout of a locale file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleShape {
    /// Top-level object of string values with delimited keys.
    Flat,
    /// Nested objects, one level per key segment.
    Nested,
}

/// One locale's store, loaded into a flat map.
#[derive(Debug, Clone)]
pub struct LocaleStore {
    pub locale: String,
    pub path: PathBuf,
    pub shape: LocaleShape,
    pub entries: LocaleMap,
    delimiter: String,
    /// Non-string leaves (`"count": 5`) by flat key, kept as their original
    /// JSON values so a save never coerces them into strings. `entries`
    /// still carries their text form for comparison and reporting.
    raw: BTreeMap<String, Value>,
}

impl LocaleStore {
    /// Load a locale file, flattening nested objects with `delimiter`.
    ///
    /// A missing file yields an empty nested store (the file is created on
    /// first save). Unreadable or non-object JSON is an error; the caller
    /// decides whether that is fatal (source locale) or not.
    pub fn load(path: &Path, locale: &str, delimiter: &str) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                locale: locale.to_string(),
                path: path.to_path_buf(),
                shape: LocaleShape::Nested,
                entries: LocaleMap::new(),
                delimiter: delimiter.to_string(),
                raw: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read locale file: {}", path.display()))?;
        let json: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse locale file: {}", path.display()))?;

        let Value::Object(map) = json else {
            bail!("Root of locale file must be an object: {}", path.display());
        };

        let shape = if map.values().any(Value::is_object) {
            LocaleShape::Nested
        } else {
            LocaleShape::Flat
        };

        let mut leaves = BTreeMap::new();
        flatten_object(&map, "", delimiter, &mut leaves);

        let mut entries = LocaleMap::new();
        let mut raw = BTreeMap::new();
        for (key, value) in leaves {
            match value {
                Value::String(s) => {
                    entries.insert(key, s);
                }
                other => {
                    entries.insert(key.clone(), other.to_string());
                    raw.insert(key, other);
                }
            }
        }

        Ok(Self {
            locale: locale.to_string(),
            path: path.to_path_buf(),
            shape,
            entries,
            delimiter: delimiter.to_string(),
            raw,
        })
    }

    /// Write the store back in its original shape, pretty-printed with a
    /// trailing newline. Parent directories are created as needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let root = match self.shape {
            LocaleShape::Flat => {
                let mut map = Map::new();
                for (key, value) in &self.entries {
                    map.insert(key.clone(), self.leaf_value(key, value));
                }
                Value::Object(map)
            }
            LocaleShape::Nested => {
                let mut root = Map::new();
                for (key, value) in &self.entries {
                    let parts: Vec<&str> = key.split(self.delimiter.as_str()).collect();
                    insert_nested(&mut root, &parts, self.leaf_value(key, value));
                }
                Value::Object(root)
            }
        };

        let content = serde_json::to_string_pretty(&root).context("Failed to serialize JSON")?;
        fs::write(&self.path, format!("{}\n", content))
            .with_context(|| format!("Failed to write locale file: {}", self.path.display()))?;

        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.raw.remove(key);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.raw.remove(key);
        self.entries.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn leaf_value(&self, key: &str, value: &str) -> Value {
        self.raw
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::String(value.to_string()))
    }
}

fn flatten_object(
    map: &Map<String, Value>,
    prefix: &str,
    delimiter: &str,
    out: &mut BTreeMap<String, Value>,
) {
    for (key, value) in map {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, delimiter, key)
        };
        match value {
            Value::Object(inner) => flatten_object(inner, &full_key, delimiter, out),
            leaf => {
                out.insert(full_key, leaf.clone());
            }
        }
    }
}

/// Insert one flat key's value into a nested object tree.
///
/// When a key path collides with an existing leaf (`"a": "x"` vs
/// `"a.b": "y"`), the nested path wins and the leaf is replaced by an
/// object, matching how most i18n runtimes resolve the conflict.
fn insert_nested(map: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [leaf] => {
            map.insert(leaf.to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_nested(inner, rest, value);
            }
        }
    }
}

//! Wildcard key pattern expansion for dynamic-key coverage accounting.
//!
//! Configuration maps a pattern such as `item.*.label` to an array of
//! substitution values. Expanded keys are treated as referenced even though
//! no literal call site exists for them, which keeps legitimately dynamic
//! keys out of the unused report.

use std::collections::BTreeMap;

use crate::core::locales::LocaleMap;

/// Expand a wildcard pattern with a value array.
///
/// Zero wildcards returns the pattern verbatim. With N wildcards and M
/// values the result is exactly M keys: every `*` in one key is replaced by
/// the value at the same index, never the M^N cartesian product.
pub fn expand_pattern(pattern: &str, values: &[String]) -> Vec<String> {
    if !pattern.contains('*') {
        return vec![pattern.to_string()];
    }

    values
        .iter()
        .map(|value| pattern.replace('*', value))
        .collect()
}

/// Expand every configured pattern into one flat, sorted, deduplicated set.
pub fn expand_all(patterns: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut keys: Vec<String> = patterns
        .iter()
        .flat_map(|(pattern, values)| expand_pattern(pattern, values))
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Per-pattern, per-locale coverage of expanded keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCoverage {
    pub pattern: String,
    pub expanded: Vec<String>,
    /// Locale -> expanded keys absent from that locale's store.
    pub missing_by_locale: BTreeMap<String, Vec<String>>,
}

/// Compute coverage for every configured pattern against the given locales.
pub fn coverage(
    patterns: &BTreeMap<String, Vec<String>>,
    locales: &BTreeMap<String, LocaleMap>,
) -> Vec<PatternCoverage> {
    patterns
        .iter()
        .map(|(pattern, values)| {
            let expanded = expand_pattern(pattern, values);
            let missing_by_locale = locales
                .iter()
                .map(|(locale, store)| {
                    let missing: Vec<String> = expanded
                        .iter()
                        .filter(|key| !store.contains_key(key.as_str()))
                        .cloned()
                        .collect();
                    (locale.clone(), missing)
                })
                .collect();
            PatternCoverage {
                pattern: pattern.clone(),
                expanded,
                missing_by_locale,
            }
        })
        .collect()
}

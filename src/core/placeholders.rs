//! Interpolation placeholder extraction and comparison.
//!
//! For keys present in both the source and a target locale, the syncer
//! extracts placeholder tokens from each value per the configured dialects
//! and diffs them. A target value missing `{name}` will render the raw text
//! at runtime, so mismatches are reported even in dry runs.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder dialects a locale value may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderFormat {
    /// `{name}` (ICU / next-intl style)
    SingleBrace,
    /// `{{name}}` (i18next style)
    DoubleBrace,
    /// `%s`, `%d`, `%(name)s` (printf style)
    Printf,
    /// `:name` (Laravel style)
    Colon,
}

static DOUBLE_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());
static SINGLE_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}").unwrap());
static PRINTF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%(?:\(([A-Za-z_][A-Za-z0-9_]*)\))?[sdif]").unwrap());
static COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// Extract placeholder tokens from a value.
///
/// Returns a token -> occurrence-count map so repeated unnamed printf
/// placeholders still diff correctly. Double-brace runs before single-brace
/// and masks its matches, so `{{name}}` never also matches as `{name}`.
pub fn extract_placeholders(
    value: &str,
    formats: &[PlaceholderFormat],
) -> BTreeMap<String, usize> {
    let mut tokens = BTreeMap::new();
    let mut masked = value.to_string();

    if formats.contains(&PlaceholderFormat::DoubleBrace) {
        collect(&DOUBLE_BRACE, &mut masked, &mut tokens);
    }
    if formats.contains(&PlaceholderFormat::SingleBrace) {
        collect(&SINGLE_BRACE, &mut masked, &mut tokens);
    }
    if formats.contains(&PlaceholderFormat::Printf) {
        collect(&PRINTF, &mut masked, &mut tokens);
    }
    if formats.contains(&PlaceholderFormat::Colon) {
        collect(&COLON, &mut masked, &mut tokens);
    }

    tokens
}

fn collect(regex: &Regex, masked: &mut String, tokens: &mut BTreeMap<String, usize>) {
    let mut replacement = String::with_capacity(masked.len());
    let mut last = 0;
    for captures in regex.captures_iter(masked) {
        let whole = captures.get(0).unwrap();
        let token = captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| whole.as_str().to_string());
        *tokens.entry(token).or_insert(0) += 1;

        replacement.push_str(&masked[last..whole.start()]);
        // Mask matched text so a later (looser) pattern cannot re-match it.
        replacement.extend(std::iter::repeat_n(' ', whole.len()));
        last = whole.end();
    }
    replacement.push_str(&masked[last..]);
    *masked = replacement;
}

/// Placeholder difference between a source value and a target value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderDiff {
    /// Tokens present in the source value but absent from the target.
    pub missing: Vec<String>,
    /// Tokens present in the target value but absent from the source.
    pub extra: Vec<String>,
}

impl PlaceholderDiff {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Diff the placeholders of a source and a target value.
pub fn diff_placeholders(
    source_value: &str,
    target_value: &str,
    formats: &[PlaceholderFormat],
) -> PlaceholderDiff {
    let source = extract_placeholders(source_value, formats);
    let target = extract_placeholders(target_value, formats);

    let missing = source
        .iter()
        .filter(|(token, count)| target.get(*token).copied().unwrap_or(0) < **count)
        .map(|(token, _)| token.clone())
        .collect();
    let extra = target
        .iter()
        .filter(|(token, count)| source.get(*token).copied().unwrap_or(0) < **count)
        .map(|(token, _)| token.clone())
        .collect();

    PlaceholderDiff { missing, extra }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL: &[PlaceholderFormat] = &[
        PlaceholderFormat::DoubleBrace,
        PlaceholderFormat::SingleBrace,
        PlaceholderFormat::Printf,
        PlaceholderFormat::Colon,
    ];

    fn names(tokens: &BTreeMap<String, usize>) -> Vec<&str> {
        tokens.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_single_brace() {
        let tokens = extract_placeholders("Hello {name}, {count} new", &[PlaceholderFormat::SingleBrace]);
        assert_eq!(names(&tokens), vec!["count", "name"]);
    }

    #[test]
    fn test_double_brace_masks_single() {
        let tokens = extract_placeholders("Hello {{name}}", ALL);
        assert_eq!(names(&tokens), vec!["name"]);
        assert_eq!(tokens["name"], 1);
    }

    #[test]
    fn test_printf_named_and_positional() {
        let tokens = extract_placeholders("%(user)s has %d items and %d carts", ALL);
        assert_eq!(tokens["user"], 1);
        assert_eq!(tokens["%d"], 2);
    }

    #[test]
    fn test_colon_format() {
        let tokens = extract_placeholders("Welcome :name", &[PlaceholderFormat::Colon]);
        assert_eq!(names(&tokens), vec!["name"]);
    }

    #[test]
    fn test_unconfigured_format_ignored() {
        let tokens = extract_placeholders("Welcome :name", &[PlaceholderFormat::SingleBrace]);
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_diff_missing_and_extra() {
        let diff = diff_placeholders(
            "Hello {name}, {count} new",
            "Hallo {name}, {total} neu",
            &[PlaceholderFormat::SingleBrace],
        );
        assert_eq!(diff.missing, vec!["count"]);
        assert_eq!(diff.extra, vec!["total"]);
    }

    #[test]
    fn test_diff_counts_repeats() {
        let diff = diff_placeholders("%d of %d", "%d", &[PlaceholderFormat::Printf]);
        assert_eq!(diff.missing, vec!["%d"]);
        assert!(diff.extra.is_empty());
    }

    #[test]
    fn test_diff_equal_is_empty() {
        let diff = diff_placeholders("Hi {a}", "Hola {a}", &[PlaceholderFormat::SingleBrace]);
        assert!(diff.is_empty());
    }
}

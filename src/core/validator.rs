//! Suspicious-key classification and key normalization.
//!
//! A key is "suspicious" when its shape suggests raw UI text rather than a
//! structured identifier (`t("Are you sure?")` instead of
//! `t("common.confirm")`). Classification applies an ordered taxonomy where
//! the first matching rule wins, so reports stay stable as rules are added.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Words that indicate a key is really an English sentence fragment.
///
/// Articles, common prepositions and auxiliary verbs; matched per
/// case-boundary token in the final key segment.
const SENTENCE_INDICATORS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "to", "of", "in", "on", "at", "for",
    "with", "your", "you", "this", "that", "do", "does", "has", "have",
];

/// Why a key was classified as suspicious. Ordered; first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuspiciousKeyReason {
    /// Key contains whitespace: `"Are you sure?"`
    ContainsSpaces,
    /// Single alphabetic word with no namespace: `"Found"`
    SingleWordNoNamespace,
    /// Key ends in `:`, `?` or `!`: `"loading:"`
    TrailingPunctuation,
    /// Final segment is a run of >= 4 capitalized fragments: `"nav.ThisIsATitle"`
    PascalCaseSentence,
    /// Final segment contains an article/preposition at a case boundary: `"nav.TheTitle"`
    SentenceArticle,
    /// Key (minus namespace) normalizes to the same text as its value.
    KeyEqualsValue,
}

impl fmt::Display for SuspiciousKeyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SuspiciousKeyReason::ContainsSpaces => "contains-spaces",
            SuspiciousKeyReason::SingleWordNoNamespace => "single-word-no-namespace",
            SuspiciousKeyReason::TrailingPunctuation => "trailing-punctuation",
            SuspiciousKeyReason::PascalCaseSentence => "pascal-case-sentence",
            SuspiciousKeyReason::SentenceArticle => "sentence-article",
            SuspiciousKeyReason::KeyEqualsValue => "key-equals-value",
        };
        write!(f, "{}", s)
    }
}

/// Naming convention used when re-joining normalized key tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamingConvention {
    #[default]
    Kebab,
    Camel,
    Snake,
}

impl NamingConvention {
    pub fn join(&self, tokens: &[String]) -> String {
        match self {
            NamingConvention::Kebab => tokens.join("-"),
            NamingConvention::Snake => tokens.join("_"),
            NamingConvention::Camel => {
                let mut out = String::new();
                for (i, token) in tokens.iter().enumerate() {
                    if i == 0 {
                        out.push_str(token);
                    } else {
                        let mut chars = token.chars();
                        if let Some(first) = chars.next() {
                            out.extend(first.to_uppercase());
                            out.push_str(chars.as_str());
                        }
                    }
                }
                out
            }
        }
    }
}

/// Result of analyzing a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAnalysis {
    pub suspicious: bool,
    pub reason: Option<SuspiciousKeyReason>,
}

impl KeyAnalysis {
    fn clean() -> Self {
        Self {
            suspicious: false,
            reason: None,
        }
    }

    fn flagged(reason: SuspiciousKeyReason) -> Self {
        Self {
            suspicious: true,
            reason: Some(reason),
        }
    }
}

/// Pure key classifier and fix suggester.
///
/// Holds only configuration; `analyze` has no side effects, so one validator
/// can be shared across a whole reconciliation run.
#[derive(Debug, Clone)]
pub struct KeyValidator {
    /// Namespace prefixed onto un-namespaced suggestions.
    pub default_namespace: String,
    /// Convention used to re-join normalized tokens.
    pub convention: NamingConvention,
    /// Maximum number of tokens kept in a normalized key.
    pub max_key_words: usize,
    /// Skip normalization when the key already matches a recognized convention.
    pub preserve_existing_convention: bool,
}

impl Default for KeyValidator {
    fn default() -> Self {
        Self {
            default_namespace: "common".to_string(),
            convention: NamingConvention::Kebab,
            max_key_words: 6,
            preserve_existing_convention: false,
        }
    }
}

impl KeyValidator {
    /// Classify a key. Rules are checked in a fixed order; first match wins.
    pub fn analyze(&self, key: &str) -> KeyAnalysis {
        if key.chars().any(char::is_whitespace) {
            return KeyAnalysis::flagged(SuspiciousKeyReason::ContainsSpaces);
        }

        if !key.contains('.') && !key.is_empty() && key.chars().all(char::is_alphabetic) {
            return KeyAnalysis::flagged(SuspiciousKeyReason::SingleWordNoNamespace);
        }

        if key.ends_with(':') || key.ends_with('?') || key.ends_with('!') {
            return KeyAnalysis::flagged(SuspiciousKeyReason::TrailingPunctuation);
        }

        let segment = final_segment(key);

        if is_pascal_case_sentence(segment) {
            return KeyAnalysis::flagged(SuspiciousKeyReason::PascalCaseSentence);
        }

        if has_sentence_indicator(segment) {
            return KeyAnalysis::flagged(SuspiciousKeyReason::SentenceArticle);
        }

        KeyAnalysis::clean()
    }

    /// Classify a key against its stored value.
    ///
    /// Runs the ordered taxonomy first; if the key survives, compares the
    /// key's final segment against the value after case/punctuation
    /// normalization. `t("common.submit")` with value `"Submit"` is flagged.
    pub fn analyze_with_value(&self, key: &str, value: &str) -> KeyAnalysis {
        let analysis = self.analyze(key);
        if analysis.suspicious {
            return analysis;
        }

        if normalize_for_compare(final_segment(key)) == normalize_for_compare(value) {
            return KeyAnalysis::flagged(SuspiciousKeyReason::KeyEqualsValue);
        }

        KeyAnalysis::clean()
    }

    /// Propose a replacement key for a suspicious one.
    ///
    /// Trailing punctuation is stripped in place and single words get the
    /// default namespace; every other reason routes through the general
    /// normalizer.
    pub fn suggest_fix(&self, key: &str, reason: SuspiciousKeyReason) -> String {
        match reason {
            SuspiciousKeyReason::TrailingPunctuation => {
                key.trim_end_matches([':', '?', '!', '.']).to_string()
            }
            SuspiciousKeyReason::SingleWordNoNamespace => {
                format!("{}.{}", self.default_namespace, key.to_lowercase())
            }
            _ => self.normalize(key),
        }
    }

    /// General key normalizer.
    ///
    /// Splits off a valid namespace prefix, tokenizes the remainder by
    /// punctuation and case boundaries, lowercases, truncates to the word
    /// budget, re-joins per convention and reattaches the namespace.
    pub fn normalize(&self, key: &str) -> String {
        let (namespace, remainder) = split_namespace(key);

        if self.preserve_existing_convention && matches_known_convention(remainder) {
            return key.to_string();
        }

        let mut tokens = tokenize(remainder);
        tokens.truncate(self.max_key_words);
        let joined = self.convention.join(&tokens);

        let namespace = namespace.unwrap_or(self.default_namespace.as_str());
        if namespace.is_empty() {
            joined
        } else {
            format!("{}.{}", namespace, joined)
        }
    }
}

/// Detect the dominant naming convention across a key corpus.
///
/// Each key's final segment votes: `-` for kebab, `_` for snake, a
/// lower-to-upper transition (with neither separator) for camel. Segments
/// with no signal vote with the current leader; ties go to kebab.
pub fn detect_convention<'a, I>(keys: I) -> NamingConvention
where
    I: IntoIterator<Item = &'a str>,
{
    let mut kebab = 0usize;
    let mut camel = 0usize;
    let mut snake = 0usize;

    for key in keys {
        let segment = final_segment(key);
        if segment.contains('-') {
            kebab += 1;
        } else if segment.contains('_') {
            snake += 1;
        } else if has_case_transition(segment) {
            camel += 1;
        } else {
            // No signal: side with the current leader.
            let leader = leader(kebab, camel, snake);
            match leader {
                NamingConvention::Kebab => kebab += 1,
                NamingConvention::Camel => camel += 1,
                NamingConvention::Snake => snake += 1,
            }
        }
    }

    leader(kebab, camel, snake)
}

fn leader(kebab: usize, camel: usize, snake: usize) -> NamingConvention {
    if camel > kebab && camel > snake {
        NamingConvention::Camel
    } else if snake > kebab && snake > camel {
        NamingConvention::Snake
    } else {
        NamingConvention::Kebab
    }
}

/// Final namespace segment of a key (`"nav.user.title"` -> `"title"`).
fn final_segment(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

/// Split a key into (namespace, remainder) at the last dot, keeping the
/// namespace only when it is a plausible identifier path.
fn split_namespace(key: &str) -> (Option<&str>, &str) {
    match key.rfind('.') {
        Some(idx) => {
            let (ns, rest) = (&key[..idx], &key[idx + 1..]);
            if !ns.is_empty() && ns.chars().all(|c| c.is_alphanumeric() || ".-_".contains(c)) {
                (Some(ns), rest)
            } else {
                (None, key)
            }
        }
        None => (None, key),
    }
}

/// Tokenize by punctuation, then insert breaks at lower-to-upper boundaries.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for chunk in text.split(|c: char| !c.is_alphanumeric()) {
        if chunk.is_empty() {
            continue;
        }
        let mut current = String::new();
        let mut prev_lower = false;
        for c in chunk.chars() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                tokens.push(current.to_lowercase());
                current = String::new();
            }
            prev_lower = c.is_lowercase() || c.is_numeric();
            current.push(c);
        }
        if !current.is_empty() {
            tokens.push(current.to_lowercase());
        }
    }
    tokens
}

/// Case-boundary tokens of a segment (no lowercasing).
fn case_tokens(segment: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_lower = false;
    for (i, c) in segment.char_indices() {
        if c.is_uppercase() && prev_lower && i > start {
            tokens.push(&segment[start..i]);
            start = i;
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
    }
    if start < segment.len() {
        tokens.push(&segment[start..]);
    }
    tokens
}

/// An unbroken run of >= 4 capitalized word-fragments with no separators.
fn is_pascal_case_sentence(segment: &str) -> bool {
    if segment.contains(['-', '_']) || !segment.chars().all(char::is_alphanumeric) {
        return false;
    }
    let tokens = case_tokens(segment);
    tokens.len() >= 4 && tokens.iter().all(|t| t.starts_with(char::is_uppercase))
}

/// A sentence-indicator word at a case boundary in the final segment.
fn has_sentence_indicator(segment: &str) -> bool {
    let tokens = case_tokens(segment);
    if tokens.len() < 2 {
        return false;
    }
    tokens
        .iter()
        .any(|t| SENTENCE_INDICATORS.contains(&t.to_lowercase().as_str()))
}

fn has_case_transition(segment: &str) -> bool {
    let mut prev_lower = false;
    for c in segment.chars() {
        if c.is_uppercase() && prev_lower {
            return true;
        }
        prev_lower = c.is_lowercase();
    }
    false
}

/// Does the segment already follow kebab, snake or camel case?
fn matches_known_convention(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    let kebab = segment
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let snake = segment
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    let camel = segment.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && segment.chars().all(char::is_alphanumeric);
    kebab || snake || camel
}

/// Lowercase and strip everything that is not alphanumeric, for
/// key-equals-value comparison.
fn normalize_for_compare(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn validator() -> KeyValidator {
        KeyValidator::default()
    }

    #[test]
    fn test_contains_spaces_wins_first() {
        let analysis = validator().analyze("Are you sure?");
        assert_eq!(analysis.reason, Some(SuspiciousKeyReason::ContainsSpaces));
    }

    #[test]
    fn test_single_word_no_namespace() {
        let analysis = validator().analyze("Found");
        assert_eq!(
            analysis.reason,
            Some(SuspiciousKeyReason::SingleWordNoNamespace)
        );
    }

    #[test]
    fn test_trailing_punctuation_before_sentence_article() {
        // "AreYouSure?" also contains the indicator "Are" at a case boundary,
        // but trailing punctuation is checked first.
        let analysis = validator().analyze("AreYouSure?");
        assert_eq!(
            analysis.reason,
            Some(SuspiciousKeyReason::TrailingPunctuation)
        );
    }

    #[test]
    fn test_pascal_case_sentence() {
        let analysis = validator().analyze("nav.ThisIsALongTitle");
        assert_eq!(
            analysis.reason,
            Some(SuspiciousKeyReason::PascalCaseSentence)
        );
    }

    #[test]
    fn test_sentence_article() {
        let analysis = validator().analyze("nav.TheTitle");
        assert_eq!(analysis.reason, Some(SuspiciousKeyReason::SentenceArticle));
    }

    #[test]
    fn test_structured_keys_are_clean() {
        for key in ["common.submit", "nav.user-menu.sign_out", "a.b.c", "errors.http404"] {
            let analysis = validator().analyze(key);
            assert!(!analysis.suspicious, "{} flagged as {:?}", key, analysis.reason);
        }
    }

    #[test]
    fn test_key_equals_value() {
        let analysis = validator().analyze_with_value("common.submit", "Submit");
        assert_eq!(analysis.reason, Some(SuspiciousKeyReason::KeyEqualsValue));

        let analysis = validator().analyze_with_value("common.submit", "Save changes");
        assert!(!analysis.suspicious);
    }

    #[test]
    fn test_key_equals_value_does_not_override_earlier_rules() {
        let analysis = validator().analyze_with_value("Found", "Found");
        assert_eq!(
            analysis.reason,
            Some(SuspiciousKeyReason::SingleWordNoNamespace)
        );
    }

    #[test]
    fn test_suggest_fix_trailing_punctuation() {
        let fix = validator().suggest_fix("nav.loading:", SuspiciousKeyReason::TrailingPunctuation);
        assert_eq!(fix, "nav.loading");
    }

    #[test]
    fn test_suggest_fix_single_word() {
        let fix = validator().suggest_fix("Found", SuspiciousKeyReason::SingleWordNoNamespace);
        assert_eq!(fix, "common.found");
    }

    #[test]
    fn test_suggest_fix_normalizes_sentence() {
        let fix = validator().suggest_fix("nav.TheTitle", SuspiciousKeyReason::SentenceArticle);
        assert_eq!(fix, "nav.the-title");
    }

    #[test]
    fn test_normalize_applies_word_budget() {
        let mut v = validator();
        v.max_key_words = 3;
        assert_eq!(
            v.normalize("SomeVeryLongSentenceAboutThings"),
            "common.some-very-long"
        );
    }

    #[test]
    fn test_normalize_conventions() {
        let mut v = validator();
        v.convention = NamingConvention::Snake;
        assert_eq!(v.normalize("nav.SignOut"), "nav.sign_out");

        v.convention = NamingConvention::Camel;
        assert_eq!(v.normalize("nav.SignOut"), "nav.signOut");
    }

    #[test]
    fn test_normalize_preserves_existing_convention() {
        let mut v = validator();
        v.preserve_existing_convention = true;
        assert_eq!(v.normalize("nav.sign-out"), "nav.sign-out");
        // Still normalizes keys that follow no convention.
        assert_eq!(v.normalize("nav.Sign Out!"), "nav.sign-out");
    }

    #[test]
    fn test_detect_convention_votes() {
        let keys = ["a.sign-out", "b.user-menu", "c.signOut"];
        assert_eq!(
            detect_convention(keys.iter().copied()),
            NamingConvention::Kebab
        );

        let keys = ["a.signOut", "b.userMenu", "c.sign_out"];
        assert_eq!(
            detect_convention(keys.iter().copied()),
            NamingConvention::Camel
        );
    }

    #[test]
    fn test_detect_convention_no_signal_follows_leader() {
        // "submit" has no separators and no case transition; it votes with
        // the leader established by earlier keys.
        let keys = ["a.user_name", "b.submit", "c.submit"];
        assert_eq!(
            detect_convention(keys.iter().copied()),
            NamingConvention::Snake
        );
    }

    #[test]
    fn test_detect_convention_empty_defaults_kebab() {
        assert_eq!(detect_convention(std::iter::empty()), NamingConvention::Kebab);
    }
}

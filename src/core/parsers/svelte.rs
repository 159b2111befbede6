//! Svelte component parser.
//!
//! `<script>` blocks parse as ordinary modules. Markup expressions live in
//! `{...}` interpolations, which also cover attribute bindings
//! (`title={t("key")}`); block tags (`{#if}`, `{:else}`, `{/each}`,
//! `{@html}`) are control flow, not expressions, and are skipped.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::core::parsers::DialectParser;
use crate::core::parsers::calls::position_offset_at;
use crate::core::parsers::script::{extract_from_script_block, extract_from_snippet};
use crate::core::reference::FileExtraction;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<script[^>]*>(.*?)</script>").unwrap());

/// Locate markup `{...}` interpolations by brace depth.
///
/// A flat regex cannot see past braces inside the expression (object
/// literals, template-literal substitutions), so this walks bytes tracking
/// nesting depth and skipping quoted strings. Returns the inner spans,
/// exclusive of the outer braces; unbalanced braces are left unmatched.
fn interpolation_spans(content: &str, script_spans: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let bytes = content.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'{' || script_spans.iter().any(|(s, e)| i >= *s && i < *e) {
            i += 1;
            continue;
        }
        let start = i;
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut j = i;
        while j < bytes.len() {
            let b = bytes[j];
            match quote {
                Some(q) => {
                    if b == b'\\' {
                        j += 1;
                    } else if b == q {
                        quote = None;
                    }
                }
                None => match b {
                    b'"' | b'\'' | b'`' => quote = Some(b),
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                },
            }
            j += 1;
        }
        if j < bytes.len() {
            spans.push((start + 1, j));
            i = j + 1;
        } else {
            i = start + 1;
        }
    }
    spans
}

#[derive(Debug, Default)]
pub struct SvelteParser;

impl DialectParser for SvelteParser {
    fn name(&self) -> &'static str {
        "svelte"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["svelte"]
    }

    fn signature(&self) -> &'static str {
        "svelte:v2"
    }

    fn is_available(&self, _workspace_root: &std::path::Path) -> bool {
        true
    }

    fn parse_file(
        &self,
        file_path: &str,
        content: &str,
        translation_identifier: &str,
    ) -> Result<FileExtraction> {
        let mut extraction = FileExtraction::default();
        let mut script_spans: Vec<(usize, usize)> = Vec::new();

        for captures in SCRIPT_BLOCK.captures_iter(content) {
            let block = captures.get(1).unwrap();
            script_spans.push((block.start(), block.end()));
            let line_offset = position_offset_at(content, block.start()).line;
            let block_extraction = extract_from_script_block(
                block.as_str(),
                file_path,
                translation_identifier,
                line_offset,
            )?;
            extraction.references.extend(block_extraction.references);
            extraction
                .dynamic_key_warnings
                .extend(block_extraction.dynamic_key_warnings);
        }

        for (start, end) in interpolation_spans(content, &script_spans) {
            let expr = &content[start..end];
            if expr.trim_start().starts_with(['#', '/', ':', '@']) {
                continue;
            }
            let offset = position_offset_at(content, start);
            if let Ok(found) =
                extract_from_snippet(expr, file_path, translation_identifier, offset)
            {
                extraction.references.extend(found.references);
                extraction
                    .dynamic_key_warnings
                    .extend(found.dynamic_key_warnings);
            }
        }

        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(content: &str) -> FileExtraction {
        SvelteParser
            .parse_file("src/App.svelte", content, "t")
            .unwrap()
    }

    #[test]
    fn test_markup_interpolation() {
        let result = extract("<h1>{t(\"home.title\")}</h1>\n");
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].key, "home.title");
        assert_eq!(result.references[0].position.line, 1);
    }

    #[test]
    fn test_attribute_binding() {
        let result = extract("<input placeholder={t('form.email')} />\n");
        assert_eq!(result.references[0].key, "form.email");
    }

    #[test]
    fn test_script_block_calls() {
        let result = extract(
            "<script>\n  const label = t(\"nav.home\");\n</script>\n\n<p>{label}</p>\n",
        );
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].key, "nav.home");
        assert_eq!(result.references[0].position.line, 2);
    }

    #[test]
    fn test_block_tags_skipped() {
        let result = extract(
            "{#if show}\n  <p>{t(\"shown.label\")}</p>\n{:else}\n  <p>no</p>\n{/if}\n",
        );
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].key, "shown.label");
        assert_eq!(result.references[0].position.line, 2);
    }

    #[test]
    fn test_dynamic_template_in_markup_warns() {
        let result = extract("<p>{t(`item.${id}.label`)}</p>\n");
        assert_eq!(result.references.len(), 0);
        assert_eq!(result.dynamic_key_warnings.len(), 1);
        assert_eq!(
            result.dynamic_key_warnings[0].reason,
            crate::core::reference::DynamicKeyReason::Template
        );
    }

    #[test]
    fn test_nested_braces_in_interpolation() {
        let result = extract("<p>{fmt({ label: t(\"deep.key\") })}</p>\n");
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].key, "deep.key");
    }

    #[test]
    fn test_script_braces_not_reextracted() {
        let result = extract("<script>\n  const o = { label: t(\"once.only\") };\n</script>\n");
        assert_eq!(result.references.len(), 1);
    }
}

//! Vue single-file component parser.
//!
//! A `.vue` file carries up to three concerns; two of them can reference
//! translations: the `<script>` block (parsed whole, as the script dialect)
//! and the `<template>` block, where calls hide inside mustache
//! interpolations (`{{ t("key") }}`) and bound attributes
//! (`:title="t('key')"`, `v-bind:`, `@click="..."`). Bound-attribute
//! expressions are walked identically to script-level calls; skipping them
//! is the classic source of missed references.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::core::parsers::DialectParser;
use crate::core::parsers::calls::position_offset_at;
use crate::core::parsers::script::{extract_from_script_block, extract_from_snippet};
use crate::core::reference::FileExtraction;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<script[^>]*>(.*?)</script>").unwrap());
static TEMPLATE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<template[^>]*>(.*)</template>").unwrap());
static MUSTACHE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{\{(.+?)\}\}").unwrap());
static BOUND_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:v-bind:|v-on:|[:@])[\w.-]+\s*=\s*(?:"([^"]+)"|'([^']+)')"#).unwrap()
});

#[derive(Debug, Default)]
pub struct VueParser;

impl DialectParser for VueParser {
    fn name(&self) -> &'static str {
        "vue"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["vue"]
    }

    fn signature(&self) -> &'static str {
        "vue:v2"
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

        for captures in SCRIPT_BLOCK.captures_iter(content) {
            let block = captures.get(1).unwrap();
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

        if let Some(captures) = TEMPLATE_BLOCK.captures(content) {
            let template = captures.get(1).unwrap();
            extract_template_expressions(
                template.as_str(),
                template.start(),
                content,
                file_path,
                translation_identifier,
                &mut extraction,
            );
        }

        Ok(extraction)
    }
}

/// Walk mustache interpolations and bound attributes through the script
/// call detector. Expressions that do not parse standalone (multi-statement
/// handlers and the like) are skipped, not errors.
fn extract_template_expressions(
    template: &str,
    template_start: usize,
    content: &str,
    file_path: &str,
    translation_identifier: &str,
    extraction: &mut FileExtraction,
) {
    for captures in MUSTACHE.captures_iter(template) {
        let expr = captures.get(1).unwrap();
        absorb_expression(
            expr.as_str(),
            template_start + expr.start(),
            content,
            file_path,
            translation_identifier,
            extraction,
        );
    }

    for captures in BOUND_ATTR.captures_iter(template) {
        // One of the two quote-style groups matched.
        let expr = match captures.get(1).or_else(|| captures.get(2)) {
            Some(expr) => expr,
            None => continue,
        };
        absorb_expression(
            expr.as_str(),
            template_start + expr.start(),
            content,
            file_path,
            translation_identifier,
            extraction,
        );
    }
}

fn absorb_expression(
    expr: &str,
    byte_offset: usize,
    content: &str,
    file_path: &str,
    translation_identifier: &str,
    extraction: &mut FileExtraction,
) {
    let offset = position_offset_at(content, byte_offset);
    if let Ok(found) = extract_from_snippet(expr, file_path, translation_identifier, offset) {
        extraction.references.extend(found.references);
        extraction
            .dynamic_key_warnings
            .extend(found.dynamic_key_warnings);
    }
}

//! Script dialect parser (TypeScript/JavaScript, JSX included).
//!
//! Parses whole source files with swc and runs the shared call detector.
//! Also exposes snippet parsing for the markup dialects, which lift
//! expressions out of templates and feed them through the same detector.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use swc_common::{FileName, GLOBALS, Globals, SourceMap};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

use crate::core::parsers::DialectParser;
use crate::core::parsers::calls::{CallCollector, PositionOffset};
use crate::core::reference::FileExtraction;

/// Parse TS/TSX source into an AST.
///
/// Accepts a shared SourceMap so parallel per-file parsing stays
/// thread-safe; swc globals are scoped per call.
pub fn parse_script_source(
    code: String,
    file_path: &str,
    source_map: Arc<SourceMap>,
) -> Result<(Module, Arc<SourceMap>)> {
    GLOBALS.set(&Globals::new(), || {
        let source_file =
            source_map.new_source_file(FileName::Real(file_path.into()).into(), code);

        let syntax = Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        });

        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);
        let module = parser
            .parse_module()
            .map_err(|e| anyhow!("Failed to parse {}: {:?}", file_path, e))?;

        Ok((module, source_map))
    })
}

/// Parse an expression snippet lifted out of a markup template and run the
/// call detector over it with a position offset back into the host file.
pub fn extract_from_snippet(
    code: &str,
    file_path: &str,
    translation_identifier: &str,
    offset: PositionOffset,
) -> Result<FileExtraction> {
    // Wrap in parens so object literals and sequences parse as expressions.
    let wrapped = format!("({});", code);
    let source_map = Arc::new(SourceMap::default());
    let (module, source_map) = parse_script_source(wrapped, file_path, source_map)?;
    // `offset.column` is the host file's 1-based column of the snippet start;
    // one column is also swallowed by the wrapping paren.
    let offset = PositionOffset {
        line: offset.line,
        column: offset.column.saturating_sub(2),
    };
    Ok(CallCollector::new(file_path, &source_map, translation_identifier, offset).collect(&module))
}

/// Parse a whole script block lifted out of a markup file (`<script>`
/// contents) and run the call detector with a line offset into the host.
pub fn extract_from_script_block(
    code: &str,
    file_path: &str,
    translation_identifier: &str,
    line_offset: usize,
) -> Result<FileExtraction> {
    let source_map = Arc::new(SourceMap::default());
    let (module, source_map) = parse_script_source(code.to_string(), file_path, source_map)?;
    let offset = PositionOffset {
        line: line_offset,
        column: 0,
    };
    Ok(CallCollector::new(file_path, &source_map, translation_identifier, offset).collect(&module))
}

/// The always-available script parser.
#[derive(Debug, Default)]
pub struct ScriptParser;

impl DialectParser for ScriptParser {
    fn name(&self) -> &'static str {
        "script"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"]
    }

    fn signature(&self) -> &'static str {
        "script:v2"
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
        let source_map = Arc::new(SourceMap::default());
        let (module, source_map) =
            parse_script_source(content.to_string(), file_path, source_map)?;
        Ok(
            CallCollector::new(
                file_path,
                &source_map,
                translation_identifier,
                PositionOffset::default(),
            )
            .collect(&module),
        )
    }
}

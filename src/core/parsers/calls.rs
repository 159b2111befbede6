//! Shared translation call-site detector.
//!
//! Script-level calls and markup-embedded expressions both funnel through
//! this visitor: an expression is a translation call when its callee
//! resolves to the configured identifier directly (`t(...)`), through member
//! access (`i18n.t(...)`), or through element access by literal name
//! (`i18n["t"](...)`). The first argument is then classified as a literal
//! key or one of the three dynamic-key reasons.

use std::collections::HashMap;

use swc_common::{BytePos, Loc, SourceMap, SourceMapper, Spanned};
use swc_ecma_ast::{BinExpr, BinaryOp, CallExpr, Callee, Expr, Lit, MemberProp, Module};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::reference::{
    DynamicKeyReason, DynamicKeyWarning, FileExtraction, Position, TranslationReference,
};

/// How deep to unwrap transparent wrappers (parens, type assertions,
/// non-null assertions) when matching a fallback pattern.
const MAX_WRAPPER_DEPTH: usize = 4;

/// Offset applied to positions, for expressions lifted out of markup files.
///
/// `line` is added to the parsed line (0 for whole-file parses); `column`
/// shifts only the first line of the snippet.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionOffset {
    pub line: usize,
    pub column: usize,
}

/// Offset of a byte position within host-file content, for mapping markup
/// snippet positions back to the file they were lifted from.
pub fn position_offset_at(content: &str, byte_offset: usize) -> PositionOffset {
    let before = &content[..byte_offset.min(content.len())];
    let line = before.bytes().filter(|b| *b == b'\n').count();
    let column = before
        .rfind('\n')
        .map(|idx| byte_offset - idx)
        .unwrap_or(byte_offset + 1);
    PositionOffset { line, column }
}

/// Single-pass visitor collecting references and dynamic-key warnings.
pub struct CallCollector<'a> {
    file_path: &'a str,
    source_map: &'a SourceMap,
    identifier: &'a str,
    offset: PositionOffset,
    /// Fallback literals keyed by the call node's start position, recorded
    /// when an enclosing `||`/`??` is visited before the call itself.
    fallbacks: HashMap<BytePos, String>,
    extraction: FileExtraction,
}

impl<'a> CallCollector<'a> {
    pub fn new(
        file_path: &'a str,
        source_map: &'a SourceMap,
        identifier: &'a str,
        offset: PositionOffset,
    ) -> Self {
        Self {
            file_path,
            source_map,
            identifier,
            offset,
            fallbacks: HashMap::new(),
            extraction: FileExtraction::default(),
        }
    }

    pub fn collect(mut self, module: &Module) -> FileExtraction {
        module.visit_with(&mut self);
        self.extraction
    }

    fn position(&self, loc: &Loc) -> Position {
        let line = loc.line + self.offset.line;
        let column = if loc.line == 1 {
            loc.col_display + 1 + self.offset.column
        } else {
            loc.col_display + 1
        };
        Position::new(line, column)
    }

    /// Does the callee resolve to the configured translation identifier?
    fn is_translation_callee(&self, callee: &Callee) -> bool {
        let Callee::Expr(expr) = callee else {
            return false;
        };
        match unwrap_transparent(expr, MAX_WRAPPER_DEPTH) {
            Expr::Ident(ident) => ident.sym.as_str() == self.identifier,
            Expr::Member(member) => match &member.prop {
                MemberProp::Ident(ident) => ident.sym.as_str() == self.identifier,
                MemberProp::Computed(computed) => match &*computed.expr {
                    Expr::Lit(Lit::Str(s)) => s.value.as_str() == Some(self.identifier),
                    _ => false,
                },
                MemberProp::PrivateName(_) => false,
            },
            _ => false,
        }
    }

    fn record_call(&mut self, call: &CallExpr) {
        let Some(arg) = call.args.first() else {
            return;
        };
        if arg.spread.is_some() {
            return;
        }

        let loc = self.source_map.lookup_char_pos(call.span.lo);
        let position = self.position(&loc);

        match classify_key_argument(&arg.expr) {
            KeyArgument::Literal(key) => {
                let fallback_literal = self.fallbacks.remove(&call.span.lo);
                self.extraction.references.push(TranslationReference {
                    key,
                    fallback_literal,
                    file_path: self.file_path.to_string(),
                    position,
                });
            }
            KeyArgument::Dynamic(reason) => {
                let expression = self
                    .source_map
                    .span_to_snippet(arg.expr.span())
                    .unwrap_or_else(|_| "<expression>".to_string());
                self.extraction.dynamic_key_warnings.push(DynamicKeyWarning {
                    file_path: self.file_path.to_string(),
                    position,
                    expression,
                    reason,
                });
            }
        }
    }

    /// Record a fallback literal for `t(key) || "Default"` patterns.
    ///
    /// The left side must resolve to a translation call through transparent
    /// wrappers only; the right side must unwrap to a string literal.
    fn record_fallback(&mut self, bin: &BinExpr) {
        if !matches!(
            bin.op,
            BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
        ) {
            return;
        }

        let left = unwrap_transparent(&bin.left, MAX_WRAPPER_DEPTH);
        let Expr::Call(call) = left else {
            return;
        };
        if !self.is_translation_callee(&call.callee) {
            return;
        }

        let right = unwrap_transparent(&bin.right, MAX_WRAPPER_DEPTH);
        if let Expr::Lit(Lit::Str(s)) = right
            && let Some(value) = s.value.as_str()
        {
            self.fallbacks.insert(call.span.lo, value.to_string());
        }
    }
}

impl Visit for CallCollector<'_> {
    fn visit_bin_expr(&mut self, node: &BinExpr) {
        // Parents are visited before children, so the fallback is registered
        // before the call itself is classified.
        self.record_fallback(node);
        node.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        if self.is_translation_callee(&node.callee) {
            self.record_call(node);
        }
        node.visit_children_with(self);
    }
}

enum KeyArgument {
    Literal(String),
    Dynamic(DynamicKeyReason),
}

/// Classify the first call argument.
fn classify_key_argument(expr: &Expr) -> KeyArgument {
    match unwrap_transparent(expr, MAX_WRAPPER_DEPTH) {
        Expr::Lit(Lit::Str(s)) => match s.value.as_str() {
            Some(value) => KeyArgument::Literal(value.to_string()),
            None => KeyArgument::Dynamic(DynamicKeyReason::Expression),
        },
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            let cooked = tpl
                .quasis
                .first()
                .and_then(|q| q.cooked.as_ref())
                .and_then(|c| c.as_str());
            match cooked {
                Some(value) => KeyArgument::Literal(value.to_string()),
                None => KeyArgument::Dynamic(DynamicKeyReason::Expression),
            }
        }
        Expr::Tpl(_) => KeyArgument::Dynamic(DynamicKeyReason::Template),
        Expr::Bin(bin) if bin.op == BinaryOp::Add => KeyArgument::Dynamic(DynamicKeyReason::Binary),
        _ => KeyArgument::Dynamic(DynamicKeyReason::Expression),
    }
}

/// Unwrap parenthesization, type assertions and non-null assertions.
fn unwrap_transparent(expr: &Expr, depth: usize) -> &Expr {
    if depth == 0 {
        return expr;
    }
    match expr {
        Expr::Paren(paren) => unwrap_transparent(&paren.expr, depth - 1),
        Expr::TsAs(ts_as) => unwrap_transparent(&ts_as.expr, depth - 1),
        Expr::TsConstAssertion(ts_const) => unwrap_transparent(&ts_const.expr, depth - 1),
        Expr::TsSatisfies(ts_sat) => unwrap_transparent(&ts_sat.expr, depth - 1),
        Expr::TsNonNull(non_null) => unwrap_transparent(&non_null.expr, depth - 1),
        _ => expr,
    }
}

//! Converts `quad_core::Diagnostic`s into `lsp_types::Diagnostic`s for
//! `textDocument/publishDiagnostics`.
//!
//! Grounded in the teacher's `crates/lsp/src/diagnostics.rs`, which performs
//! the same span-to-`Range` conversion; the type-checker/lint-specific
//! pieces of that file (quotation spans, code actions) have no counterpart
//! here since this toolchain's validator is a flat undefined-reference pass.

use quad_core::{Category, Diagnostic as CoreDiagnostic, Severity};
use tower_lsp::lsp_types::{
    Diagnostic as LspDiagnostic, DiagnosticSeverity, Position, Range,
};

fn severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Note => DiagnosticSeverity::INFORMATION,
    }
}

fn source_name(category: Category) -> &'static str {
    match category {
        Category::Lexical => "quadrate-lexer",
        Category::Syntactic => "quadrate-parser",
        Category::Semantic => "quadrate-validator",
        Category::Loader => "quadrate-loader",
    }
}

/// Check `source`, returning its parsed AST alongside every diagnostic
/// converted to LSP form. Positions are 0-indexed in LSP but 1-indexed in
/// `SourcePosition`, so line/column are each shifted down by one.
pub fn check_document(source: &str) -> (quad_core::Ast, Vec<LspDiagnostic>) {
    let outcome = quadc::check_source(source);
    let diagnostics = outcome.diagnostics.iter().map(to_lsp).collect();
    (outcome.ast, diagnostics)
}

fn to_lsp(diagnostic: &CoreDiagnostic) -> LspDiagnostic {
    let start = Position {
        line: diagnostic.span.line.saturating_sub(1),
        character: diagnostic.span.column.saturating_sub(1),
    };
    let end = Position {
        line: start.line,
        character: start.character + diagnostic.span.length.max(1),
    };

    LspDiagnostic {
        range: Range { start, end },
        severity: Some(severity(diagnostic.severity)),
        code: None,
        code_description: None,
        source: Some(source_name(diagnostic.category).to_string()),
        message: diagnostic.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_source_has_no_diagnostics() {
        let (_, diags) = check_document("fn main( -- ) { 42 . nl }");
        assert!(diags.is_empty());
    }

    #[test]
    fn undefined_reference_is_reported_as_error() {
        let (_, diags) = check_document("fn main( -- ) { doesnotexist }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diags[0].source.as_deref(), Some("quadrate-validator"));
    }
}

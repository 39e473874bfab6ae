//! Diagnostics shared by the lexer, parser and semantic validator.
//!
//! Every stage that can fail accumulates `Diagnostic` values instead of
//! aborting; the parser always returns a tree even when diagnostics are
//! non-empty (spec §4.3, §7).

use std::fmt;

/// A location in a source file.
///
/// `line` and `column` are 1-indexed, per the data model's invariant
/// `line >= 1, column >= 1`. `offset` is the 0-indexed byte offset of the
/// first byte of the span; `length` is the span's length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
    pub length: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32, offset: u32, length: u32) -> Self {
        debug_assert!(line >= 1, "SourcePosition: line must be >= 1, got {line}");
        debug_assert!(
            column >= 1,
            "SourcePosition: column must be >= 1, got {column}"
        );
        SourcePosition {
            line,
            column,
            offset,
            length,
        }
    }

    /// The position a zero-length synthetic node (e.g. a parser error
    /// recovery placeholder) should carry.
    pub fn synthetic() -> Self {
        SourcePosition {
            line: 1,
            column: 1,
            offset: 0,
            length: 0,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Closed category enum, matching the taxonomy in spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Lexical,
    Syntactic,
    Semantic,
    Loader,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Lexical => "lexical",
            Category::Syntactic => "syntactic",
            Category::Semantic => "semantic",
            Category::Loader => "loader",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        f.write_str(s)
    }
}

/// A single diagnostic entry, as produced by the lexer, parser or validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub span: SourcePosition,
    pub message: String,
    pub notes: Vec<String>,
    pub category: Category,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(category: Category, span: SourcePosition, message: impl Into<String>) -> Self {
        Diagnostic {
            span,
            message: message.into(),
            notes: Vec::new(),
            category,
            severity: Severity::Error,
        }
    }

    pub fn warning(category: Category, span: SourcePosition, message: impl Into<String>) -> Self {
        Diagnostic {
            span,
            message: message.into(),
            notes: Vec::new(),
            category,
            severity: Severity::Warning,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Whether to colour a formatted diagnostic. The caller decides (e.g. from
/// `std::io::IsTerminal`); this crate never consults process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Always,
    Never,
}

/// Render a diagnostic as `<prefix>: <file>: <line>:<column>: <severity>: <message>`,
/// per spec §6.
pub fn format_diagnostic(
    prefix: &str,
    file: &str,
    diagnostic: &Diagnostic,
    color: ColorMode,
) -> String {
    let severity_text = diagnostic.severity.to_string();
    let severity_field = match color {
        ColorMode::Never => severity_text,
        ColorMode::Always => match diagnostic.severity {
            Severity::Error => format!("\x1b[1;31m{severity_text}\x1b[0m"),
            Severity::Warning => format!("\x1b[1;33m{severity_text}\x1b[0m"),
            Severity::Note => format!("\x1b[1;36m{severity_text}\x1b[0m"),
        },
    };

    let mut out = format!(
        "{prefix}: {file}: {}:{}: {severity_field}: {}",
        diagnostic.span.line, diagnostic.span.column, diagnostic.message
    );
    for note in &diagnostic.notes {
        out.push_str(&format!("\n  note: {note}"));
    }
    out
}

/// Render a full diagnostic list in source order (spec §7 "all diagnostics
/// are printed in source order").
pub fn format_diagnostics(
    prefix: &str,
    file: &str,
    diagnostics: &[Diagnostic],
    color: ColorMode,
) -> String {
    diagnostics
        .iter()
        .map(|d| format_diagnostic(prefix, file, d, color))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_without_color() {
        let diag = Diagnostic::error(
            Category::Semantic,
            SourcePosition::new(3, 5, 10, 4),
            "undefined function 'foo'",
        );
        let rendered = format_diagnostic("quadc", "main.qd", &diag, ColorMode::Never);
        assert_eq!(
            rendered,
            "quadc: main.qd: 3:5: error: undefined function 'foo'"
        );
    }

    #[test]
    fn formats_with_notes() {
        let diag = Diagnostic::error(Category::Syntactic, SourcePosition::new(1, 1, 0, 1), "oops")
            .with_note("see also line 2");
        let rendered = format_diagnostic("quadc", "a.qd", &diag, ColorMode::Never);
        assert!(rendered.contains("note: see also line 2"));
    }

    #[test]
    fn preserves_source_order_in_joined_output() {
        let diags = vec![
            Diagnostic::error(Category::Syntactic, SourcePosition::new(5, 1, 0, 1), "second"),
            Diagnostic::error(Category::Syntactic, SourcePosition::new(1, 1, 0, 1), "first"),
        ];
        let rendered = format_diagnostics("quadc", "a.qd", &diags, ColorMode::Never);
        let first_idx = rendered.find("second").unwrap();
        let second_idx = rendered.find("first").unwrap();
        assert!(first_idx < second_idx, "must preserve caller-provided order");
    }
}

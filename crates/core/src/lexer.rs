//! Hand-written lexer producing a flat token stream with source positions.
//!
//! Grounded in the token contract of spec §4.1 and in the shape of the
//! original `lexer::Scanner` (`original_source/libs/lexer/...`): a single
//! forward cursor tracking line/column, no backtracking, one token per call
//! conceptually (here batched into `tokenize`). We do not implement the
//! UTF-8 scanning primitive itself — it is out of scope (spec §1) — so this
//! lexer assumes `source` is already valid UTF-8 and walks it as `char`s.
//!
//! The built-in instruction set (`crate::builtins`) includes symbolic names
//! such as `+`, `==`, `.` that are not alphabetic identifiers. Spec §4.1's
//! punctuation list only names `( ) { } : - > ,`; to lex the full symbolic
//! instruction set this lexer additionally recognizes the operator
//! characters those names use (`+ * / % < > = !`) as punctuation tokens,
//! with two-character maximal munch for `== != <= >= ::`. The parser (not
//! the lexer) decides, per spec §4.3, whether a punctuation or identifier
//! token denotes an `Instruction` by comparing its lexeme against the
//! built-in set.

use crate::diagnostics::{Category, Diagnostic, SourcePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    /// Punctuation or operator lexeme; see module docs for the extended set.
    Punct,
    Comment,
    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: SourcePosition,
}

/// Controls whether comment tokens are yielded or discarded.
///
/// The parser wants comments discarded (spec §4.1 "skipped at the lexer
/// level by default"); formatters want them surfaced (the "alternate
/// surfacing mode" the spec calls out).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentMode {
    Skip,
    Surface,
}

/// Two-character operators recognized by maximal munch, in addition to the
/// single-character punctuation `( ) { } : - > ,` and the extra operator
/// characters `+ * / % < > = !`.
const TWO_CHAR_OPERATORS: &[&str] = &["==", "!=", "<=", ">=", "::", "--", "->"];

pub struct Lexer<'src> {
    source: &'src str,
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    line: u32,
    column: u32,
    comment_mode: CommentMode,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, comment_mode: CommentMode) -> Self {
        Lexer {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            comment_mode,
            diagnostics: Vec::new(),
        }
    }

    /// Lex the entire source, always terminating with an `Eof` token.
    /// Lexical errors (unterminated strings/block comments, invalid bytes)
    /// are recorded as diagnostics and lexing continues, per spec §7
    /// ("lexer recovers per-token and never aborts").
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            if tok.kind != TokenKind::Comment || self.comment_mode == CommentMode::Surface {
                tokens.push(tok);
            }
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_offset(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len())
    }

    fn peek_nth_char(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn position_from(&mut self, start_offset: usize, start_line: u32, start_column: u32) -> SourcePosition {
        let end_offset = self.peek_offset();
        let length = (end_offset - start_offset).max(1) as u32;
        SourcePosition::new(start_line, start_column, start_offset as u32, length)
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start_line = self.line;
        let start_column = self.column;
        let start_offset = self.peek_offset();
        let Some(c) = self.peek_char() else {
            return Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                position: SourcePosition::new(start_line, start_column, start_offset as u32, 0),
            };
        };

        if c == '/' && self.peek_nth_char(1) == Some('/') {
            return self.lex_line_comment(start_offset, start_line, start_column);
        }
        if c == '/' && self.peek_nth_char(1) == Some('*') {
            return self.lex_block_comment(start_offset, start_line, start_column);
        }
        if c == '"' {
            return self.lex_string(start_offset, start_line, start_column);
        }
        if c.is_ascii_digit() || (c == '-' && matches!(self.peek_nth_char(1), Some(d) if d.is_ascii_digit())) {
            return self.lex_number(start_offset, start_line, start_column);
        }
        if is_identifier_start(c) {
            return self.lex_identifier(start_offset, start_line, start_column);
        }
        if is_punct_char(c) {
            return self.lex_punct(start_offset, start_line, start_column);
        }

        // Unrecognized byte: record an error token and make progress.
        self.advance();
        let position = self.position_from(start_offset, start_line, start_column);
        self.diagnostics.push(Diagnostic::error(
            Category::Lexical,
            position,
            format!("unexpected character '{c}'"),
        ));
        Token {
            kind: TokenKind::Error,
            lexeme: c.to_string(),
            position,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn lex_line_comment(&mut self, start_offset: usize, start_line: u32, start_column: u32) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        Token {
            kind: TokenKind::Comment,
            lexeme: text,
            position: self.position_from(start_offset, start_line, start_column),
        }
    }

    fn lex_block_comment(&mut self, start_offset: usize, start_line: u32, start_column: u32) -> Token {
        self.advance(); // '/'
        self.advance(); // '*'
        let mut text = String::new();
        let mut terminated = false;
        while let Some(c) = self.peek_char() {
            if c == '*' && self.peek_nth_char(1) == Some('/') {
                self.advance();
                self.advance();
                terminated = true;
                break;
            }
            text.push(c);
            self.advance();
        }
        let position = self.position_from(start_offset, start_line, start_column);
        if !terminated {
            self.diagnostics.push(Diagnostic::error(
                Category::Lexical,
                position,
                "unterminated block comment",
            ));
        }
        Token {
            kind: TokenKind::Comment,
            lexeme: text,
            position,
        }
    }

    fn lex_string(&mut self, start_offset: usize, start_line: u32, start_column: u32) -> Token {
        self.advance(); // opening quote
        let mut text = String::new();
        let mut terminated = false;
        while let Some(c) = self.peek_char() {
            match c {
                '"' => {
                    self.advance();
                    terminated = true;
                    break;
                }
                '\n' => break,
                '\\' => {
                    self.advance();
                    if let Some((_, escaped)) = self.advance() {
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            '"' => '"',
                            '\\' => '\\',
                            other => other,
                        });
                    }
                }
                _ => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        let position = self.position_from(start_offset, start_line, start_column);
        if !terminated {
            self.diagnostics.push(Diagnostic::error(
                Category::Lexical,
                position,
                "unterminated string literal",
            ));
        }
        Token {
            kind: TokenKind::StringLiteral,
            lexeme: text,
            position,
        }
    }

    fn lex_number(&mut self, start_offset: usize, start_line: u32, start_column: u32) -> Token {
        let mut text = String::new();
        if self.peek_char() == Some('-') {
            text.push('-');
            self.advance();
        }

        if self.peek_char() == Some('0')
            && matches!(self.peek_nth_char(1), Some('x') | Some('X'))
        {
            text.push_str("0x");
            self.advance();
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_hexdigit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let position = self.position_from(start_offset, start_line, start_column);
            return Token { kind: TokenKind::IntegerLiteral, lexeme: text, position };
        }

        if self.peek_char() == Some('0') && matches!(self.peek_nth_char(1), Some('b') | Some('B')) {
            text.push_str("0b");
            self.advance();
            self.advance();
            while let Some(c) = self.peek_char() {
                if c == '0' || c == '1' {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let position = self.position_from(start_offset, start_line, start_column);
            return Token { kind: TokenKind::IntegerLiteral, lexeme: text, position };
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let mut is_float = false;
        if self.peek_char() == Some('.') && matches!(self.peek_nth_char(1), Some(d) if d.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if matches!(self.peek_char(), Some('e') | Some('E')) {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                let has_sign = matches!(lookahead.peek(), Some((_, '+')) | Some((_, '-')));
                if has_sign {
                    lookahead.next();
                }
                if matches!(lookahead.peek(), Some((_, d)) if d.is_ascii_digit()) {
                    text.push(self.advance().unwrap().1);
                    if matches!(self.peek_char(), Some('+') | Some('-')) {
                        text.push(self.advance().unwrap().1);
                    }
                    while let Some(c) = self.peek_char() {
                        if c.is_ascii_digit() {
                            text.push(c);
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
            }
        }

        let position = self.position_from(start_offset, start_line, start_column);
        Token {
            kind: if is_float {
                TokenKind::FloatLiteral
            } else {
                TokenKind::IntegerLiteral
            },
            lexeme: text,
            position,
        }
    }

    fn lex_identifier(&mut self, start_offset: usize, start_line: u32, start_column: u32) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if is_identifier_continue(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let position = self.position_from(start_offset, start_line, start_column);
        Token {
            kind: TokenKind::Identifier,
            lexeme: text,
            position,
        }
    }

    fn lex_punct(&mut self, start_offset: usize, start_line: u32, start_column: u32) -> Token {
        let first = self.advance().unwrap().1;
        if let Some(second) = self.peek_char() {
            let mut pair = String::new();
            pair.push(first);
            pair.push(second);
            if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                self.advance();
                let position = self.position_from(start_offset, start_line, start_column);
                return Token {
                    kind: TokenKind::Punct,
                    lexeme: pair,
                    position,
                };
            }
        }
        let position = self.position_from(start_offset, start_line, start_column);
        Token {
            kind: TokenKind::Punct,
            lexeme: first.to_string(),
            position,
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_punct_char(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '{' | '}' | ':' | '-' | '>' | ',' | '+' | '*' | '/' | '%' | '<' | '=' | '!' | '.'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let (tokens, diags) = Lexer::new(src, CommentMode::Skip).tokenize();
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        tokens
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_a_trivial_function() {
        let tokens = lex("fn main( -- ) { 42 . nl }");
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(
            lexemes,
            vec!["fn", "main", "(", "--", ")", "{", "42", ".", "nl", "}", ""]
        );
    }

    #[test]
    fn lexes_integer_literal_forms() {
        assert_eq!(
            kinds("42 0x1F 0b101 -7"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_float_literal_with_exponent() {
        let tokens = lex("3.14 2.5e10 1.0e-3");
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::FloatLiteral));
    }

    #[test]
    fn lexes_scoped_identifier_operator() {
        let tokens = lex("math::sqrt");
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["math", "::", "sqrt", ""]);
    }

    #[test]
    fn lexes_two_char_comparison_operators() {
        let tokens = lex("== != <= >=");
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["==", "!=", "<=", ">=", ""]);
    }

    #[test]
    fn skips_comments_by_default() {
        let tokens = lex("1 // trailing\n/* block */ 2");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::IntegerLiteral, TokenKind::IntegerLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn surfaces_comments_when_requested() {
        let (tokens, _) = Lexer::new("1 // note", CommentMode::Surface).tokenize();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Comment));
    }

    #[test]
    fn reports_unterminated_string_and_block_comment() {
        let (_, diags) = Lexer::new("\"never closed", CommentMode::Skip).tokenize();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].category, Category::Lexical);

        let (_, diags) = Lexer::new("/* never closed", CommentMode::Skip).tokenize();
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn reports_error_token_and_continues_on_invalid_byte() {
        let (tokens, diags) = Lexer::new("1 @ 2", CommentMode::Skip).tokenize();
        assert_eq!(diags.len(), 1);
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::Error,
                TokenKind::IntegerLiteral,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn tracks_line_and_column_across_newlines() {
        let tokens = lex("1\n  2");
        assert_eq!(tokens[0].position.line, 1);
        assert_eq!(tokens[1].position.line, 2);
        assert_eq!(tokens[1].position.column, 3);
    }

    #[test]
    fn always_terminates_with_eof() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }
}

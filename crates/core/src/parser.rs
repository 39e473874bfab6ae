//! Recursive-descent parser building the arena AST, with diagnostic
//! accumulation and statement-boundary error recovery (spec §4.3).
//!
//! Grounded in the teacher's `crates/compiler/src/parser.rs` for the overall
//! shape of a hand-rolled `Parser{tokens, pos}` walking a `Vec<Token>`, but
//! diverges where the teacher fails fast (`Result<Program, String>`, no
//! recovery): here every entry point always returns a `ParseResult` whose
//! `root` is present even when `diagnostics` is non-empty, per spec §4.3 and
//! §7 ("the parser never panics on malformed input; it always returns a
//! tree plus an error list").

use crate::ast::{Ast, AstBuilder, LiteralKind, NodeData, NodeId};
use crate::builtins::is_builtin_instruction;
use crate::diagnostics::{Category, Diagnostic, SourcePosition};
use crate::lexer::{CommentMode, Lexer, Token, TokenKind};

/// Keywords that begin a statement; used both for dispatch and as
/// recovery-boundary markers (spec §4.3 "the next statement-starting
/// keyword").
const STMT_KEYWORDS: &[&str] = &[
    "if", "for", "switch", "defer", "return", "break", "continue", "const",
];

pub struct ParseResult {
    pub ast: Ast,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `source` into a `ParseResult`. Always succeeds in the sense that a
/// `Program` root is always produced; check `diagnostics` for errors.
pub fn parse(source: &str) -> ParseResult {
    let (tokens, mut diagnostics) = Lexer::new(source, CommentMode::Skip).tokenize();
    let mut parser = Parser::new(tokens);
    let root = parser.parse_program();
    diagnostics.append(&mut parser.diagnostics);
    ParseResult {
        ast: parser.builder.finish(root),
        diagnostics,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: AstBuilder,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            builder: AstBuilder::new(),
            diagnostics: Vec::new(),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn is_identifier(&self, lexeme: &str) -> bool {
        let t = self.peek();
        t.kind == TokenKind::Identifier && t.lexeme == lexeme
    }

    fn is_punct(&self, lexeme: &str) -> bool {
        let t = self.peek();
        t.kind == TokenKind::Punct && t.lexeme == lexeme
    }

    fn error(&mut self, category: Category, position: SourcePosition, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(category, position, message));
    }

    /// Consume an identifier token with the given exact lexeme, or record a
    /// diagnostic and leave the cursor in place.
    fn expect_keyword(&mut self, lexeme: &str) -> SourcePosition {
        if self.is_identifier(lexeme) {
            self.advance().position
        } else {
            let position = self.peek().position;
            self.error(
                Category::Syntactic,
                position,
                format!("expected '{lexeme}', found '{}'", self.peek().lexeme),
            );
            position
        }
    }

    fn expect_punct(&mut self, lexeme: &str) -> SourcePosition {
        if self.is_punct(lexeme) {
            self.advance().position
        } else {
            let position = self.peek().position;
            self.error(
                Category::Syntactic,
                position,
                format!("expected '{lexeme}', found '{}'", self.peek().lexeme),
            );
            position
        }
    }

    /// An identifier token that is not itself a statement keyword.
    fn expect_name(&mut self) -> (String, SourcePosition) {
        if self.peek().kind == TokenKind::Identifier {
            let tok = self.advance();
            (tok.lexeme, tok.position)
        } else {
            let position = self.peek().position;
            self.error(Category::Syntactic, position, "expected an identifier");
            (String::new(), position)
        }
    }

    // ---- program / top-level ----

    fn parse_program(&mut self) -> NodeId {
        let start = self.peek().position;
        let program = self.builder.alloc(NodeData::Program, start);
        while !self.at_eof() {
            match self.parse_top_level() {
                Some(node) => self.builder.attach(program, node),
                None => {
                    if !self.at_eof() {
                        self.recover_to_top_level();
                    }
                }
            }
        }
        program
    }

    fn recover_to_top_level(&mut self) {
        loop {
            if self.at_eof() {
                return;
            }
            if self.is_identifier("fn") || self.is_identifier("const") || self.is_identifier("use") {
                return;
            }
            self.advance();
        }
    }

    fn parse_top_level(&mut self) -> Option<NodeId> {
        if self.is_identifier("use") {
            Some(self.parse_use())
        } else if self.is_identifier("const") {
            Some(self.parse_constant())
        } else if self.is_identifier("fn") {
            Some(self.parse_function())
        } else {
            let position = self.peek().position;
            self.error(
                Category::Syntactic,
                position,
                format!("expected 'use', 'const' or 'fn', found '{}'", self.peek().lexeme),
            );
            None
        }
    }

    fn parse_use(&mut self) -> NodeId {
        let start = self.expect_keyword("use");
        let module_name = self.parse_module_name();
        self.builder.alloc(
            NodeData::UseStatement { module_name },
            start,
        )
    }

    /// A module name is either a bare identifier (`math`) or a sibling-file
    /// reference ending in the source suffix (`helpers.q`). The lexer has
    /// no notion of filenames, so the parser stitches together a run of
    /// `Identifier`/`.`-`Punct` tokens (spec §3 `UseStatement`).
    fn parse_module_name(&mut self) -> String {
        let mut name = String::new();
        if self.peek().kind == TokenKind::Identifier {
            name.push_str(&self.advance().lexeme);
        } else {
            let position = self.peek().position;
            self.error(Category::Syntactic, position, "expected a module name");
            return name;
        }
        while self.is_punct(".") && matches!(self.peek_at(1), Some(t) if t.kind == TokenKind::Identifier) {
            self.advance(); // '.'
            name.push('.');
            name.push_str(&self.advance().lexeme);
        }
        name
    }

    fn parse_constant(&mut self) -> NodeId {
        let start = self.expect_keyword("const");
        let (name, _) = self.expect_name();
        self.expect_punct("=");
        let value = self.parse_literal();
        let node = self.builder.alloc(NodeData::ConstantDeclaration { name, value }, start);
        self.builder.attach(node, value);
        node
    }

    fn parse_literal(&mut self) -> NodeId {
        let tok = self.peek().clone();
        let kind = match tok.kind {
            TokenKind::IntegerLiteral => LiteralKind::Int,
            TokenKind::FloatLiteral => LiteralKind::Float,
            TokenKind::StringLiteral => LiteralKind::String,
            _ => {
                self.error(Category::Syntactic, tok.position, "expected a literal value");
                return self.builder.alloc(
                    NodeData::Literal {
                        kind: LiteralKind::Int,
                        raw: String::new(),
                    },
                    tok.position,
                );
            }
        };
        self.advance();
        self.builder.alloc(
            NodeData::Literal {
                kind,
                raw: tok.lexeme,
            },
            tok.position,
        )
    }

    fn parse_function(&mut self) -> NodeId {
        let start = self.expect_keyword("fn");
        let (name, _) = self.expect_name();
        self.expect_punct("(");

        let mut inputs = self.parse_params();
        let mut outputs = Vec::new();
        if self.is_punct("--") {
            self.advance();
            outputs = self.parse_params();
        }
        self.expect_punct(")");
        let body = self.parse_block();

        let func = self.builder.alloc(
            NodeData::FunctionDeclaration {
                name,
                inputs: inputs.clone(),
                outputs: outputs.clone(),
                body,
            },
            start,
        );
        inputs.append(&mut outputs);
        self.builder.attach_many(func, &inputs);
        self.builder.attach(func, body);
        func
    }

    fn parse_params(&mut self) -> Vec<NodeId> {
        let mut params = Vec::new();
        while self.peek().kind == TokenKind::Identifier {
            let (name, position) = self.expect_name();
            let type_name = if self.is_punct(":") {
                self.advance();
                self.expect_name().0
            } else {
                String::new()
            };
            params.push(self.builder.alloc(NodeData::Parameter { name, type_name }, position));
        }
        params
    }

    // ---- blocks / statements ----

    fn parse_block(&mut self) -> NodeId {
        let start = self.expect_punct("{");
        let block = self.builder.alloc(NodeData::Block, start);
        loop {
            if self.is_punct("}") {
                self.advance();
                break;
            }
            if self.at_eof() {
                self.error(
                    Category::Syntactic,
                    self.peek().position,
                    "expected '}' before end of input",
                );
                break;
            }
            match self.parse_stmt() {
                Some(node) => self.builder.attach(block, node),
                None => self.recover_in_block(),
            }
        }
        block
    }

    fn recover_in_block(&mut self) {
        loop {
            if self.at_eof() || self.is_punct("}") {
                return;
            }
            if self.peek().kind == TokenKind::Identifier
                && STMT_KEYWORDS.contains(&self.peek().lexeme.as_str())
            {
                return;
            }
            self.advance();
        }
    }

    fn parse_stmt(&mut self) -> Option<NodeId> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::IntegerLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral => {
                Some(self.parse_literal())
            }
            TokenKind::Identifier => Some(self.parse_identifier_led_stmt()),
            TokenKind::Punct if tok.lexeme == "->" => Some(self.parse_local()),
            TokenKind::Punct if is_builtin_instruction(&tok.lexeme) => {
                self.advance();
                Some(self.builder.alloc(NodeData::Instruction { name: tok.lexeme }, tok.position))
            }
            TokenKind::Error => {
                // The lexer already recorded a diagnostic for this token.
                self.advance();
                None
            }
            _ => {
                self.error(
                    Category::Syntactic,
                    tok.position,
                    format!("unexpected token '{}'", tok.lexeme),
                );
                None
            }
        }
    }

    fn parse_identifier_led_stmt(&mut self) -> NodeId {
        let lexeme = self.peek().lexeme.clone();
        match lexeme.as_str() {
            "if" => self.parse_if(),
            "for" => self.parse_for(),
            "switch" => self.parse_switch(),
            "defer" => self.parse_defer(),
            "return" => {
                let position = self.advance().position;
                self.builder.alloc(NodeData::ReturnStatement, position)
            }
            "break" => {
                let position = self.advance().position;
                self.builder.alloc(NodeData::BreakStatement, position)
            }
            "continue" => {
                let position = self.advance().position;
                self.builder.alloc(NodeData::ContinueStatement, position)
            }
            "const" => self.parse_constant(),
            _ => {
                let tok = self.advance();
                if self.is_punct("::") {
                    self.advance();
                    let (name, _) = self.expect_name();
                    self.builder.alloc(
                        NodeData::ScopedIdentifier {
                            scope: tok.lexeme,
                            name,
                        },
                        tok.position,
                    )
                } else if self.is_punct(":") {
                    self.advance();
                    self.builder.alloc(NodeData::Label { name: tok.lexeme }, tok.position)
                } else if is_builtin_instruction(&tok.lexeme) {
                    self.builder.alloc(NodeData::Instruction { name: tok.lexeme }, tok.position)
                } else {
                    self.builder.alloc(NodeData::Identifier { name: tok.lexeme }, tok.position)
                }
            }
        }
    }

    fn parse_local(&mut self) -> NodeId {
        let start = self.expect_punct("->");
        let (name, _) = self.expect_name();
        self.builder.alloc(NodeData::Local { name }, start)
    }

    fn parse_if(&mut self) -> NodeId {
        let start = self.expect_keyword("if");
        let then_block = self.parse_block();
        let else_block = if self.is_identifier("else") {
            self.advance();
            Some(self.parse_block())
        } else {
            None
        };
        let node = self.builder.alloc(
            NodeData::IfStatement { then_block, else_block },
            start,
        );
        self.builder.attach(node, then_block);
        if let Some(eb) = else_block {
            self.builder.attach(node, eb);
        }
        node
    }

    fn parse_for(&mut self) -> NodeId {
        let start = self.expect_keyword("for");
        let label = if self.peek().kind == TokenKind::Identifier {
            Some(self.expect_name().0)
        } else {
            None
        };
        let body = self.parse_block();
        let node = self.builder.alloc(NodeData::ForStatement { label, body }, start);
        self.builder.attach(node, body);
        node
    }

    fn parse_switch(&mut self) -> NodeId {
        let start = self.expect_keyword("switch");
        self.expect_punct("{");
        let mut cases = Vec::new();
        loop {
            if self.is_punct("}") {
                self.advance();
                break;
            }
            if self.at_eof() {
                self.error(Category::Syntactic, self.peek().position, "expected '}' in switch");
                break;
            }
            if self.is_identifier("case") || self.is_identifier("default") {
                cases.push(self.parse_case());
            } else {
                self.error(
                    Category::Syntactic,
                    self.peek().position,
                    "expected 'case' or 'default'",
                );
                self.recover_to_case_boundary();
            }
        }
        let node = self.builder.alloc(NodeData::SwitchStatement { cases: cases.clone() }, start);
        self.builder.attach_many(node, &cases);
        node
    }

    fn recover_to_case_boundary(&mut self) {
        loop {
            if self.at_eof() || self.is_punct("}") || self.is_identifier("case") || self.is_identifier("default") {
                return;
            }
            self.advance();
        }
    }

    fn parse_case(&mut self) -> NodeId {
        let is_default = self.is_identifier("default");
        let start = if is_default {
            self.advance().position
        } else {
            self.expect_keyword("case")
        };
        let test = if is_default {
            None
        } else {
            self.parse_stmt()
        };
        let body = self.parse_block();
        let node = self.builder.alloc(NodeData::CaseStatement { test, body }, start);
        if let Some(t) = test {
            self.builder.attach(node, t);
        }
        self.builder.attach(node, body);
        node
    }

    fn parse_defer(&mut self) -> NodeId {
        let start = self.expect_keyword("defer");
        let target = if self.is_punct("{") {
            self.parse_block()
        } else {
            match self.parse_stmt() {
                Some(n) => n,
                None => self.builder.alloc(NodeData::Block, start),
            }
        };
        let node = self.builder.alloc(NodeData::DeferStatement { target }, start);
        self.builder.attach(node, target);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn s1_trivial_function() {
        let result = parse("fn main( -- ) { 42 . nl }");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let ast = result.ast;
        let program = ast.root();
        assert_eq!(ast.child_count(program), 1);
        let func = ast.child(program, 0);
        assert_eq!(ast.kind(func), NodeKind::FunctionDeclaration);
        let NodeData::FunctionDeclaration { name, body, .. } = &ast.node(func).data else {
            panic!("expected FunctionDeclaration")
        };
        assert_eq!(name, "main");
        assert_eq!(ast.child_count(*body), 3);
        let kinds: Vec<NodeKind> = (0..3).map(|i| ast.kind(ast.child(*body, i))).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Literal, NodeKind::Instruction, NodeKind::Instruction]
        );
    }

    #[test]
    fn s2_undefined_call_parses_as_identifier() {
        let result = parse("fn main( -- ) { doesnotexist }");
        assert!(result.diagnostics.is_empty());
        let ast = result.ast;
        let func = ast.child(ast.root(), 0);
        let NodeData::FunctionDeclaration { body, .. } = &ast.node(func).data else {
            panic!()
        };
        let stmt = ast.child(*body, 0);
        assert_eq!(ast.kind(stmt), NodeKind::Identifier);
    }

    #[test]
    fn parses_function_signature_with_inputs_and_outputs() {
        let result = parse("fn add(a:i64 b:i64 -- r:i64) { a b + }");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let ast = result.ast;
        let func = ast.child(ast.root(), 0);
        let NodeData::FunctionDeclaration { inputs, outputs, .. } = &ast.node(func).data else {
            panic!()
        };
        assert_eq!(inputs.len(), 2);
        assert_eq!(outputs.len(), 1);
        for &p in inputs.iter().chain(outputs.iter()) {
            assert_eq!(ast.parent(p), Some(func));
        }
    }

    #[test]
    fn parses_scoped_identifier() {
        let result = parse("fn main( -- ) { 9 math::sqrt . nl }");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let ast = result.ast;
        let func = ast.child(ast.root(), 0);
        let NodeData::FunctionDeclaration { body, .. } = &ast.node(func).data else { panic!() };
        let scoped = ast.child(*body, 1);
        assert_eq!(ast.kind(scoped), NodeKind::ScopedIdentifier);
        assert_eq!(
            ast.node(scoped).data,
            NodeData::ScopedIdentifier { scope: "math".into(), name: "sqrt".into() }
        );
    }

    #[test]
    fn parses_use_and_const_and_sibling_module_name() {
        let result = parse("use math\nuse helpers.q\nconst PI = 3.14\nfn main( -- ) { }");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let ast = result.ast;
        assert_eq!(ast.child_count(ast.root()), 4);
        assert_eq!(
            ast.node(ast.child(ast.root(), 0)).data,
            NodeData::UseStatement { module_name: "math".into() }
        );
        assert_eq!(
            ast.node(ast.child(ast.root(), 1)).data,
            NodeData::UseStatement { module_name: "helpers.q".into() }
        );
    }

    #[test]
    fn parses_if_for_switch_defer() {
        let src = "fn main( -- ) { if { 1 } else { 2 } for i { break } switch { case 1 { } default { } } defer { nl } }";
        let result = parse(src);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn recovers_from_unexpected_token_in_block() {
        let result = parse("fn main( -- ) { @ return }");
        assert!(!result.diagnostics.is_empty());
        let ast = result.ast;
        let func = ast.child(ast.root(), 0);
        let NodeData::FunctionDeclaration { body, .. } = &ast.node(func).data else { panic!() };
        // the block remains in the tree with the statement after the bad token recovered
        assert!(ast.child_count(*body) >= 1);
        let last = ast.child(*body, ast.child_count(*body) - 1);
        assert_eq!(ast.kind(last), NodeKind::ReturnStatement);
    }

    #[test]
    fn every_non_root_node_has_a_consistent_parent() {
        let result = parse("fn add(a:i64 b:i64 -- r:i64) { a b + return }");
        let ast = result.ast;
        fn check(ast: &Ast, id: NodeId) {
            for i in 0..ast.child_count(id) {
                let child = ast.child(id, i);
                assert_eq!(ast.parent(child), Some(id));
                check(ast, child);
            }
        }
        check(&ast, ast.root());
    }

    #[test]
    fn parse_is_deterministic() {
        let src = "fn main( -- ) { 1 2 + . nl }";
        let a = parse(src);
        let b = parse(src);
        assert_eq!(a.diagnostics, b.diagnostics);
        assert_eq!(a.ast.len(), b.ast.len());
    }
}

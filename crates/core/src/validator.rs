//! Two-pass semantic validator: collect function definitions, then flag
//! references to undefined functions (spec §4.4).
//!
//! Grounded directly in
//! `original_source/lib/qc/src/semantic_validator.cc`: the original
//! `SemanticValidator::validate()` runs `collectDefinitions()` then
//! `validateReferences()` over the same tree, checking each `Identifier`
//! against a built-in list and a `defined_functions_` set collected in the
//! first pass. The validator is pure: it only ever builds a diagnostic
//! list, never touches the tree (spec §4.4 "the validator is pure").

use std::collections::HashSet;

use crate::ast::{Ast, NodeData, NodeId};
use crate::builtins::is_known_instruction;
use crate::diagnostics::{Category, Diagnostic};

/// Validate `ast`, reporting `undefined function '<name>'` for every
/// `Identifier` node whose name is neither a built-in instruction nor the
/// name of a `FunctionDeclaration` found anywhere in the unit.
///
/// `validating_stdlib` selects the superset built-in list used when the
/// unit being validated is a standard-library module itself (spec §4.4,
/// §4.6): stdlib source calling another stdlib primitive must not be
/// flagged as calling an undefined function.
pub fn validate(ast: &Ast, validating_stdlib: bool) -> Vec<Diagnostic> {
    let mut defined = HashSet::new();
    collect_definitions(ast, ast.root(), &mut defined);

    let mut diagnostics = Vec::new();
    validate_references(ast, ast.root(), &defined, validating_stdlib, &mut diagnostics);
    diagnostics
}

fn collect_definitions(ast: &Ast, node: NodeId, defined: &mut HashSet<String>) {
    if let NodeData::FunctionDeclaration { name, .. } = &ast.node(node).data {
        defined.insert(name.clone());
    }
    for i in 0..ast.child_count(node) {
        collect_definitions(ast, ast.child(node, i), defined);
    }
}

fn validate_references(
    ast: &Ast,
    node: NodeId,
    defined: &HashSet<String>,
    validating_stdlib: bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let NodeData::Identifier { name } = &ast.node(node).data {
        if !is_known_instruction(name, validating_stdlib) && !defined.contains(name) {
            diagnostics.push(Diagnostic::error(
                Category::Semantic,
                ast.position(node),
                format!("undefined function '{name}'"),
            ));
        }
    }
    for i in 0..ast.child_count(node) {
        validate_references(ast, ast.child(node, i), defined, validating_stdlib, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn s1_trivial_function_has_no_errors() {
        let result = parse("fn main( -- ) { 42 . nl }");
        assert!(validate(&result.ast, false).is_empty());
    }

    #[test]
    fn s2_undefined_call_reports_one_diagnostic() {
        let result = parse("fn main( -- ) { doesnotexist }");
        let diags = validate(&result.ast, false);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("doesnotexist"));
        assert_eq!(diags[0].category, Category::Semantic);
    }

    #[test]
    fn calls_to_a_later_defined_function_are_accepted() {
        let result = parse("fn main( -- ) { helper } fn helper( -- ) { nl }");
        assert!(validate(&result.ast, false).is_empty());
    }

    #[test]
    fn scoped_identifiers_are_not_flagged() {
        let result = parse("fn main( -- ) { 9 math::sqrt . nl }");
        assert!(validate(&result.ast, false).is_empty());
    }

    #[test]
    fn stdlib_mode_accepts_stdlib_only_primitives() {
        let result = parse("fn square(x:f64 -- r:f64) { x sqrt }");
        assert!(!validate(&result.ast, false).is_empty());
        assert!(validate(&result.ast, true).is_empty());
    }

    #[test]
    fn reports_every_undefined_identifier_and_no_others() {
        let result = parse("fn main( -- ) { a b helper c } fn helper( -- ) { }");
        let diags = validate(&result.ast, false);
        let names: Vec<&str> = diags
            .iter()
            .map(|d| d.message.trim_start_matches("undefined function '").trim_end_matches('\''))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}

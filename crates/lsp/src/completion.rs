//! `textDocument/completion`: built-in instruction names plus whatever
//! functions are defined in the current document (spec §3, §6).
//!
//! Grounded in the teacher's `crates/lsp/src/completion.rs::get_completions`
//! for the item shape (name + kind + detail); the context-sensitive
//! branching there (include paths, stack-effect types, string/comment
//! detection) has no counterpart since this language's grammar has no
//! `include` directive inside expression position and no stdlib-module
//! completion surface (spec §6 only names function/instruction completion).

use quad_core::builtins::BUILTIN_INSTRUCTIONS;
use quad_core::{Ast, NodeData};
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

fn local_function_names(ast: &Ast) -> Vec<&str> {
    let root = ast.root();
    (0..ast.child_count(root))
        .filter_map(|i| {
            let child = ast.child(root, i);
            match &ast.node(child).data {
                NodeData::FunctionDeclaration { name, .. } => Some(name.as_str()),
                _ => None,
            }
        })
        .collect()
}

/// All completion items for `ast`: every built-in instruction, then every
/// locally defined function, in that order.
pub fn completions(ast: &Ast) -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = BUILTIN_INSTRUCTIONS
        .iter()
        .map(|name| CompletionItem {
            label: name.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            detail: Some("built-in instruction".to_string()),
            ..Default::default()
        })
        .collect();

    items.extend(local_function_names(ast).into_iter().map(|name| CompletionItem {
        label: name.to_string(),
        kind: Some(CompletionItemKind::FUNCTION),
        detail: Some("defined in this file".to_string()),
        ..Default::default()
    }));

    items
}

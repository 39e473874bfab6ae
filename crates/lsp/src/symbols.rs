//! Document symbols for `textDocument/documentSymbol` (spec §6's named LSP
//! surface): one symbol per top-level `FunctionDeclaration`.
//!
//! Grounded in the teacher's `crates/lsp/src/main.rs::document_symbol`,
//! which maps its own `LocalWord` list the same way; here the source is the
//! AST directly rather than a separate lightweight "local word" scan, since
//! `quad_core::parse` already gives us a tree to walk.

use quad_core::{Ast, NodeData};
use tower_lsp::lsp_types::{DocumentSymbol, Position, Range, SymbolKind};

fn format_signature(ast: &Ast, inputs: &[quad_core::NodeId], outputs: &[quad_core::NodeId]) -> String {
    let fmt_params = |ids: &[quad_core::NodeId]| {
        ids.iter()
            .map(|&id| match &ast.node(id).data {
                NodeData::Parameter { name, type_name } if !type_name.is_empty() => {
                    format!("{name}:{type_name}")
                }
                NodeData::Parameter { name, .. } => name.clone(),
                _ => String::new(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    };
    format!("( {} -- {} )", fmt_params(inputs), fmt_params(outputs))
}

/// Every `FunctionDeclaration` directly under the program root, in source
/// order. Functions are never nested (spec §3), so this is a flat scan
/// rather than a recursive walk.
pub fn document_symbols(ast: &Ast) -> Vec<DocumentSymbol> {
    let root = ast.root();
    (0..ast.child_count(root))
        .filter_map(|i| {
            let child = ast.child(root, i);
            match &ast.node(child).data {
                NodeData::FunctionDeclaration {
                    name,
                    inputs,
                    outputs,
                    ..
                } => Some(function_symbol(ast, child, name, inputs, outputs)),
                _ => None,
            }
        })
        .collect()
}

fn function_symbol(
    ast: &Ast,
    id: quad_core::NodeId,
    name: &str,
    inputs: &[quad_core::NodeId],
    outputs: &[quad_core::NodeId],
) -> DocumentSymbol {
    let position = ast.position(id);
    let line = position.line.saturating_sub(1);
    let start = Position {
        line,
        character: position.column.saturating_sub(1),
    };
    let end = Position {
        line,
        character: start.character + position.length.max(1),
    };

    #[allow(deprecated)]
    DocumentSymbol {
        name: name.to_string(),
        detail: Some(format_signature(ast, inputs, outputs)),
        kind: SymbolKind::FUNCTION,
        tags: None,
        deprecated: None,
        range: Range { start, end },
        selection_range: Range { start, end },
        children: None,
    }
}

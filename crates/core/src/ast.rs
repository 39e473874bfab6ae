//! Arena-based AST: a tagged-variant node tree with non-owning parent links.
//!
//! Grounded in spec §9's explicit redesign guidance ("a re-implementation is
//! best done with a tagged variant carrying a common header `{kind,
//! position, parent}`... the parent link is a non-owning back-reference...
//! an index into an arena"), which is itself the Rust-idiomatic answer to
//! the virtual-inheritance `IAstNode` hierarchy in
//! `original_source/lib/qc/include/qc/ast_node_local.h` (`type()`,
//! `childCount()`, `child(i)`, `parent()`). Unlike that hierarchy, and
//! unlike the teacher's flat `Statement` enum (`crates/compiler/src/ast.rs`
//! in the example pack, which has no parent back-references or uniform
//! child iteration), every node here lives in one `Ast` arena and is
//! addressed by a `NodeId`; destroying the arena frees the whole tree in one
//! step, matching spec §3's lifecycle invariant.

use crate::diagnostics::SourcePosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Program,
    Block,
    FunctionDeclaration,
    Parameter,
    ConstantDeclaration,
    UseStatement,
    IfStatement,
    ForStatement,
    SwitchStatement,
    CaseStatement,
    DeferStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    Literal,
    Identifier,
    ScopedIdentifier,
    Instruction,
    Local,
    Label,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Float,
    String,
}

/// Kind-specific payload. Every variant's node additionally carries the
/// common header (`parent`, `position`, `children`) stored on `Node` itself.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Program,
    Block,
    /// `name`, ordered input `Parameter` ids, ordered output `Parameter`
    /// ids, `body` (a `Block`). Inputs/outputs are also present in
    /// `children` (in declaration order, inputs then outputs then body),
    /// satisfying invariant (iii): parameters are only children of a
    /// `FunctionDeclaration`.
    FunctionDeclaration {
        name: String,
        inputs: Vec<NodeId>,
        outputs: Vec<NodeId>,
        body: NodeId,
    },
    /// `type_name` is `"i64" | "f64" | "str" | ""` (untyped).
    Parameter { name: String, type_name: String },
    ConstantDeclaration { name: String, value: NodeId },
    /// Bare module name, or a sibling-file reference ending in the source
    /// suffix (spec §4.6 step 3b).
    UseStatement { module_name: String },
    IfStatement {
        then_block: NodeId,
        else_block: Option<NodeId>,
    },
    ForStatement { label: Option<String>, body: NodeId },
    SwitchStatement { cases: Vec<NodeId> },
    /// `test` is `None` for a `default` arm.
    CaseStatement {
        test: Option<NodeId>,
        body: NodeId,
    },
    /// `target` is the deferred block or statement.
    DeferStatement { target: NodeId },
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    /// `raw` is the literal's original textual form, quotes included for
    /// strings, per spec §3.
    Literal { kind: LiteralKind, raw: String },
    Identifier { name: String },
    ScopedIdentifier { scope: String, name: String },
    Instruction { name: String },
    /// `-> name`; syntactic placeholder per spec §9 Open Question.
    Local { name: String },
    /// `name:`; syntactic placeholder per spec §9 Open Question.
    Label { name: String },
    Comment { text: String },
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Program => NodeKind::Program,
            NodeData::Block => NodeKind::Block,
            NodeData::FunctionDeclaration { .. } => NodeKind::FunctionDeclaration,
            NodeData::Parameter { .. } => NodeKind::Parameter,
            NodeData::ConstantDeclaration { .. } => NodeKind::ConstantDeclaration,
            NodeData::UseStatement { .. } => NodeKind::UseStatement,
            NodeData::IfStatement { .. } => NodeKind::IfStatement,
            NodeData::ForStatement { .. } => NodeKind::ForStatement,
            NodeData::SwitchStatement { .. } => NodeKind::SwitchStatement,
            NodeData::CaseStatement { .. } => NodeKind::CaseStatement,
            NodeData::DeferStatement { .. } => NodeKind::DeferStatement,
            NodeData::ReturnStatement => NodeKind::ReturnStatement,
            NodeData::BreakStatement => NodeKind::BreakStatement,
            NodeData::ContinueStatement => NodeKind::ContinueStatement,
            NodeData::Literal { .. } => NodeKind::Literal,
            NodeData::Identifier { .. } => NodeKind::Identifier,
            NodeData::ScopedIdentifier { .. } => NodeKind::ScopedIdentifier,
            NodeData::Instruction { .. } => NodeKind::Instruction,
            NodeData::Local { .. } => NodeKind::Local,
            NodeData::Label { .. } => NodeKind::Label,
            NodeData::Comment { .. } => NodeKind::Comment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub data: NodeData,
    pub position: SourcePosition,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Owns every node in a parsed unit. Dropping the `Ast` frees the whole
/// tree, matching spec §3's "destroying that value frees the entire tree".
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root.expect("Ast::root called before the tree was finished")
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).data.kind()
    }

    pub fn position(&self, id: NodeId) -> SourcePosition {
        self.node(id).position
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    pub fn child(&self, id: NodeId, index: usize) -> NodeId {
        self.node(id).children[index]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recursive pre-order walk starting at `id`, visiting `id` itself first.
    pub fn walk(&self, id: NodeId, visit: &mut impl FnMut(NodeId)) {
        visit(id);
        for i in 0..self.child_count(id) {
            self.walk(self.child(id, i), visit);
        }
    }
}

/// Builds an `Ast` bottom-up. The only permitted mutation during
/// construction is appending a child and setting its parent pointer exactly
/// once (spec §4.2); there is no API to remove or reorder children after
/// they are attached.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub fn new() -> Self {
        AstBuilder { nodes: Vec::new() }
    }

    /// Allocate a detached node (no parent yet, no children yet).
    pub fn alloc(&mut self, data: NodeData, position: SourcePosition) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            position,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Attach `child` under `parent`: appends to `parent`'s children and
    /// sets `child`'s parent pointer. Panics if `child` already has a
    /// parent — every node is attached exactly once.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.nodes[child.index()].parent.is_none(),
            "AstBuilder::attach: node already has a parent"
        );
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub fn attach_many(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            self.attach(parent, child);
        }
    }

    /// Finish construction, declaring `root` as the tree's root (no
    /// parent). Panics if `root` already has a parent.
    pub fn finish(self, root: NodeId) -> Ast {
        assert!(
            self.nodes[root.index()].parent.is_none(),
            "AstBuilder::finish: root must not have a parent"
        );
        Ast {
            nodes: self.nodes,
            root: Some(root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePosition {
        SourcePosition::new(1, 1, 0, 1)
    }

    #[test]
    fn parent_child_consistency_holds_after_attach() {
        let mut b = AstBuilder::new();
        let program = b.alloc(NodeData::Program, pos());
        let lit = b.alloc(
            NodeData::Literal {
                kind: LiteralKind::Int,
                raw: "42".into(),
            },
            pos(),
        );
        b.attach(program, lit);
        let ast = b.finish(program);

        assert_eq!(ast.parent(lit), Some(program));
        let k = (0..ast.child_count(program)).find(|&i| ast.child(program, i) == lit);
        assert!(k.is_some(), "lit must appear among program's children");
    }

    #[test]
    fn root_has_no_parent() {
        let mut b = AstBuilder::new();
        let program = b.alloc(NodeData::Program, pos());
        let ast = b.finish(program);
        assert_eq!(ast.parent(ast.root()), None);
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn attaching_twice_panics() {
        let mut b = AstBuilder::new();
        let program = b.alloc(NodeData::Program, pos());
        let block = b.alloc(NodeData::Block, pos());
        let other = b.alloc(NodeData::Block, pos());
        b.attach(program, block);
        b.attach(other, block);
    }

    #[test]
    fn walk_visits_every_node_preorder() {
        let mut b = AstBuilder::new();
        let program = b.alloc(NodeData::Program, pos());
        let block = b.alloc(NodeData::Block, pos());
        let lit = b.alloc(
            NodeData::Literal {
                kind: LiteralKind::Int,
                raw: "1".into(),
            },
            pos(),
        );
        b.attach(block, lit);
        b.attach(program, block);
        let ast = b.finish(program);

        let mut seen = Vec::new();
        ast.walk(ast.root(), &mut |id| seen.push(ast.kind(id)));
        assert_eq!(
            seen,
            vec![NodeKind::Program, NodeKind::Block, NodeKind::Literal]
        );
    }
}

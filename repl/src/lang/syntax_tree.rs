// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! An immutable syntax tree. Nodes are never cached across edits: the editor re-parses
//! the whole buffer whenever it needs a tree, which is cheap at prompt sizes.

use std::fmt::{Display, Formatter};

/// Half open `[start, end)` range of character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self { Self { start, end } }

    #[must_use]
    pub const fn len(&self) -> usize { self.end.saturating_sub(self.start) }

    #[must_use]
    pub const fn is_empty(&self) -> bool { self.len() == 0 }

    /// The cursor sits "in" a node when it is anywhere from the first character to just
    /// past the last one. This is what makes `obj.na|` complete the node that ends right
    /// at the cursor.
    #[must_use]
    pub const fn contains_cursor(&self, cursor: usize) -> bool {
        self.start <= cursor && cursor <= self.end
    }

    /// Clamp both ends to `max`.
    #[must_use]
    pub fn clamp_to(&self, max: usize) -> Self {
        Self::new(self.start.min(max), self.end.min(max))
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum BinaryOp {
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "-")]
    Sub,
    #[strum(to_string = "*")]
    Mul,
    #[strum(to_string = "==")]
    Equal,
    #[strum(to_string = "!=")]
    NotEqual,
    #[strum(to_string = "<")]
    Less,
    #[strum(to_string = ">")]
    Greater,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

/// Closed set of node kinds. The suggestion engine dispatches on this with exhaustive
/// `match`es, so adding a kind is a compile time checked change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Module { statements: Vec<Node> },
    Block { statements: Vec<Node> },
    /// `init { .. }`, runs once per module, with the block's statements.
    Initializer { body: Box<Node> },
    /// `for [<binding> in] <iterable> { .. }`.
    ForStatement {
        binding: Option<String>,
        iterable: Box<Node>,
        body: Box<Node>,
    },
    /// `walk <target>, <binding> { .. }`.
    WalkStatement {
        target: Box<Node>,
        binding: Box<Node>,
        body: Box<Node>,
    },
    IfStatement {
        condition: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    Assignment { target: Box<Node>, value: Box<Node> },
    BreakStatement,
    ContinueStatement,
    PruneStatement,
    ReturnStatement { value: Option<Box<Node>> },
    /// Both the command form `cmd sub arg` and the parenthesized form `f(a, b)`. The span
    /// of a command form call extends over trailing horizontal whitespace, so a cursor
    /// after `cmd sub ` is inside the call but outside every argument.
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
        is_parenthesized: bool,
    },
    Identifier { name: String },
    LocalVariable { name: String },
    GlobalVariable { name: String },
    /// `%name` or `%namespace.` (the name keeps the trailing dot).
    PatternName { name: String },
    /// `base.prop.prop`; every property is an [`NodeKind::Identifier`], the last one may
    /// be empty while it is being typed.
    Member { base: Box<Node>, properties: Vec<Node> },
    ListLiteral { elements: Vec<Node> },
    ObjectLiteral { properties: Vec<Node> },
    ObjectProperty { key: String, value: Box<Node> },
    StringLiteral { value: String },
    IntLiteral { value: i64 },
    BoolLiteral { value: bool },
    NilLiteral,
    PathLiteral { raw: String },
    UrlLiteral { raw: String },
    HostLiteral { raw: String },
    SchemeLiteral { raw: String },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Source the parser couldn't make sense of. Kept in the tree so that spans still
    /// cover the whole input.
    Invalid { text: String },
}

/// Returned by the visitor passed to [`Node::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalAction {
    Continue,
    SkipChildren,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind, start: usize, end: usize) -> Self {
        Self {
            span: Span::new(start, end),
            kind,
        }
    }

    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Module { statements } | NodeKind::Block { statements } => {
                statements.iter().collect()
            }
            NodeKind::Initializer { body } => vec![body.as_ref()],
            NodeKind::ForStatement { iterable, body, .. } => {
                vec![iterable.as_ref(), body.as_ref()]
            }
            NodeKind::WalkStatement {
                target,
                binding,
                body,
            } => vec![target.as_ref(), binding.as_ref(), body.as_ref()],
            NodeKind::IfStatement {
                condition,
                consequent,
                alternate,
            } => {
                let mut acc: Vec<&Node> = vec![condition.as_ref(), consequent.as_ref()];
                if let Some(it) = alternate {
                    acc.push(it);
                }
                acc
            }
            NodeKind::Assignment { target, value } => vec![target.as_ref(), value.as_ref()],
            NodeKind::ReturnStatement { value } => value.as_deref().into_iter().collect(),
            NodeKind::Call { callee, args, .. } => {
                let mut acc: Vec<&Node> = vec![callee.as_ref()];
                acc.extend(args.iter());
                acc
            }
            NodeKind::Member { base, properties } => {
                let mut acc: Vec<&Node> = vec![base.as_ref()];
                acc.extend(properties.iter());
                acc
            }
            NodeKind::ListLiteral { elements } => elements.iter().collect(),
            NodeKind::ObjectLiteral { properties } => properties.iter().collect(),
            NodeKind::ObjectProperty { value, .. } => vec![value.as_ref()],
            NodeKind::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            NodeKind::BreakStatement
            | NodeKind::ContinueStatement
            | NodeKind::PruneStatement
            | NodeKind::Identifier { .. }
            | NodeKind::LocalVariable { .. }
            | NodeKind::GlobalVariable { .. }
            | NodeKind::PatternName { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::IntLiteral { .. }
            | NodeKind::BoolLiteral { .. }
            | NodeKind::NilLiteral
            | NodeKind::PathLiteral { .. }
            | NodeKind::UrlLiteral { .. }
            | NodeKind::HostLiteral { .. }
            | NodeKind::SchemeLiteral { .. }
            | NodeKind::Invalid { .. } => vec![],
        }
    }

    /// Pre-order traversal. The visitor receives each node and the stack of its ancestors
    /// (outermost first), and decides whether to descend into the node's children.
    pub fn walk<'a, F>(&'a self, visitor: &mut F)
    where
        F: FnMut(&'a Node, &[&'a Node]) -> TraversalAction,
    {
        let mut ancestors: Vec<&'a Node> = vec![];
        self.walk_impl(&mut ancestors, visitor);
    }

    fn walk_impl<'a, F>(&'a self, ancestors: &mut Vec<&'a Node>, visitor: &mut F)
    where
        F: FnMut(&'a Node, &[&'a Node]) -> TraversalAction,
    {
        if visitor(self, ancestors) == TraversalAction::SkipChildren {
            return;
        }
        ancestors.push(self);
        for child in self.children() {
            child.walk_impl(ancestors, visitor);
        }
        ancestors.pop();
    }

    /// Nodes that stop the upward search for an enclosing `for` or `walk` statement.
    #[must_use]
    pub fn is_scope_boundary(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Module { .. } | NodeKind::Initializer { .. }
        )
    }

    #[must_use]
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: usize) -> Node {
        Node::new(
            NodeKind::Identifier { name: name.into() },
            start,
            start + name.len(),
        )
    }

    #[test]
    fn test_span_contains_cursor_is_inclusive_of_end() {
        let span = Span::new(2, 5);
        assert!(!span.contains_cursor(1));
        assert!(span.contains_cursor(2));
        assert!(span.contains_cursor(5));
        assert!(!span.contains_cursor(6));
        assert_eq!(span.len(), 3);
        assert_eq!(Span::new(9, 10).clamp_to(9), Span::new(9, 9));
    }

    #[test]
    fn test_walk_visits_in_pre_order_with_ancestors() {
        let call = Node::new(
            NodeKind::Call {
                callee: Box::new(ident("cmd", 0)),
                args: vec![ident("help", 4)],
                is_parenthesized: false,
            },
            0,
            8,
        );
        let module = Node::new(
            NodeKind::Module {
                statements: vec![call],
            },
            0,
            8,
        );

        let mut visited = vec![];
        module.walk(&mut |node, ancestors| {
            visited.push((node.identifier_name().map(String::from), ancestors.len()));
            TraversalAction::Continue
        });

        pretty_assertions::assert_eq!(
            visited,
            vec![
                (None, 0),
                (None, 1),
                (Some("cmd".to_string()), 2),
                (Some("help".to_string()), 2),
            ]
        );
    }

    #[test]
    fn test_walk_skip_children() {
        let module = Node::new(
            NodeKind::Module {
                statements: vec![Node::new(
                    NodeKind::ListLiteral {
                        elements: vec![ident("a", 1)],
                    },
                    0,
                    3,
                )],
            },
            0,
            3,
        );
        let mut count = 0;
        module.walk(&mut |node, _| {
            count += 1;
            if matches!(node.kind, NodeKind::ListLiteral { .. }) {
                TraversalAction::SkipChildren
            } else {
                TraversalAction::Continue
            }
        });
        assert_eq!(count, 2);
    }
}

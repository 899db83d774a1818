// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{Node, NodeKind, TraversalAction};

/// The deepest node whose span contains the cursor, plus its ancestors (outermost
/// first).
#[derive(Debug, Clone)]
pub struct NodeAtCursor<'a> {
    pub node: &'a Node,
    pub ancestors: Vec<&'a Node>,
}

impl<'a> NodeAtCursor<'a> {
    #[must_use]
    pub fn parent(&self) -> Option<&'a Node> { self.ancestors.last().copied() }

    #[must_use]
    pub fn grandparent(&self) -> Option<&'a Node> {
        self.ancestors.iter().rev().nth(1).copied()
    }
}

/// Find the node at `cursor`. Subtrees that don't contain the cursor are never entered.
/// When siblings touch at the cursor, the later one wins. An identifier that is part of
/// a member access is promoted to the whole access chain.
#[must_use]
pub fn find_node_at_cursor(root: &Node, cursor: usize) -> Option<NodeAtCursor<'_>> {
    let mut found: Option<NodeAtCursor<'_>> = None;

    root.walk(&mut |node, ancestors| {
        if !node.span.contains_cursor(cursor) {
            return TraversalAction::SkipChildren;
        }
        let is_deeper_or_later = found
            .as_ref()
            .is_none_or(|it| ancestors.len() >= it.ancestors.len());
        if is_deeper_or_later {
            found = Some(NodeAtCursor {
                node,
                ancestors: ancestors.to_vec(),
            });
        }
        TraversalAction::Continue
    });

    let mut found = found?;
    if matches!(found.node.kind, NodeKind::Identifier { .. })
        && let Some(parent) = found.parent()
        && matches!(parent.kind, NodeKind::Member { .. })
    {
        found.ancestors.pop();
        found.node = parent;
    }
    Some(found)
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Static checks that run before a command is allowed to start.

use std::collections::BTreeSet;

use crate::{CheckData, CheckError, Node, NodeKind, ParsedChunk, ScopeInfo};

/// The name a `for` loop binds when none is given.
pub const DEFAULT_LOOP_BINDING: &str = "it";

/// # Errors
///
/// Returns the chunk's parse error if it has one, otherwise the first misplaced
/// `break` / `continue` / `prune`, or the first read of a local that was never assigned.
pub fn check(chunk: &ParsedChunk, scope: &ScopeInfo) -> Result<CheckData, CheckError> {
    if let Some(error) = &chunk.error {
        return Err(CheckError::new(error.message.clone(), error.span));
    }

    let mut checker = Checker {
        known_locals: scope.local_names.clone(),
        data: CheckData::default(),
    };
    checker.check_node(&chunk.root, Context::default())?;
    Ok(checker.data)
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    in_loop: bool,
    in_walk: bool,
}

struct Checker {
    known_locals: BTreeSet<String>,
    data: CheckData,
}

impl Checker {
    fn check_node(&mut self, node: &Node, context: Context) -> Result<(), CheckError> {
        match &node.kind {
            NodeKind::BreakStatement | NodeKind::ContinueStatement if !context.in_loop => {
                let keyword = if matches!(node.kind, NodeKind::BreakStatement) {
                    "break"
                } else {
                    "continue"
                };
                Err(CheckError::new(
                    format!("`{keyword}` outside of a for loop"),
                    node.span,
                ))
            }
            NodeKind::PruneStatement if !context.in_walk => Err(CheckError::new(
                "`prune` outside of a walk statement",
                node.span,
            )),
            NodeKind::LocalVariable { name } => {
                if self.known_locals.contains(name) {
                    Ok(())
                } else {
                    Err(CheckError::new(
                        format!("local variable `${name}` is not assigned"),
                        node.span,
                    ))
                }
            }
            NodeKind::Assignment { target, value } => {
                self.check_node(value, context)?;
                match &target.kind {
                    NodeKind::LocalVariable { name } | NodeKind::Identifier { name } => {
                        self.known_locals.insert(name.clone());
                    }
                    NodeKind::GlobalVariable { .. } => {}
                    _ => {
                        return Err(CheckError::new(
                            "only variables can be assigned to",
                            target.span,
                        ));
                    }
                }
                Ok(())
            }
            NodeKind::ForStatement {
                binding,
                iterable,
                body,
            } => {
                self.check_node(iterable, context)?;
                if matches!(&iterable.kind, NodeKind::ListLiteral { elements } if elements.is_empty())
                {
                    self.data
                        .warnings
                        .push(format!("loop body never runs at {}", node.span));
                }
                self.known_locals.insert(
                    binding
                        .clone()
                        .unwrap_or_else(|| DEFAULT_LOOP_BINDING.to_string()),
                );
                self.check_node(body, Context {
                    in_loop: true,
                    ..context
                })
            }
            NodeKind::WalkStatement {
                target,
                binding,
                body,
            } => {
                self.check_node(target, context)?;
                if let Some(name) = binding.identifier_name() {
                    self.known_locals.insert(name.to_string());
                }
                self.check_node(body, Context {
                    in_walk: true,
                    ..context
                })
            }
            // A fresh scope: loop keywords don't reach through it.
            NodeKind::Initializer { body } => self.check_node(body, Context::default()),
            _ => {
                for child in node.children() {
                    self.check_node(child, context)?;
                }
                Ok(())
            }
        }
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tree walking interpreter. It checks the cancellation token before every statement
//! and every loop iteration, and `sleep` checks it while it waits, so an interrupt is
//! observed within a few milliseconds.

use std::{path::{Path, PathBuf},
          str::FromStr,
          time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{BinaryOp, Builtin, DEFAULT_LOOP_BINDING, EvalError, EvalState, Node,
            NodeKind, Value};

const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// How a statement finished.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Flow {
    Normal(Value),
    Break,
    Continue,
    Prune,
    Return(Value),
}

/// # Errors
///
/// Returns the first runtime error, or [`EvalError::Cancelled`] once `cancel` fires.
pub fn interpret(
    root: &Node,
    state: &mut EvalState,
    cancel: &CancellationToken,
) -> Result<Value, EvalError> {
    let interpreter = Interpreter { cancel };
    match interpreter.exec(root, state)? {
        Flow::Normal(value) | Flow::Return(value) => Ok(value),
        Flow::Break | Flow::Continue | Flow::Prune => Ok(Value::Nil),
    }
}

struct Interpreter<'a> {
    cancel: &'a CancellationToken,
}

impl Interpreter<'_> {
    fn bail_if_cancelled(&self) -> Result<(), EvalError> {
        if self.cancel.is_cancelled() {
            Err(EvalError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn exec(&self, node: &Node, state: &mut EvalState) -> Result<Flow, EvalError> {
        self.bail_if_cancelled()?;

        match &node.kind {
            NodeKind::Module { statements } | NodeKind::Block { statements } => {
                let mut last = Value::Nil;
                for statement in statements {
                    match self.exec(statement, state)? {
                        Flow::Normal(value) => last = value,
                        other => return Ok(other),
                    }
                }
                Ok(Flow::Normal(last))
            }
            NodeKind::Initializer { body } => self.exec(body, state),
            NodeKind::BreakStatement => Ok(Flow::Break),
            NodeKind::ContinueStatement => Ok(Flow::Continue),
            NodeKind::PruneStatement => Ok(Flow::Prune),
            NodeKind::ReturnStatement { value } => {
                let value = match value {
                    Some(it) => self.eval(it, state)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            NodeKind::Assignment { target, value } => {
                let value = self.eval(value, state)?;
                match &target.kind {
                    NodeKind::LocalVariable { name } | NodeKind::Identifier { name } => {
                        state.set_local(name.clone(), value);
                    }
                    NodeKind::GlobalVariable { name } => state.set_global(name.clone(), value),
                    _ => {
                        return Err(EvalError::TypeMismatch {
                            expected: "variable",
                            found: "expression",
                        });
                    }
                }
                Ok(Flow::Normal(Value::Nil))
            }
            NodeKind::IfStatement {
                condition,
                consequent,
                alternate,
            } => {
                if self.eval(condition, state)?.is_truthy() {
                    self.exec(consequent, state)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, state)
                } else {
                    Ok(Flow::Normal(Value::Nil))
                }
            }
            NodeKind::ForStatement {
                binding,
                iterable,
                body,
            } => {
                let binding = binding.as_deref().unwrap_or(DEFAULT_LOOP_BINDING);
                let items = match self.eval(iterable, state)? {
                    Value::List(items) => items,
                    Value::Object(map) => map.into_keys().map(Value::Str).collect(),
                    Value::Int(count) => (0..count.max(0)).map(Value::Int).collect(),
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "list",
                            found: other.type_name(),
                        });
                    }
                };
                for item in items {
                    self.bail_if_cancelled()?;
                    state.set_local(binding, item);
                    match self.exec(body, state)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal(_) | Flow::Continue | Flow::Prune => {}
                    }
                }
                Ok(Flow::Normal(Value::Nil))
            }
            NodeKind::WalkStatement {
                target,
                binding,
                body,
            } => {
                let binding = binding.identifier_name().unwrap_or(DEFAULT_LOOP_BINDING);
                let flow = match self.eval(target, state)? {
                    Value::Path(root) => {
                        let filesystem = state.filesystem.clone();
                        self.walk_dir(filesystem.as_ref(), Path::new(&root), binding, body, state)?
                    }
                    Value::List(items) => self.walk_list(items, binding, body, state)?,
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "path",
                            found: other.type_name(),
                        });
                    }
                };
                match flow {
                    Flow::Normal(_) | Flow::Prune => Ok(Flow::Normal(Value::Nil)),
                    other => Ok(other),
                }
            }
            _ => Ok(Flow::Normal(self.eval(node, state)?)),
        }
    }

    /// Pre-order walk over a directory tree. `prune` skips the children of the current
    /// entry; any other non normal flow ends the walk and is handed to the caller.
    fn walk_dir(
        &self,
        filesystem: &dyn crate::FilesystemProvider,
        dir: &Path,
        binding: &str,
        body: &Node,
        state: &mut EvalState,
    ) -> Result<Flow, EvalError> {
        for entry in filesystem.read_dir(dir)? {
            self.bail_if_cancelled()?;
            let entry_path: PathBuf = dir.join(&entry.name);
            state.set_local(binding, Value::Path(entry_path.to_string_lossy().into_owned()));
            match self.exec(body, state)? {
                Flow::Prune => continue,
                Flow::Normal(_) => {}
                other => return Ok(other),
            }
            if entry.is_dir {
                match self.walk_dir(filesystem, &entry_path, binding, body, state)? {
                    Flow::Normal(_) | Flow::Prune => {}
                    other => return Ok(other),
                }
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    fn walk_list(
        &self,
        items: Vec<Value>,
        binding: &str,
        body: &Node,
        state: &mut EvalState,
    ) -> Result<Flow, EvalError> {
        for item in items {
            self.bail_if_cancelled()?;
            state.set_local(binding, item.clone());
            match self.exec(body, state)? {
                Flow::Prune => continue,
                Flow::Normal(_) => {}
                other => return Ok(other),
            }
            if let Value::List(children) = item {
                match self.walk_list(children, binding, body, state)? {
                    Flow::Normal(_) | Flow::Prune => {}
                    other => return Ok(other),
                }
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    fn eval(&self, node: &Node, state: &mut EvalState) -> Result<Value, EvalError> {
        match &node.kind {
            NodeKind::Identifier { name } => resolve_identifier(name, state),
            NodeKind::LocalVariable { name } => state
                .locals
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable {
                    name: format!("${name}"),
                }),
            NodeKind::GlobalVariable { name } => state
                .globals
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable {
                    name: format!("$${name}"),
                }),
            NodeKind::PatternName { name } => Ok(Value::Str(format!("%{name}"))),
            NodeKind::StringLiteral { value } => Ok(Value::Str(value.clone())),
            NodeKind::IntLiteral { value } => Ok(Value::Int(*value)),
            NodeKind::BoolLiteral { value } => Ok(Value::Bool(*value)),
            NodeKind::NilLiteral => Ok(Value::Nil),
            NodeKind::PathLiteral { raw } => Ok(Value::Path(raw.clone())),
            NodeKind::UrlLiteral { raw }
            | NodeKind::HostLiteral { raw }
            | NodeKind::SchemeLiteral { raw } => Ok(Value::Url(raw.clone())),
            NodeKind::ListLiteral { elements } => {
                let mut acc = Vec::with_capacity(elements.len());
                for element in elements {
                    acc.push(self.eval(element, state)?);
                }
                Ok(Value::List(acc))
            }
            NodeKind::ObjectLiteral { properties } => {
                let mut acc = std::collections::BTreeMap::new();
                for property in properties {
                    if let NodeKind::ObjectProperty { key, value } = &property.kind {
                        acc.insert(key.clone(), self.eval(value, state)?);
                    }
                }
                Ok(Value::Object(acc))
            }
            NodeKind::ObjectProperty { value, .. } => self.eval(value, state),
            NodeKind::Member { base, properties } => {
                let mut current = self.eval(base, state)?;
                for property in properties {
                    let name = property.identifier_name().unwrap_or_default();
                    current = current.property(name).cloned().ok_or_else(|| {
                        EvalError::NoSuchProperty {
                            name: name.to_string(),
                        }
                    })?;
                }
                Ok(current)
            }
            NodeKind::Binary { op, left, right } => {
                let left = self.eval(left, state)?;
                let right = self.eval(right, state)?;
                eval_binary(*op, left, right)
            }
            NodeKind::Call {
                callee,
                args,
                is_parenthesized,
            } => self.eval_call(callee, args, *is_parenthesized, state),
            NodeKind::Module { .. }
            | NodeKind::Block { .. }
            | NodeKind::Initializer { .. }
            | NodeKind::ForStatement { .. }
            | NodeKind::WalkStatement { .. }
            | NodeKind::IfStatement { .. }
            | NodeKind::Assignment { .. }
            | NodeKind::BreakStatement
            | NodeKind::ContinueStatement
            | NodeKind::PruneStatement
            | NodeKind::ReturnStatement { .. } => match self.exec(node, state)? {
                Flow::Normal(value) | Flow::Return(value) => Ok(value),
                Flow::Break | Flow::Continue | Flow::Prune => Ok(Value::Nil),
            },
            // Only reachable when evaluating a tree that failed to parse.
            NodeKind::Invalid { .. } => Ok(Value::Nil),
        }
    }

    fn eval_call(
        &self,
        callee: &Node,
        args: &[Node],
        is_parenthesized: bool,
        state: &mut EvalState,
    ) -> Result<Value, EvalError> {
        let Some(name) = callee.identifier_name() else {
            return Err(EvalError::NotCallable {
                name: "expression".to_string(),
            });
        };

        let builtin = match state.locals.get(name).or_else(|| state.globals.get(name)) {
            Some(Value::Builtin(it)) => *it,
            Some(_) => {
                return Err(EvalError::NotCallable {
                    name: name.to_string(),
                });
            }
            None => Builtin::from_str(name).map_err(|_| EvalError::NotCallable {
                name: name.to_string(),
            })?,
        };

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let value = match &arg.kind {
                // Bare words in command form are strings: `print hello`.
                NodeKind::Identifier { name }
                    if !is_parenthesized && resolve_identifier(name, state).is_err() =>
                {
                    Value::Str(name.clone())
                }
                _ => self.eval(arg, state)?,
            };
            values.push(value);
        }

        self.call_builtin(builtin, values, state)
    }

    fn call_builtin(
        &self,
        builtin: Builtin,
        args: Vec<Value>,
        state: &mut EvalState,
    ) -> Result<Value, EvalError> {
        tracing::trace!(message = "call builtin", %builtin, arg_count = args.len());
        match builtin {
            Builtin::Print => {
                let line = args
                    .iter()
                    .map(|it| match it {
                        Value::Str(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                state.output_device.write_lines(&format!("{line}\n"))?;
                Ok(Value::Nil)
            }
            Builtin::Sleep => {
                let millis = match args.first() {
                    Some(Value::Int(it)) => u64::try_from(*it).unwrap_or(0),
                    Some(other) => {
                        return Err(EvalError::TypeMismatch {
                            expected: "int",
                            found: other.type_name(),
                        });
                    }
                    None => 0,
                };
                let mut remaining = Duration::from_millis(millis);
                while !remaining.is_zero() {
                    self.bail_if_cancelled()?;
                    let slice = remaining.min(SLEEP_SLICE);
                    std::thread::sleep(slice);
                    remaining -= slice;
                }
                self.bail_if_cancelled()?;
                Ok(Value::Nil)
            }
            Builtin::Assert => {
                let mut args = args.into_iter();
                let condition = args.next().unwrap_or_default();
                if condition.is_truthy() {
                    return Ok(Value::Nil);
                }
                let message = match args.next() {
                    Some(Value::Str(it)) => it,
                    Some(other) => other.to_string(),
                    None => format!("{condition} is not truthy"),
                };
                Err(EvalError::AssertionFailed { message })
            }
            Builtin::Len => match args.first() {
                Some(Value::Str(it)) => Ok(Value::Int(count_as_int(it.chars().count()))),
                Some(Value::List(it)) => Ok(Value::Int(count_as_int(it.len()))),
                Some(Value::Object(it)) => Ok(Value::Int(count_as_int(it.len()))),
                other => Err(EvalError::TypeMismatch {
                    expected: "list",
                    found: other.map_or("nothing", Value::type_name),
                }),
            },
        }
    }
}

fn count_as_int(count: usize) -> i64 { i64::try_from(count).unwrap_or(i64::MAX) }

fn resolve_identifier(name: &str, state: &EvalState) -> Result<Value, EvalError> {
    if let Some(value) = state.locals.get(name).or_else(|| state.globals.get(name)) {
        return Ok(value.clone());
    }
    Builtin::from_str(name)
        .map(Value::Builtin)
        .map_err(|_| EvalError::UndefinedVariable {
            name: name.to_string(),
        })
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (op, left, right) {
        (BinaryOp::Equal, left, right) => Ok(Value::Bool(left == right)),
        (BinaryOp::NotEqual, left, right) => Ok(Value::Bool(left != right)),
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.saturating_add(b))),
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.saturating_sub(b))),
        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.saturating_mul(b))),
        (BinaryOp::Less, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a < b)),
        (BinaryOp::Greater, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a > b)),
        (_, Value::Int(_), other) | (_, other, _) => Err(EvalError::TypeMismatch {
            expected: "int",
            found: other.type_name(),
        }),
    }
}

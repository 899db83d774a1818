// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::Span;

/// The parser is error tolerant, so this travels next to a (partial) tree in
/// [`crate::ParsedChunk`] rather than replacing it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("parse error at {span}: {message}")]
#[diagnostic(code(r3bl_repl::lang::parse))]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("check error at {span}: {message}")]
#[diagnostic(code(r3bl_repl::lang::check))]
pub struct CheckError {
    pub message: String,
    pub span: Span,
}

impl CheckError {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EvalError {
    /// Presented differently from every other failure, see
    /// [`crate::CommandError::render_for_display`].
    #[error("assertion failed: {message}")]
    #[diagnostic(code(r3bl_repl::lang::assertion_failed))]
    AssertionFailed { message: String },

    #[error("undefined variable: {name}")]
    #[diagnostic(code(r3bl_repl::lang::undefined_variable))]
    UndefinedVariable { name: String },

    #[error("not callable: {name}")]
    #[diagnostic(code(r3bl_repl::lang::not_callable))]
    NotCallable { name: String },

    #[error("type mismatch: expected {expected}, found {found}")]
    #[diagnostic(code(r3bl_repl::lang::type_mismatch))]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("no such property: {name}")]
    #[diagnostic(code(r3bl_repl::lang::no_such_property))]
    NoSuchProperty { name: String },

    #[error("i/o error: {0}")]
    #[diagnostic(code(r3bl_repl::lang::io))]
    Io(#[from] std::io::Error),

    #[error("evaluation was cancelled")]
    #[diagnostic(code(r3bl_repl::lang::cancelled))]
    Cancelled,

    #[error("process error: {message}")]
    #[diagnostic(code(r3bl_repl::lang::process))]
    Process { message: String },
}

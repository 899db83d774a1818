// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;

use crate::{CheckError, EvalError, EvalState, Node, ParseError, Token, Value};

/// Result of [`Evaluator::parse`]. There is always a tree, even for broken input, since
/// completion has to work on half typed lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChunk {
    pub source: String,
    pub root: Node,
    pub error: Option<ParseError>,
}

/// Variable names that the static checker may assume are bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeInfo {
    pub local_names: BTreeSet<String>,
    pub global_names: BTreeSet<String>,
}

/// Non fatal findings of a successful check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckData {
    pub warnings: Vec<String>,
}

/// The command language, as seen by the editor.
///
/// - [`Self::tokenize`] and [`Self::parse`] must be pure and fast: they are called on
///   every word motion, highlight, and completion request.
/// - [`Self::evaluate`] runs on a blocking thread. It must observe `cancel` at its own
///   suspension points and return [`EvalError::Cancelled`] promptly once it fires.
pub trait Evaluator: Send + Sync + 'static {
    fn tokenize(&self, source: &str) -> Vec<Token>;

    fn parse(&self, source: &str) -> ParsedChunk;

    /// # Errors
    ///
    /// Returns the first static error found.
    fn type_check(
        &self,
        chunk: &ParsedChunk,
        scope: &ScopeInfo,
    ) -> Result<CheckData, CheckError>;

    /// # Errors
    ///
    /// Returns the runtime error, or [`EvalError::Cancelled`].
    fn evaluate(
        &self,
        root: &Node,
        state: &mut EvalState,
        cancel: &CancellationToken,
    ) -> Result<Value, EvalError>;
}

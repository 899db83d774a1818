// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tokio_util::sync::CancellationToken;

use super::{checker, interpreter, parser, tokenizer};
use crate::{CheckData, CheckError, EvalError, EvalState, Evaluator, Node, ParsedChunk,
            ScopeInfo, Token, Value};

/// The bundled command language. Stateless: everything that lives across submissions
/// is kept in [`EvalState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEvaluator;

impl Evaluator for ReferenceEvaluator {
    fn tokenize(&self, source: &str) -> Vec<Token> { tokenizer::tokenize(source) }

    fn parse(&self, source: &str) -> ParsedChunk { parser::parse(source) }

    fn type_check(
        &self,
        chunk: &ParsedChunk,
        scope: &ScopeInfo,
    ) -> Result<CheckData, CheckError> {
        checker::check(chunk, scope)
    }

    fn evaluate(
        &self,
        root: &Node,
        state: &mut EvalState,
        cancel: &CancellationToken,
    ) -> Result<Value, EvalError> {
        interpreter::interpret(root, state, cancel)
    }
}

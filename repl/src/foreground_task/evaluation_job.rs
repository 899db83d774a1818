// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{EvalState, Evaluator, ForegroundJob, Node, StdMutex, TaskResult};

/// A job that evaluates an already parsed and checked tree. The state stays locked for
/// the whole evaluation, the editor only ever `try_lock`s it meanwhile.
#[must_use]
pub fn evaluation_job(
    evaluator: Arc<dyn Evaluator>,
    eval_state: Arc<StdMutex<EvalState>>,
    root: Node,
) -> ForegroundJob {
    Box::new(move |cancel_token: &CancellationToken| {
        evaluate_locked(evaluator.as_ref(), &eval_state, &root, cancel_token)
    })
}

#[allow(clippy::unwrap_in_result)]
fn evaluate_locked(
    evaluator: &dyn Evaluator,
    eval_state: &StdMutex<EvalState>,
    root: &Node,
    cancel_token: &CancellationToken,
) -> TaskResult {
    let mut state = eval_state.lock().unwrap();
    Ok(evaluator.evaluate(root, &mut state, cancel_token)?)
}

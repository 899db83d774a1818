// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{CheckError, EvalState, Evaluator, ParseError, StdMutex};

/// What a background check of a quiescent buffer found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookaheadDiagnostics {
    Clean { warnings: Vec<String> },
    Parse(ParseError),
    Check(CheckError),
    /// A command is evaluating and holds the state. Nothing was checked.
    StateBusy,
}

/// Parse and check `line` against the current scope. Never blocks on the state lock.
#[must_use]
pub fn diagnose(
    evaluator: &dyn Evaluator,
    eval_state: &StdMutex<EvalState>,
    line: &str,
) -> LookaheadDiagnostics {
    let chunk = evaluator.parse(line);
    if let Some(error) = chunk.error {
        return LookaheadDiagnostics::Parse(error);
    }
    let Ok(state) = eval_state.try_lock() else {
        return LookaheadDiagnostics::StateBusy;
    };
    let scope_info = state.scope_info();
    drop(state);

    match evaluator.type_check(&chunk, &scope_info) {
        Ok(data) => LookaheadDiagnostics::Clean {
            warnings: data.warnings,
        },
        Err(error) => LookaheadDiagnostics::Check(error),
    }
}

/// Log diagnostics for every buffer the idle detector forwards. The display is never
/// touched, the loop owns it.
pub fn spawn_diagnostics_consumer(
    evaluator: Arc<dyn Evaluator>,
    eval_state: Arc<StdMutex<EvalState>>,
    mut lookahead_receiver: mpsc::Receiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = lookahead_receiver.recv().await {
            match diagnose(evaluator.as_ref(), &eval_state, &line) {
                LookaheadDiagnostics::Clean { warnings } if warnings.is_empty() => {
                    tracing::trace!(message = "lookahead: clean", %line);
                }
                LookaheadDiagnostics::Clean { warnings } => {
                    tracing::debug!(message = "lookahead: warnings", %line, ?warnings);
                }
                LookaheadDiagnostics::Parse(error) => {
                    tracing::debug!(message = "lookahead: parse error", %line, %error);
                }
                LookaheadDiagnostics::Check(error) => {
                    tracing::debug!(message = "lookahead: check error", %line, %error);
                }
                LookaheadDiagnostics::StateBusy => {
                    tracing::trace!(message = "lookahead: state busy", %line);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OutputDevice, ReferenceEvaluator};

    fn new_state() -> StdMutex<EvalState> {
        let (output_device, _) = OutputDevice::new_mock();
        StdMutex::new(EvalState::new(output_device))
    }

    #[test]
    fn test_diagnose() {
        let state = new_state();
        let evaluator = ReferenceEvaluator;

        assert_eq!(
            diagnose(&evaluator, &state, "print 1"),
            LookaheadDiagnostics::Clean { warnings: vec![] }
        );
        assert!(matches!(
            diagnose(&evaluator, &state, "print \"oops"),
            LookaheadDiagnostics::Parse(_)
        ));
        assert!(matches!(
            diagnose(&evaluator, &state, "break"),
            LookaheadDiagnostics::Check(_)
        ));
    }

    #[test]
    fn test_diagnose_never_waits_for_a_running_command() {
        let state = new_state();
        let _guard = state.lock().unwrap();
        assert_eq!(
            diagnose(&ReferenceEvaluator, &state, "print 1"),
            LookaheadDiagnostics::StateBusy
        );
    }

    #[tokio::test]
    async fn test_consumer_drains_until_closed() {
        let (sender, receiver) = mpsc::channel(2);
        let handle = spawn_diagnostics_consumer(
            Arc::new(ReferenceEvaluator),
            Arc::new(new_state()),
            receiver,
        );
        sender.send("print 1".into()).await.unwrap();
        drop(sender);
        handle.await.unwrap();
    }
}

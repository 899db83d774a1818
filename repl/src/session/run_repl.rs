// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The loop. One `select!` waits on four sources and reacts to whichever is ready:
//!
//! | Branch             | Enabled when                 | Effect                              |
//! | ------------------ | ---------------------------- | ----------------------------------- |
//! | OS signal          | signal channel open          | terminate, interrupt, or log resize |
//! | task completion    | always (pending while idle)  | print the outcome, re-prompt        |
//! | raw input unit     | input channel open           | decode, apply the action            |
//! | escape timeout     | the decoder holds a prefix   | resolve the lone `ESC`              |
//!
//! Nothing in a branch blocks for long, so Ctrl+C is noticed while a command runs.

use tokio::sync::{mpsc, watch};

use crate::{CommonResult, ExitReason, InputDevice, ReaderEvent, ReplError, Session,
            SignalEvent, spawn_diagnostics_consumer, spawn_idle_detector};

/// Buffers in flight from the idle detector to the diagnostics consumer.
const LOOKAHEAD_CHANNEL_CAPACITY: usize = 1;

/// Run `session` until end of input, a terminating signal, or a fatal I/O error. Any
/// running command is cancelled before this returns. Raw mode is the caller's business,
/// see [`crate::RawModeGuard`].
///
/// # Errors
///
/// Returns a [`ReplError`] if the terminal can't be read or written.
pub async fn run_repl(
    session: &mut Session,
    mut input_device: InputDevice,
) -> CommonResult<ExitReason> {
    session.reader_control = input_device.control.clone();

    let (buffer_sender, buffer_receiver) = watch::channel(String::new());
    let (lookahead_sender, lookahead_receiver) = mpsc::channel(LOOKAHEAD_CHANNEL_CAPACITY);
    let idle_detector =
        spawn_idle_detector(session.config.idle_window, buffer_receiver, lookahead_sender);
    let diagnostics_consumer = spawn_diagnostics_consumer(
        session.evaluator.clone(),
        session.eval_state.clone(),
        lookahead_receiver,
    );

    let result = drive(session, &mut input_device, &buffer_sender).await;

    idle_detector.abort();
    diagnostics_consumer.abort();
    session.coordinator.cancel();
    session.reader_control = None;

    match &result {
        Ok(reason) => tracing::info!(message = "session ended", %reason),
        Err(error) => tracing::warn!(message = "session failed", %error),
    }
    result.map_err(miette::Report::from)
}

async fn drive(
    session: &mut Session,
    input_device: &mut InputDevice,
    buffer_sender: &watch::Sender<String>,
) -> Result<ExitReason, ReplError> {
    let mut is_input_open = true;
    let mut is_signal_open = true;

    session.render_frame()?;

    loop {
        if !is_input_open && !session.coordinator.is_running() {
            session.finish_line()?;
            return Ok(ExitReason::EndOfInput);
        }

        let is_escape_pending = session.key_decoder.is_pending();
        let escape_timeout = session.config.escape_timeout;

        tokio::select! {
            biased;

            signal = input_device.signal_receiver.recv(), if is_signal_open => {
                match signal {
                    None => is_signal_open = false,
                    Some(SignalEvent::Terminate) => {
                        tracing::info!(message = "terminating signal");
                        session.finish_line()?;
                        return Ok(ExitReason::Terminated);
                    }
                    Some(SignalEvent::Interrupt) => {
                        session.apply_action(crate::Action::Stop, false)?;
                    }
                    Some(SignalEvent::Resize) => {
                        tracing::info!(
                            message = "terminal resized, keeping the width measured at start",
                            width = session.terminal_width
                        );
                    }
                }
            }

            outcome = session.coordinator.wait_for_completion() => {
                session.handle_outcome(outcome)?;
            }

            event = input_device.receiver.recv(), if is_input_open => {
                match event {
                    Some(ReaderEvent::Unit(unit)) => {
                        let has_lookahead = input_device.has_lookahead();
                        let action = session.key_decoder.feed(unit);
                        if let Some(reason) = session.apply_action(action, has_lookahead)? {
                            return Ok(reason);
                        }
                    }
                    Some(ReaderEvent::Error(kind)) => {
                        return Err(ReplError::Input(kind.into()));
                    }
                    // The reader thread only ever stops after sending Eof or Error.
                    None if input_device.control.is_some() => {
                        return Err(ReplError::Closed);
                    }
                    Some(ReaderEvent::Eof) | None => {
                        tracing::debug!(message = "end of input");
                        is_input_open = false;
                        if let Some(reason) = flush_pending_escape(session)? {
                            return Ok(reason);
                        }
                    }
                }
            }

            () = tokio::time::sleep(escape_timeout), if is_escape_pending => {
                if let Some(reason) = flush_pending_escape(session)? {
                    return Ok(reason);
                }
            }
        }

        buffer_sender.send_if_modified(|published| {
            let text = session.line_buffer.text();
            if *published == text {
                false
            } else {
                *published = text;
                true
            }
        });
    }
}

fn flush_pending_escape(session: &mut Session) -> Result<Option<ExitReason>, ReplError> {
    match session.key_decoder.flush_pending() {
        Some(action) => session.apply_action(action, false),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use tokio_util::sync::CancellationToken;

    use crate::{CheckData, CheckError, EvalError, EvalState, Evaluator, Node,
                OutputDevice, ParsedChunk, ReferenceEvaluator, ScopeInfo, SessionConfig,
                StdMutex, StdoutMock, Token, Value};

    /// Holds the state for `hold` on every evaluation and never looks at the token.
    struct StubbornEvaluator {
        hold: Duration,
    }

    impl Evaluator for StubbornEvaluator {
        fn tokenize(&self, source: &str) -> Vec<Token> { ReferenceEvaluator.tokenize(source) }

        fn parse(&self, source: &str) -> ParsedChunk { ReferenceEvaluator.parse(source) }

        fn type_check(
            &self,
            chunk: &ParsedChunk,
            scope: &ScopeInfo,
        ) -> Result<CheckData, CheckError> {
            ReferenceEvaluator.type_check(chunk, scope)
        }

        fn evaluate(
            &self,
            _root: &Node,
            _state: &mut EvalState,
            _cancel: &CancellationToken,
        ) -> Result<Value, EvalError> {
            std::thread::sleep(self.hold);
            Ok(Value::Nil)
        }
    }

    fn new_session(config: SessionConfig) -> (Session, StdoutMock) {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let eval_state = Arc::new(StdMutex::new(EvalState::new(output_device.clone())));
        let session = Session::try_new(
            config,
            Arc::new(ReferenceEvaluator),
            eval_state,
            output_device,
        )
        .unwrap();
        (session, stdout_mock)
    }

    #[tokio::test]
    async fn test_submit_then_end_of_input() {
        let (mut session, stdout_mock) = new_session(SessionConfig::default());
        let input_device = InputDevice::new_mock("print 1\r\x04");

        let reason = run_repl(&mut session, input_device).await.unwrap();
        assert_eq!(reason, ExitReason::EndOfInput);

        let output = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert!(output.contains("> print 1"));
        assert!(output.contains("1\r\n"));
        assert_eq!(session.history.entries, vec!["print 1".to_string()]);
    }

    #[tokio::test]
    async fn test_ctrl_d_on_empty_line_exits() {
        let (mut session, _) = new_session(SessionConfig::default());
        let (input_device, sender) = InputDevice::new_mock_pair(16);
        assert!(sender.send_text("\x04").await);

        let reason = run_repl(&mut session, input_device).await.unwrap();
        assert_eq!(reason, ExitReason::EndOfInput);
        drop(sender);
    }

    #[tokio::test]
    async fn test_terminate_signal() {
        let (mut session, _) = new_session(SessionConfig::default());
        let (input_device, sender) = InputDevice::new_mock_pair(16);
        assert!(sender.send_signal(SignalEvent::Terminate));

        let reason = run_repl(&mut session, input_device).await.unwrap();
        assert_eq!(reason, ExitReason::Terminated);
    }

    #[tokio::test]
    async fn test_read_error_is_fatal() {
        let (mut session, _) = new_session(SessionConfig::default());
        let (input_device, sender) = InputDevice::new_mock_pair(16);
        assert!(
            sender
                .send_event(ReaderEvent::Error(std::io::ErrorKind::BrokenPipe))
                .await
        );

        let report = run_repl(&mut session, input_device).await.unwrap_err();
        assert_eq!(report.to_string(), "Failed to read from the terminal");
    }

    #[tokio::test]
    async fn test_lone_escape_resolves_after_timeout() {
        let (mut session, _) = new_session(SessionConfig {
            escape_timeout: Duration::from_millis(5),
            auto_close_brackets: false,
            ..Default::default()
        });
        let (input_device, sender) = InputDevice::new_mock_pair(16);
        let handle = tokio::spawn(async move {
            let reason = run_repl(&mut session, input_device).await;
            (session, reason)
        });

        assert!(sender.send_text("ab\x1b").await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Had the escape still been pending, `[D` would read as cursor left.
        assert!(sender.send_text("[D").await);
        drop(sender);

        let (session, reason) = handle.await.unwrap();
        assert_eq!(reason.unwrap(), ExitReason::EndOfInput);
        assert_eq!(session.line_buffer.text(), "ab[D");
    }

    #[tokio::test]
    async fn test_check_error_is_reported_and_nothing_runs() {
        let (mut session, stdout_mock) = new_session(SessionConfig::default());
        let input_device = InputDevice::new_mock("break\r");

        run_repl(&mut session, input_device).await.unwrap();

        let output = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert!(output.contains("error: check error"));
        assert!(output.contains("`break` outside of a for loop"));
        assert!(!session.coordinator.is_running());
        assert_eq!(session.history.current(), "break");
    }

    #[tokio::test]
    async fn test_submit_while_cancelled_command_holds_state_does_not_block() {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let eval_state = Arc::new(StdMutex::new(EvalState::new(output_device.clone())));
        let mut session = Session::try_new(
            SessionConfig::default(),
            Arc::new(StubbornEvaluator {
                hold: Duration::from_secs(2),
            }),
            eval_state,
            output_device,
        )
        .unwrap();
        let (input_device, sender) = InputDevice::new_mock_pair(16);
        let handle = tokio::spawn(async move {
            let reason = run_repl(&mut session, input_device).await;
            (session, reason)
        });

        assert!(sender.send_text("print 1\r").await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Back to idle at once, but the job keeps the state until it returns.
        assert!(sender.send_text("\x03").await);
        assert!(sender.send_text("print 2\r").await);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(sender.send_signal(SignalEvent::Terminate));
        let (session, reason) = handle.await.unwrap();
        assert_eq!(reason.unwrap(), ExitReason::Terminated);

        let output = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert!(output.contains("the previous command is still finishing"));
        assert_eq!(session.line_buffer.text(), "print 2");
        assert_eq!(session.history.entries, ["print 1"]);
    }
}

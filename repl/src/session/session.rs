// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use crate::{Action, CommandError, CommonResult, DEFAULT_TERMINAL_WIDTH, EvalState,
            Evaluator, ForegroundTaskCoordinator, History, KeyDecoder, LineBuffer,
            OutputDevice, ReaderControl, RenderRequest, RenderSnapshot, ReplError,
            ScopeProvider as _, SessionConfig, StdMutex, TaskOutcome, Token,
            TrustedLaunch, apply_suggestions, evaluation_job, find_suggestions,
            parse_trusted_command, query_terminal_width, render, render_clear_screen,
            render_finish_line};

/// Why [`crate::run_repl`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ExitReason {
    /// Ctrl+D on an empty line, or stdin closed.
    EndOfInput,
    /// `SIGTERM` or `SIGHUP`.
    Terminated,
}

/// All editor state, in one place. Only the loop mutates it.
#[allow(missing_debug_implementations)]
pub struct Session {
    pub config: SessionConfig,
    pub evaluator: Arc<dyn Evaluator>,
    pub eval_state: Arc<StdMutex<EvalState>>,
    pub output_device: OutputDevice,
    /// Measured once. Resize signals don't change it.
    pub terminal_width: usize,
    pub line_buffer: LineBuffer,
    pub history: History,
    pub key_decoder: KeyDecoder,
    pub render_snapshot: RenderSnapshot,
    /// Shown strings of the suggestion strip.
    pub suggestions: Vec<String>,
    pub coordinator: ForegroundTaskCoordinator,
    /// Handed to trusted commands so they can pause the input reader.
    pub reader_control: Option<Arc<ReaderControl>>,
}

impl Session {
    /// Validate `config` and set up an idle session. The granted permissions are added to
    /// `eval_state`, where completion and trusted commands look them up.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ConfigurationError`] if `config` is invalid.
    #[allow(clippy::unwrap_in_result)]
    pub fn try_new(
        config: SessionConfig,
        evaluator: Arc<dyn Evaluator>,
        eval_state: Arc<StdMutex<EvalState>>,
        output_device: OutputDevice,
    ) -> CommonResult<Self> {
        config.try_validate()?;

        let terminal_width = config.terminal_width.unwrap_or_else(|| {
            let queried = if output_device.is_mock {
                None
            } else {
                query_terminal_width()
            };
            queried.unwrap_or_else(|| {
                tracing::warn!(
                    message = "terminal width unknown, using default",
                    width = DEFAULT_TERMINAL_WIDTH
                );
                DEFAULT_TERMINAL_WIDTH
            })
        });

        eval_state
            .lock()
            .unwrap()
            .permissions
            .extend(config.permissions.iter().cloned());

        tracing::debug!(message = "session created", terminal_width, prompt = %config.prompt);

        Ok(Self {
            history: History::new(config.history_limit),
            config,
            evaluator,
            eval_state,
            output_device,
            terminal_width,
            line_buffer: LineBuffer::new(),
            key_decoder: KeyDecoder::new(),
            render_snapshot: RenderSnapshot::default(),
            suggestions: vec![],
            coordinator: ForegroundTaskCoordinator::new(),
            reader_control: None,
        })
    }

    fn tokens(&self) -> Vec<Token> { self.evaluator.tokenize(&self.line_buffer.text()) }

    /// Redraw the prompt, the input and the suggestion strip.
    ///
    /// # Errors
    ///
    /// Returns [`ReplError::Output`] if the terminal write fails.
    pub fn render_frame(&mut self) -> Result<(), ReplError> {
        let tokens = self.tokens();
        let request = RenderRequest {
            prompt: &self.config.prompt,
            input: &self.line_buffer.input,
            cursor_offset: self.line_buffer.cursor_offset(),
            suggestions: &self.suggestions,
            width: self.terminal_width,
            tokens: &tokens,
        };
        let (bytes, snapshot) = render(&request, &self.render_snapshot);
        self.render_snapshot = snapshot;
        self.output_device
            .write_bytes(&bytes)
            .map_err(ReplError::Output)
    }

    /// Leave the current frame behind: the next output starts on a fresh line.
    ///
    /// # Errors
    ///
    /// Returns [`ReplError::Output`] if the terminal write fails.
    pub fn finish_line(&mut self) -> Result<(), ReplError> {
        let bytes = render_finish_line(&self.render_snapshot);
        self.render_snapshot = RenderSnapshot::default();
        self.suggestions.clear();
        self.output_device
            .write_bytes(&bytes)
            .map_err(ReplError::Output)
    }

    fn print_lines(&self, text: &str) -> Result<(), ReplError> {
        self.output_device
            .write_lines(&format!("{text}\n"))
            .map_err(ReplError::Output)
    }

    fn report_error(&mut self, error: &CommandError) -> Result<(), ReplError> {
        tracing::debug!(message = "command error", %error);
        if let Some(text) = error.render_for_display() {
            self.print_lines(&text)?;
        }
        self.render_frame()
    }

    /// Apply one decoded action. `has_lookahead` is `true` when more input was already
    /// queued when the unit behind `action` arrived, i.e. during a paste.
    ///
    /// While a command runs only [`Action::Stop`] does anything.
    ///
    /// # Errors
    ///
    /// Returns [`ReplError::Output`] if the terminal write fails.
    pub fn apply_action(
        &mut self,
        action: Action,
        has_lookahead: bool,
    ) -> Result<Option<ExitReason>, ReplError> {
        if self.coordinator.is_running() {
            match action {
                Action::Stop => self.interrupt()?,
                Action::NoAction => {}
                _ => tracing::trace!(message = "ignored while a command runs", %action),
            }
            return Ok(None);
        }

        match action {
            Action::NoAction => return Ok(None),
            Action::Insert(ch) => {
                let auto_close = self.config.auto_close_brackets && !has_lookahead;
                self.line_buffer.insert(ch, auto_close);
            }
            Action::Left => self.line_buffer.move_left(),
            Action::Right => self.line_buffer.move_right(),
            Action::Home => self.line_buffer.move_home(),
            Action::End => self.line_buffer.move_end(),
            Action::Up => {
                let recalled = self.history.step(-1);
                self.line_buffer.set_text(&recalled);
            }
            Action::Down => {
                let recalled = self.history.step(1);
                self.line_buffer.set_text(&recalled);
            }
            Action::DeleteBackward => self.line_buffer.delete_backward(),
            Action::DeleteForward => self.line_buffer.delete_forward(),
            Action::DeleteWordBackward => {
                let tokens = self.tokens();
                self.line_buffer.delete_word_backward(&tokens);
            }
            Action::DeleteWordForward => {
                let tokens = self.tokens();
                self.line_buffer.delete_word_forward(&tokens);
            }
            Action::WordLeft => {
                let tokens = self.tokens();
                self.line_buffer.move_word_backward(&tokens);
            }
            Action::WordRight => {
                let tokens = self.tokens();
                self.line_buffer.move_word_forward(&tokens);
            }
            Action::KillToStart => self.line_buffer.delete_to_start(),
            Action::Escape => {}
            Action::SuggestComplete => {
                self.complete();
                self.render_frame()?;
                return Ok(None);
            }
            Action::Enter => {
                self.submit()?;
                return Ok(None);
            }
            Action::Stop => {
                self.interrupt()?;
                return Ok(None);
            }
            Action::EndOfInput if self.line_buffer.is_empty() => {
                self.finish_line()?;
                return Ok(Some(ExitReason::EndOfInput));
            }
            Action::EndOfInput => self.line_buffer.delete_forward(),
            Action::ClearScreen => {
                self.output_device
                    .write_bytes(&render_clear_screen())
                    .map_err(ReplError::Output)?;
                self.render_snapshot = RenderSnapshot::default();
            }
        }

        self.suggestions.clear();
        self.render_frame()?;
        Ok(None)
    }

    /// Tab: ask the suggestion engine, then fill in or list the candidates. Skipped if
    /// the state is locked by a command that is still winding down.
    fn complete(&mut self) {
        let text = self.line_buffer.text();
        let chunk = self.evaluator.parse(&text);
        let Ok(state) = self.eval_state.try_lock() else {
            tracing::debug!(message = "completion skipped, state busy");
            return;
        };
        let found = find_suggestions(
            &*state,
            state.filesystem.as_ref(),
            &chunk,
            self.line_buffer.cursor_offset(),
        );
        drop(state);
        tracing::debug!(message = "completion", %text, candidates = found.len());
        self.suggestions = apply_suggestions(&mut self.line_buffer, &found);
    }

    /// Enter: record the line, then start it as a trusted command or as an evaluation.
    /// Parse and check errors are reported right here, and nothing is started.
    ///
    /// The state is only `try_lock`ed: a cancelled command may still hold it. The line is
    /// then kept in the buffer and the user is told to retry.
    fn submit(&mut self) -> Result<(), ReplError> {
        let line = self.line_buffer.text();

        if line.trim().is_empty() {
            self.finish_line()?;
            self.line_buffer.reset();
            self.history.reset_index();
            return self.render_frame();
        }

        let Ok(state) = self.eval_state.try_lock() else {
            tracing::info!(message = "submit deferred, state busy", %line);
            self.finish_line()?;
            return self.report_error(&CommandError::StateBusy);
        };
        let permissions = state.command_permissions();
        let scope_info = state.scope_info();
        drop(state);

        self.finish_line()?;
        self.line_buffer.reset();
        self.history.append(&line);
        tracing::info!(message = "submitted", %line);

        if let Some(words) = parse_trusted_command(&line, &self.config.trusted_commands) {
            let launch = TrustedLaunch {
                words,
                permissions,
                output_device: self.output_device.clone(),
                reader_control: self.reader_control.clone(),
            };
            self.coordinator.start(line, launch.into_job());
            return Ok(());
        }

        let chunk = self.evaluator.parse(&line);
        if let Some(error) = chunk.error {
            return self.report_error(&CommandError::Parse(error));
        }
        match self.evaluator.type_check(&chunk, &scope_info) {
            Ok(data) => {
                for warning in data.warnings {
                    tracing::debug!(message = "check warning", %warning);
                }
            }
            Err(error) => return self.report_error(&CommandError::Check(error)),
        }

        let job = evaluation_job(
            self.evaluator.clone(),
            self.eval_state.clone(),
            chunk.root,
        );
        self.coordinator.start(line, job);
        Ok(())
    }

    /// Ctrl+C: cancel the running command, or abandon the line being edited.
    fn interrupt(&mut self) -> Result<(), ReplError> {
        if self.coordinator.cancel() {
            self.output_device
                .write_bytes(b"^C\r\n")
                .map_err(ReplError::Output)?;
        } else {
            self.output_device
                .write_bytes(b"^C")
                .map_err(ReplError::Output)?;
            self.finish_line()?;
            self.line_buffer.reset();
            self.history.reset_index();
        }
        self.render_snapshot = RenderSnapshot::default();
        self.suggestions.clear();
        self.render_frame()
    }

    /// Print what a finished command produced, then a fresh prompt.
    ///
    /// # Errors
    ///
    /// Returns [`ReplError::Output`] if the terminal write fails.
    pub fn handle_outcome(&mut self, outcome: TaskOutcome) -> Result<(), ReplError> {
        match &outcome.result {
            Ok(value) if value.is_nil() => {}
            Ok(value) => self.print_lines(&value.to_string())?,
            Err(error) => {
                tracing::debug!(message = "command failed", command = %outcome.command, %error);
                if let Some(text) = error.render_for_display() {
                    self.print_lines(&text)?;
                }
            }
        }
        self.render_snapshot = RenderSnapshot::default();
        self.render_frame()
    }
}

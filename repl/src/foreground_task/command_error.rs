// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crossterm::style::Stylize;

use crate::{CheckError, EvalError, ParseError};

/// A trusted external command that isn't covered by any granted permission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("permission denied: `{command_line}` is not granted")]
#[diagnostic(
    code(r3bl_repl::permission_denied),
    help("Grant it at startup, e.g. `--grant \"{command_line}\"`")
)]
pub struct PermissionError {
    pub command_line: String,
}

/// Everything that can go wrong with one submitted line. None of these end the session.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CommandError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(EvalError),

    #[error("command was cancelled")]
    #[diagnostic(code(r3bl_repl::cancelled))]
    Cancelled,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Permission(#[from] PermissionError),

    /// A cancelled command hasn't released the evaluation state yet.
    #[error("the previous command is still finishing, press Enter to try again")]
    #[diagnostic(code(r3bl_repl::state_busy))]
    StateBusy,
}

impl From<EvalError> for CommandError {
    fn from(error: EvalError) -> Self {
        match error {
            EvalError::Cancelled => Self::Cancelled,
            other => Self::Eval(other),
        }
    }
}

impl CommandError {
    /// Text to print below the prompt. Assertion failures read differently from every
    /// other error. A cancellation prints nothing.
    #[must_use]
    pub fn render_for_display(&self) -> Option<String> {
        match self {
            Self::Cancelled => None,
            Self::Eval(EvalError::AssertionFailed { message }) => Some(format!(
                "{} {}",
                "✗ assertion failed:".yellow().bold(),
                message
            )),
            other => Some(format!("{} {other}", "error:".red().bold())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn plain(error: &CommandError) -> Option<String> {
        error
            .render_for_display()
            .map(|it| strip_ansi_escapes::strip_str(&it))
    }

    #[test]
    fn test_cancelled_eval_becomes_cancelled_command() {
        assert!(matches!(
            CommandError::from(EvalError::Cancelled),
            CommandError::Cancelled
        ));
        assert_eq!(plain(&CommandError::Cancelled), None);
    }

    #[test]
    fn test_assertion_failure_is_presented_differently() {
        let assertion = CommandError::from(EvalError::AssertionFailed {
            message: "1 != 2".into(),
        });
        let generic = CommandError::from(EvalError::UndefinedVariable { name: "x".into() });

        pretty_assertions::assert_eq!(
            plain(&assertion).unwrap(),
            "✗ assertion failed: 1 != 2"
        );
        pretty_assertions::assert_eq!(
            plain(&generic).unwrap(),
            "error: undefined variable: x"
        );
    }

    #[test]
    fn test_state_busy_asks_for_a_retry() {
        pretty_assertions::assert_eq!(
            plain(&CommandError::StateBusy).unwrap(),
            "error: the previous command is still finishing, press Enter to try again"
        );
    }

    #[test]
    fn test_static_errors_render_with_span() {
        let error = CommandError::from(CheckError::new("oops", Span::new(1, 3)));
        assert!(plain(&error).unwrap().contains("oops"));

        let error = CommandError::from(PermissionError {
            command_line: "git push".into(),
        });
        pretty_assertions::assert_eq!(
            plain(&error).unwrap(),
            "error: permission denied: `git push` is not granted"
        );
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! For more information on error types, see:
//!
//! 1. [Article](https://developerlife.com/2024/06/10/rust-miette-error-handling/)
//! 2. [Video](https://youtu.be/TmLF7vI8lKk)
//!
//! There are two tiers of errors in this crate:
//!
//! 1. Session fatal: [`ReplError`] (terminal I/O failed, input closed) and
//!    [`ConfigurationError`] (rejected before the loop ever starts). These propagate out of
//!    [`crate::run_repl`] and [`crate::Session::try_new`] as [`CommonResult`].
//! 2. Per command: [`crate::CommandError`]. These are recovered at the loop boundary and
//!    rendered below the prompt. They never end the session.

/// Type alias to make it easy to work with [`miette::Result`] and [`miette::Report`].
///
/// - It is basically `miette::Result<T, miette::Report>`.
/// - Works hand in hand w/ [`ReplError`], [`ConfigurationError`] and any other type of
///   error that implements [`miette::Diagnostic`].
pub type CommonResult<T> = miette::Result<T>;

/// Errors that end the session. The loop tries to restore the terminal mode before any of
/// these escape [`crate::run_repl`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ReplError {
    #[error("Failed to read from the terminal")]
    #[diagnostic(
        code(r3bl_repl::input),
        help("The terminal device went away or returned an unrecoverable read error")
    )]
    Input(#[source] std::io::Error),

    #[error("Failed to write to the terminal")]
    #[diagnostic(code(r3bl_repl::output))]
    Output(#[source] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("The input channel was closed before the session ended")]
    #[diagnostic(
        code(r3bl_repl::closed),
        help("The input reader thread exited, most likely because stdin was closed")
    )]
    Closed,
}

impl From<std::io::Error> for ReplError {
    fn from(error: std::io::Error) -> Self { Self::Output(error) }
}

/// Invalid [`crate::SessionConfig`]. Only ever produced by
/// [`crate::SessionConfig::try_validate`] and [`crate::CommandPermission::try_parse`],
/// which both run before the loop starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum ConfigurationError {
    #[error("Terminal width must be greater than zero")]
    #[diagnostic(code(r3bl_repl::config::zero_terminal_width))]
    ZeroTerminalWidth,

    #[error("Idle quiescence window must be greater than zero")]
    #[diagnostic(code(r3bl_repl::config::zero_idle_window))]
    ZeroIdleWindow,

    #[error("Input channel capacity must be greater than zero")]
    #[diagnostic(code(r3bl_repl::config::zero_channel_capacity))]
    ZeroChannelCapacity,

    #[error("History limit must be greater than zero")]
    #[diagnostic(code(r3bl_repl::config::zero_history_limit))]
    ZeroHistoryLimit,

    #[error("Invalid trusted command name: {name:?}")]
    #[diagnostic(
        code(r3bl_repl::config::invalid_trusted_command_name),
        help("A trusted command is a single word, e.g. `git`, with no spaces or slashes")
    )]
    InvalidTrustedCommandName { name: String },

    #[error("Invalid command permission: {spec:?}")]
    #[diagnostic(
        code(r3bl_repl::config::invalid_permission),
        help("A permission is a command name followed by subcommands, e.g. `git log`")
    )]
    InvalidPermission { spec: String },
}

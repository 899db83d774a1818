// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::Duration;

use crate::{CommandPermission, ConfigurationError, DEFAULT_IDLE_WINDOW,
            DEFAULT_INPUT_CHANNEL_CAPACITY, HISTORY_SIZE_MAX, ok};

pub const DEFAULT_PROMPT: &str = "> ";

/// Used when the terminal can't be asked, e.g. output is redirected.
pub const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// How long a lone `ESC` waits for the rest of a sequence before it counts as the Escape
/// key.
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// May carry ANSI styling, only its visible width is used for layout.
    pub prompt: String,
    /// `None` queries the terminal once, at session start.
    pub terminal_width: Option<usize>,
    pub idle_window: Duration,
    pub escape_timeout: Duration,
    pub channel_capacity: usize,
    pub history_limit: usize,
    pub auto_close_brackets: bool,
    /// First words that spawn an OS process instead of being evaluated.
    pub trusted_commands: Vec<String>,
    pub permissions: Vec<CommandPermission>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.into(),
            terminal_width: None,
            idle_window: DEFAULT_IDLE_WINDOW,
            escape_timeout: DEFAULT_ESCAPE_TIMEOUT,
            channel_capacity: DEFAULT_INPUT_CHANNEL_CAPACITY,
            history_limit: HISTORY_SIZE_MAX,
            auto_close_brackets: true,
            trusted_commands: vec![],
            permissions: vec![],
        }
    }
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn try_validate(&self) -> Result<(), ConfigurationError> {
        if self.terminal_width == Some(0) {
            return Err(ConfigurationError::ZeroTerminalWidth);
        }
        if self.idle_window.is_zero() {
            return Err(ConfigurationError::ZeroIdleWindow);
        }
        if self.channel_capacity == 0 {
            return Err(ConfigurationError::ZeroChannelCapacity);
        }
        if self.history_limit == 0 {
            return Err(ConfigurationError::ZeroHistoryLimit);
        }
        if let Some(name) = self
            .trusted_commands
            .iter()
            .find(|it| !is_valid_trusted_name(it))
        {
            return Err(ConfigurationError::InvalidTrustedCommandName { name: name.clone() });
        }
        ok!()
    }
}

fn is_valid_trusted_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control() || ch == '/')
}

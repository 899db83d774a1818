// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::IntoDiagnostic;

use crate::{CommonResult, ok};

/// Puts the terminal in raw mode for as long as it is alive. Dropping it restores cooked
/// mode, on every exit path, including early returns via `?` and unwinding panics.
#[derive(Debug)]
pub struct RawModeGuard {
    is_enabled: bool,
}

impl RawModeGuard {
    /// Enable raw mode. When `is_mock` is `true` the terminal is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal mode can't be changed.
    pub fn try_new(is_mock: bool) -> CommonResult<Self> {
        if is_mock {
            return ok!(Self { is_enabled: false });
        }
        crossterm::terminal::enable_raw_mode().into_diagnostic()?;
        tracing::debug!(message = "raw mode enabled");
        ok!(Self { is_enabled: true })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.is_enabled {
            let _unused = crossterm::terminal::disable_raw_mode();
            tracing::debug!(message = "raw mode disabled");
        }
    }
}

/// Temporarily hand the terminal back in cooked mode, e.g. to a spawned process.
///
/// # Errors
///
/// Returns an error if the terminal mode can't be changed.
pub fn suspend_raw_mode(is_mock: bool) -> std::io::Result<()> {
    if is_mock {
        return ok!();
    }
    crossterm::terminal::disable_raw_mode()
}

/// Undo [`suspend_raw_mode`].
///
/// # Errors
///
/// Returns an error if the terminal mode can't be changed.
pub fn resume_raw_mode(is_mock: bool) -> std::io::Result<()> {
    if is_mock {
        return ok!();
    }
    crossterm::terminal::enable_raw_mode()
}

/// Query the terminal width in columns. `None` when stdout is not a terminal.
#[must_use]
pub fn query_terminal_width() -> Option<usize> {
    crossterm::terminal::size()
        .ok()
        .map(|(columns, _rows)| usize::from(columns))
        .filter(|it| *it > 0)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_mock_guard_does_not_touch_terminal() {
        let guard = RawModeGuard::try_new(true).unwrap();
        assert!(!guard.is_enabled);
        drop(guard);
        assert!(suspend_raw_mode(true).is_ok());
        assert!(resume_raw_mode(true).is_ok());
    }
}

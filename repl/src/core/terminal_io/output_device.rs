// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use crate::{SafeRawTerminal, SendRawTerminal, StdMutex, StdoutMock};

/// This struct represents an output device that can be used to write to the terminal.
/// - It is safe to clone. Every clone shares the same lock, which is what keeps the
///   editor, the `print` builtin, and a spawned trusted command from interleaving their
///   writes.
/// - To write to it, see [`Self::lock()`] or the [`crate::lock_output_device_as_mut`]
///   macro.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct OutputDevice {
    pub resource: SafeRawTerminal,
    /// When `true` nothing in the crate touches the real terminal mode (raw mode, the input
    /// reader pause handshake, spawning processes on the controlling tty).
    pub is_mock: bool,
}

impl Default for OutputDevice {
    fn default() -> Self { Self::new_stdout() }
}

impl OutputDevice {
    #[must_use]
    pub fn new_stdout() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(std::io::stdout())),
            is_mock: false,
        }
    }

    /// Returns the device and a handle to the captured bytes.
    #[must_use]
    pub fn new_mock() -> (Self, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let this = Self {
            resource: Arc::new(StdMutex::new(stdout_mock.clone())),
            is_mock: true,
        };
        (this, stdout_mock)
    }
}

impl OutputDevice {
    /// Locks the output device for writing.
    ///
    /// # Panics
    ///
    /// This method will panic if the mutex is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, SendRawTerminal> {
        self.resource.lock().unwrap()
    }

    /// Writes `text` in one locked write and flushes. Bare `\n` line endings are turned
    /// into `\r\n` since output processing is disabled in raw mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    #[allow(clippy::unwrap_in_result)]
    pub fn write_lines(&self, text: &str) -> std::io::Result<()> {
        let it = to_raw_mode_line_endings(text);
        let mut_ref = &mut *self.lock();
        mut_ref.write_all(it.as_bytes())?;
        mut_ref.flush()
    }

    /// Writes pre-rendered bytes in one locked write and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    #[allow(clippy::unwrap_in_result)]
    pub fn write_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut_ref = &mut *self.lock();
        mut_ref.write_all(bytes)?;
        mut_ref.flush()
    }
}

#[must_use]
pub fn to_raw_mode_line_endings(text: &str) -> String {
    let mut acc = String::with_capacity(text.len() + 8);
    let mut prev = '\0';
    for ch in text.chars() {
        if ch == '\n' && prev != '\r' {
            acc.push('\r');
        }
        acc.push(ch);
        prev = ch;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LockedOutputDevice, lock_output_device_as_mut};

    #[test]
    fn test_stdout_output_device_is_not_mock() {
        let device = OutputDevice::new_stdout();
        assert!(!device.is_mock);
    }

    #[test]
    fn test_mock_output_device_captures_writes() {
        let (device, stdout_mock) = OutputDevice::new_mock();
        {
            let mut_ref: LockedOutputDevice<'_> = lock_output_device_as_mut!(device);
            mut_ref.write_all(b"Hello, world!").unwrap();
        }
        assert!(device.is_mock);
        pretty_assertions::assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string(),
            "Hello, world!"
        );
    }

    #[test]
    fn test_write_lines_uses_crlf() {
        let (device, stdout_mock) = OutputDevice::new_mock();
        device.write_lines("a\nb\r\nc").unwrap();
        pretty_assertions::assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string(),
            "a\r\nb\r\nc"
        );
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{CommonResult, ReaderControl, ReaderEvent, SignalEvent};

/// Default bound of the raw unit queue.
pub const DEFAULT_INPUT_CHANNEL_CAPACITY: usize = 4_096;

/// The receiving side of the input reader: raw units in read order, plus OS signals.
///
/// - [`Self::try_new_stdin`] starts the `mio` reader thread on the real stdin.
/// - [`Self::new_mock`] and [`Self::new_mock_pair`] are for tests, there is no thread and
///   no terminal involved.
#[allow(missing_debug_implementations)]
pub struct InputDevice {
    pub receiver: mpsc::Receiver<ReaderEvent>,
    pub signal_receiver: mpsc::UnboundedReceiver<SignalEvent>,
    /// `None` for mocks. Shared with trusted command launches, which pause the reader.
    pub control: Option<Arc<ReaderControl>>,
}

impl InputDevice {
    /// # Errors
    ///
    /// Returns an error if the reader thread can't be set up.
    #[cfg(unix)]
    pub fn try_new_stdin(channel_capacity: usize) -> CommonResult<Self> {
        let channels = crate::spawn_reader_thread(channel_capacity)?;
        crate::ok!(Self {
            receiver: channels.receiver,
            signal_receiver: channels.signal_receiver,
            control: Some(Arc::new(channels.control)),
        })
    }

    /// # Errors
    ///
    /// Always, the reader thread needs a Unix file descriptor to poll.
    #[cfg(not(unix))]
    pub fn try_new_stdin(_channel_capacity: usize) -> CommonResult<Self> {
        miette::bail!("The input reader is only supported on Unix platforms")
    }

    /// All of `text` is queued up front, then the channel closes, which the loop treats
    /// as end of input.
    #[must_use]
    pub fn new_mock(text: &str) -> Self {
        let units: Vec<char> = text.chars().collect();
        let (sender, receiver) = mpsc::channel(units.len().max(1));
        for unit in units {
            let _unused = sender.try_send(ReaderEvent::Unit(unit));
        }
        let (_, signal_receiver) = mpsc::unbounded_channel();
        Self {
            receiver,
            signal_receiver,
            control: None,
        }
    }

    /// A device fed incrementally through the returned [`MockInputSender`]. Dropping the
    /// sender closes the device.
    #[must_use]
    pub fn new_mock_pair(channel_capacity: usize) -> (Self, MockInputSender) {
        let (unit_sender, receiver) = mpsc::channel(channel_capacity.max(1));
        let (signal_sender, signal_receiver) = mpsc::unbounded_channel();
        let this = Self {
            receiver,
            signal_receiver,
            control: None,
        };
        (this, MockInputSender {
            unit_sender,
            signal_sender,
        })
    }

    /// `true` if more units are already queued, e.g. the rest of a paste.
    #[must_use]
    pub fn has_lookahead(&self) -> bool { !self.receiver.is_empty() }
}

impl Drop for InputDevice {
    fn drop(&mut self) {
        if let Some(control) = self.control.as_ref() {
            control.shutdown();
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockInputSender {
    pub unit_sender: mpsc::Sender<ReaderEvent>,
    pub signal_sender: mpsc::UnboundedSender<SignalEvent>,
}

impl MockInputSender {
    /// Returns `false` once the device is gone.
    pub async fn send_text(&self, text: &str) -> bool {
        for unit in text.chars() {
            if self.unit_sender.send(ReaderEvent::Unit(unit)).await.is_err() {
                return false;
            }
        }
        true
    }

    pub async fn send_event(&self, event: ReaderEvent) -> bool {
        self.unit_sender.send(event).await.is_ok()
    }

    pub fn send_signal(&self, signal: SignalEvent) -> bool {
        self.signal_sender.send(signal).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_delivers_units_in_order_then_closes() {
        let mut device = InputDevice::new_mock("aé\r");
        assert!(device.has_lookahead());
        assert_eq!(device.receiver.recv().await, Some(ReaderEvent::Unit('a')));
        assert_eq!(device.receiver.recv().await, Some(ReaderEvent::Unit('é')));
        assert_eq!(device.receiver.recv().await, Some(ReaderEvent::Unit('\r')));
        assert!(!device.has_lookahead());
        assert_eq!(device.receiver.recv().await, None);
        assert_eq!(device.signal_receiver.recv().await, None);
    }

    #[tokio::test]
    async fn test_mock_pair() {
        let (mut device, sender) = InputDevice::new_mock_pair(8);
        assert!(sender.send_text("hi").await);
        assert!(sender.send_signal(SignalEvent::Resize));
        assert_eq!(device.receiver.recv().await, Some(ReaderEvent::Unit('h')));
        assert_eq!(device.receiver.recv().await, Some(ReaderEvent::Unit('i')));
        assert_eq!(device.signal_receiver.recv().await, Some(SignalEvent::Resize));

        drop(sender);
        assert_eq!(device.receiver.recv().await, None);
    }
}

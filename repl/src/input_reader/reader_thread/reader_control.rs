// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io,
          sync::mpsc::{Receiver, RecvTimeoutError, Sender},
          time::Duration};

use mio::Waker;

use crate::StdMutex;

/// How long a caller waits for the reader thread to confirm a request.
pub const READER_ACK_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ReaderCommand {
    /// Stop watching stdin, so that a child process can read it.
    Pause,
    Resume,
    Shutdown,
}

/// Handle for steering the reader thread from other threads.
///
/// A request is queued, then the [`Waker`] interrupts the thread's blocking poll, and the
/// caller waits until the thread echoes the command back. After [`Self::pause`] returns
/// `Ok`, the reader no longer consumes stdin.
#[derive(Debug)]
pub struct ReaderControl {
    pub waker: Waker,
    pub command_sender: Sender<ReaderCommand>,
    pub ack_receiver: StdMutex<Receiver<ReaderCommand>>,
}

impl ReaderControl {
    /// # Errors
    ///
    /// Returns an error if the reader thread is gone or doesn't confirm in time.
    pub fn pause(&self) -> io::Result<()> { self.request(ReaderCommand::Pause) }

    /// # Errors
    ///
    /// Returns an error if the reader thread is gone or doesn't confirm in time.
    pub fn resume(&self) -> io::Result<()> { self.request(ReaderCommand::Resume) }

    /// Ask the thread to exit without waiting for it.
    pub fn shutdown(&self) {
        if self.command_sender.send(ReaderCommand::Shutdown).is_ok() {
            let _unused = self.waker.wake();
        }
    }

    #[allow(clippy::unwrap_in_result)]
    fn request(&self, command: ReaderCommand) -> io::Result<()> {
        let gone = || io::Error::new(io::ErrorKind::BrokenPipe, "input reader thread exited");

        // Requests are serialized, so acks can't be mixed up between callers.
        let ack_receiver = self.ack_receiver.lock().unwrap();
        self.command_sender.send(command).map_err(|_| gone())?;
        self.waker.wake()?;

        match ack_receiver.recv_timeout(READER_ACK_TIMEOUT) {
            Ok(ack) if ack == command => Ok(()),
            Ok(ack) => Err(io::Error::other(format!(
                "input reader acknowledged {ack} instead of {command}"
            ))),
            Err(RecvTimeoutError::Timeout) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("input reader did not acknowledge {command}"),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(gone()),
        }
    }
}

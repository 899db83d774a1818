// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The body of the `repl-input-reader` thread.
//!
//! ```text
//! ┌──────────── mio::Poll ─────────────┐
//! │ Token(0) stdin      ──▶ read, decode UTF-8 ──▶ mpsc::Sender<ReaderEvent> (bounded)
//! │ Token(1) signals    ──▶ SignalEvent        ──▶ mpsc::UnboundedSender<SignalEvent>
//! │ Token(2) waker      ──▶ ReaderCommand      ──▶ ack
//! └────────────────────────────────────┘
//! ```
//!
//! The bounded queue is the only backpressure: when the loop falls behind, the thread
//! blocks in `blocking_send` and the kernel buffers the rest of stdin.

use std::{io::{ErrorKind, Read as _},
          os::fd::AsRawFd as _,
          sync::mpsc::{Receiver, Sender, TryRecvError}};

use miette::Diagnostic;
use mio::{Events, Interest, Poll, Token, Waker, unix::SourceFd};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGWINCH};
use signal_hook_mio::v1_0::Signals;
use tokio::sync::mpsc;

use super::{ReaderCommand, ReaderControl, SourceKindReady, SourceRegistry};
use crate::{CommonResult, Continuation, ReaderEvent, SignalEvent, StdMutex,
            Utf8UnitDecoder, ok};

/// Matches the capacity of std's stdin buffer. Reads at least this large bypass that
/// buffer, so bytes never sit in it unseen by the poll.
pub const STDIN_READ_BUFFER_SIZE: usize = 8_192;

const EVENTS_CAPACITY: usize = 8;

pub const READER_THREAD_NAME: &str = "repl-input-reader";

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ReaderSetupError {
    #[error("Failed to create mio::Poll")]
    #[diagnostic(
        code(r3bl_repl::input_reader::poll_creation),
        help("This usually means the system ran out of file descriptors")
    )]
    PollCreation(#[source] std::io::Error),

    #[error("Failed to create mio::Waker")]
    #[diagnostic(code(r3bl_repl::input_reader::waker_creation))]
    WakerCreation(#[source] std::io::Error),

    #[error("Failed to register stdin with mio")]
    #[diagnostic(
        code(r3bl_repl::input_reader::stdin_registration),
        help("Ensure stdin is a terminal or a pipe")
    )]
    StdinRegistration(#[source] std::io::Error),

    #[error("Failed to install signal handlers")]
    #[diagnostic(code(r3bl_repl::input_reader::signal_creation))]
    SignalCreation(#[source] std::io::Error),

    #[error("Failed to register signals with mio")]
    #[diagnostic(code(r3bl_repl::input_reader::signal_registration))]
    SignalRegistration(#[source] std::io::Error),

    #[error("Failed to spawn the input reader thread")]
    #[diagnostic(code(r3bl_repl::input_reader::thread_spawn))]
    ThreadSpawn(#[source] std::io::Error),
}

#[allow(missing_debug_implementations)]
pub struct ReaderWorker {
    pub poll_handle: Poll,
    pub ready_events_buffer: Events,
    pub sources: SourceRegistry,
    pub stdin_unparsed_byte_buffer: Box<[u8; STDIN_READ_BUFFER_SIZE]>,
    pub utf8_decoder: Utf8UnitDecoder,
    pub unit_sender: mpsc::Sender<ReaderEvent>,
    pub signal_sender: mpsc::UnboundedSender<SignalEvent>,
    pub command_receiver: Receiver<ReaderCommand>,
    pub ack_sender: Sender<ReaderCommand>,
    pub is_paused: bool,
}

/// Receiving ends handed to [`crate::InputDevice`].
#[allow(missing_debug_implementations)]
pub struct ReaderChannels {
    pub receiver: mpsc::Receiver<ReaderEvent>,
    pub signal_receiver: mpsc::UnboundedReceiver<SignalEvent>,
    pub control: ReaderControl,
}

/// Register stdin and the signals with a fresh poll, then start the thread. Setup runs on
/// the caller's thread so that failures are reported before the session starts.
///
/// # Errors
///
/// Returns a [`ReaderSetupError`] if any OS resource can't be created.
pub fn spawn_reader_thread(channel_capacity: usize) -> CommonResult<ReaderChannels> {
    let poll_handle = Poll::new().map_err(ReaderSetupError::PollCreation)?;
    let mio_registry = poll_handle.registry();

    let waker = Waker::new(mio_registry, SourceKindReady::ControlWaker.to_token())
        .map_err(ReaderSetupError::WakerCreation)?;

    let stdin = std::io::stdin();
    mio_registry
        .register(
            &mut SourceFd(&stdin.as_raw_fd()),
            SourceKindReady::Stdin.to_token(),
            Interest::READABLE,
        )
        .map_err(ReaderSetupError::StdinRegistration)?;

    let mut signals = Signals::new([SIGWINCH, SIGINT, SIGTERM, SIGHUP])
        .map_err(ReaderSetupError::SignalCreation)?;
    mio_registry
        .register(
            &mut signals,
            SourceKindReady::Signals.to_token(),
            Interest::READABLE,
        )
        .map_err(ReaderSetupError::SignalRegistration)?;

    let (unit_sender, receiver) = mpsc::channel(channel_capacity.max(1));
    let (signal_sender, signal_receiver) = mpsc::unbounded_channel();
    let (command_sender, command_receiver) = std::sync::mpsc::channel();
    let (ack_sender, ack_receiver) = std::sync::mpsc::channel();

    let worker = ReaderWorker {
        poll_handle,
        ready_events_buffer: Events::with_capacity(EVENTS_CAPACITY),
        sources: SourceRegistry { stdin, signals },
        stdin_unparsed_byte_buffer: Box::new([0u8; STDIN_READ_BUFFER_SIZE]),
        utf8_decoder: Utf8UnitDecoder::new(),
        unit_sender,
        signal_sender,
        command_receiver,
        ack_sender,
        is_paused: false,
    };

    std::thread::Builder::new()
        .name(READER_THREAD_NAME.into())
        .spawn(move || worker.run())
        .map_err(ReaderSetupError::ThreadSpawn)?;

    tracing::debug!(message = "input reader thread started", channel_capacity);

    ok!(ReaderChannels {
        receiver,
        signal_receiver,
        control: ReaderControl {
            waker,
            command_sender,
            ack_receiver: StdMutex::new(ack_receiver),
        },
    })
}

impl ReaderWorker {
    pub fn run(mut self) {
        loop {
            if let Err(err) = self.poll_handle.poll(&mut self.ready_events_buffer, None) {
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                tracing::warn!(message = "input reader: poll failed", error = ?err);
                let _unused = self.unit_sender.blocking_send(ReaderEvent::Error(err.kind()));
                break;
            }

            let tokens: Vec<Token> = self
                .ready_events_buffer
                .iter()
                .map(mio::event::Event::token)
                .collect();

            for token in tokens {
                if self.dispatch(token) == Continuation::Stop {
                    tracing::debug!(message = "input reader thread exiting");
                    return;
                }
            }
        }
    }

    pub fn dispatch(&mut self, token: Token) -> Continuation {
        match SourceKindReady::from_token(token) {
            SourceKindReady::Stdin => self.consume_stdin_input(),
            SourceKindReady::Signals => self.consume_pending_signals(),
            SourceKindReady::ControlWaker => self.consume_control_commands(),
            SourceKindReady::Unknown => {
                tracing::warn!(message = "input reader: unknown token", ?token);
                Continuation::Continue
            }
        }
    }

    fn consume_stdin_input(&mut self) -> Continuation {
        // Readiness collected before a pause landed in the same batch.
        if self.is_paused {
            return Continuation::Continue;
        }

        match self
            .sources
            .stdin
            .read(self.stdin_unparsed_byte_buffer.as_mut_slice())
        {
            Ok(0) => {
                tracing::debug!(message = "input reader: EOF");
                let mut acc = vec![];
                self.utf8_decoder.finish(&mut acc);
                if self.send_units(acc) == Continuation::Stop {
                    return Continuation::Stop;
                }
                let _unused = self.unit_sender.blocking_send(ReaderEvent::Eof);
                Continuation::Stop
            }
            Ok(n) => {
                tracing::trace!(message = "input reader: read bytes", bytes_read = n);
                let mut acc = Vec::with_capacity(n);
                self.utf8_decoder
                    .decode_into(&self.stdin_unparsed_byte_buffer[..n], &mut acc);
                self.send_units(acc)
            }
            Err(ref err)
                if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) =>
            {
                Continuation::Continue
            }
            Err(err) => {
                tracing::warn!(message = "input reader: read error", error = ?err);
                let _unused = self.unit_sender.blocking_send(ReaderEvent::Error(err.kind()));
                Continuation::Stop
            }
        }
    }

    fn send_units(&self, units: Vec<char>) -> Continuation {
        for unit in units {
            if self.unit_sender.blocking_send(ReaderEvent::Unit(unit)).is_err() {
                tracing::debug!(message = "input reader: receiver dropped");
                return Continuation::Stop;
            }
        }
        Continuation::Continue
    }

    fn consume_pending_signals(&mut self) -> Continuation {
        let pending: Vec<i32> = self.sources.signals.pending().collect();
        for signal in pending {
            let event = match signal {
                SIGWINCH => SignalEvent::Resize,
                SIGINT => SignalEvent::Interrupt,
                SIGTERM | SIGHUP => SignalEvent::Terminate,
                _ => continue,
            };
            tracing::debug!(message = "input reader: signal", signal, %event);
            if self.signal_sender.send(event).is_err() {
                return Continuation::Stop;
            }
        }
        Continuation::Continue
    }

    fn consume_control_commands(&mut self) -> Continuation {
        loop {
            let command = match self.command_receiver.try_recv() {
                Ok(it) => it,
                Err(TryRecvError::Empty) => return Continuation::Continue,
                Err(TryRecvError::Disconnected) => return Continuation::Stop,
            };

            tracing::debug!(message = "input reader: command", %command);
            let stdin_fd = self.sources.stdin.as_raw_fd();
            let registry = self.poll_handle.registry();
            match command {
                ReaderCommand::Pause if !self.is_paused => {
                    if let Err(err) = registry.deregister(&mut SourceFd(&stdin_fd)) {
                        tracing::warn!(message = "input reader: deregister failed", error = ?err);
                    }
                    self.is_paused = true;
                }
                ReaderCommand::Resume if self.is_paused => {
                    if let Err(err) = registry.register(
                        &mut SourceFd(&stdin_fd),
                        SourceKindReady::Stdin.to_token(),
                        Interest::READABLE,
                    ) {
                        tracing::warn!(message = "input reader: register failed", error = ?err);
                    }
                    self.is_paused = false;
                }
                ReaderCommand::Pause | ReaderCommand::Resume => {}
                ReaderCommand::Shutdown => {
                    let _unused = self.ack_sender.send(command);
                    return Continuation::Stop;
                }
            }
            let _unused = self.ack_sender.send(command);
        }
    }
}

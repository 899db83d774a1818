// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// What the input reader delivers to the loop, in the order the units were read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderEvent {
    /// One decoded character of raw input.
    Unit(char),
    /// Stdin reached end of file. Nothing else follows.
    Eof,
    /// Unrecoverable read failure. Nothing else follows.
    Error(std::io::ErrorKind),
}

/// OS signals, translated into something the loop can `select!` on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SignalEvent {
    /// `SIGWINCH`.
    Resize,
    /// `SIGINT`. Raw mode turns Ctrl+C into a plain unit, so this only arrives via
    /// `kill`, or while a trusted command has the terminal in cooked mode.
    Interrupt,
    /// `SIGTERM` or `SIGHUP`.
    Terminate,
}

/// Whether the reader thread should keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Continue,
    Stop,
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words repl mio

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

//! # r3bl_repl
//!
//! An async, interactive line editing REPL engine for raw mode terminals.
//!
//! The pieces, leaves first:
//!
//! | Module              | What it does                                                        |
//! | ------------------- | ------------------------------------------------------------------- |
//! | [`editor`]          | [`KeyDecoder`], [`LineBuffer`], [`History`], and the [`render`]er.   |
//! | [`suggestions`]     | AST driven completions via [`find_suggestions`].                    |
//! | [`input_reader`]    | Dedicated [`mio`] thread that reads stdin and OS signals.           |
//! | [`foreground_task`] | Runs one submitted command off the main loop, cancellably.          |
//! | [`session`]         | The [`Session`] value and the [`run_repl`] loop that owns it all.    |
//! | [`lang`]            | The [`Evaluator`] boundary plus a small bundled reference language. |
//!
//! Data flows in one direction:
//!
//! ```text
//! stdin ──▶ input reader thread ──▶ bounded channel ──▶ run_repl ──▶ KeyDecoder ──▶ Action
//!                                                          │
//!            ┌────────────────────────────────────────────┤
//!            ▼                 ▼                 ▼         ▼
//!       LineBuffer          History        suggestions   ForegroundTaskCoordinator
//!            │                                             │ (spawn_blocking)
//!            └──────────────▶ render ──▶ OutputDevice ◀────┘
//! ```
//!
//! Only the loop mutates editor state. The foreground task hands its result back over a
//! `oneshot` channel, exactly once, and a pending result is simply dropped when the task
//! is cancelled.
//!
//! [`mio`]: mio

// Enforce strict error handling in production library code only. Tests are allowed to use
// .unwrap() freely.
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach modules.
pub mod core;
pub mod editor;
pub mod foreground_task;
pub mod input_reader;
pub mod lang;
pub mod session;
pub mod suggestions;

// Re-export.
#[allow(ambiguous_glob_reexports)]
pub use core::*;
pub use editor::*;
pub use foreground_task::*;
pub use input_reader::*;
pub use lang::*;
pub use session::*;
pub use suggestions::*;

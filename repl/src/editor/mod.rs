// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The editing state machine: raw units become [`Action`]s, actions mutate the
//! [`LineBuffer`] and [`History`], and [`render`] turns the result into terminal bytes.
//! Nothing in here does I/O; the session loop owns all of it.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod history;
pub mod key_decoder;
pub mod line_buffer;
pub mod render;

// Re-export.
pub use history::*;
pub use key_decoder::*;
pub use line_buffer::*;
pub use render::*;

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod reader_control;
#[cfg(unix)]
pub mod reader_worker;
#[cfg(unix)]
pub mod sources;

// Re-export.
pub use reader_control::*;
#[cfg(unix)]
pub use reader_worker::*;
#[cfg(unix)]
pub use sources::*;

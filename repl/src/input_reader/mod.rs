// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Everything that runs concurrently with the loop to feed it: the stdin reader thread
//! (with OS signals on the same poll), the idle detector, and the background diagnostics
//! consumer it feeds.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod diagnostics_consumer;
pub mod idle_detector;
pub mod input_device;
pub mod reader_events;
pub mod reader_thread;
pub mod utf8_unit_decoder;

// Re-export.
pub use diagnostics_consumer::*;
pub use idle_detector::*;
pub use input_device::*;
pub use reader_events::*;
pub use reader_thread::*;
pub use utf8_unit_decoder::*;

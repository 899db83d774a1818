// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod output_device;
pub mod raw_mode;
pub mod terminal_io_type_aliases;

// Re-export.
pub use output_device::*;
pub use raw_mode::*;
pub use terminal_io_type_aliases::*;

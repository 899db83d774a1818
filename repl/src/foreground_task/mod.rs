// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Runs one submitted line off the loop, either as an evaluation or as a trusted
//! external command, and hands the outcome back exactly once.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod command_error;
pub mod coordinator;
pub mod evaluation_job;
pub mod trusted_command;

// Re-export.
pub use command_error::*;
pub use coordinator::*;
pub use evaluation_job::*;
pub use trusted_command::*;

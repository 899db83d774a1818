// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod run_repl;
pub mod session;
pub mod session_config;

// Re-export.
pub use run_repl::*;
pub use session::*;
pub use session_config::*;

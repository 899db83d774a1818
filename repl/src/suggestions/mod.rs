// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Completion: find the syntax node under the cursor, pick candidates from the live
//! [`crate::ScopeProvider`] and [`crate::FilesystemProvider`], and apply them to the
//! [`crate::LineBuffer`].

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod find_suggestions;
pub mod node_at_cursor;
pub mod suggestion;

// Re-export.
pub use find_suggestions::*;
pub use node_at_cursor::*;
pub use suggestion::*;

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The boundary between the editor and the command language it hosts.
//!
//! The editor only ever talks to an [`Evaluator`] trait object. It tokenizes for word
//! motion and highlighting, parses for completions, type checks before a command is
//! started, and evaluates inside the foreground task. [`ReferenceEvaluator`] is a small
//! bundled language that implements the trait so that the engine can be driven end to
//! end.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod eval_state;
pub mod evaluator_api;
pub mod keyword;
pub mod lang_errors;
pub mod providers;
pub mod reference;
pub mod syntax_tree;
pub mod token;
pub mod value;

// Re-export.
pub use eval_state::*;
pub use evaluator_api::*;
pub use keyword::*;
pub use lang_errors::*;
pub use providers::*;
pub use reference::*;
pub use syntax_tree::*;
pub use token::*;
pub use value::*;

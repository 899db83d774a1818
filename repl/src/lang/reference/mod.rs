// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A small command language bundled with the engine. See [`ReferenceEvaluator`].

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Attach sources.
pub mod checker;
pub mod interpreter;
pub mod parser;
pub mod reference_evaluator;
pub mod tokenizer;

// Re-export.
pub use checker::{DEFAULT_LOOP_BINDING, check};
pub use interpreter::interpret;
pub use parser::parse;
pub use reference_evaluator::*;
pub use tokenizer::{is_ident_char, is_ident_start, tokenize, tokenize_chars};

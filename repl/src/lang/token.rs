// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum TokenKind {
    Identifier,
    Keyword,
    LocalVariable,
    GlobalVariable,
    PatternName,
    StringLiteral,
    IntLiteral,
    PathLiteral,
    UrlLiteral,
    HostLiteral,
    SchemeLiteral,
    Operator,
    Delimiter,
    /// Statement separator: a line feed or `;`.
    Separator,
    Unknown,
}

/// A lexical token. Spans are half open character offsets into the source, so they line
/// up 1:1 with [`crate::LineBuffer`] positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    /// Tokens that word motion can land on. Separators are skipped.
    #[must_use]
    pub fn is_word(&self) -> bool { self.kind != TokenKind::Separator }
}

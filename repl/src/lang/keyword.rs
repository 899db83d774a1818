// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum::IntoEnumIterator as _;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    For,
    In,
    Walk,
    If,
    Else,
    Init,
    Break,
    Continue,
    Prune,
    Return,
    True,
    False,
    Nil,
}

impl Keyword {
    /// Keywords that can start a statement anywhere a statement can start.
    pub const STATEMENT: [Keyword; 5] = [
        Keyword::For,
        Keyword::Walk,
        Keyword::If,
        Keyword::Init,
        Keyword::Return,
    ];

    /// Only valid in the body of a `for` statement.
    pub const LOOP: [Keyword; 2] = [Keyword::Break, Keyword::Continue];

    /// Only valid in the body of a `walk` statement.
    pub const WALK: [Keyword; 1] = [Keyword::Prune];

    /// Can start an expression in any position.
    pub const EXPRESSION: [Keyword; 3] = [Keyword::True, Keyword::False, Keyword::Nil];

    #[must_use]
    pub fn is_keyword(text: &str) -> bool { Keyword::iter().any(|it| it.as_ref() == text) }
}

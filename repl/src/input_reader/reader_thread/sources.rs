// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use mio::Token;
use signal_hook_mio::v1_0::Signals;
use std::io::Stdin;

/// Everything registered with the reader's [`mio::Poll`], apart from the waker.
#[allow(missing_debug_implementations)]
pub struct SourceRegistry {
    pub stdin: Stdin,
    pub signals: Signals,
}

/// Which source a readiness event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKindReady {
    Stdin,
    Signals,
    /// A [`crate::ReaderControl`] request is waiting.
    ControlWaker,
    Unknown,
}

impl SourceKindReady {
    #[must_use]
    pub const fn to_token(self) -> Token {
        match self {
            Self::Stdin => Token(0),
            Self::Signals => Token(1),
            Self::ControlWaker => Token(2),
            Self::Unknown => Token(usize::MAX),
        }
    }

    #[must_use]
    pub const fn from_token(token: Token) -> Self {
        match token.0 {
            0 => Self::Stdin,
            1 => Self::Signals,
            2 => Self::ControlWaker,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_mapping() {
        for it in [
            SourceKindReady::Stdin,
            SourceKindReady::Signals,
            SourceKindReady::ControlWaker,
        ] {
            assert_eq!(SourceKindReady::from_token(it.to_token()), it);
        }
        assert_eq!(SourceKindReady::from_token(Token(42)), SourceKindReady::Unknown);
    }
}

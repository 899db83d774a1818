// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Turns raw input units into [`Action`]s, one unit at a time.
//!
//! The decoder is an explicit state machine over the pending sequence:
//!
//! ```text
//! Empty ──ESC──▶ PendingEscape ──[──▶ PendingCsi ──final byte──▶ Empty (Action)
//!                      │
//!                      │                   │
//!                      │                   └──too long──▶ DiscardCsi ──final byte──▶ Empty
//!                      ├──O──▶ PendingSs3 ──final byte──▶ Empty (Action)
//!                      └──b/f/d/DEL──▶ Empty (word Action)
//! ```
//!
//! A lone `ESC` can't be told apart from the start of a sequence by looking at it, so
//! the caller resolves it with [`KeyDecoder::flush_pending`] once no more input arrives
//! within the escape timeout.

use smallvec::SmallVec;

use crate::{CARRIAGE_RETURN, CSI_INTRODUCER, CSI_PARAM_SEPARATOR, CSI_TILDE, CTRL_C,
            CTRL_D, CTRL_H, CTRL_L, CTRL_U, CTRL_W, CUB_CURSOR_BACKWARD,
            CUD_CURSOR_DOWN, CUF_CURSOR_FORWARD, CUU_CURSOR_UP, CURSOR_END, CURSOR_HOME,
            DEL, ESC, LINE_FEED, MODIFIER_ALT, MODIFIER_CTRL, SS3_INTRODUCER, TAB};

/// Upper bound on the number of parameter characters buffered for one CSI sequence.
/// Anything longer is garbage and is dropped.
pub const CSI_PARAM_LIMIT: usize = 16;

pub type CsiParams = SmallVec<[char; CSI_PARAM_LIMIT]>;

/// Parameter bytes (`0-9 : ; < = > ?`) and intermediate bytes (space through `/`). Both
/// are buffered until the final byte arrives.
const CSI_PARAM_OR_INTERMEDIATE: std::ops::RangeInclusive<char> = '\x20'..='\x3f';

/// The byte that ends a CSI sequence.
const CSI_FINAL: std::ops::RangeInclusive<char> = '\x40'..='\x7e';

/// A decoded, discrete edit or control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Action {
    /// The unit was consumed but means nothing on its own (yet).
    NoAction,
    Insert(char),
    Left,
    Right,
    Home,
    End,
    Up,
    Down,
    DeleteBackward,
    DeleteForward,
    DeleteWordBackward,
    DeleteWordForward,
    WordLeft,
    WordRight,
    SuggestComplete,
    Enter,
    /// Interrupt (Ctrl+C).
    Stop,
    /// A lone escape key press.
    Escape,
    /// Ctrl+D.
    EndOfInput,
    ClearScreen,
    KillToStart,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    Empty,
    PendingEscape,
    PendingCsi {
        params: CsiParams,
    },
    PendingSs3,
    /// A CSI sequence longer than [`CSI_PARAM_LIMIT`]: swallow it up to its final byte.
    DiscardCsi,
}

#[derive(Debug, Clone, Default)]
pub struct KeyDecoder {
    pub state: DecoderState,
}

impl KeyDecoder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn is_pending(&self) -> bool { self.state != DecoderState::Empty }

    /// Resolve whatever is pending because no further input arrived. Only a lone `ESC`
    /// means something; a truncated CSI or SS3 sequence is dropped.
    pub fn flush_pending(&mut self) -> Option<Action> {
        match std::mem::take(&mut self.state) {
            DecoderState::Empty => None,
            DecoderState::PendingEscape => Some(Action::Escape),
            DecoderState::PendingCsi { .. }
            | DecoderState::PendingSs3
            | DecoderState::DiscardCsi => {
                Some(Action::NoAction)
            }
        }
    }

    pub fn feed(&mut self, unit: char) -> Action {
        let action = match std::mem::take(&mut self.state) {
            DecoderState::Empty => self.feed_empty(unit),
            DecoderState::PendingEscape => self.feed_escape(unit),
            DecoderState::PendingCsi { params } => self.feed_csi(params, unit),
            DecoderState::PendingSs3 => decode_ss3(unit),
            DecoderState::DiscardCsi => self.feed_discard(unit),
        };
        tracing::trace!(message = "decoded", ?unit, %action, pending = self.is_pending());
        action
    }

    fn feed_empty(&mut self, unit: char) -> Action {
        match unit {
            ESC => {
                self.state = DecoderState::PendingEscape;
                Action::NoAction
            }
            CARRIAGE_RETURN | LINE_FEED => Action::Enter,
            DEL | CTRL_H => Action::DeleteBackward,
            TAB => Action::SuggestComplete,
            CTRL_C => Action::Stop,
            CTRL_D => Action::EndOfInput,
            #[cfg(feature = "emacs")]
            crate::CTRL_A => Action::Home,
            #[cfg(feature = "emacs")]
            crate::CTRL_E => Action::End,
            CTRL_L => Action::ClearScreen,
            CTRL_U => Action::KillToStart,
            CTRL_W => Action::DeleteWordBackward,
            _ if unit.is_control() => Action::NoAction,
            _ => Action::Insert(unit),
        }
    }

    fn feed_escape(&mut self, unit: char) -> Action {
        match unit {
            CSI_INTRODUCER => {
                self.state = DecoderState::PendingCsi {
                    params: CsiParams::new(),
                };
                Action::NoAction
            }
            SS3_INTRODUCER => {
                self.state = DecoderState::PendingSs3;
                Action::NoAction
            }
            'b' => Action::WordLeft,
            'f' => Action::WordRight,
            'd' => Action::DeleteWordForward,
            DEL => Action::DeleteWordBackward,
            // The first escape was a lone key press, the second one may start a sequence.
            ESC => {
                self.state = DecoderState::PendingEscape;
                Action::Escape
            }
            _ => Action::NoAction,
        }
    }

    fn feed_csi(&mut self, mut params: CsiParams, unit: char) -> Action {
        if CSI_PARAM_OR_INTERMEDIATE.contains(&unit) {
            if params.len() >= CSI_PARAM_LIMIT {
                self.state = DecoderState::DiscardCsi;
            } else {
                params.push(unit);
                self.state = DecoderState::PendingCsi { params };
            }
            return Action::NoAction;
        }
        if !CSI_FINAL.contains(&unit) {
            // Malformed, e.g. a control character inside the sequence.
            return Action::NoAction;
        }
        // Private markers (`<` mouse reports, `?` device replies) and intermediates are
        // never key presses.
        let is_plain_key = params
            .iter()
            .all(|it| it.is_ascii_digit() || *it == CSI_PARAM_SEPARATOR);
        if is_plain_key {
            decode_csi(&params, unit)
        } else {
            Action::NoAction
        }
    }

    fn feed_discard(&mut self, unit: char) -> Action {
        if CSI_PARAM_OR_INTERMEDIATE.contains(&unit) {
            self.state = DecoderState::DiscardCsi;
        }
        Action::NoAction
    }
}

/// Splits `1;5` into `[1, 5]`. Empty or unparsable parameters are 0.
fn parse_params(params: &[char]) -> SmallVec<[u16; 4]> {
    let text: String = params.iter().collect();
    text.split(CSI_PARAM_SEPARATOR)
        .map(|it| it.parse::<u16>().unwrap_or(0))
        .collect()
}

/// The modifier parameter is `1 + bitmask`; `None` when there is no modifier parameter.
fn has_word_modifier(modifier_param: Option<u16>) -> bool {
    modifier_param.is_some_and(|it| {
        let mask = it.saturating_sub(1);
        mask & (MODIFIER_CTRL | MODIFIER_ALT) != 0
    })
}

fn decode_csi(params: &[char], final_byte: char) -> Action {
    let params = parse_params(params);
    let first = params.first().copied().unwrap_or(0);
    let word_modifier = has_word_modifier(params.get(1).copied());

    match final_byte {
        CUU_CURSOR_UP => Action::Up,
        CUD_CURSOR_DOWN => Action::Down,
        CUF_CURSOR_FORWARD if word_modifier => Action::WordRight,
        CUF_CURSOR_FORWARD => Action::Right,
        CUB_CURSOR_BACKWARD if word_modifier => Action::WordLeft,
        CUB_CURSOR_BACKWARD => Action::Left,
        CURSOR_HOME => Action::Home,
        CURSOR_END => Action::End,
        CSI_TILDE => match first {
            1 | 7 => Action::Home,
            4 | 8 => Action::End,
            3 if word_modifier => Action::DeleteWordForward,
            3 => Action::DeleteForward,
            // Bracketed paste start / end markers, and everything else.
            _ => Action::NoAction,
        },
        _ => Action::NoAction,
    }
}

fn decode_ss3(final_byte: char) -> Action {
    match final_byte {
        CUU_CURSOR_UP => Action::Up,
        CUD_CURSOR_DOWN => Action::Down,
        CUF_CURSOR_FORWARD => Action::Right,
        CUB_CURSOR_BACKWARD => Action::Left,
        CURSOR_HOME => Action::Home,
        CURSOR_END => Action::End,
        _ => Action::NoAction,
    }
}

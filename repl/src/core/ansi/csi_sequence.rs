// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! CSI sequence builder for the handful of terminal control operations the renderer
//! needs. Each variant serializes into its ANSI escape code via [`std::fmt::Display`].

use std::fmt::{Display, Formatter, Result};

use super::constants::{CHA_CURSOR_COLUMN, CSI_START, CUB_CURSOR_BACKWARD,
                       CUD_CURSOR_DOWN, CUF_CURSOR_FORWARD, CUP_CURSOR_POSITION,
                       CUU_CURSOR_UP, ED_ERASE_DISPLAY, EL_ERASE_LINE,
                       RCP_RESTORE_CURSOR, SCP_SAVE_CURSOR};

/// Values for the parameter of [`CsiSequence::EraseDisplay`] and
/// [`CsiSequence::EraseLine`].
pub mod erase_mode {
    pub const TO_END: u16 = 0;
    pub const ALL: u16 = 2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsiSequence {
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBackward(u16),
    /// 1-based column.
    CursorHorizontalAbsolute(u16),
    /// 1-based row and column.
    CursorPosition { row: u16, col: u16 },
    EraseDisplay(u16),
    EraseLine(u16),
    SaveCursor,
    RestoreCursor,
}

impl Display for CsiSequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(CSI_START)?;
        match self {
            CsiSequence::CursorUp(n) => write!(f, "{n}{CUU_CURSOR_UP}"),
            CsiSequence::CursorDown(n) => write!(f, "{n}{CUD_CURSOR_DOWN}"),
            CsiSequence::CursorForward(n) => write!(f, "{n}{CUF_CURSOR_FORWARD}"),
            CsiSequence::CursorBackward(n) => write!(f, "{n}{CUB_CURSOR_BACKWARD}"),
            CsiSequence::CursorHorizontalAbsolute(n) => {
                write!(f, "{n}{CHA_CURSOR_COLUMN}")
            }
            CsiSequence::CursorPosition { row, col } => {
                write!(f, "{row};{col}{CUP_CURSOR_POSITION}")
            }
            CsiSequence::EraseDisplay(n) => write!(f, "{n}{ED_ERASE_DISPLAY}"),
            CsiSequence::EraseLine(n) => write!(f, "{n}{EL_ERASE_LINE}"),
            CsiSequence::SaveCursor => write!(f, "{SCP_SAVE_CURSOR}"),
            CsiSequence::RestoreCursor => write!(f, "{RCP_RESTORE_CURSOR}"),
        }
    }
}

/// Counts in the renderer are `usize`. Anything that doesn't fit a CSI parameter is
/// clamped, the terminal clamps at the screen edge anyway.
#[must_use]
pub fn csi_count(n: usize) -> u16 { u16::try_from(n).unwrap_or(u16::MAX) }

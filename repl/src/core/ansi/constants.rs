// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Bytes of the fixed ANSI / CSI subset that the renderer emits and the key decoder
//! recognizes.

pub const ESC: char = '\x1b';
pub const CSI_START: &str = "\x1b[";
pub const CSI_PARAM_SEPARATOR: char = ';';
pub const CSI_INTRODUCER: char = '[';
pub const SS3_INTRODUCER: char = 'O';

// Cursor movement final bytes.
pub const CUU_CURSOR_UP: char = 'A';
pub const CUD_CURSOR_DOWN: char = 'B';
pub const CUF_CURSOR_FORWARD: char = 'C';
pub const CUB_CURSOR_BACKWARD: char = 'D';
pub const CURSOR_HOME: char = 'H';
pub const CURSOR_END: char = 'F';
pub const CHA_CURSOR_COLUMN: char = 'G';
pub const CUP_CURSOR_POSITION: char = 'H';

// Erase final bytes.
pub const ED_ERASE_DISPLAY: char = 'J';
pub const EL_ERASE_LINE: char = 'K';

// Save / restore cursor (SCO).
pub const SCP_SAVE_CURSOR: char = 's';
pub const RCP_RESTORE_CURSOR: char = 'u';

/// Final byte of "special key" sequences like `ESC [3~` (Delete).
pub const CSI_TILDE: char = '~';

// Raw control units.
pub const CTRL_A: char = '\x01';
pub const CTRL_C: char = '\x03';
pub const CTRL_D: char = '\x04';
pub const CTRL_E: char = '\x05';
pub const CTRL_H: char = '\x08';
pub const TAB: char = '\t';
pub const LINE_FEED: char = '\n';
pub const CTRL_L: char = '\x0c';
pub const CARRIAGE_RETURN: char = '\r';
pub const CTRL_U: char = '\x15';
pub const CTRL_W: char = '\x17';
pub const DEL: char = '\x7f';

// Modifier bits in the second CSI parameter, encoded as `1 + bits`.
pub const MODIFIER_SHIFT: u16 = 1;
pub const MODIFIER_ALT: u16 = 2;
pub const MODIFIER_CTRL: u16 = 4;

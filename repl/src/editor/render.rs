// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Incremental redraw of the prompt, the input, and the suggestion strip.
//!
//! Every frame starts from the first row of the prompt and rewrites the prompt and the
//! input in one write. The previous frame's geometry ([`RenderSnapshot`]) tells the
//! renderer how far up that row is and how many stale lines are left below the new frame.
//!
//! ```text
//! row 0  > for x in [1, 2, 3] { pri      ◀── prompt + input, wrapped at `width`
//! row 1  nt $x }                          ◀── cursor row / col computed from offset
//! row 2  print prune                     ◀── suggestion strip
//! ```

use crossterm::style::{Color, Stylize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{CsiSequence, Token, TokenKind, csi_count, erase_mode};

/// Geometry of the last frame. Only the renderer reads or writes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSnapshot {
    pub previous_input_line_count: usize,
    /// Row of the cursor relative to the prompt's first row.
    pub previous_row_index: usize,
    pub previous_suggestion_line_count: usize,
    pub previous_suggestion_count: usize,
}

impl RenderSnapshot {
    #[must_use]
    pub fn total_line_count(&self) -> usize {
        self.previous_input_line_count + self.previous_suggestion_line_count
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub prompt: &'a str,
    pub input: &'a [char],
    pub cursor_offset: usize,
    /// Shown strings, already in display order.
    pub suggestions: &'a [String],
    pub width: usize,
    /// Tokens of `input`, used for highlighting.
    pub tokens: &'a [Token],
}

/// Visible width of `prompt`, ignoring any ANSI styling it carries.
#[must_use]
pub fn prompt_display_width(prompt: &str) -> usize {
    let stripped = strip_ansi_escapes::strip_str(prompt);
    UnicodeWidthStr::width(stripped.as_str())
}

fn chars_display_width(chars: &[char]) -> usize {
    chars
        .iter()
        .map(|it| UnicodeWidthChar::width(*it).unwrap_or(0))
        .sum()
}

fn token_color(kind: TokenKind) -> Option<Color> {
    match kind {
        TokenKind::Keyword => Some(Color::Magenta),
        TokenKind::StringLiteral => Some(Color::Green),
        TokenKind::IntLiteral => Some(Color::Yellow),
        TokenKind::LocalVariable | TokenKind::GlobalVariable => Some(Color::Cyan),
        TokenKind::PathLiteral
        | TokenKind::UrlLiteral
        | TokenKind::HostLiteral
        | TokenKind::SchemeLiteral => Some(Color::Blue),
        TokenKind::PatternName => Some(Color::DarkYellow),
        TokenKind::Unknown => Some(Color::Red),
        TokenKind::Identifier
        | TokenKind::Operator
        | TokenKind::Delimiter
        | TokenKind::Separator => None,
    }
}

/// `input` with ANSI colors applied per token. Runs of equally colored characters are
/// styled as one segment.
#[must_use]
pub fn highlight(input: &[char], tokens: &[Token]) -> String {
    let mut colors: Vec<Option<Color>> = vec![None; input.len()];
    for token in tokens {
        let span = token.span.clamp_to(input.len());
        for slot in &mut colors[span.start.min(span.end)..span.end] {
            *slot = token_color(token.kind);
        }
    }

    let mut acc = String::with_capacity(input.len() * 2);
    let mut segment_start = 0;
    for index in 1..=input.len() {
        if index < input.len() && colors[index] == colors[segment_start] {
            continue;
        }
        let segment: String = input[segment_start..index].iter().collect();
        match colors[segment_start] {
            Some(color) => acc.push_str(&segment.with(color).to_string()),
            None => acc.push_str(&segment),
        }
        segment_start = index;
    }
    acc
}

/// Produce the bytes for one frame and the snapshot to pass to the next call.
#[must_use]
pub fn render(
    request: &RenderRequest<'_>,
    previous: &RenderSnapshot,
) -> (Vec<u8>, RenderSnapshot) {
    let width = request.width.max(1);
    let prompt_width = prompt_display_width(request.prompt);
    let cursor_offset = request.cursor_offset.min(request.input.len());

    let total = prompt_width + chars_display_width(request.input);
    let cursor_visual = prompt_width + chars_display_width(&request.input[..cursor_offset]);
    let line_count = 1 + total / width;
    let cursor_row = cursor_visual / width;
    let cursor_col = cursor_visual % width;

    let mut acc = String::new();

    // Back to the first row of the prompt.
    if previous.previous_row_index > 0 {
        acc.push_str(&CsiSequence::CursorUp(csi_count(previous.previous_row_index)).to_string());
    }
    acc.push('\r');

    acc.push_str(request.prompt);
    acc.push_str(&highlight(request.input, request.tokens));
    // The terminal defers the wrap after writing into the last column. Force it, so the
    // cursor row matches the arithmetic above.
    if total > 0 && total % width == 0 {
        acc.push_str("\r\n");
    }
    acc.push_str(&CsiSequence::EraseLine(erase_mode::TO_END).to_string());

    let mut suggestion_line_count = 0;
    if !request.suggestions.is_empty() {
        let strip = request.suggestions.join(" ");
        suggestion_line_count = UnicodeWidthStr::width(strip.as_str()).div_ceil(width).max(1);
        acc.push_str("\r\n");
        acc.push_str(&strip);
        acc.push_str(&CsiSequence::EraseLine(erase_mode::TO_END).to_string());
    }

    // Stale lines of a taller previous frame.
    if line_count + suggestion_line_count < previous.total_line_count() {
        acc.push_str(&CsiSequence::EraseDisplay(erase_mode::TO_END).to_string());
    }

    // Back up to the cursor.
    let current_row = (line_count - 1) + suggestion_line_count;
    let rows_up = current_row - cursor_row;
    if rows_up > 0 {
        acc.push_str(&CsiSequence::CursorUp(csi_count(rows_up)).to_string());
    }
    acc.push('\r');
    if cursor_col > 0 {
        acc.push_str(&CsiSequence::CursorForward(csi_count(cursor_col)).to_string());
    }

    let snapshot = RenderSnapshot {
        previous_input_line_count: line_count,
        previous_row_index: cursor_row,
        previous_suggestion_line_count: suggestion_line_count,
        previous_suggestion_count: request.suggestions.len(),
    };
    (acc.into_bytes(), snapshot)
}

/// Move below the last rendered input line and clear whatever was under it (e.g. the
/// suggestion strip). Used when a line is submitted or abandoned, so the next output
/// starts on a fresh line. The caller starts the next frame from a default snapshot.
#[must_use]
pub fn render_finish_line(previous: &RenderSnapshot) -> Vec<u8> {
    let mut acc = String::new();
    let last_input_row = previous.previous_input_line_count.saturating_sub(1);
    let rows_down = last_input_row.saturating_sub(previous.previous_row_index);
    if rows_down > 0 {
        acc.push_str(&CsiSequence::CursorDown(csi_count(rows_down)).to_string());
    }
    acc.push_str("\r\n");
    acc.push_str(&CsiSequence::EraseDisplay(erase_mode::TO_END).to_string());
    acc.into_bytes()
}

/// Clear the screen and home the cursor.
#[must_use]
pub fn render_clear_screen() -> Vec<u8> {
    format!(
        "{}{}",
        CsiSequence::EraseDisplay(erase_mode::ALL),
        CsiSequence::CursorPosition { row: 1, col: 1 }
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn frame(
        prompt: &str,
        text: &str,
        cursor_offset: usize,
        suggestions: &[String],
        width: usize,
        previous: &RenderSnapshot,
    ) -> (String, RenderSnapshot) {
        let input: Vec<char> = text.chars().collect();
        let tokens = tokenize(text);
        let request = RenderRequest {
            prompt,
            input: &input,
            cursor_offset,
            suggestions,
            width,
            tokens: &tokens,
        };
        let (bytes, snapshot) = render(&request, previous);
        (String::from_utf8(bytes).unwrap(), snapshot)
    }

    #[test]
    fn test_single_line_frame() {
        let (output, snapshot) = frame("> ", "ab", 1, &[], 80, &RenderSnapshot::default());
        pretty_assertions::assert_eq!(output, "\r> ab\x1b[0K\r\x1b[3C");
        assert_eq!(snapshot, RenderSnapshot {
            previous_input_line_count: 1,
            previous_row_index: 0,
            previous_suggestion_line_count: 0,
            previous_suggestion_count: 0,
        });
    }

    #[test]
    fn test_wrapped_frame_moves_back_up_first() {
        // Prompt 2 + input 8 = 10 columns on a 4 column terminal: 3 lines.
        let (output, snapshot) =
            frame("> ", "abcdefgh", 8, &[], 4, &RenderSnapshot::default());
        assert_eq!(snapshot.previous_input_line_count, 3);
        assert_eq!(snapshot.previous_row_index, 2);
        assert!(output.ends_with("\r\x1b[2C"));

        let (output, _) = frame("> ", "abcdefgh", 0, &[], 4, &snapshot);
        assert!(output.starts_with("\x1b[2A\r"));
        // From the last row back to row 0, column 2.
        assert!(output.ends_with("\x1b[2A\r\x1b[2C"));
    }

    #[test]
    fn test_exact_fill_forces_wrap() {
        let (output, snapshot) = frame("> ", "ab", 2, &[], 4, &RenderSnapshot::default());
        assert!(output.contains("> ab\r\n\x1b[0K"));
        assert_eq!(snapshot.previous_input_line_count, 2);
        assert_eq!(snapshot.previous_row_index, 1);
    }

    #[test]
    fn test_suggestion_strip_and_shrinking_frames() {
        let suggestions = vec!["build".to_string(), "run".to_string()];
        let (output, snapshot) =
            frame("> ", "cmd help ", 9, &suggestions, 80, &RenderSnapshot::default());
        assert!(output.contains("\r\nbuild run\x1b[0K"));
        assert!(output.ends_with("\x1b[1A\r\x1b[11C"));
        assert_eq!(snapshot.previous_suggestion_line_count, 1);
        assert_eq!(snapshot.previous_suggestion_count, 2);

        // Suggestions gone: the old strip is erased.
        let (output, snapshot) = frame("> ", "cmd help build", 14, &[], 80, &snapshot);
        assert!(output.contains("\x1b[0J"));
        assert_eq!(snapshot.total_line_count(), 1);
    }

    #[test]
    fn test_prompt_width_ignores_ansi() {
        assert_eq!(prompt_display_width("\x1b[32m> \x1b[0m"), 2);
        assert_eq!(prompt_display_width("λ "), 2);
    }

    #[test]
    fn test_highlight_colors_tokens_only() {
        let input: Vec<char> = "for $x".chars().collect();
        let highlighted = highlight(&input, &tokenize("for $x"));
        assert_eq!(strip_ansi_escapes::strip_str(&highlighted), "for $x");
        assert_ne!(highlighted, "for $x");
        assert_eq!(highlight(&[], &[]), "");
    }

    #[test]
    fn test_finish_line() {
        let snapshot = RenderSnapshot {
            previous_input_line_count: 3,
            previous_row_index: 0,
            previous_suggestion_line_count: 1,
            previous_suggestion_count: 2,
        };
        pretty_assertions::assert_eq!(
            String::from_utf8(render_finish_line(&snapshot)).unwrap(),
            "\x1b[2B\r\n\x1b[0J"
        );
        assert_eq!(
            String::from_utf8(render_clear_screen()).unwrap(),
            "\x1b[2J\x1b[1;1H"
        );
    }
}

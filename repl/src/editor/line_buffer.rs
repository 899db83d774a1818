// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{Span, Token};

/// The text being edited plus the cursor.
///
/// The cursor is stored as a distance from the *end* of the input (0 means the cursor is
/// after the last character). Appending at the end, by far the most common edit, leaves
/// it untouched.
///
/// Invariant: `cursor_distance_from_end <= input.len()`. Every mutator maintains it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    pub input: Vec<char>,
    pub cursor_distance_from_end: usize,
}

/// Opening delimiters that get their partner inserted while typing live.
fn closing_partner(ch: char) -> Option<char> {
    match ch {
        '[' => Some(']'),
        '{' => Some('}'),
        '(' => Some(')'),
        _ => None,
    }
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn text(&self) -> String { self.input.iter().collect() }

    #[must_use]
    pub fn len(&self) -> usize { self.input.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.input.is_empty() }

    /// Cursor position as a character offset from the start.
    #[must_use]
    pub fn cursor_offset(&self) -> usize { self.input.len() - self.cursor_distance_from_end }

    /// Clamped to the buffer.
    pub fn set_cursor_offset(&mut self, offset: usize) {
        let offset = offset.min(self.input.len());
        self.cursor_distance_from_end = self.input.len() - offset;
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.cursor_distance_from_end = 0;
    }

    /// Replace the whole text and put the cursor at the end (history recall).
    pub fn set_text(&mut self, text: &str) {
        self.input = text.chars().collect();
        self.cursor_distance_from_end = 0;
    }

    /// Insert at the cursor. With `auto_close`, an opening bracket also gets its closing
    /// partner and the cursor ends up between the two. The caller passes `false` while
    /// more input is already queued, i.e. during a paste.
    pub fn insert(&mut self, ch: char, auto_close: bool) {
        let offset = self.cursor_offset();
        self.input.insert(offset, ch);
        if auto_close && let Some(partner) = closing_partner(ch) {
            self.input.insert(offset + 1, partner);
            self.cursor_distance_from_end += 1;
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_distance_from_end < self.input.len() {
            self.cursor_distance_from_end += 1;
        }
    }

    pub fn move_right(&mut self) {
        self.cursor_distance_from_end = self.cursor_distance_from_end.saturating_sub(1);
    }

    pub fn move_home(&mut self) { self.cursor_distance_from_end = self.input.len(); }

    pub fn move_end(&mut self) { self.cursor_distance_from_end = 0; }

    pub fn delete_backward(&mut self) {
        let offset = self.cursor_offset();
        if offset > 0 {
            self.input.remove(offset - 1);
        }
    }

    pub fn delete_forward(&mut self) {
        let offset = self.cursor_offset();
        if offset < self.input.len() {
            self.input.remove(offset);
            self.cursor_distance_from_end -= 1;
        }
    }

    /// Delete everything before the cursor.
    pub fn delete_to_start(&mut self) {
        let offset = self.cursor_offset();
        self.input.drain(..offset);
    }

    /// Start of the nearest word token that begins before the cursor.
    #[must_use]
    pub fn word_backward_target(&self, tokens: &[Token]) -> usize {
        let cursor = self.cursor_offset();
        tokens
            .iter()
            .filter(|it| it.is_word() && it.span.start < cursor)
            .map(|it| it.span.start)
            .max()
            .unwrap_or(0)
    }

    /// End of the nearest word token that ends after the cursor.
    #[must_use]
    pub fn word_forward_target(&self, tokens: &[Token]) -> usize {
        let cursor = self.cursor_offset();
        tokens
            .iter()
            .filter(|it| it.is_word() && it.span.end > cursor)
            .map(|it| it.span.end)
            .min()
            .unwrap_or(self.input.len())
    }

    fn has_multiple_words(tokens: &[Token]) -> bool {
        tokens.iter().filter(|it| it.is_word()).count() > 1
    }

    /// `tokens` must come from tokenizing the current text.
    pub fn move_word_backward(&mut self, tokens: &[Token]) {
        if Self::has_multiple_words(tokens) {
            self.set_cursor_offset(self.word_backward_target(tokens));
        } else {
            self.move_home();
        }
    }

    pub fn move_word_forward(&mut self, tokens: &[Token]) {
        if Self::has_multiple_words(tokens) {
            self.set_cursor_offset(self.word_forward_target(tokens));
        } else {
            self.move_end();
        }
    }

    /// Remove from the start of the previous word to the cursor. At the start of the
    /// buffer this removes nothing.
    pub fn delete_word_backward(&mut self, tokens: &[Token]) {
        let cursor = self.cursor_offset();
        let target = self.word_backward_target(tokens).min(cursor);
        self.input.drain(target..cursor);
    }

    /// Remove from the cursor to the end of the next word. At the end of the buffer this
    /// removes nothing.
    pub fn delete_word_forward(&mut self, tokens: &[Token]) {
        let cursor = self.cursor_offset();
        let target = self.word_forward_target(tokens).clamp(cursor, self.input.len());
        self.input.drain(cursor..target);
        self.cursor_distance_from_end -= target - cursor;
    }

    /// Replace the characters in `span` with `value` and put the cursor right after the
    /// inserted text. The span is clamped to the buffer first.
    pub fn replace_span(&mut self, span: Span, value: &str) {
        let span = span.clamp_to(self.input.len());
        let start = span.start.min(span.end);
        self.input.splice(start..span.end, value.chars());
        self.set_cursor_offset(start + value.chars().count());
    }

    /// The characters in `span`, clamped to the buffer.
    #[must_use]
    pub fn slice(&self, span: Span) -> String {
        let span = span.clamp_to(self.input.len());
        self.input[span.start.min(span.end)..span.end].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn buffer_with(text: &str, cursor: usize) -> LineBuffer {
        let mut it = LineBuffer::new();
        it.set_text(text);
        it.set_cursor_offset(cursor);
        it
    }

    #[test]
    fn test_auto_close_when_typing_live() {
        let mut buffer = LineBuffer::new();
        buffer.insert('[', true);
        assert_eq!(buffer.text(), "[]");
        assert_eq!(buffer.cursor_distance_from_end, 1);

        buffer.insert('1', true);
        assert_eq!(buffer.text(), "[1]");
        assert_eq!(buffer.cursor_offset(), 2);
    }

    #[test]
    fn test_no_auto_close_during_paste() {
        let mut buffer = LineBuffer::new();
        buffer.insert('[', false);
        assert_eq!(buffer.text(), "[");
        assert_eq!(buffer.cursor_distance_from_end, 0);
    }

    #[test]
    fn test_quotes_are_never_paired() {
        let mut buffer = LineBuffer::new();
        buffer.insert('"', true);
        buffer.insert('\'', true);
        assert_eq!(buffer.text(), "\"'");
        assert_eq!(buffer.cursor_distance_from_end, 0);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut buffer = LineBuffer::new();
        buffer.delete_backward();
        buffer.delete_forward();
        buffer.move_left();
        buffer.move_right();
        assert_eq!(buffer.cursor_distance_from_end, 0);

        for ch in "abc".chars() {
            buffer.insert(ch, true);
        }
        for _ in 0..5 {
            buffer.move_left();
            assert!(buffer.cursor_distance_from_end <= buffer.len());
        }
        assert_eq!(buffer.cursor_offset(), 0);
        buffer.delete_backward();
        assert_eq!(buffer.text(), "abc");

        for _ in 0..5 {
            buffer.delete_forward();
            assert!(buffer.cursor_distance_from_end <= buffer.len());
        }
        assert!(buffer.is_empty());
        assert_eq!(buffer.cursor_distance_from_end, 0);
    }

    #[test]
    fn test_mixed_edit_sequence_keeps_invariant() {
        let mut buffer = LineBuffer::new();
        let script = "ab<c<<d>>e<<<<f>";
        for step in script.chars() {
            match step {
                '<' => buffer.move_left(),
                '>' => buffer.delete_forward(),
                ch => buffer.insert(ch, true),
            }
            assert!(buffer.cursor_distance_from_end <= buffer.len());
            buffer.delete_backward();
            assert!(buffer.cursor_distance_from_end <= buffer.len());
        }
    }

    #[test]
    fn test_word_motion_follows_tokens() {
        let text = "cmd help build";
        let tokens = tokenize(text);

        let mut buffer = buffer_with(text, text.len());
        buffer.move_word_backward(&tokens);
        assert_eq!(buffer.cursor_offset(), 9);
        buffer.move_word_backward(&tokens);
        assert_eq!(buffer.cursor_offset(), 4);
        buffer.move_word_forward(&tokens);
        assert_eq!(buffer.cursor_offset(), 8);
        buffer.move_word_forward(&tokens);
        assert_eq!(buffer.cursor_offset(), 14);

        // Punctuation is its own word: `obj.name`.
        let text = "obj.name";
        let tokens = tokenize(text);
        let mut buffer = buffer_with(text, text.len());
        buffer.move_word_backward(&tokens);
        assert_eq!(buffer.cursor_offset(), 4);
    }

    #[test]
    fn test_single_token_word_motion_is_home_end() {
        let text = "  hello  ";
        let tokens = tokenize(text);
        let mut buffer = buffer_with(text, 4);
        buffer.move_word_backward(&tokens);
        assert_eq!(buffer.cursor_offset(), 0);
        buffer.move_word_forward(&tokens);
        assert_eq!(buffer.cursor_offset(), text.len());
    }

    #[test]
    fn test_word_deletion() {
        let text = "cmd help build";
        let mut buffer = buffer_with(text, 8);
        buffer.delete_word_backward(&tokenize(text));
        assert_eq!(buffer.text(), "cmd  build");
        assert_eq!(buffer.cursor_offset(), 4);

        let text = buffer.text();
        buffer.delete_word_forward(&tokenize(&text));
        assert_eq!(buffer.text(), "cmd ");
        assert_eq!(buffer.cursor_offset(), 4);

        // Nothing to delete at the boundaries.
        let text = buffer.text();
        buffer.delete_word_forward(&tokenize(&text));
        assert_eq!(buffer.text(), "cmd ");
        let mut buffer = buffer_with("cmd", 0);
        buffer.delete_word_backward(&tokenize("cmd"));
        assert_eq!(buffer.text(), "cmd");
    }

    #[test]
    fn test_kill_to_start_and_replace_span() {
        let mut buffer = buffer_with("hello world", 6);
        buffer.delete_to_start();
        assert_eq!(buffer.text(), "world");
        assert_eq!(buffer.cursor_offset(), 0);

        let mut buffer = buffer_with("obj.", 4);
        buffer.replace_span(Span::new(0, 4), "obj.name");
        assert_eq!(buffer.text(), "obj.name");
        assert_eq!(buffer.cursor_distance_from_end, 0);

        let mut buffer = buffer_with("cmd help ", 9);
        buffer.replace_span(Span::new(9, 10), "build");
        assert_eq!(buffer.text(), "cmd help build");
        assert_eq!(buffer.slice(Span::new(4, 8)), "help");
    }
}

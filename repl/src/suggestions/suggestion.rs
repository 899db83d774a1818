// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{LineBuffer, Span};

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Suggestion {
    /// What the suggestion strip displays.
    pub shown: String,
    /// What gets written into the buffer.
    pub value: String,
    /// The buffer range that `value` replaces. `None` means "the node at the cursor",
    /// [`crate::find_suggestions`] fills it in before returning.
    pub span: Option<Span>,
}

impl Suggestion {
    #[must_use]
    pub fn new(shown: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            shown: shown.into(),
            value: value.into(),
            span: None,
        }
    }

    /// Shown and inserted text are the same.
    #[must_use]
    pub fn same(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(text.clone(), text)
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// Longest common prefix, in characters.
#[must_use]
pub fn longest_common_prefix<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut values = values.into_iter();
    let Some(first) = values.next() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.chars().collect();
    for value in values {
        let common = prefix
            .iter()
            .zip(value.chars())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(common);
    }
    prefix.into_iter().collect()
}

/// Apply completion results to `buffer` and return the shown strings to display.
///
/// - A single candidate is written in place, nothing is displayed.
/// - Several candidates are displayed sorted. If they all replace the same span, their
///   longest common prefix is written in place when it extends what is already typed.
///
/// A span that starts at the cursor covers nothing typed yet, so it is an insertion: the
/// characters after the cursor are kept.
pub fn apply_suggestions(buffer: &mut LineBuffer, suggestions: &[Suggestion]) -> Vec<String> {
    let cursor = buffer.cursor_offset();
    let span_of = |it: &Suggestion| insertion_aware_span(it.span.unwrap_or_default(), cursor);

    match suggestions {
        [] => vec![],
        [only] => {
            buffer.replace_span(span_of(only), &only.value);
            vec![]
        }
        [first, rest @ ..] => {
            let span = span_of(first);
            if rest.iter().all(|it| span_of(it) == span) {
                let prefix =
                    longest_common_prefix(suggestions.iter().map(|it| it.value.as_str()));
                let typed = buffer.slice(span);
                if prefix.chars().count() > typed.chars().count() && prefix.starts_with(&typed)
                {
                    buffer.replace_span(span, &prefix);
                }
            }
            let mut shown: Vec<String> = suggestions.iter().map(|it| it.shown.clone()).collect();
            shown.sort();
            shown
        }
    }
}

fn insertion_aware_span(span: Span, cursor: usize) -> Span {
    if span.start == cursor {
        Span::new(cursor, cursor)
    } else {
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(text: &str) -> LineBuffer {
        let mut it = LineBuffer::new();
        it.set_text(text);
        it
    }

    #[test]
    fn test_longest_common_prefix() {
        assert_eq!(longest_common_prefix(["file1.txt", "file2.txt"]), "file");
        assert_eq!(longest_common_prefix(["abc"]), "abc");
        assert_eq!(longest_common_prefix(["abc", "xyz"]), "");
        assert_eq!(longest_common_prefix(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_single_candidate_is_inserted() {
        let mut buffer = buffer_with("obj.");
        let shown = apply_suggestions(&mut buffer, &[
            Suggestion::same("obj.name").with_span(Span::new(0, 4))
        ]);
        assert!(shown.is_empty());
        assert_eq!(buffer.text(), "obj.name");
    }

    #[test]
    fn test_many_candidates_insert_common_prefix_and_list_sorted() {
        let mut buffer = buffer_with("./d/f");
        let span = Span::new(0, 5);
        let shown = apply_suggestions(&mut buffer, &[
            Suggestion::new("file2.txt", "./d/file2.txt").with_span(span),
            Suggestion::new("file1.txt", "./d/file1.txt").with_span(span),
        ]);
        assert_eq!(shown, vec!["file1.txt", "file2.txt"]);
        assert_eq!(buffer.text(), "./d/file");
    }

    #[test]
    fn test_insertion_span_past_the_end_is_clamped() {
        let mut buffer = buffer_with("cmd help ");
        let span = Span::new(9, 10);
        let shown = apply_suggestions(&mut buffer, &[
            Suggestion::same("run").with_span(span),
            Suggestion::same("build").with_span(span),
        ]);
        assert_eq!(shown, vec!["build", "run"]);
        assert_eq!(buffer.text(), "cmd help ");

        apply_suggestions(&mut buffer, &[Suggestion::same("run").with_span(span)]);
        assert_eq!(buffer.text(), "cmd help run");
    }

    #[test]
    fn test_insertion_keeps_the_text_after_the_cursor() {
        let mut buffer = LineBuffer::new();
        buffer.set_text("for [] {cmd help }");
        buffer.set_cursor_offset(17);

        apply_suggestions(&mut buffer, &[
            Suggestion::same("build").with_span(Span::new(17, 18))
        ]);
        assert_eq!(buffer.text(), "for [] {cmd help build}");
        assert_eq!(buffer.cursor_offset(), 22);
    }
}

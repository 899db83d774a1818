// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::collections::VecDeque;

pub const HISTORY_SIZE_MAX: usize = 1_000;

/// In-memory log of submitted lines plus a scroll index for recall.
///
/// A fresh history holds a single empty entry. It stands in for "the new line" until the
/// first real submission replaces it, so that recall always has something to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    pub entries: VecDeque<String>,
    pub index: usize,
    pub max_size: usize,
    is_sentinel_untouched: bool,
}

impl Default for History {
    fn default() -> Self { Self::new(HISTORY_SIZE_MAX) }
}

impl History {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::from([String::new()]),
            index: 0,
            max_size: max_size.max(1),
            is_sentinel_untouched: true,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    #[must_use]
    pub fn current(&self) -> &str {
        self.entries.get(self.index).map_or("", String::as_str)
    }

    /// Move the index by `delta`, clamped to the entries. Never wraps.
    pub fn scroll(&mut self, delta: isize) {
        let last = self.entries.len().saturating_sub(1);
        self.index = self.index.saturating_add_signed(delta).min(last);
    }

    /// Point at the newest entry.
    pub fn reset_index(&mut self) { self.index = self.entries.len().saturating_sub(1); }

    /// Record a submission. Consecutive duplicates are not recorded twice, and the oldest
    /// entries are dropped past `max_size`.
    pub fn append(&mut self, line: &str) {
        if self.is_sentinel_untouched {
            self.entries.clear();
            self.is_sentinel_untouched = false;
        }
        if self.entries.back().map(String::as_str) != Some(line) {
            self.entries.push_back(line.to_string());
            while self.entries.len() > self.max_size {
                self.entries.pop_front();
            }
        }
        self.reset_index();
    }

    /// One recall step: returns the entry under the index, then moves the index.
    /// `Up` is `step(-1)` and `Down` is `step(1)`.
    pub fn step(&mut self, delta: isize) -> String {
        let it = self.current().to_string();
        self.scroll(delta);
        it
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_history_has_empty_sentinel() {
        let history = History::default();
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), "");
    }

    #[test]
    fn test_recall_after_two_submissions() {
        let mut history = History::default();
        history.append("a");
        history.append("b");
        assert_eq!(history.len(), 2);

        // Back twice, forward once.
        assert_eq!(history.step(-1), "b");
        assert_eq!(history.step(-1), "a");
        assert_eq!(history.step(1), "a");
    }

    #[test]
    fn test_scroll_clamps() {
        let mut history = History::default();
        history.append("a");
        history.append("b");

        history.scroll(-10);
        assert_eq!(history.index, 0);
        assert_eq!(history.current(), "a");

        history.scroll(10);
        assert_eq!(history.index, 1);
        assert_eq!(history.current(), "b");
    }

    #[test]
    fn test_duplicates_and_cap() {
        let mut history = History::new(2);
        history.append("a");
        history.append("a");
        assert_eq!(history.len(), 1);

        history.append("b");
        history.append("c");
        assert_eq!(history.entries, VecDeque::from(["b".to_string(), "c".to_string()]));
        assert_eq!(history.current(), "c");
    }
}

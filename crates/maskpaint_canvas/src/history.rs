//! Snapshot history for undo/redo.
//!
//! Unlike a two-stack undo system, the history keeps one list of snapshots
//! and a moving index that points at the snapshot currently shown. Recording
//! a new snapshot discards everything after the index.

use crate::constants::HISTORY_LIMIT;

/// Bounded linear undo/redo history over snapshots of type `T`.
///
/// # Example
/// ```
/// use maskpaint_canvas::History;
///
/// let mut history: History<String> = History::new(50);
/// history.record("empty".to_string());
/// history.record("one stroke".to_string());
///
/// assert_eq!(history.undo().map(String::as_str), Some("empty"));
/// assert_eq!(history.redo().map(String::as_str), Some("one stroke"));
/// ```
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Recorded snapshots, oldest first
    entries: Vec<T>,
    /// Index of the snapshot currently shown (meaningless when empty)
    index: usize,
    /// Maximum number of snapshots kept
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl<T> History<T> {
    /// Create an empty history keeping at most `limit` snapshots
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Record a new snapshot after the current one.
    ///
    /// Any redo branch is dropped. When the limit is exceeded the oldest
    /// snapshots are discarded and the index stays on the newest entry.
    pub fn record(&mut self, state: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(state);

        let overflow = self.entries.len().saturating_sub(self.limit);
        if overflow > 0 {
            self.entries.drain(..overflow);
        }
        self.index = self.entries.len() - 1;

        log::debug!(
            "📝 History: recorded snapshot {}/{}",
            self.index + 1,
            self.entries.len()
        );
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.index > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index + 1 < self.entries.len()
    }

    /// Step back one snapshot and return it, or None at the start
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        log::debug!("⏪ History: undo to {}", self.index + 1);
        self.entries.get(self.index)
    }

    /// Step forward one snapshot and return it, or None at the end
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        log::debug!("⏩ History: redo to {}", self.index + 1);
        self.entries.get(self.index)
    }

    /// Snapshot currently shown
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.index)
    }

    /// Position of the current snapshot, None when empty
    pub fn index(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.index)
    }

    /// Number of recorded snapshots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of snapshots kept
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
        log::debug!("🗑️ History cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_cannot_move() {
        let mut history: History<u32> = History::default();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.index(), None);
        assert_eq!(history.limit(), HISTORY_LIMIT);
    }

    #[test]
    fn test_single_entry_has_nothing_to_undo() {
        let mut history = History::new(5);
        history.record(0);
        assert_eq!(history.current(), Some(&0));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_walks_linearly() {
        let mut history = History::new(10);
        for i in 0..4 {
            history.record(i);
        }

        assert_eq!(history.undo(), Some(&2));
        assert_eq!(history.undo(), Some(&1));
        assert!(history.can_redo());
        assert_eq!(history.redo(), Some(&2));
        assert_eq!(history.redo(), Some(&3));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_record_drops_redo_branch() {
        let mut history = History::new(10);
        history.record("a");
        history.record("b");
        history.record("c");
        history.undo();
        history.undo();

        history.record("d");
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), Some(&"d"));
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(&"a"));
    }

    #[test]
    fn test_limit_keeps_newest_and_index_in_bounds() {
        let mut history = History::new(50);
        for i in 0..60 {
            history.record(i);
        }

        assert_eq!(history.len(), 50);
        assert_eq!(history.index(), Some(49));
        assert_eq!(history.current(), Some(&59));
        assert!(!history.can_redo());

        let mut steps = 0;
        while history.undo().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 49);
        assert_eq!(history.current(), Some(&10));
    }

    #[test]
    fn test_clear() {
        let mut history = History::new(3);
        history.record(1);
        history.record(2);
        history.clear();
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }
}

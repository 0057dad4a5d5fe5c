//! Undo/redo history.
//!
//! Each committed command records the document and selection it replaced.
//! Undo swaps the current state for the most recent snapshot and keeps the
//! current one for redo.

use crate::model::Document;
use crate::types::Selection;

/// Document state captured before an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub doc: Document,
    pub selection: Selection,
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    /// History keeping at most `max_steps` undo steps. Zero disables it.
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the state an edit is about to replace.
    pub fn record(&mut self, before: Snapshot) {
        // Clear redo stack on new edit
        self.redo_stack.clear();
        if self.max_steps == 0 {
            return;
        }

        self.undo_stack.push(before);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pop the previous state, parking `current` for redo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Pop the next state, parking `current` for undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    /// Clear all undo/redo history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;

    fn snap(text: &str) -> Snapshot {
        Snapshot {
            doc: Document::from_blocks(vec![Block::paragraph(text)]),
            selection: Selection::collapsed(0),
        }
    }

    #[test]
    fn test_undo_redo_swaps_states() {
        let mut history = History::new(100);
        assert!(!history.can_undo());

        history.record(snap("a"));
        assert!(history.can_undo());

        let restored = history.undo(snap("ab")).unwrap();
        assert_eq!(restored, snap("a"));
        assert!(!history.can_undo());
        assert!(history.can_redo());

        let again = history.redo(snap("a")).unwrap();
        assert_eq!(again, snap("ab"));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::new(100);
        history.record(snap("a"));
        history.undo(snap("ab"));
        assert!(history.can_redo());

        // New edit should clear redo
        history.record(snap("a"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_steps() {
        let mut history = History::new(3);
        for text in ["a", "b", "c", "d"] {
            history.record(snap(text));
        }
        assert_eq!(history.undo_depth(), 3);

        // Should only be able to undo 3 times
        assert_eq!(history.undo(snap("e")), Some(snap("d")));
        assert_eq!(history.undo(snap("d")), Some(snap("c")));
        assert_eq!(history.undo(snap("c")), Some(snap("b")));
        assert_eq!(history.undo(snap("b")), None); // a was evicted
    }

    #[test]
    fn test_zero_depth_disables_history() {
        let mut history = History::new(0);
        history.record(snap("a"));
        assert!(!history.can_undo());
    }
}

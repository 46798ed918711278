//! Undoable edits.
//!
//! Every user-facing parameter change is recorded as an [`Action`] holding
//! both the old and the new value, so undo and redo are plain setter calls
//! followed by a partial re-run.

use crate::StageParams;

/// Default history depth.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// A recorded edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Stage parameters replaced.
    SetParams {
        /// Stage index.
        index: usize,
        /// Parameters before the edit.
        old: Box<StageParams>,
        /// Parameters after the edit.
        new: Box<StageParams>,
    },
    /// Stage bypass toggled.
    SetBypass {
        /// Stage index.
        index: usize,
        /// Flag before the edit.
        old: bool,
        /// Flag after the edit.
        new: bool,
    },
}

impl Action {
    /// Index of the stage the action touches.
    pub fn index(&self) -> usize {
        match self {
            Action::SetParams { index, .. } | Action::SetBypass { index, .. } => *index,
        }
    }
}

/// Bounded undo/redo history.
///
/// ```rust
/// use sky_pipeline::{Action, ActionStack};
///
/// let mut stack = ActionStack::new(2);
/// for i in 0..3 {
///     stack.push(Action::SetBypass { index: i, old: false, new: true });
/// }
/// assert_eq!(stack.undo_len(), 2);
/// let a = stack.pop_undo().unwrap();
/// assert_eq!(a.index(), 2);
/// stack.push_redo(a);
/// assert!(stack.can_redo());
/// ```
#[derive(Debug, Clone)]
pub struct ActionStack {
    undo_stack: Vec<Action>,
    redo_stack: Vec<Action>,
    max_steps: usize,
}

impl Default for ActionStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

impl ActionStack {
    /// Empty history keeping at most `max_steps` undo entries (at least one).
    pub fn new(max_steps: usize) -> Self {
        Self { undo_stack: Vec::new(), redo_stack: Vec::new(), max_steps: max_steps.max(1) }
    }

    /// Records a new edit. Clears the redo history.
    pub fn push(&mut self, action: Action) {
        self.redo_stack.clear();
        self.undo_stack.push(action);
        self.trim_to_limit();
    }

    /// Takes the most recent edit for undoing.
    pub fn pop_undo(&mut self) -> Option<Action> {
        self.undo_stack.pop()
    }

    /// Takes the most recently undone edit for redoing.
    pub fn pop_redo(&mut self) -> Option<Action> {
        self.redo_stack.pop()
    }

    /// Files an undone edit so it can be redone.
    pub fn push_redo(&mut self, action: Action) {
        self.redo_stack.push(action);
    }

    /// Files a redone edit back onto the undo history without touching
    /// the redo history.
    pub fn push_undone(&mut self, action: Action) {
        self.undo_stack.push(action);
        self.trim_to_limit();
    }

    /// Returns true if there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable edits.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable edits.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// History depth.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Drops all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn trim_to_limit(&mut self) {
        if self.undo_stack.len() > self.max_steps {
            let excess = self.undo_stack.len() - self.max_steps;
            self.undo_stack.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bypass(index: usize) -> Action {
        Action::SetBypass { index, old: false, new: true }
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack = ActionStack::default();
        stack.push(bypass(0));
        let a = stack.pop_undo().unwrap();
        stack.push_redo(a);
        assert!(stack.can_redo());
        stack.push(bypass(1));
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_len(), 1);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut stack = ActionStack::new(3);
        for i in 0..5 {
            stack.push(bypass(i));
        }
        assert_eq!(stack.undo_len(), 3);
        let indices: Vec<usize> =
            std::iter::from_fn(|| stack.pop_undo()).map(|a| a.index()).collect();
        assert_eq!(indices, vec![4, 3, 2]);
    }

    #[test]
    fn test_redo_keeps_redo_history() {
        let mut stack = ActionStack::default();
        stack.push(bypass(0));
        stack.push(bypass(1));
        for _ in 0..2 {
            let a = stack.pop_undo().unwrap();
            stack.push_redo(a);
        }
        let a = stack.pop_redo().unwrap();
        assert_eq!(a.index(), 0);
        stack.push_undone(a);
        assert_eq!(stack.redo_len(), 1);
        assert_eq!(stack.undo_len(), 1);
    }

    #[test]
    fn test_default_depth() {
        assert_eq!(ActionStack::default().max_steps(), DEFAULT_MAX_STEPS);
        assert_eq!(ActionStack::new(0).max_steps(), 1);
    }
}

use crate::foundation::error::ManimlineResult;
use crate::scene::timeline::{Edit, EditOutcome, Timeline};

/// Undo/redo over committed timeline states.
///
/// Every edit goes through [`Timeline::apply`], so each stored state satisfies the timeline
/// invariants.
#[derive(Clone, Debug, Default)]
pub struct EditHistory {
    current: Timeline,
    undo: Vec<Timeline>,
    redo: Vec<Timeline>,
    limit: Option<usize>,
}

impl EditHistory {
    /// Start tracking from `initial`.
    pub fn new(initial: Timeline) -> Self {
        Self {
            current: initial,
            undo: Vec::new(),
            redo: Vec::new(),
            limit: None,
        }
    }

    /// Keep at most `limit` undo states.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Current timeline state.
    pub fn current(&self) -> &Timeline {
        &self.current
    }

    /// Apply an edit. Failed edits leave the history untouched.
    pub fn apply(&mut self, edit: Edit) -> ManimlineResult<EditOutcome> {
        let (next, outcome) = self.current.apply(edit)?;
        if next != self.current {
            let prev = std::mem::replace(&mut self.current, next);
            self.undo.push(prev);
            self.redo.clear();
            if let Some(limit) = self.limit
                && self.undo.len() > limit
            {
                let excess = self.undo.len() - limit;
                self.undo.drain(..excess);
            }
        }
        Ok(outcome)
    }

    /// Step back one state. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.undo.pop() else {
            return false;
        };
        let cur = std::mem::replace(&mut self.current, prev);
        self.redo.push(cur);
        true
    }

    /// Re-apply the last undone state. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let cur = std::mem::replace(&mut self.current, next);
        self.undo.push(cur);
        true
    }

    /// Stop tracking and return the current state.
    pub fn into_current(self) -> Timeline {
        self.current
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/history.rs"]
mod tests;

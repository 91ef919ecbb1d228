use std::collections::VecDeque;

use crate::codec::BoardSnapshot;

/// Default depth of each history stack.
pub const DEFAULT_UNDO_LIMIT: usize = 50;

/// Snapshot-based undo/redo.
///
/// Both stacks hold full board snapshots and are bounded; once a stack grows
/// past its limit the oldest snapshot is dropped and can no longer be reached.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    undo_stack: VecDeque<BoardSnapshot>,
    redo_stack: VecDeque<BoardSnapshot>,
    limit: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record the state from before a mutation. A new branch invalidates
    /// the redo future.
    pub fn record(&mut self, before: BoardSnapshot) {
        push_bounded(&mut self.undo_stack, before, self.limit);
        self.redo_stack.clear();
    }

    /// Step back. `current` moves onto the redo stack and the most recent
    /// recorded state is returned for loading.
    pub fn undo(&mut self, current: BoardSnapshot) -> Option<BoardSnapshot> {
        let previous = self.undo_stack.pop_back()?;
        push_bounded(&mut self.redo_stack, current, self.limit);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: BoardSnapshot) -> Option<BoardSnapshot> {
        let next = self.redo_stack.pop_back()?;
        push_bounded(&mut self.undo_stack, current, self.limit);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<BoardSnapshot>, snapshot: BoardSnapshot, limit: usize) {
    stack.push_back(snapshot);
    while stack.len() > limit {
        stack.pop_front();
    }
}

//! Linear undo/redo history of request snapshots.

use std::sync::Arc;

use crate::snapshot::{Snapshot, SnapshotChanges};

/// Ordered snapshots with a cursor. Never empty.
///
/// `entries[..cursor]` is the committed past, `entries[cursor + 1..]` the redo
/// future. A new commit discards the redo future before appending.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<Arc<Snapshot>>,
    cursor: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl HistoryStore {
    pub fn new(seed: Snapshot) -> Self {
        Self {
            entries: vec![Arc::new(seed)],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &Arc<Snapshot> {
        &self.entries[self.cursor]
    }

    /// Merge `changes` into the current snapshot and append the result.
    ///
    /// Returns `false` without touching the history when every field in
    /// `changes` already matches the current snapshot.
    pub fn commit(&mut self, changes: SnapshotChanges) -> bool {
        let current = self.current();
        if changes.is_satisfied_by(current) {
            return false;
        }
        let candidate = current.merged(&changes);
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Arc::new(candidate));
        self.cursor = self.entries.len() - 1;
        tracing::trace!(cursor = self.cursor, len = self.entries.len(), "history commit");
        true
    }

    pub fn undo(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the seed snapshot is never removed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Arc<Snapshot>] {
        &self.entries
    }
}

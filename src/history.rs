//! Bounded undo/redo history of grid snapshots.
//!
//! The log holds immutable deep copies of the grid. Its first entry is the
//! grid the history was created (or reset) with. Appending discards any redo
//! tail, and the oldest entry is evicted once the log exceeds its limit.
//!
//! Undo and redo hand back a snapshot for the caller to install as the live
//! grid. Installing goes through the same [`History::commit`] path as a
//! genuine edit, so both arm a one-shot suppress flag that swallows that next
//! commit instead of recording it.
//!
//! A drag-paint gesture is coalesced with [`History::begin_stroke`] and
//! [`History::end_stroke`]: while a stroke is recording, commits are deferred
//! and the stroke records at most one entry when it ends.

use crate::grid::Grid;

/// Default maximum number of snapshots kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Whether a paint stroke is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryState {
    #[default]
    Idle,
    /// A stroke is in progress; `dirty` records whether it changed anything.
    Recording { dirty: bool },
}

/// What a call to [`History::commit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new snapshot was appended.
    Recorded,
    /// The commit installed an undo/redo result and was swallowed.
    Suppressed,
    /// A stroke is recording; the commit will be folded into its end.
    Deferred,
}

/// Bounded snapshot log with an undo/redo pointer.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Grid>,
    pointer: usize,
    limit: usize,
    suppress_next: bool,
    state: HistoryState,
}

impl History {
    /// Start a history whose first entry is `initial`.
    pub fn new(initial: &Grid) -> Self {
        Self::with_limit(initial, DEFAULT_HISTORY_LIMIT)
    }

    /// Start a history with a custom limit (floored to 1).
    pub fn with_limit(initial: &Grid, limit: usize) -> Self {
        Self {
            snapshots: vec![initial.clone()],
            pointer: 0,
            limit: limit.max(1),
            suppress_next: false,
            state: HistoryState::Idle,
        }
    }

    /// Discard everything and start again from `initial`.
    pub fn reset(&mut self, initial: &Grid) {
        self.snapshots.clear();
        self.snapshots.push(initial.clone());
        self.pointer = 0;
        self.suppress_next = false;
        self.state = HistoryState::Idle;
    }

    /// Record the post-mutation grid.
    pub fn commit(&mut self, grid: &Grid) -> CommitOutcome {
        if self.suppress_next {
            self.suppress_next = false;
            return CommitOutcome::Suppressed;
        }
        if let HistoryState::Recording { .. } = self.state {
            self.state = HistoryState::Recording { dirty: true };
            return CommitOutcome::Deferred;
        }
        self.append(grid);
        CommitOutcome::Recorded
    }

    fn append(&mut self, grid: &Grid) {
        self.snapshots.truncate(self.pointer + 1);
        self.snapshots.push(grid.clone());
        if self.snapshots.len() > self.limit {
            let overflow = self.snapshots.len() - self.limit;
            self.snapshots.drain(..overflow);
            log::debug!("history full, evicted {} oldest snapshot(s)", overflow);
        }
        self.pointer = self.snapshots.len() - 1;
    }

    /// Step back one snapshot. Returns the grid to install, or `None` at the start.
    pub fn undo(&mut self) -> Option<&Grid> {
        if self.pointer == 0 {
            return None;
        }
        self.suppress_next = true;
        self.pointer -= 1;
        log::debug!("undo to snapshot {}/{}", self.pointer + 1, self.snapshots.len());
        self.snapshots.get(self.pointer)
    }

    /// Step forward one snapshot. Returns the grid to install, or `None` at the end.
    pub fn redo(&mut self) -> Option<&Grid> {
        if self.pointer + 1 >= self.snapshots.len() {
            return None;
        }
        self.suppress_next = true;
        self.pointer += 1;
        log::debug!("redo to snapshot {}/{}", self.pointer + 1, self.snapshots.len());
        self.snapshots.get(self.pointer)
    }

    /// Enter the recording state for a paint stroke.
    ///
    /// A stroke already recording continues, keeping its pending changes.
    pub fn begin_stroke(&mut self) {
        if self.state == HistoryState::Idle {
            self.state = HistoryState::Recording { dirty: false };
        }
    }

    /// Leave the recording state, recording `grid` once if the stroke changed anything.
    ///
    /// Returns true if an entry was recorded.
    pub fn end_stroke(&mut self, grid: &Grid) -> bool {
        let dirty = matches!(self.state, HistoryState::Recording { dirty: true });
        self.state = HistoryState::Idle;
        if dirty {
            self.append(grid);
        }
        dirty
    }

    pub fn state(&self) -> HistoryState {
        self.state
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.snapshots.len()
    }

    /// Number of snapshots in the log.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The snapshot at the pointer.
    pub fn current(&self) -> Option<&Grid> {
        self.snapshots.get(self.pointer)
    }
}

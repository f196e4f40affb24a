//! Bounded undo/redo of committed edits

use std::collections::VecDeque;

use crate::math::Region;
use crate::voxel::grid::{GridSnapshot, VoxelGrid};

/// Default number of edits kept for undo
pub const DEFAULT_HISTORY_DEPTH: usize = 64;

/// One committed edit: the region it touched before and after
#[derive(Clone, Debug)]
pub struct EditRecord {
    /// Modifier name, for logs
    pub label: &'static str,
    pub before: GridSnapshot,
    pub after: GridSnapshot,
}

impl EditRecord {
    pub fn region(&self) -> Region {
        self.before.region()
    }
}

/// Undo/redo stacks of grid snapshots
#[derive(Debug)]
pub struct EditHistory {
    undo: VecDeque<EditRecord>,
    redo: Vec<EditRecord>,
    depth: usize,
}

impl EditHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Record an edit. Clears the redo stack; drops the oldest record
    /// once `depth` is exceeded. A zero depth records nothing.
    pub fn record(&mut self, label: &'static str, before: GridSnapshot, after: GridSnapshot) {
        self.redo.clear();
        if self.depth == 0 || before.region().is_empty() {
            return;
        }
        self.undo.push_back(EditRecord { label, before, after });
        while self.undo.len() > self.depth {
            self.undo.pop_front();
        }
    }

    /// Restore the state before the latest edit. Returns the region written.
    pub fn undo(&mut self, grid: &mut VoxelGrid) -> Option<Region> {
        let record = self.undo.pop_back()?;
        let region = grid.restore(&record.before);
        log::debug!("Undo {} over {} cells", record.label, region.volume());
        self.redo.push(record);
        Some(region)
    }

    /// Re-apply the latest undone edit. Returns the region written.
    pub fn redo(&mut self, grid: &mut VoxelGrid) -> Option<Region> {
        let record = self.redo.pop()?;
        let region = grid.restore(&record.after);
        log::debug!("Redo {} over {} cells", record.label, region.volume());
        self.undo.push_back(record);
        Some(region)
    }

    /// Forget everything (after a resize or load)
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

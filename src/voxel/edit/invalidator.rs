//! Dirty chunk tracking after edits

use std::collections::{BTreeSet, HashMap};

use crate::math::Region;
use crate::mesh::chunk::{ChunkCoord, ChunkLayout};

/// Tracks which chunks need their mesh rebuilt.
///
/// Edits report the voxel [`Region`] they touched; every chunk whose cells
/// use a voxel of that region is marked dirty and its generation bumped.
#[derive(Debug)]
pub struct DirtyRegionTracker {
    layout: ChunkLayout,
    /// Chunks needing rebuild, kept ordered for reproducible rebuilds
    dirty_chunks: BTreeSet<ChunkCoord>,
    /// Generation counters for cache invalidation
    generations: HashMap<ChunkCoord, u32>,
}

impl DirtyRegionTracker {
    /// Create a tracker with nothing dirty
    pub fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            dirty_chunks: BTreeSet::new(),
            generations: HashMap::new(),
        }
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// Switch to a new layout (after a resize). Everything becomes dirty.
    pub fn reset_layout(&mut self, layout: ChunkLayout) {
        self.layout = layout;
        self.dirty_chunks.clear();
        self.generations.clear();
        self.mark_all();
    }

    /// Mark every chunk depending on a voxel in `region`.
    /// Returns the number of chunks newly or re-marked.
    pub fn mark_region(&mut self, region: &Region) -> usize {
        let chunks = self.layout.chunks_touching(region);
        let count = chunks.len();
        for coord in chunks {
            self.mark_chunk_dirty(coord);
        }
        count
    }

    /// Mark a specific chunk as dirty and increment its generation.
    /// Coordinates outside the layout are ignored.
    pub fn mark_chunk_dirty(&mut self, coord: ChunkCoord) {
        if !self.layout.contains(coord) {
            return;
        }
        self.dirty_chunks.insert(coord);
        let generation = self.generations.entry(coord).or_insert(0);
        *generation = generation.wrapping_add(1);
    }

    pub fn mark_all(&mut self) {
        for coord in self.layout.coords() {
            self.mark_chunk_dirty(coord);
        }
    }

    /// Take all dirty chunks in coordinate order and clear the dirty set.
    pub fn take_dirty_chunks(&mut self) -> Vec<ChunkCoord> {
        std::mem::take(&mut self.dirty_chunks).into_iter().collect()
    }

    /// Get the current generation counter for a chunk.
    ///
    /// Incremented each time the chunk is marked dirty.
    pub fn generation(&self, coord: &ChunkCoord) -> u32 {
        self.generations.get(coord).copied().unwrap_or(0)
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty_chunks.is_empty()
    }

    pub fn is_chunk_dirty(&self, coord: &ChunkCoord) -> bool {
        self.dirty_chunks.contains(coord)
    }

    /// Clear all dirty state and reset generation counters.
    pub fn clear(&mut self) {
        self.dirty_chunks.clear();
        self.generations.clear();
    }

    pub fn dirty_chunk_count(&self) -> usize {
        self.dirty_chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec3, UVec3};

    fn tracker() -> DirtyRegionTracker {
        // 16 cells per axis, 4 chunks of 4 cells
        DirtyRegionTracker::new(ChunkLayout::new(UVec3::splat(17), 4))
    }

    #[test]
    fn test_new() {
        let tracker = tracker();
        assert!(!tracker.has_dirty());
        assert_eq!(tracker.dirty_chunk_count(), 0);
    }

    #[test]
    fn test_mark_chunk_dirty_multiple_times() {
        let mut tracker = tracker();
        let coord = ChunkCoord::new(1, 2, 3);

        tracker.mark_chunk_dirty(coord);
        assert_eq!(tracker.generation(&coord), 1);
        tracker.mark_chunk_dirty(coord);
        assert_eq!(tracker.generation(&coord), 2);
        assert_eq!(tracker.dirty_chunk_count(), 1);
    }

    #[test]
    fn test_out_of_layout_ignored() {
        let mut tracker = tracker();
        tracker.mark_chunk_dirty(ChunkCoord::new(4, 0, 0));
        tracker.mark_chunk_dirty(ChunkCoord::new(-1, 0, 0));
        assert!(!tracker.has_dirty());
    }

    #[test]
    fn test_region_inside_one_chunk() {
        let mut tracker = tracker();
        tracker.mark_region(&Region::new(IVec3::new(1, 1, 1), IVec3::new(2, 2, 2)));
        assert_eq!(tracker.take_dirty_chunks(), vec![ChunkCoord::new(0, 0, 0)]);
        assert!(!tracker.has_dirty());
    }

    #[test]
    fn test_region_on_chunk_border_marks_neighbors() {
        let mut tracker = tracker();
        // Voxels 4..=8 are used by cells 3..=8: chunks 0, 1 and 2 per axis
        tracker.mark_region(&Region::new(IVec3::splat(4), IVec3::splat(8)));
        assert_eq!(tracker.dirty_chunk_count(), 27);
        let chunks = tracker.take_dirty_chunks();
        assert_eq!(chunks.first(), Some(&ChunkCoord::new(0, 0, 0)));
        assert_eq!(chunks.last(), Some(&ChunkCoord::new(2, 2, 2)));
        assert!(chunks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_region_marks_nothing() {
        let mut tracker = tracker();
        assert_eq!(tracker.mark_region(&Region::EMPTY), 0);
        assert!(!tracker.has_dirty());
    }

    #[test]
    fn test_reset_layout_marks_everything() {
        let mut tracker = tracker();
        tracker.mark_chunk_dirty(ChunkCoord::new(0, 0, 0));
        tracker.reset_layout(ChunkLayout::new(UVec3::splat(9), 4));
        assert_eq!(tracker.dirty_chunk_count(), 8);
        assert_eq!(tracker.generation(&ChunkCoord::new(0, 0, 0)), 1);
    }

    #[test]
    fn test_clear() {
        let mut tracker = tracker();
        tracker.mark_all();
        assert_eq!(tracker.dirty_chunk_count(), 64);
        tracker.clear();
        assert!(!tracker.has_dirty());
        assert_eq!(tracker.generation(&ChunkCoord::new(0, 0, 0)), 0);
    }
}

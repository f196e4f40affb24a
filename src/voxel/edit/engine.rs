//! Bounded, parallel application of modifiers to a grid

use glam::{IVec3, UVec3};
use rayon::prelude::*;

use crate::math::Region;
use crate::voxel::brush::{BrushStroke, PreparedStroke};
use crate::voxel::cell::VoxelCell;
use crate::voxel::grid::{GridSnapshot, VoxelGrid};
use crate::voxel::modifier::{Modifier, VoxelSample};

/// Engine settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Run the per-voxel pass on the rayon pool
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Result of an edit staged outside the grid
#[derive(Clone, Debug)]
pub struct Preview {
    region: Region,
    cells: Vec<VoxelCell>,
}

impl Preview {
    /// Cells the preview covers
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Previewed cell at a grid coordinate
    pub fn get(&self, p: IVec3) -> Option<VoxelCell> {
        if !self.region.contains(p) {
            return None;
        }
        let d = self.region.dims();
        let l = (p - self.region.min).as_uvec3();
        self.cells
            .get(l.x as usize + l.y as usize * d.x as usize + l.z as usize * d.x as usize * d.y as usize)
            .copied()
    }

    /// A copy of `grid` with the preview applied, for display
    pub fn overlay(&self, grid: &VoxelGrid) -> VoxelGrid {
        let mut shown = grid.clone();
        shown.restore(&self.clone().into_snapshot());
        shown
    }

    pub fn into_snapshot(self) -> GridSnapshot {
        GridSnapshot::from_cells(self.region, self.cells).unwrap_or_else(GridSnapshot::empty)
    }
}

/// Applies `(stroke, modifier)` pairs to voxel grids
#[derive(Clone, Copy, Debug, Default)]
pub struct ModificationEngine {
    config: EngineConfig,
}

impl ModificationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cells a stroke can touch in `grid`, margin included and clamped
    pub fn affected_region(&self, grid: &VoxelGrid, stroke: &BrushStroke) -> Region {
        stroke.prepare(grid).affected_region(grid.resolution())
    }

    /// Modify every cell in the stroke's region. Returns the touched region,
    /// empty when the stroke misses the grid.
    pub fn apply(&self, grid: &mut VoxelGrid, stroke: &BrushStroke, modifier: &Modifier) -> Region {
        let prepared = stroke.prepare(grid);
        let region = prepared.affected_region(grid.resolution());
        if region.is_empty() {
            log::debug!("{} stroke misses the grid, nothing to do", modifier.name());
            return Region::EMPTY;
        }
        let snapshot = self.snapshot_for(grid, &region, modifier);
        let res = grid.resolution();

        let changed = self.run(
            grid.cells_mut(),
            Region::full(res),
            region,
            &prepared,
            modifier,
            snapshot.as_ref(),
        );
        log::debug!(
            "{} applied over {:?}..{:?}: {} of {} cells changed",
            modifier.name(),
            region.min.to_array(),
            region.max.to_array(),
            changed,
            region.volume()
        );
        region
    }

    /// Evaluate an edit into a separate buffer. `grid` is only read.
    pub fn apply_to_preview(&self, grid: &VoxelGrid, stroke: &BrushStroke, modifier: &Modifier) -> Preview {
        let prepared = stroke.prepare(grid);
        let region = prepared.affected_region(grid.resolution());
        if region.is_empty() {
            return Preview { region: Region::EMPTY, cells: Vec::new() };
        }
        let snapshot = self.snapshot_for(grid, &region, modifier);
        let mut cells = grid.snapshot(&region).cells().to_vec();

        self.run(&mut cells, region, region, &prepared, modifier, snapshot.as_ref());
        Preview { region, cells }
    }

    /// Copy a preview into the grid. Returns the region written.
    pub fn commit_preview(&self, grid: &mut VoxelGrid, preview: Preview) -> Region {
        if preview.is_empty() {
            return Region::EMPTY;
        }
        let written = grid.restore(&preview.into_snapshot());
        log::debug!("Committed preview over {} cells", written.volume());
        written
    }

    fn snapshot_for(&self, grid: &VoxelGrid, region: &Region, modifier: &Modifier) -> Option<GridSnapshot> {
        modifier
            .needs_snapshot()
            .then(|| grid.snapshot(&region.expanded(modifier.snapshot_margin())))
    }

    /// Core pass. `buffer` holds the cells of `layout` (x fastest); every
    /// cell of `region` (inside `layout`) is replaced. Work is split into
    /// z slabs, each owned by one worker. Returns the number of cells whose
    /// contents changed.
    fn run(
        &self,
        buffer: &mut [VoxelCell],
        layout: Region,
        region: Region,
        prepared: &PreparedStroke<'_>,
        modifier: &Modifier,
        snapshot: Option<&GridSnapshot>,
    ) -> usize {
        let dims: UVec3 = layout.dims();
        let row = dims.x as usize;
        let slab_len = row * dims.y as usize;
        let first = (region.min.z - layout.min.z) as usize;
        let depth = region.dims().z as usize;

        let pass = |(i, slab): (usize, &mut [VoxelCell])| -> usize {
            let z = layout.min.z + i as i32;
            let mut changed = 0;
            for y in region.min.y..=region.max.y {
                let row_start = (y - layout.min.y) as usize * row;
                for x in region.min.x..=region.max.x {
                    let idx = row_start + (x - layout.min.x) as usize;
                    let pos = IVec3::new(x, y, z);
                    let current = slab[idx];
                    let sample = VoxelSample::new(pos, current, prepared.distance(pos.as_vec3()));
                    let next = modifier.apply(&sample, snapshot).sanitized();
                    if next != current {
                        slab[idx] = next;
                        changed += 1;
                    }
                }
            }
            changed
        };

        if self.config.parallel {
            buffer
                .par_chunks_mut(slab_len)
                .enumerate()
                .skip(first)
                .take(depth)
                .map(pass)
                .sum()
        } else {
            buffer
                .chunks_mut(slab_len)
                .enumerate()
                .skip(first)
                .take(depth)
                .map(pass)
                .sum()
        }
    }
}

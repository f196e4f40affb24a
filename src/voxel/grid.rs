//! Dense voxel grid and immutable snapshots of it

use std::sync::Arc;

use crate::core::types::{IVec3, Mat4, Result, UVec3, Vec3};
use crate::core::Error;
use crate::math::{Pose, Region};
use crate::mesh::tables::CORNER_OFFSETS;
use super::cell::VoxelCell;

/// Smallest allowed resolution per axis; cells are sampled as 2x2x2 blocks.
pub const MIN_RESOLUTION: u32 = 2;

/// Dense 3D array of voxel cells, x varying fastest.
///
/// Grid coordinates are integer positions with unit spacing. `frame` places
/// the grid in the world: it maps grid-local points to world space.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    res: UVec3,
    cells: Vec<VoxelCell>,
    frame: Pose,
    fill: VoxelCell,
}

impl VoxelGrid {
    /// Create a grid filled with empty cells
    pub fn new(res: UVec3) -> Result<Self> {
        Self::with_fill(res, VoxelCell::EMPTY)
    }

    /// Create a grid where every cell starts as `fill`
    pub fn with_fill(res: UVec3, fill: VoxelCell) -> Result<Self> {
        validate_resolution(res)?;
        let fill = fill.sanitized();
        Ok(Self {
            res,
            cells: vec![fill; cell_count(res)],
            frame: Pose::IDENTITY,
            fill,
        })
    }

    /// Build a grid from a flat cell array in x-fastest order
    pub fn from_cells(res: UVec3, cells: Vec<VoxelCell>) -> Result<Self> {
        validate_resolution(res)?;
        if cells.len() != cell_count(res) {
            return Err(Error::Persist(format!(
                "cell count {} does not match resolution {:?}",
                cells.len(),
                res.to_array()
            )));
        }
        let cells = cells.into_iter().map(VoxelCell::sanitized).collect();
        Ok(Self {
            res,
            cells,
            frame: Pose::IDENTITY,
            fill: VoxelCell::EMPTY,
        })
    }

    pub fn with_frame(mut self, frame: Pose) -> Self {
        self.frame = frame;
        self
    }

    pub fn resolution(&self) -> UVec3 {
        self.res
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell used for newly exposed space on resize
    pub fn fill_cell(&self) -> VoxelCell {
        self.fill
    }

    pub fn frame(&self) -> &Pose {
        &self.frame
    }

    pub fn set_frame(&mut self, frame: Pose) {
        self.frame = frame;
    }

    /// Grid-local to world transform
    pub fn grid_to_world(&self) -> Mat4 {
        self.frame.matrix()
    }

    /// World to grid-local transform
    pub fn world_to_grid(&self) -> Mat4 {
        self.frame.inverse_matrix()
    }

    /// Region covering every cell
    pub fn bounds(&self) -> Region {
        Region::full(self.res)
    }

    /// Cells in one z layer
    pub fn slab_len(&self) -> usize {
        self.res.x as usize * self.res.y as usize
    }

    /// Flat index of an in-bounds coordinate
    #[inline]
    pub fn index(&self, p: IVec3) -> Option<usize> {
        if p.cmplt(IVec3::ZERO).any() || p.cmpge(self.res.as_ivec3()).any() {
            return None;
        }
        Some(p.x as usize + p.y as usize * self.res.x as usize + p.z as usize * self.slab_len())
    }

    /// Read a cell, `None` when out of bounds
    #[inline]
    pub fn get(&self, p: IVec3) -> Option<VoxelCell> {
        self.index(p).map(|i| self.cells[i])
    }

    /// Read a cell, clamping the coordinate into the grid
    #[inline]
    pub fn get_clamped(&self, p: IVec3) -> VoxelCell {
        let p = p.clamp(IVec3::ZERO, self.res.as_ivec3() - IVec3::ONE);
        self.cells[p.x as usize + p.y as usize * self.res.x as usize + p.z as usize * self.slab_len()]
    }

    /// Replace a cell. Out-of-bounds writes are ignored and return false.
    pub fn set(&mut self, p: IVec3, cell: VoxelCell) -> bool {
        match self.index(p) {
            Some(i) => {
                self.cells[i] = cell.sanitized();
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[VoxelCell] {
        &self.cells
    }

    /// Raw cell bytes (8 per cell), e.g. for a GPU volume upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Overwrite every cell from a flat x-fastest array of matching length.
    /// Frame and fill cell are kept.
    pub fn load_cells(&mut self, cells: &[VoxelCell]) -> Result<()> {
        if cells.len() != self.cells.len() {
            return Err(Error::Persist(format!(
                "cell count {} does not match resolution {:?}",
                cells.len(),
                self.res.to_array()
            )));
        }
        for (dst, src) in self.cells.iter_mut().zip(cells) {
            *dst = src.sanitized();
        }
        Ok(())
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [VoxelCell] {
        &mut self.cells
    }

    /// Overwrite every cell
    pub fn fill(&mut self, cell: VoxelCell) {
        self.cells.fill(cell.sanitized());
    }

    /// The 8 corners of the unit cell whose minimum corner is `origin`,
    /// in Marching Cubes corner order. `None` unless all 8 are in bounds.
    pub fn cell_corners(&self, origin: IVec3) -> Option<[VoxelCell; 8]> {
        let mut corners = [VoxelCell::EMPTY; 8];
        for (corner, offset) in corners.iter_mut().zip(CORNER_OFFSETS.iter()) {
            *corner = self.get(origin + IVec3::from_array(*offset))?;
        }
        Some(corners)
    }

    /// Immutable copy of a region (clamped to the grid)
    pub fn snapshot(&self, region: &Region) -> GridSnapshot {
        let region = region.clamped(self.res);
        let cells: Vec<VoxelCell> = region.iter().filter_map(|p| self.get(p)).collect();
        GridSnapshot {
            region,
            cells: cells.into(),
        }
    }

    /// Immutable copy of the whole grid
    pub fn snapshot_all(&self) -> GridSnapshot {
        GridSnapshot {
            region: self.bounds(),
            cells: self.cells.clone().into(),
        }
    }

    /// Write a snapshot's cells back at their recorded coordinates.
    /// Cells that fall outside the grid are dropped. Returns the written region.
    pub fn restore(&mut self, snapshot: &GridSnapshot) -> Region {
        let written = snapshot.region.clamped(self.res);
        if written.is_empty() {
            return Region::EMPTY;
        }
        for p in written.iter() {
            if let (Some(i), Some(cell)) = (self.index(p), snapshot.get(p)) {
                self.cells[i] = cell;
            }
        }
        written
    }

    /// Reallocate at a new resolution.
    ///
    /// With `preserve_overlap` the overlapping sub-volume is copied across and
    /// the rest is filled; otherwise everything is reset. Shrinking silently
    /// drops cells beyond the new bounds.
    pub fn resize(&mut self, new_res: UVec3, preserve_overlap: bool) -> Result<()> {
        validate_resolution(new_res)?;
        let mut cells = vec![self.fill; cell_count(new_res)];

        if preserve_overlap {
            let overlap = self.res.min(new_res);
            let new_slab = new_res.x as usize * new_res.y as usize;
            for z in 0..overlap.z as usize {
                for y in 0..overlap.y as usize {
                    let src = y * self.res.x as usize + z * self.slab_len();
                    let dst = y * new_res.x as usize + z * new_slab;
                    let run = overlap.x as usize;
                    cells[dst..dst + run].copy_from_slice(&self.cells[src..src + run]);
                }
            }
        }

        log::info!(
            "Resized voxel grid {:?} -> {:?} (preserve_overlap={})",
            self.res.to_array(),
            new_res.to_array(),
            preserve_overlap
        );
        self.res = new_res;
        self.cells = cells;
        Ok(())
    }
}

/// Immutable, cheaply clonable copy of a grid region.
///
/// Used as the read side of edits that look at neighbors, as clipboard
/// contents and as undo payloads. Writers never alias it.
#[derive(Clone, Debug)]
pub struct GridSnapshot {
    region: Region,
    cells: Arc<[VoxelCell]>,
}

impl GridSnapshot {
    /// Wrap cells laid out x-fastest over `region`
    pub fn from_cells(region: Region, cells: Vec<VoxelCell>) -> Option<Self> {
        (cells.len() == region.volume()).then(|| Self {
            region,
            cells: cells.into(),
        })
    }

    /// Snapshot covering nothing
    pub fn empty() -> Self {
        Self {
            region: Region::EMPTY,
            cells: Arc::from(Vec::new()),
        }
    }

    /// Grid coordinates this snapshot covers
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn dims(&self) -> UVec3 {
        self.region.dims()
    }

    pub fn cells(&self) -> &[VoxelCell] {
        &self.cells
    }

    /// Same cells recorded at a shifted location
    pub fn translated(&self, offset: IVec3) -> GridSnapshot {
        GridSnapshot {
            region: self.region.translated(offset),
            cells: Arc::clone(&self.cells),
        }
    }

    #[inline]
    fn local_index(&self, p: IVec3) -> Option<usize> {
        if !self.region.contains(p) {
            return None;
        }
        let d = self.dims();
        let l = (p - self.region.min).as_uvec3();
        Some(l.x as usize + l.y as usize * d.x as usize + l.z as usize * d.x as usize * d.y as usize)
    }

    /// Read a recorded cell
    #[inline]
    pub fn get(&self, p: IVec3) -> Option<VoxelCell> {
        self.local_index(p).map(|i| self.cells[i])
    }

    /// Read with the coordinate clamped into the recorded region
    #[inline]
    pub fn get_clamped(&self, p: IVec3) -> VoxelCell {
        if self.region.is_empty() {
            return VoxelCell::EMPTY;
        }
        let p = p.clamp(self.region.min, self.region.max);
        self.get(p).unwrap_or(VoxelCell::EMPTY)
    }

    /// Trilinear sample of the field value at a fractional position, color
    /// from the nearest cell. `None` outside the recorded region.
    pub fn sample(&self, p: Vec3) -> Option<VoxelCell> {
        if self.region.is_empty() {
            return None;
        }
        let lo = self.region.min.as_vec3();
        let hi = self.region.max.as_vec3();
        const TOLERANCE: f32 = 1e-4;
        if p.cmplt(lo - TOLERANCE).any() || p.cmpgt(hi + TOLERANCE).any() {
            return None;
        }
        let p = p.clamp(lo, hi);
        let base = p.floor().as_ivec3();
        let f = p - base.as_vec3();

        let mut value = 0.0;
        for dz in 0..2 {
            for dy in 0..2 {
                for dx in 0..2 {
                    let w = if dx == 1 { f.x } else { 1.0 - f.x }
                        * if dy == 1 { f.y } else { 1.0 - f.y }
                        * if dz == 1 { f.z } else { 1.0 - f.z };
                    if w > 0.0 {
                        value += w * self.get_clamped(base + IVec3::new(dx, dy, dz)).value;
                    }
                }
            }
        }
        let color = self.get_clamped(p.round().as_ivec3()).color;
        Some(VoxelCell::new(value, color))
    }
}

pub(crate) fn validate_resolution(res: UVec3) -> Result<()> {
    if res.cmplt(UVec3::splat(MIN_RESOLUTION)).any() {
        return Err(Error::InvalidResolution { x: res.x, y: res.y, z: res.z });
    }
    Ok(())
}

fn cell_count(res: UVec3) -> usize {
    res.x as usize * res.y as usize * res.z as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::cell::Rgba8;

    fn solid(v: f32) -> VoxelCell {
        VoxelCell::new(v, Rgba8::rgb(10, 20, 30))
    }

    #[test]
    fn test_byte_view_and_load_cells() {
        let mut grid = VoxelGrid::new(UVec3::splat(2)).unwrap();
        assert_eq!(grid.as_bytes().len(), 8 * 8);
        let first: &VoxelCell = bytemuck::from_bytes(&grid.as_bytes()[..8]);
        assert_eq!(*first, VoxelCell::EMPTY);

        let cells = vec![VoxelCell::new(5.0, Rgba8::BLACK); 8];
        grid.load_cells(&cells).unwrap();
        assert_eq!(grid.get(IVec3::ONE).unwrap().value, 1.0);
        assert!(grid.load_cells(&cells[..7]).is_err());
    }

    #[test]
    fn test_rejects_small_resolution() {
        assert!(matches!(
            VoxelGrid::new(UVec3::new(1, 4, 4)),
            Err(Error::InvalidResolution { x: 1, .. })
        ));
        assert!(VoxelGrid::new(UVec3::new(4, 0, 4)).is_err());
        assert!(VoxelGrid::new(UVec3::splat(2)).is_ok());
    }

    #[test]
    fn test_new_is_empty_outside() {
        let grid = VoxelGrid::new(UVec3::new(3, 4, 5)).unwrap();
        assert_eq!(grid.len(), 60);
        assert!(grid.cells().iter().all(|c| c.value == -1.0));
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut grid = VoxelGrid::new(UVec3::splat(4)).unwrap();
        assert!(grid.get(IVec3::new(-1, 0, 0)).is_none());
        assert!(grid.get(IVec3::new(0, 4, 0)).is_none());
        assert!(!grid.set(IVec3::new(4, 0, 0), solid(1.0)));
        assert!(grid.cells().iter().all(|c| *c == VoxelCell::EMPTY));
    }

    #[test]
    fn test_set_and_get_clamped() {
        let mut grid = VoxelGrid::new(UVec3::splat(4)).unwrap();
        assert!(grid.set(IVec3::new(3, 3, 3), solid(0.5)));
        assert_eq!(grid.get(IVec3::new(3, 3, 3)).unwrap().value, 0.5);
        assert_eq!(grid.get_clamped(IVec3::new(9, 9, 9)).value, 0.5);
    }

    #[test]
    fn test_set_sanitizes() {
        let mut grid = VoxelGrid::new(UVec3::splat(2)).unwrap();
        grid.set(IVec3::ZERO, solid(f32::NAN));
        assert_eq!(grid.get(IVec3::ZERO).unwrap().value, -1.0);
    }

    #[test]
    fn test_cell_corners_order() {
        let mut grid = VoxelGrid::new(UVec3::splat(3)).unwrap();
        grid.set(IVec3::new(2, 2, 2), solid(1.0));
        let corners = grid.cell_corners(IVec3::new(1, 1, 1)).unwrap();
        // Corner 6 is the (+1, +1, +1) corner
        assert_eq!(corners[6].value, 1.0);
        assert!(corners.iter().enumerate().all(|(i, c)| i == 6 || c.value == -1.0));
        assert!(grid.cell_corners(IVec3::new(2, 0, 0)).is_none());
    }

    #[test]
    fn test_resize_preserves_overlap() {
        crate::core::logging::try_init_for_tests();
        let mut grid = VoxelGrid::new(UVec3::splat(4)).unwrap();
        grid.set(IVec3::new(1, 2, 3), solid(0.75));
        grid.set(IVec3::new(3, 3, 3), solid(0.25));

        grid.resize(UVec3::new(6, 3, 4), true).unwrap();
        assert_eq!(grid.resolution(), UVec3::new(6, 3, 4));
        assert_eq!(grid.get(IVec3::new(1, 2, 3)).unwrap().value, 0.75);
        // (3,3,3) fell outside the new y range
        assert_eq!(grid.cells().iter().filter(|c| c.value > 0.0).count(), 1);
        assert_eq!(grid.get(IVec3::new(5, 0, 0)).unwrap(), VoxelCell::EMPTY);
    }

    #[test]
    fn test_resize_without_preserve_resets() {
        let mut grid = VoxelGrid::new(UVec3::splat(4)).unwrap();
        grid.set(IVec3::ONE, solid(0.75));
        grid.resize(UVec3::splat(5), false).unwrap();
        assert!(grid.cells().iter().all(|c| *c == VoxelCell::EMPTY));
        assert!(grid.resize(UVec3::new(5, 1, 5), true).is_err());
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut grid = VoxelGrid::new(UVec3::splat(5)).unwrap();
        grid.set(IVec3::new(2, 2, 2), solid(0.5));
        let snap = grid.snapshot(&Region::new(IVec3::ONE, IVec3::splat(3)));
        assert_eq!(snap.dims(), UVec3::splat(3));
        assert_eq!(snap.get(IVec3::new(2, 2, 2)).unwrap().value, 0.5);
        assert!(snap.get(IVec3::ZERO).is_none());

        grid.fill(VoxelCell::EMPTY);
        let written = grid.restore(&snap);
        assert_eq!(written, snap.region());
        assert_eq!(grid.get(IVec3::new(2, 2, 2)).unwrap().value, 0.5);
    }

    #[test]
    fn test_snapshot_clamps_to_grid() {
        let grid = VoxelGrid::new(UVec3::splat(4)).unwrap();
        let snap = grid.snapshot(&Region::new(IVec3::splat(-2), IVec3::splat(1)));
        assert_eq!(snap.region(), Region::new(IVec3::ZERO, IVec3::ONE));
        assert_eq!(snap.cells().len(), 8);
    }

    #[test]
    fn test_snapshot_sample_trilinear() {
        let mut grid = VoxelGrid::new(UVec3::new(2, 2, 2)).unwrap();
        grid.set(IVec3::new(1, 0, 0), solid(1.0));
        grid.set(IVec3::new(1, 1, 0), solid(1.0));
        grid.set(IVec3::new(1, 0, 1), solid(1.0));
        grid.set(IVec3::new(1, 1, 1), solid(1.0));
        let snap = grid.snapshot_all();

        let mid = snap.sample(Vec3::splat(0.5)).unwrap();
        assert!(mid.value.abs() < 1e-6);
        let near_solid = snap.sample(Vec3::new(0.75, 0.5, 0.5)).unwrap();
        assert!((near_solid.value - 0.5).abs() < 1e-6);
        assert!(snap.sample(Vec3::new(2.5, 0.0, 0.0)).is_none());
    }
}

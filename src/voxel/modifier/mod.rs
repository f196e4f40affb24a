//! Per-voxel modification operators
//!
//! A [`Modifier`] maps `(position, current cell, shape distance)` to a new
//! cell. Operators that look at neighbors read from an immutable
//! [`GridSnapshot`] of the pre-edit grid, never from the grid being written.

pub mod copy;
pub mod paint;
pub mod roughen;
pub mod smooth;
pub mod terrain;

use glam::IVec3;

use crate::voxel::cell::{Rgba8, VoxelCell};
use crate::voxel::grid::GridSnapshot;

pub use copy::RegionCopy;
pub use paint::{Falloff, PaintBrush};
pub use roughen::Roughen;
pub use smooth::Smooth;
pub use terrain::{TerrainImport, TerrainLayer};

/// Everything a modifier sees about one voxel
#[derive(Clone, Copy, Debug)]
pub struct VoxelSample {
    /// Grid coordinate
    pub pos: IVec3,
    /// Cell value before this pass
    pub current: VoxelCell,
    /// Outside-positive shape distance at `pos`
    pub distance: f32,
}

impl VoxelSample {
    pub fn new(pos: IVec3, current: VoxelCell, distance: f32) -> Self {
        Self { pos, current, distance }
    }

    #[inline]
    pub fn inside_shape(&self) -> bool {
        self.distance <= 0.0
    }
}

/// Grid-space height window for [`Modifier::HeightClamp`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeightRange {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl HeightRange {
    pub fn new(min: Option<f32>, max: Option<f32>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, y: f32) -> bool {
        self.min.is_none_or(|min| y >= min) && self.max.is_none_or(|max| y <= max)
    }
}

/// Operator applied to every voxel of an edit region
#[derive(Clone, Debug)]
pub enum Modifier {
    /// Add solid. `color` is written where the shape wins.
    Union { color: Option<Rgba8> },
    /// Carve solid away
    Subtract,
    Paint(PaintBrush),
    Smooth(Smooth),
    Roughen(Roughen),
    RegionCopy(RegionCopy),
    /// Delegates to `inner` only for voxels whose y lies in `range`
    HeightClamp { inner: Box<Modifier>, range: HeightRange },
    TerrainImport(TerrainImport),
}

impl Modifier {
    pub fn union() -> Self {
        Modifier::Union { color: None }
    }

    pub fn union_colored(color: Rgba8) -> Self {
        Modifier::Union { color: Some(color) }
    }

    pub fn subtract() -> Self {
        Modifier::Subtract
    }

    /// Restrict this modifier to a band of grid heights
    pub fn height_clamped(self, min: Option<f32>, max: Option<f32>) -> Self {
        Modifier::HeightClamp {
            inner: Box::new(self),
            range: HeightRange::new(min, max),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Union { .. } => "union",
            Modifier::Subtract => "subtract",
            Modifier::Paint(_) => "paint",
            Modifier::Smooth(_) => "smooth",
            Modifier::Roughen(_) => "roughen",
            Modifier::RegionCopy(_) => "region-copy",
            Modifier::HeightClamp { inner, .. } => inner.name(),
            Modifier::TerrainImport(_) => "terrain-import",
        }
    }

    /// Whether [`Modifier::apply`] needs a snapshot of the pre-edit grid
    pub fn needs_snapshot(&self) -> bool {
        match self {
            Modifier::Smooth(_) => true,
            Modifier::HeightClamp { inner, .. } => inner.needs_snapshot(),
            _ => false,
        }
    }

    /// Cells beyond the edit region the snapshot must cover
    pub fn snapshot_margin(&self) -> i32 {
        match self {
            Modifier::Smooth(smooth) => smooth.kernel_radius(),
            Modifier::HeightClamp { inner, .. } => inner.snapshot_margin(),
            _ => 0,
        }
    }

    /// New cell for one voxel. The result is sanitized by the caller.
    ///
    /// `snapshot` is the pre-edit grid around the edit region and must be
    /// provided when [`Modifier::needs_snapshot`] is true; without it
    /// neighborhood operators leave the cell unchanged.
    pub fn apply(&self, sample: &VoxelSample, snapshot: Option<&GridSnapshot>) -> VoxelCell {
        match self {
            Modifier::Union { color } => union(sample, *color),
            Modifier::Subtract => subtract(sample),
            Modifier::Paint(brush) => brush.apply(sample),
            Modifier::Smooth(smooth) => match snapshot {
                Some(snapshot) => smooth.apply(sample, snapshot),
                None => sample.current,
            },
            Modifier::Roughen(roughen) => roughen.apply(sample),
            Modifier::RegionCopy(copy) => copy.apply(sample),
            Modifier::HeightClamp { inner, range } => {
                if range.contains(sample.pos.y as f32) {
                    inner.apply(sample, snapshot)
                } else {
                    sample.current
                }
            }
            Modifier::TerrainImport(import) => import.apply(sample),
        }
    }
}

/// `max(current, -distance)`: whichever field is more inside wins
#[inline]
fn union(sample: &VoxelSample, color: Option<Rgba8>) -> VoxelCell {
    let shape = -sample.distance;
    if shape > sample.current.value {
        VoxelCell::new(shape, color.unwrap_or(sample.current.color))
    } else {
        sample.current
    }
}

/// `min(current, distance)`: whichever field is more outside wins
#[inline]
fn subtract(sample: &VoxelSample) -> VoxelCell {
    sample.current.with_value(sample.current.value.min(sample.distance))
}

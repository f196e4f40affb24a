//! Copy cells from a snapshot under an arbitrary transform

use glam::{IVec3, Mat4};

use crate::voxel::cell::VoxelCell;
use crate::voxel::grid::GridSnapshot;
use super::VoxelSample;

/// Overwrites destination cells with resampled source cells.
///
/// Used for paste (pure translation) and for rebuilding a grid at another
/// resolution (scaling).
#[derive(Clone, Debug)]
pub struct RegionCopy {
    source: GridSnapshot,
    /// Destination grid coordinates to source grid coordinates
    dest_to_source: Mat4,
    /// 1 replaces, lower values blend with the existing cell
    blend: f32,
}

impl RegionCopy {
    pub fn new(source: GridSnapshot, dest_to_source: Mat4) -> Self {
        Self {
            source,
            dest_to_source,
            blend: 1.0,
        }
    }

    /// Paste `source` so that its minimum corner lands on `dest_min`
    pub fn paste_at(source: GridSnapshot, dest_min: IVec3) -> Self {
        let shift = (source.region().min - dest_min).as_vec3();
        Self::new(source, Mat4::from_translation(shift))
    }

    pub fn with_blend(mut self, blend: f32) -> Self {
        self.blend = blend.clamp(0.0, 1.0);
        self
    }

    pub fn source(&self) -> &GridSnapshot {
        &self.source
    }

    pub fn dest_to_source(&self) -> &Mat4 {
        &self.dest_to_source
    }

    pub fn apply(&self, sample: &VoxelSample) -> VoxelCell {
        if !sample.inside_shape() {
            return sample.current;
        }
        let src = self.dest_to_source.transform_point3(sample.pos.as_vec3());
        let Some(copied) = self.source.sample(src) else {
            return sample.current;
        };
        if self.blend >= 1.0 {
            return copied;
        }
        let value = sample.current.value + (copied.value - sample.current.value) * self.blend;
        VoxelCell::new(value, sample.current.color.lerp(copied.color, self.blend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{UVec3, Vec3};
    use crate::math::Region;
    use crate::voxel::cell::Rgba8;
    use crate::voxel::grid::VoxelGrid;

    fn source() -> GridSnapshot {
        let mut grid = VoxelGrid::new(UVec3::splat(4)).unwrap();
        grid.set(IVec3::new(1, 1, 1), VoxelCell::new(0.75, Rgba8::rgb(9, 8, 7)));
        grid.snapshot(&Region::new(IVec3::ONE, IVec3::splat(2)))
    }

    #[test]
    fn test_paste_translates() {
        let copy = RegionCopy::paste_at(source(), IVec3::new(5, 0, 2));
        let s = VoxelSample::new(IVec3::new(5, 0, 2), VoxelCell::EMPTY, -1.0);
        let out = copy.apply(&s);
        assert_eq!(out.value, 0.75);
        assert_eq!(out.color, Rgba8::rgb(9, 8, 7));
    }

    #[test]
    fn test_outside_source_is_untouched() {
        let copy = RegionCopy::paste_at(source(), IVec3::ZERO);
        let s = VoxelSample::new(IVec3::new(3, 0, 0), VoxelCell::EMPTY, -1.0);
        assert_eq!(copy.apply(&s), VoxelCell::EMPTY);
    }

    #[test]
    fn test_scaled_copy_interpolates() {
        let copy = RegionCopy::new(source(), Mat4::from_scale(Vec3::splat(0.5)));
        // Dest (3,2,2) maps to source (1.5,1,1): halfway between 0.75 and -1
        let s = VoxelSample::new(IVec3::new(3, 2, 2), VoxelCell::EMPTY, -1.0);
        assert!((copy.apply(&s).value + 0.125).abs() < 1e-5);
    }

    #[test]
    fn test_blend() {
        let copy = RegionCopy::paste_at(source(), IVec3::ZERO).with_blend(0.5);
        let s = VoxelSample::new(IVec3::ZERO, VoxelCell::new(0.25, Rgba8::rgb(9, 8, 7)), -1.0);
        assert!((copy.apply(&s).value - 0.5).abs() < 1e-6);
    }
}

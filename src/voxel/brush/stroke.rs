//! Brush shapes placed in the world, and their per-edit prepared form

use std::sync::Arc;

use glam::{Mat4, Quat, UVec3, Vec3};

use crate::math::{Aabb, Pose, Region};
use crate::voxel::grid::VoxelGrid;
use super::heightmap::Heightmap;
use super::primitive::{BrushShape, RockParams};

/// Cells of safety margin added around a stroke's grid footprint
pub const BOUNDS_MARGIN: i32 = 1;

/// A brush shape with a world pose
#[derive(Debug, Clone)]
pub struct BrushStroke {
    /// The primitive shape, in its local frame
    pub shape: BrushShape,
    /// World-space placement (position, rotation, scale)
    pub pose: Pose,
}

impl BrushStroke {
    pub fn new(shape: BrushShape, pose: Pose) -> Self {
        Self { shape, pose }
    }

    /// Create a sphere stroke
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::new(BrushShape::Sphere { radius }, Pose::at(center))
    }

    /// Create a box stroke
    pub fn box_stroke(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(BrushShape::Box { half_extents }, Pose::at(center))
    }

    /// Create a rounded tube from start to end points (world space)
    pub fn tube(start: Vec3, end: Vec3, radius: f32) -> Self {
        let center = (start + end) * 0.5;
        let shape = BrushShape::Tube {
            start: start - center,
            end: end - center,
            radius,
            floor: None,
        };
        Self::new(shape, Pose::at(center))
    }

    /// Tube whose part below world height `floor_y` is left out
    pub fn tunnel(start: Vec3, end: Vec3, radius: f32, floor_y: f32) -> Self {
        let center = (start + end) * 0.5;
        let shape = BrushShape::Tube {
            start: start - center,
            end: end - center,
            radius,
            floor: Some(floor_y - center.y),
        };
        Self::new(shape, Pose::at(center))
    }

    /// Heightfield solid centered at `center`
    pub fn heightfield(center: Vec3, half_extents: Vec3, map: Arc<Heightmap>) -> Self {
        Self::new(BrushShape::Heightfield { map, half_extents }, Pose::at(center))
    }

    /// Procedural rock centered at `center`
    pub fn rock(center: Vec3, params: RockParams) -> Self {
        Self::new(BrushShape::Rock(params), Pose::at(center))
    }

    /// Set rotation (builder pattern)
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.pose.rotation = rotation;
        self
    }

    /// Set non-uniform scale (builder pattern)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.pose.scale = scale;
        self
    }

    /// Move to a new world position
    pub fn moved_to(mut self, position: Vec3) -> Self {
        self.pose.position = position;
        self
    }

    /// Conservative world-space bounds
    pub fn world_bounds(&self) -> Aabb {
        self.shape.local_bounds().transformed(&self.pose.matrix())
    }

    /// Signed distance from a world-space point, recomputing the transform.
    /// Use [`BrushStroke::prepare`] for batches.
    pub fn distance_world(&self, world_point: Vec3) -> f32 {
        let local = self.pose.inverse_matrix().transform_point3(world_point);
        self.shape.distance(local)
    }

    /// Resolve the stroke against a grid's frame for one edit.
    ///
    /// Caches `shape_world_to_local * grid_local_to_world` so integer grid
    /// coordinates can be fed to [`PreparedStroke::distance`] directly.
    pub fn prepare(&self, grid: &VoxelGrid) -> PreparedStroke<'_> {
        self.prepare_with_frame(&grid.grid_to_world())
    }

    /// Same as [`BrushStroke::prepare`] with an explicit grid-to-world matrix
    pub fn prepare_with_frame(&self, grid_to_world: &Mat4) -> PreparedStroke<'_> {
        let local_to_world = self.pose.matrix();
        let grid_to_local = local_to_world.inverse() * *grid_to_world;
        let local_to_grid = grid_to_world.inverse() * local_to_world;
        PreparedStroke {
            shape: &self.shape,
            grid_to_local,
            grid_bounds: self.shape.local_bounds().transformed(&local_to_grid),
        }
    }
}

/// A stroke resolved against a grid frame. Immutable and shareable across
/// worker threads.
#[derive(Debug, Clone, Copy)]
pub struct PreparedStroke<'a> {
    shape: &'a BrushShape,
    grid_to_local: Mat4,
    grid_bounds: Aabb,
}

impl PreparedStroke<'_> {
    /// Signed distance at a grid-space point
    #[inline]
    pub fn distance(&self, grid_point: Vec3) -> f32 {
        self.shape.distance(self.grid_to_local.transform_point3(grid_point))
    }

    /// Stroke bounds in grid space
    pub fn grid_bounds(&self) -> Aabb {
        self.grid_bounds
    }

    /// Cached grid-to-shape-local matrix
    pub fn grid_to_local(&self) -> &Mat4 {
        &self.grid_to_local
    }

    /// Integer cells the stroke can touch, with the safety margin, clamped
    /// to a grid of resolution `res`. Empty when the stroke misses the grid.
    pub fn affected_region(&self, res: UVec3) -> Region {
        Region::from_grid_aabb(&self.grid_bounds, BOUNDS_MARGIN).clamped(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    #[test]
    fn test_sphere_stroke() {
        let stroke = BrushStroke::sphere(Vec3::new(5.0, 5.0, 5.0), 2.0);

        assert!(stroke.distance_world(Vec3::new(5.0, 5.0, 5.0)) < 0.0);
        assert!(stroke.distance_world(Vec3::new(6.0, 5.0, 5.0)) < 0.0);
        assert!(stroke.distance_world(Vec3::new(8.0, 5.0, 5.0)) > 0.0);
    }

    #[test]
    fn test_tube_stroke() {
        let stroke = BrushStroke::tube(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), 0.5);

        assert!(stroke.distance_world(Vec3::new(0.0, 1.0, 0.0)) < 0.0);
        assert!(stroke.distance_world(Vec3::new(0.3, 1.0, 0.0)) < 0.0);
        assert!(stroke.distance_world(Vec3::new(1.0, 1.0, 0.0)) > 0.0);
    }

    #[test]
    fn test_tunnel_floor_in_world_space() {
        let stroke = BrushStroke::tunnel(Vec3::new(0.0, 5.0, 0.0), Vec3::new(6.0, 5.0, 0.0), 2.0, 4.0);
        assert!(stroke.distance_world(Vec3::new(3.0, 4.5, 0.0)) < 0.0);
        assert!(stroke.distance_world(Vec3::new(3.0, 3.5, 0.0)) > 0.0);
    }

    #[test]
    fn test_prepared_matches_world_distance() {
        let mut grid = VoxelGrid::new(UVec3::splat(8)).unwrap();
        grid.set_frame(Pose::at(Vec3::new(-4.0, 0.0, 2.0)).with_scale(Vec3::splat(0.5)));
        let stroke = BrushStroke::box_stroke(Vec3::new(-2.0, 1.0, 3.0), Vec3::new(1.0, 0.5, 0.75))
            .with_rotation(Quat::from_rotation_y(0.4));
        let prepared = stroke.prepare(&grid);

        for p in [IVec3::new(1, 2, 3), IVec3::new(4, 2, 2), IVec3::new(7, 0, 5)] {
            let world = grid.grid_to_world().transform_point3(p.as_vec3());
            let expected = stroke.distance_world(world);
            assert!((prepared.distance(p.as_vec3()) - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_affected_region_box_at_origin() {
        let grid = VoxelGrid::new(UVec3::splat(6)).unwrap();
        let stroke = BrushStroke::box_stroke(Vec3::ZERO, Vec3::splat(2.0));
        let region = stroke.prepare(&grid).affected_region(grid.resolution());
        assert_eq!(region, Region::new(IVec3::ZERO, IVec3::splat(3)));
    }

    #[test]
    fn test_affected_region_outside_grid_is_empty() {
        let grid = VoxelGrid::new(UVec3::splat(6)).unwrap();
        let stroke = BrushStroke::sphere(Vec3::splat(40.0), 2.0);
        assert!(stroke.prepare(&grid).affected_region(grid.resolution()).is_empty());
    }

    #[test]
    fn test_scaled_grid_maps_bounds() {
        let mut grid = VoxelGrid::new(UVec3::splat(20)).unwrap();
        grid.set_frame(Pose::IDENTITY.with_scale(Vec3::splat(0.5)));
        let stroke = BrushStroke::sphere(Vec3::splat(5.0), 1.0);
        let bounds = stroke.prepare(&grid).grid_bounds();
        assert!((bounds.min - Vec3::splat(8.0)).length() < 1e-4);
        assert!((bounds.max - Vec3::splat(12.0)).length() < 1e-4);
    }
}

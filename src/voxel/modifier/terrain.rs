//! Heightmap terrain written into the grid

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::voxel::brush::Heightmap;
use crate::voxel::cell::{Rgba8, VoxelCell};
use super::VoxelSample;

/// Color band: applies to solid up to `max_height` above the terrain base
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TerrainLayer {
    pub max_height: f32,
    pub color: Rgba8,
}

impl TerrainLayer {
    pub fn new(max_height: f32, color: Rgba8) -> Self {
        Self { max_height, color }
    }
}

/// Unions a heightmap surface into the grid with banded colors.
///
/// The map covers `extent` cells in x/z starting at `origin`, with heights
/// from `origin.y` to `origin.y + height`. The brush shape only limits which
/// cells are visited.
#[derive(Clone, Debug)]
pub struct TerrainImport {
    map: Arc<Heightmap>,
    origin: Vec3,
    extent: Vec2,
    height: f32,
    /// Sorted by `max_height`
    layers: Vec<TerrainLayer>,
}

impl TerrainImport {
    pub fn new(map: Arc<Heightmap>, origin: Vec3, extent: Vec2, height: f32) -> Self {
        Self {
            map,
            origin,
            extent: extent.max(Vec2::splat(f32::EPSILON)),
            height,
            layers: Vec::new(),
        }
    }

    pub fn with_layers(mut self, mut layers: Vec<TerrainLayer>) -> Self {
        layers.sort_by(|a, b| a.max_height.total_cmp(&b.max_height));
        self.layers = layers;
        self
    }

    pub fn layers(&self) -> &[TerrainLayer] {
        &self.layers
    }

    /// Terrain surface height in grid space, `None` outside the footprint
    pub fn surface_at(&self, x: f32, z: f32) -> Option<f32> {
        let u = (x - self.origin.x) / self.extent.x;
        let v = (z - self.origin.z) / self.extent.y;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        Some(self.origin.y + self.map.sample(u, v) * self.height)
    }

    /// Layer color at a height above the terrain base
    pub fn color_at(&self, relative_height: f32) -> Option<Rgba8> {
        self.layers
            .iter()
            .find(|layer| relative_height <= layer.max_height)
            .or(self.layers.last())
            .map(|layer| layer.color)
    }

    pub fn apply(&self, sample: &VoxelSample) -> VoxelCell {
        let p = sample.pos.as_vec3();
        let Some(surface) = self.surface_at(p.x, p.z) else {
            return sample.current;
        };
        let field = surface - p.y;
        if field <= sample.current.value {
            return sample.current;
        }
        let color = self
            .color_at(p.y - self.origin.y)
            .unwrap_or(sample.current.color);
        VoxelCell::new(field, color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn import() -> TerrainImport {
        let map = Arc::new(Heightmap::new(2, 2, vec![0.5; 4]).unwrap());
        TerrainImport::new(map, Vec3::new(0.0, 1.0, 0.0), Vec2::splat(8.0), 4.0).with_layers(vec![
            TerrainLayer::new(4.0, Rgba8::rgb(200, 200, 200)),
            TerrainLayer::new(1.0, Rgba8::rgb(90, 60, 30)),
        ])
    }

    #[test]
    fn test_layers_sorted() {
        let t = import();
        assert_eq!(t.layers()[0].max_height, 1.0);
        assert_eq!(t.color_at(0.5), Some(Rgba8::rgb(90, 60, 30)));
        assert_eq!(t.color_at(2.0), Some(Rgba8::rgb(200, 200, 200)));
        assert_eq!(t.color_at(99.0), Some(Rgba8::rgb(200, 200, 200)));
    }

    #[test]
    fn test_surface_height() {
        let t = import();
        assert_eq!(t.surface_at(4.0, 4.0), Some(3.0));
        assert_eq!(t.surface_at(9.0, 4.0), None);
    }

    #[test]
    fn test_fills_below_surface() {
        let t = import();
        let below = t.apply(&VoxelSample::new(IVec3::new(2, 1, 2), VoxelCell::EMPTY, 0.0));
        assert_eq!(below.value, 2.0);
        assert_eq!(below.color, Rgba8::rgb(90, 60, 30));
        let above = t.apply(&VoxelSample::new(IVec3::new(2, 5, 2), VoxelCell::EMPTY, 0.0));
        assert_eq!(above, VoxelCell::EMPTY);
    }
}

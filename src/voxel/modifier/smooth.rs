//! Gaussian smoothing of the field near the surface

use glam::IVec3;

use crate::voxel::cell::VoxelCell;
use crate::voxel::grid::GridSnapshot;
use super::VoxelSample;

/// Replaces near-surface field values with a Gaussian-weighted neighbor
/// average read from the pre-edit snapshot.
#[derive(Clone, Debug)]
pub struct Smooth {
    radius: f32,
    /// Only cells with `|value| <= threshold` are smoothed
    threshold: f32,
    /// Blend toward the average, in [0, 1]
    strength: f32,
    /// Offsets and normalized weights
    kernel: Vec<(IVec3, f32)>,
}

impl Smooth {
    pub fn new(radius: f32, threshold: f32, strength: f32) -> Self {
        let radius = radius.max(0.0);
        Self {
            radius,
            threshold,
            strength: strength.clamp(0.0, 1.0),
            kernel: gaussian_kernel(radius),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Integer reach of the kernel in cells
    pub fn kernel_radius(&self) -> i32 {
        self.radius.ceil() as i32
    }

    pub fn apply(&self, sample: &VoxelSample, snapshot: &GridSnapshot) -> VoxelCell {
        if !sample.inside_shape() || sample.current.value.abs() > self.threshold {
            return sample.current;
        }
        let average: f32 = self
            .kernel
            .iter()
            .map(|(offset, w)| w * snapshot.get_clamped(sample.pos + *offset).value)
            .sum();
        let value = sample.current.value + (average - sample.current.value) * self.strength;
        sample.current.with_value(value)
    }
}

/// Offsets within `radius` with weights `exp(-d^2 / 2 sigma^2)`,
/// `sigma = radius / 2`, normalized to sum to one.
fn gaussian_kernel(radius: f32) -> Vec<(IVec3, f32)> {
    let reach = radius.ceil() as i32;
    if reach == 0 {
        return vec![(IVec3::ZERO, 1.0)];
    }
    let sigma = radius * 0.5;
    let denom = 2.0 * sigma * sigma;
    let mut kernel = Vec::new();
    for z in -reach..=reach {
        for y in -reach..=reach {
            for x in -reach..=reach {
                let offset = IVec3::new(x, y, z);
                let d2 = offset.length_squared() as f32;
                if d2 <= radius * radius {
                    kernel.push((offset, (-d2 / denom).exp()));
                }
            }
        }
    }
    let total: f32 = kernel.iter().map(|(_, w)| w).sum();
    for (_, w) in &mut kernel {
        *w /= total;
    }
    kernel
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;
    use crate::voxel::cell::Rgba8;
    use crate::voxel::grid::VoxelGrid;

    #[test]
    fn test_kernel_is_normalized() {
        let kernel = gaussian_kernel(2.0);
        let total: f32 = kernel.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-5);
        let center = kernel.iter().find(|(o, _)| *o == IVec3::ZERO).unwrap().1;
        assert!(kernel.iter().all(|(_, w)| *w <= center));
    }

    #[test]
    fn test_uniform_field_is_unchanged() {
        let grid = VoxelGrid::with_fill(UVec3::splat(6), VoxelCell::new(0.25, Rgba8::WHITE)).unwrap();
        let snap = grid.snapshot_all();
        let smooth = Smooth::new(2.0, 1.0, 1.0);
        let s = VoxelSample::new(IVec3::splat(3), grid.get(IVec3::splat(3)).unwrap(), -1.0);
        assert!((smooth.apply(&s, &snap).value - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_spike_is_flattened() {
        let mut grid = VoxelGrid::new(UVec3::splat(7)).unwrap();
        grid.set(IVec3::splat(3), VoxelCell::new(1.0, Rgba8::WHITE));
        let snap = grid.snapshot_all();
        let smooth = Smooth::new(1.5, 1.0, 1.0);
        let s = VoxelSample::new(IVec3::splat(3), grid.get(IVec3::splat(3)).unwrap(), -1.0);
        let out = smooth.apply(&s, &snap).value;
        assert!(out < 1.0 && out > -1.0);
    }

    #[test]
    fn test_far_from_surface_and_outside_shape_untouched() {
        let grid = VoxelGrid::new(UVec3::splat(4)).unwrap();
        let snap = grid.snapshot_all();
        let smooth = Smooth::new(1.0, 0.5, 1.0);
        let deep = VoxelSample::new(IVec3::ONE, VoxelCell::new(0.9, Rgba8::WHITE), -1.0);
        assert_eq!(smooth.apply(&deep, &snap).value, 0.9);
        let outside = VoxelSample::new(IVec3::ONE, VoxelCell::new(0.1, Rgba8::WHITE), 0.5);
        assert_eq!(smooth.apply(&outside, &snap).value, 0.1);
    }
}

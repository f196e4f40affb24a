//! Fractal noise displacement near the surface

use std::fmt;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::voxel::cell::VoxelCell;
use super::VoxelSample;

/// Adds fractal Perlin noise to cells close to the surface.
///
/// Strength ramps from zero at the shape boundary to `amplitude` deeper
/// inside; `sharpness` sets how quickly.
#[derive(Clone)]
pub struct Roughen {
    amplitude: f32,
    frequency: f32,
    sharpness: f32,
    /// Only cells with `|value| <= band` are displaced
    band: f32,
    seed: u32,
    noise: Fbm<Perlin>,
}

impl Roughen {
    pub fn new(amplitude: f32, frequency: f32, sharpness: f32, seed: u32) -> Self {
        let noise = Fbm::<Perlin>::new(seed)
            .set_octaves(3)
            .set_persistence(0.5)
            .set_lacunarity(2.0);
        Self {
            amplitude,
            frequency,
            sharpness: sharpness.max(0.0),
            band: 1.0,
            seed,
            noise,
        }
    }

    pub fn with_band(mut self, band: f32) -> Self {
        self.band = band;
        self
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sharpness(&self) -> f32 {
        self.sharpness
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Noise in roughly [-1, 1] at a grid position
    pub fn noise_at(&self, x: f32, y: f32, z: f32) -> f32 {
        let f = self.frequency as f64;
        self.noise.get([x as f64 * f, y as f64 * f, z as f64 * f]) as f32
    }

    pub fn apply(&self, sample: &VoxelSample) -> VoxelCell {
        if !sample.inside_shape() || sample.current.value.abs() > self.band {
            return sample.current;
        }
        let depth = -sample.distance;
        let weight = 1.0 - (-self.sharpness * depth).exp();
        if weight <= 0.0 {
            return sample.current;
        }
        let p = sample.pos.as_vec3();
        let offset = self.amplitude * weight * self.noise_at(p.x, p.y, p.z);
        sample.current.with_value(sample.current.value + offset)
    }
}

impl fmt::Debug for Roughen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Roughen")
            .field("amplitude", &self.amplitude)
            .field("frequency", &self.frequency)
            .field("sharpness", &self.sharpness)
            .field("band", &self.band)
            .field("seed", &self.seed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;
    use crate::voxel::cell::Rgba8;

    #[test]
    fn test_deterministic() {
        let a = Roughen::new(0.5, 0.3, 2.0, 42);
        let b = Roughen::new(0.5, 0.3, 2.0, 42);
        let s = VoxelSample::new(IVec3::new(4, 7, 1), VoxelCell::new(0.1, Rgba8::WHITE), -2.0);
        assert_eq!(a.apply(&s), b.apply(&s));
    }

    #[test]
    fn test_boundary_and_outside_untouched() {
        let r = Roughen::new(0.5, 0.3, 2.0, 1);
        let edge = VoxelSample::new(IVec3::new(3, 3, 3), VoxelCell::new(0.1, Rgba8::WHITE), 0.0);
        assert_eq!(r.apply(&edge).value, 0.1);
        let outside = VoxelSample::new(IVec3::new(3, 3, 3), VoxelCell::new(0.1, Rgba8::WHITE), 1.0);
        assert_eq!(r.apply(&outside).value, 0.1);
    }

    #[test]
    fn test_displacement_bounded_by_amplitude() {
        let r = Roughen::new(0.25, 0.37, 4.0, 3);
        for i in 0..64 {
            let pos = IVec3::new(i % 4, (i / 4) % 4, i / 16);
            let s = VoxelSample::new(pos, VoxelCell::new(0.0, Rgba8::WHITE), -5.0);
            let out = r.apply(&s).value;
            assert!(out.abs() <= 0.25 * 2.0);
        }
    }

    #[test]
    fn test_far_inside_cells_skipped() {
        let r = Roughen::new(0.5, 0.3, 2.0, 1).with_band(0.5);
        let s = VoxelSample::new(IVec3::new(3, 3, 3), VoxelCell::new(0.9, Rgba8::WHITE), -3.0);
        assert_eq!(r.apply(&s).value, 0.9);
    }
}

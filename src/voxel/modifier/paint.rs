//! Color painting

use crate::voxel::cell::{lerp_channel, Rgba8, VoxelCell};
use super::VoxelSample;

/// How paint strength fades from the brush edge toward its center
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Falloff {
    /// Full strength everywhere inside the shape
    #[default]
    Constant,
    Linear,
    /// Smoothstep
    Smooth,
}

impl Falloff {
    /// Weight for a normalized depth `t` in [0, 1] (0 = edge, 1 = center)
    #[inline]
    pub fn weight(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Falloff::Constant => 1.0,
            Falloff::Linear => t,
            Falloff::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Blends a color into cells inside the shape. Field values are untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintBrush {
    pub color: Rgba8,
    /// Which of r, g, b, a are written
    pub channels: [bool; 4],
    /// Blend factor at full weight, in [0, 1]
    pub strength: f32,
    pub falloff: Falloff,
    /// Depth inside the shape, in grid cells, at which the falloff reaches 1
    pub falloff_width: f32,
}

impl PaintBrush {
    pub fn new(color: Rgba8) -> Self {
        Self {
            color,
            channels: [true; 4],
            strength: 1.0,
            falloff: Falloff::Constant,
            falloff_width: 1.0,
        }
    }

    pub fn with_channels(mut self, channels: [bool; 4]) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_falloff(mut self, falloff: Falloff, width: f32) -> Self {
        self.falloff = falloff;
        self.falloff_width = width;
        self
    }

    pub fn apply(&self, sample: &VoxelSample) -> VoxelCell {
        if !sample.inside_shape() || !self.channels.iter().any(|&on| on) {
            return sample.current;
        }
        let depth = -sample.distance / self.falloff_width.max(f32::EPSILON);
        let t = self.strength.clamp(0.0, 1.0) * self.falloff.weight(depth);
        if t <= 0.0 {
            return sample.current;
        }

        let mut out = sample.current.color.to_array();
        let target = self.color.to_array();
        for (i, channel) in out.iter_mut().enumerate() {
            if self.channels[i] {
                *channel = lerp_channel(*channel, target[i], t);
            }
        }
        sample.current.with_color(Rgba8::from_array(out))
    }
}

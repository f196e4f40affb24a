//! Voxel cell data type

use bytemuck::{Pod, Zeroable};
use rkyv::Archive;

/// Largest magnitude a field value may take.
///
/// Values are truncated to one cell of band on either side of the surface.
pub const FIELD_LIMIT: f32 = 1.0;

/// Value of a cell far outside any solid
pub const OUTSIDE_VALUE: f32 = -FIELD_LIMIT;

/// 8-bit RGBA color
#[repr(C)]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable,
    Archive, rkyv::Serialize, rkyv::Deserialize,
    serde::Serialize, serde::Deserialize,
)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::new(255, 255, 255, 255);
    pub const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [u8; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    /// Per-channel linear blend, `t` in [0, 1]
    pub fn lerp(self, other: Rgba8, t: f32) -> Rgba8 {
        let a = self.to_array();
        let b = other.to_array();
        let mut out = [0u8; 4];
        for i in 0..4 {
            out[i] = lerp_channel(a[i], b[i], t);
        }
        Rgba8::from_array(out)
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Blend a single 8-bit channel
#[inline]
pub fn lerp_channel(from: u8, to: u8, t: f32) -> u8 {
    let t = t.clamp(0.0, 1.0);
    let v = from as f32 + (to as f32 - from as f32) * t;
    v.round().clamp(0.0, 255.0) as u8
}

/// Single voxel sample - exactly 8 bytes.
///
/// `value > 0` is inside solid, `value <= 0` is outside. Cells are replaced
/// wholesale by modifiers, never patched field by field.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, PartialEq, Pod, Zeroable,
    Archive, rkyv::Serialize, rkyv::Deserialize,
    serde::Serialize, serde::Deserialize,
)]
pub struct VoxelCell {
    /// Truncated signed field value in [-FIELD_LIMIT, FIELD_LIMIT]
    pub value: f32,
    /// Surface color
    pub color: Rgba8,
}

impl VoxelCell {
    /// Empty (fully outside) cell
    pub const EMPTY: VoxelCell = VoxelCell {
        value: OUTSIDE_VALUE,
        color: Rgba8::WHITE,
    };

    pub fn new(value: f32, color: Rgba8) -> Self {
        Self { value, color }
    }

    /// Copy with a different field value
    pub fn with_value(self, value: f32) -> Self {
        Self { value, ..self }
    }

    /// Copy with a different color
    pub fn with_color(self, color: Rgba8) -> Self {
        Self { color, ..self }
    }

    /// Check if the cell is inside solid
    pub fn is_solid(&self) -> bool {
        self.value > 0.0
    }

    /// Enforce the cell invariants: finite value inside the field band.
    #[inline]
    pub fn sanitized(self) -> Self {
        let value = if self.value.is_finite() {
            self.value.clamp(-FIELD_LIMIT, FIELD_LIMIT)
        } else {
            OUTSIDE_VALUE
        };
        Self { value, ..self }
    }
}

impl Default for VoxelCell {
    fn default() -> Self {
        Self::EMPTY
    }
}

//! Integer grid-space boxes touched by an edit

use crate::core::types::{IVec3, UVec3, Vec3};
use super::aabb::Aabb;

/// Inclusive integer box in grid coordinates.
///
/// A region with `min > max` on any axis is empty. Arithmetic on corners
/// saturates, so boxes far outside any grid stay well formed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub min: IVec3,
    pub max: IVec3,
}

impl Region {
    /// Largest corner magnitude produced from float bounds
    pub const COORD_LIMIT: i32 = i32::MAX / 2;

    /// Canonical empty region
    pub const EMPTY: Region = Region {
        min: IVec3::ZERO,
        max: IVec3::NEG_ONE,
    };

    /// Create region from inclusive corners
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Region covering a whole grid of the given resolution
    pub fn full(res: UVec3) -> Self {
        Self {
            min: IVec3::ZERO,
            max: res.as_ivec3() - IVec3::ONE,
        }
    }

    /// Integer cover of a grid-space AABB, grown by `margin` cells on each side.
    pub fn from_grid_aabb(aabb: &Aabb, margin: i32) -> Self {
        let min = aabb.min.floor();
        let max = aabb.max.ceil();
        if !min.is_finite() || !max.is_finite() {
            return Self::EMPTY;
        }
        let limit = Vec3::splat(Self::COORD_LIMIT as f32);
        Self {
            min: min.clamp(-limit, limit).as_ivec3().saturating_sub(IVec3::splat(margin)),
            max: max.clamp(-limit, limit).as_ivec3().saturating_add(IVec3::splat(margin)),
        }
    }

    /// Clamp to `[0, res)` on every axis
    pub fn clamped(&self, res: UVec3) -> Self {
        let hi = res.as_ivec3() - IVec3::ONE;
        Self {
            min: self.min.max(IVec3::ZERO),
            max: self.max.min(hi),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn contains(&self, p: IVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Extent on each axis (zero for empty regions)
    pub fn dims(&self) -> UVec3 {
        if self.is_empty() {
            return UVec3::ZERO;
        }
        let span = |lo: i32, hi: i32| (hi as i64 - lo as i64 + 1).min(u32::MAX as i64) as u32;
        UVec3::new(
            span(self.min.x, self.max.x),
            span(self.min.y, self.max.y),
            span(self.min.z, self.max.z),
        )
    }

    /// Number of voxels covered
    pub fn volume(&self) -> usize {
        let d = self.dims();
        (d.x as usize)
            .saturating_mul(d.y as usize)
            .saturating_mul(d.z as usize)
    }

    /// Smallest region covering both
    pub fn union(&self, other: &Region) -> Region {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Region {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlap of both (possibly empty)
    pub fn intersection(&self, other: &Region) -> Region {
        Region {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Grow by `n` cells on every side (not clamped)
    pub fn expanded(&self, n: i32) -> Region {
        if self.is_empty() {
            return *self;
        }
        Region {
            min: self.min.saturating_sub(IVec3::splat(n)),
            max: self.max.saturating_add(IVec3::splat(n)),
        }
    }

    /// Move by an integer offset
    pub fn translated(&self, offset: IVec3) -> Region {
        Region {
            min: self.min.saturating_add(offset),
            max: self.max.saturating_add(offset),
        }
    }

    /// Iterate all coordinates, x fastest
    pub fn iter(&self) -> impl Iterator<Item = IVec3> + '_ {
        let (min, max) = (self.min, self.max);
        (min.z..=max.z)
            .flat_map(move |z| (min.y..=max.y).map(move |y| (y, z)))
            .flat_map(move |(y, z)| (min.x..=max.x).map(move |x| IVec3::new(x, y, z)))
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::EMPTY
    }
}

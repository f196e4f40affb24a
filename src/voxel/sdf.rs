//! Signed distance primitives and noise helpers.
//!
//! All distances are outside-positive: negative inside the shape, zero on the
//! surface, positive outside.

use glam::Vec3;

// =============================================================================
// SDF Primitives
// =============================================================================

/// Distance to a sphere centered at the origin
#[inline]
pub fn sdf_sphere(p: Vec3, radius: f32) -> f32 {
    p.length() - radius
}

/// Chebyshev distance to an origin-centered box.
///
/// Exact inside, a lower bound outside (corners read as flat faces).
#[inline]
pub fn sdf_box_chebyshev(p: Vec3, half_extents: Vec3) -> f32 {
    (p.abs() - half_extents).max_element()
}

/// Distance to a capsule (line segment with radius)
/// Capsule from point `a` to `b` with radius `r`
#[inline]
pub fn sdf_capsule(p: Vec3, a: Vec3, b: Vec3, radius: f32) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > f32::EPSILON {
        (ap.dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = a + ab * t;
    (p - closest).length() - radius
}

/// Distance to the half-space below `y = level` (inside when `p.y < level`)
#[inline]
pub fn sdf_below(p: Vec3, level: f32) -> f32 {
    p.y - level
}

/// Distance to the half-space above `y = level`
#[inline]
pub fn sdf_above(p: Vec3, level: f32) -> f32 {
    level - p.y
}

// =============================================================================
// SDF Combinations
// =============================================================================

/// Smooth minimum (polynomial smooth blend)
#[inline]
pub fn smin(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = (k - (b - a).abs()).max(0.0) / k;
    b.min(a) - h * h * k * 0.25
}

/// Union (min of two distances)
#[inline]
pub fn sdf_union(a: f32, b: f32) -> f32 {
    a.min(b)
}

/// Subtraction: a - b (inside a, outside b)
#[inline]
pub fn sdf_subtraction(a: f32, b: f32) -> f32 {
    (-b).max(a)
}

/// Intersection (max of two distances)
#[inline]
pub fn sdf_intersection(a: f32, b: f32) -> f32 {
    a.max(b)
}

// =============================================================================
// Noise
// =============================================================================

/// Deterministic 3D integer hash
#[inline]
pub fn hash_3d(x: i32, y: i32, z: i32, seed: u32) -> u32 {
    let mut h = seed;
    h ^= x as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h ^= y as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h ^= z as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h
}

/// Hash mapped to [0, 1]
#[inline]
fn hash_unit(x: i32, y: i32, z: i32, seed: u32) -> f32 {
    (hash_3d(x, y, z, seed) & 0xFFFF) as f32 / 65535.0
}

/// Cellular (Worley F1) noise: distance from `p` to the nearest jittered
/// feature point on the unit lattice. Roughly in [0, 1].
pub fn cellular(p: Vec3, seed: u32) -> f32 {
    let cell = p.floor();
    let (cx, cy, cz) = (cell.x as i32, cell.y as i32, cell.z as i32);
    let mut nearest = f32::MAX;
    for dz in -1..=1 {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y, z) = (cx + dx, cy + dy, cz + dz);
                let feature = Vec3::new(
                    x as f32 + hash_unit(x, y, z, seed),
                    y as f32 + hash_unit(x, y, z, seed ^ 0x9E37_79B9),
                    z as f32 + hash_unit(x, y, z, seed ^ 0x85EB_CA6B),
                );
                nearest = nearest.min(feature.distance_squared(p));
            }
        }
    }
    nearest.sqrt()
}

/// Layered sine pattern in roughly [-1, 1]
#[inline]
pub fn trig_noise(p: Vec3, seed: u32) -> f32 {
    let phase = (seed % 1024) as f32 * 0.618;
    let a = (p.x * 1.7 + phase).sin() * (p.y * 1.3 - phase).cos();
    let b = (p.y * 2.3 + p.z * 0.7).sin() * (p.z * 1.9 + phase * 0.5).cos();
    let c = ((p.x + p.z) * 0.9 - phase).sin();
    (a + b + c) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdf_sphere() {
        let d = sdf_sphere(Vec3::new(2.0, 0.0, 0.0), 1.0);
        assert!((d - 1.0).abs() < 0.001);
        assert!(sdf_sphere(Vec3::ZERO, 1.0) < 0.0);
    }

    #[test]
    fn test_sdf_box_chebyshev() {
        let he = Vec3::new(2.0, 1.0, 1.0);
        assert!((sdf_box_chebyshev(Vec3::ZERO, he) + 1.0).abs() < 1e-6);
        assert!((sdf_box_chebyshev(Vec3::new(3.0, 0.0, 0.0), he) - 1.0).abs() < 1e-6);
        // Corner reads as the larger axis gap
        assert!((sdf_box_chebyshev(Vec3::new(3.0, 2.0, 0.0), he) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sdf_capsule() {
        let d = sdf_capsule(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 0.5);
        assert!((d + 0.5).abs() < 0.001);
        let beyond = sdf_capsule(Vec3::new(3.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 0.5);
        assert!((beyond - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_degenerate_capsule_is_sphere() {
        let d = sdf_capsule(Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO, Vec3::ZERO, 1.0);
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_smin() {
        let result = smin(0.5, 0.3, 0.5);
        assert!(result < 0.3);
        assert_eq!(smin(0.5, 0.3, 0.0), 0.3);
    }

    #[test]
    fn test_cellular_is_deterministic_and_bounded() {
        let p = Vec3::new(1.3, -2.7, 0.4);
        assert_eq!(cellular(p, 7), cellular(p, 7));
        for i in 0..50 {
            let q = Vec3::new(i as f32 * 0.37, i as f32 * -0.21, i as f32 * 0.11);
            let v = cellular(q, 3);
            assert!((0.0..=1.8).contains(&v));
        }
    }

    #[test]
    fn test_trig_noise_bounded() {
        for i in 0..50 {
            let v = trig_noise(Vec3::splat(i as f32 * 0.3), 11);
            assert!((-1.0..=1.0).contains(&v));
        }
    }
}

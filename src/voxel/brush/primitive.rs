use std::sync::Arc;

use glam::Vec3;

use crate::math::Aabb;
use crate::voxel::sdf::{
    cellular, sdf_above, sdf_box_chebyshev, sdf_capsule, sdf_sphere, trig_noise,
};
use super::heightmap::Heightmap;

/// Parameters of the procedural rock shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RockParams {
    /// Radius of the base sphere
    pub radius: f32,
    pub seed: u32,
    /// Sine layer strength, as a fraction of the radius
    pub trig_amplitude: f32,
    /// Sine layer frequency, in cycles per radius
    pub trig_frequency: f32,
    /// Cellular layer strength, as a fraction of the radius
    pub cell_amplitude: f32,
    /// Cellular layer frequency, in cells per radius
    pub cell_frequency: f32,
}

impl Default for RockParams {
    fn default() -> Self {
        Self {
            radius: 4.0,
            seed: 1,
            trig_amplitude: 0.08,
            trig_frequency: 2.0,
            cell_amplitude: 0.2,
            cell_frequency: 1.5,
        }
    }
}

impl RockParams {
    /// Largest outward displacement the noise layers can add
    fn max_bulge(&self) -> f32 {
        // cellular() stays below sqrt(3); centered by 0.5
        self.radius * (self.trig_amplitude.abs() + self.cell_amplitude.abs() * 1.25)
    }
}

/// Brush shapes with SDF evaluation in their own local frame
#[derive(Debug, Clone)]
pub enum BrushShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    /// Rounded tube between two local endpoints. With `floor` set, everything
    /// below that local height is excluded, leaving a flat-bottomed tunnel.
    Tube { start: Vec3, end: Vec3, radius: f32, floor: Option<f32> },
    /// Solid under a height surface spanning the local box `[-half_extents, half_extents]`
    Heightfield { map: Arc<Heightmap>, half_extents: Vec3 },
    Rock(RockParams),
}

impl BrushShape {
    /// Signed distance from point to surface (negative = inside)
    /// Point is in local space (primitive centered at origin)
    pub fn distance(&self, p: Vec3) -> f32 {
        match self {
            BrushShape::Sphere { radius } => sdf_sphere(p, *radius),
            BrushShape::Box { half_extents } => sdf_box_chebyshev(p, *half_extents),
            BrushShape::Tube { start, end, radius, floor } => {
                let tube = sdf_capsule(p, *start, *end, *radius);
                match floor {
                    Some(level) => tube.max(sdf_above(p, *level)),
                    None => tube,
                }
            }
            BrushShape::Heightfield { map, half_extents } => {
                let he = *half_extents;
                let u = (p.x / he.x + 1.0) * 0.5;
                let v = (p.z / he.z + 1.0) * 0.5;
                let surface = -he.y + map.sample(u, v) * 2.0 * he.y;
                let sides = (p.x.abs() - he.x).max(p.z.abs() - he.z);
                let bottom = -he.y - p.y;
                (p.y - surface).max(sides).max(bottom)
            }
            BrushShape::Rock(params) => {
                let r = params.radius.max(f32::EPSILON);
                let q = p / r;
                let trig = trig_noise(q * params.trig_frequency, params.seed);
                let cell = cellular(q * params.cell_frequency, params.seed) - 0.5;
                sdf_sphere(p, r)
                    + r * (params.trig_amplitude * trig + params.cell_amplitude * cell)
            }
        }
    }

    /// Check if point is inside the shape (distance <= 0)
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.distance(p) <= 0.0
    }

    /// Get local-space AABB
    pub fn local_bounds(&self) -> Aabb {
        match self {
            BrushShape::Sphere { radius } => {
                Aabb::from_center_half_extent(Vec3::ZERO, Vec3::splat(*radius))
            }
            BrushShape::Box { half_extents } => {
                Aabb::from_center_half_extent(Vec3::ZERO, *half_extents)
            }
            BrushShape::Tube { start, end, radius, floor } => {
                let r = Vec3::splat(*radius);
                let mut bounds = Aabb::new(start.min(*end) - r, start.max(*end) + r);
                if let Some(level) = floor {
                    bounds.min.y = bounds.min.y.max(*level).min(bounds.max.y);
                }
                bounds
            }
            BrushShape::Heightfield { half_extents, .. } => {
                Aabb::from_center_half_extent(Vec3::ZERO, *half_extents)
            }
            BrushShape::Rock(params) => Aabb::from_center_half_extent(
                Vec3::ZERO,
                Vec3::splat(params.radius + params.max_bulge()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_distance() {
        let sphere = BrushShape::Sphere { radius: 1.0 };
        assert!(sphere.distance(Vec3::ZERO) < 0.0);
        assert!(sphere.distance(Vec3::X).abs() < 0.001);
        assert!(sphere.distance(Vec3::X * 2.0) > 0.0);
    }

    #[test]
    fn test_box_distance() {
        let shape = BrushShape::Box { half_extents: Vec3::ONE };
        assert!((shape.distance(Vec3::ZERO) + 1.0).abs() < 1e-6);
        assert!(shape.distance(Vec3::splat(2.0)) > 0.0);
    }

    #[test]
    fn test_tube_floor_cuts_bottom() {
        let open = BrushShape::Tube {
            start: Vec3::new(-3.0, 0.0, 0.0),
            end: Vec3::new(3.0, 0.0, 0.0),
            radius: 1.0,
            floor: None,
        };
        let floored = BrushShape::Tube {
            start: Vec3::new(-3.0, 0.0, 0.0),
            end: Vec3::new(3.0, 0.0, 0.0),
            radius: 1.0,
            floor: Some(-0.5),
        };
        let low = Vec3::new(0.0, -0.8, 0.0);
        assert!(open.contains_point(low));
        assert!(!floored.contains_point(low));
        assert!(floored.contains_point(Vec3::new(0.0, 0.5, 0.0)));
        assert!((floored.local_bounds().min.y + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_heightfield_distance() {
        let map = Arc::new(Heightmap::new(2, 2, vec![0.5; 4]).unwrap());
        let shape = BrushShape::Heightfield { map, half_extents: Vec3::new(4.0, 2.0, 4.0) };
        // Surface at local y = 0
        assert!(shape.contains_point(Vec3::new(0.0, -1.0, 0.0)));
        assert!(!shape.contains_point(Vec3::new(0.0, 1.0, 0.0)));
        assert!((shape.distance(Vec3::new(0.0, 0.5, 0.0)) - 0.5).abs() < 1e-6);
        // Outside the footprint even below the surface
        assert!(!shape.contains_point(Vec3::new(5.0, -1.0, 0.0)));
        // Below the bottom face
        assert!(!shape.contains_point(Vec3::new(0.0, -3.0, 0.0)));
    }

    #[test]
    fn test_rock_stays_within_bounds() {
        let params = RockParams { radius: 3.0, seed: 9, ..Default::default() };
        let rock = BrushShape::Rock(params);
        let bounds = rock.local_bounds();
        assert!(rock.contains_point(Vec3::ZERO));
        for i in 0..200 {
            let dir = Vec3::new((i as f32 * 0.7).sin(), (i as f32 * 1.3).cos(), (i as f32 * 0.29).sin())
                .normalize_or_zero();
            let outside = dir * (bounds.max.x + 0.01);
            assert!(!rock.contains_point(outside), "sample {}", i);
        }
    }

    #[test]
    fn test_rock_is_irregular() {
        let rock = BrushShape::Rock(RockParams { radius: 3.0, ..Default::default() });
        let a = rock.distance(Vec3::new(3.0, 0.0, 0.0));
        let b = rock.distance(Vec3::new(0.0, 0.0, 3.0));
        assert!((a - b).abs() > 1e-4);
    }
}

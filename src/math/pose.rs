//! Position, rotation and non-uniform scale of a placed object

use crate::core::types::{Mat4, Quat, Vec3};

/// Placement of a shape or grid in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Pure translation
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local-to-world matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// World-to-local matrix
    pub fn inverse_matrix(&self) -> Mat4 {
        self.matrix().inverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matrix() {
        assert_eq!(Pose::IDENTITY.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_inverse_roundtrips_point() {
        let pose = Pose::at(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_z(0.3))
            .with_scale(Vec3::new(2.0, 1.0, 0.5));
        let p = Vec3::new(0.25, -1.0, 4.0);
        let back = pose.inverse_matrix().transform_point3(pose.matrix().transform_point3(p));
        assert!((back - p).length() < 1e-4);
    }
}

//! Session configuration, loadable from JSON

use std::path::Path;

use glam::{Quat, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::core::Error;
use crate::math::Pose;
use crate::mesh::DEFAULT_CHUNK_CELLS;
use crate::voxel::cell::{Rgba8, VoxelCell, OUTSIDE_VALUE};
use crate::voxel::edit::DEFAULT_HISTORY_DEPTH;
use crate::voxel::grid::MIN_RESOLUTION;

/// Settings for a [`SculptSession`](super::SculptSession).
///
/// Missing JSON fields take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SculptConfig {
    /// Voxels per axis
    pub resolution: [u32; 3],
    /// Grid origin in world space
    pub position: [f32; 3],
    /// Grid rotation quaternion, `[x, y, z, w]`
    pub rotation: [f32; 4],
    /// World size of one grid cell per axis
    pub scale: [f32; 3],
    /// Cells per chunk edge
    pub chunk_cells: u32,
    pub initial_value: f32,
    pub initial_color: Rgba8,
    pub invert_winding: bool,
    pub vertex_colors: bool,
    pub parallel: bool,
    /// Undo steps kept
    pub history_depth: usize,
}

impl Default for SculptConfig {
    fn default() -> Self {
        Self {
            resolution: [64, 64, 64],
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            chunk_cells: DEFAULT_CHUNK_CELLS,
            initial_value: OUTSIDE_VALUE,
            initial_color: Rgba8::WHITE,
            invert_winding: false,
            vertex_colors: true,
            parallel: true,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl SculptConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let [x, y, z] = self.resolution;
        if x < MIN_RESOLUTION || y < MIN_RESOLUTION || z < MIN_RESOLUTION {
            return Err(Error::InvalidResolution { x, y, z });
        }
        if self.chunk_cells == 0 {
            return Err(Error::Config("chunk_cells must be at least 1".to_string()));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(Error::Config(format!("grid scale {:?} must be finite and non-zero", self.scale)));
        }
        if !self.initial_value.is_finite() {
            return Err(Error::Config("initial_value must be finite".to_string()));
        }
        Ok(())
    }

    pub fn resolution(&self) -> UVec3 {
        UVec3::from_array(self.resolution)
    }

    /// Grid placement in the world
    pub fn frame(&self) -> Pose {
        Pose {
            position: Vec3::from_array(self.position),
            rotation: Quat::from_array(self.rotation).normalize(),
            scale: Vec3::from_array(self.scale),
        }
    }

    pub fn initial_cell(&self) -> VoxelCell {
        VoxelCell::new(self.initial_value, self.initial_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SculptConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_cell(), VoxelCell::EMPTY);
        assert_eq!(config.frame(), Pose::IDENTITY);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SculptConfig::from_json_str(r#"{ "resolution": [10, 12, 14], "parallel": false }"#).unwrap();
        assert_eq!(config.resolution(), UVec3::new(10, 12, 14));
        assert!(!config.parallel);
        assert_eq!(config.chunk_cells, DEFAULT_CHUNK_CELLS);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            SculptConfig::from_json_str(r#"{ "resolution": [1, 12, 14] }"#),
            Err(Error::InvalidResolution { x: 1, .. })
        ));
        assert!(matches!(
            SculptConfig::from_json_str(r#"{ "chunk_cells": 0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(SculptConfig::from_json_str("not json"), Err(Error::Config(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sculpt.json");
        let config = SculptConfig {
            resolution: [8, 8, 8],
            invert_winding: true,
            initial_color: Rgba8::rgb(1, 2, 3),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SculptConfig::load(&path).unwrap(), config);
    }
}

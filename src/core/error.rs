//! Error types for the sculpting engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid grid resolution {x}x{y}x{z} (every axis must be at least 2)")]
    InvalidResolution { x: u32, y: u32, z: u32 },

    #[error("resolution mismatch: expected {expected:?}, found {found:?}")]
    ResolutionMismatch { expected: [u32; 3], found: [u32; 3] },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persistence error: {0}")]
    Persist(String),

    #[error("unsupported voxel data version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Heightmap error: {0}")]
    Heightmap(String),
}

//! Brush shapes for sculpting
//!
//! A [`BrushShape`] is evaluated in its own local frame. A [`BrushStroke`]
//! places it in the world, and [`BrushStroke::prepare`] resolves it against a
//! grid frame once per edit.

pub mod heightmap;
pub mod primitive;
pub mod stroke;

// Re-exports
pub use heightmap::Heightmap;
pub use primitive::{BrushShape, RockParams};
pub use stroke::{BrushStroke, PreparedStroke, BOUNDS_MARGIN};

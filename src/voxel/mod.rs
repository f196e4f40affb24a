//! Voxel data structures and operations

pub mod cell;
pub mod grid;
pub mod sdf;
pub mod brush;
pub mod modifier;
pub mod edit;
pub mod persist;

pub use cell::{Rgba8, VoxelCell, FIELD_LIMIT, OUTSIDE_VALUE};
pub use grid::{GridSnapshot, VoxelGrid, MIN_RESOLUTION};
pub use brush::{BrushShape, BrushStroke, Heightmap, PreparedStroke, RockParams};
pub use modifier::{Modifier, VoxelSample};
pub use edit::{DirtyRegionTracker, EditHistory, EngineConfig, ModificationEngine, Preview};

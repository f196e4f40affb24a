//! Applying modifiers to grids and keeping track of what changed.

pub mod engine;
pub mod history;
pub mod invalidator;

pub use engine::{EngineConfig, ModificationEngine, Preview};
pub use history::{EditHistory, EditRecord, DEFAULT_HISTORY_DEPTH};
pub use invalidator::DirtyRegionTracker;

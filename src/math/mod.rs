//! Mathematical utilities and data structures

pub mod aabb;
pub mod pose;
pub mod region;

pub use aabb::Aabb;
pub use pose::Pose;
pub use region::Region;

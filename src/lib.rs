//! Voxsculpt - signed-distance voxel sculpting with incremental Marching Cubes meshing

pub mod core;
pub mod math;
pub mod voxel;
pub mod mesh;
pub mod session;

//! Surface extraction
//!
//! Marching Cubes over 2x2x2 voxel neighborhoods, organized in chunks that
//! can be rebuilt independently after an edit.

pub mod tables;
pub mod marching;
pub mod chunk;

pub use chunk::{ChunkCoord, ChunkLayout, ChunkMesh, ChunkMeshBuilder, DEFAULT_CHUNK_CELLS};
pub use marching::{configuration_index, crossing_t, triangulate, triangulate_cells, MeshBuffer};

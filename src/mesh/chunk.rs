//! Chunk subdivision of the grid and per-chunk mesh rebuilding

use rayon::prelude::*;

use crate::core::types::{IVec3, UVec3};
use crate::math::Region;
use crate::voxel::grid::VoxelGrid;
use super::marching::{triangulate_cells, MeshBuffer};

/// Default number of cells along each chunk edge
pub const DEFAULT_CHUNK_CELLS: u32 = 16;

/// Integer coordinate identifying a chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn as_ivec3(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

/// How a grid's cells are split into chunks.
///
/// A grid of `res` voxels has `res - 1` cells per axis; cell `c` spans voxels
/// `c` and `c + 1`. Chunk `k` owns cells `[k * chunk_cells, (k + 1) * chunk_cells)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLayout {
    grid_res: UVec3,
    chunk_cells: u32,
}

impl ChunkLayout {
    pub fn new(grid_res: UVec3, chunk_cells: u32) -> Self {
        Self {
            grid_res,
            chunk_cells: chunk_cells.max(1),
        }
    }

    pub fn grid_resolution(&self) -> UVec3 {
        self.grid_res
    }

    pub fn chunk_cells(&self) -> u32 {
        self.chunk_cells
    }

    /// Cells per axis
    pub fn cell_counts(&self) -> UVec3 {
        self.grid_res.saturating_sub(UVec3::ONE)
    }

    /// Chunks per axis
    pub fn chunk_counts(&self) -> UVec3 {
        (self.cell_counts() + UVec3::splat(self.chunk_cells - 1)) / self.chunk_cells
    }

    pub fn chunk_total(&self) -> usize {
        let c = self.chunk_counts();
        c.x as usize * c.y as usize * c.z as usize
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        let c = coord.as_ivec3();
        c.cmpge(IVec3::ZERO).all() && c.cmplt(self.chunk_counts().as_ivec3()).all()
    }

    /// Every chunk coordinate, x fastest
    pub fn coords(&self) -> Vec<ChunkCoord> {
        let n = self.chunk_counts().as_ivec3();
        Region::new(IVec3::ZERO, n - IVec3::ONE)
            .iter()
            .map(|c| ChunkCoord::new(c.x, c.y, c.z))
            .collect()
    }

    /// Inclusive range of cell origins owned by a chunk
    pub fn cell_range(&self, coord: ChunkCoord) -> Region {
        if !self.contains(coord) {
            return Region::EMPTY;
        }
        let size = self.chunk_cells as i32;
        let min = coord.as_ivec3() * size;
        let max = (min + IVec3::splat(size - 1)).min(self.cell_counts().as_ivec3() - IVec3::ONE);
        Region::new(min, max)
    }

    /// Chunks whose meshes depend on any voxel in `voxels`.
    ///
    /// A voxel at `v` is a corner of cells `v - 1` and `v`, so the cell range
    /// is widened by one on the low side.
    pub fn chunks_touching(&self, voxels: &Region) -> Vec<ChunkCoord> {
        if voxels.is_empty() {
            return Vec::new();
        }
        let cells = Region::new(voxels.min.saturating_sub(IVec3::ONE), voxels.max)
            .clamped(self.cell_counts());
        if cells.is_empty() {
            return Vec::new();
        }
        let size = self.chunk_cells as i32;
        let chunk_region = Region::new(cells.min / size, cells.max / size);
        chunk_region
            .iter()
            .map(|c| ChunkCoord::new(c.x, c.y, c.z))
            .collect()
    }
}

/// Mesh of a single chunk
#[derive(Clone, Debug)]
pub struct ChunkMesh {
    pub coord: ChunkCoord,
    /// Tracker generation the mesh was built against
    pub generation: u32,
    pub mesh: MeshBuffer,
}

/// Rebuilds chunk meshes from grid data
#[derive(Clone, Copy, Debug)]
pub struct ChunkMeshBuilder {
    layout: ChunkLayout,
    invert_winding: bool,
    vertex_colors: bool,
}

impl ChunkMeshBuilder {
    pub fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            invert_winding: false,
            vertex_colors: true,
        }
    }

    pub fn with_invert_winding(mut self, invert: bool) -> Self {
        self.invert_winding = invert;
        self
    }

    pub fn with_vertex_colors(mut self, colors: bool) -> Self {
        self.vertex_colors = colors;
        self
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// Triangulate every cell of one chunk. Positions are in grid space.
    pub fn build_chunk(&self, grid: &VoxelGrid, coord: ChunkCoord) -> MeshBuffer {
        let mut mesh = if self.vertex_colors {
            MeshBuffer::with_colors()
        } else {
            MeshBuffer::new()
        };
        for origin in self.layout.cell_range(coord).iter() {
            if let Some(corners) = grid.cell_corners(origin) {
                triangulate_cells(&mut mesh, &corners, origin, self.invert_winding);
            }
        }
        mesh.finish();
        mesh
    }

    /// Rebuild several chunks in parallel. Output order matches `coords`.
    pub fn build_chunks(&self, grid: &VoxelGrid, coords: &[ChunkCoord]) -> Vec<MeshBuffer> {
        coords
            .par_iter()
            .map(|&coord| self.build_chunk(grid, coord))
            .collect()
    }

    /// Triangulate the whole grid into one buffer
    pub fn build_all(&self, grid: &VoxelGrid) -> MeshBuffer {
        let mut mesh = if self.vertex_colors {
            MeshBuffer::with_colors()
        } else {
            MeshBuffer::new()
        };
        let cells = Region::new(IVec3::ZERO, self.layout.cell_counts().as_ivec3() - IVec3::ONE);
        for origin in cells.iter() {
            if let Some(corners) = grid.cell_corners(origin) {
                triangulate_cells(&mut mesh, &corners, origin, self.invert_winding);
            }
        }
        mesh.finish();
        mesh
    }
}

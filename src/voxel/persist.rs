//! Grid serialization and disk I/O
//!
//! Layout: 4-byte magic, then little-endian `u32` version and resolution
//! (x, y, z), then an LZ4 block (size prepended) holding an rkyv archive of
//! [`GridData`]. The prepended size is checked against the resolution before
//! anything is allocated.

use std::path::Path;

use glam::{Quat, UVec3, Vec3};
use rkyv::{Archive, Deserialize, Serialize};

use crate::core::types::Result;
use crate::core::Error;
use crate::math::Pose;
use super::cell::VoxelCell;
use super::grid::{validate_resolution, VoxelGrid};

const MAGIC: &[u8; 4] = b"VXSG";
/// Current on-disk format version
pub const VERSION: u32 = 1;
const HEADER_LEN: usize = 20;
/// Slack for the archive's fixed fields and alignment padding
const ARCHIVE_OVERHEAD: usize = 1024;
/// Upper bound on LZ4 block expansion
const LZ4_MAX_RATIO: usize = 255;

/// Serializable grid payload
#[derive(Archive, Deserialize, Serialize)]
pub struct GridData {
    pub resolution: [u32; 3],
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Cells in x-fastest order
    pub cells: Vec<VoxelCell>,
}

impl GridData {
    fn from_grid(grid: &VoxelGrid) -> Self {
        let frame = grid.frame();
        Self {
            resolution: grid.resolution().to_array(),
            position: frame.position.to_array(),
            rotation: frame.rotation.to_array(),
            scale: frame.scale.to_array(),
            cells: grid.cells().to_vec(),
        }
    }

    fn into_grid(self) -> Result<VoxelGrid> {
        let frame = Pose {
            position: Vec3::from_array(self.position),
            rotation: Quat::from_array(self.rotation).normalize(),
            scale: Vec3::from_array(self.scale),
        };
        Ok(VoxelGrid::from_cells(UVec3::from_array(self.resolution), self.cells)?.with_frame(frame))
    }
}

/// Serialize a grid (with header and compression)
pub fn dump(grid: &VoxelGrid) -> Result<Vec<u8>> {
    let data = GridData::from_grid(grid);
    let archived = rkyv::to_bytes::<rkyv::rancor::Error>(&data)
        .map_err(|e| Error::Persist(e.to_string()))?;

    let compressed = lz4_flex::compress_prepend_size(&archived);
    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    for axis in grid.resolution().to_array() {
        out.extend_from_slice(&axis.to_le_bytes());
    }
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Resolution recorded in the header of [`dump`] output
pub fn stored_resolution(bytes: &[u8]) -> Result<UVec3> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(Error::Persist("Invalid magic bytes".to_string()));
    }
    let version = read_u32(bytes, 4);
    if version != VERSION {
        return Err(Error::UnsupportedVersion { found: version, expected: VERSION });
    }
    let res = UVec3::new(read_u32(bytes, 8), read_u32(bytes, 12), read_u32(bytes, 16));
    validate_resolution(res)?;
    Ok(res)
}

/// Decode a grid written by [`dump`]
pub fn load(bytes: &[u8]) -> Result<VoxelGrid> {
    decode(bytes)?.into_grid()
}

/// Decode cells into an existing grid, which must already have the stored
/// resolution. The grid's frame and fill cell are kept; only cells change.
/// The grid is untouched on error.
pub fn load_into(grid: &mut VoxelGrid, bytes: &[u8]) -> Result<()> {
    let stored = stored_resolution(bytes)?;
    if stored != grid.resolution() {
        return Err(Error::ResolutionMismatch {
            expected: grid.resolution().to_array(),
            found: stored.to_array(),
        });
    }
    let data = decode(bytes)?;
    grid.load_cells(&data.cells)
}

fn decode(bytes: &[u8]) -> Result<GridData> {
    let res = stored_resolution(bytes)?;
    let block = &bytes[HEADER_LEN..];
    if block.len() < 4 {
        return Err(Error::Persist("Missing payload".to_string()));
    }
    let claimed = read_u32(block, 0) as usize;
    let limit = payload_limit(res).min((block.len() - 4).saturating_mul(LZ4_MAX_RATIO));
    if claimed > limit {
        return Err(Error::Persist(format!(
            "payload size {} exceeds limit {} for a {:?} grid",
            claimed,
            limit,
            res.to_array()
        )));
    }

    let decompressed = lz4_flex::decompress_size_prepended(block)
        .map_err(|e| Error::Persist(format!("LZ4 decompression failed: {}", e)))?;
    let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(decompressed.len());
    aligned.extend_from_slice(&decompressed);

    let archived = rkyv::access::<ArchivedGridData, rkyv::rancor::Error>(&aligned)
        .map_err(|e| Error::Persist(e.to_string()))?;
    let data = rkyv::deserialize::<GridData, rkyv::rancor::Error>(archived)
        .map_err(|e| Error::Persist(e.to_string()))?;
    if data.resolution != res.to_array() {
        return Err(Error::Persist(format!(
            "header resolution {:?} does not match payload {:?}",
            res.to_array(),
            data.resolution
        )));
    }
    Ok(data)
}

/// Largest archive a grid of resolution `res` can produce
fn payload_limit(res: UVec3) -> usize {
    let cells = res.x as u64 * res.y as u64 * res.z as u64;
    let bytes = cells
        .saturating_mul(std::mem::size_of::<VoxelCell>() as u64)
        .saturating_add(ARCHIVE_OVERHEAD as u64);
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

/// Save a grid to disk
pub fn save_to_file(path: impl AsRef<Path>, grid: &VoxelGrid) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, dump(grid)?)?;
    log::info!("Saved {:?} voxel grid to {}", grid.resolution().to_array(), path.display());
    Ok(())
}

/// Load a grid from disk
pub fn load_from_file(path: impl AsRef<Path>) -> Result<VoxelGrid> {
    let path = path.as_ref();
    let grid = load(&std::fs::read(path)?)?;
    log::info!("Loaded {:?} voxel grid from {}", grid.resolution().to_array(), path.display());
    Ok(grid)
}

/// Save a grid to disk without blocking the runtime
pub async fn save_to_file_async(path: &Path, grid: &VoxelGrid) -> Result<()> {
    let bytes = dump(grid)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Load a grid from disk without blocking the runtime
pub async fn load_from_file_async(path: &Path) -> Result<VoxelGrid> {
    let bytes = tokio::fs::read(path).await?;
    load(&bytes)
}

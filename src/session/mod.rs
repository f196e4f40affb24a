//! Sculpting session: one grid, its edit machinery and its chunk meshes.
//!
//! The session is the host-facing entry point. It owns the grid, applies
//! `(stroke, modifier)` pairs, keeps undo history and dirty chunks, and
//! hands rebuilt chunk meshes to a [`MeshSink`] on the caller's thread.

pub mod config;
pub mod tools;

use std::path::Path;
use std::sync::Arc;

use glam::{IVec3, Mat4, UVec3, Vec3};

use crate::core::types::Result;
use crate::math::{Pose, Region};
use crate::mesh::{ChunkCoord, ChunkLayout, ChunkMesh, ChunkMeshBuilder, MeshBuffer};
use crate::voxel::brush::{BrushShape, BrushStroke, Heightmap};
use crate::voxel::edit::{DirtyRegionTracker, EditHistory, EngineConfig, ModificationEngine, Preview};
use crate::voxel::grid::{GridSnapshot, VoxelGrid};
use crate::voxel::modifier::{Modifier, RegionCopy, TerrainImport};
use crate::voxel::persist;

pub use config::SculptConfig;
pub use tools::{ControllerId, Tool, ToolBox};

/// Receives finished chunk meshes after a rebuild
pub trait MeshSink {
    /// Take ownership of a rebuilt chunk mesh
    fn submit(&mut self, mesh: ChunkMesh);

    /// Every previously submitted mesh is stale (grid resized or replaced)
    fn reset(&mut self) {}
}

impl MeshSink for Vec<ChunkMesh> {
    fn submit(&mut self, mesh: ChunkMesh) {
        self.push(mesh);
    }

    fn reset(&mut self) {
        self.clear();
    }
}

/// Interactive sculpting state for one voxel grid
#[derive(Debug)]
pub struct SculptSession {
    config: SculptConfig,
    grid: VoxelGrid,
    engine: ModificationEngine,
    tracker: DirtyRegionTracker,
    history: EditHistory,
    tools: ToolBox,
    preview: Option<Preview>,
    clipboard: Option<GridSnapshot>,
    /// Sinks must drop their meshes before the next rebuild
    layout_changed: bool,
}

impl SculptSession {
    /// Create a session with a fresh grid. Every chunk starts dirty.
    pub fn new(config: SculptConfig) -> Result<Self> {
        config.validate()?;
        let grid = VoxelGrid::with_fill(config.resolution(), config.initial_cell())?
            .with_frame(config.frame());
        let mut tracker = DirtyRegionTracker::new(ChunkLayout::new(grid.resolution(), config.chunk_cells));
        tracker.mark_all();

        log::info!(
            "Sculpt session: grid {:?}, {} chunks of {} cells",
            config.resolution,
            tracker.layout().chunk_total(),
            config.chunk_cells
        );
        Ok(Self {
            engine: ModificationEngine::new(EngineConfig { parallel: config.parallel }),
            history: EditHistory::new(config.history_depth),
            tools: ToolBox::new(),
            preview: None,
            clipboard: None,
            layout_changed: false,
            config,
            grid,
            tracker,
        })
    }

    pub fn config(&self) -> &SculptConfig {
        &self.config
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn engine(&self) -> &ModificationEngine {
        &self.engine
    }

    pub fn tracker(&self) -> &DirtyRegionTracker {
        &self.tracker
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn tools(&self) -> &ToolBox {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolBox {
        &mut self.tools
    }

    /// Apply one edit to the grid, recording it for undo.
    /// Returns the touched region (empty when the stroke misses the grid).
    pub fn apply(&mut self, stroke: &BrushStroke, modifier: &Modifier) -> Region {
        let region = self.engine.affected_region(&self.grid, stroke);
        if region.is_empty() {
            return Region::EMPTY;
        }
        let before = self.recording().then(|| self.grid.snapshot(&region));
        let touched = self.engine.apply(&mut self.grid, stroke, modifier);
        self.finish_edit(modifier.name(), before, touched);
        touched
    }

    /// Apply the tool held by `controller` at `pose`.
    /// `None` when the controller has no tool selected.
    pub fn apply_tool(&mut self, controller: ControllerId, pose: Pose) -> Option<Region> {
        let tool = self.tools.current(controller)?;
        let stroke = tool.stroke_at(pose);
        let modifier = tool.modifier.clone();
        Some(self.apply(&stroke, &modifier))
    }

    /// Stage an edit without touching the grid, replacing any pending
    /// preview. Returns the previewed region.
    pub fn preview(&mut self, stroke: &BrushStroke, modifier: &Modifier) -> Region {
        let preview = self.engine.apply_to_preview(&self.grid, stroke, modifier);
        let region = preview.region();
        self.preview = Some(preview);
        region
    }

    pub fn pending_preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Write the pending preview into the grid
    pub fn commit_preview(&mut self) -> Region {
        let Some(preview) = self.preview.take() else {
            return Region::EMPTY;
        };
        let region = preview.region();
        let before = (self.recording() && !region.is_empty()).then(|| self.grid.snapshot(&region));
        let written = self.engine.commit_preview(&mut self.grid, preview);
        self.finish_edit("preview", before, written);
        written
    }

    pub fn discard_preview(&mut self) -> bool {
        self.preview.take().is_some()
    }

    pub fn undo(&mut self) -> Option<Region> {
        let region = self.history.undo(&mut self.grid)?;
        self.tracker.mark_region(&region);
        Some(region)
    }

    pub fn redo(&mut self) -> Option<Region> {
        let region = self.history.redo(&mut self.grid)?;
        self.tracker.mark_region(&region);
        Some(region)
    }

    /// Reallocate the grid, cropping or padding (see [`VoxelGrid::resize`]).
    /// Clears history and any pending preview.
    pub fn resize(&mut self, new_res: UVec3, preserve_overlap: bool) -> Result<()> {
        self.grid.resize(new_res, preserve_overlap)?;
        self.config.resolution = new_res.to_array();
        self.reset_layout();
        Ok(())
    }

    /// Rebuild the grid at a new resolution covering the same world volume,
    /// resampling the field with the region-copy operator.
    pub fn rescale(&mut self, new_res: UVec3) -> Result<()> {
        let old_res = self.grid.resolution();
        let ratio = (old_res - UVec3::ONE).as_vec3() / (new_res.max(UVec3::splat(2)) - UVec3::ONE).as_vec3();
        let frame = Pose {
            scale: self.grid.frame().scale * ratio,
            ..*self.grid.frame()
        };
        let mut grid = VoxelGrid::with_fill(new_res, self.grid.fill_cell())?.with_frame(frame);

        let copy = Modifier::RegionCopy(RegionCopy::new(self.grid.snapshot_all(), Mat4::from_scale(ratio)));
        let stroke = region_stroke(&frame, &grid.bounds());
        self.engine.apply(&mut grid, &stroke, &copy);

        log::info!("Rescaled grid {:?} -> {:?}", old_res.to_array(), new_res.to_array());
        self.grid = grid;
        self.config.resolution = new_res.to_array();
        self.config.scale = frame.scale.to_array();
        self.reset_layout();
        Ok(())
    }

    /// Copy a region of the grid to the clipboard. Returns the clipped region.
    pub fn copy_region(&mut self, region: &Region) -> Region {
        let snapshot = self.grid.snapshot(region);
        let copied = snapshot.region();
        self.clipboard = (!copied.is_empty()).then_some(snapshot);
        copied
    }

    pub fn clipboard(&self) -> Option<&GridSnapshot> {
        self.clipboard.as_ref()
    }

    /// Paste the clipboard with its minimum corner at `dest_min`.
    /// Targets that miss the grid are a no-op.
    pub fn paste(&mut self, dest_min: IVec3) -> Region {
        let Some(source) = self.clipboard.clone() else {
            return Region::EMPTY;
        };
        let target = source
            .region()
            .translated(dest_min.saturating_sub(source.region().min));
        if target.clamped(self.grid.resolution()).is_empty() {
            return Region::EMPTY;
        }
        let stroke = region_stroke(self.grid.frame(), &target);
        let modifier = Modifier::RegionCopy(RegionCopy::paste_at(source, dest_min));
        self.apply(&stroke, &modifier)
    }

    /// Union a heightmap terrain into the whole grid
    pub fn import_terrain(&mut self, import: TerrainImport) -> Region {
        let stroke = region_stroke(self.grid.frame(), &self.grid.bounds());
        self.apply(&stroke, &Modifier::TerrainImport(import))
    }

    /// Rebuild every dirty chunk (in parallel) and submit the results to
    /// `sink` in chunk order. Returns the number of chunks rebuilt.
    pub fn rebuild_dirty(&mut self, sink: &mut dyn MeshSink) -> usize {
        if self.layout_changed {
            sink.reset();
            self.layout_changed = false;
        }
        let coords = self.tracker.take_dirty_chunks();
        if coords.is_empty() {
            return 0;
        }
        let meshes = self.mesh_builder().build_chunks(&self.grid, &coords);
        let mut triangles = 0;
        for (coord, mesh) in coords.iter().zip(meshes) {
            triangles += mesh.triangle_count();
            sink.submit(ChunkMesh {
                coord: *coord,
                generation: self.tracker.generation(coord),
                mesh,
            });
        }
        log::debug!("Rebuilt {} chunks ({} triangles)", coords.len(), triangles);
        coords.len()
    }

    /// Mesh of one chunk, built now
    pub fn build_chunk(&self, coord: ChunkCoord) -> MeshBuffer {
        self.mesh_builder().build_chunk(&self.grid, coord)
    }

    /// Whole surface as one buffer, in grid space
    pub fn build_full_mesh(&self) -> MeshBuffer {
        self.mesh_builder().build_all(&self.grid)
    }

    /// Serialized grid (see [`persist`])
    pub fn dump(&self) -> Result<Vec<u8>> {
        persist::dump(&self.grid)
    }

    /// Replace the grid cells from [`SculptSession::dump`] output.
    /// The stored resolution must match the current one; the configured
    /// pose and initial cell stay in effect.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        persist::load_into(&mut self.grid, bytes)?;
        self.config.resolution = self.grid.resolution().to_array();
        self.reset_layout();
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persist::save_to_file(path, &self.grid)
    }

    /// Load a saved grid of the current resolution
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = std::fs::read(path)?;
        self.load_bytes(&bytes)
    }

    fn mesh_builder(&self) -> ChunkMeshBuilder {
        ChunkMeshBuilder::new(*self.tracker.layout())
            .with_invert_winding(self.config.invert_winding)
            .with_vertex_colors(self.config.vertex_colors)
    }

    fn recording(&self) -> bool {
        self.history.depth() > 0
    }

    fn finish_edit(&mut self, label: &'static str, before: Option<GridSnapshot>, touched: Region) {
        if touched.is_empty() {
            return;
        }
        if let Some(before) = before {
            let after = self.grid.snapshot(&touched);
            self.history.record(label, before, after);
        }
        self.tracker.mark_region(&touched);
    }

    fn reset_layout(&mut self) {
        self.preview = None;
        self.history.clear();
        self.tracker
            .reset_layout(ChunkLayout::new(self.grid.resolution(), self.config.chunk_cells));
        self.layout_changed = true;
    }
}

/// Box stroke covering the voxels of `region` in a grid placed at `frame`
fn region_stroke(frame: &Pose, region: &Region) -> BrushStroke {
    let center = (region.min + region.max).as_vec3() * 0.5;
    let half_extents = (region.max - region.min).as_vec3() * 0.5 + Vec3::splat(0.5);
    let pose = Pose {
        position: frame.matrix().transform_point3(center),
        ..*frame
    };
    BrushStroke::new(BrushShape::Box { half_extents }, pose)
}

/// Shared heightmap from a grayscale image, for terrain import
pub fn heightmap_from_image(path: impl AsRef<Path>) -> Result<Arc<Heightmap>> {
    Ok(Arc::new(Heightmap::from_image(path)?))
}

//! Per-cell Marching Cubes triangulation into a shared mesh buffer.
//!
//! Each call resolves one unit cell from its 8 corner values. Vertices are
//! placed on crossed edges and deduplicated through a cache keyed by the edge
//! in grid space, so neighboring cells triangulated into the same buffer
//! share vertices along their common edges.
//!
//! Winding: by default triangles are counter-clockwise when seen from outside
//! the solid (normals point from solid into empty space). `invert_winding`
//! flips every triangle.

use std::collections::HashMap;

use crate::core::types::{IVec3, Mat4, Vec3};
use crate::voxel::cell::{Rgba8, VoxelCell};
use super::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_END, TRI_TABLE};

/// Corner value differences below this are treated as equal
pub const INTERP_EPSILON: f32 = 1e-6;

/// Grid-space identity of a cell edge: its lower endpoint and axis (0 = x, 1 = y, 2 = z)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct EdgeKey {
    origin: IVec3,
    axis: u8,
}

impl EdgeKey {
    fn new(a: IVec3, b: IVec3) -> Self {
        let origin = a.min(b);
        let d = (a - b).abs();
        let axis = if d.x != 0 { 0 } else if d.y != 0 { 1 } else { 2 };
        Self { origin, axis }
    }
}

/// Triangle mesh assembled from triangulated cells
#[derive(Clone, Debug, Default)]
pub struct MeshBuffer {
    /// Vertex positions in grid space
    pub positions: Vec<Vec3>,
    /// Per-vertex normals, filled by [`MeshBuffer::compute_normals`]
    pub normals: Vec<Vec3>,
    /// Per-vertex colors when color output is enabled
    pub colors: Option<Vec<Rgba8>>,
    /// Triangle list, three indices per triangle
    pub indices: Vec<u32>,
    edge_cache: HashMap<EdgeKey, u32>,
}

impl MeshBuffer {
    /// Create an empty buffer without vertex colors
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer that records vertex colors
    pub fn with_colors() -> Self {
        Self {
            colors: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Drop all geometry, keeping the color setting
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        if let Some(colors) = &mut self.colors {
            colors.clear();
        }
        self.indices.clear();
        self.edge_cache.clear();
    }

    /// Release the dedup cache once no more cells will be added
    pub fn finish(&mut self) {
        self.edge_cache = HashMap::new();
        self.compute_normals();
    }

    /// Area-weighted vertex normals from the current triangles
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let n = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        self.normals = normals;
    }

    /// Map positions and normals through an affine transform (e.g. grid to world)
    pub fn transform(&mut self, transform: &Mat4) {
        for p in &mut self.positions {
            *p = transform.transform_point3(*p);
        }
        let normal_matrix = transform.inverse().transpose();
        for n in &mut self.normals {
            *n = normal_matrix.transform_vector3(*n).normalize_or_zero();
        }
    }

    /// Vertex positions as raw bytes (three `f32` per vertex)
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Vertex colors as raw RGBA8 bytes; empty when colors are off
    pub fn color_bytes(&self) -> &[u8] {
        match &self.colors {
            Some(colors) => bytemuck::cast_slice(colors),
            None => &[],
        }
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of undirected edges used by exactly one triangle.
    ///
    /// Zero for a closed surface.
    pub fn open_edge_count(&self) -> usize {
        let mut uses: HashMap<(u32, u32), u32> = HashMap::new();
        for tri in self.indices.chunks_exact(3) {
            for i in 0..3 {
                let (a, b) = (tri[i], tri[(i + 1) % 3]);
                *uses.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        uses.values().filter(|&&n| n == 1).count()
    }

    /// Signed volume enclosed by the triangles; positive for outward winding
    pub fn signed_volume(&self) -> f32 {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                let a = self.positions[tri[0] as usize];
                let b = self.positions[tri[1] as usize];
                let c = self.positions[tri[2] as usize];
                a.dot(b.cross(c)) / 6.0
            })
            .sum()
    }

    fn edge_vertex(
        &mut self,
        key: EdgeKey,
        make: impl FnOnce() -> (Vec3, Rgba8),
    ) -> u32 {
        if let Some(&index) = self.edge_cache.get(&key) {
            return index;
        }
        let (position, color) = make();
        let index = self.positions.len() as u32;
        self.positions.push(position);
        if let Some(colors) = &mut self.colors {
            colors.push(color);
        }
        self.edge_cache.insert(key, index);
        index
    }
}

/// Configuration index of a cell: bit `i` set when corner `i` is inside (`value > 0`)
#[inline]
pub fn configuration_index(values: &[f32; 8]) -> u8 {
    let mut config = 0u8;
    for (i, &v) in values.iter().enumerate() {
        if v > 0.0 {
            config |= 1 << i;
        }
    }
    config
}

/// Zero crossing parameter between two corner values.
/// Equal values yield the midpoint.
#[inline]
pub fn crossing_t(a: f32, b: f32) -> f32 {
    let denom = b - a;
    if denom.abs() < INTERP_EPSILON {
        0.5
    } else {
        ((0.0 - a) / denom).clamp(0.0, 1.0)
    }
}

/// Triangulate one unit cell into `mesh`.
///
/// `values` and `colors` are in [`CORNER_OFFSETS`] order, `origin` is the
/// cell's minimum corner in grid space. Returns the number of triangles
/// emitted (0 to 5).
pub fn triangulate(
    mesh: &mut MeshBuffer,
    values: &[f32; 8],
    colors: Option<&[Rgba8; 8]>,
    origin: IVec3,
    invert_winding: bool,
) -> usize {
    let config = configuration_index(values) as usize;
    let edges = EDGE_TABLE[config];
    if edges == 0 {
        return 0;
    }

    let mut edge_vertices = [0u32; 12];
    for (e, slot) in edge_vertices.iter_mut().enumerate() {
        if edges & (1 << e) == 0 {
            continue;
        }
        let [ca, cb] = EDGE_CORNERS[e];
        let pa = origin + IVec3::from_array(CORNER_OFFSETS[ca]);
        let pb = origin + IVec3::from_array(CORNER_OFFSETS[cb]);
        *slot = mesh.edge_vertex(EdgeKey::new(pa, pb), || {
            let t = crossing_t(values[ca], values[cb]);
            let position = pa.as_vec3().lerp(pb.as_vec3(), t);
            let color = colors
                .map(|c| c[ca].lerp(c[cb], t))
                .unwrap_or(Rgba8::WHITE);
            (position, color)
        });
    }

    let row = &TRI_TABLE[config];
    let mut emitted = 0;
    for tri in row.chunks_exact(3) {
        if tri[0] == TRI_END {
            break;
        }
        let a = edge_vertices[tri[0] as usize];
        let b = edge_vertices[tri[1] as usize];
        let c = edge_vertices[tri[2] as usize];
        // Table order faces the inside corners
        if invert_winding {
            mesh.indices.extend_from_slice(&[a, b, c]);
        } else {
            mesh.indices.extend_from_slice(&[a, c, b]);
        }
        emitted += 1;
    }
    emitted
}

/// Triangulate a cell given as voxel cells, carrying their colors
/// when the buffer records them.
pub fn triangulate_cells(
    mesh: &mut MeshBuffer,
    corners: &[VoxelCell; 8],
    origin: IVec3,
    invert_winding: bool,
) -> usize {
    let values = corners.map(|c| c.value);
    if mesh.colors.is_some() {
        let colors = corners.map(|c| c.color);
        triangulate(mesh, &values, Some(&colors), origin, invert_winding)
    } else {
        triangulate(mesh, &values, None, origin, invert_winding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUT: f32 = -1.0;
    const IN: f32 = 1.0;

    #[test]
    fn test_uniform_cells_emit_nothing() {
        let mut mesh = MeshBuffer::new();
        assert_eq!(triangulate(&mut mesh, &[OUT; 8], None, IVec3::ZERO, false), 0);
        assert_eq!(triangulate(&mut mesh, &[IN; 8], None, IVec3::ZERO, false), 0);
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_zero_counts_as_outside() {
        let mut mesh = MeshBuffer::new();
        assert_eq!(triangulate(&mut mesh, &[0.0; 8], None, IVec3::ZERO, false), 0);
        assert_eq!(configuration_index(&[0.0; 8]), 0);
    }

    #[test]
    fn test_single_corner() {
        let mut values = [OUT; 8];
        values[0] = IN;
        let mut mesh = MeshBuffer::new();
        let tris = triangulate(&mut mesh, &values, None, IVec3::ZERO, false);
        assert_eq!(tris, 1);
        assert_eq!(mesh.vertex_count(), 3);
        // Crossings at the midpoints of the three edges leaving corner 0
        for p in &mesh.positions {
            let sum = p.x + p.y + p.z;
            assert!((sum - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_single_corner_winding_faces_outward() {
        let mut values = [OUT; 8];
        values[0] = IN;
        let mut mesh = MeshBuffer::new();
        triangulate(&mut mesh, &values, None, IVec3::ZERO, false);
        mesh.compute_normals();
        // Solid sits at the origin corner, so the face should look away from it
        assert!(mesh.normals[0].dot(Vec3::ONE) > 0.0);

        let mut flipped = MeshBuffer::new();
        triangulate(&mut flipped, &values, None, IVec3::ZERO, true);
        flipped.compute_normals();
        assert!(flipped.normals[0].dot(Vec3::ONE) < 0.0);
    }

    #[test]
    fn test_interpolation_weights() {
        assert!((crossing_t(-1.0, 1.0) - 0.5).abs() < 1e-6);
        assert!((crossing_t(-0.25, 0.75) - 0.25).abs() < 1e-6);
        assert_eq!(crossing_t(0.3, 0.3), 0.5);
    }

    #[test]
    fn test_deterministic() {
        let values = [0.3, -0.7, 0.1, -0.2, -0.9, 0.6, -0.4, 0.8];
        let mut a = MeshBuffer::new();
        let mut b = MeshBuffer::new();
        triangulate(&mut a, &values, None, IVec3::new(3, 1, 2), false);
        triangulate(&mut b, &values, None, IVec3::new(3, 1, 2), false);
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.indices, b.indices);
        assert!(a.triangle_count() <= 5);
    }

    #[test]
    fn test_empty_exactly_when_signs_agree() {
        for config in 0u32..256 {
            let values: [f32; 8] = std::array::from_fn(|i| if config & (1 << i) != 0 { IN } else { OUT });
            let mut mesh = MeshBuffer::new();
            let tris = triangulate(&mut mesh, &values, None, IVec3::ZERO, false);
            let uniform = config == 0 || config == 255;
            assert_eq!(mesh.vertex_count() == 0, uniform, "config {}", config);
            assert!(tris <= 5);
            assert!(mesh.vertex_count() <= 12);
        }
    }

    #[test]
    fn test_adjacent_cells_share_edge_vertices() {
        // Corner values for two cells side by side along x; the solid is the
        // slab x <= 1, y == 0 so the shared face has crossings on it.
        let left = [IN, IN, OUT, OUT, IN, IN, OUT, OUT];
        let right = [IN, OUT, OUT, OUT, IN, OUT, OUT, OUT];
        let mut mesh = MeshBuffer::new();
        triangulate(&mut mesh, &left, None, IVec3::ZERO, false);
        let after_first = mesh.vertex_count();
        triangulate(&mut mesh, &right, None, IVec3::new(1, 0, 0), false);

        // The edge (1,0,0)-(1,1,0) and (1,0,1)-(1,1,1) are shared; only the
        // right cell's new crossings add vertices.
        let mut separate = MeshBuffer::new();
        triangulate(&mut separate, &right, None, IVec3::new(1, 0, 0), false);
        assert_eq!(mesh.vertex_count(), after_first + separate.vertex_count() - 2);

        let shared = Vec3::new(1.0, 0.5, 0.0);
        let hits = mesh.positions.iter().filter(|p| (**p - shared).length() < 1e-6).count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_colors_follow_crossing() {
        let mut values = [OUT; 8];
        values[0] = IN;
        let mut colors = [Rgba8::BLACK; 8];
        colors[0] = Rgba8::rgb(200, 0, 0);
        let mut mesh = MeshBuffer::with_colors();
        triangulate(&mut mesh, &values, Some(&colors), IVec3::ZERO, false);
        let recorded = mesh.colors.as_ref().unwrap();
        assert_eq!(recorded.len(), mesh.vertex_count());
        assert!(recorded.iter().all(|c| *c == Rgba8::rgb(100, 0, 0)));
        assert_eq!(&mesh.color_bytes()[..4], &[100, 0, 0, 255]);
    }

    #[test]
    fn test_byte_views() {
        let mut values = [OUT; 8];
        values[0] = IN;
        let mut mesh = MeshBuffer::new();
        triangulate(&mut mesh, &values, None, IVec3::ZERO, false);
        mesh.finish();
        assert_eq!(mesh.position_bytes().len(), mesh.vertex_count() * 12);
        assert_eq!(mesh.normal_bytes().len(), mesh.vertex_count() * 12);
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
        assert!(mesh.color_bytes().is_empty());
        let first: &[f32] = bytemuck::cast_slice(&mesh.position_bytes()[..12]);
        assert_eq!(first, &mesh.positions[0].to_array());
    }

    #[test]
    fn test_transform_moves_positions() {
        let mut values = [OUT; 8];
        values[0] = IN;
        let mut mesh = MeshBuffer::new();
        triangulate(&mut mesh, &values, None, IVec3::ZERO, false);
        mesh.finish();
        let before = mesh.positions.clone();
        mesh.transform(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        for (a, b) in before.iter().zip(&mesh.positions) {
            assert!((b.x - a.x - 10.0).abs() < 1e-5);
        }
    }
}

//! CPU-side triangle mesh with optional per-vertex, per-face and per-wedge data.
//!
//! This module provides:
//! - [`MeshDataMask`] - Which attribute arrays a mesh actually carries
//! - [`MeshModel`] - Positions, faces and optional attribute arrays
//!
//! Optional arrays only count as present when their length matches the
//! domain they describe (vertex count for per-vertex data, face count for
//! per-face and per-wedge data). A stale array left behind by a topology
//! edit is therefore reported as absent instead of being read out of bounds.

use bitflags::bitflags;

use crate::math::{Aabb, Mat4};

bitflags! {
    /// Attribute arrays present in a mesh, and change markers for edits.
    ///
    /// The first group answers "what does this mesh have". The last three
    /// bits only appear in update masks and describe structural edits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MeshDataMask: u32 {
        /// Vertex positions.
        const VERT_COORD = 1 << 0;
        /// Per-vertex normals.
        const VERT_NORMAL = 1 << 1;
        /// Per-face normals.
        const FACE_NORMAL = 1 << 2;
        /// Per-vertex colors.
        const VERT_COLOR = 1 << 3;
        /// Per-face colors.
        const FACE_COLOR = 1 << 4;
        /// One color for the whole mesh.
        const MESH_COLOR = 1 << 5;
        /// Per-vertex texture coordinates.
        const VERT_TEXCOORD = 1 << 6;
        /// Per-wedge texture coordinates.
        const WEDGE_TEXCOORD = 1 << 7;
        /// Triangle faces.
        const FACES = 1 << 8;

        /// Vertex count changed.
        const VERT_NUMBER = 1 << 16;
        /// Face count changed.
        const FACE_NUMBER = 1 << 17;
        /// Face-vertex connectivity changed.
        const TOPOLOGY = 1 << 18;

        /// Markers that invalidate every uploaded attribute.
        const STRUCTURAL = Self::VERT_NUMBER.bits()
            | Self::FACE_NUMBER.bits()
            | Self::TOPOLOGY.bits();
    }
}

impl Default for MeshDataMask {
    fn default() -> Self {
        Self::empty()
    }
}

/// RGBA8 color.
pub type Color = [u8; 4];

/// Texture coordinates of the three corners of one face.
pub type WedgeTexCoords = [[f32; 2]; 3];

/// A triangle mesh held on the CPU.
///
/// # Example
///
/// ```ignore
/// let mesh = MeshModel::new(positions)
///     .with_faces(faces)
///     .with_vertex_normals(normals)
///     .with_label("bunny");
/// assert!(mesh.data_mask().contains(MeshDataMask::VERT_NORMAL));
/// ```
#[derive(Debug, Clone)]
pub struct MeshModel {
    label: Option<String>,
    positions: Vec<[f32; 3]>,
    faces: Vec<[u32; 3]>,
    vertex_normals: Option<Vec<[f32; 3]>>,
    vertex_colors: Option<Vec<Color>>,
    vertex_texcoords: Option<Vec<[f32; 2]>>,
    face_normals: Option<Vec<[f32; 3]>>,
    face_colors: Option<Vec<Color>>,
    wedge_texcoords: Option<Vec<WedgeTexCoords>>,
    wedge_texture_indices: Option<Vec<u16>>,
    mesh_color: Option<Color>,
    texture_names: Vec<String>,
    transform: Mat4,
    bbox: Aabb,
}

impl MeshModel {
    /// Create a point cloud mesh from vertex positions.
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        let bbox = Aabb::from_points(positions.iter());
        Self {
            label: None,
            positions,
            faces: Vec::new(),
            vertex_normals: None,
            vertex_colors: None,
            vertex_texcoords: None,
            face_normals: None,
            face_colors: None,
            wedge_texcoords: None,
            wedge_texture_indices: None,
            mesh_color: None,
            texture_names: Vec::new(),
            transform: Mat4::identity(),
            bbox,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the triangle faces.
    pub fn with_faces(mut self, faces: Vec<[u32; 3]>) -> Self {
        self.faces = faces;
        self
    }

    /// Set per-vertex normals.
    pub fn with_vertex_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.vertex_normals = Some(normals);
        self
    }

    /// Set per-vertex colors.
    pub fn with_vertex_colors(mut self, colors: Vec<Color>) -> Self {
        self.vertex_colors = Some(colors);
        self
    }

    /// Set per-vertex texture coordinates.
    pub fn with_vertex_texcoords(mut self, texcoords: Vec<[f32; 2]>) -> Self {
        self.vertex_texcoords = Some(texcoords);
        self
    }

    /// Set per-face normals.
    pub fn with_face_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.face_normals = Some(normals);
        self
    }

    /// Set per-face colors.
    pub fn with_face_colors(mut self, colors: Vec<Color>) -> Self {
        self.face_colors = Some(colors);
        self
    }

    /// Set per-wedge texture coordinates.
    pub fn with_wedge_texcoords(mut self, texcoords: Vec<WedgeTexCoords>) -> Self {
        self.wedge_texcoords = Some(texcoords);
        self
    }

    /// Set the texture slot used by each face's wedge coordinates.
    pub fn with_wedge_texture_indices(mut self, indices: Vec<u16>) -> Self {
        self.wedge_texture_indices = Some(indices);
        self
    }

    /// Set the mesh-wide color.
    pub fn with_mesh_color(mut self, color: Color) -> Self {
        self.mesh_color = Some(color);
        self
    }

    /// Set the material texture file names, one per texture slot.
    pub fn with_texture_names(mut self, names: Vec<String>) -> Self {
        self.texture_names = names;
        self
    }

    /// Set the model transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangle faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Per-vertex normals, if present and sized to the vertex count.
    pub fn vertex_normals(&self) -> Option<&[[f32; 3]]> {
        per_vertex(&self.vertex_normals, self.positions.len())
    }

    /// Per-vertex colors, if present and sized to the vertex count.
    pub fn vertex_colors(&self) -> Option<&[Color]> {
        per_vertex(&self.vertex_colors, self.positions.len())
    }

    /// Per-vertex texture coordinates, if present and sized to the vertex count.
    pub fn vertex_texcoords(&self) -> Option<&[[f32; 2]]> {
        per_vertex(&self.vertex_texcoords, self.positions.len())
    }

    /// Per-face normals, if present and sized to the face count.
    pub fn face_normals(&self) -> Option<&[[f32; 3]]> {
        per_face(&self.face_normals, self.faces.len())
    }

    /// Per-face colors, if present and sized to the face count.
    pub fn face_colors(&self) -> Option<&[Color]> {
        per_face(&self.face_colors, self.faces.len())
    }

    /// Per-wedge texture coordinates, if present and sized to the face count.
    pub fn wedge_texcoords(&self) -> Option<&[WedgeTexCoords]> {
        per_face(&self.wedge_texcoords, self.faces.len())
    }

    /// Texture slot of face `face`. Slot 0 when no per-face slot is stored.
    pub fn wedge_texture_index(&self, face: usize) -> u16 {
        per_face(&self.wedge_texture_indices, self.faces.len())
            .and_then(|indices| indices.get(face).copied())
            .unwrap_or(0)
    }

    pub fn mesh_color(&self) -> Option<Color> {
        self.mesh_color
    }

    pub fn texture_names(&self) -> &[String] {
        &self.texture_names
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Bounding box in object space.
    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    /// Bounding box after applying the model transform.
    pub fn world_bbox(&self) -> Aabb {
        self.bbox.transformed(&self.transform)
    }

    /// Report which attribute arrays this mesh actually carries.
    pub fn data_mask(&self) -> MeshDataMask {
        let mut mask = MeshDataMask::empty();
        if self.positions.is_empty() {
            return mask;
        }
        mask |= MeshDataMask::VERT_COORD;
        let faces = !self.faces.is_empty() && self.faces_in_range();
        mask.set(MeshDataMask::FACES, faces);
        mask.set(MeshDataMask::VERT_NORMAL, self.vertex_normals().is_some());
        mask.set(MeshDataMask::VERT_COLOR, self.vertex_colors().is_some());
        mask.set(MeshDataMask::VERT_TEXCOORD, self.vertex_texcoords().is_some());
        mask.set(MeshDataMask::MESH_COLOR, self.mesh_color.is_some());
        if faces {
            mask.set(MeshDataMask::FACE_NORMAL, self.face_normals().is_some());
            mask.set(MeshDataMask::FACE_COLOR, self.face_colors().is_some());
            mask.set(MeshDataMask::WEDGE_TEXCOORD, self.wedge_texcoords().is_some());
        }
        mask
    }

    /// Whether every face index names an existing vertex.
    ///
    /// False after positions shrink under faces that still use the removed
    /// vertices. Such faces are reported as absent by [`Self::data_mask`].
    pub fn faces_in_range(&self) -> bool {
        let count = self.positions.len();
        self.faces.iter().flatten().all(|&v| (v as usize) < count)
    }

    /// Replace the vertex positions and refresh the bounding box.
    pub fn set_positions(&mut self, positions: Vec<[f32; 3]>) {
        self.positions = positions;
        self.update_bbox();
    }

    pub fn set_faces(&mut self, faces: Vec<[u32; 3]>) {
        self.faces = faces;
    }

    pub fn set_vertex_colors(&mut self, colors: Option<Vec<Color>>) {
        self.vertex_colors = colors;
    }

    pub fn set_face_colors(&mut self, colors: Option<Vec<Color>>) {
        self.face_colors = colors;
    }

    pub fn set_mesh_color(&mut self, color: Option<Color>) {
        self.mesh_color = color;
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Recompute the bounding box from the current positions.
    pub fn update_bbox(&mut self) {
        self.bbox = Aabb::from_points(self.positions.iter());
    }

    /// Compute unit face normals from the current geometry.
    pub fn compute_face_normals(&mut self) {
        let normals = self
            .faces
            .iter()
            .map(|face| {
                let [a, b, c] = face.map(|i| self.position_vec(i));
                normalize_or_zero((b - a).cross(&(c - a)))
            })
            .collect();
        self.face_normals = Some(normals);
    }

    /// Compute vertex normals as the normalized sum of adjacent face normals.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![crate::math::Vec3::zeros(); self.positions.len()];
        for face in &self.faces {
            let [a, b, c] = face.map(|i| self.position_vec(i));
            let n = (b - a).cross(&(c - a));
            for &i in face {
                if let Some(slot) = accum.get_mut(i as usize) {
                    *slot += n;
                }
            }
        }
        self.vertex_normals = Some(accum.into_iter().map(normalize_or_zero).collect());
    }

    fn position_vec(&self, index: u32) -> crate::math::Vec3 {
        let p = self
            .positions
            .get(index as usize)
            .copied()
            .unwrap_or_default();
        crate::math::Vec3::new(p[0], p[1], p[2])
    }
}

fn per_vertex<T>(data: &Option<Vec<T>>, vertex_count: usize) -> Option<&[T]> {
    data.as_deref().filter(|d| d.len() == vertex_count)
}

fn per_face<T>(data: &Option<Vec<T>>, face_count: usize) -> Option<&[T]> {
    data.as_deref()
        .filter(|d| face_count > 0 && d.len() == face_count)
}

fn normalize_or_zero(v: crate::math::Vec3) -> [f32; 3] {
    let len = v.norm();
    if len > f32::EPSILON {
        let n = v / len;
        [n.x, n.y, n.z]
    } else {
        [0.0, 0.0, 0.0]
    }
}

//! Expansion of mesh arrays into upload bytes and immediate-mode vertices.

use std::ops::Range;

use meshview_core::math::Aabb;
use meshview_core::mesh::MeshModel;

use crate::attributes::{AttributeKind, AttributeRequirementSet};
use crate::types::ImmediateVertex;

/// Split `0..total` into consecutive ranges of at most `batch` items.
pub(crate) fn batches(total: usize, batch: usize) -> impl Iterator<Item = Range<usize>> {
    let batch = batch.max(1);
    (0..total)
        .step_by(batch)
        .map(move |start| start..(start + batch).min(total))
}

/// Bytes of one vertex-domain attribute for the vertices in `range`.
///
/// `None` when the mesh does not carry the array or `kind` is not stored
/// per vertex.
pub(crate) fn vertex_bytes(
    mesh: &MeshModel,
    kind: AttributeKind,
    range: Range<usize>,
    high_precision: bool,
) -> Option<Vec<u8>> {
    match kind {
        AttributeKind::VertPosition => {
            let positions = mesh.positions().get(range)?;
            Some(position_bytes(positions, high_precision))
        }
        AttributeKind::VertNormal => cast(mesh.vertex_normals()?.get(range)?),
        AttributeKind::VertColor => cast(mesh.vertex_colors()?.get(range)?),
        AttributeKind::VertTexture => cast(mesh.vertex_texcoords()?.get(range)?),
        _ => None,
    }
}

/// Bytes of one attribute expanded to three corners per face in `faces`.
pub(crate) fn corner_bytes(
    mesh: &MeshModel,
    kind: AttributeKind,
    faces: Range<usize>,
    high_precision: bool,
) -> Option<Vec<u8>> {
    let tris = mesh.faces().get(faces.clone())?;
    match kind {
        AttributeKind::VertPosition => {
            let corners: Vec<[f32; 3]> = gather(tris, mesh.positions())?;
            Some(position_bytes(&corners, high_precision))
        }
        AttributeKind::VertNormal => cast(&gather(tris, mesh.vertex_normals()?)?),
        AttributeKind::VertColor => cast(&gather(tris, mesh.vertex_colors()?)?),
        AttributeKind::VertTexture => cast(&gather(tris, mesh.vertex_texcoords()?)?),
        AttributeKind::FaceNormal => repeat_per_face(mesh.face_normals()?.get(faces)?),
        AttributeKind::FaceColor => repeat_per_face(mesh.face_colors()?.get(faces)?),
        AttributeKind::WedgeTexture => cast(mesh.wedge_texcoords()?.get(faces)?),
        AttributeKind::MeshColor | AttributeKind::VertIndex => None,
    }
}

/// Triangle indices of the faces in `faces`, as u32 little-endian bytes.
pub(crate) fn index_bytes(mesh: &MeshModel, faces: Range<usize>) -> Option<Vec<u8>> {
    cast(mesh.faces().get(faces)?)
}

fn position_bytes(positions: &[[f32; 3]], high_precision: bool) -> Vec<u8> {
    if high_precision {
        let wide: Vec<[f64; 3]> = positions.iter().map(|p| p.map(f64::from)).collect();
        bytemuck::cast_slice(&wide).to_vec()
    } else {
        bytemuck::cast_slice(positions).to_vec()
    }
}

fn cast<T: bytemuck::Pod>(data: &[T]) -> Option<Vec<u8>> {
    Some(bytemuck::cast_slice(data).to_vec())
}

/// Per-vertex values at every corner of `tris`. `None` if a corner indexes
/// past `values`.
fn gather<T: Copy>(tris: &[[u32; 3]], values: &[T]) -> Option<Vec<T>> {
    tris.iter()
        .flatten()
        .map(|&v| values.get(v as usize).copied())
        .collect()
}

fn repeat_per_face<T: bytemuck::Pod>(values: &[T]) -> Option<Vec<u8>> {
    let corners: Vec<T> = values.iter().flat_map(|v| [*v; 3]).collect();
    cast(&corners)
}

/// Consecutive runs of faces sharing a wedge texture slot.
///
/// Ranges are relative to `faces.start`. Without `per_wedge` the whole range
/// is one run on slot 0.
pub(crate) fn texture_runs(
    mesh: &MeshModel,
    faces: Range<usize>,
    per_wedge: bool,
) -> Vec<(Range<usize>, u16)> {
    let len = faces.len();
    if !per_wedge || len == 0 {
        return vec![(0..len, 0)];
    }
    let mut runs = Vec::new();
    let mut start = 0;
    let mut slot = mesh.wedge_texture_index(faces.start);
    for offset in 1..len {
        let next = mesh.wedge_texture_index(faces.start + offset);
        if next != slot {
            runs.push((start..offset, slot));
            start = offset;
            slot = next;
        }
    }
    runs.push((start..len, slot));
    runs
}

/// Immediate-mode corners of the faces in `faces`.
///
/// `rq` must already be reduced to what the mesh carries. Faces indexing a
/// missing vertex are left out.
pub(crate) fn immediate_corners(
    mesh: &MeshModel,
    rq: &AttributeRequirementSet,
    faces: Range<usize>,
) -> Vec<ImmediateVertex> {
    let Some(tris) = mesh.faces().get(faces.clone()) else {
        return Vec::new();
    };
    let positions = mesh.positions();
    let vertex_normals = mesh.vertex_normals().filter(|_| rq.contains(AttributeKind::VertNormal));
    let face_normals = mesh.face_normals().filter(|_| rq.contains(AttributeKind::FaceNormal));
    let vertex_colors = mesh.vertex_colors().filter(|_| rq.contains(AttributeKind::VertColor));
    let face_colors = mesh.face_colors().filter(|_| rq.contains(AttributeKind::FaceColor));
    let vertex_uvs = mesh.vertex_texcoords().filter(|_| rq.contains(AttributeKind::VertTexture));
    let wedge_uvs = mesh.wedge_texcoords().filter(|_| rq.contains(AttributeKind::WedgeTexture));

    let mut out = Vec::with_capacity(tris.len() * 3);
    for (face, tri) in faces.zip(tris) {
        if tri.iter().any(|&v| v as usize >= positions.len()) {
            continue;
        }
        for (corner, &v) in tri.iter().enumerate() {
            let v = v as usize;
            let mut vertex = ImmediateVertex::at(positions[v].map(f64::from));
            vertex.normal = face_normals
                .map(|n| n[face])
                .or_else(|| vertex_normals.map(|n| n[v]));
            vertex.color = face_colors
                .map(|c| c[face])
                .or_else(|| vertex_colors.map(|c| c[v]));
            vertex.texcoord = wedge_uvs
                .map(|t| t[face][corner])
                .or_else(|| vertex_uvs.map(|t| t[v]));
            out.push(vertex);
        }
    }
    out
}

/// Immediate-mode points for the vertices in `range`.
pub(crate) fn immediate_points(
    mesh: &MeshModel,
    rq: &AttributeRequirementSet,
    range: Range<usize>,
) -> Vec<ImmediateVertex> {
    let Some(positions) = mesh.positions().get(range.clone()) else {
        return Vec::new();
    };
    let normals = mesh.vertex_normals().filter(|_| rq.contains(AttributeKind::VertNormal));
    let colors = mesh.vertex_colors().filter(|_| rq.contains(AttributeKind::VertColor));
    let uvs = mesh.vertex_texcoords().filter(|_| rq.contains(AttributeKind::VertTexture));

    range
        .zip(positions)
        .map(|(v, p)| ImmediateVertex {
            position: p.map(f64::from),
            normal: normals.map(|n| n[v]),
            color: colors.map(|c| c[v]),
            texcoord: uvs.map(|t| t[v]),
        })
        .collect()
}

/// Corner pairs of the twelve box edges, indexed as in [`Aabb::corners`].
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    (0, 4),
    (4, 5),
    (5, 1),
    (5, 7),
    (7, 3),
    (7, 6),
    (6, 4),
    (6, 2),
];

/// The 24 line endpoints outlining `bbox`.
pub(crate) fn bbox_lines(bbox: &Aabb) -> [[f32; 3]; 24] {
    let corners = bbox.corners();
    let mut lines = [[0.0; 3]; 24];
    for (i, (a, b)) in BOX_EDGES.iter().enumerate() {
        let (a, b) = (corners[*a], corners[*b]);
        lines[2 * i] = [a.x, a.y, a.z];
        lines[2 * i + 1] = [b.x, b.y, b.z];
    }
    lines
}

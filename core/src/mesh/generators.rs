//! Mesh generators for common shapes.
//!
//! These produce [`MeshModel`] values with a known attribute mix, used by
//! tests, benches and demos that need a mesh without a file importer.

use std::f32::consts::PI;

use super::model::{Color, MeshModel};

/// Generate a flat grid in the XY plane.
///
/// The grid has `cols * rows` quads split into two triangles each, per-vertex
/// normals pointing along +Z and per-vertex texture coordinates spanning
/// `[0, 1]`.
///
/// # Arguments
///
/// * `cols` - Number of quads along X
/// * `rows` - Number of quads along Y
/// * `size` - Edge length of the whole grid
pub fn generate_grid(cols: u32, rows: u32, size: f32) -> MeshModel {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let mut positions = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
    let mut texcoords = Vec::with_capacity(positions.capacity());

    for row in 0..=rows {
        for col in 0..=cols {
            let u = col as f32 / cols as f32;
            let v = row as f32 / rows as f32;
            positions.push([(u - 0.5) * size, (v - 0.5) * size, 0.0]);
            texcoords.push([u, v]);
        }
    }

    let mut faces = Vec::with_capacity((cols * rows * 2) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let current = row * (cols + 1) + col;
            let next = current + cols + 1;
            faces.push([current, current + 1, next]);
            faces.push([current + 1, next + 1, next]);
        }
    }

    let normals = vec![[0.0, 0.0, 1.0]; positions.len()];
    MeshModel::new(positions)
        .with_faces(faces)
        .with_vertex_normals(normals)
        .with_vertex_texcoords(texcoords)
        .with_label("grid")
}

/// Generate an axis-aligned cube with unshared corners per side.
///
/// Every side has its own four vertices so both vertex and face normals are
/// exact. Faces get one color per side and wedge texture coordinates mapping
/// each side onto the full texture.
pub fn generate_cube(half_extent: f32) -> MeshModel {
    const SIDES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    const SIDE_COLORS: [Color; 6] = [
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [255, 255, 0, 255],
        [0, 255, 255, 255],
        [255, 0, 255, 255],
    ];

    let h = half_extent;
    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut faces = Vec::with_capacity(12);
    let mut face_normals = Vec::with_capacity(12);
    let mut face_colors = Vec::with_capacity(12);
    let mut wedges = Vec::with_capacity(12);

    for (side, (n, u, v)) in SIDES.iter().enumerate() {
        let base = positions.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            positions.push([
                (n[0] + u[0] * su + v[0] * sv) * h,
                (n[1] + u[1] * su + v[1] * sv) * h,
                (n[2] + u[2] * su + v[2] * sv) * h,
            ]);
            normals.push(*n);
        }
        faces.push([base, base + 1, base + 2]);
        faces.push([base, base + 2, base + 3]);
        wedges.push([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        wedges.push([[0.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        for _ in 0..2 {
            face_normals.push(*n);
            face_colors.push(SIDE_COLORS[side]);
        }
    }

    MeshModel::new(positions)
        .with_faces(faces)
        .with_vertex_normals(normals)
        .with_face_normals(face_normals)
        .with_face_colors(face_colors)
        .with_wedge_texcoords(wedges)
        .with_label("cube")
}

/// Generate a point cloud on a sphere using a Fibonacci spiral.
///
/// Points carry outward normals and a color ramp along Y. Output is fully
/// deterministic for a given `count`.
pub fn generate_point_cloud(count: u32, radius: f32) -> MeshModel {
    let golden = PI * (3.0 - 5.0_f32.sqrt());
    let mut positions = Vec::with_capacity(count as usize);
    let mut normals = Vec::with_capacity(count as usize);
    let mut colors = Vec::with_capacity(count as usize);

    for i in 0..count {
        let y = if count > 1 {
            1.0 - 2.0 * i as f32 / (count - 1) as f32
        } else {
            0.0
        };
        let r = (1.0 - y * y).max(0.0).sqrt();
        let theta = golden * i as f32;
        let n = [theta.cos() * r, y, theta.sin() * r];
        positions.push([n[0] * radius, n[1] * radius, n[2] * radius]);
        normals.push(n);
        let shade = ((y * 0.5 + 0.5) * 255.0) as u8;
        colors.push([shade, 128, 255 - shade, 255]);
    }

    MeshModel::new(positions)
        .with_vertex_normals(normals)
        .with_vertex_colors(colors)
        .with_label("point_cloud")
}

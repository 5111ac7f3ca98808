//! Render modes and their mapping onto attribute requirements and draws.
//!
//! A [`RenderMode`] is the declarative choice of draw style, color style and
//! texture style for one mesh. Everything the draw style implies lives in a
//! single table, [`DrawStyle::profile`], read both when computing which
//! attributes to upload and when choosing which feeder entry point draws
//! the mesh. The two cannot drift apart.
//!
//! Color and texture styles that need per-face variation (face colors,
//! per-wedge texture coordinates, and vertex texture coordinates) only
//! survive on styles that rasterize faces. On points and wireframes they
//! silently degrade to "not requested".

use meshview_core::math::{Vec3, transform_point};
use meshview_core::mesh::MeshDataMask;
use meshview_core::profiling::profile_function;

use crate::attributes::{AttributeFlags, AttributeKind, AttributeRequirementSet, PrimitiveModality};
use crate::context::CurrentContext;
use crate::feeder::PerMeshAttributeFeeder;
use crate::types::PointAttenuation;

/// How mesh geometry is rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawStyle {
    Points,
    Wire,
    Flat,
    #[default]
    Smooth,
    FlatWire,
    /// Bounding box only.
    Box,
}

/// Where colors come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorStyle {
    #[default]
    None,
    PerVertex,
    PerFace,
    PerMesh,
}

/// Where texture coordinates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureStyle {
    #[default]
    None,
    PerVertex,
    PerWedge,
    PerWedgeMulti,
}

/// Feeder entry point that draws a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawEntry {
    Points,
    Wire,
    FlatWire,
    Triangles,
    BoundingBox,
}

/// Everything a draw style implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStyleProfile {
    /// Attributes required before color and texture overlays.
    pub base: AttributeFlags,
    /// Whether filled faces are rasterized, enabling per-face overlays.
    pub rasterizes_faces: bool,
    pub modality: PrimitiveModality,
    pub entry: DrawEntry,
}

impl DrawStyle {
    pub fn profile(self) -> DrawStyleProfile {
        use AttributeFlags as F;
        match self {
            Self::Points => DrawStyleProfile {
                base: F::VERT_POSITION | F::VERT_NORMAL,
                rasterizes_faces: false,
                modality: PrimitiveModality::Points,
                entry: DrawEntry::Points,
            },
            Self::Wire => DrawStyleProfile {
                base: F::VERT_POSITION | F::VERT_NORMAL | F::VERT_INDEX,
                rasterizes_faces: false,
                modality: PrimitiveModality::Triangles,
                entry: DrawEntry::Wire,
            },
            Self::Smooth => DrawStyleProfile {
                base: F::VERT_POSITION | F::VERT_NORMAL | F::VERT_INDEX,
                rasterizes_faces: true,
                modality: PrimitiveModality::Triangles,
                entry: DrawEntry::Triangles,
            },
            Self::Flat => DrawStyleProfile {
                base: F::VERT_POSITION | F::FACE_NORMAL,
                rasterizes_faces: true,
                modality: PrimitiveModality::Triangles,
                entry: DrawEntry::Triangles,
            },
            Self::FlatWire => DrawStyleProfile {
                base: F::VERT_POSITION | F::FACE_NORMAL,
                rasterizes_faces: true,
                modality: PrimitiveModality::Triangles,
                entry: DrawEntry::FlatWire,
            },
            Self::Box => DrawStyleProfile {
                base: F::empty(),
                rasterizes_faces: false,
                modality: PrimitiveModality::None,
                entry: DrawEntry::BoundingBox,
            },
        }
    }
}

/// Draw style, color style and texture style of one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderMode {
    pub draw_style: DrawStyle,
    pub color_style: ColorStyle,
    pub texture_style: TextureStyle,
}

impl RenderMode {
    pub fn new(draw_style: DrawStyle) -> Self {
        Self {
            draw_style,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color_style: ColorStyle) -> Self {
        self.color_style = color_style;
        self
    }

    pub fn with_texture(mut self, texture_style: TextureStyle) -> Self {
        self.texture_style = texture_style;
        self
    }

    /// A reasonable first mode for a freshly loaded mesh.
    ///
    /// Point clouds get points with vertex colors and vertex texture
    /// coordinates; meshes with faces get smooth shading with vertex colors
    /// and wedge texture coordinates. Whatever the mesh lacks is dropped
    /// later by the compatibility reduction.
    pub fn suggested_for(mask: MeshDataMask) -> Self {
        if mask.contains(MeshDataMask::FACES) {
            Self::new(DrawStyle::Smooth)
                .with_color(ColorStyle::PerVertex)
                .with_texture(TextureStyle::PerWedge)
        } else {
            Self::new(DrawStyle::Points)
                .with_color(ColorStyle::PerVertex)
                .with_texture(TextureStyle::PerVertex)
        }
    }
}

/// Compute the attributes and modality a render mode needs.
pub fn required_attributes(mode: &RenderMode) -> AttributeRequirementSet {
    let profile = mode.draw_style.profile();
    let mut flags = profile.base;
    apply_color_overlay(&mut flags, mode.color_style, profile.rasterizes_faces);
    apply_texture_overlay(&mut flags, mode.texture_style, profile.rasterizes_faces);
    AttributeRequirementSet::new(flags, profile.modality).with_implied_index()
}

/// Primitive modality of a render mode.
pub fn primitive_modality(mode: &RenderMode) -> PrimitiveModality {
    mode.draw_style.profile().modality
}

/// Requirements of `mode`, reduced to what a mesh with data `mask` carries.
pub fn requirements_for_mesh(mode: &RenderMode, mask: MeshDataMask) -> AttributeRequirementSet {
    required_attributes(mode)
        .compatible_with(mask)
        .with_priorities()
}

/// The smallest set of attributes to invalidate after an edit.
///
/// An empty `update` needs nothing. Count or topology changes invalidate
/// everything the mode needs. Otherwise each touched array maps onto its
/// attribute; a face edit that keeps the face count also invalidates the
/// index buffer.
pub fn minimal_update_requirements(
    update: MeshDataMask,
    mesh_mask: MeshDataMask,
    mode: &RenderMode,
) -> AttributeRequirementSet {
    if update.is_empty() {
        return AttributeRequirementSet::empty();
    }
    let required = required_attributes(mode);
    if update.intersects(MeshDataMask::STRUCTURAL) {
        return required.compatible_with(mesh_mask);
    }

    const MAPPING: [(MeshDataMask, AttributeKind); 9] = [
        (MeshDataMask::VERT_COORD, AttributeKind::VertPosition),
        (MeshDataMask::VERT_NORMAL, AttributeKind::VertNormal),
        (MeshDataMask::FACE_NORMAL, AttributeKind::FaceNormal),
        (MeshDataMask::VERT_COLOR, AttributeKind::VertColor),
        (MeshDataMask::FACE_COLOR, AttributeKind::FaceColor),
        (MeshDataMask::MESH_COLOR, AttributeKind::MeshColor),
        (MeshDataMask::VERT_TEXCOORD, AttributeKind::VertTexture),
        (MeshDataMask::WEDGE_TEXCOORD, AttributeKind::WedgeTexture),
        (MeshDataMask::FACES, AttributeKind::VertIndex),
    ];
    let touched: AttributeRequirementSet = MAPPING
        .iter()
        .filter(|(bit, _)| update.contains(*bit))
        .map(|(_, kind)| *kind)
        .collect();
    touched
        .with_modality(required.modality())
        .compatible_with(mesh_mask)
}

fn apply_color_overlay(flags: &mut AttributeFlags, style: ColorStyle, rasterizes_faces: bool) {
    flags.remove(AttributeFlags::COLORS);
    match style {
        ColorStyle::None => {}
        ColorStyle::PerVertex => flags.insert(AttributeFlags::VERT_COLOR),
        ColorStyle::PerFace if rasterizes_faces => flags.insert(AttributeFlags::FACE_COLOR),
        ColorStyle::PerFace => {}
        ColorStyle::PerMesh => flags.insert(AttributeFlags::MESH_COLOR),
    }
}

fn apply_texture_overlay(flags: &mut AttributeFlags, style: TextureStyle, rasterizes_faces: bool) {
    flags.remove(AttributeFlags::TEXTURES);
    if !rasterizes_faces {
        return;
    }
    match style {
        TextureStyle::None => {}
        TextureStyle::PerVertex => flags.insert(AttributeFlags::VERT_TEXTURE),
        TextureStyle::PerWedge | TextureStyle::PerWedgeMulti => {
            flags.insert(AttributeFlags::WEDGE_TEXTURE)
        }
    }
}

/// Point rendering parameters for [`DrawStyle::Points`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointParams {
    pub size: f32,
    pub smooth: bool,
    /// Shrink points with their distance from the viewer.
    pub attenuation: bool,
}

impl Default for PointParams {
    fn default() -> Self {
        Self {
            size: 3.0,
            smooth: false,
            attenuation: true,
        }
    }
}

impl PointParams {
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }

    pub fn with_attenuation(mut self, attenuation: bool) -> Self {
        self.attenuation = attenuation;
        self
    }
}

const ATTENUATED_POINT_MIN: f32 = 1.0;
const ATTENUATED_POINT_MAX: f32 = 16.0;

/// Attenuation that keeps a point at `center` its nominal size.
fn point_attenuation_for(view_center: &Vec3) -> Option<PointAttenuation> {
    let distance = view_center.norm();
    if distance <= f32::EPSILON {
        return None;
    }
    Some(PointAttenuation {
        coefficients: [0.0, 0.0, 1.0 / (distance * distance)],
        min_size: ATTENUATED_POINT_MIN,
        max_size: ATTENUATED_POINT_MAX,
    })
}

/// Draw one mesh with `mode`.
///
/// Makes the context current, applies the mesh transform inside a matrix
/// push/pop pair, and dispatches on the draw style's entry point.
pub fn render_mesh(feeder: &PerMeshAttributeFeeder, mode: &RenderMode, points: &PointParams) {
    profile_function!();
    let required = required_attributes(mode);
    let ctx = CurrentContext::acquire(feeder.backend());
    let gpu = ctx.backend();
    let (transform, center) = {
        let mesh = feeder.mesh().read();
        (*mesh.transform(), mesh.bbox().center())
    };

    gpu.push_matrix();
    gpu.mult_matrix(&transform);
    match mode.draw_style.profile().entry {
        DrawEntry::Points => {
            gpu.push_state();
            gpu.set_point_smooth(points.smooth);
            gpu.set_point_size(points.size);
            let attenuation = if points.attenuation {
                point_attenuation_for(&transform_point(&gpu.modelview_matrix(), &center))
            } else {
                None
            };
            gpu.set_point_attenuation(attenuation);
            feeder.draw_points(&required);
            gpu.pop_state();
        }
        DrawEntry::Wire => feeder.draw_wire(&required),
        DrawEntry::FlatWire => feeder.draw_flat_wire(&required),
        DrawEntry::Triangles => feeder.draw_triangles(&required),
        DrawEntry::BoundingBox => feeder.draw_bbox(&required),
    }
    gpu.pop_matrix();
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttributeKind::*;

    fn kinds(set: &AttributeRequirementSet) -> Vec<AttributeKind> {
        set.iter().collect()
    }

    #[test]
    fn test_base_requirements() {
        let points = required_attributes(&RenderMode::new(DrawStyle::Points));
        assert_eq!(kinds(&points), vec![VertPosition, VertNormal]);
        assert_eq!(points.modality(), PrimitiveModality::Points);

        let smooth = required_attributes(&RenderMode::new(DrawStyle::Smooth));
        assert_eq!(kinds(&smooth), vec![VertPosition, VertNormal, VertIndex]);

        let wire = required_attributes(&RenderMode::new(DrawStyle::Wire));
        assert_eq!(kinds(&wire), vec![VertPosition, VertNormal, VertIndex]);

        let flat = required_attributes(&RenderMode::new(DrawStyle::Flat));
        assert_eq!(kinds(&flat), vec![VertPosition, FaceNormal]);
        assert_eq!(flat.modality(), PrimitiveModality::Triangles);

        let bbox = required_attributes(&RenderMode::new(DrawStyle::Box));
        assert!(bbox.is_empty());
        assert_eq!(bbox.modality(), PrimitiveModality::None);
    }

    #[test]
    fn test_per_face_color_needs_faces() {
        for style in [DrawStyle::Flat, DrawStyle::FlatWire, DrawStyle::Smooth] {
            let set = required_attributes(&RenderMode::new(style).with_color(ColorStyle::PerFace));
            assert!(set.contains(FaceColor), "{style:?}");
            assert!(set.contains(VertIndex), "{style:?}");
        }
        let wire =
            required_attributes(&RenderMode::new(DrawStyle::Wire).with_color(ColorStyle::PerFace));
        assert!(!wire.contains(FaceColor));
        assert_eq!(wire, required_attributes(&RenderMode::new(DrawStyle::Wire)));
    }

    #[test]
    fn test_color_overlay_is_exclusive() {
        let points = RenderMode::new(DrawStyle::Points);
        let set = required_attributes(&points.with_color(ColorStyle::PerMesh));
        assert!(set.contains(MeshColor));
        assert!(!set.contains(VertColor) && !set.contains(FaceColor));

        let set = required_attributes(&points.with_color(ColorStyle::PerVertex));
        assert!(set.contains(VertColor));
    }

    #[test]
    fn test_texture_overlay() {
        let set = required_attributes(
            &RenderMode::new(DrawStyle::Flat).with_texture(TextureStyle::PerWedgeMulti),
        );
        assert!(set.contains(WedgeTexture) && set.contains(VertIndex));
        assert!(!set.contains(VertTexture));

        let smooth = RenderMode::new(DrawStyle::Smooth);
        let set = required_attributes(&smooth.with_texture(TextureStyle::PerVertex));
        assert!(set.contains(VertTexture));

        let points = RenderMode::new(DrawStyle::Points);
        let set = required_attributes(&points.with_texture(TextureStyle::PerWedge));
        assert!(!set.contains(WedgeTexture) && !set.contains(VertIndex));
    }

    #[test]
    fn test_profile_drives_dispatch() {
        assert_eq!(DrawStyle::Flat.profile().entry, DrawEntry::Triangles);
        assert_eq!(DrawStyle::Smooth.profile().entry, DrawEntry::Triangles);
        assert_eq!(DrawStyle::FlatWire.profile().entry, DrawEntry::FlatWire);
        assert_eq!(DrawStyle::Box.profile().entry, DrawEntry::BoundingBox);
        assert_eq!(
            primitive_modality(&RenderMode::new(DrawStyle::Wire)),
            PrimitiveModality::Triangles
        );
    }

    #[test]
    fn test_minimal_update_requirements() {
        let mesh_mask = MeshDataMask::VERT_COORD
            | MeshDataMask::FACES
            | MeshDataMask::VERT_NORMAL
            | MeshDataMask::VERT_COLOR;
        let mode = RenderMode::new(DrawStyle::Smooth).with_color(ColorStyle::PerVertex);

        assert!(minimal_update_requirements(MeshDataMask::empty(), mesh_mask, &mode).is_empty());

        let colors = minimal_update_requirements(MeshDataMask::VERT_COLOR, mesh_mask, &mode);
        assert_eq!(kinds(&colors), vec![VertColor]);

        let structural = minimal_update_requirements(MeshDataMask::VERT_NUMBER, mesh_mask, &mode);
        assert_eq!(
            kinds(&structural),
            vec![VertPosition, VertNormal, VertColor, VertIndex]
        );

        let missing = minimal_update_requirements(MeshDataMask::FACE_COLOR, mesh_mask, &mode);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_suggested_mode() {
        let cloud = RenderMode::suggested_for(MeshDataMask::VERT_COORD);
        assert_eq!(cloud.draw_style, DrawStyle::Points);
        let mesh = RenderMode::suggested_for(MeshDataMask::VERT_COORD | MeshDataMask::FACES);
        assert_eq!(mesh.draw_style, DrawStyle::Smooth);
        assert_eq!(mesh.texture_style, TextureStyle::PerWedge);
    }

    #[test]
    fn test_point_attenuation() {
        let att = point_attenuation_for(&Vec3::new(0.0, 0.0, -2.0)).unwrap();
        assert_eq!(att.coefficients, [0.0, 0.0, 0.25]);
        assert_eq!((att.min_size, att.max_size), (1.0, 16.0));
        assert!(point_attenuation_for(&Vec3::zeros()).is_none());
    }
}

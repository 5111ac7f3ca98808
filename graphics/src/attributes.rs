//! Mesh attribute requirement sets.
//!
//! An [`AttributeRequirementSet`] names which mesh attributes a draw or an
//! allocation needs, plus the primitive modality it rasterizes. Sets are
//! plain values: every operation returns a new set and set algebra goes
//! through named methods instead of raw bit twiddling.
//!
//! Two fixups keep sets meaningful:
//! - [`with_implied_index`](AttributeRequirementSet::with_implied_index):
//!   per-face colors and per-wedge texture coordinates need the vertex index
//!   buffer, so `VERT_INDEX` is forced on whenever either is present.
//! - [`compatible_with`](AttributeRequirementSet::compatible_with): drop
//!   everything the mesh does not actually carry.

use std::fmt;

use bitflags::bitflags;
use meshview_core::mesh::MeshDataMask;

use crate::types::{AttributeFormat, AttributeSlot};

/// Semantic kind of a mesh attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    VertPosition,
    VertNormal,
    FaceNormal,
    VertColor,
    FaceColor,
    MeshColor,
    VertTexture,
    WedgeTexture,
    VertIndex,
}

impl AttributeKind {
    /// Every kind, in declaration order.
    pub const ALL: [AttributeKind; 9] = [
        Self::VertPosition,
        Self::VertNormal,
        Self::FaceNormal,
        Self::VertColor,
        Self::FaceColor,
        Self::MeshColor,
        Self::VertTexture,
        Self::WedgeTexture,
        Self::VertIndex,
    ];

    /// The flag bit for this kind.
    pub fn flag(self) -> AttributeFlags {
        match self {
            Self::VertPosition => AttributeFlags::VERT_POSITION,
            Self::VertNormal => AttributeFlags::VERT_NORMAL,
            Self::FaceNormal => AttributeFlags::FACE_NORMAL,
            Self::VertColor => AttributeFlags::VERT_COLOR,
            Self::FaceColor => AttributeFlags::FACE_COLOR,
            Self::MeshColor => AttributeFlags::MESH_COLOR,
            Self::VertTexture => AttributeFlags::VERT_TEXTURE,
            Self::WedgeTexture => AttributeFlags::WEDGE_TEXTURE,
            Self::VertIndex => AttributeFlags::VERT_INDEX,
        }
    }

    /// Whether one element exists per face corner rather than per vertex.
    pub fn is_per_corner(self) -> bool {
        matches!(self, Self::FaceNormal | Self::FaceColor | Self::WedgeTexture)
    }

    /// Whether this kind is stored in a GPU buffer at all.
    ///
    /// The mesh color is a single constant and never needs one.
    pub fn needs_buffer(self) -> bool {
        !matches!(self, Self::MeshColor)
    }

    /// Attribute slot the buffer binds to. `None` for the index buffer and
    /// the mesh color.
    pub fn slot(self) -> Option<AttributeSlot> {
        match self {
            Self::VertPosition => Some(AttributeSlot::Position),
            Self::VertNormal | Self::FaceNormal => Some(AttributeSlot::Normal),
            Self::VertColor | Self::FaceColor => Some(AttributeSlot::Color),
            Self::VertTexture | Self::WedgeTexture => Some(AttributeSlot::TexCoord),
            Self::MeshColor | Self::VertIndex => None,
        }
    }

    /// Element layout of the uploaded data. `None` for the index buffer and
    /// the mesh color.
    pub fn format(self, high_precision: bool) -> Option<AttributeFormat> {
        match self {
            Self::VertPosition if high_precision => Some(AttributeFormat::Float64x3),
            Self::VertPosition | Self::VertNormal | Self::FaceNormal => {
                Some(AttributeFormat::Float32x3)
            }
            Self::VertColor | Self::FaceColor => Some(AttributeFormat::Unorm8x4),
            Self::VertTexture | Self::WedgeTexture => Some(AttributeFormat::Float32x2),
            Self::MeshColor | Self::VertIndex => None,
        }
    }

    /// Bytes per element. Zero for the mesh color.
    pub fn element_size(self, high_precision: bool) -> u64 {
        match self {
            Self::VertIndex => std::mem::size_of::<u32>() as u64,
            _ => self.format(high_precision).map_or(0, |f| f.size()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::VertPosition => "vert_position",
            Self::VertNormal => "vert_normal",
            Self::FaceNormal => "face_normal",
            Self::VertColor => "vert_color",
            Self::FaceColor => "face_color",
            Self::MeshColor => "mesh_color",
            Self::VertTexture => "vert_texture",
            Self::WedgeTexture => "wedge_texture",
            Self::VertIndex => "vert_index",
        }
    }
}

bitflags! {
    /// One bit per [`AttributeKind`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeFlags: u16 {
        const VERT_POSITION = 1 << 0;
        const VERT_NORMAL = 1 << 1;
        const FACE_NORMAL = 1 << 2;
        const VERT_COLOR = 1 << 3;
        const FACE_COLOR = 1 << 4;
        const MESH_COLOR = 1 << 5;
        const VERT_TEXTURE = 1 << 6;
        const WEDGE_TEXTURE = 1 << 7;
        const VERT_INDEX = 1 << 8;

        const COLORS = Self::VERT_COLOR.bits() | Self::FACE_COLOR.bits() | Self::MESH_COLOR.bits();
        const TEXTURES = Self::VERT_TEXTURE.bits() | Self::WEDGE_TEXTURE.bits();
        const PER_CORNER = Self::FACE_NORMAL.bits()
            | Self::FACE_COLOR.bits()
            | Self::WEDGE_TEXTURE.bits();
    }
}

impl Default for AttributeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// How the attributes are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PrimitiveModality {
    #[default]
    None,
    Points,
    Triangles,
}

/// Attributes and primitive modality requested for a draw or an allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttributeRequirementSet {
    flags: AttributeFlags,
    modality: PrimitiveModality,
}

impl AttributeRequirementSet {
    /// Create a set from flags and a modality.
    pub fn new(flags: AttributeFlags, modality: PrimitiveModality) -> Self {
        Self { flags, modality }
    }

    /// The empty set with no modality.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A set of kinds with no modality.
    pub fn from_kinds(kinds: impl IntoIterator<Item = AttributeKind>) -> Self {
        let flags = kinds
            .into_iter()
            .fold(AttributeFlags::empty(), |acc, kind| acc | kind.flag());
        Self::new(flags, PrimitiveModality::None)
    }

    pub fn flags(&self) -> AttributeFlags {
        self.flags
    }

    pub fn modality(&self) -> PrimitiveModality {
        self.modality
    }

    pub fn with_modality(mut self, modality: PrimitiveModality) -> Self {
        self.modality = modality;
        self
    }

    pub fn contains(&self, kind: AttributeKind) -> bool {
        self.flags.contains(kind.flag())
    }

    /// Set or clear one kind.
    pub fn set(&mut self, kind: AttributeKind, enabled: bool) {
        self.flags.set(kind.flag(), enabled);
    }

    pub fn insert(&mut self, kind: AttributeKind) {
        self.set(kind, true);
    }

    pub fn remove(&mut self, kind: AttributeKind) {
        self.set(kind, false);
    }

    /// Kinds in either set. Keeps the larger modality.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.flags | other.flags, self.modality.max(other.modality))
    }

    /// Kinds in `self` but not in `other`. Keeps `self`'s modality.
    pub fn difference(&self, other: &Self) -> Self {
        Self::new(self.flags - other.flags, self.modality)
    }

    /// Kinds in both sets. Keeps `self`'s modality.
    pub fn intersection(&self, other: &Self) -> Self {
        Self::new(self.flags & other.flags, self.modality)
    }

    /// Whether every kind of `self` is also in `other`. Modality is ignored.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        other.flags.contains(self.flags)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.bits().count_ones() as usize
    }

    /// Kinds in the set, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = AttributeKind> + '_ {
        AttributeKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }

    /// Force `VERT_INDEX` on when per-face colors or per-wedge texture
    /// coordinates are requested.
    pub fn with_implied_index(mut self) -> Self {
        if self
            .flags
            .intersects(AttributeFlags::FACE_COLOR | AttributeFlags::WEDGE_TEXTURE)
        {
            self.flags |= AttributeFlags::VERT_INDEX;
        }
        self
    }

    /// Resolve overlapping kinds: vertex normals win over face normals,
    /// vertex colors over face colors, and wedge texture coordinates over
    /// vertex texture coordinates.
    pub fn with_priorities(mut self) -> Self {
        if self.contains(AttributeKind::VertNormal) {
            self.remove(AttributeKind::FaceNormal);
        }
        if self.contains(AttributeKind::VertColor) {
            self.remove(AttributeKind::FaceColor);
        }
        if self.contains(AttributeKind::WedgeTexture) {
            self.remove(AttributeKind::VertTexture);
        }
        self
    }

    /// Drop every kind the mesh described by `mask` does not carry.
    ///
    /// A mesh without vertices reduces to the empty set. Face-domain kinds
    /// and the index buffer need faces. Vertex texture coordinates are
    /// ignored on meshes that also carry wedge texture coordinates. A
    /// triangle modality on a face-less mesh becomes no modality.
    pub fn compatible_with(&self, mask: MeshDataMask) -> Self {
        if !mask.contains(MeshDataMask::VERT_COORD) {
            return Self::empty();
        }
        let has_faces = mask.contains(MeshDataMask::FACES);
        let wedge = has_faces && mask.contains(MeshDataMask::WEDGE_TEXCOORD);

        let mut allowed = AttributeFlags::VERT_POSITION;
        allowed.set(
            AttributeFlags::VERT_NORMAL,
            mask.contains(MeshDataMask::VERT_NORMAL),
        );
        allowed.set(
            AttributeFlags::FACE_NORMAL,
            has_faces && mask.contains(MeshDataMask::FACE_NORMAL),
        );
        allowed.set(
            AttributeFlags::VERT_COLOR,
            mask.contains(MeshDataMask::VERT_COLOR),
        );
        allowed.set(
            AttributeFlags::FACE_COLOR,
            has_faces && mask.contains(MeshDataMask::FACE_COLOR),
        );
        allowed.set(
            AttributeFlags::MESH_COLOR,
            mask.contains(MeshDataMask::MESH_COLOR),
        );
        allowed.set(
            AttributeFlags::VERT_TEXTURE,
            mask.contains(MeshDataMask::VERT_TEXCOORD) && !wedge,
        );
        allowed.set(AttributeFlags::WEDGE_TEXTURE, wedge);
        allowed.set(AttributeFlags::VERT_INDEX, has_faces);

        let modality = match self.modality {
            PrimitiveModality::Triangles if !has_faces => PrimitiveModality::None,
            other => other,
        };
        Self::new(self.flags & allowed, modality)
    }

    /// Whether buffers must hold one element per face corner.
    pub fn needs_per_corner_layout(&self) -> bool {
        self.flags.intersects(AttributeFlags::PER_CORNER)
    }
}

impl fmt::Debug for AttributeRequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter().map(AttributeKind::name).collect();
        f.debug_struct("AttributeRequirementSet")
            .field("attributes", &names)
            .field("modality", &self.modality)
            .finish()
    }
}

impl FromIterator<AttributeKind> for AttributeRequirementSet {
    fn from_iter<I: IntoIterator<Item = AttributeKind>>(iter: I) -> Self {
        Self::from_kinds(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttributeKind::*;

    fn full_mask() -> MeshDataMask {
        MeshDataMask::VERT_COORD
            | MeshDataMask::FACES
            | MeshDataMask::VERT_NORMAL
            | MeshDataMask::FACE_NORMAL
            | MeshDataMask::VERT_COLOR
            | MeshDataMask::FACE_COLOR
            | MeshDataMask::MESH_COLOR
            | MeshDataMask::VERT_TEXCOORD
            | MeshDataMask::WEDGE_TEXCOORD
    }

    #[test]
    fn test_set_algebra() {
        let a: AttributeRequirementSet =
            [VertPosition, VertNormal, VertColor].into_iter().collect();
        let b: AttributeRequirementSet = [VertNormal, VertColor].into_iter().collect();
        let diff = a.difference(&b);
        assert_eq!(diff.iter().collect::<Vec<_>>(), vec![VertPosition]);
        assert!(b.is_subset_of(&a));
        assert!(!a.is_subset_of(&b));
        assert_eq!(diff.union(&b), a);
        assert_eq!(a.intersection(&b), b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_union_keeps_larger_modality() {
        let points = AttributeRequirementSet::empty().with_modality(PrimitiveModality::Points);
        let tris = AttributeRequirementSet::empty().with_modality(PrimitiveModality::Triangles);
        assert_eq!(points.union(&tris).modality(), PrimitiveModality::Triangles);
    }

    #[test]
    fn test_implied_index() {
        let set = AttributeRequirementSet::from_kinds([VertPosition, FaceColor]);
        assert!(set.with_implied_index().contains(VertIndex));
        let set = AttributeRequirementSet::from_kinds([VertPosition, WedgeTexture]);
        assert!(set.with_implied_index().contains(VertIndex));
        let set = AttributeRequirementSet::from_kinds([VertPosition, VertColor]);
        assert!(!set.with_implied_index().contains(VertIndex));
    }

    #[test]
    fn test_priorities() {
        let set = AttributeRequirementSet::from_kinds(AttributeKind::ALL).with_priorities();
        assert!(!set.contains(FaceNormal));
        assert!(!set.contains(FaceColor));
        assert!(!set.contains(VertTexture));
        assert!(set.contains(VertNormal) && set.contains(VertColor) && set.contains(WedgeTexture));
    }

    #[test]
    fn test_compatibility_on_empty_mesh() {
        let set = AttributeRequirementSet::from_kinds(AttributeKind::ALL)
            .with_modality(PrimitiveModality::Points);
        assert_eq!(
            set.compatible_with(MeshDataMask::empty()),
            AttributeRequirementSet::empty()
        );
    }

    #[test]
    fn test_compatibility_on_point_cloud() {
        let mask = MeshDataMask::VERT_COORD | MeshDataMask::VERT_NORMAL | MeshDataMask::FACE_COLOR;
        let set = AttributeRequirementSet::from_kinds(AttributeKind::ALL)
            .with_modality(PrimitiveModality::Triangles)
            .compatible_with(mask);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![VertPosition, VertNormal]);
        assert_eq!(set.modality(), PrimitiveModality::None);
    }

    #[test]
    fn test_wedge_texcoords_shadow_vertex_texcoords() {
        let set = AttributeRequirementSet::from_kinds([VertPosition, VertTexture])
            .compatible_with(full_mask());
        assert!(!set.contains(VertTexture));

        let mask = full_mask() - MeshDataMask::WEDGE_TEXCOORD;
        let set = AttributeRequirementSet::from_kinds([VertPosition, VertTexture, WedgeTexture])
            .compatible_with(mask);
        assert!(set.contains(VertTexture));
        assert!(!set.contains(WedgeTexture));
    }

    #[test]
    fn test_element_sizes() {
        assert_eq!(VertPosition.element_size(false), 12);
        assert_eq!(VertPosition.element_size(true), 24);
        assert_eq!(VertColor.element_size(false), 4);
        assert_eq!(WedgeTexture.element_size(false), 8);
        assert_eq!(VertIndex.element_size(false), 4);
        assert_eq!(MeshColor.element_size(false), 0);
        assert!(!MeshColor.needs_buffer());
    }

    #[test]
    fn test_per_corner_layout() {
        assert!(AttributeRequirementSet::from_kinds([FaceNormal]).needs_per_corner_layout());
        assert!(!AttributeRequirementSet::from_kinds([VertNormal, VertIndex])
            .needs_per_corner_layout());
    }
}

//! Draw-call parameter types.

use meshview_core::mesh::Color;

/// Primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Points,
    Lines,
    Triangles,
}

impl PrimitiveType {
    /// Number of vertices per primitive.
    pub fn vertices_per_primitive(&self) -> u32 {
        match self {
            Self::Points => 1,
            Self::Lines => 2,
            Self::Triangles => 3,
        }
    }
}

/// Rasterization mode for polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
    Point,
}

/// Depth offset applied to filled polygons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: f32,
}

/// Distance attenuation of point sprites.
///
/// Rendered size is `size / sqrt(a + b * d + c * d * d)` clamped to
/// `[min_size, max_size]`, with `d` the eye-space distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAttenuation {
    pub coefficients: [f32; 3],
    pub min_size: f32,
    pub max_size: f32,
}

/// One vertex of an immediate-mode draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImmediateVertex {
    pub position: [f64; 3],
    pub normal: Option<[f32; 3]>,
    pub color: Option<Color>,
    pub texcoord: Option<[f32; 2]>,
}

impl ImmediateVertex {
    pub fn at(position: [f64; 3]) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

//! GPU call layer abstraction.
//!
//! The feeders and the scene context never talk to a graphics API directly.
//! Every raw call goes through [`GpuBackend`], a fixed-function style
//! interface: buffer and texture objects, attribute bindings, array and
//! indexed draws, an immediate-mode path, and the matrix and state stacks.
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: records every call for tests and headless runs
//!
//! A windowed application supplies its own implementation over its GL
//! context. All methods take `&self`; implementations synchronize internally
//! and assume the caller has made the context current (see
//! [`CurrentContext`](crate::context::CurrentContext)).

pub mod dummy;

pub use dummy::{DrawCommand, DrawRecord, DummyBackend};

use meshview_core::math::Mat4;
use meshview_core::mesh::Color;

use crate::error::GraphicsError;
use crate::types::{
    AttributeBinding, AttributeSlot, BufferDescriptor, BufferHandle, ImmediateVertex,
    PointAttenuation, PolygonMode, PolygonOffset, PrimitiveType, TextureDescriptor, TextureHandle,
};

/// Raw GPU operations used by the feeders and the scene context.
pub trait GpuBackend: Send + Sync + std::fmt::Debug {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Load the GPU function bindings. Failure here is unrecoverable.
    fn initialize(&self) -> Result<(), GraphicsError>;

    /// Make the GPU context current on the calling thread.
    fn make_current(&self);

    /// Release the GPU context made current by [`make_current`](Self::make_current).
    fn done_current(&self);

    /// Largest texture dimension the GPU accepts.
    fn max_texture_size(&self) -> u32;

    // ---- Buffers ----

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, GraphicsError>;

    /// Write `data` into `buffer` starting at byte `offset`.
    fn upload_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError>;

    /// Delete several buffers in one call. Unknown handles are ignored.
    fn delete_buffers(&self, buffers: &[BufferHandle]);

    // ---- Textures ----

    /// Create a texture from tightly packed base-level pixels.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<TextureHandle, GraphicsError>;

    /// Delete several textures in one call. Unknown handles are ignored.
    fn delete_textures(&self, textures: &[TextureHandle]);

    fn bind_texture(&self, texture: Option<TextureHandle>);

    // ---- Attributes and draws ----

    /// Bind a buffer to an attribute slot, or disable the slot with `None`.
    fn bind_vertex_attribute(&self, slot: AttributeSlot, binding: Option<AttributeBinding>);

    /// Color used when no color array is bound.
    fn set_constant_color(&self, color: Color);

    fn draw_arrays(&self, primitive: PrimitiveType, first: u32, count: u32);

    /// Draw `count` indices read from the start of `indices` (u32 elements).
    fn draw_elements(&self, primitive: PrimitiveType, indices: BufferHandle, count: u32);

    /// Emit vertices directly without buffer objects.
    fn draw_immediate(&self, primitive: PrimitiveType, vertices: &[ImmediateVertex]);

    // ---- State ----

    fn push_state(&self);
    fn pop_state(&self);
    fn push_matrix(&self);
    fn mult_matrix(&self, matrix: &Mat4);
    fn pop_matrix(&self);
    fn modelview_matrix(&self) -> Mat4;

    fn set_polygon_mode(&self, mode: PolygonMode);
    fn set_polygon_offset(&self, offset: Option<PolygonOffset>);
    fn set_point_size(&self, size: f32);
    fn set_point_smooth(&self, enabled: bool);
    fn set_point_attenuation(&self, attenuation: Option<PointAttenuation>);
}

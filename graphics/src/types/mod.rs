//! Common types for the graphics API.

mod buffer;
mod draw;
mod texture;

pub use buffer::{
    AttributeBinding, AttributeFormat, AttributeSlot, BufferDescriptor, BufferHandle, BufferUsage,
};
pub use draw::{ImmediateVertex, PointAttenuation, PolygonMode, PolygonOffset, PrimitiveType};
pub use texture::{TextureDescriptor, TextureFormat, TextureHandle};

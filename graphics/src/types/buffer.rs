//! Buffer types and descriptors.

use bitflags::bitflags;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer holds vertex attributes.
        const VERTEX = 1 << 0;
        /// Buffer holds triangle indices.
        const INDEX = 1 << 1;
        /// Contents are written once and drawn many times.
        const STATIC = 1 << 2;
        /// Contents are rewritten for every batch.
        const STREAM = 1 << 3;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Usage flags.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Opaque handle to a GPU buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Component layout of one vertex attribute element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
    Float64x3,
    Unorm8x4,
}

impl AttributeFormat {
    /// Size of one element in bytes.
    pub fn size(&self) -> u64 {
        match self {
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
            Self::Float64x3 => 24,
            Self::Unorm8x4 => 4,
        }
    }
}

/// Fixed-function vertex attribute slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeSlot {
    Position,
    Normal,
    Color,
    TexCoord,
}

/// A buffer bound to an attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeBinding {
    pub buffer: BufferHandle,
    pub format: AttributeFormat,
}

impl AttributeBinding {
    pub fn new(buffer: BufferHandle, format: AttributeFormat) -> Self {
        Self { buffer, format }
    }
}

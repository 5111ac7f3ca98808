//! Texture types and descriptors.

/// Texture pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
}

impl TextureFormat {
    /// Size of one pixel in bytes.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::Rgba8Unorm => 4,
        }
    }
}

/// Descriptor for creating a 2D texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Whether the backend builds the full mip chain after upload.
    pub generate_mipmaps: bool,
}

impl TextureDescriptor {
    /// Create a new RGBA8 texture descriptor.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            label: None,
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
            generate_mipmaps: false,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Request mipmap generation.
    pub fn with_mipmaps(mut self, generate: bool) -> Self {
        self.generate_mipmaps = generate;
        self
    }

    /// Number of mip levels the texture will have.
    pub fn mip_level_count(&self) -> u32 {
        if !self.generate_mipmaps {
            return 1;
        }
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Size of the base level in bytes.
    pub fn base_level_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_pixel() as u64
    }
}

/// Opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

//! # MeshView Graphics
//!
//! GPU mesh-attribute feeders and the scene-shared context of MeshView.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`AttributeRequirementSet`] - Which mesh attributes a draw or an allocation needs
//! - [`RenderMode`] - Draw, color and texture style, mapped onto requirements and draws
//! - [`PerMeshAttributeFeeder`] - Buffer objects of one mesh and its draw entry points
//! - [`SceneSharedContext`] - One feeder per document mesh, driven by document events
//! - [`ViewModes`] - Per-view render modes whose union decides the shared buffers
//! - [`GpuBackend`] - The raw GPU call layer, with a recording [`DummyBackend`]
//!
//! ## Example
//!
//! ```ignore
//! use meshview_graphics::{render_mode, DrawStyle, RenderMode, SceneSharedContext};
//!
//! let mode = RenderMode::new(DrawStyle::Flat);
//! let rq = render_mode::required_attributes(&mode);
//! scene.setup_requested_attributes_per_mesh(id, &rq);
//! scene.render_mesh(id, &mode, &PointParams::default());
//! ```

pub mod attributes;
pub mod backend;
pub mod context;
pub mod error;
pub mod feeder;
pub mod memory;
pub mod render_mode;
pub mod scene;
pub mod texture_names;
pub mod types;
pub mod views;

// Re-export main types for convenience
pub use attributes::{AttributeFlags, AttributeKind, AttributeRequirementSet, PrimitiveModality};
pub use backend::{DummyBackend, GpuBackend};
pub use context::CurrentContext;
pub use error::GraphicsError;
pub use feeder::{BufferLayout, BufferObjectPolicy, PerMeshAttributeFeeder};
pub use memory::{MemoryInfo, MemoryTracker};
pub use render_mode::{ColorStyle, DrawStyle, PointParams, RenderMode, TextureStyle};
pub use scene::{SceneConfig, SceneSharedContext, texture_target_size};
pub use texture_names::TextureNameContainer;
pub use types::{BufferDescriptor, BufferHandle, BufferUsage, TextureDescriptor, TextureHandle};
pub use views::{ViewId, ViewModes};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("MeshView Graphics v{} initialized", VERSION);
}

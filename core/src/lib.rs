//! # MeshView Core
//!
//! CPU-side data shared by the MeshView crates: math aliases, the triangle
//! mesh model, the mesh document with its lifecycle notifications, and
//! profiling macros.

pub mod document;
pub mod math;
pub mod mesh;
pub mod profiling;

pub use document::{DocumentEvent, MeshDocument, MeshId, SharedMesh};
pub use mesh::{MeshDataMask, MeshModel};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("MeshView Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

//! Owned list of GPU texture handles for one mesh.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::backend::GpuBackend;
use crate::context::CurrentContext;
use crate::types::TextureHandle;

/// Thread-safe ordered sequence of texture handles.
///
/// The handle at index `i` belongs to texture slot `i` of the mesh material.
/// Pushing a handle transfers its ownership to the container. [`clear`]
/// and `Drop` both free every held texture through one batched delete call,
/// and both are no-ops on an empty container.
///
/// The container has its own lock, independent from the feeder owning it,
/// so textures can be reloaded without touching vertex buffers.
///
/// [`clear`]: TextureNameContainer::clear
pub struct TextureNameContainer {
    handles: RwLock<Vec<TextureHandle>>,
    backend: Arc<dyn GpuBackend>,
}

impl std::fmt::Debug for TextureNameContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureNameContainer")
            .field("handles", &*self.handles.read())
            .finish_non_exhaustive()
    }
}

impl TextureNameContainer {
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            handles: RwLock::new(Vec::new()),
            backend,
        }
    }

    /// Append a handle, taking ownership of the texture.
    pub fn push(&self, handle: TextureHandle) {
        self.handles.write().push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }

    /// Handle of texture slot `index`.
    pub fn get(&self, index: usize) -> Option<TextureHandle> {
        self.handles.read().get(index).copied()
    }

    /// Copy of every held handle, in slot order.
    pub fn handles(&self) -> Vec<TextureHandle> {
        self.handles.read().clone()
    }

    /// Delete every held texture and empty the container.
    pub fn clear(&self) {
        self.release_all();
    }

    fn release_all(&self) {
        let mut handles = self.handles.write();
        if handles.is_empty() {
            return;
        }
        let owned = std::mem::take(&mut *handles);
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        ctx.backend().delete_textures(&owned);
        log::debug!("TextureNameContainer: released {} textures", owned.len());
    }
}

impl Drop for TextureNameContainer {
    fn drop(&mut self) {
        self.release_all();
    }
}

static_assertions::assert_impl_all!(TextureNameContainer: Send, Sync);

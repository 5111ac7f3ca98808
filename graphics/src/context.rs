//! Scoped GPU context ownership.

use crate::backend::GpuBackend;

/// Keeps the GPU context current for as long as it lives.
///
/// Acquiring calls [`GpuBackend::make_current`]; dropping calls
/// [`GpuBackend::done_current`], on every exit path. Guards nest: an inner
/// guard releases only its own acquisition.
///
/// ```ignore
/// let ctx = CurrentContext::acquire(backend.as_ref());
/// ctx.backend().delete_buffers(&handles);
/// // context released here
/// ```
#[must_use = "the context is released as soon as the guard is dropped"]
pub struct CurrentContext<'a> {
    backend: &'a dyn GpuBackend,
}

impl<'a> CurrentContext<'a> {
    pub fn acquire(backend: &'a dyn GpuBackend) -> Self {
        backend.make_current();
        Self { backend }
    }

    /// The backend whose context is held.
    pub fn backend(&self) -> &'a dyn GpuBackend {
        self.backend
    }
}

impl Drop for CurrentContext<'_> {
    fn drop(&mut self) {
        self.backend.done_current();
    }
}

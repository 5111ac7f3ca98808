//! Per-mesh GPU attribute feeder.
//!
//! A [`PerMeshAttributeFeeder`] turns attribute requirements into buffer
//! objects for one mesh and draws the mesh from them. When buffer objects
//! cannot be used (memory budget, policy, failed allocation) every draw
//! falls back to an immediate-mode path with the same attribute semantics.
//!
//! # Thread Safety
//!
//! The feeder wraps a non-thread-safe [`FeederCore`](core) in a
//! `parking_lot::RwLock`. Queries and draws take the read lock, so a render
//! thread and an update thread can read concurrently; allocation,
//! deallocation and configuration take the write lock. Draws that find stale
//! buffers take an upgradable read, re-upload, and downgrade.
//!
//! Every operation that issues GPU calls makes the context current for its
//! duration through a [`CurrentContext`] guard.

mod core;
mod stream;

pub use self::core::{BufferLayout, BufferObjectPolicy};

use std::sync::Arc;

use meshview_core::document::SharedMesh;
use meshview_core::mesh::{Color, MeshModel};
use meshview_core::profiling::profile_function;
use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};

use self::core::FeederCore;
use crate::attributes::{AttributeFlags, AttributeKind, AttributeRequirementSet};
use crate::backend::GpuBackend;
use crate::context::CurrentContext;
use crate::memory::MemoryTracker;
use crate::texture_names::TextureNameContainer;
use crate::types::{
    AttributeBinding, AttributeFormat, AttributeSlot, BufferDescriptor, BufferUsage,
    ImmediateVertex, PolygonMode, PolygonOffset, PrimitiveType,
};

/// Line color of the flat-wire overlay.
const WIRE_OVERLAY_COLOR: Color = [77, 77, 77, 255];
const BBOX_COLOR: Color = [255, 255, 255, 255];
const FLAT_WIRE_OFFSET: PolygonOffset = PolygonOffset {
    factor: 1.0,
    units: 1.0,
};

/// GPU buffer state and draw entry points of one mesh.
pub struct PerMeshAttributeFeeder {
    core: RwLock<FeederCore>,
    textures: TextureNameContainer,
    mesh: SharedMesh,
    memory: Arc<MemoryTracker>,
    backend: Arc<dyn GpuBackend>,
}

impl std::fmt::Debug for PerMeshAttributeFeeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerMeshAttributeFeeder")
            .field("core", &*self.core.read())
            .field("textures", &self.textures)
            .finish_non_exhaustive()
    }
}

impl PerMeshAttributeFeeder {
    /// Create a feeder with nothing allocated.
    pub fn new(
        mesh: SharedMesh,
        backend: Arc<dyn GpuBackend>,
        memory: Arc<MemoryTracker>,
        per_batch_primitives: usize,
        policy: BufferObjectPolicy,
        high_precision: bool,
    ) -> Self {
        Self {
            core: RwLock::new(FeederCore::new(per_batch_primitives, policy, high_precision)),
            textures: TextureNameContainer::new(Arc::clone(&backend)),
            mesh,
            memory,
            backend,
        }
    }

    // ---- Queries and configuration ----

    pub fn set_per_batch_primitives(&self, count: usize) {
        self.core.write().set_per_batch_primitives(count);
    }

    pub fn per_batch_primitives(&self) -> usize {
        self.core.read().per_batch_primitives()
    }

    /// Whether draws currently go through buffer objects.
    pub fn rendered_with_bo(&self) -> bool {
        self.core.read().rendered_with_bo()
    }

    pub fn allocated_attributes(&self) -> AttributeRequirementSet {
        self.core.read().allocated()
    }

    /// Whether the buffer of `kind` must be re-uploaded before its next use.
    pub fn is_stale(&self, kind: AttributeKind) -> bool {
        self.core.read().is_stale(kind)
    }

    /// Bytes held by this feeder's buffers.
    pub fn allocated_bytes(&self) -> u64 {
        self.core.read().allocated_bytes()
    }

    pub fn layout(&self) -> BufferLayout {
        self.core.read().layout()
    }

    /// Textures owned by this mesh, in material slot order.
    pub fn texture_names(&self) -> &TextureNameContainer {
        &self.textures
    }

    pub fn mesh(&self) -> &SharedMesh {
        &self.mesh
    }

    pub fn backend(&self) -> &dyn GpuBackend {
        self.backend.as_ref()
    }

    // ---- Allocation ----

    /// Allocate buffers for `rq`, reduced to what the mesh carries.
    ///
    /// Returns the full allocated set and whether this call allocated
    /// anything. Asking again for an already allocated set is a no-op.
    pub fn setup_requested_attributes(
        &self,
        rq: &AttributeRequirementSet,
    ) -> (AttributeRequirementSet, bool) {
        profile_function!();
        let mesh = self.mesh.read();
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        self.core
            .write()
            .setup(rq, &mesh, ctx.backend(), &self.memory)
    }

    /// Free the buffers of exactly the kinds in `rq`. Returns what remains.
    pub fn remove_requested_attributes(
        &self,
        rq: &AttributeRequirementSet,
    ) -> AttributeRequirementSet {
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        self.core.write().remove(rq, ctx.backend(), &self.memory)
    }

    /// Mark the buffers of `rq` as out of date with the mesh data.
    pub fn invalidate_requested_attributes(&self, rq: &AttributeRequirementSet) {
        self.core.write().invalidate(rq);
    }

    /// React to a mesh edit.
    ///
    /// Without connectivity changes the touched attributes are invalidated.
    /// When vertex or face counts changed every buffer is reallocated at the
    /// new size for the same attribute set.
    pub fn mesh_attributes_updated(
        &self,
        connectivity_changed: bool,
        atts: &AttributeRequirementSet,
    ) {
        if !connectivity_changed {
            self.invalidate_requested_attributes(atts);
            return;
        }
        let mesh = self.mesh.read();
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        let mut core = self.core.write();
        let previous = core.allocated();
        core.deallocate(ctx.backend(), &self.memory);
        let (allocated, _) = core.setup(&previous, &mesh, ctx.backend(), &self.memory);
        log::debug!(
            "PerMeshAttributeFeeder: reallocated {:?} after connectivity change",
            allocated
        );
    }

    /// Free every buffer object of this mesh.
    pub fn deallocate_bo(&self) {
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        self.core.write().deallocate(ctx.backend(), &self.memory);
    }

    /// Free every texture of this mesh.
    pub fn deallocate_textures(&self) {
        self.textures.clear();
    }

    // ---- Drawing ----

    /// Read access to the core with every stale buffer re-uploaded.
    fn refreshed_core(
        &self,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
    ) -> RwLockReadGuard<'_, FeederCore> {
        let core = self.core.upgradable_read();
        if !core.has_stale_buffers() {
            return RwLockUpgradableReadGuard::downgrade(core);
        }
        let mut core = RwLockUpgradableReadGuard::upgrade(core);
        core.refresh_stale(mesh, gpu, &self.memory);
        RwLockWriteGuard::downgrade(core)
    }

    /// Draw the mesh vertices as points.
    pub fn draw_points(&self, rq: &AttributeRequirementSet) {
        profile_function!();
        let mesh = self.mesh.read();
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        let gpu = ctx.backend();
        let core = self.refreshed_core(&mesh, gpu);
        if core.can_draw_with_bo(rq, &mesh, false) {
            core.draw_points_bo(rq, &mesh, gpu);
        } else {
            core.draw_points_immediate(rq, &mesh, gpu);
        }
    }

    /// Draw the mesh faces with the current polygon mode.
    ///
    /// Faces referencing vertices the mesh no longer has are not drawn.
    pub fn draw_triangles(&self, rq: &AttributeRequirementSet) {
        profile_function!();
        let mesh = self.mesh.read();
        if !mesh.faces_in_range() {
            log::warn!(
                "PerMeshAttributeFeeder: faces of {} index past its {} vertices, skipping draw",
                mesh.label().unwrap_or("mesh"),
                mesh.vertex_count()
            );
            return;
        }
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        let gpu = ctx.backend();
        let core = self.refreshed_core(&mesh, gpu);
        if core.can_draw_with_bo(rq, &mesh, true) {
            core.draw_triangles_bo(rq, &mesh, gpu, &self.textures);
        } else {
            core.draw_triangles_immediate(rq, &mesh, gpu, &self.textures);
        }
    }

    /// Draw the mesh faces as lines.
    pub fn draw_wire(&self, rq: &AttributeRequirementSet) {
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        let gpu = ctx.backend();
        gpu.push_state();
        gpu.set_polygon_mode(PolygonMode::Line);
        self.draw_triangles(rq);
        gpu.pop_state();
    }

    /// Draw filled faces pushed back slightly, then a gray wireframe on top.
    pub fn draw_flat_wire(&self, rq: &AttributeRequirementSet) {
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        let gpu = ctx.backend();

        gpu.push_state();
        gpu.set_polygon_offset(Some(FLAT_WIRE_OFFSET));
        self.draw_triangles(rq);
        gpu.pop_state();

        let uncolored = AttributeRequirementSet::new(
            rq.flags() - AttributeFlags::COLORS,
            rq.modality(),
        );
        gpu.push_state();
        gpu.set_constant_color(WIRE_OVERLAY_COLOR);
        gpu.set_polygon_mode(PolygonMode::Line);
        self.draw_triangles(&uncolored);
        gpu.pop_state();
    }

    /// Draw the twelve edges of the mesh bounding box in white.
    ///
    /// Independent of the allocated buffers: the edges go through a
    /// throwaway buffer, or immediately if it cannot be created.
    pub fn draw_bbox(&self, _rq: &AttributeRequirementSet) {
        profile_function!();
        let bbox = *self.mesh.read().bbox();
        if bbox.is_empty() {
            return;
        }
        let lines = stream::bbox_lines(&bbox);
        let bytes: &[u8] = bytemuck::cast_slice(&lines);

        let ctx = CurrentContext::acquire(self.backend.as_ref());
        let gpu = ctx.backend();
        gpu.push_state();
        gpu.set_constant_color(BBOX_COLOR);

        let descriptor = BufferDescriptor::new(bytes.len() as u64, BufferUsage::VERTEX)
            .with_label("bbox");
        let buffer = gpu.create_buffer(&descriptor).and_then(|handle| {
            match gpu.upload_buffer(handle, 0, bytes) {
                Ok(()) => Ok(handle),
                Err(err) => {
                    gpu.delete_buffers(&[handle]);
                    Err(err)
                }
            }
        });
        match buffer {
            Ok(handle) => {
                for slot in [AttributeSlot::Normal, AttributeSlot::Color, AttributeSlot::TexCoord] {
                    gpu.bind_vertex_attribute(slot, None);
                }
                gpu.bind_vertex_attribute(
                    AttributeSlot::Position,
                    Some(AttributeBinding::new(handle, AttributeFormat::Float32x3)),
                );
                gpu.draw_arrays(PrimitiveType::Lines, 0, lines.len() as u32);
                gpu.bind_vertex_attribute(AttributeSlot::Position, None);
                gpu.delete_buffers(&[handle]);
            }
            Err(err) => {
                log::debug!(
                    "PerMeshAttributeFeeder: bbox buffer unavailable ({}), drawing immediately",
                    err
                );
                let vertices: Vec<ImmediateVertex> = lines
                    .iter()
                    .map(|p| ImmediateVertex::at(p.map(f64::from)))
                    .collect();
                gpu.draw_immediate(PrimitiveType::Lines, &vertices);
            }
        }
        gpu.pop_state();
    }
}

impl Drop for PerMeshAttributeFeeder {
    fn drop(&mut self) {
        let core = self.core.get_mut();
        if core.buffer_count() > 0 {
            log::warn!(
                "PerMeshAttributeFeeder dropped with {} live buffers ({} bytes); \
                 call deallocate_bo first",
                core.buffer_count(),
                core.allocated_bytes()
            );
        }
    }
}

static_assertions::assert_impl_all!(PerMeshAttributeFeeder: Send, Sync);

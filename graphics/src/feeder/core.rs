//! Buffer-object bookkeeping of one mesh, without any locking.
//!
//! [`FeederCore`] owns the per-attribute GPU buffers and decides their
//! layout and sizes. It is not thread-safe; the
//! [`PerMeshAttributeFeeder`](super::PerMeshAttributeFeeder) wraps it in a
//! lock and every method here assumes the GPU context is current.
//!
//! # Layouts
//!
//! - [`BufferLayout::PerVertex`]: vertex-domain buffers hold the whole mesh
//!   and are uploaded once. The index buffer holds one batch of triangles
//!   and is refilled for every batch.
//! - [`BufferLayout::PerCorner`]: used as soon as a per-face or per-wedge
//!   attribute is allocated. Every buffer holds one batch of expanded face
//!   corners and is refilled for every batch.

use std::collections::BTreeMap;
use std::ops::Range;

use meshview_core::mesh::{Color, MeshModel};
use meshview_core::profiling::profile_scope;

use crate::attributes::{AttributeKind, AttributeRequirementSet, PrimitiveModality};
use crate::backend::GpuBackend;
use crate::error::GraphicsError;
use crate::memory::MemoryTracker;
use crate::texture_names::TextureNameContainer;
use crate::types::{
    AttributeBinding, AttributeSlot, BufferDescriptor, BufferHandle, BufferUsage, PrimitiveType,
};

use super::stream;

/// How attribute buffers are laid out on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferLayout {
    /// One element per vertex plus a streamed index buffer.
    #[default]
    PerVertex,
    /// One element per face corner, streamed batch by batch.
    PerCorner,
}

/// Decides whether a mesh may be drawn through buffer objects at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferObjectPolicy {
    /// Meshes with more primitives than this are always drawn immediately.
    pub max_primitive_count: Option<usize>,
    /// Largest number of attribute arrays bound at once.
    pub max_attribute_slots: usize,
}

impl Default for BufferObjectPolicy {
    fn default() -> Self {
        Self {
            max_primitive_count: None,
            max_attribute_slots: 16,
        }
    }
}

impl BufferObjectPolicy {
    pub fn with_max_primitive_count(mut self, count: usize) -> Self {
        self.max_primitive_count = Some(count);
        self
    }

    pub fn with_max_attribute_slots(mut self, slots: usize) -> Self {
        self.max_attribute_slots = slots;
        self
    }

    /// Whether `set` on a mesh with `primitives` primitives is eligible.
    pub fn allows(&self, primitives: usize, set: &AttributeRequirementSet) -> bool {
        if self.max_primitive_count.is_some_and(|max| primitives > max) {
            return false;
        }
        let arrays = set.iter().filter(|kind| kind.slot().is_some()).count();
        arrays <= self.max_attribute_slots
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BufferSlot {
    handle: BufferHandle,
    size: u64,
    stale: bool,
}

/// Non-thread-safe buffer-object state of one mesh.
#[derive(Debug)]
pub(crate) struct FeederCore {
    per_batch_primitives: usize,
    allocated: AttributeRequirementSet,
    layout: BufferLayout,
    /// Faces held by each streamed buffer.
    stream_capacity: usize,
    buffers: BTreeMap<AttributeKind, BufferSlot>,
    bo_possible: bool,
    policy: BufferObjectPolicy,
    high_precision: bool,
}

impl FeederCore {
    pub(crate) fn new(
        per_batch_primitives: usize,
        policy: BufferObjectPolicy,
        high_precision: bool,
    ) -> Self {
        Self {
            per_batch_primitives: per_batch_primitives.max(1),
            allocated: AttributeRequirementSet::empty(),
            layout: BufferLayout::default(),
            stream_capacity: 0,
            buffers: BTreeMap::new(),
            bo_possible: false,
            policy,
            high_precision,
        }
    }

    // ---- Queries ----

    pub(crate) fn per_batch_primitives(&self) -> usize {
        self.per_batch_primitives
    }

    /// Takes effect for draws right away; streamed buffers keep the capacity
    /// they were allocated with until the next reallocation.
    pub(crate) fn set_per_batch_primitives(&mut self, count: usize) {
        self.per_batch_primitives = count.max(1);
    }

    pub(crate) fn rendered_with_bo(&self) -> bool {
        self.bo_possible
    }

    pub(crate) fn allocated(&self) -> AttributeRequirementSet {
        self.allocated
    }

    pub(crate) fn layout(&self) -> BufferLayout {
        self.layout
    }

    pub(crate) fn allocated_bytes(&self) -> u64 {
        self.buffers.values().map(|slot| slot.size).sum()
    }

    pub(crate) fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub(crate) fn is_stale(&self, kind: AttributeKind) -> bool {
        self.buffers.get(&kind).is_some_and(|slot| slot.stale)
    }

    pub(crate) fn has_stale_buffers(&self) -> bool {
        self.buffers.values().any(|slot| slot.stale)
    }

    fn holds_whole_mesh(&self, kind: AttributeKind) -> bool {
        self.layout == BufferLayout::PerVertex && kind != AttributeKind::VertIndex
    }

    /// Size of the buffer `kind` needs, or `None` if it needs none.
    fn buffer_size(
        &self,
        kind: AttributeKind,
        layout: BufferLayout,
        stream_capacity: usize,
        mesh: &MeshModel,
    ) -> Option<u64> {
        if !kind.needs_buffer() {
            return None;
        }
        let element = kind.element_size(self.high_precision);
        let corners = stream_capacity as u64 * 3;
        match (layout, kind) {
            (BufferLayout::PerVertex, AttributeKind::VertIndex) => Some(corners * element),
            (BufferLayout::PerVertex, _) => Some(mesh.vertex_count() as u64 * element),
            (BufferLayout::PerCorner, AttributeKind::VertIndex) => None,
            (BufferLayout::PerCorner, _) => Some(corners * element),
        }
    }

    // ---- Allocation ----

    /// Allocate buffers for every kind of `rq` the mesh carries.
    ///
    /// Returns the allocated set and whether anything new was allocated.
    /// Memory is accounted before any buffer is created. On failure nothing
    /// allocated by this call survives and buffer-object rendering is
    /// disabled until a later call succeeds, including one that asks only
    /// for buffers already held. A layout switch refused by the budget keeps
    /// the previous buffers; one failing after their release leaves nothing.
    pub(crate) fn setup(
        &mut self,
        rq: &AttributeRequirementSet,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
        memory: &MemoryTracker,
    ) -> (AttributeRequirementSet, bool) {
        let rq = rq.compatible_with(mesh.data_mask());
        if rq.is_subset_of(&self.allocated) {
            // Nothing to allocate: the buffers already held decide.
            self.bo_possible = !self.buffers.is_empty()
                && self
                    .policy
                    .allows(primitive_count(&self.allocated, mesh), &self.allocated);
            return (self.allocated, false);
        }

        let target = self.allocated.union(&rq);
        let primitives = primitive_count(&target, mesh);
        if !self.policy.allows(primitives, &target) {
            log::debug!(
                "FeederCore: {:?} on {} primitives not eligible for buffer objects",
                target,
                primitives
            );
            self.bo_possible = false;
            return (self.allocated, false);
        }

        let keep_per_corner = self.layout == BufferLayout::PerCorner && !self.buffers.is_empty();
        let layout = if target.needs_per_corner_layout() || keep_per_corner {
            BufferLayout::PerCorner
        } else {
            BufferLayout::PerVertex
        };
        let relayout = layout != self.layout && !self.buffers.is_empty();
        let stream_capacity = if self.buffers.is_empty() || relayout {
            mesh.face_count().min(self.per_batch_primitives)
        } else {
            self.stream_capacity
        };

        let pending = if relayout {
            target
        } else {
            rq.difference(&self.allocated)
        };
        let plan: Vec<(AttributeKind, u64)> = pending
            .iter()
            .filter_map(|kind| {
                self.buffer_size(kind, layout, stream_capacity, mesh)
                    .map(|size| (kind, size))
            })
            .collect();
        let needed: u64 = plan.iter().map(|(_, size)| size).sum();
        let freed = if relayout { self.allocated_bytes() } else { 0 };

        if !memory.is_additional_memory_available(needed.saturating_sub(freed)) {
            log::warn!(
                "FeederCore: {} bytes requested for {:?} exceed the memory budget",
                needed,
                pending
            );
            self.bo_possible = false;
            return (self.allocated, false);
        }

        if relayout {
            log::debug!("FeederCore: switching to {:?} layout", layout);
            self.release_all(gpu, memory);
            self.reset();
        }
        if !memory.acquire(needed) {
            log::warn!("FeederCore: lost the race for {} bytes of GPU memory", needed);
            self.bo_possible = false;
            return (self.allocated, false);
        }

        let mut created: Vec<(AttributeKind, BufferSlot)> = Vec::with_capacity(plan.len());
        for (kind, size) in plan {
            match self.create_buffer(kind, size, layout, mesh, gpu) {
                Ok(handle) => created.push((
                    kind,
                    BufferSlot {
                        handle,
                        size,
                        stale: false,
                    },
                )),
                Err(err) => {
                    log::warn!("FeederCore: {} buffer allocation failed: {}", kind.name(), err);
                    let handles: Vec<_> = created.iter().map(|(_, slot)| slot.handle).collect();
                    if !handles.is_empty() {
                        gpu.delete_buffers(&handles);
                    }
                    memory.release(needed);
                    self.bo_possible = false;
                    return (self.allocated, false);
                }
            }
        }

        self.buffers.extend(created);
        self.layout = layout;
        self.stream_capacity = stream_capacity;
        self.allocated = target;
        self.bo_possible = true;
        log::debug!(
            "FeederCore: allocated {:?} ({} bytes, {:?} layout)",
            self.allocated,
            self.allocated_bytes(),
            self.layout
        );
        (self.allocated, true)
    }

    fn create_buffer(
        &self,
        kind: AttributeKind,
        size: u64,
        layout: BufferLayout,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
    ) -> Result<BufferHandle, GraphicsError> {
        let whole_mesh = layout == BufferLayout::PerVertex && kind != AttributeKind::VertIndex;
        let usage = match (kind, whole_mesh) {
            (AttributeKind::VertIndex, _) => BufferUsage::INDEX | BufferUsage::STREAM,
            (_, true) => BufferUsage::VERTEX | BufferUsage::STATIC,
            (_, false) => BufferUsage::VERTEX | BufferUsage::STREAM,
        };
        let label = format!("{}:{}", mesh.label().unwrap_or("mesh"), kind.name());
        let handle = gpu.create_buffer(&BufferDescriptor::new(size, usage).with_label(label))?;
        if whole_mesh {
            let data = stream::vertex_bytes(mesh, kind, 0..mesh.vertex_count(), self.high_precision)
                .unwrap_or_default();
            if let Err(err) = gpu.upload_buffer(handle, 0, &data) {
                gpu.delete_buffers(&[handle]);
                return Err(err);
            }
        }
        Ok(handle)
    }

    /// Free the buffers of every allocated kind in `rq`. Returns what is left.
    pub(crate) fn remove(
        &mut self,
        rq: &AttributeRequirementSet,
        gpu: &dyn GpuBackend,
        memory: &MemoryTracker,
    ) -> AttributeRequirementSet {
        let removed = rq.intersection(&self.allocated);
        if removed.is_empty() {
            return self.allocated;
        }
        let slots: Vec<BufferSlot> = removed
            .iter()
            .filter_map(|kind| self.buffers.remove(&kind))
            .collect();
        Self::delete_slots(&slots, gpu, memory);
        self.allocated = self.allocated.difference(&removed);
        if self.allocated.is_empty() {
            self.reset();
        }
        self.allocated
    }

    pub(crate) fn invalidate(&mut self, rq: &AttributeRequirementSet) {
        for kind in rq.iter() {
            // Streamed buffers are rewritten on every draw anyway.
            let whole_mesh = self.holds_whole_mesh(kind);
            if let Some(slot) = self.buffers.get_mut(&kind) {
                slot.stale = whole_mesh;
            }
        }
    }

    /// Re-upload every stale whole-mesh buffer.
    ///
    /// A buffer whose size no longer matches the vertex count is recreated
    /// at the new size. A buffer that cannot be refreshed stays stale, which
    /// keeps draws of its kind on the immediate path.
    pub(crate) fn refresh_stale(
        &mut self,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
        memory: &MemoryTracker,
    ) {
        profile_scope!("refresh_stale");
        let stale: Vec<AttributeKind> = self
            .buffers
            .iter()
            .filter(|(_, slot)| slot.stale)
            .map(|(kind, _)| *kind)
            .collect();
        for kind in stale {
            match self.rewrite_whole_mesh(kind, mesh, gpu, memory) {
                Ok(()) => {
                    if let Some(slot) = self.buffers.get_mut(&kind) {
                        slot.stale = false;
                    }
                }
                Err(err) => log::warn!("FeederCore: re-upload of {} failed: {}", kind.name(), err),
            }
        }
    }

    fn rewrite_whole_mesh(
        &mut self,
        kind: AttributeKind,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
        memory: &MemoryTracker,
    ) -> Result<(), GraphicsError> {
        let Some(slot) = self.buffers.get(&kind).copied() else {
            return Ok(());
        };
        let data = stream::vertex_bytes(mesh, kind, 0..mesh.vertex_count(), self.high_precision)
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!("mesh no longer carries {}", kind.name()))
            })?;
        let size = data.len() as u64;
        if size == slot.size {
            return gpu.upload_buffer(slot.handle, 0, &data);
        }

        let growth = size.saturating_sub(slot.size);
        if !memory.acquire(growth) {
            return Err(GraphicsError::OutOfMemory);
        }
        let handle = match self.create_buffer(kind, size, self.layout, mesh, gpu) {
            Ok(handle) => handle,
            Err(err) => {
                memory.release(growth);
                return Err(err);
            }
        };
        gpu.delete_buffers(&[slot.handle]);
        memory.release(slot.size.saturating_sub(size));
        log::debug!(
            "FeederCore: resized {} buffer from {} to {} bytes",
            kind.name(),
            slot.size,
            size
        );
        self.buffers.insert(
            kind,
            BufferSlot {
                handle,
                size,
                stale: false,
            },
        );
        Ok(())
    }

    /// Free every buffer and forget the allocated set.
    pub(crate) fn deallocate(&mut self, gpu: &dyn GpuBackend, memory: &MemoryTracker) {
        self.release_all(gpu, memory);
        self.reset();
    }

    fn release_all(&mut self, gpu: &dyn GpuBackend, memory: &MemoryTracker) {
        let slots: Vec<BufferSlot> = std::mem::take(&mut self.buffers).into_values().collect();
        Self::delete_slots(&slots, gpu, memory);
    }

    fn delete_slots(slots: &[BufferSlot], gpu: &dyn GpuBackend, memory: &MemoryTracker) {
        if slots.is_empty() {
            return;
        }
        let handles: Vec<BufferHandle> = slots.iter().map(|slot| slot.handle).collect();
        gpu.delete_buffers(&handles);
        memory.release(slots.iter().map(|slot| slot.size).sum());
    }

    fn reset(&mut self) {
        self.allocated = AttributeRequirementSet::empty();
        self.layout = BufferLayout::PerVertex;
        self.stream_capacity = 0;
        self.bo_possible = false;
    }

    // ---- Drawing ----

    /// Whether `rq` can be drawn from the allocated buffers.
    ///
    /// Every whole-mesh buffer the draw binds must be fresh and sized to the
    /// current vertex count.
    pub(crate) fn can_draw_with_bo(
        &self,
        rq: &AttributeRequirementSet,
        mesh: &MeshModel,
        triangles: bool,
    ) -> bool {
        if !self.bo_possible {
            return false;
        }
        let usable = rq.intersection(&self.allocated);
        if !usable.contains(AttributeKind::VertPosition) {
            return false;
        }
        let indexed = !triangles
            || self.layout == BufferLayout::PerCorner
            || usable.contains(AttributeKind::VertIndex);
        indexed && self.whole_mesh_buffers_fit(&usable, mesh)
    }

    fn whole_mesh_buffers_fit(&self, usable: &AttributeRequirementSet, mesh: &MeshModel) -> bool {
        let vertices = mesh.vertex_count() as u64;
        usable
            .iter()
            .filter(|kind| self.holds_whole_mesh(*kind))
            .filter_map(|kind| self.buffers.get(&kind).map(|slot| (kind, slot)))
            .all(|(kind, slot)| {
                !slot.stale && slot.size == vertices * kind.element_size(self.high_precision)
            })
    }

    /// Bind the buffers of `kinds` to their slots; later kinds win a slot.
    fn bind(&self, kinds: impl Iterator<Item = AttributeKind>, gpu: &dyn GpuBackend) {
        let mut bindings: BTreeMap<AttributeSlot, AttributeBinding> = BTreeMap::new();
        for kind in kinds {
            let (Some(slot), Some(format), Some(buffer)) = (
                kind.slot(),
                kind.format(self.high_precision),
                self.buffers.get(&kind),
            ) else {
                continue;
            };
            bindings.insert(slot, AttributeBinding::new(buffer.handle, format));
        }
        for slot in [
            AttributeSlot::Position,
            AttributeSlot::Normal,
            AttributeSlot::Color,
            AttributeSlot::TexCoord,
        ] {
            gpu.bind_vertex_attribute(slot, bindings.get(&slot).copied());
        }
    }

    fn unbind(gpu: &dyn GpuBackend) {
        for slot in [
            AttributeSlot::Position,
            AttributeSlot::Normal,
            AttributeSlot::Color,
            AttributeSlot::TexCoord,
        ] {
            gpu.bind_vertex_attribute(slot, None);
        }
        gpu.bind_texture(None);
    }

    fn upload_stream(
        &self,
        kind: AttributeKind,
        data: Option<Vec<u8>>,
        gpu: &dyn GpuBackend,
    ) -> Result<(), GraphicsError> {
        let Some(slot) = self.buffers.get(&kind) else {
            return Ok(());
        };
        match data {
            Some(bytes) => gpu.upload_buffer(slot.handle, 0, &bytes),
            None => Err(GraphicsError::InvalidParameter(format!(
                "mesh no longer carries {}",
                kind.name()
            ))),
        }
    }

    /// Draw the mesh faces from buffer objects, one call per batch.
    pub(crate) fn draw_triangles_bo(
        &self,
        rq: &AttributeRequirementSet,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
        textures: &TextureNameContainer,
    ) {
        let usable = rq.intersection(&self.allocated);
        let batch = self.per_batch_primitives.min(self.stream_capacity.max(1));
        with_mesh_color(&usable, mesh, gpu, || {
            self.bind(usable.iter(), gpu);
            match self.layout {
                BufferLayout::PerVertex => self.draw_indexed(&usable, mesh, gpu, textures, batch),
                BufferLayout::PerCorner => self.draw_corners(&usable, mesh, gpu, textures, batch),
            }
            Self::unbind(gpu);
        });
    }

    fn draw_indexed(
        &self,
        usable: &AttributeRequirementSet,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
        textures: &TextureNameContainer,
        batch: usize,
    ) {
        let Some(index) = self.buffers.get(&AttributeKind::VertIndex) else {
            return;
        };
        if usable.contains(AttributeKind::VertTexture) {
            gpu.bind_texture(textures.get(0));
        }
        for faces in stream::batches(mesh.face_count(), batch) {
            profile_scope!("draw_indexed_batch");
            let count = faces.len() as u32 * 3;
            let result = match stream::index_bytes(mesh, faces) {
                Some(bytes) => gpu.upload_buffer(index.handle, 0, &bytes),
                None => Ok(()),
            };
            if let Err(err) = result {
                log::warn!("FeederCore: index upload failed: {}", err);
                return;
            }
            gpu.draw_elements(PrimitiveType::Triangles, index.handle, count);
        }
    }

    fn draw_corners(
        &self,
        usable: &AttributeRequirementSet,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
        textures: &TextureNameContainer,
        batch: usize,
    ) {
        let per_wedge = usable.contains(AttributeKind::WedgeTexture);
        let textured = per_wedge || usable.contains(AttributeKind::VertTexture);
        for faces in stream::batches(mesh.face_count(), batch) {
            profile_scope!("draw_corner_batch");
            for kind in usable.iter() {
                let data = stream::corner_bytes(mesh, kind, faces.clone(), self.high_precision);
                if let Err(err) = self.upload_stream(kind, data, gpu) {
                    log::warn!("FeederCore: corner upload failed: {}", err);
                    return;
                }
            }
            draw_texture_runs(mesh, faces, per_wedge, textured, textures, gpu, |run| {
                gpu.draw_arrays(
                    PrimitiveType::Triangles,
                    run.start as u32 * 3,
                    run.len() as u32 * 3,
                );
            });
        }
    }

    /// Draw the mesh vertices as points from buffer objects.
    pub(crate) fn draw_points_bo(
        &self,
        rq: &AttributeRequirementSet,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
    ) {
        let mut usable = rq.intersection(&self.allocated);
        for kind in AttributeKind::ALL.into_iter().filter(|k| k.is_per_corner()) {
            usable.remove(kind);
        }
        with_mesh_color(&usable, mesh, gpu, || {
            self.bind(usable.iter(), gpu);
            match self.layout {
                BufferLayout::PerVertex => {
                    for vertices in stream::batches(mesh.vertex_count(), self.per_batch_primitives)
                    {
                        gpu.draw_arrays(
                            PrimitiveType::Points,
                            vertices.start as u32,
                            vertices.len() as u32,
                        );
                    }
                }
                BufferLayout::PerCorner => {
                    let batch = self.per_batch_primitives.min(self.stream_capacity * 3);
                    'batches: for vertices in stream::batches(mesh.vertex_count(), batch) {
                        for kind in usable.iter() {
                            let data = stream::vertex_bytes(
                                mesh,
                                kind,
                                vertices.clone(),
                                self.high_precision,
                            );
                            if let Err(err) = self.upload_stream(kind, data, gpu) {
                                log::warn!("FeederCore: point upload failed: {}", err);
                                break 'batches;
                            }
                        }
                        gpu.draw_arrays(PrimitiveType::Points, 0, vertices.len() as u32);
                    }
                }
            }
            Self::unbind(gpu);
        });
    }

    /// Emit the mesh faces vertex by vertex, one call per batch.
    pub(crate) fn draw_triangles_immediate(
        &self,
        rq: &AttributeRequirementSet,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
        textures: &TextureNameContainer,
    ) {
        let rq = rq.compatible_with(mesh.data_mask());
        let per_wedge = rq.contains(AttributeKind::WedgeTexture);
        let textured = per_wedge || rq.contains(AttributeKind::VertTexture);
        with_mesh_color(&rq, mesh, gpu, || {
            for faces in stream::batches(mesh.face_count(), self.per_batch_primitives) {
                let corners = stream::immediate_corners(mesh, &rq, faces.clone());
                draw_texture_runs(mesh, faces, per_wedge, textured, textures, gpu, |run| {
                    gpu.draw_immediate(
                        PrimitiveType::Triangles,
                        &corners[run.start * 3..run.end * 3],
                    );
                });
            }
            gpu.bind_texture(None);
        });
    }

    /// Emit the mesh vertices as points, one call per batch.
    pub(crate) fn draw_points_immediate(
        &self,
        rq: &AttributeRequirementSet,
        mesh: &MeshModel,
        gpu: &dyn GpuBackend,
    ) {
        let rq = rq.compatible_with(mesh.data_mask());
        with_mesh_color(&rq, mesh, gpu, || {
            for vertices in stream::batches(mesh.vertex_count(), self.per_batch_primitives) {
                let points = stream::immediate_points(mesh, &rq, vertices);
                gpu.draw_immediate(PrimitiveType::Points, &points);
            }
        });
    }
}

/// Primitives a draw of `set` assembles on `mesh`.
fn primitive_count(set: &AttributeRequirementSet, mesh: &MeshModel) -> usize {
    match set.modality() {
        PrimitiveModality::Points => mesh.vertex_count(),
        _ => mesh.face_count().max(mesh.vertex_count()),
    }
}

/// Run `draw` with the mesh color as constant color when `rq` asks for it.
fn with_mesh_color(
    rq: &AttributeRequirementSet,
    mesh: &MeshModel,
    gpu: &dyn GpuBackend,
    draw: impl FnOnce(),
) {
    let color: Option<Color> = mesh
        .mesh_color()
        .filter(|_| rq.contains(AttributeKind::MeshColor));
    match color {
        Some(color) => {
            gpu.push_state();
            gpu.set_constant_color(color);
            draw();
            gpu.pop_state();
        }
        None => draw(),
    }
}

/// Split a batch of faces into runs sharing one texture and draw each run.
fn draw_texture_runs(
    mesh: &MeshModel,
    faces: Range<usize>,
    per_wedge: bool,
    textured: bool,
    textures: &TextureNameContainer,
    gpu: &dyn GpuBackend,
    mut draw: impl FnMut(Range<usize>),
) {
    if !textured {
        draw(0..faces.len());
        return;
    }
    for (run, slot) in stream::texture_runs(mesh, faces, per_wedge) {
        gpu.bind_texture(textures.get(slot as usize));
        draw(run);
    }
}

//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't talk to a GPU. It keeps buffer and texture contents
//! in memory and records every draw call together with the state it was
//! issued under, so tests can check what would have reached the GPU.
//! It also tracks context discipline: every resource or draw call made
//! while no context is current is counted as a violation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use meshview_core::math::Mat4;
use meshview_core::mesh::Color;
use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::types::{
    AttributeBinding, AttributeSlot, BufferDescriptor, BufferHandle, ImmediateVertex,
    PointAttenuation, PolygonMode, PolygonOffset, PrimitiveType, TextureDescriptor, TextureHandle,
};

use super::GpuBackend;

/// The geometry part of a recorded draw.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Arrays { first: u32, count: u32 },
    /// Indices as they were in the index buffer when the draw was issued.
    Elements { indices: Vec<u32> },
    Immediate { vertices: Vec<ImmediateVertex> },
}

/// A draw call and the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub primitive: PrimitiveType,
    pub command: DrawCommand,
    pub polygon_mode: PolygonMode,
    pub polygon_offset: Option<PolygonOffset>,
    pub constant_color: Option<Color>,
    pub attributes: BTreeMap<AttributeSlot, AttributeBinding>,
    pub texture: Option<TextureHandle>,
    pub modelview: Mat4,
}

impl DrawRecord {
    /// Number of vertices consumed by the draw.
    pub fn vertex_count(&self) -> usize {
        match &self.command {
            DrawCommand::Arrays { count, .. } => *count as usize,
            DrawCommand::Elements { indices } => indices.len(),
            DrawCommand::Immediate { vertices } => vertices.len(),
        }
    }

    /// Number of primitives assembled by the draw.
    pub fn primitive_count(&self) -> usize {
        self.vertex_count() / self.primitive.vertices_per_primitive() as usize
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self.command, DrawCommand::Immediate { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RasterState {
    polygon_mode: PolygonMode,
    polygon_offset: Option<PolygonOffset>,
    constant_color: Option<Color>,
    point_size: f32,
    point_smooth: bool,
    point_attenuation: Option<PointAttenuation>,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Fill,
            polygon_offset: None,
            constant_color: None,
            point_size: 1.0,
            point_smooth: false,
            point_attenuation: None,
        }
    }
}

#[derive(Debug, Default)]
struct DummyState {
    next_handle: u32,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashMap<TextureHandle, TextureDescriptor>,
    attributes: BTreeMap<AttributeSlot, AttributeBinding>,
    texture: Option<TextureHandle>,
    raster: RasterState,
    state_stack: Vec<RasterState>,
    modelview: Mat4,
    matrix_stack: Vec<Mat4>,
    draws: Vec<DrawRecord>,
    context_depth: usize,
    context_violations: usize,
    buffers_created: usize,
    uploads: usize,
    buffer_delete_calls: usize,
    texture_delete_calls: usize,
    initialized: bool,
}

impl DummyState {
    fn allocate_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check_context(&mut self, call: &str) {
        if self.context_depth == 0 {
            self.context_violations += 1;
            log::warn!("DummyBackend: {call} issued without a current context");
        }
    }

    fn record(&mut self, primitive: PrimitiveType, command: DrawCommand) {
        self.check_context("draw");
        let record = DrawRecord {
            primitive,
            command,
            polygon_mode: self.raster.polygon_mode,
            polygon_offset: self.raster.polygon_offset,
            constant_color: self.raster.constant_color,
            attributes: self.attributes.clone(),
            texture: self.texture,
            modelview: self.modelview,
        };
        self.draws.push(record);
    }
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    state: Mutex<DummyState>,
    max_texture_size: u32,
    max_buffer_size: u64,
    fail_initialization: bool,
    fail_buffer_creation: AtomicBool,
    fail_texture_creation: AtomicBool,
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DummyState {
                modelview: Mat4::identity(),
                ..Default::default()
            }),
            max_texture_size: 16384,
            max_buffer_size: 1 << 30,
            fail_initialization: false,
            fail_buffer_creation: AtomicBool::new(false),
            fail_texture_creation: AtomicBool::new(false),
        }
    }

    /// Set the reported maximum texture dimension.
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Set the largest buffer the backend accepts.
    pub fn with_max_buffer_size(mut self, size: u64) -> Self {
        self.max_buffer_size = size;
        self
    }

    /// Make [`GpuBackend::initialize`] fail.
    pub fn with_failing_initialization(mut self) -> Self {
        self.fail_initialization = true;
        self
    }

    /// Make every buffer creation fail.
    pub fn with_failing_buffer_creation(self) -> Self {
        self.set_fail_buffer_creation(true);
        self
    }

    pub fn set_fail_buffer_creation(&self, fail: bool) {
        self.fail_buffer_creation.store(fail, Ordering::Release);
    }

    pub fn set_fail_texture_creation(&self, fail: bool) {
        self.fail_texture_creation.store(fail, Ordering::Release);
    }

    // ---- Inspection ----

    /// All draws recorded so far.
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.lock().draws.clone()
    }

    /// Return and forget the recorded draws.
    pub fn take_draws(&self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.state.lock().draws)
    }

    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    pub fn live_buffers(&self) -> Vec<BufferHandle> {
        let mut handles: Vec<_> = self.state.lock().buffers.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Sum of the sizes of every live buffer.
    pub fn live_buffer_bytes(&self) -> u64 {
        self.state
            .lock()
            .buffers
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer).cloned()
    }

    pub fn live_texture_count(&self) -> usize {
        self.state.lock().textures.len()
    }

    pub fn texture_descriptor(&self, texture: TextureHandle) -> Option<TextureDescriptor> {
        self.state.lock().textures.get(&texture).cloned()
    }

    pub fn buffers_created(&self) -> usize {
        self.state.lock().buffers_created
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().uploads
    }

    pub fn buffer_delete_calls(&self) -> usize {
        self.state.lock().buffer_delete_calls
    }

    pub fn texture_delete_calls(&self) -> usize {
        self.state.lock().texture_delete_calls
    }

    /// Resource or draw calls made without a current context.
    pub fn context_violations(&self) -> usize {
        self.state.lock().context_violations
    }

    pub fn context_depth(&self) -> usize {
        self.state.lock().context_depth
    }

    /// Depth of the matrix and state stacks. Both are zero when balanced.
    pub fn stack_depths(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.matrix_stack.len(), state.state_stack.len())
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        self.state.lock().raster.polygon_mode
    }

    pub fn point_size(&self) -> f32 {
        self.state.lock().raster.point_size
    }

    pub fn point_smooth(&self) -> bool {
        self.state.lock().raster.point_smooth
    }

    pub fn point_attenuation(&self) -> Option<PointAttenuation> {
        self.state.lock().raster.point_attenuation
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn initialize(&self) -> Result<(), GraphicsError> {
        if self.fail_initialization {
            return Err(GraphicsError::InitializationFailed(
                "dummy loader configured to fail".to_string(),
            ));
        }
        let mut state = self.state.lock();
        if state.context_depth == 0 {
            return Err(GraphicsError::ContextUnavailable);
        }
        state.initialized = true;
        log::trace!("DummyBackend: initialized");
        Ok(())
    }

    fn make_current(&self) {
        self.state.lock().context_depth += 1;
    }

    fn done_current(&self) {
        let mut state = self.state.lock();
        state.context_depth = state.context_depth.saturating_sub(1);
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, GraphicsError> {
        let mut state = self.state.lock();
        state.check_context("create_buffer");
        if self.fail_buffer_creation.load(Ordering::Acquire) {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "buffer {:?} rejected",
                descriptor.label
            )));
        }
        if descriptor.size > self.max_buffer_size {
            log::warn!(
                "DummyBackend: buffer {:?} of {} bytes exceeds maximum {}",
                descriptor.label,
                descriptor.size,
                self.max_buffer_size
            );
            return Err(GraphicsError::OutOfMemory);
        }
        let handle = BufferHandle(state.allocate_handle());
        state.buffers.insert(handle, vec![0; descriptor.size as usize]);
        state.buffers_created += 1;
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        Ok(handle)
    }

    fn upload_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        state.check_context("upload_buffer");
        state.uploads += 1;
        let storage = state.buffers.get_mut(&buffer).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown buffer {}", buffer.0))
        })?;
        let start = offset as usize;
        let end = start + data.len();
        if end > storage.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "upload of {} bytes at {} overflows buffer of {} bytes",
                data.len(),
                offset,
                storage.len()
            )));
        }
        storage[start..end].copy_from_slice(data);
        Ok(())
    }

    fn delete_buffers(&self, buffers: &[BufferHandle]) {
        let mut state = self.state.lock();
        state.check_context("delete_buffers");
        state.buffer_delete_calls += 1;
        for buffer in buffers {
            state.buffers.remove(buffer);
            state.attributes.retain(|_, binding| binding.buffer != *buffer);
        }
        log::trace!("DummyBackend: deleted {} buffers", buffers.len());
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<TextureHandle, GraphicsError> {
        let mut state = self.state.lock();
        state.check_context("create_texture");
        if self.fail_texture_creation.load(Ordering::Acquire) {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "texture {:?} rejected",
                descriptor.label
            )));
        }
        if descriptor.width > self.max_texture_size || descriptor.height > self.max_texture_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture {}x{} exceeds maximum {}",
                descriptor.width, descriptor.height, self.max_texture_size
            )));
        }
        if pixels.len() as u64 != descriptor.base_level_size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "expected {} bytes of pixel data, got {}",
                descriptor.base_level_size(),
                pixels.len()
            )));
        }
        let handle = TextureHandle(state.allocate_handle());
        state.textures.insert(handle, descriptor.clone());
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{}, {} mips)",
            descriptor.label,
            descriptor.width,
            descriptor.height,
            descriptor.mip_level_count()
        );
        Ok(handle)
    }

    fn delete_textures(&self, textures: &[TextureHandle]) {
        let mut state = self.state.lock();
        state.check_context("delete_textures");
        state.texture_delete_calls += 1;
        for texture in textures {
            state.textures.remove(texture);
            if state.texture == Some(*texture) {
                state.texture = None;
            }
        }
        log::trace!("DummyBackend: deleted {} textures", textures.len());
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        self.state.lock().texture = texture;
    }

    fn bind_vertex_attribute(&self, slot: AttributeSlot, binding: Option<AttributeBinding>) {
        let mut state = self.state.lock();
        match binding {
            Some(binding) => {
                state.attributes.insert(slot, binding);
            }
            None => {
                state.attributes.remove(&slot);
            }
        }
    }

    fn set_constant_color(&self, color: Color) {
        self.state.lock().raster.constant_color = Some(color);
    }

    fn draw_arrays(&self, primitive: PrimitiveType, first: u32, count: u32) {
        self.state
            .lock()
            .record(primitive, DrawCommand::Arrays { first, count });
    }

    fn draw_elements(&self, primitive: PrimitiveType, indices: BufferHandle, count: u32) {
        let mut state = self.state.lock();
        let snapshot: Vec<u32> = state
            .buffers
            .get(&indices)
            .map(|bytes| {
                bytes
                    .chunks_exact(4)
                    .take(count as usize)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect()
            })
            .unwrap_or_default();
        state.record(primitive, DrawCommand::Elements { indices: snapshot });
    }

    fn draw_immediate(&self, primitive: PrimitiveType, vertices: &[ImmediateVertex]) {
        self.state.lock().record(
            primitive,
            DrawCommand::Immediate {
                vertices: vertices.to_vec(),
            },
        );
    }

    fn push_state(&self) {
        let mut state = self.state.lock();
        let saved = state.raster.clone();
        state.state_stack.push(saved);
    }

    fn pop_state(&self) {
        let mut state = self.state.lock();
        match state.state_stack.pop() {
            Some(saved) => state.raster = saved,
            None => log::warn!("DummyBackend: state stack underflow"),
        }
    }

    fn push_matrix(&self) {
        let mut state = self.state.lock();
        let current = state.modelview;
        state.matrix_stack.push(current);
    }

    fn mult_matrix(&self, matrix: &Mat4) {
        let mut state = self.state.lock();
        state.modelview = state.modelview * matrix;
    }

    fn pop_matrix(&self) {
        let mut state = self.state.lock();
        match state.matrix_stack.pop() {
            Some(saved) => state.modelview = saved,
            None => log::warn!("DummyBackend: matrix stack underflow"),
        }
    }

    fn modelview_matrix(&self) -> Mat4 {
        self.state.lock().modelview
    }

    fn set_polygon_mode(&self, mode: PolygonMode) {
        self.state.lock().raster.polygon_mode = mode;
    }

    fn set_polygon_offset(&self, offset: Option<PolygonOffset>) {
        self.state.lock().raster.polygon_offset = offset;
    }

    fn set_point_size(&self, size: f32) {
        self.state.lock().raster.point_size = size;
    }

    fn set_point_smooth(&self, enabled: bool) {
        self.state.lock().raster.point_smooth = enabled;
    }

    fn set_point_attenuation(&self, attenuation: Option<PointAttenuation>) {
        self.state.lock().raster.point_attenuation = attenuation;
    }
}

static_assertions::assert_impl_all!(DummyBackend: Send, Sync);

//! Common utilities for feeder and scene integration tests.
//!
//! Every test runs against the recording [`DummyBackend`], so draws, uploads
//! and deletions can be inspected after the fact.

#![allow(dead_code)]

use std::sync::Arc;

use meshview_core::document::{MeshDocument, SharedMesh};
use meshview_core::mesh::MeshModel;
use meshview_graphics::backend::{DrawCommand, DrawRecord};
use meshview_graphics::{
    BufferObjectPolicy, DummyBackend, GpuBackend, MemoryTracker, PerMeshAttributeFeeder,
    SceneConfig, SceneSharedContext,
};
use parking_lot::RwLock;

/// Route `log` output to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn share(mesh: MeshModel) -> SharedMesh {
    Arc::new(RwLock::new(mesh))
}

// ============================================================================
// Feeder Context
// ============================================================================

/// A feeder over one mesh, with handles on its backend and memory tracker.
pub struct FeederContext {
    pub backend: Arc<DummyBackend>,
    pub memory: Arc<MemoryTracker>,
    pub mesh: SharedMesh,
    pub feeder: PerMeshAttributeFeeder,
}

impl FeederContext {
    pub fn new(mesh: MeshModel, batch: usize) -> Self {
        Self::with_memory(mesh, batch, MemoryTracker::unbounded())
    }

    pub fn with_memory(mesh: MeshModel, batch: usize, memory: MemoryTracker) -> Self {
        Self::build(
            Arc::new(DummyBackend::new()),
            mesh,
            batch,
            memory,
            BufferObjectPolicy::default(),
        )
    }

    pub fn build(
        backend: Arc<DummyBackend>,
        mesh: MeshModel,
        batch: usize,
        memory: MemoryTracker,
        policy: BufferObjectPolicy,
    ) -> Self {
        init_logging();
        let memory = Arc::new(memory);
        let mesh = share(mesh);
        let gpu: Arc<dyn GpuBackend> = backend.clone();
        let feeder = PerMeshAttributeFeeder::new(
            Arc::clone(&mesh),
            gpu,
            Arc::clone(&memory),
            batch,
            policy,
            false,
        );
        Self {
            backend,
            memory,
            mesh,
            feeder,
        }
    }
}

impl Drop for FeederContext {
    fn drop(&mut self) {
        self.feeder.deallocate_bo();
        self.feeder.deallocate_textures();
    }
}

// ============================================================================
// Scene Context
// ============================================================================

/// A scene over a fresh document, with handles on its backend and memory.
pub struct SceneContext {
    pub backend: Arc<DummyBackend>,
    pub memory: Arc<MemoryTracker>,
    pub document: Arc<MeshDocument>,
    pub scene: SceneSharedContext,
}

impl SceneContext {
    pub fn new(config: SceneConfig) -> Self {
        Self::with_backend(DummyBackend::new(), MemoryTracker::unbounded(), config)
    }

    pub fn with_backend(backend: DummyBackend, memory: MemoryTracker, config: SceneConfig) -> Self {
        init_logging();
        let backend = Arc::new(backend);
        let memory = Arc::new(memory);
        let document = Arc::new(MeshDocument::new());
        let gpu: Arc<dyn GpuBackend> = backend.clone();
        let scene =
            SceneSharedContext::new(Arc::clone(&document), gpu, Arc::clone(&memory), config);
        Self {
            backend,
            memory,
            document,
            scene,
        }
    }
}

// ============================================================================
// Draw Inspection
// ============================================================================

/// Faces covered by a sequence of indexed draws, in draw order.
pub fn drawn_faces(draws: &[DrawRecord]) -> Vec<[u32; 3]> {
    draws
        .iter()
        .filter_map(|draw| match &draw.command {
            DrawCommand::Elements { indices } => Some(indices.clone()),
            _ => None,
        })
        .flat_map(|indices| {
            indices
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Total primitives assembled by a sequence of draws.
pub fn primitive_total(draws: &[DrawRecord]) -> usize {
    draws.iter().map(DrawRecord::primitive_count).sum()
}

//! GPU data shared by every view of one mesh document.
//!
//! [`SceneSharedContext`] keeps one [`PerMeshAttributeFeeder`] per mesh of a
//! [`MeshDocument`], created and destroyed as the document broadcasts
//! membership events. The `*_per_mesh` operations look a feeder up and
//! forward to it with the GPU context current; an unknown mesh id is never
//! an error, only a no-op, because a mesh may be removed between a caller's
//! decision and the call itself.
//!
//! # Views
//!
//! Several views can show the same document, each with its own
//! [`RenderMode`] per mesh. Once a view has registered a mode for a mesh,
//! that mesh's buffers follow the views: they hold the union of what every
//! view draws, and attributes no view needs any more are freed. Meshes no
//! view has touched are managed only through the `*_per_mesh` calls.
//!
//! The feeder map is mutated only through `&mut self`, on the UI/GPU
//! thread. Feeders, their texture containers and the memory tracker are
//! internally synchronized and can be shared across threads.
//!
//! # Example
//!
//! ```ignore
//! let document = Arc::new(MeshDocument::new());
//! let mut scene = SceneSharedContext::new(
//!     Arc::clone(&document),
//!     backend,
//!     Arc::new(MemoryTracker::new(512 << 20)),
//!     SceneConfig::default(),
//! );
//! scene.initialize_gl()?;
//!
//! let id = document.add_mesh(generate_cube(1.0));
//! scene.process_document_events();
//! let mode = RenderMode::new(DrawStyle::Smooth);
//! scene.setup_requested_attributes_per_mesh(id, &required_attributes(&mode));
//! scene.render_mesh(id, &mode, &PointParams::default());
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use image::DynamicImage;
use image::imageops::FilterType;
use meshview_core::document::{DocumentEvent, MeshDocument, MeshId};
use meshview_core::math::{Aabb, Vec3};
use meshview_core::profiling::profile_function;

use crate::attributes::AttributeRequirementSet;
use crate::backend::GpuBackend;
use crate::context::CurrentContext;
use crate::error::GraphicsError;
use crate::feeder::{BufferObjectPolicy, PerMeshAttributeFeeder};
use crate::memory::{MemoryInfo, MemoryTracker};
use crate::render_mode::{self, PointParams, RenderMode};
use crate::types::{TextureDescriptor, TextureHandle};
use crate::views::{ViewId, ViewModes};

/// Scene-wide settings applied to every feeder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneConfig {
    /// Primitives per draw batch.
    pub per_batch_primitive_count: usize,
    /// Upload positions as `f64` instead of `f32`.
    pub high_precision_rendering: bool,
    /// Keep the center of all mesh bounding boxes up to date.
    pub track_scene_center: bool,
    pub bo_policy: BufferObjectPolicy,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            per_batch_primitive_count: 100_000,
            high_precision_rendering: false,
            track_scene_center: true,
            bo_policy: BufferObjectPolicy::default(),
        }
    }
}

impl SceneConfig {
    pub fn with_per_batch_primitive_count(mut self, count: usize) -> Self {
        self.per_batch_primitive_count = count;
        self
    }

    pub fn with_high_precision_rendering(mut self, enabled: bool) -> Self {
        self.high_precision_rendering = enabled;
        self
    }

    pub fn with_track_scene_center(mut self, enabled: bool) -> Self {
        self.track_scene_center = enabled;
        self
    }

    pub fn with_bo_policy(mut self, policy: BufferObjectPolicy) -> Self {
        self.bo_policy = policy;
        self
    }
}

/// Target size of a texture uploaded from a `width` x `height` image.
///
/// Both sides are rounded up to a power of two, then halved until they fit
/// the larger of the GPU limit and the dimension allowed by `budget_mpx`
/// megapixels.
pub fn texture_target_size(width: u32, height: u32, gpu_max: u32, budget_mpx: u32) -> (u32, u32) {
    let budget_side = (f64::from(budget_mpx).sqrt() * 1024.0) as u32;
    let budget_dim = next_pow2(budget_side) / 2;
    let cap = gpu_max.max(budget_dim).max(1);

    let mut w = next_pow2(width);
    let mut h = next_pow2(height);
    while w > cap {
        w /= 2;
    }
    while h > cap {
        h /= 2;
    }
    (w, h)
}

fn next_pow2(value: u32) -> u32 {
    value.max(1).checked_next_power_of_two().unwrap_or(1 << 31)
}

/// Per-mesh GPU state of a whole document.
pub struct SceneSharedContext {
    document: Arc<MeshDocument>,
    events: Receiver<DocumentEvent>,
    backend: Arc<dyn GpuBackend>,
    memory: Arc<MemoryTracker>,
    config: SceneConfig,
    feeders: HashMap<MeshId, PerMeshAttributeFeeder>,
    views: BTreeSet<ViewId>,
    view_modes: HashMap<MeshId, ViewModes>,
    scene_center: Option<Vec3>,
}

impl std::fmt::Debug for SceneSharedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSharedContext")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("meshes", &self.feeders.len())
            .field("views", &self.views)
            .field("memory", &self.memory.snapshot())
            .finish_non_exhaustive()
    }
}

impl SceneSharedContext {
    /// Create the context and a feeder for every mesh already in `document`.
    pub fn new(
        document: Arc<MeshDocument>,
        backend: Arc<dyn GpuBackend>,
        memory: Arc<MemoryTracker>,
        config: SceneConfig,
    ) -> Self {
        let events = document.subscribe();
        let mut scene = Self {
            document,
            events,
            backend,
            memory,
            config,
            feeders: HashMap::new(),
            views: BTreeSet::new(),
            view_modes: HashMap::new(),
            scene_center: None,
        };
        for id in scene.document.mesh_ids() {
            scene.mesh_inserted(id);
        }
        scene
    }

    /// Load the GPU bindings. Nothing else works if this fails.
    pub fn initialize_gl(&self) -> Result<(), GraphicsError> {
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        if let Err(err) = ctx.backend().initialize() {
            log::error!("SceneSharedContext: GPU initialization failed: {}", err);
            return Err(err);
        }
        log::info!(
            "SceneSharedContext: {} initialized (max texture size {})",
            ctx.backend().name(),
            ctx.backend().max_texture_size()
        );
        Ok(())
    }

    /// Apply every pending document event. Returns how many were applied.
    pub fn process_document_events(&mut self) -> usize {
        let events: Vec<DocumentEvent> = self.events.try_iter().collect();
        for event in &events {
            match *event {
                DocumentEvent::MeshAdded(id) => self.mesh_inserted(id),
                DocumentEvent::MeshRemoved(id) => self.mesh_removed(id),
            }
        }
        events.len()
    }

    /// Create a fresh feeder for document mesh `id`.
    ///
    /// A feeder already serving the same mesh is kept. One serving a
    /// different mesh under the same id is torn down first.
    pub fn mesh_inserted(&mut self, id: MeshId) {
        let Some(mesh) = self.document.get_mesh(id) else {
            log::debug!("SceneSharedContext: mesh {} is not in the document", id);
            return;
        };
        if let Some(existing) = self.feeders.get(&id) {
            if Arc::ptr_eq(existing.mesh(), &mesh) {
                return;
            }
            self.mesh_removed(id);
        }

        let ctx = CurrentContext::acquire(self.backend.as_ref());
        let feeder = PerMeshAttributeFeeder::new(
            mesh,
            Arc::clone(&self.backend),
            Arc::clone(&self.memory),
            self.config.per_batch_primitive_count,
            self.config.bo_policy,
            self.config.high_precision_rendering,
        );
        drop(ctx);
        self.feeders.insert(id, feeder);
        log::debug!("SceneSharedContext: mesh {} inserted", id);

        if !self.views.is_empty() {
            let mode = self.suggested_mode(id);
            let modes = self.view_modes.entry(id).or_default();
            for view in &self.views {
                modes.set(*view, mode);
            }
            self.manage_buffers(id);
        }
        self.update_scene_center();
    }

    /// Free every GPU resource of mesh `id` and forget its feeder.
    pub fn mesh_removed(&mut self, id: MeshId) {
        let Some(feeder) = self.feeders.remove(&id) else {
            return;
        };
        self.view_modes.remove(&id);
        {
            let _ctx = CurrentContext::acquire(self.backend.as_ref());
            feeder.deallocate_bo();
            feeder.deallocate_textures();
        }
        log::debug!("SceneSharedContext: mesh {} removed", id);
        self.update_scene_center();
    }

    pub fn mesh_attributes_feeder(&self, id: MeshId) -> Option<&PerMeshAttributeFeeder> {
        self.feeders.get(&id)
    }

    /// Ids of every mesh with a feeder, in ascending order.
    pub fn mesh_ids(&self) -> Vec<MeshId> {
        let mut ids: Vec<_> = self.feeders.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn setup_requested_attributes_per_mesh(
        &self,
        id: MeshId,
        rq: &AttributeRequirementSet,
    ) -> (AttributeRequirementSet, bool) {
        match self.feeders.get(&id) {
            Some(feeder) => {
                let _ctx = CurrentContext::acquire(self.backend.as_ref());
                feeder.setup_requested_attributes(rq)
            }
            None => (AttributeRequirementSet::empty(), false),
        }
    }

    pub fn remove_requested_attributes_per_mesh(
        &self,
        id: MeshId,
        rq: &AttributeRequirementSet,
    ) -> AttributeRequirementSet {
        match self.feeders.get(&id) {
            Some(feeder) => {
                let _ctx = CurrentContext::acquire(self.backend.as_ref());
                feeder.remove_requested_attributes(rq)
            }
            None => AttributeRequirementSet::empty(),
        }
    }

    pub fn invalidate_requested_attributes_per_mesh(
        &self,
        id: MeshId,
        rq: &AttributeRequirementSet,
    ) {
        if let Some(feeder) = self.feeders.get(&id) {
            feeder.invalidate_requested_attributes(rq);
        }
    }

    /// Forward a mesh edit to the feeder of `id`.
    pub fn mesh_attributes_updated(
        &self,
        id: MeshId,
        connectivity_changed: bool,
        atts: &AttributeRequirementSet,
    ) {
        if let Some(feeder) = self.feeders.get(&id) {
            let _ctx = CurrentContext::acquire(self.backend.as_ref());
            feeder.mesh_attributes_updated(connectivity_changed, atts);
            self.manage_buffers(id);
        }
    }

    pub fn deallocate_textures_per_mesh(&self, id: MeshId) {
        if let Some(feeder) = self.feeders.get(&id) {
            let _ctx = CurrentContext::acquire(self.backend.as_ref());
            feeder.deallocate_textures();
        }
    }

    /// Upload `image` as the next texture slot of mesh `id`.
    ///
    /// The image is rescaled to [`texture_target_size`], flipped to bottom-up
    /// row order, converted to RGBA8 and uploaded with mipmaps. Returns
    /// `None` for an unknown mesh or a failed upload.
    pub fn allocate_texture_per_mesh(
        &self,
        id: MeshId,
        image: &DynamicImage,
        budget_mpx: u32,
    ) -> Option<TextureHandle> {
        profile_function!();
        let feeder = self.feeders.get(&id)?;
        let ctx = CurrentContext::acquire(self.backend.as_ref());
        let gpu = ctx.backend();

        let (width, height) =
            texture_target_size(image.width(), image.height(), gpu.max_texture_size(), budget_mpx);
        let scaled = if (width, height) == (image.width(), image.height()) {
            image.clone()
        } else {
            image.resize_exact(width, height, FilterType::Triangle)
        };
        let pixels = scaled.flipv().to_rgba8();

        let slot = feeder.texture_names().len();
        let descriptor = TextureDescriptor::new_2d(width, height)
            .with_mipmaps(true)
            .with_label(format!("mesh{}:texture{}", id, slot));
        match gpu.create_texture(&descriptor, pixels.as_raw()) {
            Ok(handle) => {
                feeder.texture_names().push(handle);
                log::debug!(
                    "SceneSharedContext: texture {} of mesh {} ({}x{} -> {}x{})",
                    slot,
                    id,
                    image.width(),
                    image.height(),
                    width,
                    height
                );
                Some(handle)
            }
            Err(err) => {
                log::warn!("SceneSharedContext: texture upload for mesh {} failed: {}", id, err);
                None
            }
        }
    }

    /// Texture handle of slot `position` of mesh `id`.
    pub fn texture_id(&self, id: MeshId, position: usize) -> Option<TextureHandle> {
        self.feeders.get(&id)?.texture_names().get(position)
    }

    pub fn is_bo_rendering_available(&self, id: MeshId) -> bool {
        self.feeders
            .get(&id)
            .is_some_and(PerMeshAttributeFeeder::rendered_with_bo)
    }

    /// Draw mesh `id` with `mode`. Unknown ids draw nothing.
    pub fn render_mesh(&self, id: MeshId, mode: &RenderMode, points: &PointParams) {
        if let Some(feeder) = self.feeders.get(&id) {
            render_mode::render_mesh(feeder, mode, points);
        }
    }

    // ---- Views ----

    /// Register `view` and give it the suggested mode of every mesh.
    ///
    /// A view already registered keeps its modes.
    pub fn add_view(&mut self, view: ViewId) {
        if !self.views.insert(view) {
            return;
        }
        for id in self.mesh_ids() {
            let mode = self.suggested_mode(id);
            self.view_modes.entry(id).or_default().set(view, mode);
            self.manage_buffers(id);
        }
        log::debug!("SceneSharedContext: {} added", view);
    }

    /// Forget `view` and free every attribute only it needed.
    pub fn remove_view(&mut self, view: ViewId) {
        if !self.views.remove(&view) {
            return;
        }
        let ids: Vec<MeshId> = self
            .view_modes
            .iter_mut()
            .filter_map(|(id, modes)| modes.remove(view).map(|_| *id))
            .collect();
        for id in ids {
            self.manage_buffers(id);
        }
        log::debug!("SceneSharedContext: {} removed", view);
    }

    /// Registered views, in ascending order.
    pub fn views(&self) -> Vec<ViewId> {
        self.views.iter().copied().collect()
    }

    /// Show mesh `id` in `view` with `mode`, registering the view if new.
    ///
    /// Returns whether the mesh buffers changed. Unknown meshes are a no-op.
    pub fn set_rendering_data_per_mesh_view(
        &mut self,
        id: MeshId,
        view: ViewId,
        mode: RenderMode,
    ) -> bool {
        if !self.feeders.contains_key(&id) {
            return false;
        }
        self.views.insert(view);
        self.view_modes.entry(id).or_default().set(view, mode);
        self.manage_buffers(id)
    }

    /// Mode of mesh `id` in `view`, if that view shows it.
    pub fn rendering_data_per_mesh_view(&self, id: MeshId, view: ViewId) -> Option<RenderMode> {
        self.view_modes.get(&id)?.get(view)
    }

    /// Mode of every mesh `view` shows.
    pub fn rendering_data_per_view(&self, view: ViewId) -> BTreeMap<MeshId, RenderMode> {
        self.view_modes
            .iter()
            .filter_map(|(id, modes)| modes.get(view).map(|mode| (*id, mode)))
            .collect()
    }

    /// Bring the buffers of mesh `id` in line with its views.
    ///
    /// Allocates the union of every view's requirements and frees whatever
    /// no view needs. Meshes without view modes are left alone. Returns
    /// whether anything was allocated or freed.
    pub fn manage_buffers(&self, id: MeshId) -> bool {
        let (Some(feeder), Some(modes)) = (self.feeders.get(&id), self.view_modes.get(&id)) else {
            return false;
        };
        let wanted = modes
            .required_attributes()
            .compatible_with(feeder.mesh().read().data_mask());
        let _ctx = CurrentContext::acquire(self.backend.as_ref());

        let unused = feeder.allocated_attributes().difference(&wanted);
        let freed = !unused.is_empty();
        if freed {
            feeder.remove_requested_attributes(&unused);
        }
        let allocated = !wanted.is_empty() && feeder.setup_requested_attributes(&wanted).1;
        if freed || allocated {
            log::debug!(
                "SceneSharedContext: mesh {} buffers now hold {:?}",
                id,
                feeder.allocated_attributes()
            );
        }
        freed || allocated
    }

    /// Draw mesh `id` as `view` shows it. Draws nothing if it does not.
    pub fn render_mesh_view(&self, id: MeshId, view: ViewId, points: &PointParams) {
        if let Some(mode) = self.rendering_data_per_mesh_view(id, view) {
            self.render_mesh(id, &mode, points);
        }
    }

    fn suggested_mode(&self, id: MeshId) -> RenderMode {
        self.feeders
            .get(&id)
            .map(|feeder| RenderMode::suggested_for(feeder.mesh().read().data_mask()))
            .unwrap_or_default()
    }

    /// Free every buffer and texture of every mesh and forget every view.
    /// Feeders stay, empty.
    pub fn deallocate_gpu_shared_data(&mut self) {
        self.views.clear();
        self.view_modes.clear();
        if self.feeders.is_empty() {
            return;
        }
        let _ctx = CurrentContext::acquire(self.backend.as_ref());
        for feeder in self.feeders.values() {
            feeder.deallocate_bo();
            feeder.deallocate_textures();
        }
        log::debug!(
            "SceneSharedContext: released GPU data of {} meshes",
            self.feeders.len()
        );
    }

    /// Center of the bounding box of every mesh, if tracked and non-empty.
    pub fn scene_center(&self) -> Option<Vec3> {
        self.scene_center
    }

    pub fn memory_info(&self) -> MemoryInfo {
        self.memory.snapshot()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Change the batch size of the scene and of every feeder.
    pub fn set_per_batch_primitive_count(&mut self, count: usize) {
        self.config.per_batch_primitive_count = count;
        for feeder in self.feeders.values() {
            feeder.set_per_batch_primitives(count);
        }
    }

    fn update_scene_center(&mut self) {
        if !self.config.track_scene_center {
            return;
        }
        let mut bbox = Aabb::empty();
        for feeder in self.feeders.values() {
            bbox.add_box(&feeder.mesh().read().world_bbox());
        }
        self.scene_center = (!bbox.is_empty()).then(|| bbox.center());
    }
}

impl Drop for SceneSharedContext {
    fn drop(&mut self) {
        self.deallocate_gpu_shared_data();
    }
}

static_assertions::assert_impl_all!(SceneSharedContext: Send, Sync);

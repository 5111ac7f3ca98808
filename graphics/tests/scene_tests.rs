//! Integration tests for [`SceneSharedContext`].
//!
//! A scene follows a [`MeshDocument`](meshview_core::MeshDocument) through its
//! events and forwards per-mesh requests to the right feeder. These tests
//! drive the document, process its events and check the resulting GPU state
//! on the dummy backend.
//!
//! ```bash
//! cargo test -p meshview-graphics --test scene_tests
//! ```

mod common;

use image::{DynamicImage, Rgba, RgbaImage};
use rstest::rstest;

use common::SceneContext;
use meshview_core::math::{Vec3, mat4_from_translation};
use meshview_core::mesh::generators::{generate_cube, generate_grid, generate_point_cloud};
use meshview_graphics::backend::DrawCommand;
use meshview_graphics::render_mode::required_attributes;
use meshview_graphics::types::PrimitiveType;
use meshview_graphics::types::PolygonMode;
use meshview_graphics::{
    AttributeKind, AttributeRequirementSet, DrawStyle, DummyBackend, GraphicsError,
    MemoryTracker, PointParams, RenderMode, SceneConfig, ViewId,
};

fn smooth() -> AttributeRequirementSet {
    required_attributes(&RenderMode::new(DrawStyle::Smooth))
}

fn checker(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    }))
}

// ============================================================================
// Document Events
// ============================================================================

#[test]
fn test_existing_meshes_get_feeders() {
    let document = std::sync::Arc::new(meshview_core::MeshDocument::new());
    let first = document.add_mesh(generate_cube(1.0));
    let second = document.add_mesh(generate_grid(2, 2, 1.0));

    let backend: std::sync::Arc<dyn meshview_graphics::GpuBackend> =
        std::sync::Arc::new(DummyBackend::new());
    let scene = meshview_graphics::SceneSharedContext::new(
        document,
        backend,
        std::sync::Arc::new(MemoryTracker::unbounded()),
        SceneConfig::default(),
    );
    assert_eq!(scene.mesh_ids(), vec![first, second]);
}

#[test]
fn test_document_events_create_and_destroy_feeders() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    assert_eq!(ctx.scene.process_document_events(), 0);

    let cube = ctx.document.add_mesh(generate_cube(1.0));
    let grid = ctx.document.add_mesh(generate_grid(4, 4, 1.0));
    assert!(ctx.scene.mesh_attributes_feeder(cube).is_none());

    assert_eq!(ctx.scene.process_document_events(), 2);
    assert_eq!(ctx.scene.mesh_ids(), vec![cube, grid]);

    ctx.scene.setup_requested_attributes_per_mesh(cube, &smooth());
    ctx.scene.setup_requested_attributes_per_mesh(grid, &smooth());
    assert_eq!(ctx.backend.live_buffer_count(), 6);

    ctx.document.remove_mesh(cube);
    assert_eq!(ctx.scene.process_document_events(), 1);
    assert_eq!(ctx.scene.mesh_ids(), vec![grid]);
    assert_eq!(ctx.backend.live_buffer_count(), 3);
    assert_eq!(ctx.memory.used(), ctx.backend.live_buffer_bytes());
}

#[test]
fn test_reinserted_mesh_starts_empty() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();
    ctx.scene.setup_requested_attributes_per_mesh(id, &smooth());
    assert!(ctx.scene.is_bo_rendering_available(id));

    ctx.document.remove_mesh(id);
    assert!(ctx.document.insert_mesh(id, generate_grid(2, 2, 1.0)));
    assert_eq!(ctx.scene.process_document_events(), 2);

    let feeder = ctx.scene.mesh_attributes_feeder(id).unwrap();
    assert!(feeder.allocated_attributes().is_empty());
    assert_eq!(feeder.mesh().read().label(), Some("grid"));
    assert_eq!(ctx.backend.live_buffer_count(), 0);
    assert_eq!(ctx.memory.used(), 0);
}

#[test]
fn test_repeated_insert_keeps_feeder() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();
    ctx.scene.setup_requested_attributes_per_mesh(id, &smooth());

    ctx.scene.mesh_inserted(id);
    let feeder = ctx.scene.mesh_attributes_feeder(id).unwrap();
    assert!(!feeder.allocated_attributes().is_empty());
}

#[test]
fn test_unknown_mesh_is_a_no_op() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let unknown = 42;

    let (allocated, newly) = ctx.scene.setup_requested_attributes_per_mesh(unknown, &smooth());
    assert!(allocated.is_empty());
    assert!(!newly);
    assert!(ctx
        .scene
        .remove_requested_attributes_per_mesh(unknown, &smooth())
        .is_empty());
    ctx.scene.invalidate_requested_attributes_per_mesh(unknown, &smooth());
    ctx.scene.mesh_attributes_updated(unknown, true, &smooth());
    ctx.scene.deallocate_textures_per_mesh(unknown);
    ctx.scene
        .render_mesh(unknown, &RenderMode::default(), &PointParams::default());
    ctx.scene.mesh_removed(unknown);
    ctx.scene.mesh_inserted(unknown);

    assert!(ctx.scene.allocate_texture_per_mesh(unknown, &checker(4, 4), 4).is_none());
    assert!(ctx.scene.texture_id(unknown, 0).is_none());
    assert!(!ctx.scene.is_bo_rendering_available(unknown));
    assert!(ctx.scene.mesh_ids().is_empty());
    assert!(ctx.backend.draws().is_empty());
    assert_eq!(ctx.backend.buffers_created(), 0);
}

// ============================================================================
// Shared Memory Budget
// ============================================================================

#[test]
fn test_budget_is_shared_between_meshes() {
    // One 4x4 grid needs 984 bytes for smooth shading.
    let mut ctx = SceneContext::with_backend(
        DummyBackend::new(),
        MemoryTracker::new(1500),
        SceneConfig::default(),
    );
    let first = ctx.document.add_mesh(generate_grid(4, 4, 1.0));
    let second = ctx.document.add_mesh(generate_grid(4, 4, 1.0));
    ctx.scene.process_document_events();

    let (_, newly) = ctx.scene.setup_requested_attributes_per_mesh(first, &smooth());
    assert!(newly);
    let (_, newly) = ctx.scene.setup_requested_attributes_per_mesh(second, &smooth());
    assert!(!newly);
    assert!(ctx.scene.is_bo_rendering_available(first));
    assert!(!ctx.scene.is_bo_rendering_available(second));
    assert_eq!(ctx.scene.memory_info().used, 984);

    // The second mesh still renders, immediately.
    ctx.scene
        .render_mesh(second, &RenderMode::new(DrawStyle::Smooth), &PointParams::default());
    assert!(ctx.backend.take_draws().iter().all(|d| d.is_immediate()));

    // Freeing the first mesh makes room for the second.
    ctx.document.remove_mesh(first);
    ctx.scene.process_document_events();
    let (_, newly) = ctx.scene.setup_requested_attributes_per_mesh(second, &smooth());
    assert!(newly);
    assert!(ctx.scene.is_bo_rendering_available(second));
}

#[test]
fn test_deallocate_gpu_shared_data_keeps_feeders() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let cube = ctx.document.add_mesh(generate_cube(1.0));
    let grid = ctx.document.add_mesh(generate_grid(3, 3, 1.0));
    ctx.scene.process_document_events();
    ctx.scene.setup_requested_attributes_per_mesh(cube, &smooth());
    ctx.scene.setup_requested_attributes_per_mesh(grid, &smooth());
    ctx.scene.allocate_texture_per_mesh(grid, &checker(8, 8), 4);

    ctx.scene.deallocate_gpu_shared_data();
    assert_eq!(ctx.scene.mesh_ids(), vec![cube, grid]);
    assert_eq!(ctx.backend.live_buffer_count(), 0);
    assert_eq!(ctx.backend.live_texture_count(), 0);
    assert_eq!(ctx.memory.used(), 0);
    assert!(!ctx.scene.is_bo_rendering_available(cube));

    let (_, newly) = ctx.scene.setup_requested_attributes_per_mesh(cube, &smooth());
    assert!(newly);
}

#[test]
fn test_dropping_the_scene_frees_everything() {
    let ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_cube(1.0));
    let SceneContext {
        backend,
        memory,
        document: _document,
        mut scene,
    } = ctx;
    scene.process_document_events();
    scene.setup_requested_attributes_per_mesh(id, &smooth());
    assert!(backend.live_buffer_count() > 0);

    drop(scene);
    assert_eq!(backend.live_buffer_count(), 0);
    assert_eq!(memory.used(), 0);
    assert_eq!(backend.context_violations(), 0);
}

// ============================================================================
// Textures
// ============================================================================

#[rstest]
#[case::already_pow2(256, 256, 4096, 4, (256, 256))]
#[case::rounded_up(300, 200, 4096, 4, (512, 256))]
#[case::gpu_limit(5000, 1000, 2048, 1, (2048, 1024))]
#[case::budget_above_gpu(8192, 8192, 1024, 16, (2048, 2048))]
fn test_texture_sizes(
    #[case] width: u32,
    #[case] height: u32,
    #[case] gpu_max: u32,
    #[case] budget: u32,
    #[case] expected: (u32, u32),
) {
    assert_eq!(
        meshview_graphics::texture_target_size(width, height, gpu_max, budget),
        expected
    );
}

#[test]
fn test_allocate_texture_per_mesh() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();

    let first = ctx.scene.allocate_texture_per_mesh(id, &checker(300, 200), 4).unwrap();
    let second = ctx.scene.allocate_texture_per_mesh(id, &checker(64, 64), 4).unwrap();
    assert_eq!(ctx.scene.texture_id(id, 0), Some(first));
    assert_eq!(ctx.scene.texture_id(id, 1), Some(second));
    assert_eq!(ctx.scene.texture_id(id, 2), None);

    let descriptor = ctx.backend.texture_descriptor(first).unwrap();
    assert_eq!((descriptor.width, descriptor.height), (512, 256));
    assert!(descriptor.generate_mipmaps);
    assert_eq!(descriptor.label.as_deref(), Some(format!("mesh{id}:texture0").as_str()));

    ctx.scene.deallocate_textures_per_mesh(id);
    assert_eq!(ctx.backend.live_texture_count(), 0);
    assert_eq!(ctx.backend.texture_delete_calls(), 1);
    assert_eq!(ctx.scene.texture_id(id, 0), None);
}

#[test]
fn test_texture_respects_gpu_limit() {
    let mut ctx = SceneContext::with_backend(
        DummyBackend::new().with_max_texture_size(256),
        MemoryTracker::unbounded(),
        SceneConfig::default(),
    );
    let id = ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();

    let handle = ctx.scene.allocate_texture_per_mesh(id, &checker(1000, 700), 0).unwrap();
    let descriptor = ctx.backend.texture_descriptor(handle).unwrap();
    assert_eq!((descriptor.width, descriptor.height), (256, 256));
}

#[test]
fn test_failed_texture_upload() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();

    ctx.backend.set_fail_texture_creation(true);
    assert!(ctx.scene.allocate_texture_per_mesh(id, &checker(16, 16), 4).is_none());
    assert!(ctx.scene.mesh_attributes_feeder(id).unwrap().texture_names().is_empty());
}

// ============================================================================
// Initialization and Rendering
// ============================================================================

#[test]
fn test_initialize_gl() {
    let ctx = SceneContext::new(SceneConfig::default());
    ctx.scene.initialize_gl().unwrap();
    assert!(ctx.backend.is_initialized());
    assert_eq!(ctx.backend.context_depth(), 0);
}

#[test]
fn test_initialize_gl_failure() {
    let ctx = SceneContext::with_backend(
        DummyBackend::new().with_failing_initialization(),
        MemoryTracker::unbounded(),
        SceneConfig::default(),
    );
    let err = ctx.scene.initialize_gl().unwrap_err();
    assert!(matches!(err, GraphicsError::InitializationFailed(_)));
    assert!(!ctx.backend.is_initialized());
}

#[rstest]
#[case::points(DrawStyle::Points, PrimitiveType::Points)]
#[case::smooth(DrawStyle::Smooth, PrimitiveType::Triangles)]
#[case::flat(DrawStyle::Flat, PrimitiveType::Triangles)]
#[case::wire(DrawStyle::Wire, PrimitiveType::Triangles)]
#[case::flat_wire(DrawStyle::FlatWire, PrimitiveType::Triangles)]
#[case::bbox(DrawStyle::Box, PrimitiveType::Lines)]
fn test_render_mesh_applies_transform(#[case] style: DrawStyle, #[case] primitive: PrimitiveType) {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let transform = mat4_from_translation(Vec3::new(1.0, 2.0, 3.0));
    let id = ctx
        .document
        .add_mesh(generate_cube(1.0).with_transform(transform));
    ctx.scene.process_document_events();

    let mode = RenderMode::new(style);
    ctx.scene
        .setup_requested_attributes_per_mesh(id, &required_attributes(&mode));
    ctx.scene.render_mesh(id, &mode, &PointParams::default());

    let draws = ctx.backend.take_draws();
    assert!(!draws.is_empty());
    assert!(draws.iter().all(|d| d.primitive == primitive));
    assert!(draws.iter().all(|d| d.modelview == transform));
    assert_eq!(ctx.backend.stack_depths(), (0, 0));
    assert_eq!(ctx.backend.context_depth(), 0);
    assert_eq!(ctx.backend.context_violations(), 0);
}

#[test]
fn test_point_state_is_restored() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_point_cloud(50, 1.0));
    ctx.scene.process_document_events();

    let mode = RenderMode::new(DrawStyle::Points);
    let points = PointParams::default().with_size(8.0).with_smooth(true);
    ctx.scene.render_mesh(id, &mode, &points);

    assert_eq!(ctx.backend.point_size(), 1.0);
    assert!(!ctx.backend.point_smooth());
    assert_eq!(ctx.backend.point_attenuation(), None);
    let draws = ctx.backend.take_draws();
    assert_eq!(draws.len(), 1);
    assert!(matches!(
        &draws[0].command,
        DrawCommand::Immediate { vertices } if vertices.len() == 50
    ));
}

// ============================================================================
// Views
// ============================================================================

#[test]
fn test_add_view_allocates_suggested_mode() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_grid(4, 4, 1.0));
    ctx.scene.process_document_events();
    assert_eq!(ctx.memory.used(), 0);

    ctx.scene.add_view(ViewId(0));
    let mask = ctx.document.get_mesh(id).unwrap().read().data_mask();
    let suggested = RenderMode::suggested_for(mask);
    assert_eq!(ctx.scene.views(), vec![ViewId(0)]);
    assert_eq!(
        ctx.scene.rendering_data_per_mesh_view(id, ViewId(0)),
        Some(suggested)
    );
    // The grid has no colors and no wedge coordinates: smooth shading only.
    assert_eq!(ctx.memory.used(), 984);
    assert!(ctx.scene.is_bo_rendering_available(id));

    // Adding the same view twice changes nothing.
    let created = ctx.backend.buffers_created();
    ctx.scene.add_view(ViewId(0));
    assert_eq!(ctx.backend.buffers_created(), created);
}

#[test]
fn test_buffers_hold_the_union_of_every_view() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();

    assert!(ctx
        .scene
        .set_rendering_data_per_mesh_view(id, ViewId(0), RenderMode::new(DrawStyle::Points)));
    assert_eq!(ctx.memory.used(), 24 * 12 * 2);

    assert!(ctx
        .scene
        .set_rendering_data_per_mesh_view(id, ViewId(1), RenderMode::new(DrawStyle::Flat)));
    let allocated = ctx.scene.mesh_attributes_feeder(id).unwrap().allocated_attributes();
    assert!(allocated.contains(AttributeKind::VertNormal));
    assert!(allocated.contains(AttributeKind::FaceNormal));
    assert_eq!(ctx.memory.used(), 3 * 36 * 12);

    // Face normals were only needed by the flat view.
    ctx.scene.remove_view(ViewId(1));
    let allocated = ctx.scene.mesh_attributes_feeder(id).unwrap().allocated_attributes();
    assert!(!allocated.contains(AttributeKind::FaceNormal));
    assert!(allocated.contains(AttributeKind::VertNormal));
    assert_eq!(ctx.memory.used(), 2 * 36 * 12);
    assert_eq!(ctx.backend.live_buffer_bytes(), ctx.memory.used());

    ctx.scene.remove_view(ViewId(0));
    assert!(ctx.scene.views().is_empty());
    assert_eq!(ctx.memory.used(), 0);
    assert_eq!(ctx.backend.live_buffer_count(), 0);
    assert!(!ctx.scene.is_bo_rendering_available(id));
}

#[test]
fn test_render_mesh_view_uses_the_view_mode() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_grid(3, 3, 1.0));
    ctx.scene.process_document_events();
    ctx.scene
        .set_rendering_data_per_mesh_view(id, ViewId(0), RenderMode::new(DrawStyle::Points));
    ctx.scene
        .set_rendering_data_per_mesh_view(id, ViewId(1), RenderMode::new(DrawStyle::Wire));

    ctx.scene.render_mesh_view(id, ViewId(0), &PointParams::default());
    let draws = ctx.backend.take_draws();
    assert!(!draws.is_empty());
    assert!(draws.iter().all(|d| d.primitive == PrimitiveType::Points));

    ctx.scene.render_mesh_view(id, ViewId(1), &PointParams::default());
    let draws = ctx.backend.take_draws();
    assert!(!draws.is_empty());
    assert!(draws.iter().all(|d| !d.is_immediate()));
    assert!(draws.iter().all(|d| d.polygon_mode == PolygonMode::Line));

    // A view that does not show the mesh draws nothing.
    ctx.scene.render_mesh_view(id, ViewId(7), &PointParams::default());
    assert!(ctx.backend.take_draws().is_empty());
}

#[test]
fn test_new_meshes_join_existing_views() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    ctx.scene.add_view(ViewId(0));
    ctx.scene.add_view(ViewId(1));

    let id = ctx.document.add_mesh(generate_point_cloud(20, 1.0));
    ctx.scene.process_document_events();
    let modes = ctx.scene.rendering_data_per_view(ViewId(1));
    assert_eq!(modes.keys().copied().collect::<Vec<_>>(), vec![id]);
    assert_eq!(modes[&id].draw_style, DrawStyle::Points);
    assert!(ctx.scene.is_bo_rendering_available(id));

    ctx.document.remove_mesh(id);
    ctx.scene.process_document_events();
    assert!(ctx.scene.rendering_data_per_view(ViewId(1)).is_empty());
    assert_eq!(ctx.memory.used(), 0);
}

#[test]
fn test_views_of_unknown_meshes_are_ignored() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    assert!(!ctx
        .scene
        .set_rendering_data_per_mesh_view(42, ViewId(0), RenderMode::new(DrawStyle::Smooth)));
    assert!(ctx.scene.views().is_empty());
    assert_eq!(ctx.scene.rendering_data_per_mesh_view(42, ViewId(0)), None);
    assert!(!ctx.scene.manage_buffers(42));
    ctx.scene.render_mesh_view(42, ViewId(0), &PointParams::default());
    assert!(ctx.backend.draws().is_empty());
}

#[test]
fn test_deallocate_gpu_shared_data_forgets_views() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();
    ctx.scene.add_view(ViewId(0));
    assert!(ctx.memory.used() > 0);

    ctx.scene.deallocate_gpu_shared_data();
    assert!(ctx.scene.views().is_empty());
    assert_eq!(ctx.scene.rendering_data_per_mesh_view(id, ViewId(0)), None);
    assert_eq!(ctx.memory.used(), 0);

    // The direct per-mesh calls are not undone by a later view edit.
    ctx.scene.setup_requested_attributes_per_mesh(id, &smooth());
    assert!(!ctx.scene.manage_buffers(id));
    assert!(ctx.scene.is_bo_rendering_available(id));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_batch_size_reaches_every_feeder() {
    let mut ctx = SceneContext::new(SceneConfig::default().with_per_batch_primitive_count(8));
    let a = ctx.document.add_mesh(generate_grid(4, 4, 1.0));
    let b = ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();
    assert_eq!(ctx.scene.mesh_attributes_feeder(a).unwrap().per_batch_primitives(), 8);

    ctx.scene.set_per_batch_primitive_count(3);
    assert_eq!(ctx.scene.config().per_batch_primitive_count, 3);
    for id in [a, b] {
        assert_eq!(ctx.scene.mesh_attributes_feeder(id).unwrap().per_batch_primitives(), 3);
    }
}

#[test]
fn test_high_precision_positions() {
    let mut ctx =
        SceneContext::new(SceneConfig::default().with_high_precision_rendering(true));
    let id = ctx.document.add_mesh(generate_grid(2, 2, 1.0));
    ctx.scene.process_document_events();

    let position: AttributeRequirementSet = [AttributeKind::VertPosition].into_iter().collect();
    ctx.scene.setup_requested_attributes_per_mesh(id, &position);
    // Nine vertices of three f64 each.
    assert_eq!(ctx.memory.used(), 9 * 24);
}

#[test]
fn test_scene_center_follows_membership() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    assert_eq!(ctx.scene.scene_center(), None);

    let a = ctx.document.add_mesh(
        generate_cube(1.0).with_transform(mat4_from_translation(Vec3::new(-4.0, 0.0, 0.0))),
    );
    ctx.document.add_mesh(
        generate_cube(1.0).with_transform(mat4_from_translation(Vec3::new(4.0, 0.0, 0.0))),
    );
    ctx.scene.process_document_events();
    let center = ctx.scene.scene_center().unwrap();
    assert!((center - Vec3::zeros()).norm() < 1e-5);

    ctx.document.remove_mesh(a);
    ctx.scene.process_document_events();
    let center = ctx.scene.scene_center().unwrap();
    assert!((center - Vec3::new(4.0, 0.0, 0.0)).norm() < 1e-5);
}

#[test]
fn test_scene_center_can_be_disabled() {
    let mut ctx = SceneContext::new(SceneConfig::default().with_track_scene_center(false));
    ctx.document.add_mesh(generate_cube(1.0));
    ctx.scene.process_document_events();
    assert_eq!(ctx.scene.scene_center(), None);
}

#[test]
fn test_connectivity_update_through_scene() {
    let mut ctx = SceneContext::new(SceneConfig::default());
    let id = ctx.document.add_mesh(generate_grid(4, 4, 1.0));
    ctx.scene.process_document_events();
    let (allocated, _) = ctx.scene.setup_requested_attributes_per_mesh(id, &smooth());

    let mesh = ctx.document.get_mesh(id).unwrap();
    let faces = mesh.read().faces()[..8].to_vec();
    mesh.write().set_faces(faces);
    ctx.scene.mesh_attributes_updated(id, true, &allocated);

    assert_eq!(ctx.memory.used(), 25 * 12 * 2 + 8 * 3 * 4);
    assert_eq!(
        ctx.scene.mesh_attributes_feeder(id).unwrap().allocated_attributes(),
        allocated
    );
}

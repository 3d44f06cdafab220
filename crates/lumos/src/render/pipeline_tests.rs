//! Frame-level tests driving the pipeline and scene manager on the headless backend

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::core::config::RendererSettings;
use crate::foundation::math::{Transform, Vec3};
use crate::render::backends::{BackendCall, HeadlessBackend};
use crate::render::{
    CommandBufferHandle, GraphicsPipeline, MeshHandle, OverlayRenderer, RenderBackend, RenderError, RenderResult,
};
use crate::scene::{Entity, MeshComponent, Scene, SceneManager};

fn settings() -> RendererSettings {
    RendererSettings::default().with_shadow_maps(256, 2)
}

fn pipeline_with(settings: RendererSettings) -> GraphicsPipeline {
    let mut pipeline = GraphicsPipeline::new(Box::new(HeadlessBackend::new()), settings).expect("pipeline");
    pipeline.init(640, 480).expect("init");
    pipeline
}

fn headless(pipeline: &GraphicsPipeline) -> &HeadlessBackend {
    pipeline
        .backend()
        .as_any()
        .downcast_ref::<HeadlessBackend>()
        .expect("headless backend")
}

fn take_calls(pipeline: &mut GraphicsPipeline) -> Vec<BackendCall> {
    pipeline
        .backend_mut()
        .as_any_mut()
        .downcast_mut::<HeadlessBackend>()
        .expect("headless backend")
        .take_calls()
}

fn cubes(name: &str, count: usize) -> Scene {
    let mut scene = Scene::new(name);
    for i in 0..count {
        scene.create_entity(
            Entity::new(format!("cube{i}"), Transform::from_position(Vec3::new(i as f32 * 0.2 - 0.5, 0.0, 0.0)))
                .with_mesh(MeshComponent::new(MeshHandle(1)))
                .with_bounding_radius(0.1),
        );
    }
    scene
}

fn bound(pipeline: &mut GraphicsPipeline, scene: Scene) -> SceneManager {
    let mut manager = SceneManager::new();
    manager.enqueue_scene(scene);
    manager.apply_scene_switch(pipeline);
    manager
}

struct CountingOverlay {
    calls: Rc<Cell<usize>>,
}

impl OverlayRenderer for CountingOverlay {
    fn render(&mut self, _backend: &mut dyn RenderBackend, _command_buffer: CommandBufferHandle) -> RenderResult<()> {
        self.calls.set(self.calls.get() + 1);
        Ok(())
    }
}

#[test]
fn test_frame_without_scene_renders_nothing() {
    let mut pipeline = pipeline_with(settings());
    take_calls(&mut pipeline);

    let stats = pipeline.render_scene(None).expect("frame");

    assert!(!stats.rendered);
    assert!(take_calls(&mut pipeline).is_empty());
}

#[test]
fn test_unbound_scene_is_skipped() {
    let mut pipeline = pipeline_with(settings());
    let _manager = bound(&mut pipeline, cubes("bound", 2));
    let mut stranger = cubes("stranger", 2);

    let stats = pipeline.render_scene(Some(&mut stranger)).expect("frame");

    assert!(!stats.rendered);
    assert!(stranger.entities().values().all(|entity| entity.cull_flags == 0));
}

#[test]
fn test_render_before_init_is_an_error() {
    let mut pipeline = GraphicsPipeline::new(Box::new(HeadlessBackend::new()), settings()).expect("pipeline");
    let mut scene = cubes("early", 1);
    pipeline.set_scene(Some(scene.id()));

    assert!(matches!(
        pipeline.render_scene(Some(&mut scene)),
        Err(RenderError::InvalidReference(_))
    ));
}

#[test]
fn test_backend_creation_failure_surfaces_from_init() {
    let mut backend = HeadlessBackend::new();
    backend.set_fail_creation(true);
    let mut pipeline = GraphicsPipeline::new(Box::new(backend), settings()).expect("pipeline");

    assert!(matches!(pipeline.init(640, 480), Err(RenderError::BackendCreation(_))));
    assert!(pipeline.deferred().is_none());
}

#[test]
fn test_frame_runs_shadow_geometry_and_lighting() {
    let mut pipeline = pipeline_with(settings());
    let mut manager = bound(&mut pipeline, cubes("frame", 5));
    take_calls(&mut pipeline);

    let stats = pipeline.render_scene(manager.current_scene_mut()).expect("frame");
    let calls = take_calls(&mut pipeline);

    assert!(stats.rendered);
    assert_eq!(stats.visible_objects, 5);
    assert_eq!(stats.deferred.geometry_draws, 5);
    assert_eq!(stats.deferred.shadow.cascades, 2);
    assert!(stats.deferred.shadow.draws > 0);
    assert!(!pipeline.needs_scene_init());

    let present = calls.iter().filter(|call| **call == BackendCall::Present).count();
    assert_eq!(present, 1);
    assert_eq!(calls.last(), Some(&BackendCall::Present));
}

#[test]
fn test_list_membership_matches_cull_flags() {
    let mut pipeline = pipeline_with(settings());
    let mut scene = cubes("membership", 6);
    let outside = scene.create_entity(
        Entity::new("far away", Transform::from_position(Vec3::new(0.0, 0.0, 500.0)))
            .with_mesh(MeshComponent::new(MeshHandle(1))),
    );
    let mut manager = bound(&mut pipeline, scene);

    for _ in 0..3 {
        pipeline.render_scene(manager.current_scene_mut()).expect("frame");
    }

    let list = pipeline.frame_list();
    let scene = manager.current_scene().expect("scene");
    for (id, entity) in scene.entities() {
        let listed = list.opaque_entries().iter().any(|entry| entry.entity == id)
            || list.transparent_entries().iter().any(|entry| entry.entity == id);
        assert_eq!(entity.in_list(list.bit_mask()), listed, "entity {}", entity.name);
    }
    assert!(!scene.entities()[outside].in_list(list.bit_mask()));
}

#[test]
fn test_hidden_objects_skip_drawing_but_keep_culling() {
    let mut pipeline = pipeline_with(settings());
    let mut manager = bound(&mut pipeline, cubes("hidden", 3));
    if let Some(scene) = manager.current_scene_mut() {
        scene.set_draw_objects(false);
    }
    take_calls(&mut pipeline);

    let stats = pipeline.render_scene(manager.current_scene_mut()).expect("frame");

    assert!(stats.rendered);
    assert_eq!(stats.visible_objects, 3);
    assert_eq!(stats.deferred.geometry_draws, 0);
    assert!(!take_calls(&mut pipeline).contains(&BackendCall::Present));
}

#[test]
fn test_overlay_runs_once_per_command_buffer() {
    let mut pipeline = pipeline_with(RendererSettings { command_buffer_count: 3, ..settings() });
    let mut manager = bound(&mut pipeline, cubes("overlay", 1));
    let calls = Rc::new(Cell::new(0));
    pipeline.set_overlay(Some(Box::new(CountingOverlay { calls: Rc::clone(&calls) })));

    pipeline.render_scene(manager.current_scene_mut()).expect("frame");

    assert_eq!(calls.get(), 3);
}

#[test]
fn test_resize_reinitialises_on_next_frame() {
    let mut pipeline = pipeline_with(settings());
    let mut manager = bound(&mut pipeline, cubes("resize", 2));
    pipeline.render_scene(manager.current_scene_mut()).expect("frame");

    pipeline.on_resize(1024, 768, manager.current_scene_mut()).expect("resize");

    assert!(pipeline.needs_scene_init());
    assert!(take_calls(&mut pipeline).contains(&BackendCall::Resize { width: 1024, height: 768 }));
    let scene = manager.current_scene().expect("scene");
    assert_eq!((scene.screen_width(), scene.screen_height()), (1024, 768));

    pipeline.render_scene(manager.current_scene_mut()).expect("frame");

    assert!(!pipeline.needs_scene_init());
    assert_eq!(pipeline.deferred().map(|deferred| deferred.width()), Some(1024));
}

#[test]
fn test_cache_sweep_releases_idle_objects_only() {
    let mut pipeline = pipeline_with(settings());
    let mut manager = bound(&mut pipeline, cubes("sweep", 2));
    pipeline.render_scene(manager.current_scene_mut()).expect("frame");
    pipeline.on_resize(800, 600, manager.current_scene_mut()).expect("resize");
    pipeline.render_scene(manager.current_scene_mut()).expect("frame");
    let cached = pipeline.caches().len();

    assert_eq!(pipeline.delete_unused_cache(Instant::now()), 0);

    let evicted = pipeline.delete_unused_cache(Instant::now() + Duration::from_secs(10));

    assert!(evicted > 0);
    assert_eq!(pipeline.caches().len(), cached - evicted);
    pipeline.render_scene(manager.current_scene_mut()).expect("frame after sweep");
}

#[test]
fn test_reset_clears_main_and_shadow_lists() {
    let mut pipeline = pipeline_with(settings());
    let mut manager = bound(&mut pipeline, cubes("reset", 4));
    pipeline.render_scene(manager.current_scene_mut()).expect("frame");

    pipeline.reset(manager.current_scene_mut());

    assert!(pipeline.frame_list().is_empty());
    assert!(pipeline.needs_scene_init());
    let shadow = pipeline.deferred().expect("deferred").shadow();
    assert!(shadow.cascades().iter().all(|cascade| cascade.list().is_empty()));
    let scene = manager.current_scene().expect("scene");
    assert!(scene.entities().values().all(|entity| entity.cull_flags == 0));
}

#[test]
fn test_cascade_count_change_recreates_framebuffers_once() {
    let mut pipeline = pipeline_with(settings());
    let mut manager = bound(&mut pipeline, cubes("cascades", 3));
    pipeline.render_scene(manager.current_scene_mut()).expect("frame");
    let generation = pipeline.deferred().expect("deferred").shadow().framebuffer_generation();

    assert_eq!(pipeline.set_shadow_map_num(3, manager.current_scene_mut()), 3);
    let first = pipeline.render_scene(manager.current_scene_mut()).expect("frame");
    pipeline.render_scene(manager.current_scene_mut()).expect("frame");

    assert_eq!(first.deferred.shadow.cascades, 3);
    let shadow = pipeline.deferred().expect("deferred").shadow();
    assert_eq!(shadow.framebuffer_generation(), generation + 1);
    assert_eq!(shadow.split_depths().len(), 3);
}

#[test]
fn test_switching_scenes_leaves_no_stale_bits() {
    let mut pipeline = pipeline_with(settings());
    let mut manager = SceneManager::new();
    manager.enqueue_scene(cubes("first", 4));
    manager.enqueue_scene(cubes("second", 4));

    for _ in 0..4 {
        manager.apply_scene_switch(&mut pipeline);
        pipeline.render_scene(manager.current_scene_mut()).expect("frame");
        manager.switch_to_next_scene();
    }
    manager.apply_scene_switch(&mut pipeline);

    let current = manager.current_index().expect("current");
    let idle = manager.scene(1 - current).expect("idle scene");
    assert!(idle.entities().values().all(|entity| entity.cull_flags == 0));
    assert_eq!(headless(&pipeline).name(), "Headless");
}

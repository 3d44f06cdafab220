//! # Graphics Pipeline
//!
//! Frame orchestration for the rendering core. The pipeline owns the injected
//! backend, the resource caches, the render list allocator and the main
//! render list, and drives the [`DeferredRenderer`] once per frame.
//!
//! ## Lifecycle
//!
//! ```text
//! new → init(w, h) → set_scene(id) → [render_scene(scene)]* → on_resize(w, h)? → reset(scene)?
//! ```
//!
//! The pipeline only remembers the *identity* of the bound scene. The scene
//! itself is owned by the [`SceneManager`](crate::scene::SceneManager) and
//! lent to every call that needs it.
//!
//! ## Frame
//!
//! 1. nothing happens without a bound scene
//! 2. after a scene switch or reset the deferred renderer is re-initialised
//! 3. the camera view matrix is rebuilt and the main frustum derived from it
//! 4. world matrices are rebuilt
//! 5. the main list is re-centred, culled, sorted and refilled
//! 6. if the scene draws objects: deferred render, one screen pass per
//!    command buffer (with the overlay), present
//!
//! Cached GPU objects that went unused for longer than the cache lifetime
//! are released at the end of every frame.

use std::time::Instant;

use crate::core::config::RendererSettings;
use crate::render::deferred_renderer::{DeferredRenderer, DeferredStats};
use crate::render::resources::ResourceCaches;
use crate::render::{
    CommandBufferHandle, RenderBackend, RenderContext, RenderError, RenderList, RenderListAllocator,
    RenderResult,
};
use crate::scene::{Scene, SceneId};
use crate::spatial::Frustum;

/// Immediate-mode UI or debug overlay drawn on top of the lit frame
///
/// Called once per command buffer while the screen pass is open.
pub trait OverlayRenderer {
    /// Record the overlay into `command_buffer`
    fn render(&mut self, backend: &mut dyn RenderBackend, command_buffer: CommandBufferHandle) -> RenderResult<()>;

    /// The surface was resized
    fn on_resize(&mut self, _width: u32, _height: u32) {}
}

/// What the last frame did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Whether a scene was rendered at all
    pub rendered: bool,
    /// Entities in the main render list after culling and insertion
    pub visible_objects: usize,
    /// Deferred renderer counters
    pub deferred: DeferredStats,
    /// Cached objects released by the end-of-frame sweep
    pub evicted_resources: usize,
}

/// Per-frame driver of the deferred renderer
pub struct GraphicsPipeline {
    backend: Box<dyn RenderBackend>,
    caches: ResourceCaches,
    allocator: RenderListAllocator,
    settings: RendererSettings,
    frame_list: RenderList,
    frame_frustum: Option<Frustum>,
    deferred: Option<DeferredRenderer>,
    overlay: Option<Box<dyn OverlayRenderer>>,
    scene: Option<SceneId>,
    need_scene_init: bool,
    new_scene: bool,
    width: u32,
    height: u32,
    last_stats: FrameStats,
}

impl std::fmt::Debug for GraphicsPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsPipeline")
            .field("backend", &self.backend.name())
            .field("scene", &self.scene)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("need_scene_init", &self.need_scene_init)
            .field("cached_objects", &self.caches.len())
            .finish_non_exhaustive()
    }
}

impl GraphicsPipeline {
    /// Take ownership of `backend` and allocate the main render list
    pub fn new(backend: Box<dyn RenderBackend>, settings: RendererSettings) -> RenderResult<Self> {
        let allocator = RenderListAllocator::new();
        let frame_list = RenderList::allocate(&allocator, true)
            .map_err(|err| {
                log::error!("[GraphicsPipeline] - Unable to allocate scene render list, try fewer shadow maps");
                err
            })?
            .with_max_changes_per_frame(settings.max_list_changes_per_frame);

        log::info!("[GraphicsPipeline] - Using backend '{}'", backend.name());

        Ok(Self {
            caches: ResourceCaches::new(settings.cache_lifetime()),
            backend,
            allocator,
            settings,
            frame_list,
            frame_frustum: None,
            deferred: None,
            overlay: None,
            scene: None,
            need_scene_init: true,
            new_scene: true,
            width: 0,
            height: 0,
            last_stats: FrameStats::default(),
        })
    }

    /// Create the renderers for a `width` x `height` surface
    pub fn init(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.width = width;
        self.height = height;

        if let Some(mut previous) = self.deferred.take() {
            previous.destroy(self.backend.as_mut());
        }

        let mut ctx = RenderContext::new(self.backend.as_mut(), &mut self.caches, Instant::now());
        let deferred = DeferredRenderer::new(&mut ctx, &self.allocator, &self.settings, width, height)?;
        self.deferred = Some(deferred);
        self.need_scene_init = true;

        log::info!("[GraphicsPipeline] - Initialised at {}x{}", width, height);
        Ok(())
    }

    /// Bind the scene rendered by subsequent frames, or unbind with `None`
    pub fn set_scene(&mut self, scene: Option<SceneId>) {
        self.scene = scene;
        self.new_scene = true;
        self.need_scene_init = true;
    }

    /// Render one frame of `scene`
    ///
    /// A missing scene, a scene other than the bound one, or a scene without
    /// a camera renders nothing.
    pub fn render_scene(&mut self, scene: Option<&mut Scene>) -> RenderResult<FrameStats> {
        let mut stats = FrameStats::default();

        let Some(scene) = scene else {
            return Ok(stats);
        };
        if self.scene != Some(scene.id()) {
            log::warn!("[GraphicsPipeline] - Scene '{}' is not the bound scene, skipping frame", scene.name());
            return Ok(stats);
        }
        let Some(deferred) = self.deferred.as_mut() else {
            return Err(RenderError::InvalidReference("render_scene called before init".to_string()));
        };

        let now = Instant::now();
        let mut ctx = RenderContext::new(self.backend.as_mut(), &mut self.caches, now);

        if self.need_scene_init {
            deferred.init_scene(&mut ctx, scene, self.new_scene)?;
            self.new_scene = false;
            self.need_scene_init = false;
        }

        let Some(camera) = scene.camera_mut() else {
            return Ok(stats);
        };
        camera.build_view_matrix();
        let frustum = Frustum::from_matrix(&camera.view_projection_matrix());
        let camera_position = camera.position();

        scene.build_world_matrices();

        self.frame_list.update_camera_world_pos(camera_position, scene.entities());
        self.frame_list.remove_excess_objects(&frustum, scene.entities_mut());
        self.frame_list.sort_lists();
        scene.insert_to_render_list(&mut self.frame_list, &frustum);
        self.frame_frustum = Some(frustum);
        stats.visible_objects = self.frame_list.len();

        if scene.draw_objects() {
            stats.deferred = deferred.render_scene(&mut ctx, &self.frame_list, scene)?;

            for index in 0..deferred.command_buffer_count() {
                deferred.begin(&mut ctx, index)?;
                deferred.present(&mut ctx)?;
                if let (Some(overlay), Some(cmd)) = (self.overlay.as_mut(), deferred.command_buffer(index)) {
                    overlay.render(&mut *ctx.backend, cmd)?;
                }
                deferred.end(&mut ctx)?;
            }

            deferred.present_to_screen(&mut ctx)?;
        }
        stats.rendered = true;

        stats.evicted_resources = self.caches.delete_unused(self.backend.as_mut(), now);
        self.last_stats = stats;
        Ok(stats)
    }

    /// Adopt a new surface size
    ///
    /// The renderers are re-initialised against the scene on the next frame.
    pub fn on_resize(&mut self, width: u32, height: u32, scene: Option<&mut Scene>) -> RenderResult<()> {
        self.need_scene_init = true;
        self.width = width;
        self.height = height;

        self.backend.on_resize(width, height)?;
        if let Some(deferred) = self.deferred.as_mut() {
            deferred.on_resize(self.backend.as_mut(), width, height);
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.on_resize(width, height);
        }

        if let Some(scene) = scene {
            scene.set_screen_size(width, height);
            if let Some(camera) = scene.camera_mut() {
                camera.update_projection_matrix(width, height);
            }
        }

        log::info!("[GraphicsPipeline] - Resized to {}x{}", width, height);
        Ok(())
    }

    /// Empty the main and shadow render lists and re-initialise on the next frame
    ///
    /// Pass the scene the lists were filled from so its cull flags are
    /// cleared along with them.
    pub fn reset(&mut self, mut scene: Option<&mut Scene>) {
        match scene.as_deref_mut() {
            Some(scene) => self.frame_list.remove_all_objects(scene.entities_mut()),
            None => self.frame_list.clear(),
        }
        if let Some(deferred) = self.deferred.as_mut() {
            deferred
                .shadow_mut()
                .clear_render_lists(scene.map(|scene| scene.entities_mut()));
        }

        self.frame_frustum = None;
        self.need_scene_init = true;
    }

    /// Change the number of shadow cascades; returns the active count
    pub fn set_shadow_map_num(&mut self, num: u32, scene: Option<&mut Scene>) -> u32 {
        match self.deferred.as_mut() {
            Some(deferred) => deferred.shadow_mut().set_shadow_map_num(
                num,
                &self.allocator,
                scene.map(|scene| scene.entities_mut()),
            ),
            None => {
                self.settings.shadow_map_count = num;
                num
            }
        }
    }

    /// Change the shadow map resolution
    pub fn set_shadow_map_size(&mut self, size: u32) {
        self.settings.shadow_map_size = size;
        if let Some(deferred) = self.deferred.as_mut() {
            deferred.shadow_mut().set_shadow_map_size(size);
        }
    }

    /// Install (or remove) the overlay drawn on top of every frame
    pub fn set_overlay(&mut self, overlay: Option<Box<dyn OverlayRenderer>>) {
        self.overlay = overlay;
    }

    /// Release cached objects idle for longer than the cache lifetime
    pub fn delete_unused_cache(&mut self, now: Instant) -> usize {
        self.caches.delete_unused(self.backend.as_mut(), now)
    }

    /// The backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Mutable access to the backend
    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    /// Resource caches
    pub fn caches(&self) -> &ResourceCaches {
        &self.caches
    }

    /// Allocator shared by every render list of this pipeline
    pub fn allocator(&self) -> &RenderListAllocator {
        &self.allocator
    }

    /// Main camera render list
    pub fn frame_list(&self) -> &RenderList {
        &self.frame_list
    }

    /// Main camera frustum of the last frame
    pub fn frame_frustum(&self) -> Option<&Frustum> {
        self.frame_frustum.as_ref()
    }

    /// Deferred renderer, once initialised
    pub fn deferred(&self) -> Option<&DeferredRenderer> {
        self.deferred.as_ref()
    }

    /// Bound scene
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    /// Whether the next frame re-initialises the renderers
    pub fn needs_scene_init(&self) -> bool {
        self.need_scene_init
    }

    /// Surface width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Settings the pipeline was created with
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Counters of the last rendered frame
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        if let Some(mut deferred) = self.deferred.take() {
            deferred.destroy(self.backend.as_mut());
        }
        self.caches.clear(self.backend.as_mut());
        log::debug!("[GraphicsPipeline] - Released GPU resources");
    }
}

//! # Deferred Renderer
//!
//! Turns the main render list into a frame:
//!
//! 1. the [`ShadowRenderer`] fills the cascaded shadow maps,
//! 2. the geometry pass writes every visible mesh into the G-buffer
//!    (opaque front to back, then transparent back to front),
//! 3. per command buffer, the lighting pass shades a screen quad from the
//!    G-buffer and the shadow maps into the screen target,
//! 4. the recorded command buffers are submitted and presented.
//!
//! Steps 1 and 2 happen in [`DeferredRenderer::render_scene`]; step 3 is
//! driven by the caller through `begin` / `present` / `end` so an overlay can
//! record into the same command buffer before it ends.

use std::sync::Arc;

use crate::core::config::RendererSettings;
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::resources::{
    AttachmentInfo, CullMode, Framebuffer, FramebufferDesc, Pipeline, PipelineDesc, PipelineFlags,
    RenderPass, RenderPassDesc, TextureDesc, TextureFormat,
};
use crate::render::shadow::{ShadowRenderer, ShadowStats};
use crate::render::uniform::{DynamicUniformScratch, LightUniformData, MAT4_SIZE};
use crate::render::{
    CommandBufferHandle, CommandQueue, FramebufferHandle, GpuResource, MeshHandle, RenderBackend,
    RenderCommand, RenderContext, RenderError, RenderList, RenderListAllocator, RenderResult,
    ShaderHandle, TextureHandle, UniformBufferHandle,
};
use crate::scene::Scene;

const GBUFFER_COLOR_FORMATS: [TextureFormat; 4] = [
    TextureFormat::Rgba8,   // albedo
    TextureFormat::Rgba16F, // position
    TextureFormat::Rgba16F, // normals
    TextureFormat::Rgba8,   // metallic / roughness / ao
];

/// Counters of one deferred frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeferredStats {
    /// Shadow pass counters
    pub shadow: ShadowStats,
    /// Meshes drawn into the G-buffer
    pub geometry_draws: usize,
    /// Geometry commands dropped because the dynamic uniform buffer was full
    pub dropped: usize,
}

/// Deferred shading renderer with cascaded shadows
#[derive(Debug)]
pub struct DeferredRenderer {
    shadow: ShadowRenderer,
    width: u32,
    height: u32,
    clear_color: Vec4,

    geometry_shader: ShaderHandle,
    lighting_shader: ShaderHandle,
    geometry_pass: Arc<RenderPass>,
    screen_pass: Arc<RenderPass>,
    geometry_pipeline: Arc<Pipeline>,
    transparent_pipeline: Arc<Pipeline>,
    lighting_pipeline: Arc<Pipeline>,

    gbuffer: Vec<TextureHandle>,
    screen_depth: Option<TextureHandle>,
    gbuffer_framebuffer: Option<Arc<Framebuffer>>,
    screen_framebuffers: Vec<Arc<Framebuffer>>,

    screen_quad: MeshHandle,
    offscreen_command_buffer: CommandBufferHandle,
    command_buffers: Vec<CommandBufferHandle>,
    current: Option<usize>,
    recorded: Vec<usize>,

    system_uniforms: UniformBufferHandle,
    model_uniforms: UniformBufferHandle,
    light_uniforms: UniformBufferHandle,
    scratch: DynamicUniformScratch,
    queue: CommandQueue,
    opaque_count: usize,
    view_projection: Mat4,
    light_data: LightUniformData,
}

impl DeferredRenderer {
    /// Create the renderer, its shadow renderer and every size-independent object
    ///
    /// Size-dependent targets are created on the first frame.
    pub fn new(
        ctx: &mut RenderContext<'_>,
        allocator: &RenderListAllocator,
        settings: &RendererSettings,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let shadow = ShadowRenderer::new(ctx, allocator, settings)?;

        let geometry_shader = ctx.backend.create_shader("deferred_geometry")?;
        let lighting_shader = ctx.backend.create_shader("deferred_lighting")?;

        let mut gbuffer_attachments: Vec<AttachmentInfo> =
            GBUFFER_COLOR_FORMATS.iter().copied().map(AttachmentInfo::color).collect();
        gbuffer_attachments.push(AttachmentInfo::depth());
        let geometry_pass = ctx.caches.render_passes.get(
            ctx.backend,
            &RenderPassDesc::new(gbuffer_attachments).with_clear(true).with_label("gbuffer"),
            ctx.now,
        )?;
        let screen_pass = ctx.caches.render_passes.get(
            ctx.backend,
            &RenderPassDesc::new(vec![AttachmentInfo::swapchain(), AttachmentInfo::depth()])
                .with_clear(true)
                .with_label("screen"),
            ctx.now,
        )?;

        let geometry_desc = PipelineDesc::new(geometry_shader, geometry_pass.handle());
        let geometry_pipeline = ctx.caches.pipelines.get(ctx.backend, &geometry_desc, ctx.now)?;
        let transparent_pipeline = ctx.caches.pipelines.get(
            ctx.backend,
            &geometry_desc.clone().with_flags(PipelineFlags::TRANSPARENCY),
            ctx.now,
        )?;
        let lighting_pipeline = ctx.caches.pipelines.get(
            ctx.backend,
            &PipelineDesc::new(lighting_shader, screen_pass.handle()).with_cull_mode(CullMode::None),
            ctx.now,
        )?;

        let screen_quad = ctx.backend.create_mesh("screen_quad", 6)?;
        let offscreen_command_buffer = ctx.backend.create_command_buffer()?;
        let command_buffers = (0..settings.command_buffer_count.max(1))
            .map(|_| ctx.backend.create_command_buffer())
            .collect::<RenderResult<Vec<_>>>()?;

        let scratch = DynamicUniformScratch::new(
            settings.max_scene_objects,
            ctx.backend.min_uniform_buffer_offset_alignment(),
        );
        let system_uniforms = ctx.backend.create_uniform_buffer(MAT4_SIZE)?;
        let model_uniforms = ctx.backend.create_uniform_buffer(scratch.size_bytes())?;
        let light_uniforms = ctx.backend.create_uniform_buffer(std::mem::size_of::<LightUniformData>())?;

        log::info!(
            "[DeferredRenderer] - Created at {}x{} with {} command buffers",
            width,
            height,
            command_buffers.len()
        );

        Ok(Self {
            shadow,
            width,
            height,
            clear_color: Vec4::new(0.8, 0.8, 0.8, 1.0),
            geometry_shader,
            lighting_shader,
            geometry_pass,
            screen_pass,
            geometry_pipeline,
            transparent_pipeline,
            lighting_pipeline,
            gbuffer: Vec::new(),
            screen_depth: None,
            gbuffer_framebuffer: None,
            screen_framebuffers: Vec::new(),
            screen_quad,
            offscreen_command_buffer,
            command_buffers,
            current: None,
            recorded: Vec::new(),
            system_uniforms,
            model_uniforms,
            light_uniforms,
            queue: CommandQueue::new(settings.max_scene_objects),
            scratch,
            opaque_count: 0,
            view_projection: Mat4::identity(),
            light_data: bytemuck::Zeroable::zeroed(),
        })
    }

    /// Prepare for rendering `scene`
    ///
    /// A new scene empties the shadow cascades and forces their framebuffers
    /// to be rebuilt. Either way the size-dependent targets are recreated.
    pub fn init_scene(&mut self, ctx: &mut RenderContext<'_>, scene: &mut Scene, new_scene: bool) -> RenderResult<()> {
        if new_scene {
            self.shadow.clear_render_lists(Some(scene.entities_mut()));
            self.shadow.invalidate_framebuffers();
        }

        self.destroy_targets(ctx.backend);
        self.create_targets(ctx)?;

        log::info!(
            "[DeferredRenderer] - Initialised scene '{}' ({})",
            scene.name(),
            if new_scene { "new scene" } else { "reset" }
        );
        Ok(())
    }

    fn create_targets(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<bool> {
        if self.gbuffer_framebuffer.is_some() {
            return Ok(true);
        }
        if self.width == 0 || self.height == 0 {
            return Ok(false);
        }

        for format in GBUFFER_COLOR_FORMATS {
            let texture = ctx.backend.create_texture(&TextureDesc::color(self.width, self.height, format))?;
            self.gbuffer.push(texture);
        }
        self.gbuffer.push(ctx.backend.create_texture(&TextureDesc::depth(self.width, self.height))?);

        let desc = FramebufferDesc::new(self.geometry_pass.handle(), self.gbuffer.clone(), self.width, self.height);
        self.gbuffer_framebuffer = Some(ctx.caches.framebuffers.get(ctx.backend, &desc, ctx.now)?);

        let screen_depth = ctx.backend.create_texture(&TextureDesc::depth(self.width, self.height))?;
        self.screen_depth = Some(screen_depth);
        for image in 0..self.command_buffers.len() {
            let desc = FramebufferDesc {
                attachments: vec![screen_depth],
                ..FramebufferDesc::screen(self.screen_pass.handle(), self.width, self.height)
            };
            #[allow(clippy::cast_possible_truncation)]
            let desc = desc.with_layer(image as u32);
            self.screen_framebuffers.push(ctx.caches.framebuffers.get(ctx.backend, &desc, ctx.now)?);
        }

        log::debug!("[DeferredRenderer] - Created targets at {}x{}", self.width, self.height);
        Ok(true)
    }

    fn destroy_targets(&mut self, backend: &mut dyn RenderBackend) {
        self.gbuffer_framebuffer = None;
        self.screen_framebuffers.clear();
        for texture in self.gbuffer.drain(..).chain(self.screen_depth.take()) {
            backend.destroy(GpuResource::Texture(texture));
        }
    }

    /// Shadow pass, then the geometry pass for everything in `main_list`
    pub fn render_scene(
        &mut self,
        ctx: &mut RenderContext<'_>,
        main_list: &RenderList,
        scene: &mut Scene,
    ) -> RenderResult<DeferredStats> {
        let mut stats = DeferredStats {
            shadow: self.shadow.render_scene(ctx, scene)?,
            ..DeferredStats::default()
        };

        self.submit_light_setup(scene);
        if !self.begin_offscreen(ctx)? {
            return Ok(stats);
        }
        if let Some(camera) = scene.camera() {
            self.view_projection = camera.view_projection_matrix();
        }

        let queue = &mut self.queue;
        let entities = scene.entities();
        main_list.render_opaque_objects(entities, |_, entity| {
            if let Some(mesh) = &entity.mesh {
                queue.push(RenderCommand::new(mesh.mesh, *entity.world_matrix(), mesh.texture_matrix));
            }
        });
        self.opaque_count = queue.len();
        main_list.render_transparent_objects(entities, |_, entity| {
            if let Some(mesh) = &entity.mesh {
                queue.push(RenderCommand::new(mesh.mesh, *entity.world_matrix(), mesh.texture_matrix));
            }
        });

        stats.dropped = self.queue.dropped();
        if stats.dropped > 0 {
            log::warn!(
                "[DeferredRenderer] - Dropped {} meshes over the limit of {}",
                stats.dropped,
                self.queue.capacity()
            );
        }

        self.set_system_uniforms(ctx)?;
        stats.geometry_draws = self.present_offscreen(ctx)?;
        self.end_offscreen(ctx)?;

        Ok(stats)
    }

    fn submit_light_setup(&mut self, scene: &Scene) {
        let light = scene.light_setup().directional_light();
        let camera_position = scene.camera().map_or_else(Vec3::zeros, |camera| camera.position());

        self.light_data = LightUniformData::new(
            &light.direction,
            &light.color,
            light.intensity,
            &camera_position,
            &self.shadow.shadow_proj_view(),
            &self.shadow.split_depths(),
            self.shadow.shadow_map_size(),
        );
    }

    fn begin_offscreen(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<bool> {
        if !self.create_targets(ctx)? {
            log::trace!("[DeferredRenderer] - Zero-sized surface, skipping geometry pass");
            return Ok(false);
        }

        self.queue.clear();
        self.opaque_count = 0;
        ctx.backend.begin_recording(self.offscreen_command_buffer)?;
        Ok(true)
    }

    fn set_system_uniforms(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        ctx.backend
            .set_uniform_data(self.system_uniforms, bytemuck::cast_slice(self.view_projection.as_slice()))?;

        self.scratch.reset();
        for (index, command) in self.queue.commands().iter().enumerate() {
            self.scratch.write_matrix(index, &command.transform)?;
        }
        if !self.queue.is_empty() {
            ctx.backend.set_dynamic_uniform_data(self.model_uniforms, self.scratch.used_bytes())?;
        }

        ctx.backend.set_uniform_data(self.light_uniforms, bytemuck::bytes_of(&self.light_data))
    }

    fn present_offscreen(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<usize> {
        let framebuffer = self
            .gbuffer_framebuffer
            .as_ref()
            .ok_or_else(|| RenderError::InvalidReference("G-buffer framebuffer missing".to_string()))?;
        let cmd = self.offscreen_command_buffer;
        let stride = u32::try_from(self.scratch.stride())
            .map_err(|_| RenderError::ResourceExhausted("dynamic uniform stride overflows u32".to_string()))?;

        ctx.backend.begin_render_pass(
            cmd,
            self.geometry_pass.handle(),
            framebuffer.handle(),
            Vec4::zeros(),
            self.width,
            self.height,
        )?;

        let mut offset = 0;
        for (index, command) in self.queue.commands().iter().enumerate() {
            let pipeline = if index < self.opaque_count {
                &self.geometry_pipeline
            } else {
                &self.transparent_pipeline
            };
            if index == 0 || index == self.opaque_count {
                ctx.backend.bind_pipeline(cmd, pipeline.handle())?;
            }
            ctx.backend.render_mesh(cmd, pipeline.handle(), command.mesh, Some(offset))?;
            offset += stride;
        }

        ctx.backend.end_render_pass(cmd)?;
        Ok(self.queue.len())
    }

    fn end_offscreen(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        ctx.backend.end_recording(self.offscreen_command_buffer)?;
        ctx.backend.execute(self.offscreen_command_buffer)
    }

    /// Number of command buffers the lighting pass is recorded into
    pub fn command_buffer_count(&self) -> usize {
        self.command_buffers.len()
    }

    /// Command buffer `index`, for overlays recording into the same pass
    pub fn command_buffer(&self, index: usize) -> Option<CommandBufferHandle> {
        self.command_buffers.get(index).copied()
    }

    /// Command buffer currently being recorded
    pub fn current_command_buffer(&self) -> Option<CommandBufferHandle> {
        self.current.and_then(|index| self.command_buffer(index))
    }

    /// Start recording the screen pass into command buffer `index`
    pub fn begin(&mut self, ctx: &mut RenderContext<'_>, index: usize) -> RenderResult<()> {
        let cmd = self
            .command_buffer(index)
            .ok_or_else(|| RenderError::InvalidReference(format!("command buffer {index} out of range")))?;
        let framebuffer = self
            .screen_framebuffers
            .get(index)
            .ok_or_else(|| RenderError::InvalidReference(format!("screen framebuffer {index} missing")))?;

        ctx.backend.begin_recording(cmd)?;
        ctx.backend.begin_render_pass(
            cmd,
            self.screen_pass.handle(),
            framebuffer.handle(),
            self.clear_color,
            self.width,
            self.height,
        )?;
        self.current = Some(index);
        Ok(())
    }

    /// Record the lighting pass into the current command buffer
    pub fn present(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let cmd = self
            .current_command_buffer()
            .ok_or_else(|| RenderError::InvalidReference("present called outside begin/end".to_string()))?;

        ctx.backend.bind_pipeline(cmd, self.lighting_pipeline.handle())?;
        ctx.backend.render_mesh(cmd, self.lighting_pipeline.handle(), self.screen_quad, None)
    }

    /// Finish the current command buffer
    pub fn end(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let Some(index) = self.current.take() else {
            return Ok(());
        };
        let cmd = self.command_buffers[index];

        ctx.backend.end_render_pass(cmd)?;
        ctx.backend.end_recording(cmd)?;
        self.recorded.push(index);
        Ok(())
    }

    /// Submit the command buffers recorded this frame and present
    pub fn present_to_screen(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        for index in std::mem::take(&mut self.recorded) {
            ctx.backend.execute(self.command_buffers[index])?;
        }
        ctx.backend.present()
    }

    /// Adopt a new surface size; targets are rebuilt on the next frame
    pub fn on_resize(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) {
        if width == self.width && height == self.height && self.gbuffer_framebuffer.is_some() {
            return;
        }
        self.width = width;
        self.height = height;
        self.destroy_targets(backend);
    }

    /// Release every backend object owned by this renderer
    pub fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        self.destroy_targets(backend);
        self.shadow.destroy(backend);

        for cmd in self.command_buffers.drain(..).chain([self.offscreen_command_buffer]) {
            backend.destroy(GpuResource::CommandBuffer(cmd));
        }
        for buffer in [self.system_uniforms, self.model_uniforms, self.light_uniforms] {
            backend.destroy(GpuResource::UniformBuffer(buffer));
        }
        backend.destroy(GpuResource::Mesh(self.screen_quad));
        backend.destroy(GpuResource::Shader(self.geometry_shader));
        backend.destroy(GpuResource::Shader(self.lighting_shader));
    }

    /// The shadow renderer
    pub fn shadow(&self) -> &ShadowRenderer {
        &self.shadow
    }

    /// Mutable access to the shadow renderer
    pub fn shadow_mut(&mut self) -> &mut ShadowRenderer {
        &mut self.shadow
    }

    /// Surface width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// G-buffer framebuffer, once created
    pub fn gbuffer_framebuffer(&self) -> Option<FramebufferHandle> {
        self.gbuffer_framebuffer.as_ref().map(|framebuffer| framebuffer.handle())
    }

    /// Light data uploaded by the last frame
    pub fn light_data(&self) -> &LightUniformData {
        &self.light_data
    }

    /// Set the screen clear color
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::foundation::math::Transform;
    use crate::render::backends::{BackendCall, HeadlessBackend};
    use crate::render::resources::ResourceCaches;
    use crate::scene::{Entity, MeshComponent};

    struct Fixture {
        backend: HeadlessBackend,
        caches: ResourceCaches,
        allocator: RenderListAllocator,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                backend: HeadlessBackend::new(),
                caches: ResourceCaches::default(),
                allocator: RenderListAllocator::new(),
            }
        }

        fn ctx(&mut self) -> RenderContext<'_> {
            RenderContext::new(&mut self.backend, &mut self.caches, Instant::now())
        }

        fn renderer(&mut self, settings: &RendererSettings) -> DeferredRenderer {
            let allocator = self.allocator.clone();
            DeferredRenderer::new(&mut self.ctx(), &allocator, settings, 800, 600).expect("deferred renderer")
        }
    }

    fn populated_scene(opaque: usize, transparent: usize) -> Scene {
        let mut scene = Scene::new("deferred");
        for i in 0..opaque + transparent {
            let mut entity = Entity::new(format!("mesh{i}"), Transform::from_position(Vec3::new(i as f32 * 0.1, 0.0, 0.0)))
                .with_mesh(MeshComponent::new(MeshHandle(1)))
                .with_bounding_radius(0.05);
            if i >= opaque {
                entity = entity.transparent();
            }
            scene.create_entity(entity);
        }
        scene.on_init_scene();
        scene
    }

    fn fill_list(list: &mut RenderList, scene: &mut Scene) {
        let camera = scene.camera().expect("camera");
        let frustum = crate::spatial::Frustum::from_matrix(&camera.view_projection_matrix());
        list.update_camera_world_pos(camera.position(), scene.entities());
        scene.insert_to_render_list(list, &frustum);
    }

    #[test]
    fn test_geometry_pass_draws_opaque_then_transparent() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default().with_shadow_maps(512, 1));
        let mut scene = populated_scene(3, 2);
        let mut list = RenderList::allocate(&fixture.allocator, true).expect("list");
        fill_list(&mut list, &mut scene);

        let mut ctx = fixture.ctx();
        renderer.init_scene(&mut ctx, &mut scene, true).expect("init");
        let stats = renderer.render_scene(&mut ctx, &list, &mut scene).expect("frame");

        assert_eq!(stats.geometry_draws, 5);
        assert_eq!(stats.dropped, 0);

        let calls = fixture.backend.calls();
        let transparent = renderer.transparent_pipeline.handle();
        let binds: Vec<_> = calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::BindPipeline(pipeline) => Some(*pipeline),
                _ => None,
            })
            .collect();
        assert_eq!(binds.last(), Some(&transparent));
    }

    #[test]
    fn test_screen_pass_cycle_presents_once() {
        let mut fixture = Fixture::new();
        let settings = RendererSettings { command_buffer_count: 2, ..RendererSettings::default() };
        let mut renderer = fixture.renderer(&settings);
        let mut scene = populated_scene(1, 0);
        let list = RenderList::allocate(&fixture.allocator, true).expect("list");

        let mut ctx = fixture.ctx();
        renderer.init_scene(&mut ctx, &mut scene, true).expect("init");
        renderer.render_scene(&mut ctx, &list, &mut scene).expect("frame");
        for index in 0..renderer.command_buffer_count() {
            renderer.begin(&mut ctx, index).expect("begin");
            renderer.present(&mut ctx).expect("present");
            renderer.end(&mut ctx).expect("end");
        }
        renderer.present_to_screen(&mut ctx).expect("present to screen");

        let calls = fixture.backend.calls();
        assert_eq!(calls.iter().filter(|call| **call == BackendCall::Present).count(), 1);
        for index in 0..2 {
            let cmd = renderer.command_buffer(index).expect("command buffer");
            assert!(calls.contains(&BackendCall::Execute(cmd)));
        }
    }

    #[test]
    fn test_present_outside_begin_is_rejected() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default());

        assert!(matches!(
            renderer.present(&mut fixture.ctx()),
            Err(RenderError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_geometry_overflow_is_dropped() {
        let mut fixture = Fixture::new();
        let settings = RendererSettings { max_scene_objects: 2, ..RendererSettings::default() };
        let mut renderer = fixture.renderer(&settings);
        let mut scene = populated_scene(4, 0);
        let mut list = RenderList::allocate(&fixture.allocator, true).expect("list");
        fill_list(&mut list, &mut scene);

        let mut ctx = fixture.ctx();
        renderer.init_scene(&mut ctx, &mut scene, true).expect("init");
        let stats = renderer.render_scene(&mut ctx, &list, &mut scene).expect("frame");

        assert_eq!(stats.geometry_draws, 2);
        assert_eq!(stats.dropped, 2);
    }

    #[test]
    fn test_resize_rebuilds_targets_lazily() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default());
        let mut scene = populated_scene(1, 0);
        let list = RenderList::allocate(&fixture.allocator, true).expect("list");

        renderer.init_scene(&mut fixture.ctx(), &mut scene, true).expect("init");
        let before = renderer.gbuffer_framebuffer().expect("targets");

        renderer.on_resize(&mut fixture.backend, 1024, 768);
        assert!(renderer.gbuffer_framebuffer().is_none());

        renderer.render_scene(&mut fixture.ctx(), &list, &mut scene).expect("frame");
        let after = renderer.gbuffer_framebuffer().expect("recreated");
        assert_ne!(before, after);
        assert_eq!((renderer.width(), renderer.height()), (1024, 768));
    }

    #[test]
    fn test_zero_sized_surface_skips_geometry() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default());
        let mut scene = populated_scene(1, 0);
        let list = RenderList::allocate(&fixture.allocator, true).expect("list");

        renderer.on_resize(&mut fixture.backend, 0, 0);
        let stats = renderer.render_scene(&mut fixture.ctx(), &list, &mut scene).expect("frame");

        assert_eq!(stats.geometry_draws, 0);
        assert!(renderer.gbuffer_framebuffer().is_none());
    }
}

//! # Shadow Renderer
//!
//! Renders the opaque shadow casters of a scene into a cascaded depth-array
//! texture, one layer per cascade.
//!
//! ## Frame flow
//!
//! ```text
//! sort_render_lists → begin → set_system_uniforms → per cascade { queue casters → present } → end
//! ```
//!
//! Each cascade owns a [`RenderList`] that is culled against the cascade's
//! light frustum and sorted by distance from the light-facing side of the
//! cascade box. All cascades record into one command buffer that only runs in
//! [`ShadowRenderer::end`], so nothing a cascade reads may be overwritten by a
//! later one. The light view-projections of every cascade are uploaded once,
//! indexed by the layer push constant. Per-object model matrices live in a
//! bounded dynamic uniform buffer with one region of `max_shadow_objects`
//! slots per cascade, uploaded once before submission; commands past a
//! region's capacity are dropped with one warning per cascade and never
//! written.
//!
//! ## Resizing
//!
//! Changing the map size or cascade count only invalidates the framebuffers.
//! They are recreated on the next [`ShadowRenderer::create_framebuffers`],
//! which [`ShadowRenderer::begin`] calls.

use std::sync::Arc;

use crate::core::config::RendererSettings;
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::resources::{
    AttachmentInfo, CullMode, Framebuffer, FramebufferDesc, Pipeline, PipelineDesc, PipelineFlags,
    RenderPass, RenderPassDesc, TextureDesc,
};
use crate::render::uniform::{DynamicUniformScratch, MAT4_SIZE};
use crate::render::{
    CommandBufferHandle, CommandQueue, GpuResource, MeshHandle, RenderBackend, RenderCommand,
    RenderContext, RenderError, RenderList, RenderListAllocator, RenderResult, ShaderHandle,
    TextureHandle, UniformBufferHandle,
};
use crate::scene::{EntityArena, Scene};
use super::cascade::{split_fractions, CascadeFrustum, CascadeSetup, CascadeSplitScheme, MAX_SHADOW_MAPS};

const SHADOW_DEPTH_BIAS_CONSTANT: f32 = 1.25;
const SHADOW_DEPTH_BIAS_SLOPE: f32 = 1.75;

/// One cascade: its render list and the frustum computed this frame
#[derive(Debug)]
pub struct ShadowCascade {
    list: RenderList,
    frustum: Option<CascadeFrustum>,
}

impl ShadowCascade {
    /// Casters visible in this cascade
    pub fn list(&self) -> &RenderList {
        &self.list
    }

    /// Light frustum of the last sort, if any
    pub fn frustum(&self) -> Option<&CascadeFrustum> {
        self.frustum.as_ref()
    }
}

/// Counters of one shadow pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowStats {
    /// Cascades rendered
    pub cascades: usize,
    /// Draws submitted across all cascades
    pub draws: usize,
    /// Commands dropped because the dynamic uniform buffer was full
    pub dropped: usize,
}

/// Cascaded shadow map renderer
#[derive(Debug)]
pub struct ShadowRenderer {
    cascades: Vec<ShadowCascade>,
    shadow_map_size: u32,
    split_scheme: CascadeSplitScheme,
    scene_bounding_radius: f32,
    max_list_changes: usize,
    max_shadow_objects: usize,

    shader: ShaderHandle,
    render_pass: Arc<RenderPass>,
    pipeline: Arc<Pipeline>,
    texture: Option<TextureHandle>,
    framebuffers: Vec<Arc<Framebuffer>>,
    framebuffers_invalidated: bool,
    framebuffer_generation: u32,

    command_buffer: CommandBufferHandle,
    system_uniforms: UniformBufferHandle,
    dynamic_uniforms: UniformBufferHandle,
    scratch: DynamicUniformScratch,
    queue: CommandQueue,
    recording: bool,
}

impl ShadowRenderer {
    /// Create the renderer and allocate one render list per cascade
    ///
    /// When the allocator runs out of lists the cascade count is capped to
    /// what could be allocated. Backend creation failures are returned.
    pub fn new(ctx: &mut RenderContext<'_>, allocator: &RenderListAllocator, settings: &RendererSettings) -> RenderResult<Self> {
        let requested = if settings.shadow_map_count > MAX_SHADOW_MAPS {
            log::error!(
                "[ShadowRenderer] - {} cascades requested, capping to {}",
                settings.shadow_map_count,
                MAX_SHADOW_MAPS
            );
            MAX_SHADOW_MAPS
        } else {
            settings.shadow_map_count.max(1)
        };

        let shader = ctx.backend.create_shader("shadow")?;
        let pass_desc = RenderPassDesc::new(vec![AttachmentInfo::depth_array()])
            .with_clear(true)
            .with_label("shadow");
        let render_pass = ctx.caches.render_passes.get(ctx.backend, &pass_desc, ctx.now)?;

        let pipeline_desc = PipelineDesc::new(shader, render_pass.handle())
            .with_cull_mode(CullMode::None)
            .with_flags(PipelineFlags::DEPTH_TEST | PipelineFlags::DEPTH_BIAS)
            .with_depth_bias(SHADOW_DEPTH_BIAS_CONSTANT, SHADOW_DEPTH_BIAS_SLOPE);
        let pipeline = ctx.caches.pipelines.get(ctx.backend, &pipeline_desc, ctx.now)?;

        let scratch = DynamicUniformScratch::new(
            settings.max_shadow_objects * requested as usize,
            ctx.backend.min_uniform_buffer_offset_alignment(),
        );
        let command_buffer = ctx.backend.create_command_buffer()?;
        let system_uniforms = ctx.backend.create_uniform_buffer(MAX_SHADOW_MAPS as usize * MAT4_SIZE)?;
        let dynamic_uniforms = ctx.backend.create_uniform_buffer(scratch.size_bytes())?;

        let mut renderer = Self {
            cascades: Vec::with_capacity(MAX_SHADOW_MAPS as usize),
            shadow_map_size: settings.shadow_map_size.max(1),
            split_scheme: settings.cascade_split,
            scene_bounding_radius: settings.scene_bounding_radius,
            max_list_changes: settings.max_list_changes_per_frame,
            max_shadow_objects: settings.max_shadow_objects,
            shader,
            render_pass,
            pipeline,
            texture: None,
            framebuffers: Vec::new(),
            framebuffers_invalidated: true,
            framebuffer_generation: 0,
            command_buffer,
            system_uniforms,
            dynamic_uniforms,
            queue: CommandQueue::new(settings.max_shadow_objects),
            scratch,
            recording: false,
        };
        renderer.grow_cascades(requested, allocator);

        log::info!(
            "[ShadowRenderer] - Created with {} cascades of {}x{}",
            renderer.cascades.len(),
            renderer.shadow_map_size,
            renderer.shadow_map_size
        );

        Ok(renderer)
    }

    fn grow_cascades(&mut self, count: u32, allocator: &RenderListAllocator) {
        while self.cascades.len() < count as usize {
            match RenderList::allocate(allocator, false) {
                Ok(list) => self.cascades.push(ShadowCascade {
                    list: list.with_max_changes_per_frame(self.max_list_changes),
                    frustum: None,
                }),
                Err(_) => {
                    log::error!(
                        "[ShadowRenderer] - Only {} of {} cascades could get a render list",
                        self.cascades.len(),
                        count
                    );
                    break;
                }
            }
        }
    }

    /// Change the number of cascades
    ///
    /// Dropped cascades release their entities (pass the scene's entities so
    /// their cull bits are cleared) before their list bits go back to the
    /// allocator. Returns the number of active cascades.
    pub fn set_shadow_map_num(
        &mut self,
        num: u32,
        allocator: &RenderListAllocator,
        mut entities: Option<&mut EntityArena>,
    ) -> u32 {
        let target = if num > MAX_SHADOW_MAPS {
            log::error!("[ShadowRenderer] - {} cascades requested, capping to {}", num, MAX_SHADOW_MAPS);
            MAX_SHADOW_MAPS
        } else {
            num.max(1)
        };
        let before = self.cascades.len();

        while self.cascades.len() > target as usize {
            if let Some(mut cascade) = self.cascades.pop() {
                match entities.as_deref_mut() {
                    Some(entities) => cascade.list.remove_all_objects(entities),
                    None => cascade.list.clear(),
                }
            }
        }
        self.grow_cascades(target, allocator);

        if self.cascades.len() != before {
            self.framebuffers_invalidated = true;
            log::info!("[ShadowRenderer] - Cascade count {} -> {}", before, self.cascades.len());
        }

        self.shadow_map_num()
    }

    /// Change the resolution of every cascade
    pub fn set_shadow_map_size(&mut self, size: u32) {
        if size == 0 || size == self.shadow_map_size {
            return;
        }
        log::info!("[ShadowRenderer] - Shadow map size {} -> {}", self.shadow_map_size, size);
        self.shadow_map_size = size;
        self.framebuffers_invalidated = true;
    }

    /// Empty every cascade list
    pub fn clear_render_lists(&mut self, mut entities: Option<&mut EntityArena>) {
        for cascade in &mut self.cascades {
            match entities.as_deref_mut() {
                Some(entities) => cascade.list.remove_all_objects(entities),
                None => cascade.list.clear(),
            }
            cascade.frustum = None;
        }
    }

    /// Force the framebuffers to be recreated on the next frame
    pub fn invalidate_framebuffers(&mut self) {
        self.framebuffers_invalidated = true;
    }

    /// Recreate the depth-array texture and its per-layer framebuffers if invalidated
    ///
    /// Returns `true` when a recreation happened.
    pub fn create_framebuffers(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<bool> {
        if !self.framebuffers_invalidated {
            return Ok(false);
        }

        self.resize_dynamic_uniforms(ctx)?;

        self.framebuffers.clear();
        if let Some(texture) = self.texture.take() {
            ctx.backend.destroy(GpuResource::Texture(texture));
        }

        let layers = self.shadow_map_num();
        let texture = ctx
            .backend
            .create_texture(&TextureDesc::depth_array(self.shadow_map_size, layers))?;
        self.texture = Some(texture);

        for layer in 0..layers {
            let desc = FramebufferDesc::new(
                self.render_pass.handle(),
                vec![texture],
                self.shadow_map_size,
                self.shadow_map_size,
            )
            .with_layer(layer);
            self.framebuffers.push(ctx.caches.framebuffers.get(ctx.backend, &desc, ctx.now)?);
        }

        self.framebuffers_invalidated = false;
        self.framebuffer_generation += 1;
        log::debug!(
            "[ShadowRenderer] - Created {} framebuffers of {}x{}",
            layers,
            self.shadow_map_size,
            self.shadow_map_size
        );

        Ok(true)
    }

    /// Give every active cascade its own region of the dynamic uniform buffer
    fn resize_dynamic_uniforms(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let needed = self.max_shadow_objects * self.cascades.len().max(1);
        if self.scratch.capacity() == needed {
            return Ok(());
        }

        let scratch = DynamicUniformScratch::new(needed, ctx.backend.min_uniform_buffer_offset_alignment());
        let buffer = ctx.backend.create_uniform_buffer(scratch.size_bytes())?;
        ctx.backend.destroy(GpuResource::UniformBuffer(self.dynamic_uniforms));
        self.dynamic_uniforms = buffer;
        self.scratch = scratch;
        Ok(())
    }

    /// Recompute every cascade frustum and refresh the cascade lists
    ///
    /// Does nothing when the scene has no camera or the camera matrices are
    /// degenerate.
    pub fn sort_render_lists(&mut self, scene: &mut Scene) {
        let Some(camera) = scene.camera() else {
            return;
        };
        let radius = scene.world_radius().unwrap_or(self.scene_bounding_radius);
        let light_direction = scene.light_setup().directional_light_direction();

        let Some(setup) = CascadeSetup::new(camera, &light_direction, radius) else {
            log::trace!("[ShadowRenderer] - Degenerate camera, cascades left untouched");
            return;
        };
        let (near, far) = (camera.near(), camera.far());
        let fractions = split_fractions(self.shadow_map_num(), self.split_scheme, near, far);

        for (cascade, bounds) in self.cascades.iter_mut().zip(fractions.windows(2)) {
            let frustum = setup.compute(bounds[0], bounds[1]);

            let entities = scene.entities_mut();
            cascade.list.update_camera_world_pos(frustum.focus_point, entities);
            cascade.list.remove_excess_objects(&frustum.frustum, entities);
            cascade.list.sort_lists();
            scene.insert_to_render_list(&mut cascade.list, &frustum.frustum);

            cascade.frustum = Some(frustum);
        }
    }

    /// Start recording the shadow pass
    pub fn begin(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        self.create_framebuffers(ctx)?;
        ctx.backend.begin_recording(self.command_buffer)?;
        self.scratch.reset();
        self.recording = true;
        Ok(())
    }

    /// Queue a draw for the current cascade; `false` when it was dropped
    pub fn submit(&mut self, command: RenderCommand) -> bool {
        self.queue.push(command)
    }

    /// Queue a mesh with its world matrix
    pub fn submit_mesh(&mut self, mesh: MeshHandle, transform: &Mat4) -> bool {
        self.submit(RenderCommand::new(mesh, *transform, Mat4::identity()))
    }

    /// Upload the light view-projection of every cascade, indexed by layer
    ///
    /// Cascades without a frustum get a zero matrix.
    pub fn set_system_uniforms(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let mut matrices = [[0.0_f32; 16]; MAX_SHADOW_MAPS as usize];
        for (slot, cascade) in matrices.iter_mut().zip(&self.cascades) {
            if let Some(frustum) = cascade.frustum() {
                slot.copy_from_slice(frustum.light_view_projection.as_slice());
            }
        }
        ctx.backend
            .set_uniform_data(self.system_uniforms, bytemuck::cast_slice(matrices.as_slice()))
    }

    /// Record the queued commands into the layer of `cascade` and empty the queue
    ///
    /// Model matrices are staged in the cascade's own region of the dynamic
    /// buffer and uploaded by [`ShadowRenderer::end`]. Returns the number of
    /// draws recorded.
    pub fn present(&mut self, ctx: &mut RenderContext<'_>, cascade: usize) -> RenderResult<usize> {
        let framebuffer = self
            .framebuffers
            .get(cascade)
            .ok_or_else(|| RenderError::InvalidReference(format!("shadow framebuffer {cascade} missing")))?;

        let backend: &mut dyn RenderBackend = &mut *ctx.backend;
        backend.begin_render_pass(
            self.command_buffer,
            self.render_pass.handle(),
            framebuffer.handle(),
            Vec4::new(1.0, 1.0, 1.0, 1.0),
            framebuffer.width(),
            framebuffer.height(),
        )?;
        backend.bind_pipeline(self.command_buffer, self.pipeline.handle())?;

        let layer = framebuffer.layer();
        backend.set_push_constant(self.command_buffer, self.pipeline.handle(), bytemuck::bytes_of(&layer))?;

        let base = cascade * self.max_shadow_objects;
        let mut draws = Vec::with_capacity(self.queue.len());
        for (index, command) in self.queue.commands().iter().take(self.max_shadow_objects).enumerate() {
            match self.scratch.write_matrix(base + index, &command.transform) {
                Ok(offset) => draws.push((command.mesh, offset)),
                Err(_) => break,
            }
        }

        for &(mesh, offset) in &draws {
            backend.render_mesh(self.command_buffer, self.pipeline.handle(), mesh, Some(offset))?;
        }

        backend.end_render_pass(self.command_buffer)?;
        self.queue.clear();

        Ok(draws.len())
    }

    /// Upload the staged model matrices, then finish and submit the shadow pass
    pub fn end(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        if !self.recording {
            return Ok(());
        }
        self.recording = false;
        if !self.scratch.used_bytes().is_empty() {
            ctx.backend.set_dynamic_uniform_data(self.dynamic_uniforms, self.scratch.used_bytes())?;
        }
        ctx.backend.end_recording(self.command_buffer)?;
        ctx.backend.execute(self.command_buffer)
    }

    /// Full shadow pass for `scene`
    pub fn render_scene(&mut self, ctx: &mut RenderContext<'_>, scene: &mut Scene) -> RenderResult<ShadowStats> {
        let mut stats = ShadowStats::default();
        if self.cascades.is_empty() || !scene.light_setup().directional_light().cast_shadows {
            return Ok(stats);
        }

        self.sort_render_lists(scene);
        self.begin(ctx)?;
        self.set_system_uniforms(ctx)?;

        for index in 0..self.cascades.len() {
            if self.cascades[index].frustum.is_none() {
                continue;
            }

            self.queue.clear();
            let queue = &mut self.queue;
            self.cascades[index].list.render_opaque_objects(scene.entities(), |_, entity| {
                if let Some(mesh) = entity.mesh.as_ref().filter(|mesh| mesh.casts_shadows) {
                    queue.push(RenderCommand::new(mesh.mesh, *entity.world_matrix(), mesh.texture_matrix));
                }
            });

            let dropped = self.queue.dropped();
            if dropped > 0 {
                log::warn!(
                    "[ShadowRenderer] - Cascade {} dropped {} casters over the limit of {}",
                    index,
                    dropped,
                    self.queue.capacity()
                );
                stats.dropped += dropped;
            }

            stats.draws += self.present(ctx, index)?;
            stats.cascades += 1;
        }

        self.end(ctx)?;
        Ok(stats)
    }

    /// Release the backend objects owned by this renderer
    ///
    /// Cached passes, pipelines and framebuffers are only dropped; the caches
    /// evict them.
    pub fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        self.framebuffers.clear();
        if let Some(texture) = self.texture.take() {
            backend.destroy(GpuResource::Texture(texture));
        }
        backend.destroy(GpuResource::UniformBuffer(self.dynamic_uniforms));
        backend.destroy(GpuResource::UniformBuffer(self.system_uniforms));
        backend.destroy(GpuResource::CommandBuffer(self.command_buffer));
        backend.destroy(GpuResource::Shader(self.shader));
    }

    /// Active cascades
    pub fn cascades(&self) -> &[ShadowCascade] {
        &self.cascades
    }

    /// Number of active cascades
    pub fn shadow_map_num(&self) -> u32 {
        u32::try_from(self.cascades.len()).unwrap_or(MAX_SHADOW_MAPS)
    }

    /// Resolution of each cascade layer
    pub fn shadow_map_size(&self) -> u32 {
        self.shadow_map_size
    }

    /// View-space distance to the far end of each cascade
    pub fn split_depths(&self) -> Vec<f32> {
        self.cascades
            .iter()
            .filter_map(|cascade| cascade.frustum.as_ref().map(|frustum| frustum.split_depth))
            .collect()
    }

    /// Light view-projection of each cascade
    pub fn shadow_proj_view(&self) -> Vec<Mat4> {
        self.cascades
            .iter()
            .filter_map(|cascade| cascade.frustum.as_ref().map(|frustum| frustum.light_view_projection))
            .collect()
    }

    /// Light view of the first cascade
    pub fn light_view(&self) -> Option<Mat4> {
        self.cascades.first()?.frustum.as_ref().map(|frustum| frustum.light_view)
    }

    /// World position the first cascade sorts from
    pub fn light_focus(&self) -> Option<Vec3> {
        self.cascades.first()?.frustum.as_ref().map(|frustum| frustum.focus_point)
    }

    /// Depth-array texture, once created
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Number of times the framebuffers were (re)created
    pub fn framebuffer_generation(&self) -> u32 {
        self.framebuffer_generation
    }

    /// Whether the framebuffers will be recreated on the next frame
    pub fn framebuffers_invalidated(&self) -> bool {
        self.framebuffers_invalidated
    }

    /// Command buffer the shadow pass records into
    pub fn command_buffer(&self) -> CommandBufferHandle {
        self.command_buffer
    }

    /// Per-cascade object capacity
    pub fn max_shadow_objects(&self) -> usize {
        self.max_shadow_objects
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

        fn renderer(&mut self, settings: &RendererSettings) -> ShadowRenderer {
            let allocator = self.allocator.clone();
            ShadowRenderer::new(&mut self.ctx(), &allocator, settings).expect("shadow renderer")
        }
    }

    fn cube_scene(count: usize) -> Scene {
        let mut scene = Scene::new("shadows");
        for i in 0..count {
            let position = Vec3::new((i % 10) as f32 * 0.3 - 1.5, 0.0, -((i / 10) as f32) * 0.3);
            scene.create_entity(
                Entity::new(format!("cube{i}"), Transform::from_position(position))
                    .with_mesh(MeshComponent::new(MeshHandle(1)))
                    .with_bounding_radius(0.1),
            );
        }
        scene.on_init_scene();
        scene
    }

    fn mesh_draws(calls: &[BackendCall]) -> Vec<Option<u32>> {
        calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::RenderMesh { dynamic_offset, .. } => Some(*dynamic_offset),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_new_allocates_one_list_per_cascade() {
        let mut fixture = Fixture::new();
        let renderer = fixture.renderer(&RendererSettings::default().with_shadow_maps(1024, 3));

        assert_eq!(renderer.shadow_map_num(), 3);
        assert_eq!(fixture.allocator.allocated_count(), 3);
    }

    #[test]
    fn test_cascade_count_capped_by_allocator() {
        let mut fixture = Fixture::new();
        let _held: Vec<RenderList> = (0..29)
            .map(|_| RenderList::allocate(&fixture.allocator, false).expect("slot"))
            .collect();

        let renderer = fixture.renderer(&RendererSettings::default().with_shadow_maps(512, 4));
        assert_eq!(renderer.shadow_map_num(), 2);
    }

    #[test]
    fn test_render_scene_draws_casters_into_every_layer() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default().with_shadow_maps(512, 2));
        let mut scene = cube_scene(4);

        let stats = renderer.render_scene(&mut fixture.ctx(), &mut scene).expect("shadow pass");

        assert_eq!(stats.cascades, 2);
        assert!(stats.draws >= 4);
        assert_eq!(stats.dropped, 0);
        assert_eq!(renderer.split_depths().len(), 2);
        assert!(renderer.texture().is_some());

        let calls = fixture.backend.calls();
        let passes = calls.iter().filter(|call| matches!(call, BackendCall::BeginRenderPass { .. })).count();
        let layers: Vec<&Vec<u8>> = calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::PushConstant(data) => Some(data),
                _ => None,
            })
            .collect();
        assert_eq!(passes, 2);
        assert_eq!(layers[1].as_slice(), bytemuck::bytes_of(&1u32));
        assert!(calls.contains(&BackendCall::Execute(renderer.command_buffer())));
    }

    #[test]
    fn test_overflow_is_dropped_not_written() {
        let mut fixture = Fixture::new();
        let settings = RendererSettings::default().with_shadow_maps(512, 1).with_max_shadow_objects(3);
        let mut renderer = fixture.renderer(&settings);
        let mut scene = cube_scene(10);

        let stats = renderer.render_scene(&mut fixture.ctx(), &mut scene).expect("shadow pass");

        assert_eq!(stats.draws, 3);
        assert_eq!(stats.dropped, 7);

        let stride = renderer.scratch.stride() as u32;
        assert_eq!(mesh_draws(fixture.backend.calls()), vec![Some(0), Some(stride), Some(2 * stride)]);
        let uploads: Vec<usize> = fixture
            .backend
            .calls()
            .iter()
            .filter_map(|call| match call {
                BackendCall::SetDynamicUniformData { len, .. } => Some(*len),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, vec![3 * stride as usize]);
    }

    #[test]
    fn test_resize_and_count_change_recreate_framebuffers_once() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default().with_shadow_maps(512, 2));

        assert!(renderer.create_framebuffers(&mut fixture.ctx()).expect("created"));
        assert_eq!(renderer.framebuffer_generation(), 1);

        let allocator = fixture.allocator.clone();
        renderer.set_shadow_map_size(1024);
        renderer.set_shadow_map_num(3, &allocator, None);
        assert!(renderer.framebuffers_invalidated());

        assert!(renderer.create_framebuffers(&mut fixture.ctx()).expect("recreated"));
        assert!(!renderer.create_framebuffers(&mut fixture.ctx()).expect("no-op"));
        assert_eq!(renderer.framebuffer_generation(), 2);
        assert_eq!(renderer.framebuffers.len(), 3);
        assert_eq!(renderer.framebuffers[2].layer(), 2);
        assert_eq!(renderer.scratch.capacity(), 3 * renderer.max_shadow_objects());
    }

    #[test]
    fn test_cascades_keep_their_own_uniform_data_until_execute() {
        let mut fixture = Fixture::new();
        let settings = RendererSettings::default().with_shadow_maps(512, 3).with_max_shadow_objects(8);
        let mut renderer = fixture.renderer(&settings);
        let mut scene = cube_scene(4);

        renderer.render_scene(&mut fixture.ctx(), &mut scene).expect("shadow pass");

        let calls = fixture.backend.calls();
        let command_buffer = renderer.command_buffer();
        let start = calls
            .iter()
            .position(|call| *call == BackendCall::BeginRecording(command_buffer))
            .expect("recording started");
        let submit = calls
            .iter()
            .position(|call| *call == BackendCall::Execute(command_buffer))
            .expect("pass submitted");
        let recorded = &calls[start..submit];

        let system_uploads: Vec<usize> = recorded
            .iter()
            .filter_map(|call| match call {
                BackendCall::SetUniformData { buffer, len } if *buffer == renderer.system_uniforms => Some(*len),
                _ => None,
            })
            .collect();
        let dynamic_uploads = recorded
            .iter()
            .filter(|call| matches!(call, BackendCall::SetDynamicUniformData { .. }))
            .count();
        assert_eq!(system_uploads, vec![MAX_SHADOW_MAPS as usize * MAT4_SIZE]);
        assert_eq!(dynamic_uploads, 1);

        let region = (8 * renderer.scratch.stride()) as u32;
        let mut cascade: Option<u32> = None;
        let mut offsets = Vec::new();
        for call in recorded {
            match call {
                BackendCall::BeginRenderPass { .. } => cascade = Some(cascade.map_or(0, |index| index + 1)),
                BackendCall::RenderMesh { dynamic_offset: Some(offset), .. } => {
                    let index = cascade.expect("draw inside a pass");
                    assert!((index * region..(index + 1) * region).contains(offset));
                    offsets.push(*offset);
                }
                _ => {}
            }
        }
        assert_eq!(cascade, Some(2));
        assert!(!offsets.is_empty());
        let total = offsets.len();
        offsets.sort_unstable();
        offsets.dedup();
        assert_eq!(offsets.len(), total);
    }

    #[test]
    fn test_same_size_does_not_invalidate() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default().with_shadow_maps(512, 2));
        renderer.create_framebuffers(&mut fixture.ctx()).expect("created");

        renderer.set_shadow_map_size(512);
        assert!(!renderer.framebuffers_invalidated());
    }

    #[test]
    fn test_shrinking_cascades_clears_their_bits() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default().with_shadow_maps(512, 4));
        let mut scene = cube_scene(6);
        renderer.render_scene(&mut fixture.ctx(), &mut scene).expect("shadow pass");

        let allocator = fixture.allocator.clone();
        let dropped_bits: u32 = renderer.cascades()[1..].iter().map(|cascade| cascade.list().bit_mask()).sum();
        renderer.set_shadow_map_num(1, &allocator, Some(scene.entities_mut()));

        assert_eq!(allocator.allocated_count(), 1);
        assert!(scene.entities().values().all(|entity| entity.cull_flags & dropped_bits == 0));
    }

    #[test]
    fn test_scene_without_camera_is_skipped() {
        let mut fixture = Fixture::new();
        let mut renderer = fixture.renderer(&RendererSettings::default());
        let mut scene = cube_scene(2);
        scene.set_camera(None);

        renderer.sort_render_lists(&mut scene);
        assert!(renderer.cascades().iter().all(|cascade| cascade.frustum().is_none()));
    }
}

//! Backend abstraction for the rendering core
//!
//! The renderers never talk to a graphics API directly. They create GPU
//! objects, record commands and upload uniform data through the
//! [`RenderBackend`] trait object injected into
//! [`GraphicsPipeline`](crate::render::GraphicsPipeline) at startup.
//!
//! All matrices handed to a backend follow the convention documented in
//! [`foundation::math`](crate::foundation::math); a backend with a different
//! native convention adapts at submission time.

use crate::foundation::math::Vec4;
use crate::render::resources::{FramebufferDesc, PipelineDesc, RenderPassDesc, TextureDesc};
use crate::render::RenderResult;

macro_rules! gpu_handles {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u64);
        )*
    };
}

gpu_handles! {
    /// Handle to a mesh resource stored in the backend
    MeshHandle,
    /// Handle to a compiled shader program
    ShaderHandle,
    /// Handle to a render pass
    RenderPassHandle,
    /// Handle to a framebuffer
    FramebufferHandle,
    /// Handle to a graphics pipeline
    PipelineHandle,
    /// Handle to a command buffer
    CommandBufferHandle,
    /// Handle to a uniform buffer
    UniformBufferHandle,
    /// Handle to a texture (possibly a layered array)
    TextureHandle,
}

/// Any GPU object that can be destroyed through [`RenderBackend::destroy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuResource {
    /// A mesh
    Mesh(MeshHandle),
    /// A shader
    Shader(ShaderHandle),
    /// A render pass
    RenderPass(RenderPassHandle),
    /// A framebuffer
    Framebuffer(FramebufferHandle),
    /// A pipeline
    Pipeline(PipelineHandle),
    /// A command buffer
    CommandBuffer(CommandBufferHandle),
    /// A uniform buffer
    UniformBuffer(UniformBufferHandle),
    /// A texture
    Texture(TextureHandle),
}

/// Abstract graphics backend
///
/// Creation failures are reported as
/// [`RenderError::BackendCreation`](crate::render::RenderError::BackendCreation);
/// the renderers treat them as fatal during initialization.
pub trait RenderBackend {
    /// Human readable backend name
    fn name(&self) -> &str;

    /// Required alignment, in bytes, of dynamic uniform buffer offsets
    fn min_uniform_buffer_offset_alignment(&self) -> usize;

    /// Create a mesh with `vertex_count` vertices
    fn create_mesh(&mut self, name: &str, vertex_count: u32) -> RenderResult<MeshHandle>;

    /// Load a shader program by name
    fn create_shader(&mut self, name: &str) -> RenderResult<ShaderHandle>;

    /// Create a render pass
    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> RenderResult<RenderPassHandle>;

    /// Create a framebuffer
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> RenderResult<FramebufferHandle>;

    /// Create a graphics pipeline
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> RenderResult<PipelineHandle>;

    /// Create a command buffer
    fn create_command_buffer(&mut self) -> RenderResult<CommandBufferHandle>;

    /// Create a uniform buffer of `size` bytes
    fn create_uniform_buffer(&mut self, size: usize) -> RenderResult<UniformBufferHandle>;

    /// Create a texture or texture array
    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureHandle>;

    /// Release a GPU object
    fn destroy(&mut self, resource: GpuResource);

    /// Start recording into a command buffer
    fn begin_recording(&mut self, cmd: CommandBufferHandle) -> RenderResult<()>;

    /// Finish recording a command buffer
    fn end_recording(&mut self, cmd: CommandBufferHandle) -> RenderResult<()>;

    /// Submit a recorded command buffer
    fn execute(&mut self, cmd: CommandBufferHandle) -> RenderResult<()>;

    /// Begin a render pass on `framebuffer`
    fn begin_render_pass(
        &mut self,
        cmd: CommandBufferHandle,
        pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        clear_color: Vec4,
        width: u32,
        height: u32,
    ) -> RenderResult<()>;

    /// End the current render pass
    fn end_render_pass(&mut self, cmd: CommandBufferHandle) -> RenderResult<()>;

    /// Bind a pipeline for subsequent draws
    fn bind_pipeline(&mut self, cmd: CommandBufferHandle, pipeline: PipelineHandle) -> RenderResult<()>;

    /// Push a small block of constants to the bound pipeline
    fn set_push_constant(&mut self, cmd: CommandBufferHandle, pipeline: PipelineHandle, data: &[u8]) -> RenderResult<()>;

    /// Replace the contents of a uniform buffer
    fn set_uniform_data(&mut self, buffer: UniformBufferHandle, data: &[u8]) -> RenderResult<()>;

    /// Replace the contents of a dynamic (per-object) uniform buffer
    fn set_dynamic_uniform_data(&mut self, buffer: UniformBufferHandle, data: &[u8]) -> RenderResult<()>;

    /// Draw a mesh, optionally bound at a dynamic uniform offset
    fn render_mesh(
        &mut self,
        cmd: CommandBufferHandle,
        pipeline: PipelineHandle,
        mesh: MeshHandle,
        dynamic_offset: Option<u32>,
    ) -> RenderResult<()>;

    /// Draw non-indexed vertices, as for full-screen passes
    fn draw(&mut self, cmd: CommandBufferHandle, pipeline: PipelineHandle, vertex_count: u32) -> RenderResult<()>;

    /// The presentation surface changed size
    fn on_resize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Present the swapchain image
    fn present(&mut self) -> RenderResult<()>;

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn std::any::Any;

    /// Downcast to the mutable concrete backend type
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

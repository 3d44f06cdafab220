//! Headless backend for testing and tooling
//!
//! This backend performs no GPU work. It hands out unique handles, tracks
//! which objects are alive and records every call so tests can assert on the
//! exact command stream the renderers produced.

use std::collections::HashSet;

use crate::foundation::math::Vec4;
use crate::render::resources::{FramebufferDesc, PipelineDesc, RenderPassDesc, TextureDesc};
use crate::render::{
    CommandBufferHandle, FramebufferHandle, GpuResource, MeshHandle, PipelineHandle, RenderBackend,
    RenderError, RenderPassHandle, RenderResult, ShaderHandle, TextureHandle, UniformBufferHandle,
};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// A GPU object was created
    Create(GpuResource),
    /// A GPU object was released
    Destroy(GpuResource),
    /// Command buffer recording started
    BeginRecording(CommandBufferHandle),
    /// Command buffer recording finished
    EndRecording(CommandBufferHandle),
    /// Command buffer submitted
    Execute(CommandBufferHandle),
    /// Render pass started
    BeginRenderPass {
        /// Render pass
        pass: RenderPassHandle,
        /// Target framebuffer
        framebuffer: FramebufferHandle,
        /// Render area width
        width: u32,
        /// Render area height
        height: u32,
    },
    /// Render pass ended
    EndRenderPass,
    /// Pipeline bound
    BindPipeline(PipelineHandle),
    /// Push constants written
    PushConstant(Vec<u8>),
    /// Uniform buffer written
    SetUniformData {
        /// Target buffer
        buffer: UniformBufferHandle,
        /// Bytes written
        len: usize,
    },
    /// Dynamic uniform buffer written
    SetDynamicUniformData {
        /// Target buffer
        buffer: UniformBufferHandle,
        /// Bytes written
        len: usize,
    },
    /// Mesh drawn
    RenderMesh {
        /// Pipeline used
        pipeline: PipelineHandle,
        /// Mesh drawn
        mesh: MeshHandle,
        /// Dynamic uniform offset, if any
        dynamic_offset: Option<u32>,
    },
    /// Non-indexed draw
    Draw {
        /// Pipeline used
        pipeline: PipelineHandle,
        /// Vertex count
        vertex_count: u32,
    },
    /// Surface resized
    Resize {
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
    /// Swapchain presented
    Present,
}

/// Backend that records calls instead of talking to a GPU
#[derive(Debug)]
pub struct HeadlessBackend {
    next_handle: u64,
    min_uniform_alignment: usize,
    live: HashSet<GpuResource>,
    calls: Vec<BackendCall>,
    record_calls: bool,
    fail_creation: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Create a backend with a 256 byte uniform offset alignment
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            min_uniform_alignment: 256,
            live: HashSet::new(),
            calls: Vec::new(),
            record_calls: true,
            fail_creation: false,
        }
    }

    /// Use a different dynamic uniform offset alignment
    pub fn with_uniform_alignment(mut self, alignment: usize) -> Self {
        self.min_uniform_alignment = alignment;
        self
    }

    /// Stop keeping a call log, for long-running use
    pub fn without_call_log(mut self) -> Self {
        self.record_calls = false;
        self
    }

    /// Make every subsequent creation fail
    pub fn set_fail_creation(&mut self, fail: bool) {
        self.fail_creation = fail;
    }

    /// Calls recorded so far
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Take the recorded calls, leaving the log empty
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of live objects matching `filter`
    pub fn live_count(&self, filter: impl Fn(&GpuResource) -> bool) -> usize {
        self.live.iter().filter(|resource| filter(resource)).count()
    }

    /// Whether `resource` has been created and not destroyed
    pub fn is_live(&self, resource: GpuResource) -> bool {
        self.live.contains(&resource)
    }

    fn record(&mut self, call: BackendCall) {
        if self.record_calls {
            self.calls.push(call);
        }
    }

    fn allocate<H>(&mut self, kind: &str, wrap: impl Fn(u64) -> H, resource: impl Fn(H) -> GpuResource) -> RenderResult<H>
    where
        H: Copy,
    {
        if self.fail_creation {
            return Err(RenderError::BackendCreation(format!("headless backend refused to create {kind}")));
        }

        let handle = wrap(self.next_handle);
        self.next_handle += 1;

        let created = resource(handle);
        self.live.insert(created);
        log::trace!("HeadlessBackend: created {:?}", created);
        self.record(BackendCall::Create(created));

        Ok(handle)
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "Headless"
    }

    fn min_uniform_buffer_offset_alignment(&self) -> usize {
        self.min_uniform_alignment
    }

    fn create_mesh(&mut self, _name: &str, _vertex_count: u32) -> RenderResult<MeshHandle> {
        self.allocate("mesh", MeshHandle, GpuResource::Mesh)
    }

    fn create_shader(&mut self, _name: &str) -> RenderResult<ShaderHandle> {
        self.allocate("shader", ShaderHandle, GpuResource::Shader)
    }

    fn create_render_pass(&mut self, _desc: &RenderPassDesc) -> RenderResult<RenderPassHandle> {
        self.allocate("render pass", RenderPassHandle, GpuResource::RenderPass)
    }

    fn create_framebuffer(&mut self, _desc: &FramebufferDesc) -> RenderResult<FramebufferHandle> {
        self.allocate("framebuffer", FramebufferHandle, GpuResource::Framebuffer)
    }

    fn create_pipeline(&mut self, _desc: &PipelineDesc) -> RenderResult<PipelineHandle> {
        self.allocate("pipeline", PipelineHandle, GpuResource::Pipeline)
    }

    fn create_command_buffer(&mut self) -> RenderResult<CommandBufferHandle> {
        self.allocate("command buffer", CommandBufferHandle, GpuResource::CommandBuffer)
    }

    fn create_uniform_buffer(&mut self, _size: usize) -> RenderResult<UniformBufferHandle> {
        self.allocate("uniform buffer", UniformBufferHandle, GpuResource::UniformBuffer)
    }

    fn create_texture(&mut self, _desc: &TextureDesc) -> RenderResult<TextureHandle> {
        self.allocate("texture", TextureHandle, GpuResource::Texture)
    }

    fn destroy(&mut self, resource: GpuResource) {
        if !self.live.remove(&resource) {
            log::warn!("HeadlessBackend: destroying unknown resource {:?}", resource);
        }
        self.record(BackendCall::Destroy(resource));
    }

    fn begin_recording(&mut self, cmd: CommandBufferHandle) -> RenderResult<()> {
        self.record(BackendCall::BeginRecording(cmd));
        Ok(())
    }

    fn end_recording(&mut self, cmd: CommandBufferHandle) -> RenderResult<()> {
        self.record(BackendCall::EndRecording(cmd));
        Ok(())
    }

    fn execute(&mut self, cmd: CommandBufferHandle) -> RenderResult<()> {
        self.record(BackendCall::Execute(cmd));
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _cmd: CommandBufferHandle,
        pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        _clear_color: Vec4,
        width: u32,
        height: u32,
    ) -> RenderResult<()> {
        self.record(BackendCall::BeginRenderPass { pass, framebuffer, width, height });
        Ok(())
    }

    fn end_render_pass(&mut self, _cmd: CommandBufferHandle) -> RenderResult<()> {
        self.record(BackendCall::EndRenderPass);
        Ok(())
    }

    fn bind_pipeline(&mut self, _cmd: CommandBufferHandle, pipeline: PipelineHandle) -> RenderResult<()> {
        self.record(BackendCall::BindPipeline(pipeline));
        Ok(())
    }

    fn set_push_constant(&mut self, _cmd: CommandBufferHandle, _pipeline: PipelineHandle, data: &[u8]) -> RenderResult<()> {
        self.record(BackendCall::PushConstant(data.to_vec()));
        Ok(())
    }

    fn set_uniform_data(&mut self, buffer: UniformBufferHandle, data: &[u8]) -> RenderResult<()> {
        self.record(BackendCall::SetUniformData { buffer, len: data.len() });
        Ok(())
    }

    fn set_dynamic_uniform_data(&mut self, buffer: UniformBufferHandle, data: &[u8]) -> RenderResult<()> {
        self.record(BackendCall::SetDynamicUniformData { buffer, len: data.len() });
        Ok(())
    }

    fn render_mesh(
        &mut self,
        _cmd: CommandBufferHandle,
        pipeline: PipelineHandle,
        mesh: MeshHandle,
        dynamic_offset: Option<u32>,
    ) -> RenderResult<()> {
        self.record(BackendCall::RenderMesh { pipeline, mesh, dynamic_offset });
        Ok(())
    }

    fn draw(&mut self, _cmd: CommandBufferHandle, pipeline: PipelineHandle, vertex_count: u32) -> RenderResult<()> {
        self.record(BackendCall::Draw { pipeline, vertex_count });
        Ok(())
    }

    fn on_resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.record(BackendCall::Resize { width, height });
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        self.record(BackendCall::Present);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique_and_tracked() {
        let mut backend = HeadlessBackend::new();
        let a = backend.create_command_buffer().expect("created");
        let b = backend.create_command_buffer().expect("created");
        assert_ne!(a, b);

        backend.destroy(GpuResource::CommandBuffer(a));
        assert!(!backend.is_live(GpuResource::CommandBuffer(a)));
        assert!(backend.is_live(GpuResource::CommandBuffer(b)));
    }

    #[test]
    fn test_failed_creation_reports_backend_error() {
        let mut backend = HeadlessBackend::new();
        backend.set_fail_creation(true);
        assert!(matches!(backend.create_shader("shadow"), Err(RenderError::BackendCreation(_))));
    }
}

//! Cached framebuffers

use crate::hash_combine;
use crate::render::{FramebufferHandle, GpuResource, RenderBackend, RenderPassHandle, RenderResult, TextureHandle};
use super::{CacheKey, CachedResource};

/// Description of a framebuffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferDesc {
    /// Render pass the framebuffer is compatible with
    pub render_pass: RenderPassHandle,
    /// Attached textures in binding order
    pub attachments: Vec<TextureHandle>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Array layer rendered into, or the swapchain image for screen framebuffers
    pub layer: u32,
    /// Targets the swapchain rather than offscreen textures
    pub screen: bool,
}

impl FramebufferDesc {
    /// Offscreen framebuffer over `attachments`
    pub fn new(render_pass: RenderPassHandle, attachments: Vec<TextureHandle>, width: u32, height: u32) -> Self {
        Self {
            render_pass,
            attachments,
            width,
            height,
            layer: 0,
            screen: false,
        }
    }

    /// Framebuffer presenting to the swapchain
    pub fn screen(render_pass: RenderPassHandle, width: u32, height: u32) -> Self {
        Self {
            screen: true,
            ..Self::new(render_pass, Vec::new(), width, height)
        }
    }

    /// Select the array layer
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }
}

impl CacheKey for FramebufferDesc {
    fn cache_hash(&self) -> u64 {
        hash_combine!(self.render_pass, self.attachments, self.width, self.height, self.layer, self.screen)
    }
}

/// A framebuffer owned by the cache
#[derive(Debug)]
pub struct Framebuffer {
    handle: FramebufferHandle,
    width: u32,
    height: u32,
    layer: u32,
}

impl Framebuffer {
    /// Backend handle
    pub fn handle(&self) -> FramebufferHandle {
        self.handle
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Array layer rendered into
    pub fn layer(&self) -> u32 {
        self.layer
    }
}

impl CachedResource for Framebuffer {
    type Desc = FramebufferDesc;
    const KIND: &'static str = "framebuffer";

    fn create(backend: &mut dyn RenderBackend, desc: &FramebufferDesc) -> RenderResult<Self> {
        Ok(Self {
            handle: backend.create_framebuffer(desc)?,
            width: desc.width,
            height: desc.height,
            layer: desc.layer,
        })
    }

    fn destroy(&self, backend: &mut dyn RenderBackend) {
        backend.destroy(GpuResource::Framebuffer(self.handle));
    }
}

//! Cached render passes

use crate::hash_combine;
use crate::render::{GpuResource, RenderBackend, RenderPassHandle, RenderResult};
use super::{CacheKey, CachedResource, TextureFormat, TextureKind};

/// One attachment of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentInfo {
    /// Attachment role
    pub kind: TextureKind,
    /// Pixel format
    pub format: TextureFormat,
}

impl AttachmentInfo {
    /// Color attachment
    pub fn color(format: TextureFormat) -> Self {
        Self { kind: TextureKind::Color, format }
    }

    /// Depth attachment
    pub fn depth() -> Self {
        Self { kind: TextureKind::Depth, format: TextureFormat::Depth32F }
    }

    /// One layer of a depth array
    pub fn depth_array() -> Self {
        Self { kind: TextureKind::DepthArray, format: TextureFormat::Depth32F }
    }

    /// The swapchain image
    pub fn swapchain() -> Self {
        Self { kind: TextureKind::Swapchain, format: TextureFormat::Rgba8 }
    }
}

/// Description of a render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPassDesc {
    /// Attachments in binding order
    pub attachments: Vec<AttachmentInfo>,
    /// Clear attachments on begin
    pub clear: bool,
    /// Debug label, not part of the identity
    pub label: Option<String>,
}

impl RenderPassDesc {
    /// Render pass over `attachments` that clears on begin
    pub fn new(attachments: Vec<AttachmentInfo>) -> Self {
        Self { attachments, clear: true, label: None }
    }

    /// Set whether attachments are cleared
    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    /// Attach a debug label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl CacheKey for RenderPassDesc {
    fn cache_hash(&self) -> u64 {
        hash_combine!(self.attachments, self.clear)
    }
}

/// A render pass owned by the cache
#[derive(Debug)]
pub struct RenderPass {
    handle: RenderPassHandle,
    attachment_count: usize,
}

impl RenderPass {
    /// Backend handle
    pub fn handle(&self) -> RenderPassHandle {
        self.handle
    }

    /// Number of attachments
    pub fn attachment_count(&self) -> usize {
        self.attachment_count
    }
}

impl CachedResource for RenderPass {
    type Desc = RenderPassDesc;
    const KIND: &'static str = "render pass";

    fn create(backend: &mut dyn RenderBackend, desc: &RenderPassDesc) -> RenderResult<Self> {
        Ok(Self {
            handle: backend.create_render_pass(desc)?,
            attachment_count: desc.attachments.len(),
        })
    }

    fn destroy(&self, backend: &mut dyn RenderBackend) {
        backend.destroy(GpuResource::RenderPass(self.handle));
    }
}

//! GPU resource descriptions and the caches that share them
//!
//! Renderers describe the render passes, framebuffers and pipelines they need
//! and fetch them from [`ResourceCaches`]; identical descriptions resolve to
//! the same backend object.

mod cache;
mod framebuffer;
mod hash;
mod pipeline;
mod render_pass;
mod texture;

pub use cache::{CacheKey, CachedResource, ResourceCache, ResourceCaches, DEFAULT_CACHE_LIFETIME};
pub use framebuffer::{Framebuffer, FramebufferDesc};
pub use hash::combine_hash;
pub use pipeline::{CullMode, Pipeline, PipelineDesc, PipelineFlags};
pub use render_pass::{AttachmentInfo, RenderPass, RenderPassDesc};
pub use texture::{TextureDesc, TextureFormat, TextureKind};

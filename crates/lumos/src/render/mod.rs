//! # Rendering Core
//!
//! Deferred rendering with cascaded shadow maps over an abstract backend.
//!
//! ## Architecture
//!
//! - **GraphicsPipeline**: per-frame orchestration, owns backend and caches
//! - **DeferredRenderer**: geometry pass into the G-buffer, lighting pass to screen
//! - **ShadowRenderer**: one culled render list and one depth layer per cascade
//! - **RenderList**: bitmask-tagged visible set with bounded per-frame churn
//! - **Resources**: hash-keyed caches of render passes, framebuffers and pipelines
//! - **Backends**: the [`RenderBackend`] trait and a headless recorder
//!
//! ## Frame Flow
//!
//! ```text
//! GraphicsPipeline::render_scene
//!   ├─ main RenderList: re-centre, cull, sort, insert
//!   └─ DeferredRenderer::render_scene
//!        ├─ ShadowRenderer::render_scene (per cascade: cull, sort, insert, draw)
//!        ├─ geometry pass (opaque, then transparent)
//!        └─ lighting pass per command buffer, then present
//! ```

mod backend;
pub mod backends;
mod context;
mod deferred_renderer;
mod error;
mod graphics_pipeline;
mod render_command;
mod render_list;
pub mod resources;
pub mod shadow;
pub mod uniform;

#[cfg(test)]
mod pipeline_tests;

pub use backend::{
    CommandBufferHandle, FramebufferHandle, GpuResource, MeshHandle, PipelineHandle, RenderBackend,
    RenderPassHandle, ShaderHandle, TextureHandle, UniformBufferHandle,
};
pub use context::RenderContext;
pub use deferred_renderer::{DeferredRenderer, DeferredStats};
pub use error::{RenderError, RenderResult};
pub use graphics_pipeline::{FrameStats, GraphicsPipeline, OverlayRenderer};
pub use render_command::{CommandQueue, RenderCommand};
pub use render_list::{
    RenderList, RenderListAllocator, RenderListEntry, DEFAULT_MAX_CHANGES_PER_FRAME, MAX_RENDER_LISTS,
};
pub use shadow::{ShadowRenderer, ShadowStats};

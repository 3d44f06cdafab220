//! Per-call access to the backend and the shared resource caches

use std::time::Instant;

use crate::render::resources::ResourceCaches;
use crate::render::RenderBackend;

/// Borrowed GPU state handed to the renderers for one call
///
/// [`GraphicsPipeline`](crate::render::GraphicsPipeline) owns the backend and
/// the caches; the renderers it drives only borrow them for the duration of a
/// call. `now` stamps cache accesses so idle objects can be evicted later.
pub struct RenderContext<'a> {
    /// Backend used for creation and recording
    pub backend: &'a mut dyn RenderBackend,
    /// Render pass, framebuffer and pipeline caches
    pub caches: &'a mut ResourceCaches,
    /// Time of the current frame
    pub now: Instant,
}

impl<'a> RenderContext<'a> {
    /// Bundle a backend and caches at time `now`
    pub fn new(backend: &'a mut dyn RenderBackend, caches: &'a mut ResourceCaches, now: Instant) -> Self {
        Self { backend, caches, now }
    }
}

//! # Resource Caches
//!
//! Render passes, framebuffers and pipelines are requested by description and
//! shared through a content-hash keyed cache. Two requests with field-for-field
//! identical descriptions get the same object; the backend creates it once.
//!
//! ## Eviction
//!
//! A cached object is released by [`ResourceCache::delete_unused`] only when
//! the cache holds the last reference to it *and* it has not been requested for
//! longer than the cache lifetime. Anything still held by a renderer survives
//! regardless of idle time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::render::{RenderBackend, RenderResult};
use super::{Framebuffer, Pipeline, RenderPass};

/// Default idle time before an unreferenced object is released
pub const DEFAULT_CACHE_LIFETIME: Duration = Duration::from_secs(1);

/// A description that identifies a GPU object by content
pub trait CacheKey {
    /// Hash of every field that affects the identity of the created object
    fn cache_hash(&self) -> u64;
}

/// A GPU object that can live in a [`ResourceCache`]
pub trait CachedResource: Sized {
    /// Description the object is created from
    type Desc: CacheKey;

    /// Name used in log messages
    const KIND: &'static str;

    /// Create the object through the backend
    fn create(backend: &mut dyn RenderBackend, desc: &Self::Desc) -> RenderResult<Self>;

    /// Release the backend object
    fn destroy(&self, backend: &mut dyn RenderBackend);
}

#[derive(Debug)]
struct CacheEntry<R> {
    resource: Arc<R>,
    last_access: Instant,
}

/// Content-hash keyed cache of one kind of GPU object
#[derive(Debug)]
pub struct ResourceCache<R: CachedResource> {
    entries: HashMap<u64, CacheEntry<R>>,
    lifetime: Duration,
    created: usize,
    evicted: usize,
}

impl<R: CachedResource> ResourceCache<R> {
    /// Create an empty cache
    pub fn new(lifetime: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lifetime,
            created: 0,
            evicted: 0,
        }
    }

    /// Fetch the object for `desc`, creating it on first request
    pub fn get(&mut self, backend: &mut dyn RenderBackend, desc: &R::Desc, now: Instant) -> RenderResult<Arc<R>> {
        let hash = desc.cache_hash();

        if let Some(entry) = self.entries.get_mut(&hash) {
            entry.last_access = now;
            return Ok(Arc::clone(&entry.resource));
        }

        let resource = Arc::new(R::create(backend, desc)?);
        self.created += 1;
        log::debug!("[ResourceCache] - Created {} {:#018x}", R::KIND, hash);

        self.entries.insert(hash, CacheEntry {
            resource: Arc::clone(&resource),
            last_access: now,
        });

        Ok(resource)
    }

    /// Release every object nobody else holds that has been idle too long
    ///
    /// Returns the number of evicted objects.
    pub fn delete_unused(&mut self, backend: &mut dyn RenderBackend, now: Instant) -> usize {
        let lifetime = self.lifetime;
        let before = self.entries.len();

        self.entries.retain(|hash, entry| {
            let idle = now.saturating_duration_since(entry.last_access);
            if Arc::strong_count(&entry.resource) == 1 && idle > lifetime {
                log::debug!("[ResourceCache] - Evicting {} {:#018x}", R::KIND, hash);
                entry.resource.destroy(backend);
                false
            } else {
                true
            }
        });

        let evicted = before - self.entries.len();
        self.evicted += evicted;
        evicted
    }

    /// Release every object
    ///
    /// Objects still held elsewhere are destroyed too, so callers drop their
    /// references first.
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        for (_, entry) in self.entries.drain() {
            if Arc::strong_count(&entry.resource) > 1 {
                log::warn!("[ResourceCache] - Clearing {} that is still referenced", R::KIND);
            }
            entry.resource.destroy(backend);
        }
    }

    /// Number of cached objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an object for `desc` is cached
    pub fn contains(&self, desc: &R::Desc) -> bool {
        self.entries.contains_key(&desc.cache_hash())
    }

    /// Objects created over the cache's lifetime
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Objects evicted over the cache's lifetime
    pub fn evicted_count(&self) -> usize {
        self.evicted
    }

    /// Idle time before eviction
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

/// The three caches used by the renderers
#[derive(Debug)]
pub struct ResourceCaches {
    /// Render pass cache
    pub render_passes: ResourceCache<RenderPass>,
    /// Framebuffer cache
    pub framebuffers: ResourceCache<Framebuffer>,
    /// Pipeline cache
    pub pipelines: ResourceCache<Pipeline>,
}

impl ResourceCaches {
    /// Create empty caches sharing one lifetime
    pub fn new(lifetime: Duration) -> Self {
        Self {
            render_passes: ResourceCache::new(lifetime),
            framebuffers: ResourceCache::new(lifetime),
            pipelines: ResourceCache::new(lifetime),
        }
    }

    /// Sweep all caches; pipelines and framebuffers go before the render passes they use
    pub fn delete_unused(&mut self, backend: &mut dyn RenderBackend, now: Instant) -> usize {
        self.pipelines.delete_unused(backend, now)
            + self.framebuffers.delete_unused(backend, now)
            + self.render_passes.delete_unused(backend, now)
    }

    /// Release everything
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        self.pipelines.clear(backend);
        self.framebuffers.clear(backend);
        self.render_passes.clear(backend);
    }

    /// Total number of cached objects
    pub fn len(&self) -> usize {
        self.render_passes.len() + self.framebuffers.len() + self.pipelines.len()
    }

    /// True when all caches are empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResourceCaches {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_LIFETIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::HeadlessBackend;
    use crate::render::resources::{AttachmentInfo, FramebufferDesc, RenderPassDesc, TextureDesc, TextureFormat};
    use crate::render::{GpuResource, RenderBackend};

    fn depth_pass() -> RenderPassDesc {
        RenderPassDesc::new(vec![AttachmentInfo::depth_array()]).with_clear(true)
    }

    #[test]
    fn test_identical_descriptions_share_one_object() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ResourceCache::<RenderPass>::new(DEFAULT_CACHE_LIFETIME);
        let now = Instant::now();

        let a = cache.get(&mut backend, &depth_pass(), now).expect("created");
        let b = cache.get(&mut backend, &depth_pass(), now).expect("cached");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.created_count(), 1);
        assert_eq!(backend.live_count(|r| matches!(r, GpuResource::RenderPass(_))), 1);
    }

    #[test]
    fn test_changed_field_creates_distinct_object() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ResourceCache::<RenderPass>::new(DEFAULT_CACHE_LIFETIME);
        let now = Instant::now();

        let cleared = cache.get(&mut backend, &depth_pass(), now).expect("created");
        let loaded = cache
            .get(&mut backend, &depth_pass().with_clear(false), now)
            .expect("created");

        assert!(!Arc::ptr_eq(&cleared, &loaded));
        assert_ne!(cleared.handle(), loaded.handle());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_framebuffer_layer_is_part_of_the_key() {
        let mut backend = HeadlessBackend::new();
        let mut caches = ResourceCaches::default();
        let now = Instant::now();

        let pass = caches.render_passes.get(&mut backend, &depth_pass(), now).expect("created");
        let texture = backend.create_texture(&TextureDesc::depth_array(1024, 4)).expect("created");

        let layer = |i| FramebufferDesc::new(pass.handle(), vec![texture], 1024, 1024).with_layer(i);
        let first = caches.framebuffers.get(&mut backend, &layer(0), now).expect("created");
        let second = caches.framebuffers.get(&mut backend, &layer(1), now).expect("created");
        let again = caches.framebuffers.get(&mut backend, &layer(0), now).expect("cached");

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn test_eviction_needs_sole_ownership_and_idle_time() {
        let mut backend = HeadlessBackend::new();
        let lifetime = Duration::from_millis(100);
        let mut cache = ResourceCache::<RenderPass>::new(lifetime);
        let start = Instant::now();

        let held = cache.get(&mut backend, &depth_pass(), start).expect("created");
        let color = RenderPassDesc::new(vec![AttachmentInfo::color(TextureFormat::Rgba8)]);
        drop(cache.get(&mut backend, &color, start).expect("created"));

        // Not idle long enough yet
        assert_eq!(cache.delete_unused(&mut backend, start + lifetime / 2), 0);

        // The unreferenced one goes, the held one stays however long it idles
        assert_eq!(cache.delete_unused(&mut backend, start + lifetime * 2), 1);
        assert!(cache.contains(&depth_pass()));
        assert!(!cache.contains(&color));
        assert_eq!(cache.delete_unused(&mut backend, start + lifetime * 100), 0);

        drop(held);
        assert_eq!(cache.delete_unused(&mut backend, start + lifetime * 100), 1);
        assert!(cache.is_empty());
        assert_eq!(backend.live_count(|r| matches!(r, GpuResource::RenderPass(_))), 0);
    }

    #[test]
    fn test_access_refreshes_idle_time() {
        let mut backend = HeadlessBackend::new();
        let lifetime = Duration::from_millis(100);
        let mut cache = ResourceCache::<RenderPass>::new(lifetime);
        let start = Instant::now();

        drop(cache.get(&mut backend, &depth_pass(), start).expect("created"));
        drop(cache.get(&mut backend, &depth_pass(), start + lifetime).expect("cached"));

        assert_eq!(cache.delete_unused(&mut backend, start + lifetime + lifetime / 2), 0);
        assert_eq!(cache.delete_unused(&mut backend, start + lifetime * 3), 1);
    }
}

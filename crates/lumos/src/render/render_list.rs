//! # Render Lists
//!
//! A render list tracks the entities visible from one viewpoint and keeps them
//! ordered by squared distance to that viewpoint. The main camera owns one, and
//! so does every shadow cascade.
//!
//! ## Frame protocol
//!
//! ```text
//! update_camera_world_pos → remove_excess_objects → sort_lists → insert_object*
//! ```
//!
//! Lists are "almost sorted" from one frame to the next, so the resort is an
//! insertion sort and culling compacts in place without reordering survivors.
//! New insertions are capped per frame; anything over the cap is picked up on a
//! later frame because the scene is re-scanned every frame.
//!
//! ## Membership bits
//!
//! Every live list owns one bit out of 31, handed out by a
//! [`RenderListAllocator`]. An entity's `cull_flags` has the bit of list `L`
//! set exactly while `L` holds that entity.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::foundation::math::Vec3;
use crate::render::{RenderError, RenderResult};
use crate::scene::{Entity, EntityArena, EntityId};
use crate::spatial::Frustum;

/// Maximum number of render lists alive at the same time
pub const MAX_RENDER_LISTS: u32 = 31;

/// Default number of insertions a list accepts per frame
pub const DEFAULT_MAX_CHANGES_PER_FRAME: usize = 300;

const ALL_LISTS_MASK: u32 = (1 << MAX_RENDER_LISTS) - 1;

/// Hands out the membership bits of render lists
///
/// Cloning shares the same pool of bits. A bit returns to the pool when the
/// [`RenderList`] holding it is dropped.
#[derive(Debug, Clone, Default)]
pub struct RenderListAllocator {
    allocated: Arc<AtomicU32>,
}

impl RenderListAllocator {
    /// Create an allocator with every bit free
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lists currently alive
    pub fn allocated_count(&self) -> u32 {
        self.allocated_mask().count_ones()
    }

    /// Union of the bits of all live lists
    pub fn allocated_mask(&self) -> u32 {
        self.allocated.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<u32> {
        let lowest_free = |mask: u32| {
            let free = !mask & ALL_LISTS_MASK;
            (free != 0).then(|| free & free.wrapping_neg())
        };

        self.allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |mask| {
                lowest_free(mask).map(|bit| mask | bit)
            })
            .ok()
            .and_then(lowest_free)
    }

    fn release(&self, bit: u32) {
        self.allocated.fetch_and(!bit, Ordering::AcqRel);
    }
}

/// One entity in a render list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderListEntry {
    /// Squared distance to the camera; negated for transparent entries
    pub distance: f32,
    /// The entity
    pub entity: EntityId,
}

/// Distance-ordered set of visible entities for one viewpoint
#[derive(Debug)]
pub struct RenderList {
    bit: u32,
    allocator: RenderListAllocator,
    supports_transparency: bool,
    opaque: Vec<RenderListEntry>,
    transparent: Vec<RenderListEntry>,
    camera_world_pos: Vec3,
    changes_this_frame: usize,
    max_changes_per_frame: usize,
}

impl RenderList {
    /// Allocate a list and its membership bit
    ///
    /// Fails with [`RenderError::ResourceExhausted`] while
    /// [`MAX_RENDER_LISTS`] lists are alive.
    pub fn allocate(allocator: &RenderListAllocator, supports_transparency: bool) -> RenderResult<Self> {
        let Some(bit) = allocator.acquire() else {
            log::error!(
                "[RenderList] - Attempting to create more than {} render lists",
                MAX_RENDER_LISTS
            );
            return Err(RenderError::ResourceExhausted(format!(
                "all {MAX_RENDER_LISTS} render list slots are in use"
            )));
        };

        log::trace!("[RenderList] - Allocated list with bit {:#010x}", bit);

        Ok(Self {
            bit,
            allocator: allocator.clone(),
            supports_transparency,
            opaque: Vec::new(),
            transparent: Vec::new(),
            camera_world_pos: Vec3::zeros(),
            changes_this_frame: 0,
            max_changes_per_frame: DEFAULT_MAX_CHANGES_PER_FRAME,
        })
    }

    /// Set the per-frame insertion budget
    pub fn with_max_changes_per_frame(mut self, budget: usize) -> Self {
        self.max_changes_per_frame = budget;
        self
    }

    /// Start a new frame from `camera_pos`
    ///
    /// Resets the insertion budget and recomputes every stored distance.
    pub fn update_camera_world_pos(&mut self, camera_pos: Vec3, entities: &EntityArena) {
        self.changes_this_frame = 0;
        self.camera_world_pos = camera_pos;

        update_distances(&mut self.opaque, entities, camera_pos, 1.0);
        if self.supports_transparency {
            update_distances(&mut self.transparent, entities, camera_pos, -1.0);
        }
    }

    /// Drop every entry whose bounding sphere left `frustum`
    ///
    /// Entries whose entity no longer exists are dropped as well. Survivors
    /// keep their relative order.
    pub fn remove_excess_objects(&mut self, frustum: &Frustum, entities: &mut EntityArena) {
        let bit = self.bit;
        self.opaque.retain(|entry| keep_visible(entry, frustum, entities, bit));
        if self.supports_transparency {
            self.transparent.retain(|entry| keep_visible(entry, frustum, entities, bit));
        }
    }

    /// Re-establish distance order after [`update_camera_world_pos`](Self::update_camera_world_pos)
    pub fn sort_lists(&mut self) {
        insertion_sort(&mut self.opaque);
        if self.supports_transparency {
            insertion_sort(&mut self.transparent);
        }
    }

    /// Add an entity, keeping its sequence sorted
    ///
    /// Returns `false` without changes when the entity does not exist, is
    /// transparent and the list has no transparent sequence, is already in
    /// the list, or the per-frame budget is spent.
    pub fn insert_object(&mut self, id: EntityId, entities: &mut EntityArena) -> bool {
        entities
            .get_mut(id)
            .is_some_and(|entity| self.insert_entity(id, entity))
    }

    pub(crate) fn insert_entity(&mut self, id: EntityId, entity: &mut Entity) -> bool {
        if !self.supports_transparency && !entity.opaque {
            return false;
        }

        if self.budget_exhausted() || entity.in_list(self.bit) {
            return false;
        }

        self.changes_this_frame += 1;
        entity.cull_flags |= self.bit;

        let distance_sq = (entity.world_position() - self.camera_world_pos).norm_squared();
        let (target, distance) = if entity.opaque {
            (&mut self.opaque, distance_sq)
        } else {
            (&mut self.transparent, -distance_sq)
        };

        let position = target
            .iter()
            .position(|entry| entry.distance > distance)
            .unwrap_or(target.len());
        target.insert(position, RenderListEntry { distance, entity: id });

        true
    }

    /// Remove one entity, returning whether it was present
    pub fn remove_object(&mut self, id: EntityId, entities: &mut EntityArena) -> bool {
        let removed = remove_entry(&mut self.opaque, id) || remove_entry(&mut self.transparent, id);

        if let Some(entity) = entities.get_mut(id) {
            entity.cull_flags &= !self.bit;
        }

        removed
    }

    /// Empty the list and clear this list's bit on every member
    pub fn remove_all_objects(&mut self, entities: &mut EntityArena) {
        for entry in self.opaque.iter().chain(self.transparent.iter()) {
            if let Some(entity) = entities.get_mut(entry.entity) {
                entity.cull_flags &= !self.bit;
            }
        }
        self.clear();
    }

    /// Empty the list without touching entity flags
    ///
    /// Only valid when the entities are discarded or their flags reset
    /// elsewhere, as on scene teardown.
    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
    }

    /// Visit opaque entities front to back
    pub fn render_opaque_objects<F>(&self, entities: &EntityArena, mut visitor: F)
    where
        F: FnMut(EntityId, &Entity),
    {
        for entry in &self.opaque {
            if let Some(entity) = entities.get(entry.entity) {
                visitor(entry.entity, entity);
            }
        }
    }

    /// Visit transparent entities back to front
    pub fn render_transparent_objects<F>(&self, entities: &EntityArena, mut visitor: F)
    where
        F: FnMut(EntityId, &Entity),
    {
        if !self.supports_transparency {
            return;
        }

        for entry in &self.transparent {
            if let Some(entity) = entities.get(entry.entity) {
                visitor(entry.entity, entity);
            }
        }
    }

    /// This list's membership bit
    pub fn bit_mask(&self) -> u32 {
        self.bit
    }

    /// Whether transparent entities are accepted
    pub fn supports_transparency(&self) -> bool {
        self.supports_transparency
    }

    /// Opaque entries, nearest first
    pub fn opaque_entries(&self) -> &[RenderListEntry] {
        &self.opaque
    }

    /// Transparent entries, farthest first
    pub fn transparent_entries(&self) -> &[RenderListEntry] {
        &self.transparent
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    /// True when no entity is held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Camera position of the current frame
    pub fn camera_world_pos(&self) -> Vec3 {
        self.camera_world_pos
    }

    /// Insertions accepted since the last camera update
    pub fn changes_this_frame(&self) -> usize {
        self.changes_this_frame
    }

    /// Per-frame insertion budget
    pub fn max_changes_per_frame(&self) -> usize {
        self.max_changes_per_frame
    }

    /// True once this frame's insertion budget is spent
    pub fn budget_exhausted(&self) -> bool {
        self.changes_this_frame >= self.max_changes_per_frame
    }
}

impl Drop for RenderList {
    fn drop(&mut self) {
        self.allocator.release(self.bit);
    }
}

fn update_distances(entries: &mut [RenderListEntry], entities: &EntityArena, camera_pos: Vec3, sign: f32) {
    for entry in entries {
        if let Some(entity) = entities.get(entry.entity) {
            entry.distance = (entity.world_position() - camera_pos).norm_squared() * sign;
        }
    }
}

fn keep_visible(entry: &RenderListEntry, frustum: &Frustum, entities: &mut EntityArena, bit: u32) -> bool {
    let Some(entity) = entities.get_mut(entry.entity) else {
        return false;
    };

    if frustum.contains_sphere(&entity.world_position(), entity.bounding_radius) {
        return true;
    }

    entity.cull_flags &= !bit;
    false
}

fn remove_entry(entries: &mut Vec<RenderListEntry>, id: EntityId) -> bool {
    match entries.iter().position(|entry| entry.entity == id) {
        Some(index) => {
            entries.remove(index);
            true
        }
        None => false,
    }
}

// Near-linear on the almost-sorted input lists see between frames
fn insertion_sort(entries: &mut [RenderListEntry]) {
    for i in 1..entries.len() {
        let current = entries[i];
        let mut j = i;
        while j > 0 && entries[j - 1].distance > current.distance {
            entries[j] = entries[j - 1];
            j -= 1;
        }
        entries[j] = current;
    }
}

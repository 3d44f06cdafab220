//! Scene: entities, camera and lights rendered together
//!
//! The rendering core only reads what it needs from a scene: the camera, the
//! directional light, world matrices and bounding radii, plus the per-entity
//! cull flags it owns.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::math::Mat4;
use crate::render::RenderList;
use crate::spatial::Frustum;
use super::{Camera, Entity, EntityArena, EntityId, LightSetup};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a scene for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u64);

impl SceneId {
    fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A set of entities rendered from one camera under one light setup
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    name: String,
    camera: Option<Camera>,
    light_setup: LightSetup,
    entities: EntityArena,
    draw_objects: bool,
    world_radius: Option<f32>,
    screen_width: u32,
    screen_height: u32,
}

impl Scene {
    /// Create an empty scene with a default camera
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::next(),
            name: name.into(),
            camera: Some(Camera::default()),
            light_setup: LightSetup::default(),
            entities: EntityArena::with_key(),
            draw_objects: true,
            world_radius: None,
            screen_width: 0,
            screen_height: 0,
        }
    }

    /// Scene identity
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the scene
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Active camera, if any
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Mutable access to the active camera
    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    /// Replace (or remove) the active camera
    pub fn set_camera(&mut self, camera: Option<Camera>) {
        self.camera = camera;
    }

    /// Lights of the scene
    pub fn light_setup(&self) -> &LightSetup {
        &self.light_setup
    }

    /// Mutable access to the lights
    pub fn light_setup_mut(&mut self) -> &mut LightSetup {
        &mut self.light_setup
    }

    /// All entities
    pub fn entities(&self) -> &EntityArena {
        &self.entities
    }

    /// Mutable access to all entities
    pub fn entities_mut(&mut self) -> &mut EntityArena {
        &mut self.entities
    }

    /// Camera and entities borrowed together
    pub fn camera_and_entities_mut(&mut self) -> (Option<&Camera>, &mut EntityArena) {
        (self.camera.as_ref(), &mut self.entities)
    }

    /// Add an entity
    pub fn create_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.insert(entity)
    }

    /// Remove an entity; render lists drop it on their next cull
    pub fn destroy_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    /// Look up an entity
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up an entity mutably
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Whether the pipeline should draw this scene
    pub fn draw_objects(&self) -> bool {
        self.draw_objects
    }

    /// Enable or disable drawing
    pub fn set_draw_objects(&mut self, draw: bool) {
        self.draw_objects = draw;
    }

    /// Radius enclosing everything that can cast a shadow, when the scene knows it
    ///
    /// Overrides the renderer's default cascade depth margin.
    pub fn world_radius(&self) -> Option<f32> {
        self.world_radius
    }

    /// Set (or clear) the world radius
    pub fn set_world_radius(&mut self, radius: Option<f32>) {
        self.world_radius = radius;
    }

    /// Record the surface size the scene is displayed at
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen_width = width;
        self.screen_height = height;
    }

    /// Surface width in pixels
    pub fn screen_width(&self) -> u32 {
        self.screen_width
    }

    /// Surface height in pixels
    pub fn screen_height(&self) -> u32 {
        self.screen_height
    }

    /// Compose world matrices for every entity
    ///
    /// A physics transform is already in world space and replaces both the
    /// local transform and the parent chain. Otherwise the local transform is
    /// composed with the parent's world matrix.
    pub fn build_world_matrices(&mut self) {
        let ids: Vec<EntityId> = self.entities.keys().collect();
        let max_depth = ids.len();

        for id in ids {
            let world = self.compose_world_matrix(id, max_depth);
            if let Some(entity) = self.entities.get_mut(id) {
                entity.set_world_matrix(world);
            }
        }
    }

    fn compose_world_matrix(&self, id: EntityId, max_depth: usize) -> Mat4 {
        let mut world = Mat4::identity();
        let mut current = Some(id);
        let mut depth = 0;

        while let Some(entity) = current.and_then(|key| self.entities.get(key)) {
            world = entity.local_matrix() * world;
            if entity.physics_transform.is_some() {
                break;
            }

            depth += 1;
            if depth > max_depth {
                log::warn!("[Scene] - Parent cycle detected at entity '{}'", entity.name);
                break;
            }
            current = entity.parent;
        }

        world
    }

    /// Offer every visible mesh entity to `list`
    ///
    /// Entities already held by the list are skipped; the list's own budget
    /// limits how many are accepted this frame.
    pub fn insert_to_render_list(&mut self, list: &mut RenderList, frustum: &Frustum) {
        let bit = list.bit_mask();

        for (id, entity) in &mut self.entities {
            if list.budget_exhausted() {
                break;
            }

            if entity.mesh.is_none() || entity.in_list(bit) {
                continue;
            }

            if frustum.contains_sphere(&entity.world_position(), entity.bounding_radius) {
                list.insert_entity(id, entity);
            }
        }
    }

    /// Called when the scene becomes current
    pub fn on_init_scene(&mut self) {
        if let Some(camera) = self.camera.as_mut() {
            camera.update_projection_matrix(self.screen_width, self.screen_height);
            camera.build_view_matrix();
        }
        self.build_world_matrices();

        log::info!("[Scene] - Initialised '{}' with {} entities", self.name, self.entities.len());
    }

    /// Called when the scene stops being current
    ///
    /// Clears every cull flag so no entity claims membership in a render list
    /// whose bit may be handed to a different list later.
    pub fn on_cleanup_scene(&mut self) {
        for entity in self.entities.values_mut() {
            entity.cull_flags = 0;
        }

        log::info!("[Scene] - Cleaned up '{}'", self.name);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("NewScene")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::render::{MeshHandle, RenderListAllocator};
    use crate::scene::MeshComponent;
    use approx::assert_relative_eq;

    fn mesh_entity(position: Vec3) -> Entity {
        Entity::new("cube", Transform::from_position(position)).with_mesh(MeshComponent::new(MeshHandle(1)))
    }

    fn camera_frustum(scene: &Scene) -> Frustum {
        let camera = scene.camera().expect("default scene has a camera");
        Frustum::from_matrix(&camera.view_projection_matrix())
    }

    #[test]
    fn test_scene_ids_are_unique() {
        assert_ne!(Scene::new("a").id(), Scene::new("b").id());
    }

    #[test]
    fn test_build_world_matrices_composes_parents() {
        let mut scene = Scene::new("hierarchy");
        let parent = scene.create_entity(Entity::new("parent", Transform::from_position(Vec3::new(10.0, 0.0, 0.0))));
        let child = scene.create_entity(
            Entity::new("child", Transform::from_position(Vec3::new(0.0, 2.0, 0.0))).with_parent(parent),
        );

        scene.build_world_matrices();

        assert_relative_eq!(scene.entities()[child].world_position(), Vec3::new(10.0, 2.0, 0.0));
    }

    #[test]
    fn test_physics_transform_overrides_local_and_parent() {
        let mut scene = Scene::new("physics");
        let parent = scene.create_entity(Entity::new("parent", Transform::from_position(Vec3::new(10.0, 0.0, 0.0))));
        let mut body = Entity::new("body", Transform::from_position(Vec3::new(1.0, 1.0, 1.0))).with_parent(parent);
        body.physics_transform = Some(Mat4::new_translation(&Vec3::new(-3.0, 0.0, 0.0)));
        let body = scene.create_entity(body);

        scene.build_world_matrices();

        assert_relative_eq!(scene.entities()[body].world_position(), Vec3::new(-3.0, 0.0, 0.0));
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let mut scene = Scene::new("cycle");
        let a = scene.create_entity(Entity::new("a", Transform::identity()));
        let b = scene.create_entity(Entity::new("b", Transform::identity()).with_parent(a));
        scene.entities_mut()[a].parent = Some(b);

        scene.build_world_matrices();
    }

    #[test]
    fn test_insert_to_render_list_only_takes_visible_meshes() {
        let mut scene = Scene::new("visibility");
        let visible = scene.create_entity(mesh_entity(Vec3::zeros()));
        let hidden = scene.create_entity(mesh_entity(Vec3::new(0.0, 0.0, 50.0)));
        let no_mesh = scene.create_entity(Entity::new("marker", Transform::identity()));
        scene.build_world_matrices();

        let allocator = RenderListAllocator::new();
        let mut list = RenderList::allocate(&allocator, true).expect("slot available");
        let frustum = camera_frustum(&scene);

        scene.insert_to_render_list(&mut list, &frustum);
        scene.insert_to_render_list(&mut list, &frustum);

        assert_eq!(list.len(), 1);
        assert!(scene.entities()[visible].in_list(list.bit_mask()));
        assert!(!scene.entities()[hidden].in_list(list.bit_mask()));
        assert!(!scene.entities()[no_mesh].in_list(list.bit_mask()));
    }

    #[test]
    fn test_cleanup_clears_every_cull_flag() {
        let mut scene = Scene::new("cleanup");
        for i in 0..5 {
            scene.create_entity(mesh_entity(Vec3::new(i as f32 * 0.2, 0.0, 0.0)));
        }
        scene.build_world_matrices();

        let allocator = RenderListAllocator::new();
        let mut list = RenderList::allocate(&allocator, false).expect("slot available");
        let frustum = camera_frustum(&scene);
        scene.insert_to_render_list(&mut list, &frustum);
        assert!(scene.entities().values().any(|entity| entity.cull_flags != 0));

        scene.on_cleanup_scene();
        list.clear();

        assert!(scene.entities().values().all(|entity| entity.cull_flags == 0));
    }
}

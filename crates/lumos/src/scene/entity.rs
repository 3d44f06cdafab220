//! Scene entities
//!
//! Entities live in a generational arena owned by their [`Scene`](super::Scene).
//! Render lists hold [`EntityId`] keys rather than references; a key whose
//! entity has been destroyed simply no longer resolves.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{utils, Mat4, Transform, Vec3};
use crate::render::MeshHandle;

new_key_type! {
    /// Generational handle to an entity in a scene
    pub struct EntityId;
}

/// Arena holding every entity of a scene
pub type EntityArena = SlotMap<EntityId, Entity>;

/// Drawable mesh attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct MeshComponent {
    /// Backend mesh
    pub mesh: MeshHandle,
    /// Whether the mesh is drawn into the shadow cascades
    pub casts_shadows: bool,
    /// UV transform handed to the material
    pub texture_matrix: Mat4,
}

impl MeshComponent {
    /// Shadow-casting mesh with an identity texture transform
    pub fn new(mesh: MeshHandle) -> Self {
        Self {
            mesh,
            casts_shadows: true,
            texture_matrix: Mat4::identity(),
        }
    }
}

/// A world object as seen by the rendering core
#[derive(Debug, Clone)]
pub struct Entity {
    /// Debug name
    pub name: String,
    /// Transform relative to the parent (or the world for root entities)
    pub transform: Transform,
    /// Parent entity, composed into the world matrix
    pub parent: Option<EntityId>,
    /// World transform owned by the physics engine; overrides `transform` and `parent`
    pub physics_transform: Option<Mat4>,
    /// Bounding sphere radius around the world position
    pub bounding_radius: f32,
    /// Mesh drawn for this entity
    pub mesh: Option<MeshComponent>,
    /// Opaque entities go to the front-to-back sequence, others back-to-front
    pub opaque: bool,
    /// One bit per render list currently holding this entity
    pub cull_flags: u32,
    world_matrix: Mat4,
}

impl Entity {
    /// Create an opaque root entity at `transform`
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        let world_matrix = transform.to_matrix();
        Self {
            name: name.into(),
            transform,
            parent: None,
            physics_transform: None,
            bounding_radius: 1.0,
            mesh: None,
            opaque: true,
            cull_flags: 0,
            world_matrix,
        }
    }

    /// Attach a mesh
    pub fn with_mesh(mut self, mesh: MeshComponent) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Set the bounding sphere radius
    pub fn with_bounding_radius(mut self, radius: f32) -> Self {
        self.bounding_radius = radius;
        self
    }

    /// Mark the entity transparent
    pub fn transparent(mut self) -> Self {
        self.opaque = false;
        self
    }

    /// Attach to a parent entity
    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// World matrix as of the last `Scene::build_world_matrices`
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Translation part of the world matrix
    pub fn world_position(&self) -> Vec3 {
        utils::position_of(&self.world_matrix)
    }

    /// Matrix used as this entity's own contribution to the world transform
    pub fn local_matrix(&self) -> Mat4 {
        self.physics_transform.unwrap_or_else(|| self.transform.to_matrix())
    }

    pub(crate) fn set_world_matrix(&mut self, matrix: Mat4) {
        self.world_matrix = matrix;
    }

    /// Whether a render list with `bit` currently holds this entity
    pub fn in_list(&self, bit: u32) -> bool {
        self.cull_flags & bit != 0
    }
}

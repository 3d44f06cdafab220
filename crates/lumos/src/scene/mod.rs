//! Scene model consumed by the renderers
//!
//! A [`Scene`] bundles a camera, a light setup and a slotmap arena of
//! entities. Entities carry the cull flag bitfield that records which render
//! lists currently hold them. The [`SceneManager`] owns every scene and
//! binds the current one to the [`GraphicsPipeline`](crate::render::GraphicsPipeline).

mod camera;
mod entity;
mod light;
#[allow(clippy::module_inception)]
mod scene;
mod scene_manager;

pub use camera::Camera;
pub use entity::{Entity, EntityArena, EntityId, MeshComponent};
pub use light::{DirectionalLight, LightSetup};
pub use scene::{Scene, SceneId};
pub use scene_manager::SceneManager;

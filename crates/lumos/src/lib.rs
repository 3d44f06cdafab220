//! # Lumos
//!
//! Deferred rendering core with cascaded shadow maps.
//!
//! ## Features
//!
//! - **Render Lists**: bitmask-tagged visible sets with bounded per-frame churn
//! - **Cascaded Shadows**: configurable split schemes, one depth layer per cascade
//! - **Deferred Shading**: G-buffer geometry pass followed by a lighting pass
//! - **Resource Caches**: hash-keyed render passes, framebuffers and pipelines
//!   evicted after an idle timeout
//! - **Backend Agnostic**: everything goes through [`render::RenderBackend`];
//!   a headless backend ships for tests and tooling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumos::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = RendererSettings::default();
//!     let mut pipeline = GraphicsPipeline::new(Box::new(HeadlessBackend::new()), settings)?;
//!     pipeline.init(1280, 720)?;
//!
//!     let mut scenes = SceneManager::new();
//!     scenes.enqueue_scene(Scene::new("Main"));
//!
//!     loop {
//!         scenes.apply_scene_switch(&mut pipeline);
//!         pipeline.render_scene(scenes.current_scene_mut())?;
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, Config, RendererSettings},
        foundation::{
            math::{Mat4, Transform, Vec3},
            time::Timer,
        },
        render::{
            backends::HeadlessBackend, FrameStats, GraphicsPipeline, MeshHandle, OverlayRenderer,
            RenderBackend, RenderError, RenderResult,
        },
        scene::{Camera, DirectionalLight, Entity, EntityId, MeshComponent, Scene, SceneManager},
    };
}

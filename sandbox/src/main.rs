//! Headless sandbox for the rendering core
//!
//! Builds a few procedurally populated scenes and drives the graphics
//! pipeline through them on the headless backend: frames, scene switches, a
//! resize, a cascade count change and cache sweeps. Usage:
//!
//! ```text
//! sandbox [config.toml|config.ron] [frames]
//! ```

use std::time::Instant;

use lumos::config::ConfigError;
use lumos::core::config::{ApplicationConfig, Config};
use lumos::foundation::math::{Quat, Transform, Vec3};
use lumos::foundation::time::Timer;
use lumos::render::backends::HeadlessBackend;
use lumos::render::{FrameStats, GraphicsPipeline, MeshHandle, RenderError};
use lumos::scene::{DirectionalLight, Entity, EntityId, LightSetup, MeshComponent, Scene, SceneManager};
use rand::Rng;

const DEFAULT_CONFIG_PATH: &str = "sandbox.toml";
const DEFAULT_FRAMES: u64 = 600;
const FRAMES_PER_SCENE: u64 = 150;
const RESIZE_FRAME: u64 = 200;
const CASCADE_CHANGE_FRAME: u64 = 320;
const REPORT_INTERVAL: u64 = 100;

#[derive(Debug, thiserror::Error)]
enum SandboxError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("renderer: {0}")]
    Render(#[from] RenderError),

    #[error("invalid frame count '{0}'")]
    FrameCount(String),
}

/// Scene description used to populate the sandbox
struct SceneRecipe {
    name: &'static str,
    objects: usize,
    transparent_ratio: f64,
    spread: f32,
    light: [f32; 3],
}

const RECIPES: [SceneRecipe; 3] = [
    SceneRecipe { name: "Field", objects: 400, transparent_ratio: 0.1, spread: 60.0, light: [0.3, 1.0, 0.2] },
    SceneRecipe { name: "Towers", objects: 120, transparent_ratio: 0.0, spread: 25.0, light: [-0.6, 0.8, 0.1] },
    SceneRecipe { name: "Noon", objects: 250, transparent_ratio: 0.3, spread: 40.0, light: [0.0, 1.0, 0.0] },
];

struct SandboxApp {
    pipeline: GraphicsPipeline,
    scenes: SceneManager,
    spinners: Vec<Vec<EntityId>>,
    timer: Timer,
    frames: u64,
}

impl SandboxApp {
    fn new(config: &ApplicationConfig, frames: u64) -> Result<Self, SandboxError> {
        let backend = HeadlessBackend::new().without_call_log();
        let mut pipeline = GraphicsPipeline::new(Box::new(backend), config.renderer.clone())?;
        pipeline.init(config.window.width, config.window.height)?;

        let mut rng = rand::thread_rng();
        let mut scenes = SceneManager::new();
        let mut spinners = Vec::new();
        for recipe in &RECIPES {
            let (scene, spinning) = build_scene(recipe, &mut rng);
            scenes.enqueue_scene(scene);
            spinners.push(spinning);
        }
        log::info!("Loaded scenes: {:?}", scenes.scene_names());

        Ok(Self {
            pipeline,
            scenes,
            spinners,
            timer: Timer::new(),
            frames,
        })
    }

    fn run(&mut self) -> Result<(), SandboxError> {
        let mut totals = FrameStats::default();

        for frame in 0..self.frames {
            self.timer.update();

            if frame > 0 && frame % FRAMES_PER_SCENE == 0 {
                self.scenes.switch_to_next_scene();
            }
            self.scenes.apply_scene_switch(&mut self.pipeline);

            if frame == RESIZE_FRAME {
                self.pipeline.on_resize(1600, 900, self.scenes.current_scene_mut())?;
            }
            if frame == CASCADE_CHANGE_FRAME {
                let active = self.pipeline.set_shadow_map_num(2, self.scenes.current_scene_mut());
                log::info!("Shadow cascades now {}", active);
            }

            self.animate();
            let stats = self.pipeline.render_scene(self.scenes.current_scene_mut())?;
            totals.visible_objects += stats.visible_objects;
            totals.deferred.geometry_draws += stats.deferred.geometry_draws;
            totals.deferred.shadow.draws += stats.deferred.shadow.draws;
            totals.evicted_resources += stats.evicted_resources;

            if frame % REPORT_INTERVAL == 0 {
                log::info!(
                    "Frame {:>4} '{}': {} visible, {} geometry draws, {} shadow draws over {} cascades, {} dropped, {} cached",
                    frame,
                    self.scenes.current_scene().map_or("<none>", Scene::name),
                    stats.visible_objects,
                    stats.deferred.geometry_draws,
                    stats.deferred.shadow.draws,
                    stats.deferred.shadow.cascades,
                    stats.deferred.dropped + stats.deferred.shadow.dropped,
                    self.pipeline.caches().len(),
                );
            }
        }

        let evicted = self.pipeline.delete_unused_cache(Instant::now());
        log::info!(
            "Rendered {} frames in {:.2}s ({:.0} fps): {} visible, {} geometry draws, {} shadow draws, {} evicted",
            self.timer.frame_count(),
            self.timer.total_time(),
            self.timer.average_fps(),
            totals.visible_objects,
            totals.deferred.geometry_draws,
            totals.deferred.shadow.draws,
            totals.evicted_resources + evicted,
        );
        Ok(())
    }

    /// Spin the pivot and a subset of the current scene around the Y axis
    fn animate(&mut self) {
        let Some(index) = self.scenes.current_index() else {
            return;
        };
        let Some(scene) = self.scenes.scene_mut(index) else {
            return;
        };
        let step = Quat::from_axis_angle(&Vec3::y_axis(), self.timer.delta_time());
        for id in self.spinners.get(index).into_iter().flatten() {
            if let Some(entity) = scene.entity_mut(*id) {
                entity.transform.position = step * entity.transform.position;
                entity.transform.rotation = step * entity.transform.rotation;
            }
        }
    }
}

fn build_scene(recipe: &SceneRecipe, rng: &mut impl Rng) -> (Scene, Vec<EntityId>) {
    let mut scene = Scene::new(recipe.name);
    let sun = DirectionalLight::new(Vec3::from(recipe.light), Vec3::new(1.0, 0.95, 0.9), 1.0);
    *scene.light_setup_mut() = LightSetup::new(sun);
    if let Some(camera) = scene.camera_mut() {
        camera.set_position(Vec3::new(0.0, recipe.spread * 0.4, recipe.spread));
        camera.look_at(Vec3::zeros(), Vec3::y());
    }

    scene.create_entity(
        Entity::new("Ground", Transform::from_position_rotation_scale(Vec3::zeros(), Quat::identity(), recipe.spread))
            .with_mesh(MeshComponent::new(MeshHandle(1)))
            .with_bounding_radius(recipe.spread * 1.5),
    );
    let pivot = scene.create_entity(Entity::new("Pivot", Transform::identity()));

    let mut spinning = vec![pivot];
    for i in 0..recipe.objects {
        let position = Vec3::new(
            rng.gen_range(-recipe.spread..recipe.spread),
            rng.gen_range(0.5..recipe.spread * 0.2),
            rng.gen_range(-recipe.spread..recipe.spread),
        );
        let scale = rng.gen_range(0.3..1.5);
        let mut entity = Entity::new(
            format!("{}-{i}", recipe.name),
            Transform::from_position_rotation_scale(position, Quat::identity(), scale),
        )
        .with_mesh(MeshComponent::new(MeshHandle(2 + (i as u64 % 3))))
        .with_bounding_radius(scale);
        if rng.gen_bool(recipe.transparent_ratio) {
            entity = entity.transparent();
        }
        if i % 4 == 0 {
            entity = entity.with_parent(pivot);
        }

        let id = scene.create_entity(entity);
        if i % 3 == 0 {
            spinning.push(id);
        }
    }

    (scene, spinning)
}

fn parse_args() -> Result<(String, u64), SandboxError> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let frames = match args.next() {
        Some(raw) => raw.parse().map_err(|_| SandboxError::FrameCount(raw))?,
        None => DEFAULT_FRAMES,
    };
    Ok((path, frames))
}

fn run() -> Result<(), SandboxError> {
    let (path, frames) = parse_args()?;
    let config = ApplicationConfig::load_or_default(&path)?;
    config.validate()?;

    lumos::foundation::logging::init_with_level(&config.engine.log_level);
    log::info!("Starting Lumos sandbox ({} frames at {}x{})", frames, config.window.width, config.window.height);

    let mut app = SandboxApp::new(&config, frames)?;
    app.run()
}

fn main() {
    match run() {
        Ok(()) => log::info!("Sandbox completed successfully"),
        Err(err) => {
            log::error!("Sandbox failed: {}", err);
            eprintln!("sandbox: {err}");
            std::process::exit(1);
        }
    }
}

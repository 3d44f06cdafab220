//! Scene Manager
//!
//! Owns every loaded [`Scene`] and decides which one the
//! [`GraphicsPipeline`] renders. Switch requests are queued and only applied
//! by [`SceneManager::apply_scene_switch`], which the application calls at a
//! point in the frame where no render list is being walked.

use crate::render::GraphicsPipeline;
use crate::scene::Scene;

/// Registry of scenes with deferred switching
#[derive(Debug, Default)]
pub struct SceneManager {
    scenes: Vec<Scene>,
    current: Option<usize>,
    queued: usize,
    switching: bool,
}

impl SceneManager {
    /// Empty manager; the first switch creates a default scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene and return its index
    pub fn enqueue_scene(&mut self, scene: Scene) -> usize {
        log::debug!("[SceneManager] - Enqueued scene : {}", scene.name());
        self.scenes.push(scene);
        self.scenes.len() - 1
    }

    /// Queue a switch to the scene at `index`
    ///
    /// The index is validated when the switch is applied.
    pub fn switch_scene(&mut self, index: usize) {
        self.queued = index;
        self.switching = true;
    }

    /// Queue a switch to the scene after the current one, wrapping around
    pub fn switch_to_next_scene(&mut self) {
        if self.scenes.is_empty() {
            self.switch_scene(0);
            return;
        }
        let next = self.current.map_or(0, |current| (current + 1) % self.scenes.len());
        self.switch_scene(next);
    }

    /// Queue a switch to the first scene called `name`
    ///
    /// Returns `false`, and queues nothing, when no scene has that name.
    pub fn switch_scene_by_name(&mut self, name: &str) -> bool {
        match self.scenes.iter().position(|scene| scene.name() == name) {
            Some(index) => {
                self.switch_scene(index);
                true
            }
            None => {
                log::error!("[SceneManager] - Unknown Scene Alias : {}", name);
                false
            }
        }
    }

    /// Make the queued scene current and bind it to `pipeline`
    ///
    /// Does nothing when no switch is queued and a scene is already current.
    /// The outgoing scene has its render list membership removed before its
    /// cleanup hook runs, so no cull bit survives into the next scene's lists.
    pub fn apply_scene_switch(&mut self, pipeline: &mut GraphicsPipeline) {
        if !self.switching && self.current.is_some() {
            return;
        }

        if self.scenes.is_empty() {
            self.scenes.push(Scene::new("NewScene"));
            self.queued = 0;
        }

        let mut index = self.queued;
        if index >= self.scenes.len() {
            log::error!("[SceneManager] - Invalid scene index : {}", index);
            index = 0;
        }

        if let Some(old) = self.current.and_then(|old| self.scenes.get_mut(old)) {
            log::info!("[SceneManager] - Exiting scene : {}", old.name());
            pipeline.reset(Some(&mut *old));
            old.on_cleanup_scene();
        }

        self.current = Some(index);
        self.queued = index;
        self.switching = false;

        let scene = &mut self.scenes[index];
        scene.set_screen_size(pipeline.width(), pipeline.height());
        scene.on_init_scene();
        pipeline.set_scene(Some(scene.id()));

        log::info!("[SceneManager] - Scene switched to : {}", scene.name());
    }

    /// Whether a switch is waiting to be applied
    pub fn is_switching(&self) -> bool {
        self.switching
    }

    /// The current scene
    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.and_then(|index| self.scenes.get(index))
    }

    /// The current scene, mutably
    pub fn current_scene_mut(&mut self) -> Option<&mut Scene> {
        self.current.and_then(|index| self.scenes.get_mut(index))
    }

    /// Index of the current scene
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Scene at `index`
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Scene at `index`, mutably
    pub fn scene_mut(&mut self, index: usize) -> Option<&mut Scene> {
        self.scenes.get_mut(index)
    }

    /// Names of every scene in index order
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.iter().map(Scene::name).collect()
    }

    /// Whether a scene called `name` exists
    pub fn contains_scene(&self, name: &str) -> bool {
        self.scenes.iter().any(|scene| scene.name() == name)
    }

    /// Number of scenes
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }
}

//! # Unified Configuration System
//!
//! Configuration for the rendering core, the engine shell around it and the
//! initial window size. Everything here is serde-enabled so it can be loaded
//! through [`Config`] from TOML or RON.
//!
//! ## Configuration Categories
//!
//! - **Renderer Settings**: shadow cascades, per-frame budgets, cache lifetime
//! - **Engine Config**: logging, debug features
//! - **Window Config**: initial surface size

use serde::{Serialize, Deserialize};
use std::time::Duration;

pub use crate::config::{Config, ConfigError};
use crate::render::shadow::{CascadeSplitScheme, MAX_SHADOW_MAPS};

/// # Renderer Settings
///
/// Tuning knobs for the deferred pipeline and its shadow pass. Defaults match
/// the values the engine has always shipped with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Resolution (width and height) of each shadow map layer
    pub shadow_map_size: u32,
    /// Number of shadow cascades
    pub shadow_map_count: u32,
    /// Capacity of the per-cascade dynamic uniform buffer, in objects
    pub max_shadow_objects: usize,
    /// Capacity of the geometry pass dynamic uniform buffer, in objects
    pub max_scene_objects: usize,
    /// Maximum insertions a render list accepts per frame
    pub max_list_changes_per_frame: usize,
    /// Idle time after which an unreferenced cached GPU object is released
    pub cache_lifetime_secs: f32,
    /// Depth margin added around each cascade to catch off-screen casters
    pub scene_bounding_radius: f32,
    /// How the camera depth range is divided between cascades
    pub cascade_split: CascadeSplitScheme,
    /// Command buffers recorded by the deferred renderer per frame
    pub command_buffer_count: usize,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shadow_map_size: 2048,
            shadow_map_count: 4,
            max_shadow_objects: 2048,
            max_scene_objects: 4096,
            max_list_changes_per_frame: 300,
            cache_lifetime_secs: 1.0,
            scene_bounding_radius: 1000.0,
            cascade_split: CascadeSplitScheme::default(),
            command_buffer_count: 1,
        }
    }
}

impl RendererSettings {
    /// Set shadow map resolution and cascade count
    pub fn with_shadow_maps(mut self, size: u32, count: u32) -> Self {
        self.shadow_map_size = size;
        self.shadow_map_count = count;
        self
    }

    /// Set the per-frame insertion budget for render lists
    pub fn with_list_change_budget(mut self, budget: usize) -> Self {
        self.max_list_changes_per_frame = budget;
        self
    }

    /// Set the shadow pass object capacity
    pub fn with_max_shadow_objects(mut self, max_objects: usize) -> Self {
        self.max_shadow_objects = max_objects;
        self
    }

    /// Cache lifetime as a duration
    pub fn cache_lifetime(&self) -> Duration {
        Duration::from_secs_f32(self.cache_lifetime_secs.max(0.0))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shadow_map_size == 0 {
            return Err(ConfigError::Invalid("Shadow map size must be non-zero".to_string()));
        }

        if self.shadow_map_count > MAX_SHADOW_MAPS {
            return Err(ConfigError::Invalid(format!(
                "Shadow map count {} exceeds the maximum of {}",
                self.shadow_map_count, MAX_SHADOW_MAPS
            )));
        }

        if self.max_shadow_objects == 0 || self.max_scene_objects == 0 {
            return Err(ConfigError::Invalid("Object capacities must be non-zero".to_string()));
        }

        if self.command_buffer_count == 0 {
            return Err(ConfigError::Invalid("At least one command buffer is required".to_string()));
        }

        if !self.cache_lifetime_secs.is_finite() || self.cache_lifetime_secs < 0.0 {
            return Err(ConfigError::Invalid("Cache lifetime must be a non-negative number".to_string()));
        }

        if let CascadeSplitScheme::Practical { lambda } = self.cascade_split {
            if !(0.0..=1.0).contains(&lambda) {
                return Err(ConfigError::Invalid(format!("Cascade split lambda {lambda} outside [0, 1]")));
            }
        }

        Ok(())
    }
}

/// # Engine Configuration
///
/// Core engine behavior configuration including logging and debug features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
    /// Target FPS for frame rate limiting
    pub target_fps: Option<u32>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            target_fps: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Initial surface size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Rendering system configuration
    pub renderer: RendererSettings,
    /// Window configuration
    pub window: WindowConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("Window size must be non-zero".to_string()));
        }
        self.renderer.validate()
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(ApplicationConfig::default().validate().is_ok());
        assert_eq!(RendererSettings::default().max_list_changes_per_frame, 300);
    }

    #[test]
    fn test_too_many_cascades_rejected() {
        let settings = RendererSettings::default().with_shadow_maps(1024, MAX_SHADOW_MAPS + 1);
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let parsed: ApplicationConfig = toml::from_str(
            "[renderer]\nshadow_map_count = 3\n\n[window]\nwidth = 800\n",
        )
        .expect("partial config should parse");

        assert_eq!(parsed.renderer.shadow_map_count, 3);
        assert_eq!(parsed.renderer.shadow_map_size, 2048);
        assert_eq!(parsed.window.width, 800);
        assert_eq!(parsed.window.height, 720);
    }

    #[test]
    fn test_save_and_load_ron_file() {
        let path = std::env::temp_dir().join(format!("lumos_config_test_{}.ron", std::process::id()));
        let mut config = ApplicationConfig::default();
        config.renderer.cascade_split = CascadeSplitScheme::Practical { lambda: 0.9 };

        config.save_to_file(&path).expect("save should succeed");
        let loaded = ApplicationConfig::load_from_file(&path).expect("load should succeed");
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}

//! Scene lighting setup
//!
//! Only the directional light takes part in the rendering core: its direction
//! orients every shadow cascade.

use crate::foundation::math::Vec3;

/// Directional (sun-like) light with parallel rays
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// Unit vector from the scene towards the light
    pub direction: Vec3,
    /// RGB color values for the light (0.0 to 1.0 range)
    pub color: Vec3,
    /// Light intensity multiplier
    pub intensity: f32,
    /// Whether this light should cast shadows
    pub cast_shadows: bool,
}

impl DirectionalLight {
    /// Create a shadow-casting light; `direction` is normalized
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: normalize_or_up(direction),
            color,
            intensity,
            cast_shadows: true,
        }
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(0.3, 1.0, 0.2), Vec3::new(1.0, 1.0, 1.0), 1.0)
    }
}

/// Lights of a scene
#[derive(Debug, Clone, Default)]
pub struct LightSetup {
    directional: DirectionalLight,
}

impl LightSetup {
    /// Create a setup around one directional light
    pub fn new(directional: DirectionalLight) -> Self {
        Self { directional }
    }

    /// The directional light
    pub fn directional_light(&self) -> &DirectionalLight {
        &self.directional
    }

    /// Mutable access to the directional light
    pub fn directional_light_mut(&mut self) -> &mut DirectionalLight {
        &mut self.directional
    }

    /// Unit vector from the scene towards the directional light
    pub fn directional_light_direction(&self) -> Vec3 {
        self.directional.direction
    }

    /// Re-aim the directional light
    pub fn set_directional_light_direction(&mut self, direction: Vec3) {
        self.directional.direction = normalize_or_up(direction);
    }
}

fn normalize_or_up(direction: Vec3) -> Vec3 {
    direction.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y)
}

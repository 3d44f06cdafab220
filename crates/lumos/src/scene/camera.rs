//! # 3D Camera
//!
//! Perspective camera consumed by the frame orchestrator and the shadow
//! cascade fit.
//!
//! ## Design Principles
//! - **Library-agnostic**: no backend conventions leak into camera math
//! - **Explicit rebuild**: the view matrix is cached and only rebuilt by
//!   [`Camera::build_view_matrix`], once per frame
//! - **Single convention**: right-handed, looking down `-Z`, `[0, 1]` depth

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// 3D perspective camera
///
/// Holds position, look-at target and projection parameters together with the
/// cached view and projection matrices derived from them.
///
/// # Coordinate System
/// Right-handed, Y-up world space; view space looks down `-Z`. The projection
/// maps the near plane to depth 0 and the far plane to depth 1.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,

    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Camera {
    /// Create a new perspective camera with standard Y-up orientation
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    ///
    /// # Example
    /// ```rust
    /// use lumos::foundation::math::Vec3;
    /// use lumos::scene::Camera;
    ///
    /// let mut camera = Camera::perspective(Vec3::new(0.0, 2.0, 5.0), 75.0, 16.0 / 9.0, 0.1, 100.0);
    /// camera.build_view_matrix();
    /// assert_eq!(camera.near(), 0.1);
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
            view_matrix: Mat4::identity(),
            projection_matrix: Mat4::identity(),
        };
        camera.rebuild_projection();
        camera.build_view_matrix();
        camera
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Configure camera to look at a specific point with custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update camera aspect ratio for viewport changes
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        // Only log noticeable changes, resize drags fire this every frame
        if (self.aspect - aspect).abs() > 0.01 {
            log::info!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
        self.rebuild_projection();
    }

    /// Recompute the projection for a new surface size
    pub fn update_projection_matrix(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        self.set_aspect_ratio(width as f32 / height as f32);
    }

    /// Rebuild the cached view matrix from position, target and up
    pub fn build_view_matrix(&mut self) {
        self.view_matrix = Mat4::view_look_at(self.position, self.target, self.up);
    }

    /// World-to-view matrix as of the last [`build_view_matrix`](Self::build_view_matrix)
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// View-to-clip projection matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined `projection * view`
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Distance to near clipping plane
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Distance to far clipping plane
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Vertical field of view in radians
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Width / height
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    fn rebuild_projection(&mut self) {
        self.projection_matrix = Mat4::perspective_rh_zo(self.fov, self.aspect, self.near, self.far);
    }
}

impl Default for Camera {
    /// Positioned above and behind the origin, looking at the scene center
    /// with a 45 degree field of view and a 0.1 to 1000 depth range.
    fn default() -> Self {
        let mut camera = Self::perspective(Vec3::new(0.0, 3.0, 3.0), 45.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        camera.build_view_matrix();
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_matrix_is_cached_until_rebuilt() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        camera.build_view_matrix();
        let before = *camera.view_matrix();

        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(*camera.view_matrix(), before);

        camera.build_view_matrix();
        assert_ne!(*camera.view_matrix(), before);
    }

    #[test]
    fn test_target_in_front_of_camera_maps_inside_clip_volume() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        camera.build_view_matrix();

        let ndc = utils::project_point(&camera.view_projection_matrix(), &Vec3::zeros());
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_update_projection_ignores_zero_size() {
        let mut camera = Camera::default();
        let before = *camera.projection_matrix();

        camera.update_projection_matrix(0, 600);
        assert_eq!(*camera.projection_matrix(), before);

        camera.update_projection_matrix(800, 800);
        assert_relative_eq!(camera.aspect(), 1.0);
    }
}

//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics and game development.
//!
//! ## Matrix convention
//!
//! Every matrix produced or consumed by the engine follows one convention,
//! regardless of the backend that eventually consumes it:
//!
//! - right-handed world and view space, the camera looks down `-Z`
//! - column vectors (`clip = projection * view * world`)
//! - clip-space depth in `[0, 1]` (near plane maps to 0, far plane to 1)
//!
//! Backends with a different native convention adapt at submission time.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position, rotation and a uniform scale
    pub fn from_position_rotation_scale(position: Vec3, rotation: Quat, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::new(scale, scale, scale),
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math utility functions
pub mod utils {
    use super::{Mat4, Vec3, Vec4};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Translation part of an affine world matrix
    pub fn position_of(matrix: &Mat4) -> Vec3 {
        Vec3::new(matrix.m14, matrix.m24, matrix.m34)
    }

    /// Transform a point by a projective matrix, including the perspective divide
    pub fn project_point(matrix: &Mat4, point: &Vec3) -> Vec3 {
        let clip = matrix * Vec4::new(point.x, point.y, point.z, 1.0);
        clip.xyz() / clip.w
    }
}

/// Extension trait for Mat4 with the engine's projection and view builders
pub trait Mat4Ext {
    /// Perspective projection (right-handed, depth in `[0, 1]`)
    fn perspective_rh_zo(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Orthographic projection (right-handed, depth in `[0, 1]`)
    ///
    /// `near` and `far` are distances along `-Z` in view space and may be negative.
    fn orthographic_rh_zo(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn view_look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective_rh_zo(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let focal = 1.0 / (fov_y * 0.5).tan();
        let mut result = Mat4::zeros();

        result[(0, 0)] = focal / aspect;
        result[(1, 1)] = focal;
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = (near * far) / (near - far);
        result[(3, 2)] = -1.0;

        result
    }

    fn orthographic_rh_zo(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::identity();

        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (top - bottom);
        result[(2, 2)] = 1.0 / (near - far);
        result[(0, 3)] = -(right + left) / (right - left);
        result[(1, 3)] = -(top + bottom) / (top - bottom);
        result[(2, 3)] = near / (near - far);

        result
    }

    fn view_look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

//! View frustum planes and containment tests
//!
//! Planes are extracted from a combined `projection * view` matrix using the
//! Gribb-Hartmann row combinations for `[0, 1]` clip depth. Every plane normal
//! points into the frustum, so a positive signed distance means "inside".

use crate::foundation::math::{utils, Mat4, Vec3, Vec4};
use super::BoundingBox;

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Offset along the normal: `dot(normal, p) + distance == 0` on the plane
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Build a normalized plane from `(a, b, c, d)` coefficients
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length <= f32::EPSILON {
            return Self { normal: Vec3::zeros(), distance: coefficients.w };
        }

        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Indices into [`Frustum::planes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FrustumPlane {
    /// Left clip plane
    Left = 0,
    /// Right clip plane
    Right = 1,
    /// Bottom clip plane
    Bottom = 2,
    /// Top clip plane
    Top = 3,
    /// Near clip plane
    Near = 4,
    /// Far clip plane
    Far = 5,
}

/// Frustum for visibility culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Six planes (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_matrix(&Mat4::identity())
    }
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a `projection * view` matrix
    pub fn from_matrix(view_proj: &Mat4) -> Self {
        let r0 = view_proj.row(0).transpose();
        let r1 = view_proj.row(1).transpose();
        let r2 = view_proj.row(2).transpose();
        let r3 = view_proj.row(3).transpose();

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Access a plane by name
    pub fn plane(&self, plane: FrustumPlane) -> &Plane {
        &self.planes[plane as usize]
    }

    /// Sphere test; rejected only when fully behind one of the planes
    pub fn contains_sphere(&self, center: &Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// Check if a point lies inside every plane
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.contains_sphere(point, 0.0)
    }

    /// Check if a box is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &BoundingBox) -> bool {
        for plane in &self.planes {
            // Corner furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            if plane.distance_to_point(&p) < 0.0 {
                return false;
            }
        }

        true
    }
}

/// Unproject the NDC cube corners at two clip depths into world space
///
/// The first four corners lie at `near_ndc`, the last four at `far_ndc`.
pub fn frustum_corners(inverse_view_proj: &Mat4, near_ndc: f32, far_ndc: f32) -> [Vec3; 8] {
    let ndc = [
        Vec3::new(-1.0, -1.0, near_ndc),
        Vec3::new(1.0, -1.0, near_ndc),
        Vec3::new(1.0, 1.0, near_ndc),
        Vec3::new(-1.0, 1.0, near_ndc),
        Vec3::new(-1.0, -1.0, far_ndc),
        Vec3::new(1.0, -1.0, far_ndc),
        Vec3::new(1.0, 1.0, far_ndc),
        Vec3::new(-1.0, 1.0, far_ndc),
    ];

    ndc.map(|corner| utils::project_point(inverse_view_proj, &corner))
}

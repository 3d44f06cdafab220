//! Bounding volumes and frustum math
//!
//! Leaf module used by every culling path: the main camera list, the shadow
//! cascades and the cascade bounding-box fit.

mod bounding_box;
mod frustum;

pub use bounding_box::BoundingBox;
pub use frustum::{frustum_corners, Frustum, FrustumPlane, Plane};

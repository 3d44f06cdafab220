//! # Cascade Computation
//!
//! Splits the camera frustum into depth slices and fits one orthographic light
//! projection around each slice.
//!
//! For every cascade the slice corners are unprojected from NDC, boxed, moved
//! into light space around the box centre and the box depth is stretched by the
//! scene bounding radius so casters outside the slice still land in the map.
//! NDC depths come from projecting a view-space point through the camera's own
//! projection matrix, so nothing here depends on a matrix layout.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::scene::Camera;
use crate::spatial::{frustum_corners, BoundingBox, Frustum};

/// Maximum number of shadow cascades
pub const MAX_SHADOW_MAPS: u32 = 16;

/// Default blend factor of [`CascadeSplitScheme::Practical`]
pub const DEFAULT_PRACTICAL_LAMBDA: f32 = 0.91;

/// How the camera depth range is divided between cascades
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CascadeSplitScheme {
    /// Boundaries at `(2^i - 1) / (N^2 - 1)`; the last cascade always ends at the far plane
    #[default]
    PowerOfTwo,
    /// Blend of logarithmic and uniform splits; `lambda = 1` is fully logarithmic
    Practical {
        /// Weight of the logarithmic split in `[0, 1]`
        lambda: f32,
    },
}

impl CascadeSplitScheme {
    /// Practical split with the default blend factor
    pub fn practical() -> Self {
        Self::Practical { lambda: DEFAULT_PRACTICAL_LAMBDA }
    }
}

/// Boundaries of `count` cascades as fractions of `[near, far]`
///
/// Returns `count + 1` values, starting at 0 and ending at 1, strictly
/// increasing. `count` is clamped to `1..=MAX_SHADOW_MAPS`; an empty or
/// inverted range falls back to uniform splits. Cascade `i` covers
/// `fractions[i]..fractions[i + 1]`.
pub fn split_fractions(count: u32, scheme: CascadeSplitScheme, near: f32, far: f32) -> Vec<f32> {
    let count = count.clamp(1, MAX_SHADOW_MAPS);
    let mut fractions = Vec::with_capacity(count as usize + 1);
    fractions.push(0.0);

    match scheme {
        CascadeSplitScheme::PowerOfTwo => {
            let squared = (count * count - 1) as f32;
            let doubled = (2f32).powi(count as i32) - 1.0;
            let divisor = squared.max(doubled);
            for i in 1..count {
                fractions.push(((2f32).powi(i as i32) - 1.0) / divisor);
            }
        }
        CascadeSplitScheme::Practical { lambda } => {
            let lambda = lambda.clamp(0.0, 1.0);
            let range = far - near;
            for i in 1..count {
                let p = i as f32 / count as f32;
                if range.is_nan() || range <= 0.0 {
                    fractions.push(p);
                    continue;
                }
                let uniform = near + range * p;
                let split = if near > 0.0 && far > near {
                    let log = near * (far / near).powf(p);
                    lambda * (log - uniform) + uniform
                } else {
                    uniform
                };
                fractions.push((split - near) / range);
            }
        }
    }

    fractions.push(1.0);
    fractions
}

/// NDC depth of a point `view_distance` units in front of the camera
pub fn ndc_depth(projection: &Mat4, view_distance: f32) -> f32 {
    utils::project_point(projection, &Vec3::new(0.0, 0.0, -view_distance)).z
}

/// Light direction in world space turned into a light view looking along the light's travel
///
/// `light_direction` points towards the light.
pub fn light_view_matrix(light_direction: &Vec3) -> Mat4 {
    let forward = -light_direction.normalize();
    let up = if forward.dot(&Vec3::y()).abs() > 0.99 {
        Vec3::z()
    } else {
        Vec3::y()
    };
    Mat4::view_look_at(Vec3::zeros(), forward, up)
}

/// Everything a cascade needs to cull and render
#[derive(Debug, Clone)]
pub struct CascadeFrustum {
    /// Start of the slice as a fraction of the camera depth range
    pub near_fraction: f32,
    /// End of the slice as a fraction of the camera depth range
    pub far_fraction: f32,
    /// View-space distance from the camera to the end of the slice
    pub split_depth: f32,
    /// Light view re-centred on the slice
    pub light_view: Mat4,
    /// Orthographic projection fitted to the slice
    pub light_projection: Mat4,
    /// `light_projection * light_view`
    pub light_view_projection: Mat4,
    /// Culling frustum of the cascade
    pub frustum: Frustum,
    /// World-space point on the light-facing side of the box, used to sort casters
    pub focus_point: Vec3,
    /// Slice bounds in re-centred light space, depth already extended
    pub light_space_bounds: BoundingBox,
}

/// Camera and light state shared by every cascade of one frame
#[derive(Debug, Clone)]
pub struct CascadeSetup {
    inverse_view_projection: Mat4,
    projection: Mat4,
    near: f32,
    far: f32,
    light_view: Mat4,
    scene_bounding_radius: f32,
}

impl CascadeSetup {
    /// Capture the camera matrices; `None` when they cannot be inverted
    pub fn new(camera: &Camera, light_direction: &Vec3, scene_bounding_radius: f32) -> Option<Self> {
        Self::from_matrices(
            camera.view_matrix(),
            camera.projection_matrix(),
            camera.near(),
            camera.far(),
            light_direction,
            scene_bounding_radius,
        )
    }

    /// Same as [`new`](Self::new) from raw matrices
    pub fn from_matrices(
        view: &Mat4,
        projection: &Mat4,
        near: f32,
        far: f32,
        light_direction: &Vec3,
        scene_bounding_radius: f32,
    ) -> Option<Self> {
        let inverse_view_projection = (projection * view).try_inverse()?;
        if light_direction.norm_squared() <= f32::EPSILON {
            return None;
        }

        Some(Self {
            inverse_view_projection,
            projection: *projection,
            near,
            far,
            light_view: light_view_matrix(light_direction),
            scene_bounding_radius: scene_bounding_radius.abs(),
        })
    }

    /// Light view before re-centring
    pub fn light_view(&self) -> &Mat4 {
        &self.light_view
    }

    /// View-space distance at `fraction` of the depth range
    pub fn view_distance(&self, fraction: f32) -> f32 {
        utils::lerp(self.near, self.far, fraction)
    }

    /// Fit the light projection of the slice `near_fraction..far_fraction`
    pub fn compute(&self, near_fraction: f32, far_fraction: f32) -> CascadeFrustum {
        let near_ndc = ndc_depth(&self.projection, self.view_distance(near_fraction));
        let far_ndc = ndc_depth(&self.projection, self.view_distance(far_fraction));

        let corners = frustum_corners(&self.inverse_view_projection, near_ndc, far_ndc);
        let world_bounds = BoundingBox::from_points(corners.iter());
        let centre = world_bounds.center();

        let light_view = self.light_view * Mat4::new_translation(&-centre);
        let mut bounds = world_bounds.transformed(&light_view);
        bounds.min.z = bounds.min.z.min(-self.scene_bounding_radius);
        bounds.max.z = bounds.max.z.max(self.scene_bounding_radius);

        let light_projection = Mat4::orthographic_rh_zo(
            bounds.min.x,
            bounds.max.x,
            bounds.min.y,
            bounds.max.y,
            -bounds.max.z,
            -bounds.min.z,
        );
        let light_view_projection = light_projection * light_view;

        let focus_point = light_view
            .try_inverse()
            .map_or(centre, |inverse| utils::project_point(&inverse, &Vec3::new(0.0, 0.0, bounds.max.z)));

        CascadeFrustum {
            near_fraction,
            far_fraction,
            split_depth: self.view_distance(far_fraction),
            light_view,
            light_projection,
            light_view_projection,
            frustum: Frustum::from_matrix(&light_view_projection),
            focus_point,
            light_space_bounds: bounds,
        }
    }
}

/// Compute every cascade of a frame
pub fn compute_cascades(setup: &CascadeSetup, count: u32, scheme: CascadeSplitScheme) -> Vec<CascadeFrustum> {
    split_fractions(count, scheme, setup.near, setup.far)
        .windows(2)
        .map(|pair| setup.compute(pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_setup(light_direction: Vec3) -> (Camera, CascadeSetup) {
        let mut camera = Camera::perspective(Vec3::new(0.0, 2.0, 10.0), 60.0, 16.0 / 9.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        camera.build_view_matrix();
        let setup = CascadeSetup::new(&camera, &light_direction, 1000.0).expect("invertible camera");
        (camera, setup)
    }

    #[test]
    fn test_power_of_two_splits_for_four_cascades() {
        let fractions = split_fractions(4, CascadeSplitScheme::PowerOfTwo, 0.1, 1000.0);
        let expected = [0.0, 1.0 / 15.0, 3.0 / 15.0, 7.0 / 15.0, 1.0];

        assert_eq!(fractions.len(), expected.len());
        for (actual, expected) in fractions.iter().zip(expected) {
            assert_relative_eq!(*actual, expected);
        }
    }

    #[test]
    fn test_power_of_two_splits_for_three_cascades_end_at_far() {
        let fractions = split_fractions(3, CascadeSplitScheme::PowerOfTwo, 0.1, 1000.0);
        // Not (0, 3/8, 7/8, 1): the last cascade always reaches the far plane
        let expected = [0.0, 1.0 / 8.0, 3.0 / 8.0, 1.0];

        for (actual, expected) in fractions.iter().zip(expected) {
            assert_relative_eq!(*actual, expected);
        }
    }

    #[test]
    fn test_huge_cascade_count_is_capped() {
        let fractions = split_fractions(u32::MAX, CascadeSplitScheme::PowerOfTwo, 0.1, 1000.0);

        assert_eq!(fractions.len(), MAX_SHADOW_MAPS as usize + 1);
        assert!(fractions.iter().all(|fraction| fraction.is_finite()));
    }

    #[test]
    fn test_practical_splits_with_empty_range_are_uniform() {
        let fractions = split_fractions(4, CascadeSplitScheme::practical(), 5.0, 5.0);
        let expected = [0.0, 0.25, 0.5, 0.75, 1.0];

        assert_eq!(fractions.len(), expected.len());
        for (actual, expected) in fractions.iter().zip(expected) {
            assert_relative_eq!(*actual, expected);
        }
    }

    #[test]
    fn test_splits_are_strictly_increasing() {
        let schemes = [CascadeSplitScheme::PowerOfTwo, CascadeSplitScheme::practical()];

        for scheme in schemes {
            for count in 1..=MAX_SHADOW_MAPS {
                let fractions = split_fractions(count, scheme, 0.1, 1000.0);
                assert_eq!(fractions.len(), count as usize + 1);
                assert_relative_eq!(fractions[0], 0.0);
                assert_relative_eq!(fractions[count as usize], 1.0);
                assert!(
                    fractions.windows(2).all(|pair| pair[0] < pair[1]),
                    "{scheme:?} with {count} cascades: {fractions:?}"
                );
            }
        }
    }

    #[test]
    fn test_adjacent_cascades_share_boundaries() {
        let (_, setup) = test_setup(Vec3::new(0.3, 1.0, 0.2));
        let cascades = compute_cascades(&setup, 4, CascadeSplitScheme::PowerOfTwo);

        assert_eq!(cascades.len(), 4);
        for pair in cascades.windows(2) {
            assert_relative_eq!(pair[0].far_fraction, pair[1].near_fraction);
        }
        assert_relative_eq!(cascades[3].split_depth, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_ndc_depth_spans_unit_range() {
        let (camera, _) = test_setup(Vec3::y());
        let projection = camera.projection_matrix();

        assert_relative_eq!(ndc_depth(projection, camera.near()), 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc_depth(projection, camera.far()), 1.0, epsilon = 1e-5);
        assert!(ndc_depth(projection, 1.0) < ndc_depth(projection, 10.0));
    }

    #[test]
    fn test_cascade_frustum_contains_its_slice() {
        let (camera, setup) = test_setup(Vec3::new(-0.4, 1.0, 0.3));
        let cascade = setup.compute(0.0, 0.25);

        let inverse = camera.view_projection_matrix().try_inverse().expect("invertible");
        let near_ndc = ndc_depth(camera.projection_matrix(), setup.view_distance(0.0));
        let far_ndc = ndc_depth(camera.projection_matrix(), setup.view_distance(0.25));

        for corner in frustum_corners(&inverse, near_ndc, far_ndc) {
            assert!(cascade.frustum.contains_sphere(&corner, 0.01), "corner {corner:?} outside cascade");
        }
    }

    #[test]
    fn test_depth_extends_by_scene_radius() {
        let (_, setup) = test_setup(Vec3::new(0.0, 1.0, 0.5));
        let cascade = setup.compute(0.0, 0.1);

        assert!(cascade.light_space_bounds.min.z <= -1000.0);
        assert!(cascade.light_space_bounds.max.z >= 1000.0);
    }

    #[test]
    fn test_focus_point_lies_towards_the_light() {
        let light = Vec3::new(0.0, 1.0, 0.0);
        let (_, setup) = test_setup(light);
        let cascade = setup.compute(0.0, 0.1);

        let slice_centre = utils::project_point(
            &cascade.light_view.try_inverse().expect("invertible"),
            &Vec3::zeros(),
        );
        assert!((cascade.focus_point - slice_centre).dot(&light) > 0.0);
    }

    #[test]
    fn test_vertical_light_uses_fallback_up_axis() {
        let view = light_view_matrix(&Vec3::y());
        assert!(view.iter().all(|value| value.is_finite()));
    }
}

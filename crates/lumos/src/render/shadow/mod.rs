//! Cascaded shadow maps
//!
//! - `cascade`: split schemes and light frustum fitting
//! - `shadow_renderer`: per-cascade culling and depth-array recording

pub mod cascade;
pub mod shadow_renderer;

pub use cascade::{
    compute_cascades, light_view_matrix, ndc_depth, split_fractions, CascadeFrustum, CascadeSetup,
    CascadeSplitScheme, DEFAULT_PRACTICAL_LAMBDA, MAX_SHADOW_MAPS,
};
pub use shadow_renderer::{ShadowCascade, ShadowRenderer, ShadowStats};

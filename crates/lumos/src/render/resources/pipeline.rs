//! Cached graphics pipelines

use bitflags::bitflags;

use crate::hash_combine;
use crate::render::{GpuResource, PipelineHandle, RenderBackend, RenderPassHandle, RenderResult, ShaderHandle};
use super::{CacheKey, CachedResource};

bitflags! {
    /// Fixed-function state toggles
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineFlags: u32 {
        /// Alpha blending
        const TRANSPARENCY = 1 << 0;
        /// Constant and slope-scaled depth bias
        const DEPTH_BIAS = 1 << 1;
        /// Depth testing and writing
        const DEPTH_TEST = 1 << 2;
        /// Line rasterization
        const WIREFRAME = 1 << 3;
    }
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// Draw both faces
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Description of a graphics pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDesc {
    /// Shader program
    pub shader: ShaderHandle,
    /// Render pass the pipeline draws in
    pub render_pass: RenderPassHandle,
    /// Face culling
    pub cull_mode: CullMode,
    /// State toggles
    pub flags: PipelineFlags,
    /// Rasterized line width
    pub line_width: f32,
    /// Constant depth bias, used with [`PipelineFlags::DEPTH_BIAS`]
    pub depth_bias_constant: f32,
    /// Slope-scaled depth bias, used with [`PipelineFlags::DEPTH_BIAS`]
    pub depth_bias_slope: f32,
}

impl PipelineDesc {
    /// Depth-tested, back-face culled pipeline
    pub fn new(shader: ShaderHandle, render_pass: RenderPassHandle) -> Self {
        Self {
            shader,
            render_pass,
            cull_mode: CullMode::Back,
            flags: PipelineFlags::DEPTH_TEST,
            line_width: 1.0,
            depth_bias_constant: 0.0,
            depth_bias_slope: 0.0,
        }
    }

    /// Set the culling mode
    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Add state toggles
    pub fn with_flags(mut self, flags: PipelineFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Enable depth bias with the given factors
    pub fn with_depth_bias(mut self, constant: f32, slope: f32) -> Self {
        self.flags |= PipelineFlags::DEPTH_BIAS;
        self.depth_bias_constant = constant;
        self.depth_bias_slope = slope;
        self
    }
}

impl CacheKey for PipelineDesc {
    fn cache_hash(&self) -> u64 {
        hash_combine!(
            self.shader,
            self.render_pass,
            self.cull_mode,
            self.flags,
            self.line_width.to_bits(),
            self.depth_bias_constant.to_bits(),
            self.depth_bias_slope.to_bits(),
        )
    }
}

/// A pipeline owned by the cache
#[derive(Debug)]
pub struct Pipeline {
    handle: PipelineHandle,
    flags: PipelineFlags,
}

impl Pipeline {
    /// Backend handle
    pub fn handle(&self) -> PipelineHandle {
        self.handle
    }

    /// State toggles the pipeline was built with
    pub fn flags(&self) -> PipelineFlags {
        self.flags
    }
}

impl CachedResource for Pipeline {
    type Desc = PipelineDesc;
    const KIND: &'static str = "pipeline";

    fn create(backend: &mut dyn RenderBackend, desc: &PipelineDesc) -> RenderResult<Self> {
        Ok(Self {
            handle: backend.create_pipeline(desc)?,
            flags: desc.flags,
        })
    }

    fn destroy(&self, backend: &mut dyn RenderBackend) {
        backend.destroy(GpuResource::Pipeline(self.handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_factors_change_the_key() {
        let base = PipelineDesc::new(ShaderHandle(1), RenderPassHandle(2));
        let biased = base.clone().with_depth_bias(1.25, 1.75);
        let nudged = base.clone().with_depth_bias(1.25, 1.750_001);

        assert_eq!(base.cache_hash(), base.clone().cache_hash());
        assert_ne!(base.cache_hash(), biased.cache_hash());
        assert_ne!(biased.cache_hash(), nudged.cache_hash());
    }
}

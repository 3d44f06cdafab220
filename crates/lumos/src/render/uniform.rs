//! CPU-side staging for per-object uniform data
//!
//! Per-object matrices are written into one scratch buffer at
//! `index * stride`, where the stride is the matrix size rounded up to the
//! backend's dynamic offset alignment. The whole buffer is uploaded once per
//! pass and each draw binds its own offset.

use bytemuck::Zeroable;

use crate::foundation::math::{Mat4, Vec3};
use crate::render::{RenderError, RenderResult};

/// Size in bytes of one 4x4 float matrix
pub const MAT4_SIZE: usize = std::mem::size_of::<[[f32; 4]; 4]>();

/// Round `size` up to a multiple of `min_alignment`
///
/// An alignment of zero means "no requirement".
pub fn aligned_stride(size: usize, min_alignment: usize) -> usize {
    if min_alignment == 0 {
        return size;
    }
    size.div_ceil(min_alignment) * min_alignment
}

/// Bounded scratch buffer of aligned per-object matrices
#[derive(Debug, Clone)]
pub struct DynamicUniformScratch {
    data: Vec<u8>,
    stride: usize,
    capacity: usize,
    used: usize,
}

impl DynamicUniformScratch {
    /// Room for `capacity` matrices at the given offset alignment
    pub fn new(capacity: usize, min_alignment: usize) -> Self {
        let stride = aligned_stride(MAT4_SIZE, min_alignment);
        Self {
            data: vec![0; capacity * stride],
            stride,
            capacity,
            used: 0,
        }
    }

    /// Write `matrix` into slot `index` and return its byte offset
    ///
    /// Fails with [`RenderError::ResourceExhausted`] when `index` is past the
    /// capacity; nothing is written in that case.
    pub fn write_matrix(&mut self, index: usize, matrix: &Mat4) -> RenderResult<u32> {
        if index >= self.capacity {
            return Err(RenderError::ResourceExhausted(format!(
                "dynamic uniform slot {index} exceeds capacity {}",
                self.capacity
            )));
        }

        let offset = index * self.stride;
        let offset_u32 = u32::try_from(offset)
            .map_err(|_| RenderError::ResourceExhausted(format!("dynamic uniform offset {offset} overflows u32")))?;

        self.data[offset..offset + MAT4_SIZE].copy_from_slice(bytemuck::cast_slice(matrix.as_slice()));
        self.used = self.used.max(index + 1);

        Ok(offset_u32)
    }

    /// Forget the written slots; the bytes are overwritten on the next pass
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Bytes covering every slot written since the last reset
    pub fn used_bytes(&self) -> &[u8] {
        &self.data[..self.used * self.stride]
    }

    /// Whole buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes between consecutive slots
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Lighting pass data: the directional light and every shadow cascade
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniformData {
    /// Direction towards the light (xyz) and intensity (w)
    pub light_direction: [f32; 4],
    /// Light color (rgb)
    pub light_color: [f32; 4],
    /// Camera position in world space (xyz)
    pub camera_position: [f32; 4],
    /// Light view-projection of each cascade, column-major
    pub shadow_proj_view: [[f32; 16]; MAX_SHADOW_CASCADES],
    /// View-space far distance of each cascade
    pub split_depths: [f32; MAX_SHADOW_CASCADES],
    /// Texel size of one shadow map layer (x, y) and active cascade count (z)
    pub shadow_params: [f32; 4],
}

const MAX_SHADOW_CASCADES: usize = crate::render::shadow::MAX_SHADOW_MAPS as usize;

impl LightUniformData {
    /// Pack the light, the camera position and the shadow cascades
    pub fn new(
        light_direction: &Vec3,
        light_color: &Vec3,
        intensity: f32,
        camera_position: &Vec3,
        shadow_proj_view: &[Mat4],
        split_depths: &[f32],
        shadow_map_size: u32,
    ) -> Self {
        let mut data = Self::zeroed();
        data.light_direction = [light_direction.x, light_direction.y, light_direction.z, intensity];
        data.light_color = [light_color.x, light_color.y, light_color.z, 1.0];
        data.camera_position = [camera_position.x, camera_position.y, camera_position.z, 1.0];

        for (slot, matrix) in data.shadow_proj_view.iter_mut().zip(shadow_proj_view) {
            slot.copy_from_slice(matrix.as_slice());
        }
        for (slot, depth) in data.split_depths.iter_mut().zip(split_depths) {
            *slot = *depth;
        }

        #[allow(clippy::cast_precision_loss)]
        let cascades = shadow_proj_view.len().min(MAX_SHADOW_CASCADES) as f32;
        let texel = 1.0 / shadow_map_size.max(1) as f32;
        data.shadow_params = [texel, texel, cascades, 0.0];

        data
    }
}

//! Texture descriptions

/// Pixel format of a texture or attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA
    Rgba8,
    /// 16-bit float RGBA
    Rgba16F,
    /// 32-bit float RGBA
    Rgba32F,
    /// 32-bit float depth
    Depth32F,
}

/// How a texture is bound as an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Single-layer color target
    Color,
    /// Single-layer depth target
    Depth,
    /// Layered depth target; framebuffers select one layer each
    DepthArray,
    /// The swapchain image
    Swapchain,
}

/// Parameters of a texture created by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of array layers
    pub layers: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Attachment role
    pub kind: TextureKind,
}

impl TextureDesc {
    /// Single-layer color texture
    pub fn color(width: u32, height: u32, format: TextureFormat) -> Self {
        Self { width, height, layers: 1, format, kind: TextureKind::Color }
    }

    /// Single-layer depth texture
    pub fn depth(width: u32, height: u32) -> Self {
        Self { width, height, layers: 1, format: TextureFormat::Depth32F, kind: TextureKind::Depth }
    }

    /// Square depth array with `layers` layers
    pub fn depth_array(size: u32, layers: u32) -> Self {
        Self {
            width: size,
            height: size,
            layers,
            format: TextureFormat::Depth32F,
            kind: TextureKind::DepthArray,
        }
    }
}

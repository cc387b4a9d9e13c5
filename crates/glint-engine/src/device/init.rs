/// Initialization parameters for the headless GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub power_preference: wgpu::PowerPreference,

    /// Forces the software adapter (useful on CI machines without a GPU).
    pub force_fallback_adapter: bool,

    /// Color format of offscreen targets.
    ///
    /// Linear `Rgba8Unorm` keeps GPU output byte-comparable with the CPU
    /// rasterizer, which does no sRGB encoding.
    pub target_format: wgpu::TextureFormat,

    /// Required wgpu features. Empty for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    ///
    /// The default texture arrays need 2048² layers and up to 32 array layers,
    /// both inside `downlevel_defaults`.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            target_format: wgpu::TextureFormat::Rgba8Unorm,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
        }
    }
}

use glam::Mat4;

use crate::coords::Viewport;
use crate::shading::view_matrix;

/// Renderer-facing context: device/queue, target format, viewport, zoom and
/// the effect clock value for this frame.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub target_format: wgpu::TextureFormat,
    pub viewport: Viewport, // logical px
    pub zoom: f32,
    /// Effect time `t` fed to every shader.
    pub t: f32,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        target_format: wgpu::TextureFormat,
        viewport: Viewport,
    ) -> Self {
        Self {
            device,
            queue,
            target_format,
            viewport,
            zoom: 1.0,
            t: 0.0,
        }
    }

    #[inline]
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    #[inline]
    pub fn with_time(mut self, t: f32) -> Self {
        self.t = t;
        self
    }

    /// The `view` uniform: logical px to clip space.
    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        view_matrix(self.viewport, self.zoom)
    }
}

/// Target for drawing (encoder + color view).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }
}

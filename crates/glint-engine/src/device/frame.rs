/// Commands recorded for one offscreen frame.
///
/// Short-lived: record into `encoder`, then hand back to [`Gpu::submit`](super::Gpu::submit).
pub struct GpuFrame {
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

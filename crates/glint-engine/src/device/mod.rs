//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - offscreen color targets and their CPU readback

mod frame;
mod gpu;
mod init;
mod offscreen;

pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use offscreen::OffscreenTarget;

//! glint engine crate.
//!
//! 2D sprite effect shading: WGSL pipelines for the sprite batch, its
//! ten-unit fallback and the single-texture post filter, together with a CPU
//! reference of the same shading rules (`shading`) that tests and the
//! software rasterizer run directly.

pub mod coords;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod shading;
pub mod storage;
pub mod text;
pub mod time;

//! GPU rendering subsystem.
//!
//! Renderers consume sprite instances (see `scene`) and issue GPU commands via
//! wgpu. Each renderer owns its GPU resources (pipelines, buffers, bind groups)
//! and creates them lazily on first use.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - The vertex shaders convert to clip space with a `view` uniform.

mod ctx;
pub mod sprites;
mod texture_array;

pub use ctx::{RenderCtx, RenderTarget};
pub use sprites::{MultiTextureRenderer, PostFilterRenderer, SpriteBatchRenderer, SpriteTextures};
pub use texture_array::{GpuTexture, GpuTextureArray, GpuTextureUnits};

//! Sprite renderers: the instanced sprite batch, its ten-unit fallback and the
//! single-texture post filter.
//!
//! All three share the unit quad, the straight-alpha blend state and
//! `LoadOp::Load` passes, so they can be layered on one target in any order.

mod batch;
mod common;
mod multi_texture;
mod post_filter;

pub use batch::{SpriteBatchRenderer, SpriteTextures};
pub use multi_texture::MultiTextureRenderer;
pub use post_filter::PostFilterRenderer;

//! CPU reference of the sprite shading rules.
//!
//! Every WGSL entry point in `render::sprites` has a counterpart here written as
//! plain functions over [`Rgba`] and [`glam`] vectors. The software rasterizer
//! in [`raster`] drives these functions directly.
//!
//! Convention:
//! - Colors are straight alpha; [`Rgba::blend`] is the only compositing rule.
//! - Texture space is `[0,1]²`, origin top-left, +Y down.

pub mod effects;
pub mod neighbors;
pub mod post_filter;
pub mod raster;
pub mod sources;
pub mod stages;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use crate::paint::Rgba;
pub use effects::{EffectFlags, PostEffect, SpriteKind};
pub use neighbors::{NeighborReduction, reduce_neighbors};
pub use post_filter::{OutlinePolicy, PostFilterUniforms, shade_post_filter};
pub use raster::Framebuffer;
pub use sources::{ArrayTextures, TextureSource, TextureUnits};
pub use stages::{FragmentInput, Stage, plan, shade_sprite};
pub use texture::{AddressMode, Texture, TextureArray, TextureError, TextureFormat};
pub use vertex::{SpriteInstance, VertexOutput, transform_vertex, view_matrix};

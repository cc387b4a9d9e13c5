//! Sprite scene: high-level sprite descriptions and the per-frame draw list.
//!
//! Responsibilities:
//! - turn [`Sprite`] descriptions into [`SpriteInstance`](crate::shading::SpriteInstance) attributes
//! - keep deterministic paint order (z-index, then push order)
//! - reject instances the shaders cannot interpret

mod key;
mod list;
mod sprite;
mod z_index;

pub use key::SortKey;
pub use list::{SpriteItem, SpriteList};
pub use sprite::{Flip, Origin, SceneError, Sprite, SpriteSource};
pub use z_index::ZIndex;

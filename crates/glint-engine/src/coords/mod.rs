//! Coordinate and geometry types shared across the scene and the renderers.
//!
//! Canonical CPU space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The `view` matrix maps this space to clip space (see `shading::vertex::view_matrix`).

mod rect;
mod viewport;

pub use glam::Vec2;
pub use rect::Rect;
pub use viewport::Viewport;

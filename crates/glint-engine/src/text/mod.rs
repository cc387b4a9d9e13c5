//! Text as glyph sprites: fonts (fontdue) and a grayscale glyph atlas.

mod atlas;
mod font_system;

pub use atlas::{GlyphAtlas, Text};
pub use font_system::{FontId, FontLoadError, FontSystem};

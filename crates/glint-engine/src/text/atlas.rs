use std::collections::HashMap;

use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle};
use glam::{Vec2, Vec3};

use crate::coords::Rect;
use crate::scene::Sprite;
use crate::shading::{EffectFlags, TextureArray, TextureError};

use super::{FontId, FontSystem};

const GLYPH_PADDING: u32 = 1; // pixels between glyphs in the atlas

/// A string to lay out as glyph sprites.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub font: FontId,
    pub text: String,
    /// Pixel size.
    pub size: f32,
    /// Top-left of the layout box (logical px).
    pub position: Vec2,
    pub max_width: Option<f32>,
    pub effect: EffectFlags,
    pub effect_color: Vec3,
    pub secondary_layer: u32,
}

impl Text {
    pub fn new(font: FontId, text: impl Into<String>, size: f32) -> Self {
        Self {
            font,
            text: text.into(),
            size,
            position: Vec2::ZERO,
            max_width: None,
            effect: EffectFlags::NONE,
            effect_color: Vec3::ONE,
            secondary_layer: 0,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }
}

/// Glyph cache backed by one layer of a grayscale [`TextureArray`].
///
/// Glyphs are rasterized on first use and shelf-packed left to right, top to
/// bottom, with one pixel of padding. The cache key is fontdue's
/// `GlyphRasterConfig` (font hash, glyph index, pixel size). Once the layer is
/// full new glyphs are dropped with a single warning.
pub struct GlyphAtlas {
    layer: u32,
    size: (u32, u32),
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    full: bool,
    cache: HashMap<GlyphRasterConfig, Rect>,
    layout: Layout<()>,
}

impl GlyphAtlas {
    /// Allocates a full-size empty layer in `gray` for the atlas.
    pub fn new(gray: &mut TextureArray) -> Result<Self, TextureError> {
        let (w, h) = gray.layer_size();
        let layer = gray.add_empty_layer(w, h)?;
        Ok(Self {
            layer,
            size: (w, h),
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
            full: false,
            cache: HashMap::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        })
    }

    /// Grayscale layer holding the glyphs.
    #[inline]
    pub fn layer(&self) -> u32 {
        self.layer
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    #[inline]
    pub fn cached_glyphs(&self) -> usize {
        self.cache.len()
    }

    /// Lays `text` out into glyph sprites (`kind = 1`) positioned in logical
    /// px. Whitespace and glyphs that do not fit in the atlas produce no sprite.
    pub fn layout_text(&mut self, fonts: &FontSystem, gray: &mut TextureArray, text: &Text) -> Vec<Sprite> {
        let Some(font) = fonts.get(text.font) else {
            log::warn!("GlyphAtlas: unknown FontId {:?}, skipping", text.font);
            return Vec::new();
        };

        self.layout.reset(&LayoutSettings {
            x: text.position.x,
            y: text.position.y,
            max_width: text.max_width,
            ..LayoutSettings::default()
        });
        self.layout.append(&[font], &TextStyle::new(&text.text, text.size, 0));

        // Snapshot so the borrow on `self.layout` ends before `self.glyph`.
        let placed: Vec<(GlyphRasterConfig, f32, f32)> = self
            .layout
            .glyphs()
            .iter()
            .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
            .map(|g| (g.key, g.x, g.y))
            .collect();

        placed
            .into_iter()
            .filter_map(|(key, x, y)| {
                let rect = self.glyph(font, gray, key)?;
                let mut sprite = Sprite::glyph(self.layer, rect).at(x, y);
                sprite.effect = text.effect;
                sprite.effect_color = text.effect_color;
                sprite.secondary_layer = text.secondary_layer;
                Some(sprite)
            })
            .collect()
    }

    /// Atlas rect (texels) of a glyph, rasterizing and uploading it on first use.
    fn glyph(&mut self, font: &fontdue::Font, gray: &mut TextureArray, key: GlyphRasterConfig) -> Option<Rect> {
        if let Some(rect) = self.cache.get(&key) {
            return Some(*rect);
        }
        let (metrics, bitmap) = font.rasterize_config(key);
        if metrics.width == 0 || metrics.height == 0 {
            return None;
        }
        let rect = self.place(gray, &bitmap, metrics.width as u32, metrics.height as u32)?;
        self.cache.insert(key, rect);
        Some(rect)
    }

    /// Reserves a shelf slot and writes `bitmap` (one byte per texel) into it.
    fn place(&mut self, gray: &mut TextureArray, bitmap: &[u8], w: u32, h: u32) -> Option<Rect> {
        if self.full {
            return None;
        }
        let (atlas_w, atlas_h) = self.size;

        // New shelf when the glyph doesn't fit horizontally.
        if self.cursor_x + w + GLYPH_PADDING > atlas_w {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = GLYPH_PADDING;
            self.row_height = 0;
        }
        if self.cursor_x + w + GLYPH_PADDING > atlas_w || self.cursor_y + h + GLYPH_PADDING > atlas_h {
            log::warn!("GlyphAtlas: layer {} is full ({atlas_w}×{atlas_h}); new glyphs will be skipped", self.layer);
            self.full = true;
            return None;
        }

        let (x, y) = (self.cursor_x, self.cursor_y);
        if let Err(e) = gray.update_layer(self.layer, x, y, w, h, bitmap) {
            log::warn!("GlyphAtlas: failed to upload glyph: {e}");
            return None;
        }
        self.cursor_x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some(Rect::new(x as f32, y as f32, w as f32, h as f32))
    }
}

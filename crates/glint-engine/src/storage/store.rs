use std::path::Path;

use glam::Vec2;
use thiserror::Error;

use crate::scene::{SceneError, Sprite, SpriteList, ZIndex};
use crate::shading::{ArrayTextures, SpriteInstance, SpriteKind, TextureArray, TextureError, TextureFormat};
use crate::text::GlyphAtlas;

use super::noise::{NoiseConfig, generate_noise};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Array dimensions. Defaults: RGBA 1024² × 32 layers, grayscale 2048² × 16.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureStoreConfig {
    pub rgba_layer_size: u32,
    pub rgba_layers: u32,
    pub gray_layer_size: u32,
    pub gray_layers: u32,
}

impl Default for TextureStoreConfig {
    fn default() -> Self {
        Self {
            rgba_layer_size: 1024,
            rgba_layers: 32,
            gray_layer_size: 2048,
            gray_layers: 16,
        }
    }
}

/// Owner of the two CPU texture arrays sampled by the sprite batch.
///
/// RGBA holds images and noise layers; grayscale holds glyph atlases.
#[derive(Debug, Clone)]
pub struct TextureStore {
    rgba: TextureArray,
    gray: TextureArray,
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new(TextureStoreConfig::default())
    }
}

impl TextureStore {
    pub fn new(config: TextureStoreConfig) -> Self {
        Self {
            rgba: TextureArray::new(config.rgba_layer_size, config.rgba_layer_size, config.rgba_layers, TextureFormat::Rgba8),
            gray: TextureArray::new(config.gray_layer_size, config.gray_layer_size, config.gray_layers, TextureFormat::R8),
        }
    }

    #[inline]
    pub fn rgba(&self) -> &TextureArray {
        &self.rgba
    }

    #[inline]
    pub fn gray(&self) -> &TextureArray {
        &self.gray
    }

    #[inline]
    pub fn gray_mut(&mut self) -> &mut TextureArray {
        &mut self.gray
    }

    /// Both arrays as the sprite shader sees them.
    #[inline]
    pub fn textures(&self) -> ArrayTextures<'_> {
        ArrayTextures::new(&self.rgba, &self.gray)
    }

    // ── loading ────────────────────────────────────────────────────────────

    /// Adds raw RGBA8 texels as a new layer.
    pub fn add_rgba(&mut self, bytes: &[u8], width: u32, height: u32) -> Result<u32, StoreError> {
        let layer = self.rgba.add_layer(bytes, width, height).inspect_err(|e| {
            if matches!(e, TextureError::ArrayFull { .. }) {
                log::warn!("TextureStore: RGBA array is full");
            }
        })?;
        log::debug!("TextureStore: {width}x{height} image -> RGBA layer {layer}");
        Ok(layer)
    }

    /// Decodes an encoded image (format sniffed unless given), converting to
    /// RGBA8 whatever the source layout.
    pub fn load_image_bytes(&mut self, bytes: &[u8], format: Option<image::ImageFormat>) -> Result<u32, StoreError> {
        let img = match format {
            Some(format) => image::load_from_memory_with_format(bytes, format)?,
            None => image::load_from_memory(bytes)?,
        };
        self.add_image(img.to_rgba8())
    }

    pub fn load_image_file(&mut self, path: impl AsRef<Path>) -> Result<u32, StoreError> {
        let img = image::open(path.as_ref())?;
        self.add_image(img.to_rgba8())
    }

    pub fn add_image(&mut self, img: image::RgbaImage) -> Result<u32, StoreError> {
        let (w, h) = img.dimensions();
        self.add_rgba(img.as_raw(), w, h)
    }

    /// Generates a noise layer in the RGBA array; pass its index as the
    /// sprite's noise layer.
    ///
    /// The noise fills the whole layer and repeats with the layer's period, so
    /// the scrolling lookup never leaves it. `config.size` (clamped to the
    /// layer) is only the extent a sprite of this layer shows.
    pub fn add_noise_layer(&mut self, config: &NoiseConfig) -> Result<u32, StoreError> {
        let (w, h) = self.rgba.layer_size();
        if w != h {
            log::warn!("TextureStore: {w}x{h} RGBA layers are not square; noise repeats only over {w}x{w}");
        }
        let field = generate_noise(&NoiseConfig { size: w, ..*config });
        let data: Vec<u8> = (0..h as usize)
            .flat_map(|y| {
                let row = (y % w as usize) * w as usize * 4;
                &field[row..row + w as usize * 4]
            })
            .copied()
            .collect();

        let size = config.size.clamp(1, w.min(h));
        let layer = self.rgba.add_full_layer(&data, size, size).inspect_err(|e| {
            if matches!(e, TextureError::ArrayFull { .. }) {
                log::warn!("TextureStore: RGBA array is full");
            }
        })?;
        log::debug!("TextureStore: {w}x{h} noise (cell {}) -> RGBA layer {layer}", config.cell);
        Ok(layer)
    }

    /// Allocates a grayscale layer for a new glyph atlas.
    pub fn add_glyph_atlas(&mut self) -> Result<GlyphAtlas, StoreError> {
        GlyphAtlas::new(&mut self.gray).map_err(|e| {
            if matches!(e, TextureError::ArrayFull { .. }) {
                log::warn!("TextureStore: grayscale array is full");
            }
            e.into()
        })
    }

    // ── sprites ────────────────────────────────────────────────────────────

    /// Extent of the image stored in an RGBA layer.
    pub fn image_size(&self, layer: u32) -> Option<Vec2> {
        self.rgba.stats(layer).map(|s| Vec2::new(s.width as f32, s.height as f32))
    }

    /// A sprite showing the whole image in `layer`.
    pub fn sprite(&self, layer: u32) -> Option<Sprite> {
        self.image_size(layer).map(|size| Sprite::texture(layer, size))
    }

    /// Layer extent used to normalize crops for `kind`.
    pub fn layer_size(&self, kind: SpriteKind) -> Vec2 {
        let (w, h) = match kind {
            SpriteKind::Glyph => self.gray.layer_size(),
            SpriteKind::Textured | SpriteKind::Solid => self.rgba.layer_size(),
        };
        Vec2::new(w as f32, h as f32)
    }

    pub fn instance(&self, sprite: &Sprite) -> Result<SpriteInstance, SceneError> {
        sprite.to_instance(self.layer_size(sprite.kind()))
    }

    /// Converts `sprite` against the right array and records it.
    pub fn push(&self, list: &mut SpriteList, z: ZIndex, sprite: &Sprite) -> Result<(), SceneError> {
        list.push(z, self.instance(sprite)?)
    }
}

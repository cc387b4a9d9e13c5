use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::coords::Rect;
use crate::shading::{EffectFlags, SpriteInstance, SpriteKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("unknown sprite kind {kind}")]
    UnknownKind { kind: u32 },

    #[error("crop {crop:?} is empty or outside the {size:?} source")]
    InvalidCrop { crop: Rect, size: Vec2 },

    #[error("sprite transform is not finite")]
    NonFinite,
}

/// Anchor point, relative to the sprite's top-left corner, in source texels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Origin {
    TopLeft(f32, f32),
    Center,
}

impl Default for Origin {
    fn default() -> Self {
        Origin::TopLeft(0.0, 0.0)
    }
}

impl Origin {
    #[inline]
    pub fn resolve(self, size: Vec2) -> Vec2 {
        match self {
            Origin::TopLeft(x, y) => Vec2::new(x, y),
            Origin::Center => size * 0.5,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    #[inline]
    pub const fn horizontal(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    #[inline]
    pub const fn vertical(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }
}

/// What a sprite samples.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SpriteSource {
    /// An image in the RGBA array. `size` is the image's extent inside its
    /// layer; `crop` (texels) defaults to the whole image.
    Texture { layer: u32, size: Vec2, crop: Option<Rect> },
    /// A glyph region of a grayscale atlas layer (texels).
    Glyph { layer: u32, atlas_rect: Rect },
    /// An untextured rectangle filled with the effect color.
    Solid { size: Vec2 },
}

impl SpriteSource {
    pub fn kind(&self) -> SpriteKind {
        match self {
            SpriteSource::Texture { .. } => SpriteKind::Textured,
            SpriteSource::Glyph { .. } => SpriteKind::Glyph,
            SpriteSource::Solid { .. } => SpriteKind::Solid,
        }
    }

    /// Texel region drawn, validated against the source extent.
    fn region(&self) -> Result<Rect, SceneError> {
        match *self {
            SpriteSource::Texture { size, crop, .. } => {
                let crop = crop.unwrap_or(Rect::new(0.0, 0.0, size.x, size.y));
                let whole = Rect::new(0.0, 0.0, size.x, size.y);
                let inside = crop.min().cmpge(whole.min()).all() && crop.max().cmple(whole.max()).all();
                if crop.is_empty() || !inside {
                    return Err(SceneError::InvalidCrop { crop, size });
                }
                Ok(crop)
            }
            SpriteSource::Glyph { atlas_rect, .. } => {
                if atlas_rect.is_empty() {
                    return Err(SceneError::InvalidCrop { crop: atlas_rect, size: atlas_rect.size });
                }
                Ok(atlas_rect)
            }
            SpriteSource::Solid { size } => {
                let r = Rect::new(0.0, 0.0, size.x, size.y);
                if r.is_empty() {
                    return Err(SceneError::InvalidCrop { crop: r, size });
                }
                Ok(r)
            }
        }
    }

    fn layer(&self) -> u32 {
        match *self {
            SpriteSource::Texture { layer, .. } | SpriteSource::Glyph { layer, .. } => layer,
            SpriteSource::Solid { .. } => 0,
        }
    }
}

/// High-level sprite description, converted to a [`SpriteInstance`] for drawing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    pub source: SpriteSource,
    /// Draw position (logical px) of `origin`.
    pub position: Vec2,
    pub origin: Origin,
    /// Degrees, clockwise on screen, about the given point of the sprite.
    pub rotation: Option<(f32, Origin)>,
    pub scale: f32,
    pub flip: Flip,
    pub effect: EffectFlags,
    /// Fill for solid sprites, tint target for the noise effect.
    pub effect_color: Vec3,
    /// Noise layer in the RGBA array.
    pub secondary_layer: u32,
}

impl Sprite {
    pub fn new(source: SpriteSource) -> Self {
        Self {
            source,
            position: Vec2::ZERO,
            origin: Origin::default(),
            rotation: None,
            scale: 1.0,
            flip: Flip::None,
            effect: EffectFlags::NONE,
            effect_color: Vec3::ZERO,
            secondary_layer: 0,
        }
    }

    pub fn texture(layer: u32, size: Vec2) -> Self {
        Self::new(SpriteSource::Texture { layer, size, crop: None })
    }

    pub fn glyph(layer: u32, atlas_rect: Rect) -> Self {
        Self::new(SpriteSource::Glyph { layer, atlas_rect })
    }

    pub fn solid(size: Vec2, color: Vec3) -> Self {
        Self { effect_color: color, ..Self::new(SpriteSource::Solid { size }) }
    }

    // ── builder ───────────────────────────────────────────────────────────

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Crops a texture source (texels). Ignored for other sources.
    pub fn cropped(mut self, rect: Rect) -> Self {
        if let SpriteSource::Texture { crop, .. } = &mut self.source {
            *crop = Some(rect);
        }
        self
    }

    pub fn rotated(mut self, degrees: f32, about: Origin) -> Self {
        self.rotation = Some((degrees, about));
        self
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn flipped(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    pub fn with_effect(mut self, effect: EffectFlags) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_effect_color(mut self, color: Vec3) -> Self {
        self.effect_color = color;
        self
    }

    pub fn with_noise_layer(mut self, layer: u32) -> Self {
        self.secondary_layer = layer;
        self
    }

    #[inline]
    pub fn kind(&self) -> SpriteKind {
        self.source.kind()
    }

    /// Builds the instance attributes.
    ///
    /// `layer_size` is the extent of one layer of the array the source lives
    /// in; crops are normalized against it. The drawn region is placed so that
    /// `origin` lands on `position`, scaled by `scale`, and rotated about the
    /// rotation origin.
    pub fn to_instance(&self, layer_size: Vec2) -> Result<SpriteInstance, SceneError> {
        let region = self.source.region()?;
        let size = region.size;

        let crop = match self.source {
            SpriteSource::Solid { .. } => Rect::new(0.0, 0.0, 1.0, 1.0),
            _ => region.normalize_to(layer_size),
        };
        let crop = crop.flipped(self.flip.horizontal(), self.flip.vertical());

        let translation = self.position - self.origin.resolve(size) * self.scale;
        let (rotation, pivot) = match self.rotation {
            Some((degrees, about)) => (degrees, about.resolve(size) * self.scale),
            None => (0.0, Vec2::ZERO),
        };

        let inst = SpriteInstance {
            crop: crop.to_array(),
            translation: translation.to_array(),
            scale: (size * self.scale).to_array(),
            pivot: pivot.to_array(),
            rotation,
            kind: self.kind().raw(),
            layer: self.source.layer(),
            secondary_layer: self.secondary_layer,
            effect: self.effect.bits(),
            effect_color: self.effect_color.to_array(),
        };
        let finite = inst.crop.iter().chain(&inst.translation).chain(&inst.scale).chain(&inst.pivot).all(|v| v.is_finite())
            && inst.rotation.is_finite();
        if !finite {
            return Err(SceneError::NonFinite);
        }
        Ok(inst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYER: Vec2 = Vec2::new(1024.0, 1024.0);

    #[test]
    fn texture_sprite_covers_its_image() {
        let inst = Sprite::texture(3, Vec2::new(64.0, 32.0)).at(10.0, 20.0).to_instance(LAYER).unwrap();
        assert_eq!(inst.translation, [10.0, 20.0]);
        assert_eq!(inst.scale, [64.0, 32.0]);
        assert_eq!(inst.crop, [0.0, 0.0, 64.0 / 1024.0, 32.0 / 1024.0]);
        assert_eq!(inst.layer, 3);
        assert_eq!(inst.kind, SpriteKind::Textured.raw());
    }

    #[test]
    fn origin_and_scale_shift_translation() {
        let inst = Sprite::texture(0, Vec2::new(64.0, 32.0))
            .at(100.0, 100.0)
            .with_origin(Origin::Center)
            .scaled(2.0)
            .to_instance(LAYER)
            .unwrap();
        assert_eq!(inst.translation, [100.0 - 64.0, 100.0 - 32.0]);
        assert_eq!(inst.scale, [128.0, 64.0]);
    }

    #[test]
    fn rotation_pivot_is_scaled() {
        let inst = Sprite::texture(0, Vec2::new(10.0, 10.0))
            .scaled(3.0)
            .rotated(90.0, Origin::Center)
            .to_instance(LAYER)
            .unwrap();
        assert_eq!(inst.rotation, 90.0);
        assert_eq!(inst.pivot, [15.0, 15.0]);
    }

    #[test]
    fn crop_selects_and_normalizes_region() {
        let inst = Sprite::texture(0, Vec2::new(256.0, 256.0))
            .cropped(Rect::new(128.0, 0.0, 64.0, 64.0))
            .to_instance(Vec2::splat(256.0))
            .unwrap();
        assert_eq!(inst.crop, [0.5, 0.0, 0.25, 0.25]);
        assert_eq!(inst.scale, [64.0, 64.0]);
    }

    #[test]
    fn flip_negates_crop_extent() {
        let inst = Sprite::texture(0, Vec2::new(256.0, 256.0))
            .flipped(Flip::Both)
            .to_instance(Vec2::splat(256.0))
            .unwrap();
        assert_eq!(inst.crop, [1.0, 1.0, -1.0, -1.0]);
        assert_eq!(inst.tex_coords(Vec2::ZERO), Vec2::ONE);
    }

    #[test]
    fn crop_outside_image_is_rejected() {
        let err = Sprite::texture(0, Vec2::new(32.0, 32.0))
            .cropped(Rect::new(16.0, 16.0, 32.0, 8.0))
            .to_instance(LAYER)
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidCrop { .. }));
    }

    #[test]
    fn solid_sprite_uses_full_crop_and_fill_color() {
        let inst = Sprite::solid(Vec2::new(5.0, 6.0), Vec3::X).to_instance(LAYER).unwrap();
        assert_eq!(inst.crop, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(inst.kind, SpriteKind::Solid.raw());
        assert_eq!(inst.effect_color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn glyph_sprite_samples_atlas_rect() {
        let inst = Sprite::glyph(1, Rect::new(1024.0, 0.0, 16.0, 8.0))
            .to_instance(Vec2::splat(2048.0))
            .unwrap();
        assert_eq!(inst.crop, [0.5, 0.0, 16.0 / 2048.0, 8.0 / 2048.0]);
        assert_eq!(inst.kind, SpriteKind::Glyph.raw());
    }

    #[test]
    fn nan_position_is_rejected() {
        let err = Sprite::solid(Vec2::ONE, Vec3::ONE).at(f32::NAN, 0.0).to_instance(LAYER).unwrap_err();
        assert_eq!(err, SceneError::NonFinite);
    }
}

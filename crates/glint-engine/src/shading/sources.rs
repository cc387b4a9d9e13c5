//! Texture bindings seen by the sprite fragment stages.
//!
//! The sprite batch binds two 2D-array textures; backends without array support
//! bind ten discrete units instead. Both are expressed through [`TextureSource`]
//! so [`shade_sprite`](super::shade_sprite) runs unchanged on either.

use glam::Vec2;

use crate::paint::Rgba;

use super::effects::{self, PostEffect, SpriteKind};
use super::post_filter::OutlinePolicy;
use super::texture::{Texture, TextureArray};

/// Border offset for grayscale (glyph) layers: one texel of a 2048² layer.
pub const GRAY_BORDER_THICKNESS: f32 = 1.0 / 2048.0;
/// Border offset for RGBA layers: one texel of a 1024² layer.
pub const RGBA_BORDER_THICKNESS: f32 = 1.0 / 1024.0;

/// Number of discrete units in the multi-texture variant (`texture0..texture9`).
pub const TEXTURE_UNITS: usize = 10;

pub trait TextureSource {
    /// Color surface sample for `kind = 0`.
    fn sample_rgba(&self, layer: u32, uv: Vec2) -> Rgba;

    /// Coverage sample for `kind = 1`: white RGB, alpha from the red channel.
    fn sample_gray(&self, layer: u32, uv: Vec2) -> Rgba;

    /// Noise sample used by the noise stage.
    fn sample_noise(&self, layer: u32, uv: Vec2) -> Rgba;

    /// Per-axis neighbor offset used by the border stage for `kind`.
    fn border_thickness(&self, kind: SpriteKind) -> Vec2;

    /// Color composed beneath the sprite by the border stage. `None` disables it.
    fn border_color(&self) -> Option<Rgba>;

    /// Neighbor reduction used by the border stage.
    fn outline_policy(&self) -> OutlinePolicy {
        OutlinePolicy::MaxAlpha
    }

    /// Effect code applied to a textured sprite's sampled color.
    fn post_effect(&self, texel: Rgba, _uv: Vec2, _t: f32) -> Rgba {
        texel
    }
}

/// The sprite batch bindings: `texture_rgba` + `texture_gray`.
#[derive(Debug, Copy, Clone)]
pub struct ArrayTextures<'a> {
    pub rgba: &'a TextureArray,
    pub gray: &'a TextureArray,
}

impl<'a> ArrayTextures<'a> {
    pub fn new(rgba: &'a TextureArray, gray: &'a TextureArray) -> Self {
        Self { rgba, gray }
    }
}

impl TextureSource for ArrayTextures<'_> {
    fn sample_rgba(&self, layer: u32, uv: Vec2) -> Rgba {
        self.rgba.sample(layer, uv)
    }

    fn sample_gray(&self, layer: u32, uv: Vec2) -> Rgba {
        self.gray.sample(layer, uv).true_tex_color()
    }

    fn sample_noise(&self, layer: u32, uv: Vec2) -> Rgba {
        self.rgba.sample(layer, uv)
    }

    fn border_thickness(&self, kind: SpriteKind) -> Vec2 {
        match kind {
            SpriteKind::Glyph => Vec2::splat(GRAY_BORDER_THICKNESS),
            SpriteKind::Textured | SpriteKind::Solid => Vec2::splat(RGBA_BORDER_THICKNESS),
        }
    }

    fn border_color(&self) -> Option<Rgba> {
        Some(Rgba::BLACK)
    }
}

/// Ten discrete units for backends lacking texture arrays.
///
/// `layer` / `secondary_layer` index the units (clamped to `0..=9`); by
/// convention `texture0` is the primary surface and `texture1` the noise source.
/// Carries the single-texture filter uniforms too: the outline policy and
/// effect code apply to every textured sprite drawn through the units.
#[derive(Debug, Clone)]
pub struct TextureUnits {
    units: [Option<Texture>; TEXTURE_UNITS],
    /// `outline_thickness` uniform.
    pub outline_thickness: Vec2,
    /// `outline_color` uniform; alpha 0 disables the border stage.
    pub outline_color: Rgba,
    pub outline_policy: OutlinePolicy,
    /// `is_grayscale` uniform: color samples are reinterpreted as coverage.
    pub is_grayscale: bool,
    /// `effect` uniform.
    pub effect: PostEffect,
    /// Fill for [`PostEffect::Solid`].
    pub background_color: Rgba,
    /// Target for [`PostEffect::WavyTint`].
    pub effect_color: Rgba,
}

impl Default for TextureUnits {
    fn default() -> Self {
        Self {
            units: Default::default(),
            outline_thickness: Vec2::ZERO,
            outline_color: Rgba::TRANSPARENT,
            outline_policy: OutlinePolicy::default(),
            is_grayscale: false,
            effect: PostEffect::None,
            background_color: Rgba::TRANSPARENT,
            effect_color: Rgba::TRANSPARENT,
        }
    }
}

impl TextureUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `texture` to `texture{unit}`. Units past 9 are ignored with a warning.
    pub fn bind(&mut self, unit: usize, texture: Texture) -> &mut Self {
        match self.units.get_mut(unit) {
            Some(slot) => *slot = Some(texture),
            None => log::warn!("TextureUnits: unit {unit} out of range (max {})", TEXTURE_UNITS - 1),
        }
        self
    }

    pub fn unit(&self, unit: usize) -> Option<&Texture> {
        self.units.get(unit).and_then(Option::as_ref)
    }

    /// Indexed lookup; unbound units sample as transparent.
    pub fn sample_unit(&self, index: u32, uv: Vec2) -> Rgba {
        let index = (index as usize).min(TEXTURE_UNITS - 1);
        self.units[index].as_ref().map_or(Rgba::TRANSPARENT, |t| t.sample(uv))
    }
}

impl TextureSource for TextureUnits {
    fn sample_rgba(&self, layer: u32, uv: Vec2) -> Rgba {
        let c = self.sample_unit(layer, uv);
        if self.is_grayscale { c.true_tex_color() } else { c }
    }

    fn sample_gray(&self, layer: u32, uv: Vec2) -> Rgba {
        self.sample_unit(layer, uv).true_tex_color()
    }

    fn sample_noise(&self, layer: u32, uv: Vec2) -> Rgba {
        self.sample_unit(layer, uv)
    }

    fn border_thickness(&self, _kind: SpriteKind) -> Vec2 {
        self.outline_thickness
    }

    fn border_color(&self) -> Option<Rgba> {
        (self.outline_color.a > 0.0).then_some(self.outline_color)
    }

    fn outline_policy(&self) -> OutlinePolicy {
        self.outline_policy
    }

    fn post_effect(&self, texel: Rgba, uv: Vec2, t: f32) -> Rgba {
        match self.effect {
            PostEffect::None => texel,
            PostEffect::Glow => effects::glow(uv, t),
            PostEffect::Solid => effects::solid_fill(texel, self.background_color),
            PostEffect::WavyTint => effects::wavy_tint(texel, uv, t, self.effect_color),
        }
    }
}

//! Effect codes and the color functions behind them.

use core::f32::consts::PI;
use core::fmt;
use core::ops::{BitOr, BitOrAssign};

use glam::{Vec2, Vec3};

use crate::paint::Rgba;

/// Per-instance effect bitmask (`effect` attribute of the sprite batch).
///
/// Bits are independent; `GLOW` short-circuits the others.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct EffectFlags(pub u32);

impl EffectFlags {
    pub const NONE: EffectFlags = EffectFlags(0);
    pub const GLOW: EffectFlags = EffectFlags(1 << 0);
    pub const NOISE: EffectFlags = EffectFlags(1 << 1);
    pub const BORDER: EffectFlags = EffectFlags(1 << 2);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: EffectFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Bits outside `GLOW | NOISE | BORDER`; the shaders ignore them.
    #[inline]
    pub const fn unknown_bits(self) -> u32 {
        self.0 & !(Self::GLOW.0 | Self::NOISE.0 | Self::BORDER.0)
    }
}

impl BitOr for EffectFlags {
    type Output = EffectFlags;
    #[inline]
    fn bitor(self, rhs: EffectFlags) -> EffectFlags {
        EffectFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for EffectFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: EffectFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EffectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [(Self::GLOW, "GLOW"), (Self::NOISE, "NOISE"), (Self::BORDER, "BORDER")];
        let set: Vec<&str> = names.iter().filter(|(fl, _)| self.contains(*fl)).map(|(_, n)| *n).collect();
        if set.is_empty() {
            write!(f, "EffectFlags(NONE)")
        } else {
            write!(f, "EffectFlags({})", set.join(" | "))
        }
    }
}

/// Sprite draw type (`kind` attribute).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum SpriteKind {
    /// RGBA array sample.
    Textured = 0,
    /// Grayscale array sample, red channel as coverage.
    Glyph = 1,
    /// Effect color at full opacity, no texture.
    Solid = 2,
}

impl SpriteKind {
    #[inline]
    pub const fn from_raw(raw: u32) -> Option<SpriteKind> {
        match raw {
            0 => Some(SpriteKind::Textured),
            1 => Some(SpriteKind::Glyph),
            2 => Some(SpriteKind::Solid),
            _ => None,
        }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

/// Effect code of the single-texture post filter (`effect` uniform).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum PostEffect {
    #[default]
    None,
    Glow,
    /// Fill the silhouette with `background_color`.
    Solid,
    /// Trigonometric per-texel distortion toward the effect color.
    WavyTint,
}

impl PostEffect {
    /// Unknown codes are treated as [`PostEffect::None`].
    #[inline]
    pub const fn from_code(code: u32) -> PostEffect {
        match code {
            1 => PostEffect::Glow,
            2 => PostEffect::Solid,
            3 => PostEffect::WavyTint,
            _ => PostEffect::None,
        }
    }

    #[inline]
    pub const fn code(self) -> u32 {
        match self {
            PostEffect::None => 0,
            PostEffect::Glow => 1,
            PostEffect::Solid => 2,
            PostEffect::WavyTint => 3,
        }
    }
}

// ── glow ──────────────────────────────────────────────────────────────────

/// Base glow color, `(247, 118, 34) / 255`.
pub const GLOW_COLOR: Vec3 = Vec3::new(247.0 / 255.0, 118.0 / 255.0, 34.0 / 255.0);

/// Spatial frequency of the glow field, in radians per texture-space unit.
const GLOW_FREQUENCY: f32 = 4.0 * PI;

/// Animated glow field. Depends only on `uv` and `t`.
pub fn glow(uv: Vec2, t: f32) -> Rgba {
    let s = t / 10.0;
    let w = (uv.x * GLOW_FREQUENCY + s).cos() * (uv.y * GLOW_FREQUENCY + s).sin();
    let half = GLOW_COLOR * 0.5;
    Rgba::from_rgb(half + half * w, 1.0)
}

// ── noise tint ────────────────────────────────────────────────────────────

/// Gold the noise effect tints toward, `(255, 208, 0) / 255`.
pub const GOLD: Vec3 = Vec3::new(1.0, 208.0 / 255.0, 0.0);

/// Noise scroll speed in texture-space units per unit of `t`.
pub const NOISE_SCROLL: Vec2 = Vec2::new(0.05, 0.025);

/// Texture-space coordinate at which the noise layer is sampled, wrapped into
/// `[0, 1)` like WGSL `fract`.
#[inline]
pub fn noise_uv(uv: Vec2, t: f32) -> Vec2 {
    let p = uv + NOISE_SCROLL * t;
    p - p.floor()
}

/// Per-channel mix weights derived from a noise sample: `(g, b, (g + b) / 2)`.
#[inline]
pub fn noise_weights(noise: Rgba) -> Vec3 {
    Vec3::new(noise.g, noise.b, (noise.g + noise.b) * 0.5)
}

/// Replaces `base.rgb` with `mix(effect_color, GOLD, weights)`; alpha is kept.
pub fn noise_tint(base: Rgba, effect_color: Vec3, noise: Rgba) -> Rgba {
    let w = noise_weights(noise);
    base.with_rgb(effect_color + (GOLD - effect_color) * w)
}

// ── screen-space only ─────────────────────────────────────────────────────

/// Solid fill keeping the texel's silhouette.
#[inline]
pub fn solid_fill(texel: Rgba, fill: Rgba) -> Rgba {
    Rgba::from_rgb(fill.rgb(), texel.a * fill.a)
}

/// Interpolates `texel.rgb` toward `effect.rgb` with a distortion field driven by
/// `uv` and `t`, scaled by `effect.a`.
pub fn wavy_tint(texel: Rgba, uv: Vec2, t: f32, effect: Rgba) -> Rgba {
    let d = Vec3::new(
        (uv.x * 20.0 + t).sin(),
        (uv.y * 20.0 + t).cos(),
        ((uv.x + uv.y) * 10.0 + t).sin(),
    ) * 0.5
        + 0.5;
    let rgb = texel.rgb() + (effect.rgb() - texel.rgb()) * d * effect.a;
    texel.with_rgb(rgb)
}

//! Single-texture screen-space filter: grayscale correction, effect codes and
//! the outline pass.

use glam::Vec2;

use crate::paint::Rgba;

use super::effects::{self, PostEffect};
use super::neighbors::{NeighborReduction, reduce_neighbors};
use super::texture::Texture;

/// How the outline pass decides what to draw around a silhouette.
///
/// The two policies are not interchangeable; callers pick one explicitly.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum OutlinePolicy {
    /// A transparent texel with at least one covered neighbor becomes the
    /// outline color; everything else keeps the base color.
    CoverageCount,
    /// The outline color, weighted by the largest neighbor alpha, is composed
    /// beneath the base color.
    #[default]
    MaxAlpha,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PostFilterUniforms {
    pub outline_thickness: Vec2,
    /// Alpha 0 disables the outline pass.
    pub outline_color: Rgba,
    /// Fill for [`PostEffect::Solid`].
    pub background_color: Rgba,
    /// Target for [`PostEffect::WavyTint`].
    pub effect_color: Rgba,
    pub effect: PostEffect,
    pub t: f32,
    pub is_grayscale: bool,
}

impl Default for PostFilterUniforms {
    fn default() -> Self {
        Self {
            outline_thickness: Vec2::ZERO,
            outline_color: Rgba::TRANSPARENT,
            background_color: Rgba::TRANSPARENT,
            effect_color: Rgba::TRANSPARENT,
            effect: PostEffect::None,
            t: 0.0,
            is_grayscale: false,
        }
    }
}

impl PostFilterUniforms {
    #[inline]
    pub fn outline_enabled(&self) -> bool {
        self.outline_color.a > 0.0
    }
}

/// Shades one fragment of the post filter at texture coordinate `uv`.
pub fn shade_post_filter(uv: Vec2, u: &PostFilterUniforms, img: &Texture, policy: OutlinePolicy) -> Rgba {
    if u.effect == PostEffect::Glow {
        return effects::glow(uv, u.t);
    }

    let sample = |p: Vec2| {
        let c = img.sample(p);
        if u.is_grayscale { c.true_tex_color() } else { c }
    };
    let texel = sample(uv);
    let base = match u.effect {
        PostEffect::Solid => effects::solid_fill(texel, u.background_color),
        PostEffect::WavyTint => effects::wavy_tint(texel, uv, u.t, u.effect_color),
        PostEffect::None | PostEffect::Glow => texel,
    };

    if !u.outline_enabled() {
        return base;
    }

    let alpha_at = |p: Vec2| sample(p).a;
    match policy {
        OutlinePolicy::CoverageCount => {
            let covered = reduce_neighbors(uv, u.outline_thickness, alpha_at, NeighborReduction::CountNonZero);
            if covered >= 1.0 && texel.a <= 0.0 { u.outline_color } else { base }
        }
        OutlinePolicy::MaxAlpha => {
            let max = reduce_neighbors(uv, u.outline_thickness, alpha_at, NeighborReduction::Max);
            if max > 0.0 {
                Rgba::blend(base, u.outline_color.with_alpha(u.outline_color.a * max))
            } else {
                base
            }
        }
    }
}

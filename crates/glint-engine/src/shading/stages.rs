//! Sprite batch fragment shading as an ordered list of optional stages.
//!
//! Composition order is fixed: glow > base > noise > border. Glow replaces the
//! whole chain; noise and border compose independently on top of the base.

use glam::{Vec2, Vec3};

use crate::paint::Rgba;

use super::effects::{self, EffectFlags, SpriteKind};
use super::neighbors::{NeighborReduction, reduce_neighbors};
use super::post_filter::OutlinePolicy;
use super::sources::TextureSource;

/// Interpolated varyings reaching the fragment stage.
///
/// `kind`, `layer`, `secondary_layer` and `effect` are flat: constant for a
/// whole instance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FragmentInput {
    pub tex_coords: Vec2,
    pub kind: u32,
    pub layer: u32,
    pub secondary_layer: u32,
    pub effect: EffectFlags,
    pub effect_color: Vec3,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Stage {
    Glow,
    Base,
    Noise,
    Border,
}

/// Stages enabled by `flags`, in application order.
pub fn plan(flags: EffectFlags) -> impl Iterator<Item = Stage> {
    let glow = flags.contains(EffectFlags::GLOW);
    [
        (Stage::Glow, glow),
        (Stage::Base, !glow),
        (Stage::Noise, !glow && flags.contains(EffectFlags::NOISE)),
        (Stage::Border, !glow && flags.contains(EffectFlags::BORDER)),
    ]
    .into_iter()
    .filter_map(|(stage, on)| on.then_some(stage))
}

impl Stage {
    /// Applies this stage to the color produced by the previous one.
    pub fn apply<S>(self, color: Rgba, input: &FragmentInput, t: f32, textures: &S) -> Rgba
    where
        S: TextureSource + ?Sized,
    {
        match self {
            Stage::Glow => effects::glow(input.tex_coords, t),
            Stage::Base => base_color(input, t, textures),
            Stage::Noise => {
                let uv = effects::noise_uv(input.tex_coords, t);
                let noise = textures.sample_noise(input.secondary_layer, uv);
                effects::noise_tint(color, input.effect_color, noise)
            }
            Stage::Border => border(color, input, textures),
        }
    }
}

/// Base color by kind. Unknown kinds resolve to transparent.
fn base_color<S: TextureSource + ?Sized>(input: &FragmentInput, t: f32, textures: &S) -> Rgba {
    match SpriteKind::from_raw(input.kind) {
        Some(SpriteKind::Textured) => {
            let texel = textures.sample_rgba(input.layer, input.tex_coords);
            textures.post_effect(texel, input.tex_coords, t)
        }
        Some(SpriteKind::Glyph) => textures.sample_gray(input.layer, input.tex_coords),
        Some(SpriteKind::Solid) => Rgba::from_rgb(input.effect_color, 1.0),
        None => Rgba::TRANSPARENT,
    }
}

fn border<S: TextureSource + ?Sized>(color: Rgba, input: &FragmentInput, textures: &S) -> Rgba {
    // Solid shapes have no coverage texture to find edges in.
    let kind = match SpriteKind::from_raw(input.kind) {
        Some(k @ (SpriteKind::Textured | SpriteKind::Glyph)) => k,
        _ => return color,
    };
    let Some(border) = textures.border_color() else {
        return color;
    };

    let alpha_at = |uv: Vec2| match kind {
        SpriteKind::Glyph => textures.sample_gray(input.layer, uv).a,
        _ => textures.sample_rgba(input.layer, uv).a,
    };
    let thickness = textures.border_thickness(kind);
    match textures.outline_policy() {
        OutlinePolicy::CoverageCount => {
            let covered = reduce_neighbors(input.tex_coords, thickness, &alpha_at, NeighborReduction::CountNonZero);
            if covered >= 1.0 && alpha_at(input.tex_coords) <= 0.0 { border } else { color }
        }
        OutlinePolicy::MaxAlpha => {
            let max = reduce_neighbors(input.tex_coords, thickness, &alpha_at, NeighborReduction::Max);
            if max > 0.0 {
                Rgba::blend(color, border.with_alpha(border.a * max))
            } else {
                color
            }
        }
    }
}

/// Shades one sprite batch fragment.
pub fn shade_sprite<S>(input: &FragmentInput, t: f32, textures: &S) -> Rgba
where
    S: TextureSource + ?Sized,
{
    plan(input.effect).fold(Rgba::TRANSPARENT, |color, stage| stage.apply(color, input, t, textures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::effects::PostEffect;
    use crate::shading::sources::{ArrayTextures, TextureUnits};
    use crate::shading::texture::{Texture, TextureArray, TextureFormat};

    fn input(kind: u32, effect: EffectFlags) -> FragmentInput {
        FragmentInput {
            tex_coords: Vec2::splat(0.5),
            kind,
            layer: 0,
            secondary_layer: 1,
            effect,
            effect_color: Vec3::new(0.2, 0.4, 0.6),
        }
    }

    fn rgba_array(texels: &[[u8; 4]]) -> TextureArray {
        let mut a = TextureArray::new(1, 1, texels.len() as u32, TextureFormat::Rgba8);
        for t in texels {
            a.add_layer(t, 1, 1).unwrap();
        }
        a
    }

    fn ring(center: Rgba, ring: Rgba) -> Texture {
        let mut texels = [ring; 9];
        texels[4] = center;
        Texture::from_colors(3, 3, &texels).unwrap()
    }

    // ── plan ──────────────────────────────────────────────────────────────

    #[test]
    fn glow_short_circuits_every_other_stage() {
        let all = EffectFlags::GLOW | EffectFlags::NOISE | EffectFlags::BORDER;
        assert_eq!(plan(all).collect::<Vec<_>>(), vec![Stage::Glow]);
    }

    #[test]
    fn plan_keeps_fixed_order() {
        assert_eq!(plan(EffectFlags::NONE).collect::<Vec<_>>(), vec![Stage::Base]);
        assert_eq!(
            plan(EffectFlags::BORDER | EffectFlags::NOISE).collect::<Vec<_>>(),
            vec![Stage::Base, Stage::Noise, Stage::Border]
        );
    }

    #[test]
    fn unknown_bits_do_not_add_stages() {
        assert_eq!(plan(EffectFlags(0b1000)).collect::<Vec<_>>(), vec![Stage::Base]);
    }

    // ── base ──────────────────────────────────────────────────────────────

    #[test]
    fn glow_ignores_bound_textures() {
        let gray = TextureArray::new(1, 1, 1, TextureFormat::R8);
        let red = rgba_array(&[[255, 0, 0, 255], [0, 0, 0, 255]]);
        let blue = rgba_array(&[[0, 0, 255, 128], [0, 255, 255, 255]]);
        let i = input(0, EffectFlags::GLOW | EffectFlags::NOISE);
        let a = shade_sprite(&i, 12.0, &ArrayTextures::new(&red, &gray));
        let b = shade_sprite(&i, 12.0, &ArrayTextures::new(&blue, &gray));
        assert_eq!(a, b);
        assert_eq!(a, effects::glow(i.tex_coords, 12.0));
    }

    #[test]
    fn base_resolves_by_kind() {
        let rgba = rgba_array(&[[0, 255, 0, 255]]);
        let mut gray = TextureArray::new(1, 1, 1, TextureFormat::R8);
        gray.add_layer(&[51], 1, 1).unwrap();
        let src = ArrayTextures::new(&rgba, &gray);

        assert_eq!(shade_sprite(&input(0, EffectFlags::NONE), 0.0, &src), Rgba::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(shade_sprite(&input(1, EffectFlags::NONE), 0.0, &src), Rgba::new(1.0, 1.0, 1.0, 0.2));
        assert_eq!(
            shade_sprite(&input(2, EffectFlags::NONE), 0.0, &src),
            Rgba::new(0.2, 0.4, 0.6, 1.0)
        );
    }

    #[test]
    fn unknown_kind_is_transparent() {
        let rgba = rgba_array(&[[255, 255, 255, 255]]);
        let gray = TextureArray::new(1, 1, 1, TextureFormat::R8);
        let out = shade_sprite(&input(7, EffectFlags::BORDER), 0.0, &ArrayTextures::new(&rgba, &gray));
        assert_eq!(out, Rgba::TRANSPARENT);
    }

    // ── noise ─────────────────────────────────────────────────────────────

    #[test]
    fn saturated_noise_tints_to_gold_and_keeps_alpha() {
        let rgba = rgba_array(&[[255, 255, 255, 128], [0, 255, 255, 255]]);
        let gray = TextureArray::new(1, 1, 1, TextureFormat::R8);
        let out = shade_sprite(&input(0, EffectFlags::NOISE), 3.0, &ArrayTextures::new(&rgba, &gray));
        assert!((out.rgb() - effects::GOLD).abs().max_element() < 1e-6);
        assert_eq!(out.a, 128.0 / 255.0);
    }

    #[test]
    fn blank_noise_yields_effect_color() {
        let rgba = rgba_array(&[[255, 255, 255, 255], [0, 0, 0, 255]]);
        let gray = TextureArray::new(1, 1, 1, TextureFormat::R8);
        let out = shade_sprite(&input(0, EffectFlags::NOISE), 0.0, &ArrayTextures::new(&rgba, &gray));
        assert_eq!(out.rgb(), Vec3::new(0.2, 0.4, 0.6));
    }

    // ── border ────────────────────────────────────────────────────────────

    fn ring_units(center: Rgba) -> TextureUnits {
        let mut units = TextureUnits::new();
        units.bind(0, ring(center, Rgba::WHITE));
        units.outline_thickness = Vec2::splat(1.0 / 3.0);
        units.outline_color = Rgba::BLACK;
        units
    }

    #[test]
    fn border_shows_under_transparent_center() {
        let units = ring_units(Rgba::TRANSPARENT);
        let out = shade_sprite(&input(0, EffectFlags::BORDER), 0.0, &units);
        assert_eq!(out, Rgba::BLACK);
    }

    #[test]
    fn border_leaves_opaque_interior_alone() {
        let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
        let units = ring_units(red);
        assert_eq!(shade_sprite(&input(0, EffectFlags::BORDER), 0.0, &units), red);
    }

    #[test]
    fn border_skips_solid_shapes() {
        let units = ring_units(Rgba::TRANSPARENT);
        let out = shade_sprite(&input(2, EffectFlags::BORDER), 0.0, &units);
        assert_eq!(out, Rgba::new(0.2, 0.4, 0.6, 1.0));
    }

    #[test]
    fn policies_disagree_on_partial_neighbors() {
        // Half-covered ring around a transparent center.
        let mut units = TextureUnits::new();
        units.bind(0, ring(Rgba::TRANSPARENT, Rgba::new(1.0, 1.0, 1.0, 0.5)));
        units.outline_thickness = Vec2::splat(1.0 / 3.0);
        units.outline_color = Rgba::new(0.0, 1.0, 0.0, 1.0);

        units.outline_policy = OutlinePolicy::CoverageCount;
        assert_eq!(shade_sprite(&input(0, EffectFlags::BORDER), 0.0, &units), Rgba::new(0.0, 1.0, 0.0, 1.0));

        units.outline_policy = OutlinePolicy::MaxAlpha;
        let ring_alpha = units.sample_unit(0, Vec2::ZERO).a;
        let max = shade_sprite(&input(0, EffectFlags::BORDER), 0.0, &units);
        assert_eq!(max, Rgba::blend(Rgba::TRANSPARENT, Rgba::new(0.0, 1.0, 0.0, ring_alpha)));
    }

    #[test]
    fn coverage_count_leaves_covered_texels_alone() {
        let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
        let mut units = ring_units(red);
        units.outline_policy = OutlinePolicy::CoverageCount;
        assert_eq!(shade_sprite(&input(0, EffectFlags::BORDER), 0.0, &units), red);
    }

    #[test]
    fn unit_effect_code_recolors_textured_base_only() {
        let mut units = ring_units(Rgba::new(0.3, 0.3, 0.3, 0.8));
        units.effect = PostEffect::Solid;
        units.background_color = Rgba::new(0.0, 0.0, 1.0, 1.0);
        let i = input(0, EffectFlags::NONE);
        assert_eq!(shade_sprite(&i, 0.0, &units), Rgba::new(0.0, 0.0, 1.0, 0.8));
        assert_eq!(shade_sprite(&input(2, EffectFlags::NONE), 0.0, &units), Rgba::new(0.2, 0.4, 0.6, 1.0));
    }

    #[test]
    fn border_disabled_by_transparent_outline() {
        let mut units = ring_units(Rgba::TRANSPARENT);
        units.outline_color = Rgba::TRANSPARENT;
        assert_eq!(shade_sprite(&input(0, EffectFlags::BORDER), 0.0, &units), Rgba::TRANSPARENT);
    }
}

//! Software rasterizer driving the shading functions.
//!
//! Each covered pixel center is mapped back into the instance's unit quad by
//! inverting its model transform, shaded, then composited with straight-alpha
//! `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` blending, the same blend state the GPU
//! pipelines use.

use glam::{Affine2, Mat4, Vec2};

use crate::coords::Rect;
use crate::paint::Rgba;

use super::post_filter::{OutlinePolicy, PostFilterUniforms, shade_post_filter};
use super::sources::TextureSource;
use super::stages::shade_sprite;
use super::texture::Texture;
use super::vertex::{SpriteInstance, transform_vertex};

const UNIT_QUAD: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

/// CPU color target.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, clear: Rgba) -> Self {
        Self { width, height, pixels: vec![clear; width as usize * height as usize] }
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[(y * self.width + x) as usize]
    }

    fn blend_pixel(&mut self, x: u32, y: u32, src: Rgba) {
        let i = (y * self.width + x) as usize;
        self.pixels[i] = Rgba::blend(src, self.pixels[i]);
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// 8-bit RGBA, row-major, the layout `Texture::new` and PNG encoders accept.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_u8()).collect()
    }

    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| image::Rgba(self.pixel(x, y).to_u8()))
    }

    /// Visits every pixel whose center lies inside `to_world(unit quad)`,
    /// passing the pixel and the center's unit-quad coordinate.
    fn cover<F>(&mut self, to_world: Affine2, mut shade: F)
    where
        F: FnMut(&mut Self, u32, u32, Vec2),
    {
        if !to_world.is_finite() || to_world.matrix2.determinant().abs() <= f32::EPSILON {
            log::debug!("raster: skipping degenerate transform {to_world:?}");
            return;
        }
        let to_local = to_world.inverse();
        let corners = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y].map(|c| to_world.transform_point2(c));
        let Some(area) = Rect::bounding(corners).and_then(|b| b.intersect(self.bounds())) else {
            return;
        };

        let (x0, y0) = (area.min().x.floor() as u32, area.min().y.floor() as u32);
        let (x1, y1) = (
            (area.max().x.ceil() as u32).min(self.width),
            (area.max().y.ceil() as u32).min(self.height),
        );
        for y in y0..y1 {
            for x in x0..x1 {
                let local = to_local.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if UNIT_QUAD.contains(local) {
                    shade(self, x, y, local);
                }
            }
        }
    }

    /// Draws sprite batch instances in slice order.
    pub fn draw_sprites<S>(&mut self, instances: &[SpriteInstance], zoom: f32, t: f32, textures: &S)
    where
        S: TextureSource + ?Sized,
    {
        let view = Affine2::from_scale(Vec2::splat(zoom));
        for inst in instances {
            let varyings = transform_vertex(Vec2::ZERO, inst, &Mat4::IDENTITY);
            self.cover(view * inst.model_affine(), |fb, x, y, local| {
                let color = shade_sprite(&varyings.at(inst.tex_coords(local)), t, textures);
                fb.blend_pixel(x, y, color);
            });
        }
    }

    /// Draws `img` through the post filter into `dest` (logical px).
    pub fn draw_post_filter(&mut self, dest: Rect, uniforms: &PostFilterUniforms, img: &Texture, policy: OutlinePolicy) {
        let to_world = Affine2::from_translation(dest.origin) * Affine2::from_scale(dest.size);
        self.cover(to_world, |fb, x, y, uv| {
            fb.blend_pixel(x, y, shade_post_filter(uv, uniforms, img, policy));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::sources::TextureUnits;

    fn solid(at: [f32; 2], size: f32, color: [f32; 3]) -> SpriteInstance {
        SpriteInstance {
            translation: at,
            scale: [size, size],
            kind: 2,
            effect_color: color,
            ..Default::default()
        }
    }

    #[test]
    fn solid_sprite_covers_its_pixels_only() {
        let mut fb = Framebuffer::new(8, 8, Rgba::TRANSPARENT);
        fb.draw_sprites(&[solid([2.0, 2.0], 4.0, [1.0, 0.0, 0.0])], 1.0, 0.0, &TextureUnits::new());
        assert_eq!(fb.pixel(2, 2), Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(fb.pixel(5, 5), Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(fb.pixel(1, 2), Rgba::TRANSPARENT);
        assert_eq!(fb.pixel(6, 5), Rgba::TRANSPARENT);
    }

    #[test]
    fn later_instances_paint_over_earlier_ones() {
        let mut fb = Framebuffer::new(4, 4, Rgba::TRANSPARENT);
        let sprites = [solid([0.0, 0.0], 4.0, [1.0, 0.0, 0.0]), solid([0.0, 0.0], 2.0, [0.0, 0.0, 1.0])];
        fb.draw_sprites(&sprites, 1.0, 0.0, &TextureUnits::new());
        assert_eq!(fb.pixel(0, 0).rgb(), glam::Vec3::Z);
        assert_eq!(fb.pixel(3, 3).rgb(), glam::Vec3::X);
    }

    #[test]
    fn rotated_square_keeps_its_center() {
        let mut fb = Framebuffer::new(16, 16, Rgba::TRANSPARENT);
        let inst = SpriteInstance { pivot: [4.0, 4.0], rotation: 45.0, ..solid([4.0, 4.0], 8.0, [0.0, 1.0, 0.0]) };
        fb.draw_sprites(&[inst], 1.0, 0.0, &TextureUnits::new());
        assert_eq!(fb.pixel(8, 8).g, 1.0);
        // Corners of the unrotated square fall outside the diamond.
        assert_eq!(fb.pixel(4, 4), Rgba::TRANSPARENT);
    }

    #[test]
    fn zoom_scales_coverage() {
        let mut fb = Framebuffer::new(8, 8, Rgba::TRANSPARENT);
        fb.draw_sprites(&[solid([1.0, 1.0], 1.0, [1.0, 1.0, 1.0])], 4.0, 0.0, &TextureUnits::new());
        assert_eq!(fb.pixel(4, 4), Rgba::WHITE);
        assert_eq!(fb.pixel(7, 7), Rgba::WHITE);
        assert_eq!(fb.pixel(3, 3), Rgba::TRANSPARENT);
    }

    #[test]
    fn degenerate_scale_draws_nothing() {
        let mut fb = Framebuffer::new(4, 4, Rgba::TRANSPARENT);
        let inst = SpriteInstance { scale: [0.0, 4.0], ..solid([0.0, 0.0], 4.0, [1.0, 1.0, 1.0]) };
        fb.draw_sprites(&[inst], 1.0, 0.0, &TextureUnits::new());
        assert!((0..4).all(|i| fb.pixel(i, i) == Rgba::TRANSPARENT));
    }

    #[test]
    fn translucent_sprite_blends_over_background() {
        let mut units = TextureUnits::new();
        units.bind(0, Texture::from_colors(1, 1, &[Rgba::from_u8(255, 0, 0, 128)]).unwrap());
        let mut fb = Framebuffer::new(2, 2, Rgba::WHITE);
        let inst = SpriteInstance { scale: [2.0, 2.0], ..Default::default() };
        fb.draw_sprites(&[inst], 1.0, 0.0, &units);
        let a = 128.0 / 255.0;
        let px = fb.pixel(1, 1);
        assert!((px.r - 1.0).abs() < 1e-6);
        assert!((px.g - (1.0 - a)).abs() < 1e-6);
        assert!((px.a - (a * a + 1.0 - a)).abs() < 1e-6);
    }

    #[test]
    fn post_filter_fills_destination_rect() {
        let img = Texture::from_colors(1, 1, &[Rgba::WHITE]).unwrap();
        let mut fb = Framebuffer::new(6, 6, Rgba::TRANSPARENT);
        fb.draw_post_filter(Rect::new(1.0, 1.0, 4.0, 4.0), &PostFilterUniforms::default(), &img, OutlinePolicy::MaxAlpha);
        assert_eq!(fb.pixel(1, 1), Rgba::WHITE);
        assert_eq!(fb.pixel(0, 0), Rgba::TRANSPARENT);
        assert_eq!(fb.to_rgba8().len(), 6 * 6 * 4);
    }
}

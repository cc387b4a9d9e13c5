use glam::{Vec3, Vec4};

/// Linear straight-alpha RGBA color.
///
/// Invariant:
/// - `rgb` is NOT multiplied by `a`. This is the convention of every shading rule
///   in `shading`; the only premultiplied-style operation is [`Rgba::blend`].
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn from_rgb(rgb: Vec3, a: f32) -> Self {
        Self::new(rgb.x, rgb.y, rgb.z, a)
    }

    /// Creates a color from straight 8-bit channels (`0`–`255`).
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Quantizes to 8-bit channels, clamping to `[0, 1]` first.
    #[inline]
    pub fn to_u8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    #[inline]
    pub fn rgb(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    #[inline]
    pub fn from_vec4(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    #[inline]
    pub fn with_rgb(self, rgb: Vec3) -> Self {
        Self::from_rgb(rgb, self.a)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Reinterprets a single-channel texel as coverage: RGB forced to white,
    /// alpha taken from the red channel.
    ///
    /// Single-channel samples arrive as `(r, 0, 0, 1)`, so alpha is `r * a`; keeping
    /// the existing alpha in the product makes the correction idempotent.
    #[inline]
    pub fn true_tex_color(self) -> Self {
        Self::new(1.0, 1.0, 1.0, self.r * self.a)
    }

    /// `src * src.a + dst * (1 - src.a)` over all four channels.
    #[inline]
    pub fn blend(src: Rgba, dst: Rgba) -> Rgba {
        Rgba::from_vec4(src.to_vec4() * src.a + dst.to_vec4() * (1.0 - src.a))
    }

    /// Component-wise linear interpolation, `t = 0` yields `self`.
    #[inline]
    pub fn mix(self, other: Rgba, t: f32) -> Rgba {
        Rgba::from_vec4(self.to_vec4().lerp(other.to_vec4(), t))
    }
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<Rgba> for wgpu::Color {
    fn from(c: Rgba) -> Self {
        wgpu::Color { r: c.r as f64, g: c.g as f64, b: c.b as f64, a: c.a as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_opaque_src_replaces_dst() {
        let out = Rgba::blend(Rgba::new(0.2, 0.4, 0.6, 1.0), Rgba::WHITE);
        assert_eq!(out, Rgba::new(0.2, 0.4, 0.6, 1.0));
    }

    #[test]
    fn blend_transparent_src_keeps_dst() {
        let dst = Rgba::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(Rgba::blend(Rgba::TRANSPARENT, dst), dst);
    }

    #[test]
    fn true_tex_color_reads_red_as_alpha() {
        let c = Rgba::new(0.25, 0.0, 0.0, 1.0).true_tex_color();
        assert_eq!(c, Rgba::new(1.0, 1.0, 1.0, 0.25));
    }

    #[test]
    fn true_tex_color_is_idempotent() {
        for r in [0.0, 0.1, 0.5, 0.9, 1.0] {
            let once = Rgba::new(r, 0.0, 0.0, 1.0).true_tex_color();
            assert_eq!(once.true_tex_color(), once);
        }
    }

    #[test]
    fn true_tex_color_keeps_translucent_sources_translucent() {
        let c = Rgba::new(0.8, 0.3, 0.3, 0.5).true_tex_color();
        assert_eq!(c, Rgba::new(1.0, 1.0, 1.0, 0.4));
        assert_eq!(c.true_tex_color(), c);
    }

    #[test]
    fn u8_round_trip_of_gold() {
        let gold = Rgba::from_u8(255, 208, 0, 255);
        assert_eq!(gold.to_u8(), [255, 208, 0, 255]);
    }

    #[test]
    fn to_u8_clamps_out_of_range() {
        assert_eq!(Rgba::new(-1.0, 2.0, 0.5, 1.0).to_u8(), [0, 255, 128, 255]);
    }
}

//! Per-instance vertex transform.
//!
//! Convention:
//! - Model space is the unit quad `pos ∈ [0,1]²`, scaled to pixels by `scale`.
//! - World space is logical pixels, top-left origin, +Y down.
//! - `view` maps world space to clip space.

use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Mat4, Vec2, Vec3, Vec4};

use crate::coords::Viewport;

use super::effects::EffectFlags;
use super::stages::FragmentInput;

/// Sprite instance attributes (72 bytes):
///
///  offset  0  crop             [f32; 4]  loc 1
///  offset 16  translation      [f32; 2]  loc 2
///  offset 24  scale            [f32; 2]  loc 3
///  offset 32  pivot            [f32; 2]  loc 4
///  offset 40  rotation         f32       loc 5  (degrees)
///  offset 44  kind             u32       loc 6
///  offset 48  layer            u32       loc 7
///  offset 52  secondary_layer  u32       loc 8
///  offset 56  effect           u32       loc 9
///  offset 60  effect_color     [f32; 3]  loc 10
///
/// Location 0 is the per-vertex quad corner.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// `(x, y, w, h)` of the source rectangle, normalized to the layer.
    pub crop: [f32; 4],
    pub translation: [f32; 2],
    pub scale: [f32; 2],
    /// Rotation origin, in scaled local space.
    pub pivot: [f32; 2],
    pub rotation: f32,
    pub kind: u32,
    pub layer: u32,
    pub secondary_layer: u32,
    pub effect: u32,
    pub effect_color: [f32; 3],
}

impl Default for SpriteInstance {
    fn default() -> Self {
        Self {
            crop: [0.0, 0.0, 1.0, 1.0],
            translation: [0.0; 2],
            scale: [1.0; 2],
            pivot: [0.0; 2],
            rotation: 0.0,
            kind: 0,
            layer: 0,
            secondary_layer: 0,
            effect: 0,
            effect_color: [0.0; 3],
        }
    }
}

impl SpriteInstance {
    const ATTRS: [wgpu::VertexAttribute; 10] = wgpu::vertex_attr_array![
        1 => Float32x4,  // crop
        2 => Float32x2,  // translation
        3 => Float32x2,  // scale
        4 => Float32x2,  // pivot
        5 => Float32,    // rotation
        6 => Uint32,     // kind
        7 => Uint32,     // layer
        8 => Uint32,     // secondary_layer
        9 => Uint32,     // effect
        10 => Float32x3  // effect_color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }

    #[inline]
    pub fn effect_flags(&self) -> EffectFlags {
        EffectFlags(self.effect)
    }

    /// `crop.xy + pos * crop.zw`
    #[inline]
    pub fn tex_coords(&self, pos: Vec2) -> Vec2 {
        let [x, y, w, h] = self.crop;
        Vec2::new(x, y) + pos * Vec2::new(w, h)
    }

    /// `T(translation) · T(pivot) · R(rotation) · T(-pivot) · S(scale)`
    pub fn model_matrix(&self) -> Mat4 {
        let pivot = Vec2::from(self.pivot).extend(0.0);
        Mat4::from_translation(Vec2::from(self.translation).extend(0.0))
            * Mat4::from_translation(pivot)
            * Mat4::from_rotation_z(self.rotation.to_radians())
            * Mat4::from_translation(-pivot)
            * Mat4::from_scale(Vec2::from(self.scale).extend(1.0))
    }

    /// The 2D part of [`model_matrix`](Self::model_matrix).
    pub fn model_affine(&self) -> Affine2 {
        let pivot = Vec2::from(self.pivot);
        Affine2::from_translation(Vec2::from(self.translation))
            * Affine2::from_translation(pivot)
            * Affine2::from_angle(self.rotation.to_radians())
            * Affine2::from_translation(-pivot)
            * Affine2::from_scale(Vec2::from(self.scale))
    }
}

/// Vertex stage output: clip position plus varyings.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub tex_coords: Vec2,
    pub kind: u32,
    pub layer: u32,
    pub secondary_layer: u32,
    pub effect: EffectFlags,
    pub effect_color: Vec3,
}

impl VertexOutput {
    /// Fragment input at interpolated `tex_coords`; flat varyings carry over.
    pub fn at(&self, tex_coords: Vec2) -> FragmentInput {
        FragmentInput {
            tex_coords,
            kind: self.kind,
            layer: self.layer,
            secondary_layer: self.secondary_layer,
            effect: self.effect,
            effect_color: self.effect_color,
        }
    }
}

/// Runs the vertex stage for one quad corner.
pub fn transform_vertex(pos: Vec2, instance: &SpriteInstance, view: &Mat4) -> VertexOutput {
    let world = instance.model_matrix() * Vec4::new(pos.x, pos.y, 0.0, 1.0);
    let clip_position = *view * world;
    VertexOutput {
        clip_position,
        tex_coords: instance.tex_coords(pos),
        kind: instance.kind,
        layer: instance.layer,
        secondary_layer: instance.secondary_layer,
        effect: instance.effect_flags(),
        effect_color: Vec3::from(instance.effect_color),
    }
}

/// Orthographic projection of the viewport (logical px, +Y down), zoomed
/// about the top-left corner. Sprites at z = 0 land on clip depth 0.
pub fn view_matrix(viewport: Viewport, zoom: f32) -> Mat4 {
    let w = viewport.width.max(1.0);
    let h = viewport.height.max(1.0);
    Mat4::orthographic_rh(0.0, w, h, 0.0, 0.0, 1.0) * Mat4::from_scale(Vec3::new(zoom, zoom, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: [Vec2; 4] = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];

    fn close(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn instance_is_72_bytes() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 72);
    }

    #[test]
    fn unscaled_unrotated_is_pure_translation() {
        let view = view_matrix(Viewport::new(640.0, 480.0), 1.0);
        let inst = SpriteInstance {
            translation: [12.5, -3.0],
            pivot: [0.25, 0.75],
            ..Default::default()
        };
        for pos in QUAD {
            let out = transform_vertex(pos, &inst, &view);
            let expected = view * (pos + Vec2::new(12.5, -3.0)).extend(0.0).extend(1.0);
            assert_eq!(out.clip_position, expected);
        }
    }

    #[test]
    fn rotation_turns_about_the_pivot() {
        let inst = SpriteInstance {
            scale: [10.0, 10.0],
            pivot: [5.0, 5.0],
            rotation: 90.0,
            ..Default::default()
        };
        let m = inst.model_matrix();
        // The pivot itself is a fixed point.
        assert!(close(m * Vec4::new(0.5, 0.5, 0.0, 1.0), Vec4::new(5.0, 5.0, 0.0, 1.0)));
        // Top-left corner goes to top-right (+Y down, positive angle).
        assert!(close(m * Vec4::new(0.0, 0.0, 0.0, 1.0), Vec4::new(10.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn affine_matches_matrix() {
        let inst = SpriteInstance {
            translation: [30.0, 40.0],
            scale: [16.0, 8.0],
            pivot: [8.0, 4.0],
            rotation: 33.0,
            ..Default::default()
        };
        let a = inst.model_affine();
        let m = inst.model_matrix();
        for pos in QUAD {
            let p = a.transform_point2(pos);
            let q = m * pos.extend(0.0).extend(1.0);
            assert!(close(p.extend(0.0).extend(1.0), q));
        }
    }

    #[test]
    fn tex_coords_remap_into_crop() {
        let inst = SpriteInstance { crop: [0.25, 0.5, 0.5, 0.25], ..Default::default() };
        assert_eq!(inst.tex_coords(Vec2::ZERO), Vec2::new(0.25, 0.5));
        assert_eq!(inst.tex_coords(Vec2::ONE), Vec2::new(0.75, 0.75));
    }

    #[test]
    fn flat_attributes_pass_through() {
        let inst = SpriteInstance {
            kind: 1,
            layer: 3,
            secondary_layer: 4,
            effect: 6,
            effect_color: [0.1, 0.2, 0.3],
            ..Default::default()
        };
        let view = Mat4::IDENTITY;
        let a = transform_vertex(QUAD[0], &inst, &view);
        let b = transform_vertex(QUAD[2], &inst, &view);
        assert_eq!((a.kind, a.layer, a.secondary_layer, a.effect), (1, 3, 4, EffectFlags(6)));
        assert_eq!((a.kind, a.layer, a.secondary_layer, a.effect), (b.kind, b.layer, b.secondary_layer, b.effect));
        assert_eq!(a.effect_color, Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn view_maps_viewport_corners_to_clip_corners() {
        let view = view_matrix(Viewport::new(200.0, 100.0), 1.0);
        assert!(close(view * Vec4::new(0.0, 0.0, 0.0, 1.0), Vec4::new(-1.0, 1.0, 0.0, 1.0)));
        assert!(close(view * Vec4::new(200.0, 100.0, 0.0, 1.0), Vec4::new(1.0, -1.0, 0.0, 1.0)));
    }

    #[test]
    fn zoom_scales_about_top_left() {
        let view = view_matrix(Viewport::new(200.0, 100.0), 2.0);
        assert!(close(view * Vec4::new(100.0, 50.0, 0.0, 1.0), Vec4::new(1.0, -1.0, 0.0, 1.0)));
    }
}

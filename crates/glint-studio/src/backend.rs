//! Frame rendering for a [`Composition`], on the GPU or with the CPU
//! reference rasterizer.

use anyhow::{Context, Result};

use glint_engine::coords::{Rect, Viewport};
use glint_engine::device::{Gpu, GpuInit, OffscreenTarget};
use glint_engine::render::{
    GpuTexture, GpuTextureArray, GpuTextureUnits, MultiTextureRenderer, PostFilterRenderer, RenderCtx, RenderTarget,
    SpriteBatchRenderer, SpriteTextures,
};
use glint_engine::shading::{Framebuffer, SpriteInstance, TextureUnits};

use crate::compose::{Composition, PostPass, texture_units};

/// Which texture binding model sprites are drawn with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Binding {
    /// RGBA + grayscale 2D arrays.
    #[default]
    Arrays,
    /// Ten discrete texture units.
    Units,
}

/// Post filter uniforms for time `t`.
fn post_at(post: &PostPass, t: f32) -> PostPass {
    let mut post = post.clone();
    post.uniforms.t = t;
    post
}

// ── CPU ────────────────────────────────────────────────────────────────────

pub struct CpuBackend<'a> {
    comp: &'a Composition,
    units: Option<(TextureUnits, Vec<SpriteInstance>)>,
    instances: Vec<SpriteInstance>,
}

impl<'a> CpuBackend<'a> {
    pub fn new(comp: &'a Composition, binding: Binding) -> Self {
        match binding {
            Binding::Arrays => Self { comp, units: None, instances: comp.sprites.instances().collect() },
            Binding::Units => Self { comp, units: Some(texture_units(comp)), instances: Vec::new() },
        }
    }

    pub fn render(&self, t: f32) -> image::RgbaImage {
        let comp = self.comp;
        let (w, h) = comp.size;
        let mut fb = Framebuffer::new(w, h, comp.background);

        match &self.units {
            Some((units, instances)) => fb.draw_sprites(instances, comp.zoom, t, units),
            None => fb.draw_sprites(&self.instances, comp.zoom, t, &comp.store.textures()),
        }

        if let Some(post) = &comp.post {
            let post = post_at(post, t);
            // The framebuffer is in physical px; apply zoom the way the view matrix does.
            let dest = Rect::new(
                post.dest.origin.x * comp.zoom,
                post.dest.origin.y * comp.zoom,
                post.dest.size.x * comp.zoom,
                post.dest.size.y * comp.zoom,
            );
            fb.draw_post_filter(dest, &post.uniforms, &post.image, post.policy);
        }
        fb.to_image()
    }
}

// ── GPU ────────────────────────────────────────────────────────────────────

enum GpuSprites {
    Arrays { rgba: GpuTextureArray, gray: GpuTextureArray, renderer: SpriteBatchRenderer },
    Units {
        gpu_units: GpuTextureUnits,
        units: TextureUnits,
        instances: Vec<SpriteInstance>,
        renderer: MultiTextureRenderer,
    },
}

/// Headless device, offscreen target and the uploaded scene textures.
pub struct GpuBackend<'a> {
    comp: &'a Composition,
    gpu: Gpu,
    target: OffscreenTarget,
    sprites: GpuSprites,
    post: Option<(GpuTexture, PostFilterRenderer)>,
}

impl<'a> GpuBackend<'a> {
    pub fn new(comp: &'a Composition, binding: Binding, init: GpuInit) -> Result<Self> {
        let gpu = Gpu::new_blocking(init).context("GPU unavailable (try --cpu)")?;
        let (w, h) = comp.size;
        let target = OffscreenTarget::new(&gpu, w, h)?;

        let binding = if binding == Binding::Arrays && !gpu.supports_texture_arrays() {
            log::warn!("adapter lacks texture array support; falling back to texture units");
            Binding::Units
        } else {
            binding
        };

        let (device, queue) = (gpu.device(), gpu.queue());
        let sprites = match binding {
            Binding::Arrays => GpuSprites::Arrays {
                rgba: GpuTextureArray::from_cpu(device, queue, "glint rgba array", comp.store.rgba()),
                gray: GpuTextureArray::from_cpu(device, queue, "glint gray array", comp.store.gray()),
                renderer: SpriteBatchRenderer::new(),
            },
            Binding::Units => {
                let (units, instances) = texture_units(comp);
                GpuSprites::Units {
                    gpu_units: GpuTextureUnits::from_cpu(device, queue, &units),
                    units,
                    instances,
                    renderer: MultiTextureRenderer::new(),
                }
            }
        };
        let post = comp
            .post
            .as_ref()
            .map(|post| (GpuTexture::from_cpu(device, queue, "glint post image", &post.image), PostFilterRenderer::new()));

        Ok(Self { comp, gpu, target, sprites, post })
    }

    pub fn adapter_name(&self) -> String {
        self.gpu.adapter_info().name
    }

    /// Renders one frame at effect time `t` and reads it back.
    ///
    /// Each pass is submitted on its own: renderers rewrite their uniform
    /// buffers on every call.
    pub fn render(&mut self, t: f32) -> Result<image::RgbaImage> {
        let comp = self.comp;
        let (w, h) = comp.size;
        let ctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.target_format(),
            Viewport::from_pixels(w, h),
        )
        .with_zoom(comp.zoom)
        .with_time(t);

        let mut frame = self.gpu.begin_frame(self.target.view());
        self.target.clear(&mut frame.encoder, &frame.view, comp.background);
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            match &mut self.sprites {
                GpuSprites::Arrays { rgba, gray, renderer } => {
                    renderer.render(&ctx, &mut target, &comp.sprites, SpriteTextures { rgba: &*rgba, gray: &*gray });
                }
                GpuSprites::Units { gpu_units, units, instances, renderer } => {
                    renderer.render_instances(&ctx, &mut target, instances, gpu_units, units);
                }
            }
        }
        self.gpu.submit(frame);

        if let (Some((image, renderer)), Some(post)) = (&mut self.post, &comp.post) {
            let post = post_at(post, t);
            let mut frame = self.gpu.begin_frame(self.target.view());
            {
                let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
                renderer.render(&ctx, &mut target, image, post.dest, &post.uniforms, post.policy);
            }
            self.gpu.submit(frame);
        }

        self.target.read_rgba(&self.gpu)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use glam::Vec2;

    use super::*;
    use crate::compose::compose;
    use crate::scene_file::SceneFile;

    fn scene(source: &str) -> Composition {
        compose(&SceneFile::parse(source).unwrap(), Path::new(".")).unwrap()
    }

    #[test]
    fn cpu_frame_has_scene_size_and_background() {
        let comp = scene("size = [8, 6]\nbackground = [0, 0, 1, 1]\n");
        let img = CpuBackend::new(&comp, Binding::Arrays).render(0.0);
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(7, 5).0, [0, 0, 255, 255]);
    }

    #[test]
    fn solid_sprite_fills_its_rect() {
        let comp = scene(
            "size = [8, 8]\nbackground = [0, 0, 0, 1]\n\
             [[sprite]]\nsize = [4, 4]\nposition = [2, 2]\ncolor = [1, 0, 0]\n",
        );
        let img = CpuBackend::new(&comp, Binding::Arrays).render(0.0);
        assert_eq!(img.get_pixel(3, 3).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(6, 6).0, [0, 0, 0, 255]);
    }

    #[test]
    fn zoom_scales_sprites() {
        let comp = scene(
            "size = [8, 8]\nzoom = 2.0\nbackground = [0, 0, 0, 1]\n\
             [[sprite]]\nsize = [2, 2]\ncolor = [0, 1, 0]\n",
        );
        let img = CpuBackend::new(&comp, Binding::Arrays).render(0.0);
        assert_eq!(img.get_pixel(3, 3).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(4, 4).0, [0, 0, 0, 255]);
    }

    #[test]
    fn both_bindings_agree_on_textured_sprites() {
        let comp = scene(
            "size = [16, 16]\n\
             [[noise]]\nname = \"n\"\nsize = 16\ncell = 4\n\
             [[sprite]]\nimage = \"n\"\n",
        );
        let arrays = CpuBackend::new(&comp, Binding::Arrays).render(0.0);
        let units = CpuBackend::new(&comp, Binding::Units).render(0.0);
        assert_eq!(arrays, units);
    }

    #[test]
    fn post_time_is_overridden_per_frame() {
        let comp = scene("[[noise]]\nname = \"n\"\nsize = 8\n[post]\nimage = \"n\"\n");
        let post = post_at(comp.post.as_ref().unwrap(), 3.5);
        assert_eq!(post.uniforms.t, 3.5);
        assert_eq!(post.dest.size, Vec2::splat(8.0));
    }
}

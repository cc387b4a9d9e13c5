use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::coords::Rect;
use crate::render::texture_array::GpuTexture;
use crate::render::{RenderCtx, RenderTarget};
use crate::shading::{OutlinePolicy, PostFilterUniforms};

use super::common::{
    PipelineDesc, QuadBuffers, QuadVertex, create_pipeline, load_pass, nearest_sampler, outline_entry, sampler_entry,
    texture_entry, uniform_entry,
};

/// Host layout of the `Params` uniform in `post_filter.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PostFilterUniform {
    view: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    outline_color: [f32; 4],
    background_color: [f32; 4],
    effect_color: [f32; 4],
    outline_thickness: [f32; 2],
    effect: u32,
    t: f32,
    is_grayscale: u32,
    _pad: [u32; 3],
}

impl PostFilterUniform {
    fn new(view: Mat4, dest: Rect, u: &PostFilterUniforms) -> Self {
        let model = Mat4::from_translation(dest.origin.extend(0.0)) * Mat4::from_scale(Vec3::new(dest.size.x, dest.size.y, 1.0));
        Self {
            view: view.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            outline_color: u.outline_color.to_array(),
            background_color: u.background_color.to_array(),
            effect_color: u.effect_color.to_array(),
            outline_thickness: u.outline_thickness.to_array(),
            effect: u.effect.code(),
            t: u.t,
            is_grayscale: u32::from(u.is_grayscale),
            _pad: [0; 3],
        }
    }
}

/// Renderer for the single-texture post filter.
///
/// Draws one textured quad over `dest` (logical px). The uniform buffer is
/// shared, so one `render` call per submitted encoder.
#[derive(Default)]
pub struct PostFilterRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    count_pipeline: Option<wgpu::RenderPipeline>,
    max_pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    bind_group: Option<wgpu::BindGroup>,
    bound_image: Option<u64>,
    ubo: Option<wgpu::Buffer>,

    quad: Option<QuadBuffers>,
}

impl PostFilterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        img: &GpuTexture,
        dest: Rect,
        uniforms: &PostFilterUniforms,
        policy: OutlinePolicy,
    ) {
        if dest.is_empty() {
            return;
        }

        self.ensure_pipelines(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx, img);

        let Some(ubo) = self.ubo.as_ref() else { return; };
        let uniform = PostFilterUniform::new(ctx.view_matrix(), dest, uniforms);
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));

        let pipeline = match policy {
            OutlinePolicy::CoverageCount => self.count_pipeline.as_ref(),
            OutlinePolicy::MaxAlpha => self.max_pipeline.as_ref(),
        };
        let Some(pipeline)   = pipeline                 else { return; };
        let Some(bind_group) = self.bind_group.as_ref() else { return; };
        let Some(quad)       = self.quad.as_ref()       else { return; };

        let mut rpass = load_pass(target.encoder, target.color_view, "glint post filter pass");
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad.vbo.slice(..));
        rpass.set_index_buffer(quad.ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..1);
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.count_pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glint post filter shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/post_filter.wgsl").into()),
        });

        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glint post filter bgl"),
            entries: &[
                uniform_entry::<PostFilterUniform>(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glint post filter pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let build = |policy: OutlinePolicy, label: &str| {
            create_pipeline(
                ctx.device,
                PipelineDesc {
                    label,
                    shader: &shader,
                    layout: &pipeline_layout,
                    buffers: &[QuadVertex::layout()],
                    fs_entry: outline_entry(policy),
                    format: ctx.target_format,
                },
            )
        };

        self.count_pipeline = Some(build(OutlinePolicy::CoverageCount, "glint post filter (count) pipeline"));
        self.max_pipeline = Some(build(OutlinePolicy::MaxAlpha, "glint post filter (max) pipeline"));
        self.pipeline_format = Some(ctx.target_format);
        self.bind_group_layout = Some(bgl);
        self.bind_group = None;
        self.bound_image = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, img: &GpuTexture) {
        if self.bound_image == Some(img.id()) && self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return; };

        let ubo = self.ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("glint post filter ubo"),
                size: std::mem::size_of::<PostFilterUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        // Neighbor taps past the edge follow the image's own address mode.
        let sampler = nearest_sampler(ctx.device, "glint post filter sampler", img.address_mode().to_wgpu());

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint post filter bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(img.view()) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&sampler) },
            ],
        });

        self.bind_group = Some(bind_group);
        self.bound_image = Some(img.id());
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad.is_none() {
            self.quad = Some(QuadBuffers::new(ctx.device, "glint post filter"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Rgba;
    use crate::shading::PostEffect;
    use glam::Vec2;

    #[test]
    fn uniform_matches_wgsl_size() {
        // two mat4x4 + three vec4 + vec2 + three scalars, rounded to 16 bytes.
        assert_eq!(std::mem::size_of::<PostFilterUniform>(), 208);
    }

    #[test]
    fn uniform_packs_effect_code_and_flags() {
        let u = PostFilterUniforms {
            effect: PostEffect::WavyTint,
            is_grayscale: true,
            outline_color: Rgba::new(0.0, 1.0, 0.0, 0.5),
            ..Default::default()
        };
        let packed = PostFilterUniform::new(Mat4::IDENTITY, Rect::new(0.0, 0.0, 1.0, 1.0), &u);
        assert_eq!(packed.effect, 3);
        assert_eq!(packed.is_grayscale, 1);
        assert_eq!(packed.outline_color, [0.0, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn model_maps_unit_quad_onto_destination() {
        let dest = Rect::new(10.0, 20.0, 30.0, 40.0);
        let packed = PostFilterUniform::new(Mat4::IDENTITY, dest, &PostFilterUniforms::default());
        let model = Mat4::from_cols_array_2d(&packed.model);
        assert_eq!(model.transform_point3(Vec2::ONE.extend(0.0)).truncate(), dest.max());
        assert_eq!(model.transform_point3(Vec3::ZERO).truncate(), dest.min());
    }

    #[test]
    fn each_policy_has_its_own_entry_point() {
        assert_ne!(outline_entry(OutlinePolicy::CoverageCount), outline_entry(OutlinePolicy::MaxAlpha));
        let src = include_str!("shaders/post_filter.wgsl");
        for policy in [OutlinePolicy::CoverageCount, OutlinePolicy::MaxAlpha] {
            assert!(src.contains(&format!("fn {}(", outline_entry(policy))));
        }
    }
}

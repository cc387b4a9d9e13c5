use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::render::texture_array::GpuTextureUnits;
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::SpriteList;
use crate::shading::sources::TEXTURE_UNITS;
use crate::shading::{OutlinePolicy, SpriteInstance, TextureUnits};

use super::common::{
    PipelineDesc, QuadBuffers, QuadVertex, create_pipeline, load_pass, nearest_sampler, outline_entry, sampler_entry,
    texture_entry, uniform_entry,
};

const SAMPLER_BINDING: u32 = TEXTURE_UNITS as u32 + 1;

/// Host layout of `Params` in `multi_texture.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MultiTextureUniform {
    view: [[f32; 4]; 4],
    outline_color: [f32; 4],
    background_color: [f32; 4],
    effect_color: [f32; 4],
    outline_thickness: [f32; 2],
    t: f32,
    is_grayscale: u32,
    effect: u32,
    _pad: [u32; 3],
}

impl MultiTextureUniform {
    fn new(view: Mat4, t: f32, units: &TextureUnits) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            outline_color: units.outline_color.to_array(),
            background_color: units.background_color.to_array(),
            effect_color: units.effect_color.to_array(),
            outline_thickness: units.outline_thickness.to_array(),
            t,
            is_grayscale: u32::from(units.is_grayscale),
            effect: units.effect.code(),
            _pad: [0; 3],
        }
    }
}

/// Sprite renderer for adapters without 2D-array textures.
///
/// Same instance stream and stage order as [`SpriteBatchRenderer`]; textures
/// come from ten discrete units, and the border color, thickness, outline
/// policy and effect code from [`TextureUnits`].
///
/// [`SpriteBatchRenderer`]: super::SpriteBatchRenderer
#[derive(Default)]
pub struct MultiTextureRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    count_pipeline: Option<wgpu::RenderPipeline>,
    max_pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    bind_group: Option<wgpu::BindGroup>,
    bound_units: Option<u64>,
    ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,

    quad: Option<QuadBuffers>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl MultiTextureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        sprites: &SpriteList,
        gpu_units: &GpuTextureUnits,
        units: &TextureUnits,
    ) {
        let instances: Vec<SpriteInstance> = sprites.instances().collect();
        self.render_instances(ctx, target, &instances, gpu_units, units);
    }

    /// `units` supplies the outline / grayscale uniforms; its textures must be
    /// the ones `gpu_units` was created from.
    pub fn render_instances(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        instances: &[SpriteInstance],
        gpu_units: &GpuTextureUnits,
        units: &TextureUnits,
    ) {
        if instances.is_empty() {
            return;
        }

        self.ensure_pipelines(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx, gpu_units);
        self.ensure_instance_capacity(ctx, instances.len());

        let Some(ubo) = self.ubo.as_ref() else { return; };
        let uniform = MultiTextureUniform::new(ctx.view_matrix(), ctx.t, units);
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return; };
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(instances));

        let pipeline = match units.outline_policy {
            OutlinePolicy::CoverageCount => self.count_pipeline.as_ref(),
            OutlinePolicy::MaxAlpha => self.max_pipeline.as_ref(),
        };
        let Some(pipeline)   = pipeline                 else { return; };
        let Some(bind_group) = self.bind_group.as_ref() else { return; };
        let Some(quad)       = self.quad.as_ref()       else { return; };

        let mut rpass = load_pass(target.encoder, target.color_view, "glint multi-texture pass");
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad.vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad.ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..instances.len() as u32);
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.count_pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glint multi-texture shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/multi_texture.wgsl").into()),
        });

        let mut entries = vec![uniform_entry::<MultiTextureUniform>(0, wgpu::ShaderStages::VERTEX_FRAGMENT)];
        entries.extend((1..=TEXTURE_UNITS as u32).map(|b| texture_entry(b, wgpu::TextureViewDimension::D2)));
        entries.push(sampler_entry(SAMPLER_BINDING));

        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glint multi-texture bgl"),
            entries: &entries,
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glint multi-texture pipeline layout"),
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
                    buffers: &[QuadVertex::layout(), SpriteInstance::layout()],
                    fs_entry: outline_entry(policy),
                    format: ctx.target_format,
                },
            )
        };

        self.count_pipeline = Some(build(OutlinePolicy::CoverageCount, "glint multi-texture (count) pipeline"));
        self.max_pipeline = Some(build(OutlinePolicy::MaxAlpha, "glint multi-texture (max) pipeline"));
        self.pipeline_format = Some(ctx.target_format);
        self.bind_group_layout = Some(bgl);
        self.bind_group = None;
        self.bound_units = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, gpu_units: &GpuTextureUnits) {
        if self.bound_units == Some(gpu_units.id()) && self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return; };

        let sampler = self
            .sampler
            .get_or_insert_with(|| nearest_sampler(ctx.device, "glint multi-texture sampler", wgpu::AddressMode::ClampToEdge));
        let ubo = self.ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("glint multi-texture ubo"),
                size: std::mem::size_of::<MultiTextureUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let mut entries = vec![wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() }];
        entries.extend(gpu_units.views().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: i as u32 + 1,
            resource: wgpu::BindingResource::TextureView(view),
        }));
        entries.push(wgpu::BindGroupEntry { binding: SAMPLER_BINDING, resource: wgpu::BindingResource::Sampler(sampler) });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint multi-texture bind group"),
            layout: bgl,
            entries: &entries,
        });

        self.bind_group = Some(bind_group);
        self.bound_units = Some(gpu_units.id());
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad.is_none() {
            self.quad = Some(QuadBuffers::new(ctx.device, "glint multi-texture"));
        }
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap  = required.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<SpriteInstance>()) as u64;
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint multi-texture instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Rgba;
    use crate::shading::PostEffect;

    #[test]
    fn uniform_matches_wgsl_size() {
        // mat4 + three vec4 + vec2 + three scalars, rounded up to 16 bytes.
        assert_eq!(std::mem::size_of::<MultiTextureUniform>(), 144);
    }

    #[test]
    fn uniform_carries_effect_settings() {
        let mut units = TextureUnits::new();
        units.effect = PostEffect::WavyTint;
        units.background_color = Rgba::new(0.0, 0.0, 1.0, 1.0);
        units.effect_color = Rgba::new(1.0, 0.5, 0.0, 0.25);
        let u = MultiTextureUniform::new(Mat4::IDENTITY, 0.0, &units);
        assert_eq!(u.effect, 3);
        assert_eq!(u.background_color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(u.effect_color, [1.0, 0.5, 0.0, 0.25]);
    }

    #[test]
    fn each_policy_has_its_own_entry_point() {
        let src = include_str!("shaders/multi_texture.wgsl");
        for policy in [OutlinePolicy::CoverageCount, OutlinePolicy::MaxAlpha] {
            assert!(src.contains(&format!("@fragment\nfn {}(", outline_entry(policy))), "{policy:?}");
        }
        assert!(src.contains("effect: u32,\n};"));
    }

    #[test]
    fn uniform_carries_outline_settings() {
        let mut units = TextureUnits::new();
        units.outline_color = Rgba::new(1.0, 0.0, 0.0, 1.0);
        units.outline_thickness = glam::Vec2::new(0.01, 0.02);
        units.is_grayscale = true;
        let u = MultiTextureUniform::new(Mat4::IDENTITY, 2.5, &units);
        assert_eq!(u.outline_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(u.outline_thickness, [0.01, 0.02]);
        assert_eq!(u.t, 2.5);
        assert_eq!(u.is_grayscale, 1);
    }

    #[test]
    fn sampler_follows_the_last_unit() {
        let src = include_str!("shaders/multi_texture.wgsl");
        assert!(src.contains(&format!("@binding({SAMPLER_BINDING}) var samp")));
        assert!(src.contains(&format!("@binding({TEXTURE_UNITS}) var texture9")));
    }
}

use crate::render::texture_array::GpuTextureArray;
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::SpriteList;
use crate::shading::SpriteInstance;

use super::common::{
    FrameUniform, PipelineDesc, QuadBuffers, QuadVertex, create_pipeline, load_pass, nearest_sampler, sampler_entry,
    texture_entry, uniform_entry,
};

/// The two texture arrays bound as `texture_rgba` and `texture_gray`.
#[derive(Copy, Clone)]
pub struct SpriteTextures<'a> {
    pub rgba: &'a GpuTextureArray,
    pub gray: &'a GpuTextureArray,
}

impl SpriteTextures<'_> {
    fn key(&self) -> (u64, u64) {
        (self.rgba.id(), self.gray.id())
    }
}

/// Renderer for the sprite batch shader.
///
/// One instanced draw per call: every [`SpriteInstance`] becomes a unit quad
/// transformed and shaded by `sprite_batch.wgsl`.
pub struct SpriteBatchRenderer {
    // pipeline
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    // bindings (rebuilt when the bound arrays change)
    bind_group: Option<wgpu::BindGroup>,
    bound_textures: Option<(u64, u64)>,
    frame_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,

    // geometry
    quad: Option<QuadBuffers>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl Default for SpriteBatchRenderer {
    fn default() -> Self {
        Self {
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            bound_textures: None,
            frame_ubo: None,
            sampler: None,
            quad: None,
            instance_vbo: None,
            instance_capacity: 0,
        }
    }
}

impl SpriteBatchRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `sprites` in paint order.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        sprites: &SpriteList,
        textures: SpriteTextures<'_>,
    ) {
        let instances: Vec<SpriteInstance> = sprites.instances().collect();
        self.render_instances(ctx, target, &instances, textures);
    }

    /// Renders raw instances in slice order.
    pub fn render_instances(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        instances: &[SpriteInstance],
        textures: SpriteTextures<'_>,
    ) {
        if instances.is_empty() {
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx, textures);
        self.write_frame_uniform(ctx, textures);
        self.ensure_instance_capacity(ctx, instances.len());

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return; };
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(instances));

        let Some(pipeline)   = self.pipeline.as_ref()   else { return; };
        let Some(bind_group) = self.bind_group.as_ref() else { return; };
        let Some(quad)       = self.quad.as_ref()       else { return; };

        let mut rpass = load_pass(target.encoder, target.color_view, "glint sprite batch pass");
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad.vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad.ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..instances.len() as u32);
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glint sprite batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite_batch.wgsl").into()),
        });

        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glint sprite batch bgl"),
            entries: &[
                uniform_entry::<FrameUniform>(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::D2Array),
                texture_entry(2, wgpu::TextureViewDimension::D2Array),
                sampler_entry(3),
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glint sprite batch pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = create_pipeline(
            ctx.device,
            PipelineDesc {
                label: "glint sprite batch pipeline",
                shader: &shader,
                layout: &pipeline_layout,
                buffers: &[QuadVertex::layout(), SpriteInstance::layout()],
                fs_entry: "fs_main",
                format: ctx.target_format,
            },
        );

        self.pipeline_format = Some(ctx.target_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bgl);
        self.bind_group = None;
        self.bound_textures = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, textures: SpriteTextures<'_>) {
        if self.bound_textures == Some(textures.key()) && self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return; };

        let sampler = self
            .sampler
            .get_or_insert_with(|| nearest_sampler(ctx.device, "glint sprite batch sampler", wgpu::AddressMode::ClampToEdge));
        let frame_ubo = self.frame_ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("glint sprite batch frame ubo"),
                size: std::mem::size_of::<FrameUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint sprite batch bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: frame_ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(textures.rgba.view()) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(textures.gray.view()) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        self.bind_group = Some(bind_group);
        self.bound_textures = Some(textures.key());
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad.is_none() {
            self.quad = Some(QuadBuffers::new(ctx.device, "glint sprite batch"));
        }
    }

    fn write_frame_uniform(&self, ctx: &RenderCtx<'_>, textures: SpriteTextures<'_>) {
        let Some(ubo) = self.frame_ubo.as_ref() else { return; };
        let uniform = FrameUniform::new(
            ctx.view_matrix(),
            ctx.t,
            textures.rgba.layer_count(),
            textures.gray.layer_count(),
        );
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap  = required.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<SpriteInstance>()) as u64;
        log::debug!("SpriteBatchRenderer: growing instance buffer to {new_cap}");
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint sprite batch instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

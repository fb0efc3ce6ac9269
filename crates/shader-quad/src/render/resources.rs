use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::common::{QuadParams, QUAD_INDICES, QUAD_VERTICES};
use super::program::CompiledProgram;
use super::RenderCtx;
use crate::coords::ActorBox;
use crate::pipeline::{LayerTexture, Pipeline};

/// GPU buffers owned by one pipeline.
///
/// Created on the pipeline's first draw, never shared: a cloned pipeline
/// starts without resources so uniform writes cannot leak between quads.
pub(crate) struct PipelineResources {
    params_ubo: wgpu::Buffer,
    uniforms_ubo: wgpu::Buffer,
    uniforms_generation: Option<u64>,

    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,

    null_view: wgpu::TextureView,
    sampler: wgpu::Sampler,

    bind_group: Option<wgpu::BindGroup>,
    bound_program: Option<Arc<CompiledProgram>>,
    bound_layer_generation: u64,
}

impl PipelineResources {
    pub(crate) fn new(ctx: &RenderCtx<'_>, pipeline: &Pipeline) -> Self {
        let params_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shader-quad params ubo"),
            size: std::mem::size_of::<QuadParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let quad_vbo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shader-quad quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_ibo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shader-quad quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shader-quad layer sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            params_ubo,
            uniforms_ubo: create_uniforms_ubo(ctx, pipeline.uniforms().as_bytes().len()),
            uniforms_generation: None,
            quad_vbo,
            quad_ibo,
            null_view: create_null_texture(ctx),
            sampler,
            bind_group: None,
            bound_program: None,
            bound_layer_generation: 0,
        }
    }

    /// Uploads per-draw state and rebinds if the program or layer texture changed.
    pub(crate) fn sync(
        &mut self,
        ctx: &RenderCtx<'_>,
        program: &Arc<CompiledProgram>,
        pipeline: &Pipeline,
        rect: ActorBox,
    ) {
        let params = QuadParams {
            rect: rect.to_array(),
            color: pipeline.color().to_array(),
            viewport: ctx.viewport.clamped(),
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(&self.params_ubo, 0, bytemuck::bytes_of(&params));

        let bytes = pipeline.uniforms().as_bytes();
        if self.uniforms_ubo.size() != bytes.len() as u64 {
            // Declarations changed since the buffer was sized.
            self.uniforms_ubo = create_uniforms_ubo(ctx, bytes.len());
            self.uniforms_generation = None;
            self.bind_group = None;
        }

        let generation = pipeline.uniforms().generation();
        if self.uniforms_generation != Some(generation) {
            ctx.queue.write_buffer(&self.uniforms_ubo, 0, bytes);
            self.uniforms_generation = Some(generation);
        }

        let program_changed = self
            .bound_program
            .as_ref()
            .is_none_or(|bound| !Arc::ptr_eq(bound, program));
        if self.bind_group.is_none()
            || program_changed
            || self.bound_layer_generation != pipeline.layer_generation()
        {
            self.rebind(ctx, program, pipeline);
        }
    }

    fn rebind(&mut self, ctx: &RenderCtx<'_>, program: &Arc<CompiledProgram>, pipeline: &Pipeline) {
        let view = match pipeline.layer().texture() {
            LayerTexture::Null => &self.null_view,
            LayerTexture::View(view) => view.as_ref(),
        };

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shader-quad bind group"),
            layout: &program.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.uniforms_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
        self.bound_program = Some(Arc::clone(program));
        self.bound_layer_generation = pipeline.layer_generation();
    }

    /// Records one indexed quad draw in its own pass.
    pub(crate) fn draw(&self, encoder: &mut wgpu::CommandEncoder, color_view: &wgpu::TextureView) {
        let Some(program) = self.bound_program.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shader-quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&program.render_pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }
}

fn create_uniforms_ubo(ctx: &RenderCtx<'_>, size: usize) -> wgpu::Buffer {
    ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("shader-quad uniforms ubo"),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// 1x1 opaque white texture bound when the layer has no texture.
fn create_null_texture(ctx: &RenderCtx<'_>) -> wgpu::TextureView {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("shader-quad null texture"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[255u8; 4],
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

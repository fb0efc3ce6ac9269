use std::sync::{Arc, Mutex, PoisonError};

use super::common::{params_min_binding_size, QuadVertex};
use super::scope::capture_validation;
use super::RenderCtx;
use crate::error::QuadError;
use crate::pipeline::Pipeline;

/// A compiled quad program for one target format and blend function.
pub(crate) struct CompiledProgram {
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    pub(crate) render_pipeline: wgpu::RenderPipeline,
    pub(crate) bind_group_layout: wgpu::BindGroupLayout,
}

/// Compiled programs shared by a pipeline and its clones.
///
/// Every quad of a shader type clones the same base pipeline, so the WGSL
/// module is validated and compiled once per type and target format.
#[derive(Default)]
pub(crate) struct ProgramCache {
    compiled: Mutex<Vec<Arc<CompiledProgram>>>,
}

impl ProgramCache {
    pub(crate) fn get_or_compile(
        &self,
        ctx: &RenderCtx<'_>,
        pipeline: &Pipeline,
    ) -> Result<Arc<CompiledProgram>, QuadError> {
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);

        let blend = pipeline.blend();
        if let Some(program) = compiled
            .iter()
            .find(|p| p.format == ctx.surface_format && p.blend == blend)
        {
            return Ok(Arc::clone(program));
        }

        let source = pipeline.validate().inspect_err(|e| {
            log::error!("quad program rejected: {e}");
        })?;
        let (program, error) = capture_validation(ctx.device, || compile(ctx, &source, blend));
        if let Some(error) = error {
            log::error!("quad program failed to compile: {error}");
            return Err(QuadError::Shader { message: error.to_string() });
        }
        let program = Arc::new(program);
        log::debug!(
            "compiled quad program for {:?} ({} bytes of WGSL)",
            ctx.surface_format,
            source.len()
        );

        compiled.push(Arc::clone(&program));
        Ok(program)
    }
}

fn compile(ctx: &RenderCtx<'_>, source: &str, blend: wgpu::BlendState) -> CompiledProgram {
    let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("shader-quad program"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let uniform_entry = |binding: u32, min_binding_size| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size,
        },
        count: None,
    };

    let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("shader-quad bgl"),
        entries: &[
            uniform_entry(0, Some(params_min_binding_size())),
            uniform_entry(1, None),
            // Layer 0 is readable from both stages: vertex snippets may use
            // `textureSampleLevel`.
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shader-quad pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let render_pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shader-quad pipeline"),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[QuadVertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: ctx.surface_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    CompiledProgram {
        format: ctx.surface_format,
        blend,
        render_pipeline,
        bind_group_layout,
    }
}

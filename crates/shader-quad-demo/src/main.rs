use anyhow::Result;
use shader_quad::coords::ActorBox;
use shader_quad::device::{GpuInit, HeadlessGpu};
use shader_quad::logging::{init_logging, LoggingConfig};
use shader_quad::pipeline::SnippetHook;
use shader_quad::render::{GpuFramebuffer, RenderTarget};
use shader_quad::{QuadError, QuadShader, ShaderQuad};

/// Darkens the quad towards its edges, tinted by a per-instance color.
struct Vignette;

impl QuadShader for Vignette {
    fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
        quad.declare_uniform("tint", 4)?;
        quad.declare_uniform("radius", 1)?;
        quad.add_glsl_snippet(
            SnippetHook::Fragment,
            None,
            "let d = distance(in.tex_coord0, vec2<f32>(0.5, 0.5));\n\
             let falloff = 1.0 - smoothstep(uniforms.radius * 0.5, uniforms.radius, d);\n\
             frag = frag * uniforms.tint * falloff;",
            false,
        )
    }
}

fn vignette(alloc: ActorBox, tint: [f32; 4], radius: f32) -> Result<ShaderQuad<Vignette>> {
    let mut quad = ShaderQuad::new(Vignette)?;
    quad.set_allocation(alloc);

    let tint_loc = quad.get_uniform_location("tint");
    quad.set_uniform_float(tint_loc, 4, 4, &tint)?;
    let radius_loc = quad.get_uniform_location("radius");
    quad.set_uniform_float(radius_loc, 1, 1, &[radius])?;

    Ok(quad)
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let gpu = pollster::block_on(HeadlessGpu::new(GpuInit::default()))?;
    let target = gpu.create_target(320, 200);

    let mut quads = [
        vignette(ActorBox::from_origin_size(16.0, 16.0, 136.0, 168.0), [1.0, 0.4, 0.2, 1.0], 0.6)?,
        vignette(ActorBox::from_origin_size(168.0, 16.0, 136.0, 168.0), [0.2, 0.6, 1.0, 1.0], 0.8)?,
    ];
    quads[1].set_paint_opacity(192);

    let mut encoder = gpu.create_encoder("shader-quad demo encoder");
    target.clear(&mut encoder, wgpu::Color::BLACK);
    {
        let ctx = gpu.render_ctx(target.viewport());
        let mut fb = GpuFramebuffer::new(ctx, RenderTarget::new(&mut encoder, &target.view));
        for quad in &mut quads {
            quad.paint(&mut fb)?;
        }
    }
    gpu.submit(encoder);

    for quad in &quads {
        log::info!("painted {:?}", quad.paint_volume().bounds);
    }
    log::info!(
        "rendered {} vignette quads on {}",
        quads.len(),
        gpu.adapter_info().name
    );

    Ok(())
}

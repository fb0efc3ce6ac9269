use std::sync::Arc;

use super::scope::capture_validation;
use super::{PipelineResources, RenderCtx, RenderTarget};
use crate::coords::ActorBox;
use crate::error::QuadError;
use crate::pipeline::Pipeline;

/// A surface quads can draw filled rectangles into.
pub trait Framebuffer {
    /// Draws `rect` (logical px) with `pipeline`.
    ///
    /// Takes the pipeline mutably so implementations can keep per-pipeline
    /// GPU state inside it.
    fn draw_rectangle(&mut self, pipeline: &mut Pipeline, rect: ActorBox) -> Result<(), QuadError>;
}

/// wgpu framebuffer: records each rectangle as one indexed draw in its own
/// render pass, loading the existing target contents.
pub struct GpuFramebuffer<'a> {
    ctx: RenderCtx<'a>,
    target: RenderTarget<'a>,
}

impl<'a> GpuFramebuffer<'a> {
    #[inline]
    pub fn new(ctx: RenderCtx<'a>, target: RenderTarget<'a>) -> Self {
        Self { ctx, target }
    }
}

impl Framebuffer for GpuFramebuffer<'_> {
    fn draw_rectangle(&mut self, pipeline: &mut Pipeline, rect: ActorBox) -> Result<(), QuadError> {
        let rect = rect.normalized();
        if rect.is_empty() || !rect.is_finite() {
            log::trace!("skipping degenerate quad rect {rect:?}");
            return Ok(());
        }

        let program = Arc::clone(&pipeline.program).get_or_compile(&self.ctx, pipeline)?;

        let (resources, error) = capture_validation(self.ctx.device, || {
            let mut resources = pipeline
                .gpu
                .take()
                .unwrap_or_else(|| PipelineResources::new(&self.ctx, pipeline));
            resources.sync(&self.ctx, &program, pipeline, rect);
            resources
        });
        if let Some(error) = error {
            // Resources are dropped; the next paint recreates them.
            log::error!("quad resources rejected: {error}");
            return Err(QuadError::Gpu { message: error.to_string() });
        }

        resources.draw(&mut *self.target.encoder, self.target.color_view);
        pipeline.gpu = Some(resources);

        Ok(())
    }
}

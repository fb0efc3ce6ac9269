//! GPU rendering.
//!
//! Quads draw through the [`Framebuffer`] seam. [`GpuFramebuffer`] is the
//! wgpu implementation: it compiles pipeline programs, owns nothing itself
//! and keeps per-pipeline buffers inside the [`Pipeline`](crate::pipeline::Pipeline).
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shader converts to NDC using a viewport uniform.

mod common;
mod ctx;
mod framebuffer;
mod program;
mod resources;
mod scope;

pub use ctx::{RenderCtx, RenderTarget};
pub use framebuffer::{Framebuffer, GpuFramebuffer};

pub(crate) use program::ProgramCache;
pub(crate) use resources::PipelineResources;

//! The shader quad drawable.
//!
//! Flow: `ShaderQuad::<S>::new` builds the base pipeline for `S` on first use
//! (running `S::build_pipeline` once per process), clones it into the new
//! instance, and every `paint` sets the opacity color and draws one rectangle.

mod shader_quad;
mod template;
mod volume;

pub use shader_quad::{QuadShader, ShaderQuad};
pub use volume::PaintVolume;

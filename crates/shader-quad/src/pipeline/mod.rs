//! CPU-side pipeline objects.
//!
//! A [`Pipeline`] describes everything needed to draw one quad: blend
//! function, color, WGSL snippets, a single texture layer and a block of
//! user-declared uniforms. It composes its own WGSL program; compiling that
//! program and owning GPU buffers is left to `render`.
//!
//! Cloning a pipeline deep-copies its mutable state (color, uniform values,
//! layer binding). The compiled program is shared between clones.

mod blend;
mod compose;
mod layer;
mod pipeline;
mod snippet;
mod uniform;

pub use blend::{premul_alpha_blend, standard_alpha_blend};
pub use layer::{Layer, LayerTexture};
pub use pipeline::Pipeline;
pub use snippet::{Snippet, SnippetHook};
pub use uniform::{UniformBlock, UniformDecl, UNIFORM_NOT_FOUND};

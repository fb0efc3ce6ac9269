//! Shader quad crate.
//!
//! A [`ShaderQuad`] draws one rectangle sized to its allocation box through a
//! wgpu pipeline that its shader type customizes with WGSL snippets. The base
//! pipeline is built once per shader type and cloned into every instance.

pub mod coords;
pub mod device;
pub mod error;
pub mod logging;
pub mod paint;
pub mod pipeline;
pub mod quad;
pub mod render;

pub use error::QuadError;
pub use quad::{PaintVolume, QuadShader, ShaderQuad};

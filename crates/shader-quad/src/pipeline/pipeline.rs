use std::fmt;
use std::sync::Arc;

use super::{
    compose, premul_alpha_blend, Layer, LayerTexture, Snippet, UniformBlock,
};
use crate::error::QuadError;
use crate::paint::Color;
use crate::render::{PipelineResources, ProgramCache};

/// A drawable pipeline description.
///
/// Snippets and uniform declarations define the program; color, uniform
/// values and the layer texture are per-draw state. Changing the program
/// (adding a snippet or declaring a uniform) detaches this pipeline from any
/// program it shared with clones.
pub struct Pipeline {
    blend: wgpu::BlendState,
    color: Color,
    snippets: Vec<Snippet>,
    layer: Layer,
    layer_generation: u64,
    uniforms: UniformBlock,

    pub(crate) program: Arc<ProgramCache>,
    pub(crate) gpu: Option<PipelineResources>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            blend: premul_alpha_blend(),
            color: Color::white(),
            snippets: Vec::new(),
            layer: Layer::default(),
            layer_generation: 0,
            uniforms: UniformBlock::new(),
            program: Arc::new(ProgramCache::default()),
            gpu: None,
        }
    }
}

impl Clone for Pipeline {
    /// Copies all state; GPU buffers are recreated for the copy on its first draw.
    fn clone(&self) -> Self {
        Self {
            blend: self.blend,
            color: self.color,
            snippets: self.snippets.clone(),
            layer: self.layer.clone(),
            layer_generation: self.layer_generation,
            uniforms: self.uniforms.clone(),
            program: Arc::clone(&self.program),
            gpu: None,
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("blend", &self.blend)
            .field("color", &self.color)
            .field("snippets", &self.snippets)
            .field("layer", &self.layer)
            .field("uniforms", &self.uniforms)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    // ── draw state ─────────────────────────────────────────────────────────

    #[inline]
    pub fn blend(&self) -> wgpu::BlendState {
        self.blend
    }

    pub fn set_blend(&mut self, blend: wgpu::BlendState) {
        self.blend = blend;
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Sets the color from premultiplied bytes.
    pub fn set_color4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.color = Color::from_premul_u8(r, g, b, a);
    }

    // ── snippets ───────────────────────────────────────────────────────────

    /// Attaches a `Vertex` or `Fragment` snippet.
    pub fn add_snippet(&mut self, snippet: Snippet) -> Result<(), QuadError> {
        if !snippet.hook().targets_pipeline() {
            return Err(QuadError::HookMismatch { hook: snippet.hook() });
        }
        self.snippets.push(snippet);
        self.detach_program();
        Ok(())
    }

    /// Attaches a layer hook snippet to layer 0.
    pub fn add_layer_snippet(&mut self, snippet: Snippet) -> Result<(), QuadError> {
        self.layer.add_snippet(snippet)?;
        self.detach_program();
        Ok(())
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    // ── layer ──────────────────────────────────────────────────────────────

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn set_layer_texture(&mut self, view: Arc<wgpu::TextureView>) {
        self.layer.set_texture(LayerTexture::View(view));
        self.layer_generation += 1;
    }

    /// Unbinds the layer texture; the layer samples opaque white.
    pub fn set_layer_null_texture(&mut self) {
        self.layer.set_texture(LayerTexture::Null);
        self.layer_generation += 1;
    }

    pub(crate) fn layer_generation(&self) -> u64 {
        self.layer_generation
    }

    // ── uniforms ───────────────────────────────────────────────────────────

    /// Declares a scalar or vector uniform; see [`UniformBlock`] for layout.
    pub fn declare_uniform(&mut self, name: &str, n_components: usize) -> Result<i32, QuadError> {
        let location = self.uniforms.declare(name, n_components, None)?;
        self.detach_program();
        Ok(location)
    }

    pub fn declare_uniform_array(
        &mut self,
        name: &str,
        n_components: usize,
        len: usize,
    ) -> Result<i32, QuadError> {
        let location = self.uniforms.declare(name, n_components, Some(len))?;
        self.detach_program();
        Ok(location)
    }

    /// Location of the uniform called `name`, or [`super::UNIFORM_NOT_FOUND`].
    pub fn uniform_location(&self, name: &str) -> i32 {
        self.uniforms.location(name)
    }

    /// Writes `count` vectors of `n_components` floats to the uniform at `location`.
    pub fn set_uniform_float(
        &mut self,
        location: i32,
        n_components: usize,
        count: usize,
        values: &[f32],
    ) -> Result<(), QuadError> {
        self.uniforms.set_float(location, n_components, count, values)
    }

    pub fn uniform_values(&self, location: i32) -> Option<&[f32]> {
        self.uniforms.values(location)
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    // ── program ────────────────────────────────────────────────────────────

    /// The WGSL module this pipeline draws with.
    pub fn source(&self) -> String {
        compose::compose(self)
    }

    /// Composes the program and runs it through the WGSL frontend and validator.
    ///
    /// Returns the validated source.
    pub fn validate(&self) -> Result<String, QuadError> {
        let source = self.source();
        compose::validate(&source)?;
        Ok(source)
    }

    /// Programs are shared by clones, so any change to program inputs gets a fresh cache.
    fn detach_program(&mut self) {
        self.program = Arc::new(ProgramCache::default());
    }
}

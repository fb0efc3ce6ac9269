use std::any::type_name;
use std::sync::Arc;

use super::template::{self, Lookup};
use super::PaintVolume;
use crate::coords::ActorBox;
use crate::error::QuadError;
use crate::pipeline::{Pipeline, Snippet, SnippetHook, UNIFORM_NOT_FOUND};
use crate::render::Framebuffer;

/// Shader type of a [`ShaderQuad`].
///
/// The implementing type identifies the shared base pipeline: all quads of
/// one type clone the same template. Per-quad state lives in the value.
pub trait QuadShader: Sized + 'static {
    /// Customizes the base pipeline.
    ///
    /// Called at most once per process, while constructing the first quad of
    /// this type. Only snippet injection and uniform declaration are valid
    /// here; `quad` is the instance under construction.
    fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
        let _ = quad;
        Ok(())
    }
}

/// A rectangle drawn with a snippet-customized pipeline, sized to its allocation.
pub struct ShaderQuad<S: QuadShader> {
    shader: S,
    allocation: ActorBox,
    paint_opacity: u8,
    pipeline: Pipeline,
    constructing: bool,
}

impl<S: QuadShader> ShaderQuad<S> {
    /// Creates a quad, building the base pipeline for `S` if needed.
    ///
    /// If `S::build_pipeline` fails, the half-built base pipeline is
    /// discarded and the next construction runs the hook again.
    ///
    /// Quads are meant to be created from a single rendering thread.
    /// Construction does not wait for a build in progress: constructing `S`
    /// from inside its own hook, or from another thread while the hook runs,
    /// returns [`QuadError::BuildInProgress`].
    pub fn new(shader: S) -> Result<Self, QuadError> {
        let mut quad = Self {
            shader,
            allocation: ActorBox::default(),
            paint_opacity: u8::MAX,
            pipeline: Pipeline::new(),
            constructing: true,
        };

        let template = match template::lookup::<S>().map_err(report)? {
            Lookup::Ready(template) => template,
            Lookup::Build(guard) => {
                log::debug!("building base pipeline for {}", type_name::<S>());
                S::build_pipeline(&quad)?;
                guard.commit()?
            }
        };

        quad.pipeline = Pipeline::clone(&template);
        quad.pipeline.set_layer_null_texture();
        quad.constructing = false;
        Ok(quad)
    }

    /// Returns `true` once the base pipeline for `S` has been built.
    pub fn is_template_built() -> bool {
        template::is_ready::<S>()
    }

    // ── build hook API ─────────────────────────────────────────────────────

    /// Adds a WGSL snippet to the base pipeline.
    ///
    /// With `replace`, `code` becomes the whole body at `hook`; otherwise it
    /// runs after the default body. `declarations` go to module scope.
    /// `Vertex` and `Fragment` attach to the pipeline, other hooks to layer 0.
    ///
    /// Only valid inside [`QuadShader::build_pipeline`].
    pub fn add_glsl_snippet(
        &self,
        hook: SnippetHook,
        declarations: Option<&str>,
        code: &str,
        replace: bool,
    ) -> Result<(), QuadError> {
        self.ensure_constructing()?;

        let snippet = if replace {
            let mut snippet = Snippet::new(hook, declarations, None);
            snippet.set_replace(code);
            snippet
        } else {
            Snippet::new(hook, declarations, Some(code))
        };

        template::with_building::<S, _>(|base| {
            if hook.targets_pipeline() {
                base.add_snippet(snippet)
            } else {
                base.add_layer_snippet(snippet)
            }
        })
        .map_err(report)
    }

    /// Declares a scalar or vector uniform (`n_components` in `1..=4`),
    /// readable as `uniforms.<name>`. Only valid inside the build hook.
    pub fn declare_uniform(&self, name: &str, n_components: usize) -> Result<(), QuadError> {
        self.ensure_constructing()?;
        template::with_building::<S, _>(|base| base.declare_uniform(name, n_components))
            .map(drop)
            .map_err(report)
    }

    /// Declares an array uniform of `len` vectors, each padded to `vec4<f32>`.
    /// Only valid inside the build hook.
    pub fn declare_uniform_array(
        &self,
        name: &str,
        n_components: usize,
        len: usize,
    ) -> Result<(), QuadError> {
        self.ensure_constructing()?;
        template::with_building::<S, _>(|base| base.declare_uniform_array(name, n_components, len))
            .map(drop)
            .map_err(report)
    }

    fn ensure_constructing(&self) -> Result<(), QuadError> {
        if self.constructing {
            Ok(())
        } else {
            Err(report(QuadError::NotInBuildHook { shader: type_name::<S>() }))
        }
    }

    // ── uniforms ───────────────────────────────────────────────────────────

    /// Location of the uniform called `name`, or `-1` if there is none.
    pub fn get_uniform_location(&self, name: &str) -> i32 {
        if self.constructing {
            return UNIFORM_NOT_FOUND;
        }
        self.pipeline.uniform_location(name)
    }

    /// Writes `total_count / n_components` vectors of `n_components` floats
    /// from `values` into the uniform at `location`.
    pub fn set_uniform_float(
        &mut self,
        location: i32,
        n_components: usize,
        total_count: usize,
        values: &[f32],
    ) -> Result<(), QuadError> {
        if !(1..=4).contains(&n_components) {
            return Err(report(QuadError::InvalidComponents { n_components }));
        }
        if total_count % n_components != 0 {
            return Err(report(QuadError::MisalignedCount { n_components, total_count }));
        }
        if values.len() < total_count {
            return Err(report(QuadError::ShortBuffer {
                expected: total_count,
                actual: values.len(),
            }));
        }

        self.pipeline
            .set_uniform_float(location, n_components, total_count / n_components, &values[..total_count])
            .map_err(report)
    }

    // ── host-facing state ──────────────────────────────────────────────────

    pub fn shader(&self) -> &S {
        &self.shader
    }

    pub fn shader_mut(&mut self) -> &mut S {
        &mut self.shader
    }

    /// The instance pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[inline]
    pub fn allocation(&self) -> ActorBox {
        self.allocation
    }

    pub fn set_allocation(&mut self, allocation: ActorBox) {
        self.allocation = allocation;
    }

    #[inline]
    pub fn paint_opacity(&self) -> u8 {
        self.paint_opacity
    }

    pub fn set_paint_opacity(&mut self, opacity: u8) {
        self.paint_opacity = opacity;
    }

    /// Binds `view` to layer 0, or restores the null texture with `None`.
    pub fn set_layer_texture(&mut self, view: Option<Arc<wgpu::TextureView>>) {
        match view {
            Some(view) => self.pipeline.set_layer_texture(view),
            None => self.pipeline.set_layer_null_texture(),
        }
    }

    /// Region touched by [`paint`](Self::paint): the allocation itself.
    pub fn paint_volume(&self) -> PaintVolume {
        PaintVolume::from_allocation(self.allocation)
    }

    // ── paint ──────────────────────────────────────────────────────────────

    /// Draws the allocation box.
    ///
    /// The pipeline color is set to `(o, o, o, o)` for paint opacity `o`, so
    /// any tint has to come from snippets and uniforms.
    pub fn paint(&mut self, fb: &mut dyn Framebuffer) -> Result<(), QuadError> {
        let o = self.paint_opacity;
        self.pipeline.set_color4ub(o, o, o, o);
        fb.draw_rectangle(&mut self.pipeline, self.allocation)
    }
}

impl<S: QuadShader + std::fmt::Debug> std::fmt::Debug for ShaderQuad<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderQuad")
            .field("shader", &self.shader)
            .field("allocation", &self.allocation)
            .field("paint_opacity", &self.paint_opacity)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

/// Logs a contract violation before handing it back to the caller.
fn report(err: QuadError) -> QuadError {
    if err.is_precondition() {
        log::error!("{err}");
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    // One type per test: tests run on parallel threads and share the template cache.
    struct Plain;
    impl QuadShader for Plain {}

    struct Boxed;
    impl QuadShader for Boxed {}

    struct Counted;
    impl QuadShader for Counted {}

    #[test]
    fn default_hook_leaves_standard_template() {
        let quad = ShaderQuad::new(Plain).unwrap();
        assert!(ShaderQuad::<Plain>::is_template_built());
        assert!(quad.pipeline().snippets().is_empty());
        assert!(quad.pipeline().layer().texture().is_null());
        assert_eq!(quad.paint_opacity(), 255);
    }

    #[test]
    fn paint_volume_is_the_allocation() {
        let mut quad = ShaderQuad::new(Boxed).unwrap();
        let alloc = ActorBox::new(4.0, 8.0, 64.0, 40.0);
        quad.set_allocation(alloc);
        assert_eq!(quad.paint_volume().bounds, alloc);
    }

    #[test]
    fn set_uniform_float_checks_counts_before_lookup() {
        let mut quad = ShaderQuad::new(Counted).unwrap();
        assert!(matches!(
            quad.set_uniform_float(0, 3, 4, &[0.0; 4]),
            Err(QuadError::MisalignedCount { n_components: 3, total_count: 4 })
        ));
        assert!(matches!(
            quad.set_uniform_float(0, 2, 4, &[0.0; 2]),
            Err(QuadError::ShortBuffer { expected: 4, actual: 2 })
        ));
        assert!(matches!(
            quad.set_uniform_float(UNIFORM_NOT_FOUND, 1, 1, &[0.0]),
            Err(QuadError::InvalidUniform { location: -1 })
        ));
    }
}

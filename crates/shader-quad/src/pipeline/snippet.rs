/// Where a snippet is inserted into the composed program.
///
/// `Vertex` and `Fragment` wrap whole stages and attach to the pipeline.
/// The remaining hooks belong to the texture layer and attach to layer 0.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SnippetHook {
    /// Vertex stage. In scope: `in: VertexInput`, `out: VertexOutput`.
    Vertex,
    /// Fragment stage. In scope: `in: VertexOutput`, `frag: vec4<f32>`.
    Fragment,
    /// Layer texture coordinates, run in the vertex stage after `Vertex`.
    /// Writes `out.tex_coord0`.
    TextureCoordTransform,
    /// Layer texture sampling. Writes `texel: vec4<f32>`.
    TextureLookup,
    /// Layer combine. Reads `texel`, writes `layer: vec4<f32>`.
    LayerFragment,
}

impl SnippetHook {
    /// Returns `true` for hooks that attach to the pipeline rather than a layer.
    #[inline]
    pub fn targets_pipeline(self) -> bool {
        matches!(self, SnippetHook::Vertex | SnippetHook::Fragment)
    }
}

/// A piece of WGSL inserted at a hook.
///
/// The body generated for a hook starts as the built-in default. Each snippet
/// at that hook then turns it into `pre + (replace or body) + post`, in the
/// order snippets were added. `declarations` go to module scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    hook: SnippetHook,
    declarations: Option<String>,
    pre: Option<String>,
    replace: Option<String>,
    post: Option<String>,
}

impl Snippet {
    /// Creates a snippet whose `post` code runs after the hook's default body.
    pub fn new(hook: SnippetHook, declarations: Option<&str>, post: Option<&str>) -> Self {
        Self {
            hook,
            declarations: declarations.map(str::to_owned),
            pre: None,
            replace: None,
            post: post.map(str::to_owned),
        }
    }

    #[inline]
    pub fn hook(&self) -> SnippetHook {
        self.hook
    }

    pub fn set_pre(&mut self, code: &str) {
        self.pre = Some(code.to_owned());
    }

    /// Replaces the hook's default body (and any earlier snippet at the same hook).
    pub fn set_replace(&mut self, code: &str) {
        self.replace = Some(code.to_owned());
    }

    pub fn set_post(&mut self, code: &str) {
        self.post = Some(code.to_owned());
    }

    pub fn declarations(&self) -> Option<&str> {
        self.declarations.as_deref()
    }

    pub fn pre(&self) -> Option<&str> {
        self.pre.as_deref()
    }

    pub fn replace(&self) -> Option<&str> {
        self.replace.as_deref()
    }

    pub fn post(&self) -> Option<&str> {
        self.post.as_deref()
    }
}

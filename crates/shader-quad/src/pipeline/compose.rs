//! WGSL program composition.
//!
//! Layout of a composed module:
//!
//! ```text
//! QuadParams / QuadUniforms / VertexInput / VertexOutput
//! bindings: quad (0), uniforms (1), layer0_texture (2), layer0_sampler (3)
//! snippet declarations
//! vs_main: [Vertex] [TextureCoordTransform]
//! fs_main: [Fragment: { [TextureLookup] [LayerFragment] frag = layer; }]
//! ```
//!
//! Every default body and every snippet fragment (`pre`, `replace`, `post`)
//! is emitted as its own `{ ... }` block. Locals stay private to the fragment
//! that declares them; only the stage variables (`out`, `frag`, `texel`,
//! `layer`) are shared.

use std::fmt::Write as _;

use wgpu::naga;

use super::{Pipeline, Snippet, SnippetHook};
use crate::error::QuadError;

const PRELUDE: &str = "\
struct QuadParams {
    rect: vec4<f32>,
    color: vec4<f32>,
    viewport: vec2<f32>,
    _pad: vec2<f32>,
}

struct VertexInput {
    @location(0) pos: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) tex_coord0: vec2<f32>,
}

@group(0) @binding(0) var<uniform> quad: QuadParams;
@group(0) @binding(1) var<uniform> uniforms: QuadUniforms;
@group(0) @binding(2) var layer0_texture: texture_2d<f32>;
@group(0) @binding(3) var layer0_sampler: sampler;
";

const VERTEX_DEFAULT: &str = "\
let px = mix(quad.rect.xy, quad.rect.zw, in.pos);
let ndc = vec2<f32>(px.x / quad.viewport.x * 2.0 - 1.0, 1.0 - px.y / quad.viewport.y * 2.0);
out.position = vec4<f32>(ndc, 0.0, 1.0);
out.color = quad.color;
";

const TEX_COORD_DEFAULT: &str = "out.tex_coord0 = in.pos;\n";

const TEXTURE_LOOKUP_DEFAULT: &str =
    "texel = textureSample(layer0_texture, layer0_sampler, in.tex_coord0);\n";

const LAYER_FRAGMENT_DEFAULT: &str = "layer = in.color * texel;\n";

pub(super) fn compose(pipeline: &Pipeline) -> String {
    let mut out = String::with_capacity(2048);

    out.push_str(PRELUDE);
    out.push('\n');
    push_uniform_struct(&mut out, pipeline);

    let layer = pipeline.layer();
    let declarations: Vec<&str> = pipeline
        .snippets()
        .iter()
        .chain(layer.snippets())
        .filter_map(Snippet::declarations)
        .filter(|d| !d.trim().is_empty())
        .collect();
    if !declarations.is_empty() {
        out.push_str("\n// snippet declarations\n");
        for decl in declarations {
            out.push_str(decl.trim_end());
            out.push('\n');
        }
    }

    // vertex stage
    let vertex = chain(VERTEX_DEFAULT, pipeline_hook(pipeline, SnippetHook::Vertex));
    let tex_coord = chain(
        TEX_COORD_DEFAULT,
        layer.snippets_at(SnippetHook::TextureCoordTransform),
    );
    out.push_str("\n@vertex\nfn vs_main(in: VertexInput) -> VertexOutput {\n    var out: VertexOutput;\n");
    push_indented(&mut out, &vertex, 1);
    push_indented(&mut out, &tex_coord, 1);
    out.push_str("    return out;\n}\n");

    // fragment stage
    let lookup = chain(
        TEXTURE_LOOKUP_DEFAULT,
        layer.snippets_at(SnippetHook::TextureLookup),
    );
    let combine = chain(
        LAYER_FRAGMENT_DEFAULT,
        layer.snippets_at(SnippetHook::LayerFragment),
    );
    let mut layer0 = String::from("var texel: vec4<f32>;\n");
    layer0.push_str(&lookup);
    layer0.push_str("var layer: vec4<f32>;\n");
    layer0.push_str(&combine);
    layer0.push_str("frag = layer;\n");

    let fragment = chain(&layer0, pipeline_hook(pipeline, SnippetHook::Fragment));
    out.push_str("\n@fragment\nfn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {\n    var frag: vec4<f32>;\n");
    push_indented(&mut out, &fragment, 1);
    out.push_str("    return frag;\n}\n");

    out
}

/// Parses and validates a composed module.
pub(super) fn validate(source: &str) -> Result<(), QuadError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| QuadError::Shader {
        message: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| QuadError::Shader { message: e.to_string() })?;

    Ok(())
}

fn pipeline_hook(pipeline: &Pipeline, hook: SnippetHook) -> impl Iterator<Item = &Snippet> {
    pipeline.snippets().iter().filter(move |s| s.hook() == hook)
}

/// Folds the snippets at one hook over its default body.
fn chain<'a>(default: &str, snippets: impl Iterator<Item = &'a Snippet>) -> String {
    let mut body = String::new();
    push_block(&mut body, Some(default));
    snippets.fold(body, |body, snippet| {
        let mut next = String::new();
        push_block(&mut next, snippet.pre());
        match snippet.replace() {
            Some(code) => push_block(&mut next, Some(code)),
            None => next.push_str(&body),
        }
        push_block(&mut next, snippet.post());
        next
    })
}

fn push_block(out: &mut String, code: Option<&str>) {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else { return };
    out.push_str("{\n");
    push_indented(out, code, 1);
    out.push_str("}\n");
}

fn push_indented(out: &mut String, body: &str, depth: usize) {
    let pad = "    ".repeat(depth);
    for line in body.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(&pad);
            out.push_str(line);
            out.push('\n');
        }
    }
}

fn push_uniform_struct(out: &mut String, pipeline: &Pipeline) {
    out.push_str("struct QuadUniforms {\n");
    let decls = pipeline.uniforms().decls();
    if decls.is_empty() {
        out.push_str("    _pad: vec4<f32>,\n");
    }
    for decl in decls {
        // Infallible: writing into a String.
        let _ = writeln!(out, "    {}: {},", decl.name(), decl.wgsl_type());
    }
    out.push_str("}\n");
}

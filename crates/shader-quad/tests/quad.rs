use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use shader_quad::coords::ActorBox;
use shader_quad::pipeline::{Pipeline, SnippetHook, UNIFORM_NOT_FOUND};
use shader_quad::render::Framebuffer;
use shader_quad::{QuadError, QuadShader, ShaderQuad};

// Every test declares its own shader types: the template cache is
// process-wide and tests run on parallel threads.

#[derive(Debug)]
struct Draw {
    rect: ActorBox,
    color: [u8; 4],
    source: String,
    uniforms: Vec<f32>,
}

#[derive(Default)]
struct RecordingFramebuffer {
    draws: Vec<Draw>,
}

impl Framebuffer for RecordingFramebuffer {
    fn draw_rectangle(&mut self, pipeline: &mut Pipeline, rect: ActorBox) -> Result<(), QuadError> {
        self.draws.push(Draw {
            rect,
            color: pipeline.color().to_premul_u8(),
            source: pipeline.validate()?,
            uniforms: bytemuck::cast_slice(pipeline.uniforms().as_bytes()).to_vec(),
        });
        Ok(())
    }
}

#[test]
fn build_hook_runs_once_per_type() {
    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct BuiltOnce;
    impl QuadShader for BuiltOnce {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            quad.declare_uniform("level", 1)
        }
    }

    assert!(!ShaderQuad::<BuiltOnce>::is_template_built());
    let a = ShaderQuad::new(BuiltOnce).unwrap();
    let b = ShaderQuad::new(BuiltOnce).unwrap();

    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    assert!(ShaderQuad::<BuiltOnce>::is_template_built());
    assert_eq!(a.pipeline().uniforms().decls().len(), 1);
    assert_eq!(b.pipeline().uniforms().decls().len(), 1);
}

#[test]
fn uniform_location_is_stable() {
    struct Stable;
    impl QuadShader for Stable {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            quad.declare_uniform("first", 2)?;
            quad.declare_uniform("second", 4)
        }
    }

    let a = ShaderQuad::new(Stable).unwrap();
    let b = ShaderQuad::new(Stable).unwrap();

    let loc = a.get_uniform_location("second");
    assert_ne!(loc, UNIFORM_NOT_FOUND);
    assert_eq!(a.get_uniform_location("second"), loc);
    assert_eq!(b.get_uniform_location("second"), loc);
    assert_eq!(a.get_uniform_location("missing"), UNIFORM_NOT_FOUND);
}

#[test]
fn set_uniform_float_writes_whole_vectors() {
    struct Vectors;
    impl QuadShader for Vectors {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            quad.declare_uniform("offset", 2)?;
            quad.declare_uniform_array("taps", 2, 3)
        }
    }

    let mut quad = ShaderQuad::new(Vectors).unwrap();
    let offset = quad.get_uniform_location("offset");
    let taps = quad.get_uniform_location("taps");

    quad.set_uniform_float(offset, 2, 2, &[0.25, 0.75]).unwrap();
    assert_eq!(quad.pipeline().uniform_values(offset), Some(&[0.25, 0.75][..]));

    // Extra trailing values past total_count are never read.
    quad.set_uniform_float(taps, 2, 4, &[1.0, 2.0, 3.0, 4.0, 9.0, 9.0]).unwrap();
    assert_eq!(
        quad.pipeline().uniform_values(taps),
        Some(&[1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0][..])
    );

    assert!(matches!(
        quad.set_uniform_float(taps, 2, 8, &[0.0; 8]),
        Err(QuadError::TooManyElements { max: 3, requested: 4, .. })
    ));
    assert!(matches!(
        quad.set_uniform_float(offset, 3, 3, &[0.0; 3]),
        Err(QuadError::ComponentMismatch { expected: 2, actual: 3, .. })
    ));
    assert!(matches!(
        quad.set_uniform_float(offset, 5, 5, &[0.0; 5]),
        Err(QuadError::InvalidComponents { n_components: 5 })
    ));
}

#[test]
fn snippets_outside_build_hook_are_rejected() {
    struct Late;
    impl QuadShader for Late {}

    let quad = ShaderQuad::new(Late).unwrap();
    let err = quad
        .add_glsl_snippet(SnippetHook::Fragment, None, "frag = vec4<f32>(1.0);", true)
        .unwrap_err();
    assert!(matches!(err, QuadError::NotInBuildHook { .. }));
    assert!(err.is_precondition());

    let err = quad.declare_uniform("late", 1).unwrap_err();
    assert!(matches!(err, QuadError::NotInBuildHook { .. }));

    // The template is untouched.
    let other = ShaderQuad::new(Late).unwrap();
    assert!(other.pipeline().snippets().is_empty());
    assert!(other.pipeline().uniforms().is_empty());
}

#[test]
fn paint_draws_allocation_once_with_opacity_color() {
    struct Painted;
    impl QuadShader for Painted {}

    let mut quad = ShaderQuad::new(Painted).unwrap();
    let alloc = ActorBox::new(10.0, 20.0, 110.0, 70.0);
    quad.set_allocation(alloc);

    let mut fb = RecordingFramebuffer::default();
    quad.paint(&mut fb).unwrap();
    assert_eq!(fb.draws.len(), 1);
    assert_eq!(fb.draws[0].rect, alloc);
    assert_eq!(fb.draws[0].color, [255; 4]);

    quad.set_paint_opacity(0);
    quad.paint(&mut fb).unwrap();
    assert_eq!(fb.draws.len(), 2);
    assert_eq!(fb.draws[1].color, [0; 4]);

    quad.set_paint_opacity(128);
    quad.paint(&mut fb).unwrap();
    assert_eq!(fb.draws[2].color, [128; 4]);
}

#[test]
fn replacing_fragment_skips_layer_sampling() {
    struct Solid;
    impl QuadShader for Solid {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            quad.add_glsl_snippet(
                SnippetHook::Fragment,
                None,
                "frag = vec4<f32>(0.0, 0.5, 0.0, 0.5);",
                true,
            )
        }
    }

    struct Shaded;
    impl QuadShader for Shaded {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            quad.add_glsl_snippet(
                SnippetHook::Fragment,
                Some("const SHADE: f32 = 0.5;"),
                "frag = frag * SHADE;",
                false,
            )
        }
    }

    let mut fb = RecordingFramebuffer::default();
    ShaderQuad::new(Solid).unwrap().paint(&mut fb).unwrap();
    ShaderQuad::new(Shaded).unwrap().paint(&mut fb).unwrap();

    let (solid, shaded) = (&fb.draws[0].source, &fb.draws[1].source);
    assert!(!solid.contains("textureSample"));
    assert!(solid.contains("frag = vec4<f32>(0.0, 0.5, 0.0, 0.5);"));

    let sample = shaded.find("textureSample").unwrap();
    let shade = shaded.find("frag = frag * SHADE;").unwrap();
    assert!(sample < shade);
    assert!(shaded.contains("const SHADE: f32 = 0.5;"));
}

#[test]
fn instances_do_not_share_uniform_values() {
    struct Tinted;
    impl QuadShader for Tinted {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            quad.declare_uniform("tint", 4)?;
            quad.add_glsl_snippet(SnippetHook::Fragment, None, "frag = frag * uniforms.tint;", false)
        }
    }

    let mut a = ShaderQuad::new(Tinted).unwrap();
    let mut b = ShaderQuad::new(Tinted).unwrap();
    let loc = a.get_uniform_location("tint");

    a.set_uniform_float(loc, 4, 4, &[1.0, 0.0, 0.0, 1.0]).unwrap();
    b.set_uniform_float(loc, 4, 4, &[0.0, 0.0, 1.0, 1.0]).unwrap();

    let mut fb = RecordingFramebuffer::default();
    a.paint(&mut fb).unwrap();
    b.paint(&mut fb).unwrap();
    assert_eq!(fb.draws[0].uniforms[..4], [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(fb.draws[1].uniforms[..4], [0.0, 0.0, 1.0, 1.0]);

    // A fresh instance starts from the template, not from a sibling.
    let c = ShaderQuad::new(Tinted).unwrap();
    assert_eq!(c.pipeline().uniform_values(loc), Some(&[0.0; 4][..]));
}

#[test]
fn failed_build_hook_is_retried() {
    static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

    struct Flaky;
    impl QuadShader for Flaky {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            quad.declare_uniform("gain", 1)?;
            if ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(QuadError::Shader { message: "first attempt".into() });
            }
            Ok(())
        }
    }

    assert!(matches!(ShaderQuad::new(Flaky), Err(QuadError::Shader { .. })));
    assert!(!ShaderQuad::<Flaky>::is_template_built());

    // The discarded template did not keep the first declaration.
    let quad = ShaderQuad::new(Flaky).unwrap();
    assert_eq!(quad.pipeline().uniforms().decls().len(), 1);
    ShaderQuad::new(Flaky).unwrap();
    assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
}

#[test]
fn reentrant_construction_is_rejected() {
    #[derive(Debug)]
    struct Recursive;
    impl QuadShader for Recursive {
        fn build_pipeline(_quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            ShaderQuad::new(Recursive).map(drop)
        }
    }

    let err = ShaderQuad::new(Recursive).unwrap_err();
    assert!(matches!(err, QuadError::BuildInProgress { .. }));
    assert!(err.is_precondition());
    assert!(!ShaderQuad::<Recursive>::is_template_built());
}

#[test]
fn layer_hooks_attach_to_layer() {
    struct Flipped;
    impl QuadShader for Flipped {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            quad.add_glsl_snippet(
                SnippetHook::TextureCoordTransform,
                None,
                "out.tex_coord0.y = 1.0 - out.tex_coord0.y;",
                false,
            )?;
            quad.add_glsl_snippet(
                SnippetHook::LayerFragment,
                None,
                "layer = vec4<f32>(layer.rgb * layer.a, layer.a);",
                false,
            )
        }
    }

    let mut quad = ShaderQuad::new(Flipped).unwrap();
    assert!(quad.pipeline().snippets().is_empty());
    assert_eq!(quad.pipeline().layer().snippets().len(), 2);

    let mut fb = RecordingFramebuffer::default();
    quad.paint(&mut fb).unwrap();
    assert!(fb.draws[0].source.contains("out.tex_coord0.y = 1.0 - out.tex_coord0.y;"));
}

#[test]
fn uniform_location_is_unknown_while_building() {
    static SEEN: AtomicI32 = AtomicI32::new(0);

    struct Probing;
    impl QuadShader for Probing {
        fn build_pipeline(quad: &ShaderQuad<Self>) -> Result<(), QuadError> {
            quad.declare_uniform("probe", 1)?;
            SEEN.store(quad.get_uniform_location("probe"), Ordering::SeqCst);
            Ok(())
        }
    }

    let quad = ShaderQuad::new(Probing).unwrap();
    assert_eq!(SEEN.load(Ordering::SeqCst), UNIFORM_NOT_FOUND);
    assert_ne!(quad.get_uniform_location("probe"), UNIFORM_NOT_FOUND);
}

use std::fmt;

use crate::pipeline::SnippetHook;

/// Errors reported by quads and pipelines.
///
/// Everything except [`QuadError::Shader`] and [`QuadError::Gpu`] is a
/// contract violation by the caller: the operation is rejected and the
/// pipeline is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuadError {
    /// Snippet or uniform declared outside the shader type's build hook.
    NotInBuildHook { shader: &'static str },
    /// No base pipeline exists for the shader type.
    MissingTemplate { shader: &'static str },
    /// A quad of this shader type was constructed from inside its own build hook.
    BuildInProgress { shader: &'static str },
    /// A pipeline-wide hook was given to a layer, or a layer hook to the pipeline.
    HookMismatch { hook: SnippetHook },
    /// Uniform name is not a usable WGSL identifier.
    InvalidUniformName { name: String },
    DuplicateUniform { name: String },
    InvalidArrayLength { name: String },
    /// Location does not refer to a declared uniform.
    InvalidUniform { location: i32 },
    /// Component count outside `1..=4`.
    InvalidComponents { n_components: usize },
    ComponentMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// `total_count` is not a multiple of `n_components`.
    MisalignedCount {
        n_components: usize,
        total_count: usize,
    },
    /// Fewer values supplied than `total_count`.
    ShortBuffer { expected: usize, actual: usize },
    TooManyElements {
        name: String,
        max: usize,
        requested: usize,
    },
    /// The composed program was rejected by the shader frontend or validator.
    Shader { message: String },
    /// The device rejected the per-pipeline buffers or bind group.
    Gpu { message: String },
}

impl QuadError {
    /// Returns `true` for programmer errors (everything but shader and device failures).
    pub fn is_precondition(&self) -> bool {
        !matches!(self, QuadError::Shader { .. } | QuadError::Gpu { .. })
    }
}

impl fmt::Display for QuadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuadError::NotInBuildHook { shader } => {
                write!(f, "{shader}: snippets and uniforms can only be added while building the base pipeline")
            }
            QuadError::MissingTemplate { shader } => {
                write!(f, "{shader}: no base pipeline exists")
            }
            QuadError::BuildInProgress { shader } => {
                write!(f, "{shader}: base pipeline is already being built")
            }
            QuadError::HookMismatch { hook } => {
                write!(f, "hook {hook:?} cannot be attached here")
            }
            QuadError::InvalidUniformName { name } => {
                write!(f, "'{name}' is not a valid uniform name")
            }
            QuadError::DuplicateUniform { name } => {
                write!(f, "uniform '{name}' is already declared")
            }
            QuadError::InvalidArrayLength { name } => {
                write!(f, "uniform array '{name}' must have at least one element")
            }
            QuadError::InvalidUniform { location } => {
                write!(f, "no uniform at location {location}")
            }
            QuadError::InvalidComponents { n_components } => {
                write!(f, "component count {n_components} is outside 1..=4")
            }
            QuadError::ComponentMismatch { name, expected, actual } => {
                write!(f, "uniform '{name}' has {expected} components, got {actual}")
            }
            QuadError::MisalignedCount { n_components, total_count } => {
                write!(f, "total count {total_count} is not a multiple of {n_components} components")
            }
            QuadError::ShortBuffer { expected, actual } => {
                write!(f, "expected {expected} values, got {actual}")
            }
            QuadError::TooManyElements { name, max, requested } => {
                write!(f, "uniform '{name}' holds {max} element(s), got {requested}")
            }
            QuadError::Shader { message } => write!(f, "shader error: {message}"),
            QuadError::Gpu { message } => write!(f, "gpu error: {message}"),
        }
    }
}

impl std::error::Error for QuadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_shader_errors_are_not_preconditions() {
        assert!(QuadError::NotInBuildHook { shader: "S" }.is_precondition());
        assert!(QuadError::InvalidUniform { location: -1 }.is_precondition());
        assert!(!QuadError::Shader { message: "x".into() }.is_precondition());
        assert!(!QuadError::Gpu { message: "x".into() }.is_precondition());
    }

    #[test]
    fn display_names_the_shader_type() {
        let msg = QuadError::NotInBuildHook { shader: "demo::Glow" }.to_string();
        assert!(msg.starts_with("demo::Glow:"));
    }
}

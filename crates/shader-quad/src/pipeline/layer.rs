use std::sync::Arc;

use super::{Snippet, SnippetHook};
use crate::error::QuadError;

/// Texture bound to a layer.
#[derive(Debug, Clone, Default)]
pub enum LayerTexture {
    /// No texture. Sampling yields opaque white.
    #[default]
    Null,
    View(Arc<wgpu::TextureView>),
}

impl LayerTexture {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, LayerTexture::Null)
    }
}

/// The pipeline's single texture layer: a texture binding plus layer-hook snippets.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    texture: LayerTexture,
    snippets: Vec<Snippet>,
}

impl Layer {
    #[inline]
    pub fn texture(&self) -> &LayerTexture {
        &self.texture
    }

    pub(super) fn set_texture(&mut self, texture: LayerTexture) {
        self.texture = texture;
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub(super) fn add_snippet(&mut self, snippet: Snippet) -> Result<(), QuadError> {
        if snippet.hook().targets_pipeline() {
            return Err(QuadError::HookMismatch { hook: snippet.hook() });
        }
        self.snippets.push(snippet);
        Ok(())
    }

    pub(super) fn snippets_at(&self, hook: SnippetHook) -> impl Iterator<Item = &Snippet> {
        self.snippets.iter().filter(move |s| s.hook() == hook)
    }
}

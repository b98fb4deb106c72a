use thiserror::Error;

use super::{Island, IslandKind};
use crate::theme::Theme;

/// Per-pass inputs an engine may need besides the island itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderContext {
    pub theme: Theme,
}

/// An engine rejected an island's source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} render failed: {message}")]
pub struct IslandRenderError {
    pub kind: &'static str,
    pub message: String,
}

impl IslandRenderError {
    pub fn new(kind: IslandKind, message: impl Into<String>) -> Self {
        Self {
            kind: kind.name(),
            message: message.into(),
        }
    }
}

/// A loaded rendering engine for one island kind.
pub trait IslandEngine {
    /// The island kind this engine renders.
    fn kind(&self) -> IslandKind;

    /// Render `island` to HTML markup for its placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error when the island source cannot be rendered. Callers
    /// fall back to showing the source text.
    fn render(&self, island: &Island, ctx: &RenderContext) -> Result<String, IslandRenderError>;
}

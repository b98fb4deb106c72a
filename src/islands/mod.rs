//! Math and diagram islands in the rendered preview.
//!
//! The pipeline has two phases:
//! - [`extract`]: a synchronous rewrite of the sanitized HTML tree that
//!   replaces math and mermaid code elements with placeholder nodes
//! - [`PreviewPane::mount`]: an asynchronous phase that loads the engine for
//!   each island on demand and renders into its placeholder
//!
//! Islands are keyed by their position in the processed tree. Every pipeline
//! pass regenerates the whole tree, so islands from the previous pass are
//! always unmounted and replaced.

mod diagram;
mod engine;
mod extract;
mod loader;
mod math;
mod preview;

pub use diagram::{DiagramEngine, render_to_svg};
pub use engine::{IslandEngine, IslandRenderError, RenderContext};
pub use extract::{Extraction, extract};
pub(crate) use extract::decode_entities;
pub use loader::{BuiltinEngines, EngineLoader, EngineSource, LoadError};
pub use math::{MathEngine, render_math};
pub use preview::{MountError, PreviewPane, SlotState};

/// What an island renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IslandKind {
    /// LaTeX math, rendered to MathML.
    Math,
    /// Mermaid diagram, rendered to SVG.
    Diagram,
}

impl IslandKind {
    /// Short lowercase name used in class names and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Diagram => "diagram",
        }
    }
}

/// A fragment extracted from the preview HTML, waiting to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    /// Which engine renders this island.
    pub kind: IslandKind,
    /// Source text without delimiters or fence markers.
    pub content: String,
    /// Block (`true`) or inline (`false`) placement.
    pub display_mode: bool,
}

impl Island {
    /// A display-mode diagram island.
    pub fn diagram(content: impl Into<String>) -> Self {
        Self {
            kind: IslandKind::Diagram,
            content: content.into(),
            display_mode: true,
        }
    }

    /// A math island.
    pub fn math(content: impl Into<String>, display_mode: bool) -> Self {
        Self {
            kind: IslandKind::Math,
            content: content.into(),
            display_mode,
        }
    }

    /// Element name used for this island's placeholder.
    pub const fn tag(&self) -> &'static str {
        if self.display_mode { "div" } else { "span" }
    }

    /// Serialized placeholder markup for the island at `index`.
    ///
    /// Matches what [`extract`] writes into the processed HTML.
    pub fn placeholder(&self, index: usize) -> String {
        let tag = self.tag();
        format!("<{tag} {PLACEHOLDER_ATTR}=\"{index}\"></{tag}>")
    }
}

/// Attribute carrying the island index on placeholder nodes.
pub const PLACEHOLDER_ATTR: &str = "data-island";

/// Escape text for inclusion in HTML.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

//! LaTeX math rendering via pulldown-latex to MathML.

use pulldown_latex::{
    Parser, Storage,
    config::{DisplayMode, RenderConfig},
    mathml::push_mathml,
};

use super::{Island, IslandEngine, IslandKind, IslandRenderError, RenderContext};

/// Render LaTeX source (without `$` delimiters) to MathML.
///
/// # Errors
///
/// Returns the joined parser messages when the source is malformed.
pub fn render_math(latex: &str, display_mode: bool) -> Result<String, IslandRenderError> {
    let storage = Storage::new();
    let parser = Parser::new(latex, &storage);
    let config = RenderConfig {
        display_mode: if display_mode {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|event| event.as_ref().err().map(ToString::to_string))
        .collect();
    if !errors.is_empty() {
        return Err(IslandRenderError::new(IslandKind::Math, errors.join("; ")));
    }

    let mut mathml = String::new();
    push_mathml(&mut mathml, events.into_iter(), config)
        .map_err(|e| IslandRenderError::new(IslandKind::Math, e.to_string()))?;
    Ok(mathml)
}

/// Math island engine.
#[derive(Debug, Default)]
pub struct MathEngine;

impl IslandEngine for MathEngine {
    fn kind(&self) -> IslandKind {
        IslandKind::Math
    }

    fn render(&self, island: &Island, _ctx: &RenderContext) -> Result<String, IslandRenderError> {
        let mathml = render_math(&island.content, island.display_mode)?;
        let class = if island.display_mode {
            "math math-display"
        } else {
            "math math-inline"
        };
        Ok(format!(
            "<{tag} class=\"{class}\">{mathml}</{tag}>",
            tag = island.tag()
        ))
    }
}

//! Mermaid diagram rendering.
//!
//! Renders mermaid diagram source text to SVG using `mermaid-rs-renderer`.

use super::{Island, IslandEngine, IslandKind, IslandRenderError, RenderContext};

/// Render a mermaid diagram to an SVG string.
///
/// Generates SVG via `mermaid-rs-renderer` and fixes font-family quoting
/// so the result is well-formed markup.
///
/// # Errors
///
/// Returns an error if the mermaid source cannot be parsed.
#[cfg(feature = "diagrams")]
pub fn render_to_svg(mermaid_source: &str) -> Result<String, IslandRenderError> {
    let svg = mermaid_rs_renderer::render(mermaid_source)
        .map_err(|e| IslandRenderError::new(IslandKind::Diagram, e.to_string()))?;
    Ok(fix_svg_font_families(&svg))
}

/// Render a mermaid diagram to an SVG string.
///
/// # Errors
///
/// Always fails: the diagram renderer is not compiled in.
#[cfg(not(feature = "diagrams"))]
pub fn render_to_svg(_mermaid_source: &str) -> Result<String, IslandRenderError> {
    Err(IslandRenderError::new(
        IslandKind::Diagram,
        "diagram renderer not compiled in",
    ))
}

/// Fix unescaped double quotes inside font-family attributes.
///
/// `mermaid-rs-renderer` emits font-family values like:
///   `font-family="Inter, ... "Segoe UI", sans-serif"`
/// The inner `"Segoe UI"` ends the attribute early once the SVG is embedded
/// in HTML. Inner double quotes become single quotes.
#[cfg_attr(not(feature = "diagrams"), allow(dead_code))]
fn fix_svg_font_families(svg: &str) -> String {
    const MARKER: &str = "font-family=\"";
    let mut result = String::with_capacity(svg.len());
    let mut rest = svg;

    while let Some(pos) = rest.find(MARKER) {
        result.push_str(&rest[..pos + MARKER.len()]);
        rest = &rest[pos + MARKER.len()..];

        // The closing quote is a `"` followed by `>`, ` `, `/`, or end.
        let mut value = String::new();
        let mut end_offset = rest.len();
        for (i, ch) in rest.char_indices() {
            if ch == '"' {
                let after = rest.get(i + 1..i + 2).unwrap_or("");
                if after.is_empty()
                    || after.starts_with('>')
                    || after.starts_with(' ')
                    || after.starts_with('/')
                {
                    result.push_str(&value.replace('"', "'"));
                    result.push('"');
                    end_offset = i + 1;
                    break;
                }
                value.push('"');
            } else {
                value.push(ch);
            }
        }
        rest = &rest[end_offset..];
    }
    result.push_str(rest);
    result
}

/// Diagram island engine.
#[derive(Debug, Default)]
pub struct DiagramEngine;

impl IslandEngine for DiagramEngine {
    fn kind(&self) -> IslandKind {
        IslandKind::Diagram
    }

    fn render(&self, island: &Island, ctx: &RenderContext) -> Result<String, IslandRenderError> {
        let svg = render_to_svg(&island.content)?;
        Ok(format!(
            "<div class=\"mermaid-diagram theme-{}\">{svg}</div>",
            ctx.theme.name()
        ))
    }
}

//! Markdown to sanitized HTML.
//!
//! This module handles:
//! - Rendering markdown to HTML with comrak (GFM extensions, smart
//!   punctuation, soft breaks as `<br>`)
//! - Sanitizing the raw HTML before it reaches the preview
//!
//! [`render`] is a pure function: the same source always produces
//! byte-identical output.

mod sanitize;

use comrak::{Options, markdown_to_html};

pub use sanitize::{Sanitizer, sanitizer_available};

/// Render markdown source to sanitized HTML.
///
/// # Example
///
/// ```
/// let html = livemark::render::render("# Hello\n\n<script>alert(1)</script>");
/// assert!(html.contains("<h1>Hello</h1>"));
/// assert!(!html.contains("<script"));
/// ```
pub fn render(source: &str) -> String {
    let _scope = crate::perf::scope("pipeline.render");
    let raw = render_unsanitized(source);
    let html = Sanitizer::shared().clean(&raw);
    crate::perf::log_event(
        "pipeline.render",
        format!("source_bytes={} html_bytes={}", source.len(), html.len()),
    );
    html
}

/// Render markdown source to HTML without sanitizing.
///
/// Raw HTML in the source is passed through untouched. Only use the result
/// as input to a sanitizer.
pub fn render_unsanitized(source: &str) -> String {
    markdown_to_html(source, &create_options())
}

fn create_options() -> Options {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.shortcodes = true;

    // Typographic quotes and dashes
    options.parse.smart = true;

    // Soft line breaks become <br>, raw HTML is kept for the sanitizer to judge
    options.render.hardbreaks = true;
    options.render.unsafe_ = true;

    options
}

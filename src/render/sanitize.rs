//! HTML sanitizing for rendered markdown.
//!
//! Uses ammonia's allow-list builder, widened just enough for what comrak
//! emits: language classes on `<code>` and task-list checkboxes. Without the
//! `sanitize` feature the raw HTML is passed through with a warning.

#[cfg(not(feature = "sanitize"))]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;

static SHARED: LazyLock<Sanitizer> = LazyLock::new(Sanitizer::new);

#[cfg(not(feature = "sanitize"))]
static WARNED: AtomicBool = AtomicBool::new(false);

/// Strips scripts, event handlers and unsafe URLs from HTML.
pub struct Sanitizer {
    #[cfg(feature = "sanitize")]
    builder: ammonia::Builder<'static>,
}

impl Sanitizer {
    /// Create a sanitizer with the preview allow-list.
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "sanitize")]
            builder: preview_builder(),
        }
    }

    /// The process-wide sanitizer used by [`crate::render::render`].
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Sanitize `html`.
    ///
    /// When no sanitizer is compiled in, returns `html` unchanged and emits a
    /// diagnostic. Content is never dropped.
    #[cfg(feature = "sanitize")]
    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }

    /// Sanitize `html`.
    ///
    /// When no sanitizer is compiled in, returns `html` unchanged and emits a
    /// diagnostic. Content is never dropped.
    #[cfg(not(feature = "sanitize"))]
    pub fn clean(&self, html: &str) -> String {
        if !WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!("HTML sanitizer not available, rendering unsanitized HTML");
        }
        crate::perf::log_event("pipeline.sanitize.unavailable", format!("bytes={}", html.len()));
        html.to_string()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sanitizer")
            .field("available", &sanitizer_available())
            .finish()
    }
}

/// Whether a real sanitizer is compiled in.
pub const fn sanitizer_available() -> bool {
    cfg!(feature = "sanitize")
}

#[cfg(feature = "sanitize")]
fn preview_builder() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder
        .add_tags(&["input"])
        .add_tag_attributes("code", &["class"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .add_tag_attributes("li", &["class"])
        .add_tag_attributes("section", &["class"])
        .add_tags(&["section"])
        .add_tag_attributes("sup", &["class"])
        .add_tag_attributes("a", &["id"])
        .add_tag_attributes("li", &["id"]);
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "sanitize")]
    #[test]
    fn test_clean_keeps_code_language_class() {
        let html = Sanitizer::new().clean("<pre><code class=\"language-rust\">fn</code></pre>");
        assert_eq!(html, "<pre><code class=\"language-rust\">fn</code></pre>");
    }

    #[cfg(feature = "sanitize")]
    #[test]
    fn test_clean_drops_data_attributes() {
        let html = Sanitizer::new().clean("<div data-island=\"0\">x</div>");
        assert!(!html.contains("data-island"));
    }

    #[cfg(feature = "sanitize")]
    #[test]
    fn test_clean_removes_style_content() {
        let html = Sanitizer::new().clean("<style>body{}</style><p>ok</p>");
        assert_eq!(html, "<p>ok</p>");
    }

    #[cfg(not(feature = "sanitize"))]
    #[test]
    fn test_clean_passes_through_without_sanitizer() {
        let raw = "<script>x</script><p>ok</p>";
        assert_eq!(Sanitizer::new().clean(raw), raw);
    }

    #[test]
    fn test_availability_matches_feature() {
        assert_eq!(sanitizer_available(), cfg!(feature = "sanitize"));
    }
}

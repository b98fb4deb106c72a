use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::counts::Counts;
use crate::editor::{EditorBuffer, HostEditor};
use crate::islands::{EngineLoader, PreviewPane, RenderContext};
use crate::scroll::{Pane, ScrollSync, SyncOutcome};
use crate::slash::SlashCommands;
use crate::theme::ThemeSettings;
use crate::ui::PaneLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

/// A one-line status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug)]
pub struct Model {
    /// Path of the open document
    pub file_path: PathBuf,
    /// The host editor holding the document text
    pub editor: EditorBuffer,
    /// Rendered preview and its islands
    pub preview: PreviewPane,
    /// Editor/preview scroll coupling
    pub scroll_sync: ScrollSync,
    /// Slash-command palette and session
    pub slash: SlashCommands,
    /// Theme and preview style
    pub settings: ThemeSettings,
    /// Whether external edits to the file are picked up
    pub watch_enabled: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Pane geometry once a terminal has reported its size
    pub layout: Option<PaneLayout>,
    /// Editor revision the preview was last built from
    rendered_revision: Option<u64>,
    toast: Option<Toast>,
}

impl Model {
    pub fn new(file_path: PathBuf, text: &str) -> Self {
        Self {
            file_path,
            editor: EditorBuffer::from_text(text),
            preview: PreviewPane::new(Rc::new(EngineLoader::builtin())),
            scroll_sync: ScrollSync::default(),
            slash: SlashCommands::default(),
            settings: ThemeSettings::default(),
            watch_enabled: false,
            should_quit: false,
            layout: None,
            rendered_revision: None,
            toast: None,
        }
    }

    /// Use `loader` for island engines. Replaces the preview pane.
    #[must_use]
    pub fn with_loader(mut self, loader: Rc<EngineLoader>) -> Self {
        self.preview = PreviewPane::new(loader);
        self.rendered_revision = None;
        self
    }

    #[must_use]
    pub fn with_slash_commands(mut self, slash: SlashCommands) -> Self {
        self.slash = slash;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ThemeSettings) -> Self {
        self.settings = settings;
        self.rendered_revision = None;
        self
    }

    #[must_use]
    pub fn with_scroll_sync(mut self, enabled: bool) -> Self {
        self.scroll_sync.set_enabled(enabled);
        self
    }

    /// What island engines render with.
    pub const fn render_context(&self) -> RenderContext {
        RenderContext {
            theme: self.settings.theme,
        }
    }

    /// Whether the preview is behind the editor.
    pub fn preview_dirty(&self) -> bool {
        self.rendered_revision != Some(self.editor.revision())
    }

    pub(super) fn mark_rendered(&mut self) {
        self.rendered_revision = Some(self.editor.revision());
    }

    /// Force the next refresh to rebuild the preview.
    pub(super) const fn invalidate_preview(&mut self) {
        self.rendered_revision = None;
    }

    /// Switch the editor to `text`, dropping any open slash session.
    pub fn load_text(&mut self, text: &str) {
        self.slash.teardown();
        self.editor.set_text(text);
        self.editor.mark_clean();
        self.invalidate_preview();
    }

    /// Re-read the document from disk. Returns whether the text changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn reload_from_disk(&mut self) -> Result<bool> {
        let text = std::fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read {}", self.file_path.display()))?;
        if text == self.editor.text() {
            return Ok(false);
        }
        self.load_text(&text);
        crate::perf::log_event(
            "reload",
            format!("path={} chars={}", self.file_path.display(), text.chars().count()),
        );
        Ok(true)
    }

    /// Write the editor text back to the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_disk(&mut self) -> Result<()> {
        std::fs::write(&self.file_path, self.editor.text())
            .with_context(|| format!("Failed to write {}", self.file_path.display()))?;
        self.editor.mark_clean();
        Ok(())
    }

    /// Propagate a scroll of `source` to the other pane.
    pub fn sync_scroll(&mut self, source: Pane) -> SyncOutcome {
        match source {
            Pane::Editor => {
                let region = self.editor.scroll_region();
                self.scroll_sync
                    .on_scroll(Pane::Editor, &region, Some(self.preview.scroll_region_mut()))
            }
            Pane::Preview => {
                let region = *self.preview.scroll_region();
                let mut target = self.editor.scroll_region();
                let outcome = self
                    .scroll_sync
                    .on_scroll(Pane::Preview, &region, Some(&mut target));
                if let SyncOutcome::Synced { target_scroll_top } = outcome {
                    self.editor.set_scroll_top(target_scroll_top);
                }
                outcome
            }
        }
    }

    pub fn counts(&self) -> Counts {
        Counts::compute(&self.editor.text())
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Info => tracing::info!("{message}"),
            ToastLevel::Warning | ToastLevel::Error => tracing::warn!("{message}"),
        }
        self.toast = Some(Toast { level, message });
    }

    pub const fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn clear_toast(&mut self) {
        self.toast = None;
    }
}

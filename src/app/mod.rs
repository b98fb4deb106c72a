//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Preview pipeline, watch loop and terminal editor

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use effects::{default_output_path, page_html, refresh_preview, write_page};
pub use input::handle_event;
pub use model::{Model, Toast, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::theme::ThemeSettings;

/// Owns the run configuration and drives the event loop.
pub struct App {
    file_path: PathBuf,
    output_path: Option<PathBuf>,
    watch_enabled: bool,
    settings: ThemeSettings,
    scroll_sync: bool,
    static_palette: bool,
    templates_path: Option<PathBuf>,
    export_name: Option<String>,
    show_stats: bool,
    interactive: bool,
}

impl App {
    /// Create a new application for the given file.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            output_path: None,
            watch_enabled: false,
            settings: ThemeSettings::default(),
            scroll_sync: true,
            static_palette: false,
            templates_path: None,
            export_name: None,
            show_stats: false,
            interactive: false,
        }
    }

    /// Where the HTML page is written. Defaults to the document with an
    /// `.html` extension.
    #[must_use]
    pub fn with_output(mut self, path: Option<PathBuf>) -> Self {
        self.output_path = path;
        self
    }

    /// Enable or disable file watching.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    #[must_use]
    pub const fn with_settings(mut self, settings: ThemeSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub const fn with_scroll_sync(mut self, enabled: bool) -> Self {
        self.scroll_sync = enabled;
        self
    }

    /// Close the slash palette on any typed character instead of filtering.
    #[must_use]
    pub const fn with_static_palette(mut self, enabled: bool) -> Self {
        self.static_palette = enabled;
        self
    }

    /// Load the slash-command catalog from a JSON file.
    #[must_use]
    pub fn with_templates(mut self, path: Option<PathBuf>) -> Self {
        self.templates_path = path;
        self
    }

    /// Also export the document as `NAME.md` next to it.
    #[must_use]
    pub fn with_export(mut self, name: Option<String>) -> Self {
        self.export_name = name;
        self
    }

    /// Print word and character counts.
    #[must_use]
    pub const fn with_stats(mut self, enabled: bool) -> Self {
        self.show_stats = enabled;
        self
    }

    /// Edit the document in the terminal instead of only writing the page.
    #[must_use]
    pub const fn with_edit(mut self, enabled: bool) -> Self {
        self.interactive = enabled;
        self
    }
}

#[cfg(test)]
mod tests;

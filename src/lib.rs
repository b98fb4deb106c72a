// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. slash::SlashCommands)
    clippy::module_name_repetitions
)]

//! # Livemark
//!
//! A live markdown preview with math and diagram islands.
//!
//! Livemark turns markdown into a sanitized HTML preview with:
//! - GFM rendering and HTML sanitization
//! - Math (`$...$`, `$$...$$`) and mermaid diagrams mounted asynchronously
//!   as islands
//! - Proportional scroll sync between editor and preview
//! - A slash-command palette for inserting snippets
//! - File watching for live reload
//!
//! ## Architecture
//!
//! Livemark uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **Effects**: Rendering the preview, file IO
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`render`]: Markdown to sanitized HTML
//! - [`islands`]: Island extraction, engines and the preview pane
//! - [`scroll`]: Editor/preview scroll synchronization
//! - [`slash`]: Slash-command palette
//! - [`editor`]: Host editor contract and rope buffer
//! - [`ui`]: Terminal editor with a live preview pane
//! - [`watcher`]: File watching

pub mod app;
pub mod config;
pub mod counts;
pub mod editor;
pub mod export;
pub mod islands;
pub mod perf;
pub mod render;
pub mod scroll;
pub mod slash;
pub mod theme;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model, update};
    pub use crate::editor::{EditorBuffer, HostEditor};
    pub use crate::islands::{Island, IslandKind, PreviewPane, extract};
    pub use crate::render::render;
    pub use crate::scroll::{ScrollRegion, ScrollSync};
    pub use crate::slash::SlashCommands;
}

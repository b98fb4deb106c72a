//! The host text editor the live preview and slash commands work against.
//!
//! [`HostEditor`] is the contract the core needs from an editing widget:
//! scroll metrics, cursor and screen-coordinate lookup, an atomic
//! replace-and-select edit, and a revision counter that changes on every
//! edit. [`EditorBuffer`] is the rope-backed implementation used by the app.

mod buffer;

use std::ops::Range;

pub use buffer::{Cursor, Direction, EditorBuffer};

use crate::scroll::ScrollRegion;

/// Screen position in the editor's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    pub top: f64,
    pub left: f64,
}

/// Layout measurements of the editor pane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorMetrics {
    /// Height of one text line.
    pub line_height: f64,
    /// Width of one display column.
    pub char_width: f64,
    /// Visible height of the pane.
    pub client_height: f64,
}

impl Default for EditorMetrics {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            char_width: 8.0,
            client_height: 600.0,
        }
    }
}

/// What the core requires of an editing widget.
///
/// Offsets are char indices into the document text.
pub trait HostEditor {
    /// Snapshot of the full document.
    fn text(&self) -> String;

    fn len_chars(&self) -> usize;

    /// The char at `offset`, if in range.
    fn char_at(&self, offset: usize) -> Option<char>;

    /// Text in `range`, clamped to the document.
    fn slice(&self, range: Range<usize>) -> String;

    /// Cursor position as a char offset.
    fn cursor_offset(&self) -> usize;

    /// Screen coordinates of the bottom-left corner at `offset`.
    fn coords_at(&self, offset: usize) -> Anchor;

    /// Replace `range` with `text` and place the cursor at `cursor`, as one
    /// edit.
    fn replace(&mut self, range: Range<usize>, text: &str, cursor: usize);

    /// Counter bumped by every edit. Compare against a stored value to detect
    /// document changes.
    fn revision(&self) -> u64;

    fn scroll_region(&self) -> ScrollRegion;

    fn set_scroll_top(&mut self, scroll_top: f64);

    /// Insert `text` at the cursor and move the cursor past it.
    fn insert_at_cursor(&mut self, text: &str) {
        let at = self.cursor_offset();
        self.replace(at..at, text, at + text.chars().count());
    }
}

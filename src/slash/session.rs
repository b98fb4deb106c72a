use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{CommandPalette, TemplateCatalog, TemplateItem};
use crate::editor::HostEditor;

/// Whether a key event reached its handler or should fall through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Handled; default editor handling is suppressed.
    Consumed,
    /// Not handled; continue down the input chain.
    PassThrough,
}

/// Why a slash session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A template replaced the command span.
    Resolved,
    /// Cancelled; the command span was removed.
    Cancelled,
    /// Closed with the typed text kept; the key continues into the editor.
    PassThrough,
    /// The document changed under the session; nothing was removed.
    Invalidated,
}

/// Pointer input relevant to the palette, in editor screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
}

/// State of an open slash command.
///
/// `slash_offset` is the char offset just after the inserted slash. The
/// command span runs from the slash to the end of the typed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashSession {
    pub slash_offset: usize,
    pub query_len: usize,
    revision: u64,
    doc_len: usize,
}

impl SlashSession {
    /// Char range of the slash plus the typed query.
    pub const fn span(&self) -> std::ops::Range<usize> {
        self.slash_offset - 1..self.slash_offset + self.query_len
    }

    const fn query_end(&self) -> usize {
        self.slash_offset + self.query_len
    }

    /// Where the query ends after an edit that left the document `new_len`
    /// chars long with the cursor at `cursor`.
    ///
    /// Inserted text ends at the cursor and removed text started there, so
    /// the length change and the cursor locate the edit. Edits past the
    /// query leave its end alone. `None` when the edit crosses the span
    /// boundary.
    fn end_after_edit(&self, new_len: usize, cursor: usize) -> Option<usize> {
        let end = self.query_end();
        if new_len >= self.doc_len {
            let inserted = new_len - self.doc_len;
            let start = cursor.checked_sub(inserted)?;
            if start > end {
                Some(end)
            } else if start >= self.slash_offset {
                Some(end + inserted)
            } else {
                None
            }
        } else {
            let removed = self.doc_len - new_len;
            if cursor >= end {
                Some(end)
            } else if cursor >= self.slash_offset && cursor + removed <= end {
                Some(end - removed)
            } else {
                None
            }
        }
    }
}

/// True when no command modifier is held. Shift is allowed.
pub fn is_bare(modifiers: KeyModifiers) -> bool {
    !modifiers.intersects(
        KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META,
    )
}

/// A bare `/` keystroke.
pub fn is_trigger(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('/') && is_bare(key.modifiers)
}

/// The slash-command state machine: at most one session, its palette and
/// the catalog it draws from.
#[derive(Debug, Clone)]
pub struct SlashCommands {
    catalog: TemplateCatalog,
    palette: CommandPalette,
    session: Option<SlashSession>,
    filter_as_you_type: bool,
    last_close: Option<CloseReason>,
}

impl SlashCommands {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self {
            catalog,
            palette: CommandPalette::new(),
            session: None,
            filter_as_you_type: true,
            last_close: None,
        }
    }

    /// Close on the first printable key instead of filtering.
    #[must_use]
    pub const fn with_static_palette(mut self, static_palette: bool) -> Self {
        self.filter_as_you_type = !static_palette;
        self
    }

    pub const fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub const fn palette(&self) -> &CommandPalette {
        &self.palette
    }

    pub const fn session(&self) -> Option<SlashSession> {
        self.session
    }

    pub const fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Reason the most recent session closed.
    pub const fn last_close(&self) -> Option<CloseReason> {
        self.last_close
    }

    /// Items currently listed, in order.
    pub fn visible_items(&self) -> Vec<&TemplateItem> {
        self.palette
            .visible()
            .iter()
            .filter_map(|&index| self.catalog.get(index))
            .collect()
    }

    /// The selected item, while open.
    pub fn selected_item(&self) -> Option<&TemplateItem> {
        self.palette
            .selected_item()
            .and_then(|index| self.catalog.get(index))
    }

    /// Open a session if `key` is a bare `/`.
    ///
    /// Inserts the slash itself, so default handling must be suppressed when
    /// this returns [`KeyDisposition::Consumed`].
    pub fn trigger(&mut self, editor: &mut impl HostEditor, key: &KeyEvent) -> KeyDisposition {
        if self.session.is_some() || !is_trigger(key) {
            return KeyDisposition::PassThrough;
        }

        editor.insert_at_cursor("/");
        let slash_offset = editor.cursor_offset();
        let anchor = editor.coords_at(slash_offset);
        self.palette.open(anchor, self.catalog.filter(""));
        self.session = Some(SlashSession {
            slash_offset,
            query_len: 0,
            revision: editor.revision(),
            doc_len: editor.len_chars(),
        });
        tracing::debug!(slash_offset, "slash session opened");
        crate::perf::log_event("slash.open", format!("offset={slash_offset}"));
        KeyDisposition::Consumed
    }

    /// Route a key while the palette is open. Runs ahead of the editor.
    pub fn handle_key(&mut self, editor: &mut impl HostEditor, key: &KeyEvent) -> KeyDisposition {
        if self.session.is_none() {
            return KeyDisposition::PassThrough;
        }

        match key.code {
            KeyCode::Esc => {
                self.cancel(editor);
                KeyDisposition::Consumed
            }
            KeyCode::Down => {
                self.palette.select_next();
                KeyDisposition::Consumed
            }
            KeyCode::Up => {
                self.palette.select_previous();
                KeyDisposition::Consumed
            }
            KeyCode::Enter => {
                if let Some(index) = self.palette.selected_item() {
                    self.resolve(editor, index);
                }
                KeyDisposition::Consumed
            }
            KeyCode::Char(ch) if !ch.is_control() && is_bare(key.modifiers) => {
                if !self.filter_as_you_type {
                    self.close(CloseReason::PassThrough);
                }
                // The editor inserts the character; filtering happens on the
                // resulting document change.
                KeyDisposition::PassThrough
            }
            _ => KeyDisposition::PassThrough,
        }
    }

    /// Route a pointer event while the palette is open.
    ///
    /// A press on an item resolves with it. A press outside the palette
    /// cancels and removes the command span, then falls through so the
    /// editor can handle the click.
    pub fn handle_pointer(
        &mut self,
        editor: &mut impl HostEditor,
        event: PointerEvent,
    ) -> KeyDisposition {
        if self.session.is_none() {
            return KeyDisposition::PassThrough;
        }

        match event {
            PointerEvent::Down { x, y } => {
                if let Some(row) = self.palette.row_at(x, y) {
                    if let Some(&index) = self.palette.visible().get(row) {
                        self.resolve(editor, index);
                    }
                    KeyDisposition::Consumed
                } else if self.palette.contains(x, y) {
                    KeyDisposition::Consumed
                } else {
                    self.cancel(editor);
                    KeyDisposition::PassThrough
                }
            }
            PointerEvent::Move { x, y } => match self.palette.row_at(x, y) {
                Some(row) => {
                    self.palette.hover(row);
                    KeyDisposition::Consumed
                }
                None => KeyDisposition::PassThrough,
            },
        }
    }

    /// Inspect an edit made by the editor while a session is open.
    ///
    /// Closes as [`CloseReason::Invalidated`] when the char before the
    /// recorded offset is no longer `/`. Edits inside the query grow or
    /// shrink it, edits after it leave it alone. When filtering, the query
    /// text refilters the palette; a query matching nothing closes as
    /// [`CloseReason::PassThrough`].
    pub fn on_document_change(&mut self, editor: &impl HostEditor) {
        let Some(mut session) = self.session else {
            return;
        };
        if editor.revision() == session.revision {
            return;
        }
        session.revision = editor.revision();

        if session.slash_offset == 0 || editor.char_at(session.slash_offset - 1) != Some('/') {
            self.close(CloseReason::Invalidated);
            return;
        }

        let doc_len = editor.len_chars();
        let cursor = editor.cursor_offset();
        let Some(query_end) = session.end_after_edit(doc_len, cursor) else {
            self.close(CloseReason::PassThrough);
            return;
        };
        session.doc_len = doc_len;
        session.query_len = query_end - session.slash_offset;

        if self.filter_as_you_type {
            if cursor < session.slash_offset {
                self.close(CloseReason::PassThrough);
                return;
            }
            let query = editor.slice(session.slash_offset..query_end);
            let visible = if query.chars().any(char::is_whitespace) {
                Vec::new()
            } else {
                self.catalog.filter(&query)
            };
            if visible.is_empty() {
                self.close(CloseReason::PassThrough);
                return;
            }
            self.palette.set_visible(visible);
        }
        self.session = Some(session);
    }

    /// Close as [`CloseReason::PassThrough`] if the cursor left the command
    /// span.
    pub fn on_cursor_moved(&mut self, editor: &impl HostEditor) {
        let Some(session) = self.session else {
            return;
        };
        let cursor = editor.cursor_offset();
        if cursor < session.slash_offset || cursor > session.query_end() {
            self.close(CloseReason::PassThrough);
        }
    }

    /// Drop any open session without touching the document.
    pub fn teardown(&mut self) {
        if self.session.is_some() {
            self.close(CloseReason::Invalidated);
        }
    }

    fn resolve(&mut self, editor: &mut impl HostEditor, index: usize) {
        let (Some(session), Some(item)) = (self.session, self.catalog.get(index)) else {
            return;
        };
        let span = session.span();
        let cursor = span.start + item.template.chars().count();
        tracing::debug!(id = %item.id, "slash command resolved");
        editor.replace(span, &item.template, cursor);
        self.close(CloseReason::Resolved);
    }

    fn cancel(&mut self, editor: &mut impl HostEditor) {
        if let Some(session) = self.session {
            let span = session.span();
            let start = span.start;
            editor.replace(span, "", start);
        }
        self.close(CloseReason::Cancelled);
    }

    fn close(&mut self, reason: CloseReason) {
        self.session = None;
        self.palette.close();
        self.last_close = Some(reason);
        tracing::debug!(?reason, "slash session closed");
        crate::perf::log_event("slash.close", format!("reason={reason:?}"));
    }
}

impl Default for SlashCommands {
    fn default() -> Self {
        Self::new(TemplateCatalog::builtin())
    }
}

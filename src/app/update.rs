use crossterm::event::KeyEvent;

use crate::app::Model;
use crate::editor::{Direction, EditorBuffer, HostEditor};
use crate::scroll::Pane;
use crate::slash::PointerEvent;
use crate::ui::PaneLayout;

/// All possible events and actions in the application.
///
/// These represent user input, host notifications, and internal actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Raw input, routed palette -> slash trigger -> editor defaults
    /// A key event from the host
    Key(KeyEvent),
    /// A pointer event in editor coordinates
    Pointer(PointerEvent),

    // Editor
    /// Insert a character at the cursor
    EditorInsertChar(char),
    /// Delete character before cursor (Backspace)
    EditorDeleteBack,
    /// Delete character at cursor (Delete)
    EditorDeleteForward,
    /// Split line at cursor (Enter)
    EditorSplitLine,
    /// Move cursor in a direction
    EditorMoveCursor(Direction),
    /// Move cursor to beginning of line (Home)
    EditorMoveHome,
    /// Move cursor to end of line (End)
    EditorMoveEnd,
    /// Move cursor one word left (Ctrl+Left)
    EditorMoveWordLeft,
    /// Move cursor one word right (Ctrl+Right)
    EditorMoveWordRight,
    /// Move cursor to start of buffer (Ctrl+Home)
    EditorMoveToStart,
    /// Move cursor to end of buffer (Ctrl+End)
    EditorMoveToEnd,

    // Scrolling
    /// The editor pane scrolled to this offset
    EditorScrolled(f64),
    /// The preview pane scrolled to this offset
    PreviewScrolled(f64),
    /// The editor pane's visible height changed
    EditorResized(f64),
    /// The preview's content or visible height changed
    PreviewResized { scroll_height: f64, client_height: f64 },
    /// The terminal was resized to (width, height) cells
    Resize(u16, u16),
    /// Frame boundary; releases the scroll lock
    Frame,

    // Document
    /// Replace the document text (switching documents)
    LoadDocument(String),
    /// File changed externally, reload
    FileChanged,
    /// Save the editor text to the file
    Save,
    /// Export the editor text as a `.md` file with this name
    Export(String),

    // Preferences
    /// Flip between light and dark
    ToggleTheme,
    /// Turn scroll coupling on or off
    ToggleScrollSync,
    /// Toggle file watching
    ToggleWatch,

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// File and preview side effects are applied afterwards by the event loop.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Key(key) => return super::input::route_key(model, key),
        Message::Pointer(event) => {
            edit(&mut model, |m| {
                m.slash.handle_pointer(&mut m.editor, event);
            });
        }

        Message::EditorInsertChar(c) => edit_buffer(&mut model, |e| e.insert_char(c)),
        Message::EditorDeleteBack => edit_buffer(&mut model, |e| {
            e.delete_back();
        }),
        Message::EditorDeleteForward => edit_buffer(&mut model, |e| {
            e.delete_forward();
        }),
        Message::EditorSplitLine => edit_buffer(&mut model, EditorBuffer::split_line),
        Message::EditorMoveCursor(direction) => {
            edit_buffer(&mut model, |e| e.move_cursor(direction));
        }
        Message::EditorMoveHome => edit_buffer(&mut model, EditorBuffer::move_home),
        Message::EditorMoveEnd => edit_buffer(&mut model, EditorBuffer::move_end),
        Message::EditorMoveWordLeft => edit_buffer(&mut model, EditorBuffer::move_word_left),
        Message::EditorMoveWordRight => edit_buffer(&mut model, EditorBuffer::move_word_right),
        Message::EditorMoveToStart => edit_buffer(&mut model, EditorBuffer::move_to_start),
        Message::EditorMoveToEnd => edit_buffer(&mut model, EditorBuffer::move_to_end),

        Message::EditorScrolled(scroll_top) => {
            model.editor.set_scroll_top(scroll_top);
            model.sync_scroll(Pane::Editor);
        }
        Message::PreviewScrolled(scroll_top) => {
            model.preview.scroll_region_mut().set_scroll_top(scroll_top);
            model.sync_scroll(Pane::Preview);
        }
        Message::EditorResized(client_height) => {
            model.editor.set_client_height(client_height);
        }
        Message::PreviewResized {
            scroll_height,
            client_height,
        } => {
            model
                .preview
                .scroll_region_mut()
                .resize(scroll_height, client_height);
        }
        Message::Resize(width, height) => {
            let layout = PaneLayout::new(width, height);
            let line_height = model.editor.metrics().line_height;
            model
                .editor
                .set_client_height(f64::from(layout.editor.height) * line_height);
            let preview = model.preview.scroll_region_mut();
            let scroll_height = preview.scroll_height();
            preview.resize(scroll_height, f64::from(layout.preview.height) * line_height);
            model.layout = Some(layout);
        }
        Message::Frame => model.scroll_sync.on_frame(),

        Message::LoadDocument(text) => model.load_text(&text),
        // Handled as side effects.
        Message::FileChanged | Message::Save | Message::Export(_) => {}

        Message::ToggleTheme => {
            model.settings.toggle_theme();
            model.invalidate_preview();
        }
        Message::ToggleScrollSync => {
            let enabled = !model.scroll_sync.is_enabled();
            model.scroll_sync.set_enabled(enabled);
        }
        Message::ToggleWatch => model.watch_enabled = !model.watch_enabled,

        Message::Quit => {
            model.slash.teardown();
            model.preview.teardown();
            model.should_quit = true;
        }
    }
    model
}

/// Run an editor-facing change, then let the slash session and the scroll
/// coupling react to whatever it did to the document.
pub(super) fn edit(model: &mut Model, change: impl FnOnce(&mut Model)) {
    let revision = model.editor.revision();
    let cursor = model.editor.cursor_offset();
    change(model);

    let edited = model.editor.revision() != revision;
    if edited {
        model.slash.on_document_change(&model.editor);
    }
    if edited || model.editor.cursor_offset() != cursor {
        model.slash.on_cursor_moved(&model.editor);
        let scroll_top = model.editor.scroll_region().scroll_top();
        model.editor.scroll_to_cursor();
        #[allow(clippy::float_cmp)]
        let scrolled = model.editor.scroll_region().scroll_top() != scroll_top;
        if scrolled {
            model.sync_scroll(Pane::Editor);
        }
    }
}

fn edit_buffer(model: &mut Model, change: impl FnOnce(&mut EditorBuffer)) {
    edit(model, |m| change(&mut m.editor));
}

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{Message, Model, update};
use crate::editor::{Direction, HostEditor};
use crate::slash::{KeyDisposition, PointerEvent};
use crate::ui::PaneHit;

use super::update::edit;

/// Lines moved per mouse wheel notch.
const WHEEL_LINES: f64 = 3.0;

/// Translate a host terminal event into a message.
///
/// Once the model has a pane layout, mouse events are routed by pane and
/// editor coordinates are taken relative to the editor pane.
pub fn handle_event(event: Event, model: &Model) -> Option<Message> {
    match event {
        Event::Key(key) => Some(Message::Key(key)),
        Event::Mouse(mouse) => handle_mouse(mouse, model),
        Event::Resize(width, rows) => {
            if model.layout.is_some() {
                Some(Message::Resize(width, rows))
            } else {
                Some(Message::EditorResized(
                    f64::from(rows) * model.editor.metrics().line_height,
                ))
            }
        }
        _ => None,
    }
}

fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
    let (column, row) = match model.layout.map(|l| l.hit(mouse.column, mouse.row)) {
        None => (mouse.column, mouse.row),
        Some(PaneHit::Editor { column, row }) => (column, row),
        Some(PaneHit::Preview) => return preview_mouse(mouse, model),
        Some(PaneHit::Outside) => return None,
    };

    let metrics = model.editor.metrics();
    let x = f64::from(column) * metrics.char_width;
    let y = f64::from(row) * metrics.line_height;
    let top = model.editor.scroll_region().scroll_top();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            Some(Message::Pointer(PointerEvent::Down { x, y }))
        }
        MouseEventKind::Moved => Some(Message::Pointer(PointerEvent::Move { x, y })),
        MouseEventKind::ScrollDown => Some(Message::EditorScrolled(
            top + WHEEL_LINES * metrics.line_height,
        )),
        MouseEventKind::ScrollUp => Some(Message::EditorScrolled(
            top - WHEEL_LINES * metrics.line_height,
        )),
        _ => None,
    }
}

/// The preview only scrolls.
fn preview_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
    let step = WHEEL_LINES * model.editor.metrics().line_height;
    let top = model.preview.scroll_region().scroll_top();
    match mouse.kind {
        MouseEventKind::ScrollDown => Some(Message::PreviewScrolled(top + step)),
        MouseEventKind::ScrollUp => Some(Message::PreviewScrolled(top - step)),
        _ => None,
    }
}

/// The key input chain: the open palette first, then the slash trigger,
/// then the editor's own bindings. A layer that consumes the key stops it.
pub(super) fn route_key(mut model: Model, key: KeyEvent) -> Model {
    if key.kind != KeyEventKind::Press {
        return model;
    }

    let mut disposition = KeyDisposition::PassThrough;
    edit(&mut model, |m| {
        disposition = m.slash.handle_key(&mut m.editor, &key);
        if disposition == KeyDisposition::PassThrough {
            disposition = m.slash.trigger(&mut m.editor, &key);
        }
    });
    if disposition == KeyDisposition::Consumed {
        return model;
    }

    match editor_key_message(&key) {
        Some(msg) => update(model, msg),
        None => model,
    }
}

/// Default editor and application bindings.
pub(super) fn editor_key_message(key: &KeyEvent) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl {
        return match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('s') => Some(Message::Save),
            KeyCode::Char('t') => Some(Message::ToggleTheme),
            KeyCode::Char('y') => Some(Message::ToggleScrollSync),
            KeyCode::Char('w') => Some(Message::ToggleWatch),
            KeyCode::Left => Some(Message::EditorMoveWordLeft),
            KeyCode::Right => Some(Message::EditorMoveWordRight),
            KeyCode::Home => Some(Message::EditorMoveToStart),
            KeyCode::End => Some(Message::EditorMoveToEnd),
            _ => None,
        };
    }
    if key
        .modifiers
        .intersects(KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META)
    {
        return None;
    }

    match key.code {
        KeyCode::Char(c) => Some(Message::EditorInsertChar(c)),
        KeyCode::Tab => Some(Message::EditorInsertChar('\t')),
        KeyCode::Enter => Some(Message::EditorSplitLine),
        KeyCode::Backspace => Some(Message::EditorDeleteBack),
        KeyCode::Delete => Some(Message::EditorDeleteForward),
        KeyCode::Left => Some(Message::EditorMoveCursor(Direction::Left)),
        KeyCode::Right => Some(Message::EditorMoveCursor(Direction::Right)),
        KeyCode::Up => Some(Message::EditorMoveCursor(Direction::Up)),
        KeyCode::Down => Some(Message::EditorMoveCursor(Direction::Down)),
        KeyCode::Home => Some(Message::EditorMoveHome),
        KeyCode::End => Some(Message::EditorMoveEnd),
        _ => None,
    }
}

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tempfile::tempdir;
use tokio::task::LocalSet;

use crate::editor::HostEditor;
use crate::islands::SlotState;
use crate::scroll::SyncLock;
use crate::slash::{CloseReason, PointerEvent};
use crate::theme::{PreviewStyle, Theme, ThemeSettings};

use super::event_loop::{expire_toast, fit_preview};
use super::input::editor_key_message;
use super::{App, Message, Model, ToastLevel, handle_event, page_html, refresh_preview, update};

fn create_test_model() -> Model {
    Model::new(PathBuf::from("test.md"), "")
}

fn create_lines_model(lines: usize) -> Model {
    let text = (0..lines)
        .map(|i| format!("line {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    Model::new(PathBuf::from("test.md"), &text)
}

fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_keys(model: Model, keys: &[Message]) -> Model {
    keys.iter()
        .cloned()
        .fold(model, |model, msg| update(model, msg))
}

#[test]
fn test_typing_inserts_text_and_dirties_preview() {
    let model = create_test_model();
    let model = type_keys(model, &[key(KeyCode::Char('h')), key(KeyCode::Char('i'))]);
    assert_eq!(model.editor.text(), "hi");
    assert!(model.preview_dirty());
}

#[test]
fn test_key_release_is_ignored() {
    let mut event = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
    event.kind = KeyEventKind::Release;
    let model = update(create_test_model(), Message::Key(event));
    assert_eq!(model.editor.text(), "");
}

#[test]
fn test_slash_heading_flow() {
    let model = type_keys(
        create_test_model(),
        &[
            key(KeyCode::Char('/')),
            key(KeyCode::Char('h')),
            key(KeyCode::Char('1')),
            key(KeyCode::Enter),
        ],
    );
    assert_eq!(model.editor.text(), "# Heading 1\n\n");
    assert_eq!(model.editor.cursor_offset(), 13);
    assert_eq!(model.slash.last_close(), Some(CloseReason::Resolved));
}

#[test]
fn test_slash_escape_restores_text() {
    let model = type_keys(create_test_model(), &[key(KeyCode::Char('a'))]);
    let model = type_keys(model, &[key(KeyCode::Char('/')), key(KeyCode::Esc)]);
    assert_eq!(model.editor.text(), "a");
    assert!(!model.slash.is_open());
}

#[test]
fn test_slash_unmatched_letter_keeps_text() {
    let model = type_keys(
        create_test_model(),
        &[key(KeyCode::Char('/')), key(KeyCode::Char('x'))],
    );
    assert_eq!(model.editor.text(), "/x");
    assert!(!model.slash.is_open());
}

#[test]
fn test_palette_consumes_arrows_before_editor() {
    let model = create_lines_model(3);
    let model = update(model, Message::EditorMoveToEnd);
    let line_before = model.editor.cursor().line;
    let model = type_keys(model, &[key(KeyCode::Char('/')), key(KeyCode::Down)]);
    assert_eq!(model.editor.cursor().line, line_before);
    assert_eq!(model.slash.palette().selected_index(), 1);
}

#[test]
fn test_enter_without_palette_splits_line() {
    let model = type_keys(
        create_test_model(),
        &[key(KeyCode::Char('a')), key(KeyCode::Enter), key(KeyCode::Char('b'))],
    );
    assert_eq!(model.editor.text(), "a\nb");
}

#[test]
fn test_editor_key_bindings() {
    let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
    assert_eq!(editor_key_message(&ctrl('s')), Some(Message::Save));
    assert_eq!(editor_key_message(&ctrl('q')), Some(Message::Quit));
    assert_eq!(editor_key_message(&ctrl('t')), Some(Message::ToggleTheme));
    assert_eq!(
        editor_key_message(&KeyEvent::new(KeyCode::Left, KeyModifiers::CONTROL)),
        Some(Message::EditorMoveWordLeft)
    );
    assert_eq!(
        editor_key_message(&KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT)),
        None
    );
    assert_eq!(
        editor_key_message(&KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
        Some(Message::EditorInsertChar('A'))
    );
}

#[test]
fn test_pointer_outside_palette_cancels_session() {
    let model = type_keys(create_test_model(), &[key(KeyCode::Char('/'))]);
    let model = update(
        model,
        Message::Pointer(PointerEvent::Down { x: 900.0, y: 900.0 }),
    );
    assert_eq!(model.editor.text(), "");
    assert_eq!(model.slash.last_close(), Some(CloseReason::Cancelled));
}

#[test]
fn test_editor_scroll_syncs_preview() {
    let model = create_lines_model(10);
    let model = update(model, Message::EditorResized(100.0));
    let model = update(
        model,
        Message::PreviewResized {
            scroll_height: 300.0,
            client_height: 100.0,
        },
    );
    let model = update(model, Message::EditorScrolled(50.0));
    assert!((model.preview.scroll_region().scroll_top() - 100.0).abs() < f64::EPSILON);
    assert_eq!(model.scroll_sync.lock(), SyncLock::Editor);

    // Echo from the preview within the same frame is ignored.
    let model = update(model, Message::PreviewScrolled(40.0));
    assert!((model.editor.scroll_region().scroll_top() - 50.0).abs() < f64::EPSILON);

    let model = update(model, Message::Frame);
    assert_eq!(model.scroll_sync.lock(), SyncLock::None);
    let model = update(model, Message::PreviewScrolled(40.0));
    assert!((model.editor.scroll_region().scroll_top() - 20.0).abs() < f64::EPSILON);
}

#[test]
fn test_toggle_scroll_sync_disables_coupling() {
    let model = create_lines_model(10);
    let model = update(model, Message::EditorResized(100.0));
    let model = update(
        model,
        Message::PreviewResized {
            scroll_height: 300.0,
            client_height: 100.0,
        },
    );
    let model = update(model, Message::ToggleScrollSync);
    let model = update(model, Message::EditorScrolled(50.0));
    assert!(model.preview.scroll_region().is_at_top());
}

#[test]
fn test_toggle_theme_invalidates_preview() {
    let mut model = create_test_model();
    model.mark_rendered();
    assert!(!model.preview_dirty());
    let model = update(model, Message::ToggleTheme);
    assert_eq!(model.settings.theme, Theme::Dark);
    assert!(model.preview_dirty());
}

#[test]
fn test_load_document_drops_slash_session() {
    let model = type_keys(create_test_model(), &[key(KeyCode::Char('/'))]);
    assert!(model.slash.is_open());
    let model = update(model, Message::LoadDocument("# Other".to_string()));
    assert!(!model.slash.is_open());
    assert_eq!(model.slash.last_close(), Some(CloseReason::Invalidated));
    assert_eq!(model.editor.text(), "# Other");
    assert!(!model.editor.is_dirty());
}

#[test]
fn test_quit_tears_down() {
    let model = update(create_test_model(), Message::Quit);
    assert!(model.should_quit);
    assert!(model.preview.is_torn_down());
}

#[test]
fn test_handle_event_maps_mouse_to_editor_coordinates() {
    let model = create_test_model();
    let mouse = MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: 3,
        row: 2,
        modifiers: KeyModifiers::NONE,
    };
    assert_eq!(
        handle_event(Event::Mouse(mouse), &model),
        Some(Message::Pointer(PointerEvent::Down { x: 24.0, y: 40.0 }))
    );
    assert_eq!(
        handle_event(Event::Resize(80, 10), &model),
        Some(Message::EditorResized(200.0))
    );
}

#[test]
fn test_resize_sets_layout_and_pane_heights() {
    let model = update(create_test_model(), Message::Resize(80, 24));
    let layout = model.layout.unwrap();
    assert_eq!(layout.editor.height, 23);
    assert!((model.editor.scroll_region().client_height() - 460.0).abs() < f64::EPSILON);
    assert!((model.preview.scroll_region().client_height() - 460.0).abs() < f64::EPSILON);
}

#[test]
fn test_handle_event_routes_mouse_by_pane() {
    let model = update(create_test_model(), Message::Resize(80, 24));
    let mouse = |kind, column, row| {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    };

    assert_eq!(
        handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 3, 2), &model),
        Some(Message::Pointer(PointerEvent::Down { x: 24.0, y: 40.0 }))
    );
    assert_eq!(
        handle_event(mouse(MouseEventKind::ScrollDown, 60, 5), &model),
        Some(Message::PreviewScrolled(60.0))
    );
    assert_eq!(
        handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 60, 5), &model),
        None
    );
    assert_eq!(
        handle_event(mouse(MouseEventKind::ScrollDown, 10, 23), &model),
        None
    );
    assert_eq!(
        handle_event(Event::Resize(100, 30), &model),
        Some(Message::Resize(100, 30))
    );
}

#[test]
fn test_expire_toast_after_display_time() {
    let mut model = create_test_model();
    let mut shown = None;
    assert!(!expire_toast(&mut model, &mut shown));

    model.show_toast(ToastLevel::Info, "Saved");
    assert!(!expire_toast(&mut model, &mut shown));
    assert!(!expire_toast(&mut model, &mut shown));
    assert!(model.toast().is_some());

    let toast = model.toast().cloned().unwrap();
    let long_ago = Instant::now().checked_sub(Duration::from_secs(4)).unwrap();
    shown = Some((toast, long_ago));
    assert!(expire_toast(&mut model, &mut shown));
    assert!(model.toast().is_none());
    assert!(shown.is_none());
}

#[tokio::test]
async fn test_fit_preview_wraps_text_and_reports_height() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let model = Model::new(PathBuf::from("test.md"), "# Title\n\nsome text\n");
            let mut model = update(model, Message::Resize(80, 24));
            refresh_preview(&mut model);
            model.preview.settle().await;

            let mut lines = Vec::new();
            let model = fit_preview(model, &mut lines);
            assert_eq!(lines, vec!["Title", "", "some text"]);
            let region = model.preview.scroll_region();
            assert!((region.scroll_height() - 60.0).abs() < f64::EPSILON);
            assert!((region.client_height() - 460.0).abs() < f64::EPSILON);
        })
        .await;
}

#[tokio::test]
async fn test_refresh_preview_mounts_islands() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let mut model = Model::new(PathBuf::from("test.md"), "# T\n\n`$x^2$`\n");
            assert_eq!(refresh_preview(&mut model), Some(1));
            assert_eq!(model.preview.slot_states(), vec![SlotState::Loading]);
            model.preview.settle().await;
            assert_eq!(model.preview.slot_states(), vec![SlotState::Mounted]);
            assert!(model.preview.html().contains("island-math"));

            assert_eq!(refresh_preview(&mut model), None);

            let model = update(model, Message::EditorInsertChar('!'));
            let mut model = model;
            assert_eq!(refresh_preview(&mut model), Some(2));
        })
        .await;
}

#[tokio::test]
async fn test_refresh_after_quit_does_nothing() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let model = update(create_test_model(), Message::Quit);
            let mut model = update(model, Message::LoadDocument("x".to_string()));
            assert_eq!(refresh_preview(&mut model), None);
        })
        .await;
}

#[test]
fn test_page_html_follows_theme_settings() {
    let model = create_test_model().with_settings(ThemeSettings::new(Theme::Dark, PreviewStyle::Prose));
    let page = page_html(&model);
    assert!(page.contains("<html lang=\"en\" class=\"dark\">"));
    assert!(page.contains("prose-invert"));
    assert!(page.contains("<title>test.md</title>"));
}

#[test]
fn test_save_and_reload_side_effects() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.md");
    std::fs::write(&path, "old").unwrap();
    let app = App::new(path.clone());
    let mut watcher = None;

    let model = Model::new(path.clone(), "old");
    let model = update(model, Message::EditorMoveToEnd);
    let model = update(model, Message::EditorInsertChar('!'));
    let model = app.dispatch(model, &mut watcher, Message::Save);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "old!");
    assert!(!model.editor.is_dirty());

    std::fs::write(&path, "from disk").unwrap();
    let model = app.dispatch(model, &mut watcher, Message::FileChanged);
    assert_eq!(model.editor.text(), "from disk");
    assert_eq!(model.toast().map(|t| t.level), Some(ToastLevel::Info));
}

#[test]
fn test_reload_missing_file_reports_error() {
    let dir = tempdir().unwrap();
    let app = App::new(dir.path().join("gone.md"));
    let mut watcher = None;
    let model = Model::new(dir.path().join("gone.md"), "keep");
    let model = app.dispatch(model, &mut watcher, Message::FileChanged);
    assert_eq!(model.editor.text(), "keep");
    assert_eq!(model.toast().map(|t| t.level), Some(ToastLevel::Error));
}

#[test]
fn test_export_side_effect_writes_next_to_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.md");
    let app = App::new(path.clone());
    let mut watcher = None;
    let model = Model::new(path, "# Export me");
    let _model = app.dispatch(model, &mut watcher, Message::Export(String::new()));
    let exported = std::fs::read_to_string(dir.path().join("document.md")).unwrap();
    assert_eq!(exported, "# Export me");
}

#[test]
fn test_run_writes_preview_page() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "# Notes\n\nInline `$a+b$` here.\n").unwrap();
    let output = dir.path().join("out.html");

    App::new(path).with_output(Some(output.clone())).run().unwrap();

    let page = std::fs::read_to_string(output).unwrap();
    assert!(page.contains("<h1>Notes</h1>"));
    assert!(page.contains("island-math"));
    assert!(!page.contains("Loading math..."));
}

#[test]
fn test_run_starts_new_document_from_starter_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fresh.md");

    App::new(path.clone()).run().unwrap();

    let page = std::fs::read_to_string(dir.path().join("fresh.html")).unwrap();
    assert!(page.contains("Hello Markdown"));
    // The starter text is only written back on save.
    assert!(!path.exists());
}

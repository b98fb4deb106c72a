use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use livemark::editor::EditorBuffer;
use livemark::scroll::{Pane, ScrollRegion, ScrollSync, SyncOutcome};
use livemark::slash::{CloseReason, KeyDisposition, SlashCommands, TemplateCatalog};

fn press(slash: &mut SlashCommands, editor: &mut EditorBuffer, code: KeyCode) {
    let key = KeyEvent::new(code, KeyModifiers::NONE);
    if slash.handle_key(editor, &key) == KeyDisposition::Consumed
        || slash.trigger(editor, &key) == KeyDisposition::Consumed
    {
        return;
    }
    match code {
        KeyCode::Char(c) => editor.insert_char(c),
        KeyCode::Backspace => {
            editor.delete_back();
        }
        _ => {}
    }
    slash.on_document_change(editor);
    slash.on_cursor_moved(editor);
}

fn custom_catalog() -> TemplateCatalog {
    TemplateCatalog::from_json(
        r#"[
            {"id": "sig", "title": "Signature", "template": "-- \nA. Author"},
            {"id": "todo", "title": "Todo marker", "description": "TODO(name)", "template": "TODO: "}
        ]"#,
    )
    .unwrap()
}

#[test]
fn test_custom_catalog_resolves_in_the_middle_of_text() {
    let mut editor = EditorBuffer::from_text("Hello world");
    editor.set_cursor_offset(6);
    let mut slash = SlashCommands::new(custom_catalog());

    for code in [KeyCode::Char('/'), KeyCode::Char('t'), KeyCode::Enter] {
        press(&mut slash, &mut editor, code);
    }

    assert_eq!(editor.text(), "Hello TODO: world");
    assert_eq!(editor.cursor_offset(), 12);
    assert_eq!(slash.last_close(), Some(CloseReason::Resolved));
}

#[test]
fn test_escape_restores_multiline_document() {
    let original = "# Title\n\nBody text\n";
    let mut editor = EditorBuffer::from_text(original);
    editor.move_to(1, 0);
    let mut slash = SlashCommands::default();

    press(&mut slash, &mut editor, KeyCode::Char('/'));
    assert_eq!(editor.text(), "# Title\n/\nBody text\n");
    press(&mut slash, &mut editor, KeyCode::Esc);

    assert_eq!(editor.text(), original);
    assert_eq!(editor.cursor_offset(), 8);
}

#[test]
fn test_palette_anchors_below_cursor_line() {
    let mut editor = EditorBuffer::from_text("ab\ncd");
    editor.move_to_end();
    let mut slash = SlashCommands::default();
    press(&mut slash, &mut editor, KeyCode::Char('/'));

    let anchor = slash.palette().position().unwrap();
    assert!((anchor.top - 40.0).abs() < f64::EPSILON);
    assert!((anchor.left - 24.0).abs() < f64::EPSILON);
    let bounds = slash.palette().bounds().unwrap();
    assert!((bounds.top - 46.0).abs() < f64::EPSILON);
}

#[test]
fn test_static_palette_passes_letters_through() {
    let mut editor = EditorBuffer::empty();
    let mut slash = SlashCommands::new(custom_catalog()).with_static_palette(true);
    press(&mut slash, &mut editor, KeyCode::Char('/'));
    press(&mut slash, &mut editor, KeyCode::Char('s'));
    assert_eq!(editor.text(), "/s");
    assert_eq!(slash.last_close(), Some(CloseReason::PassThrough));
}

#[test]
fn test_second_slash_starts_new_session() {
    let mut editor = EditorBuffer::empty();
    let mut slash = SlashCommands::default();
    for code in [
        KeyCode::Char('/'),
        KeyCode::Char('x'),
        KeyCode::Char(' '),
        KeyCode::Char('/'),
    ] {
        press(&mut slash, &mut editor, code);
    }
    assert_eq!(editor.text(), "/x /");
    assert!(slash.is_open());
    assert_eq!(slash.session().unwrap().slash_offset, 4);
}

#[test]
fn test_scroll_sync_between_editor_and_preview() {
    let mut editor = ScrollRegion::new(150.0, 50.0);
    editor.set_scroll_top(50.0);
    let mut preview = ScrollRegion::new(300.0, 100.0);
    let mut sync = ScrollSync::default();

    let outcome = sync.on_scroll(Pane::Editor, &editor, Some(&mut preview));
    assert_eq!(
        outcome,
        SyncOutcome::Synced {
            target_scroll_top: 100.0
        }
    );

    // The preview's own scroll event for that write is swallowed.
    let echo = sync.on_scroll(Pane::Preview, &preview, Some(&mut editor));
    assert_eq!(echo, SyncOutcome::Ignored);
    assert!((editor.scroll_top() - 50.0).abs() < f64::EPSILON);

    sync.on_frame();
    preview.set_scroll_top(0.0);
    sync.on_scroll(Pane::Preview, &preview, Some(&mut editor));
    assert!(editor.is_at_top());
}

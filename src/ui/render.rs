use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::app::{Model, ToastLevel};
use crate::editor::HostEditor;
use crate::slash::PALETTE_ROW_HEIGHT;

use super::PaneLayout;

/// Render the complete UI.
pub fn render(model: &Model, preview_lines: &[String], frame: &mut Frame) {
    let layout = model.layout.unwrap_or_else(|| {
        let area = frame.area();
        PaneLayout::new(area.width, area.height)
    });

    render_editor(model, frame, layout.editor);
    render_preview(model, preview_lines, frame, layout.preview);
    render_status_bar(model, frame, layout.status);
    if model.slash.is_open() {
        render_palette(model, frame, layout.editor);
    }
}

/// Tabs draw as one column so the cursor matches the buffer's columns.
fn display_line(text: &str) -> String {
    text.replace('\t', " ")
}

/// Whole cells covered by `value`, clamped to the terminal range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cells(value: f64) -> u16 {
    value.clamp(0.0, f64::from(u16::MAX)) as u16
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn first_row(scroll_top: f64, line_height: f64) -> usize {
    if line_height <= 0.0 {
        return 0;
    }
    (scroll_top / line_height).floor().max(0.0) as usize
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let metrics = model.editor.metrics();
    let start = first_row(model.editor.scroll_region().scroll_top(), metrics.line_height);
    let rows = usize::from(area.height);

    let lines: Vec<Line> = (start..model.editor.line_count())
        .take(rows)
        .filter_map(|idx| model.editor.line_at(idx))
        .map(|text| Line::raw(display_line(&text)))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);

    let cursor = model.editor.cursor();
    if cursor.line < start || cursor.line >= start + rows {
        return;
    }
    let prefix: String = model
        .editor
        .line_at(cursor.line)
        .unwrap_or_default()
        .chars()
        .take(cursor.col)
        .collect();
    let column = u16::try_from(display_line(&prefix).width())
        .unwrap_or(u16::MAX)
        .min(area.width.saturating_sub(1));
    let row = u16::try_from(cursor.line - start).unwrap_or_default();
    frame.set_cursor_position((area.x + column, area.y + row));
}

fn render_preview(model: &Model, preview_lines: &[String], frame: &mut Frame, area: Rect) {
    let start = first_row(
        model.preview.scroll_region().scroll_top(),
        model.editor.metrics().line_height,
    );
    let lines: Vec<Line> = preview_lines
        .iter()
        .skip(start)
        .take(usize::from(area.height))
        .map(|line| Line::raw(line.as_str()))
        .collect();

    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Draw the open palette where its bounds fall in editor cells.
fn render_palette(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(bounds) = model.slash.palette().bounds() else {
        return;
    };
    let metrics = model.editor.metrics();
    let rows_per_item = cells((PALETTE_ROW_HEIGHT / metrics.line_height).round()).max(1);
    let items = model.slash.visible_items();

    let top = area.y + cells((bounds.top / metrics.line_height).ceil());
    let left = area.x + cells(bounds.left / metrics.char_width);
    let width = cells(bounds.width / metrics.char_width);
    let height = u16::try_from(items.len())
        .unwrap_or(u16::MAX)
        .saturating_mul(rows_per_item);
    let popup = Rect::new(left, top, width, height).intersection(area);
    if popup.is_empty() {
        return;
    }

    let selected = model.slash.palette().selected_index();
    let mut lines = Vec::with_capacity(usize::from(height));
    for (index, item) in items.iter().enumerate() {
        let title_style = if index == selected {
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::styled(format!(" {}", item.title), title_style));
        for _ in 1..rows_per_item {
            let detail = item.description.as_deref().unwrap_or(item.id.as_str());
            lines.push(Line::styled(
                format!("   {detail}"),
                Style::default().fg(Color::Gray),
            ));
        }
    }

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(Color::Black).fg(Color::White)),
        popup,
    );
}

fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let (status, style) = if let Some(toast) = model.toast() {
        let style = match toast.level {
            ToastLevel::Info => Style::default().bg(Color::Blue).fg(Color::White),
            ToastLevel::Warning => Style::default().bg(Color::Yellow).fg(Color::Black),
            ToastLevel::Error => Style::default().bg(Color::Red).fg(Color::White),
        };
        (format!(" {}", toast.message), style)
    } else {
        let filename = model
            .file_path
            .file_name()
            .map_or_else(|| "untitled".to_string(), |s| s.to_string_lossy().to_string());
        let modified = if model.editor.is_dirty() { " [+]" } else { "" };
        let sync = if model.scroll_sync.is_enabled() {
            "sync"
        } else {
            "no sync"
        };
        let watch = if model.watch_enabled {
            " [watching]"
        } else {
            ""
        };
        let status = format!(
            " {filename}{modified}  {}  [{sync}] [{}]{watch}  ^S save ^Q quit",
            model.counts(),
            model.settings.theme.name()
        );
        (status, Style::default().bg(Color::DarkGray).fg(Color::White))
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

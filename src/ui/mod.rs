//! Terminal user interface for `livemark --edit`.
//!
//! The screen is split into the editor on the left, a plain-text reading of
//! the rendered preview on the right and a status bar. [`PaneLayout`] is the
//! single source of pane geometry, so mouse routing and drawing agree.

mod render;

use ratatui::layout::{Constraint, Layout, Position, Rect};
use unicode_width::UnicodeWidthChar;

use crate::islands::decode_entities;

pub use render::render;

/// Editor share of the body width, in percent.
pub const EDITOR_WIDTH_PERCENT: u16 = 50;

/// Where each pane sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneLayout {
    pub editor: Rect,
    pub preview: Rect,
    pub status: Rect,
}

/// The pane under a screen cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneHit {
    /// Inside the editor, relative to its top-left corner.
    Editor { column: u16, row: u16 },
    Preview,
    Outside,
}

impl PaneLayout {
    pub fn new(width: u16, height: u16) -> Self {
        let area = Rect::new(0, 0, width, height);
        let [body, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
        let [editor, preview] = Layout::horizontal([
            Constraint::Percentage(EDITOR_WIDTH_PERCENT),
            Constraint::Percentage(100 - EDITOR_WIDTH_PERCENT),
        ])
        .areas(body);
        Self {
            editor,
            preview,
            status,
        }
    }

    /// Preview text area, right of the separator.
    pub const fn preview_text(&self) -> Rect {
        Rect {
            x: self.preview.x.saturating_add(1),
            y: self.preview.y,
            width: self.preview.width.saturating_sub(1),
            height: self.preview.height,
        }
    }

    pub fn hit(&self, column: u16, row: u16) -> PaneHit {
        let position = Position::new(column, row);
        if self.editor.contains(position) {
            PaneHit::Editor {
                column: column - self.editor.x,
                row: row - self.editor.y,
            }
        } else if self.preview.contains(position) {
            PaneHit::Preview
        } else {
            PaneHit::Outside
        }
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "table",
    "tr",
    "ul",
    "ol",
    "section",
    "article",
    "br",
];

/// Tags whose end leaves a blank line behind.
const SPACED_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "pre",
    "blockquote",
    "table",
    "ul",
    "ol",
];

/// Plain-text lines of preview HTML.
///
/// Block elements start new lines, list items get a bullet, and `<pre>`
/// keeps its own line breaks. Mounted diagrams read as `[diagram]`.
pub fn preview_text(html: &str) -> Vec<String> {
    let mut reader = TextReader::default();
    let mut rest = html;
    while let Some(lt) = rest.find('<') {
        reader.text(&rest[..lt]);
        let Some(gt) = rest[lt..].find('>') else {
            rest = &rest[lt..];
            break;
        };
        reader.tag(&rest[lt + 1..lt + gt]);
        rest = &rest[lt + gt + 1..];
    }
    reader.text(rest);
    reader.finish()
}

#[derive(Default)]
struct TextReader {
    lines: Vec<String>,
    current: String,
    skip_depth: usize,
    pre_depth: usize,
}

impl TextReader {
    fn text(&mut self, raw: &str) {
        if self.skip_depth > 0 || raw.is_empty() {
            return;
        }
        let text = decode_entities(raw);
        if self.pre_depth > 0 {
            let mut parts = text.split('\n');
            if let Some(first) = parts.next() {
                self.current.push_str(first);
            }
            for part in parts {
                self.flush();
                self.current.push_str(part);
            }
            return;
        }
        for ch in text.chars() {
            let ch = if ch.is_whitespace() { ' ' } else { ch };
            if ch == ' ' && (self.current.is_empty() || self.current.ends_with(' ')) {
                continue;
            }
            self.current.push(ch);
        }
    }

    fn tag(&mut self, tag: &str) {
        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match name.as_str() {
            "svg" | "style" | "script" => {
                if closing {
                    self.skip_depth = self.skip_depth.saturating_sub(1);
                } else if !self_closing {
                    if name == "svg" && self.skip_depth == 0 {
                        self.current.push_str("[diagram]");
                    }
                    self.skip_depth += 1;
                }
            }
            _ if self.skip_depth > 0 => {}
            "pre" => {
                if closing {
                    if !self.current.is_empty() {
                        self.flush();
                    }
                    self.pre_depth = self.pre_depth.saturating_sub(1);
                    self.gap();
                } else {
                    self.flush();
                    self.pre_depth += 1;
                }
            }
            "li" if !closing => {
                self.flush();
                self.current.push_str("• ");
            }
            "hr" => {
                self.flush();
                self.lines.push("───".to_string());
                self.gap();
            }
            "td" | "th" if !closing && !self.current.is_empty() => self.current.push_str(" | "),
            other => {
                if BLOCK_TAGS.contains(&other) || other == "li" {
                    self.flush();
                }
                if closing && SPACED_TAGS.contains(&other) {
                    self.gap();
                }
            }
        }
    }

    fn flush(&mut self) {
        let line = std::mem::take(&mut self.current);
        if self.pre_depth > 0 {
            self.lines.push(line);
        } else if !line.trim().is_empty() {
            self.lines.push(line.trim_end().to_string());
        }
    }

    fn gap(&mut self) {
        if self.lines.last().is_some_and(|line| !line.is_empty()) {
            self.lines.push(String::new());
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        while self.lines.last().is_some_and(String::is_empty) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Hard-wrap `lines` to `width` display columns. A zero width leaves them
/// as they are.
pub fn wrap_lines(lines: &[String], width: usize) -> Vec<String> {
    if width == 0 {
        return lines.to_vec();
    }
    let mut wrapped = Vec::with_capacity(lines.len());
    for line in lines {
        let mut current = String::new();
        let mut used = 0;
        for ch in line.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if used + ch_width > width && !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
                used = 0;
            }
            current.push(ch);
            used += ch_width;
        }
        wrapped.push(current);
    }
    wrapped
}

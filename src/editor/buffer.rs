use std::ops::Range;

use ropey::Rope;
use unicode_width::UnicodeWidthStr;

use super::{Anchor, EditorMetrics, HostEditor};
use crate::scroll::ScrollRegion;

/// Cursor position in the editor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column, in chars within the line.
    pub col: usize,
    /// Remembered column for vertical movement (sticky column).
    col_memory: usize,
}

impl Cursor {
    /// Create a cursor at line 0, column 0.
    pub const fn new() -> Self {
        Self {
            line: 0,
            col: 0,
            col_memory: 0,
        }
    }

    /// Create a cursor at a specific position.
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            col_memory: col,
        }
    }

    /// Update column and reset column memory to match.
    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.col_memory = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A text buffer backed by a rope data structure.
///
/// Tracks a line/column cursor, a revision counter bumped by every edit, and
/// the pane's scroll region (content height is line count times line
/// height).
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    dirty: bool,
    revision: u64,
    metrics: EditorMetrics,
    scroll: ScrollRegion,
}

impl EditorBuffer {
    /// Create a new buffer from a string.
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self {
            rope: Rope::from_str(text),
            cursor: Cursor::new(),
            dirty: false,
            revision: 0,
            metrics: EditorMetrics::default(),
            scroll: ScrollRegion::default(),
        };
        buffer.refresh_scroll();
        buffer
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Use `metrics` for coordinates and scroll height.
    #[must_use]
    pub fn with_metrics(mut self, metrics: EditorMetrics) -> Self {
        self.metrics = metrics;
        self.refresh_scroll();
        self
    }

    pub const fn metrics(&self) -> EditorMetrics {
        self.metrics
    }

    /// Change the visible pane height.
    pub fn set_client_height(&mut self, client_height: f64) {
        self.metrics.client_height = client_height;
        self.refresh_scroll();
    }

    /// The current cursor position.
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Whether the buffer has been modified since creation or last save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the buffer as clean (e.g., after saving).
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(line_idx).to_string();
        Some(line.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Length of a line in chars (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.chars().count())
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole document, keeping the cursor offset where possible.
    pub fn set_text(&mut self, text: &str) {
        let offset = self.cursor_offset();
        self.rope = Rope::from_str(text);
        self.set_cursor_offset(offset);
        self.touch();
    }

    /// Cursor position as a char offset into the document.
    pub fn cursor_offset(&self) -> usize {
        self.rope.line_to_char(self.cursor.line) + self.cursor.col
    }

    /// Move the cursor to char `offset`, clamped to the document.
    pub fn set_cursor_offset(&mut self, offset: usize) {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        let col = offset - self.rope.line_to_char(line);
        self.cursor.line = line;
        self.cursor.set_col(col.min(self.line_len(line)));
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) {
        let idx = self.cursor_offset();
        self.rope.insert_char(idx, ch);
        if ch == '\n' {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        } else {
            self.cursor.set_col(self.cursor.col + 1);
        }
        self.touch();
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let idx = self.cursor_offset();
        self.rope.insert(idx, s);
        self.set_cursor_offset(idx + s.chars().count());
        self.touch();
    }

    /// Split the current line at the cursor (Enter key).
    pub fn split_line(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the character before the cursor (Backspace).
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_back(&mut self) -> bool {
        let idx = self.cursor_offset();
        if idx == 0 {
            return false;
        }
        self.rope.remove(idx - 1..idx);
        self.set_cursor_offset(idx - 1);
        self.touch();
        true
    }

    /// Delete the character at the cursor (Delete key).
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_forward(&mut self) -> bool {
        let idx = self.cursor_offset();
        if idx >= self.rope.len_chars() {
            return false;
        }
        self.rope.remove(idx..=idx);
        self.touch();
        true
    }

    /// Move the cursor in the given direction.
    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_up(),
            Direction::Down => self.move_down(),
        }
    }

    /// Move cursor to the beginning of the line (Home).
    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    /// Move cursor to the end of the line (End).
    pub fn move_end(&mut self) {
        let len = self.line_len(self.cursor.line);
        self.cursor.set_col(len);
    }

    /// Move cursor one word to the left (Ctrl+Left).
    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.cursor.set_col(self.line_len(self.cursor.line));
            }
            return;
        }

        let chars: Vec<char> = self.line_at(self.cursor.line).unwrap_or_default().chars().collect();
        let mut col = self.cursor.col.min(chars.len());
        while col > 0 && chars[col - 1].is_whitespace() {
            col -= 1;
        }
        let word = col > 0 && is_word_char(chars[col - 1]);
        while col > 0 && !chars[col - 1].is_whitespace() && is_word_char(chars[col - 1]) == word {
            col -= 1;
        }
        self.cursor.set_col(col);
    }

    /// Move cursor one word to the right (Ctrl+Right).
    pub fn move_word_right(&mut self) {
        let line_len = self.line_len(self.cursor.line);

        if self.cursor.col >= line_len {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }

        let chars: Vec<char> = self.line_at(self.cursor.line).unwrap_or_default().chars().collect();
        let mut col = self.cursor.col;
        // Skip current word, then the gap up to the next one
        while col < chars.len() && is_word_char(chars[col]) {
            col += 1;
        }
        while col < chars.len() && !is_word_char(chars[col]) {
            col += 1;
        }
        self.cursor.set_col(col);
    }

    /// Move cursor to a specific line and column.
    pub fn move_to(&mut self, line: usize, col: usize) {
        let max_line = self.line_count().saturating_sub(1);
        self.cursor.line = line.min(max_line);
        let max_col = self.line_len(self.cursor.line);
        self.cursor.set_col(col.min(max_col));
    }

    /// Move cursor to the start of the buffer (Ctrl+Home).
    pub const fn move_to_start(&mut self) {
        self.cursor.line = 0;
        self.cursor.set_col(0);
    }

    /// Move cursor to the end of the buffer (Ctrl+End).
    pub fn move_to_end(&mut self) {
        let last_line = self.line_count().saturating_sub(1);
        self.cursor.line = last_line;
        self.cursor.set_col(self.line_len(last_line));
    }

    /// Scroll so that the cursor line is visible.
    pub fn scroll_to_cursor(&mut self) {
        #[allow(clippy::cast_precision_loss)]
        let line_top = self.cursor.line as f64 * self.metrics.line_height;
        let line_bottom = line_top + self.metrics.line_height;
        let top = self.scroll.scroll_top();
        if line_top < top {
            self.scroll.set_scroll_top(line_top);
        } else if line_bottom > top + self.metrics.client_height {
            self.scroll
                .set_scroll_top(line_bottom - self.metrics.client_height);
        }
    }

    // --- Private helpers ---

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
        self.refresh_scroll();
    }

    fn refresh_scroll(&mut self) {
        #[allow(clippy::cast_precision_loss)]
        let content_height = self.line_count() as f64 * self.metrics.line_height;
        self.scroll
            .resize(content_height, self.metrics.client_height);
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.set_col(self.cursor.col - 1);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.set_col(self.line_len(self.cursor.line));
        }
    }

    fn move_right(&mut self) {
        if self.cursor.col < self.line_len(self.cursor.line) {
            self.cursor.set_col(self.cursor.col + 1);
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }

    fn move_up(&mut self) {
        if self.cursor.line > 0 {
            self.cursor.line -= 1;
            let max_col = self.line_len(self.cursor.line);
            self.cursor.col = self.cursor.col_memory.min(max_col);
        }
    }

    fn move_down(&mut self) {
        if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            let max_col = self.line_len(self.cursor.line);
            self.cursor.col = self.cursor.col_memory.min(max_col);
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl HostEditor for EditorBuffer {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }

    fn slice(&self, range: Range<usize>) -> String {
        let len = self.rope.len_chars();
        let end = range.end.min(len);
        let start = range.start.min(end);
        self.rope.slice(start..end).to_string()
    }

    fn cursor_offset(&self) -> usize {
        Self::cursor_offset(self)
    }

    fn coords_at(&self, offset: usize) -> Anchor {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        let prefix = self
            .rope
            .slice(self.rope.line_to_char(line)..offset)
            .to_string();
        #[allow(clippy::cast_precision_loss)]
        let anchor = Anchor {
            top: (line + 1) as f64 * self.metrics.line_height - self.scroll.scroll_top(),
            left: prefix.width() as f64 * self.metrics.char_width,
        };
        anchor
    }

    fn replace(&mut self, range: Range<usize>, text: &str, cursor: usize) {
        let len = self.rope.len_chars();
        let end = range.end.min(len);
        let start = range.start.min(end);
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.set_cursor_offset(cursor);
        self.touch();
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn scroll_region(&self) -> ScrollRegion {
        self.scroll
    }

    fn set_scroll_top(&mut self, scroll_top: f64) {
        self.scroll.set_scroll_top(scroll_top);
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("cursor", &self.cursor)
            .field("dirty", &self.dirty)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    // --- Construction and basic queries ---

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buf = EditorBuffer::empty();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0), Some(String::new()));
    }

    #[test]
    fn test_from_text_preserves_content() {
        let buf = EditorBuffer::from_text("hello\nworld");
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.line_at(1), Some("world".to_string()));
        assert_eq!(buf.text(), "hello\nworld");
    }

    #[test]
    fn test_line_at_strips_crlf() {
        let buf = EditorBuffer::from_text("one\r\ntwo");
        assert_eq!(buf.line_at(0), Some("one".to_string()));
        assert_eq!(buf.line_len(0), 3);
    }

    #[test]
    fn test_line_len_counts_chars() {
        let buf = EditorBuffer::from_text("héllo\nhi");
        assert_eq!(buf.line_len(0), 5);
        assert_eq!(buf.line_len(1), 2);
    }

    // --- Dirty tracking and revisions ---

    #[test]
    fn test_new_buffer_is_clean_at_revision_zero() {
        let buf = EditorBuffer::from_text("hello");
        assert!(!buf.is_dirty());
        assert_eq!(buf.revision(), 0);
    }

    #[test]
    fn test_every_edit_bumps_revision() {
        let mut buf = EditorBuffer::from_text("hello");
        buf.insert_char('x');
        buf.delete_back();
        buf.replace(0..1, "H", 1);
        assert_eq!(buf.revision(), 3);
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_noop_edits_keep_revision() {
        let mut buf = EditorBuffer::from_text("hi");
        buf.insert_str("");
        assert!(!buf.delete_back());
        buf.move_cursor(Direction::Right);
        assert_eq!(buf.revision(), 0);
    }

    #[test]
    fn test_mark_clean_resets_dirty() {
        let mut buf = EditorBuffer::empty();
        buf.insert_char('a');
        buf.mark_clean();
        assert!(!buf.is_dirty());
    }

    // --- Insertion ---

    #[test]
    fn test_insert_char_in_middle() {
        let mut buf = EditorBuffer::from_text("hllo");
        buf.move_to(0, 1);
        buf.insert_char('e');
        assert_eq!(buf.text(), "hello");
        assert_eq!(buf.cursor(), Cursor::at(0, 2));
    }

    #[test]
    fn test_insert_multibyte_char() {
        let mut buf = EditorBuffer::empty();
        buf.insert_char('é');
        buf.insert_char('x');
        assert_eq!(buf.text(), "éx");
        assert_eq!(buf.cursor_offset(), 2);
    }

    #[test]
    fn test_insert_str_multiline_moves_cursor_to_end() {
        let mut buf = EditorBuffer::from_text("ab");
        buf.move_to(0, 1);
        buf.insert_str("1\n22\n3");
        assert_eq!(buf.text(), "a1\n22\n3b");
        assert_eq!(buf.cursor(), Cursor::at(2, 1));
    }

    #[test]
    fn test_split_line_in_middle() {
        let mut buf = EditorBuffer::from_text("hello");
        buf.move_to(0, 2);
        buf.split_line();
        assert_eq!(buf.text(), "he\nllo");
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
    }

    // --- Deletion ---

    #[test]
    fn test_delete_back_at_start_is_noop() {
        let mut buf = EditorBuffer::from_text("hello");
        assert!(!buf.delete_back());
        assert_eq!(buf.text(), "hello");
    }

    #[test]
    fn test_delete_back_joins_lines() {
        let mut buf = EditorBuffer::from_text("hello\nworld");
        buf.move_to(1, 0);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "helloworld");
        assert_eq!(buf.cursor(), Cursor::at(0, 5));
    }

    #[test]
    fn test_delete_back_multibyte() {
        let mut buf = EditorBuffer::from_text("aé");
        buf.move_end();
        buf.delete_back();
        assert_eq!(buf.text(), "a");
    }

    #[test]
    fn test_delete_forward_at_end_is_noop() {
        let mut buf = EditorBuffer::from_text("hi");
        buf.move_to_end();
        assert!(!buf.delete_forward());
    }

    #[test]
    fn test_delete_forward_joins_lines() {
        let mut buf = EditorBuffer::from_text("hello\nworld");
        buf.move_end();
        assert!(buf.delete_forward());
        assert_eq!(buf.text(), "helloworld");
    }

    // --- Cursor movement ---

    #[test]
    fn test_move_left_wraps_to_prev_line() {
        let mut buf = EditorBuffer::from_text("ab\ncd");
        buf.move_to(1, 0);
        buf.move_cursor(Direction::Left);
        assert_eq!(buf.cursor(), Cursor::at(0, 2));
    }

    #[test]
    fn test_move_right_wraps_to_next_line() {
        let mut buf = EditorBuffer::from_text("ab\ncd");
        buf.move_to(0, 2);
        buf.move_cursor(Direction::Right);
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
    }

    #[test]
    fn test_column_memory_across_short_line() {
        let mut buf = EditorBuffer::from_text("long line\nab\nanother long");
        buf.move_to(0, 7);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 7);
    }

    #[test]
    fn test_move_home_and_end() {
        let mut buf = EditorBuffer::from_text("hello");
        buf.move_to(0, 3);
        buf.move_home();
        assert_eq!(buf.cursor().col, 0);
        buf.move_end();
        assert_eq!(buf.cursor().col, 5);
    }

    #[test]
    fn test_move_word_left_from_middle_of_word() {
        let mut buf = EditorBuffer::from_text("hello world");
        buf.move_to(0, 9);
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 6);
    }

    #[test]
    fn test_move_word_left_over_punctuation() {
        let mut buf = EditorBuffer::from_text("foo...");
        buf.move_end();
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 3);
    }

    #[test]
    fn test_move_word_right_from_start() {
        let mut buf = EditorBuffer::from_text("hello world");
        buf.move_word_right();
        assert_eq!(buf.cursor().col, 6);
    }

    #[test]
    fn test_move_word_right_at_end_of_line_wraps() {
        let mut buf = EditorBuffer::from_text("hi\nthere");
        buf.move_end();
        buf.move_word_right();
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
    }

    #[test]
    fn test_move_to_clamps() {
        let mut buf = EditorBuffer::from_text("ab\ncd");
        buf.move_to(10, 10);
        assert_eq!(buf.cursor(), Cursor::at(1, 2));
    }

    // --- Offsets ---

    #[test]
    fn test_cursor_offset_roundtrip() {
        let mut buf = EditorBuffer::from_text("ab\ncdé\nf");
        buf.set_cursor_offset(6);
        assert_eq!(buf.cursor(), Cursor::at(1, 3));
        assert_eq!(buf.cursor_offset(), 6);
    }

    #[test]
    fn test_set_cursor_offset_clamps_to_len() {
        let mut buf = EditorBuffer::from_text("abc");
        buf.set_cursor_offset(99);
        assert_eq!(buf.cursor_offset(), 3);
    }

    // --- Host editor contract ---

    #[test]
    fn test_replace_sets_text_and_cursor() {
        let mut buf = EditorBuffer::from_text("a/b");
        buf.replace(1..2, "# Heading\n", 11);
        assert_eq!(buf.text(), "a# Heading\nb");
        assert_eq!(buf.cursor_offset(), 11);
    }

    #[test]
    fn test_replace_clamps_range() {
        let mut buf = EditorBuffer::from_text("abc");
        buf.replace(2..10, "Z", 3);
        assert_eq!(buf.text(), "abZ");
    }

    #[test]
    fn test_char_at_and_slice() {
        let buf = EditorBuffer::from_text("héllo");
        assert_eq!(buf.char_at(1), Some('é'));
        assert_eq!(buf.char_at(5), None);
        assert_eq!(buf.slice(1..3), "él");
        assert_eq!(buf.slice(3..99), "lo");
    }

    #[test]
    fn test_insert_at_cursor() {
        let mut buf = EditorBuffer::from_text("ac");
        buf.move_to(0, 1);
        buf.insert_at_cursor("b");
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.cursor_offset(), 2);
    }

    #[test]
    fn test_coords_use_display_width() {
        let buf = EditorBuffer::from_text("ab\n日本x");
        let anchor = buf.coords_at(6);
        assert_eq!(anchor.top, 40.0);
        assert_eq!(anchor.left, 40.0);
    }

    #[test]
    fn test_scroll_region_tracks_line_count() {
        let metrics = EditorMetrics {
            line_height: 10.0,
            char_width: 5.0,
            client_height: 50.0,
        };
        let mut buf = EditorBuffer::from_text("1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\n12\n13\n14\n15").with_metrics(metrics);
        assert_eq!(buf.scroll_region().scrollable_range(), 100.0);
        buf.set_scroll_top(50.0);
        assert_eq!(buf.scroll_region().scroll_top(), 50.0);
        assert_eq!(buf.coords_at(0).top, -40.0);
    }

    #[test]
    fn test_scroll_to_cursor() {
        let metrics = EditorMetrics {
            line_height: 10.0,
            char_width: 5.0,
            client_height: 30.0,
        };
        let mut buf = EditorBuffer::from_text("a\nb\nc\nd\ne\nf").with_metrics(metrics);
        buf.move_to(5, 0);
        buf.scroll_to_cursor();
        assert_eq!(buf.scroll_region().scroll_top(), 30.0);
        buf.move_to_start();
        buf.scroll_to_cursor();
        assert!(buf.scroll_region().is_at_top());
    }

    #[test]
    fn test_set_text_keeps_clamped_cursor() {
        let mut buf = EditorBuffer::from_text("hello world");
        buf.move_end();
        buf.set_text("hi");
        assert_eq!(buf.text(), "hi");
        assert_eq!(buf.cursor_offset(), 2);
    }

    // --- Complex editing sequences ---

    #[test]
    fn test_type_then_backspace_then_type() {
        let mut buf = EditorBuffer::empty();
        for ch in "helo".chars() {
            buf.insert_char(ch);
        }
        buf.delete_back();
        buf.insert_str("lo");
        assert_eq!(buf.text(), "hello");
    }
}

//! Word, character and line counts for the status line and `--stats`.

use std::fmt;

/// The starter document for a new, empty buffer.
pub const INITIAL_MARKDOWN: &str = r"# Hello Markdown

Start editing...

## Math Example

Inline math: `$E = mc^2$`

Block math:

```
$$
\frac{-b \pm \sqrt{b^2-4ac}}{2a}
$$
```

## Mermaid Diagram

```mermaid
graph TD
    A[Start] --> B[Process]
    B --> C[End]
```
";

/// Counts over a document snapshot. Character counts are in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub words: usize,
    pub chars_with_spaces: usize,
    /// Excluding U+0020 only.
    pub chars_no_spaces: usize,
    /// Excluding all whitespace.
    pub chars_no_whitespace: usize,
    pub chars_no_newlines: usize,
    /// `\n` and `\r\n` both end a line. The empty document has zero lines.
    pub lines: usize,
}

impl Counts {
    pub fn compute(text: &str) -> Self {
        let mut counts = Self {
            words: text.split_whitespace().count(),
            ..Self::default()
        };
        for ch in text.chars() {
            counts.chars_with_spaces += 1;
            if ch != ' ' {
                counts.chars_no_spaces += 1;
            }
            if !ch.is_whitespace() {
                counts.chars_no_whitespace += 1;
            }
            if ch != '\n' {
                counts.chars_no_newlines += 1;
            }
        }
        if !text.is_empty() {
            counts.lines = text.matches('\n').count() + 1;
        }
        counts
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} words, {} chars ({} without spaces), {} lines",
            self.words, self.chars_with_spaces, self.chars_no_spaces, self.lines
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        assert_eq!(Counts::compute(""), Counts::default());
    }

    #[test]
    fn test_words_span_newlines() {
        let counts = Counts::compute("one two\n\nthree  four\tfive\n");
        assert_eq!(counts.words, 5);
        assert_eq!(counts.lines, 4);
    }

    #[test]
    fn test_whitespace_only_has_no_words() {
        let counts = Counts::compute(" \n\t ");
        assert_eq!(counts.words, 0);
        assert_eq!(counts.chars_no_whitespace, 0);
        assert_eq!(counts.lines, 2);
    }

    #[test]
    fn test_char_variants() {
        let counts = Counts::compute("a b\nc");
        assert_eq!(counts.chars_with_spaces, 5);
        assert_eq!(counts.chars_no_spaces, 4);
        assert_eq!(counts.chars_no_whitespace, 3);
        assert_eq!(counts.chars_no_newlines, 4);
    }

    #[test]
    fn test_crlf_counts_as_one_line_break() {
        let counts = Counts::compute("a\r\nb\r\nc");
        assert_eq!(counts.lines, 3);
        assert_eq!(counts.chars_no_newlines, 5);
    }

    #[test]
    fn test_counts_are_in_chars() {
        assert_eq!(Counts::compute("héllo").chars_with_spaces, 5);
    }

    #[test]
    fn test_initial_markdown_has_islands() {
        let extraction = crate::islands::extract(&crate::render::render(INITIAL_MARKDOWN));
        assert_eq!(extraction.islands.len(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Counts::compute("hi there").to_string(),
            "2 words, 8 chars (7 without spaces), 1 lines"
        );
    }
}

//! Island detection over sanitized preview HTML.
//!
//! A single forward scan keeps a stack of open elements, collects the text of
//! each outermost `<code>` element and decides on its closing tag whether it
//! becomes an island. Matched regions are then spliced out in one pass.

use super::{Island, PLACEHOLDER_ATTR};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Output of [`extract`]: rewritten HTML plus the islands its placeholders
/// refer to, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub html: String,
    pub islands: Vec<Island>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }
}

/// Replace math and mermaid code elements in `html` with placeholders.
///
/// Rules, applied to every `<code>` element in document order:
/// - inside `<pre>` and tagged `language-mermaid`: diagram island replacing
///   the whole `<pre>`
/// - inside `<pre>` with text `$$...$$` (more than 4 chars): display math
///   replacing the whole `<pre>`
/// - outside any `<pre>` with text `$...$` (more than 2 chars, not `$$`):
///   inline math replacing the `<code>`
///
/// Everything else is left untouched. Pre-existing `data-island` attributes
/// are stripped so that only real placeholders carry one.
///
/// # Example
///
/// ```
/// let extraction = livemark::islands::extract("<p><code>$x^2$</code></p>");
/// assert_eq!(extraction.html, "<p><span data-island=\"0\"></span></p>");
/// assert_eq!(extraction.islands[0].content, "x^2");
/// ```
pub fn extract(html: &str) -> Extraction {
    let _scope = crate::perf::scope("islands.extract");
    let mut scanner = Scanner::default();
    scanner.run(html);
    let extraction = scanner.finish(html);
    crate::perf::log_event(
        "islands.extract",
        format!(
            "islands={} html_bytes={}",
            extraction.islands.len(),
            extraction.html.len()
        ),
    );
    extraction
}

struct OpenElement {
    name: String,
    start: usize,
    /// Island that replaces this element once it closes.
    claimed: Option<usize>,
}

struct Capture {
    /// Stack index of the `<code>` element being captured.
    depth: usize,
    mermaid: bool,
    parent: Option<String>,
    in_pre: bool,
    inside_claimed: bool,
    text: String,
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

#[derive(Default)]
struct Scanner {
    stack: Vec<OpenElement>,
    capture: Option<Capture>,
    edits: Vec<Edit>,
    islands: Vec<Island>,
}

impl Scanner {
    fn run(&mut self, html: &str) {
        let mut pos = 0;
        while pos < html.len() {
            let Some(offset) = html[pos..].find('<') else {
                self.text(&html[pos..]);
                break;
            };
            if offset > 0 {
                self.text(&html[pos..pos + offset]);
                pos += offset;
            }

            let rest = &html[pos..];
            if rest.starts_with("<!--") {
                pos += rest.find("-->").map_or(rest.len(), |end| end + 3);
            } else if let Some((name, len)) = parse_end_tag(rest) {
                self.end_tag(&name, pos, pos + len);
                pos += len;
            } else if let Some(tag) = parse_start_tag(rest) {
                let end = pos + tag.len;
                self.start_tag(&tag, pos, end);
                pos = end;
                if !tag.self_closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                    let close = format!("</{}", tag.name);
                    let skip = find_ignore_ascii_case(&html[pos..], &close)
                        .unwrap_or(html.len() - pos);
                    self.raw_text(&html[pos..pos + skip]);
                    pos += skip;
                }
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                pos += rest.find('>').map_or(rest.len(), |end| end + 1);
            } else {
                self.raw_text("<");
                pos += 1;
            }
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = &mut self.capture {
            capture.text.push_str(&decode_entities(text));
        }
    }

    fn raw_text(&mut self, text: &str) {
        if let Some(capture) = &mut self.capture {
            capture.text.push_str(text);
        }
    }

    fn start_tag(&mut self, tag: &StartTag<'_>, start: usize, end: usize) {
        if tag.attrs.iter().any(|attr| attr.name == PLACEHOLDER_ATTR) {
            self.edits.push(Edit {
                start,
                end,
                replacement: tag.without_placeholder_attr(),
            });
        }
        if tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str()) {
            return;
        }

        if tag.name == "code" && self.capture.is_none() {
            self.capture = Some(Capture {
                depth: self.stack.len(),
                mermaid: tag.has_class("language-mermaid"),
                parent: self.stack.last().map(|element| element.name.clone()),
                in_pre: self.stack.iter().any(|element| element.name == "pre"),
                inside_claimed: self.stack.iter().any(|element| element.claimed.is_some()),
                text: String::new(),
            });
        }
        self.stack.push(OpenElement {
            name: tag.name.clone(),
            start,
            claimed: None,
        });
    }

    fn end_tag(&mut self, name: &str, start: usize, end: usize) {
        // Stray end tags are ignored; unclosed inner elements close implicitly.
        let Some(index) = self.stack.iter().rposition(|element| element.name == name) else {
            return;
        };
        while self.stack.len() > index {
            let Some(element) = self.stack.pop() else {
                break;
            };
            let explicit = self.stack.len() == index;
            self.close(&element, if explicit { end } else { start }, explicit);
        }
    }

    fn close(&mut self, element: &OpenElement, end: usize, explicit: bool) {
        let depth = self.stack.len();
        if self.capture.as_ref().is_some_and(|capture| capture.depth == depth) {
            if let Some(capture) = self.capture.take() {
                if explicit {
                    self.finish_code(capture, element.start, end);
                }
            }
        }
        if let Some(index) = element.claimed {
            self.edits.push(Edit {
                start: element.start,
                end,
                replacement: self.islands[index].placeholder(index),
            });
        }
    }

    fn finish_code(&mut self, capture: Capture, start: usize, end: usize) {
        if capture.inside_claimed {
            return;
        }
        let Some(island) = classify(&capture) else {
            return;
        };

        let index = self.islands.len();
        if capture.parent.as_deref() == Some("pre") {
            // The enclosing <pre> is the top of the stack once <code> is popped.
            if let Some(pre) = self.stack.last_mut() {
                pre.claimed = Some(index);
            }
        } else {
            self.edits.push(Edit {
                start,
                end,
                replacement: island.placeholder(index),
            });
        }
        self.islands.push(island);
    }

    fn finish(mut self, html: &str) -> Extraction {
        while let Some(element) = self.stack.pop() {
            if let Some(index) = element.claimed {
                self.edits.push(Edit {
                    start: element.start,
                    end: html.len(),
                    replacement: self.islands[index].placeholder(index),
                });
            }
        }

        // Outer edits first at equal starts; anything nested inside an applied
        // edit is dropped with it.
        self.edits
            .sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        for edit in &self.edits {
            if edit.start < cursor {
                continue;
            }
            out.push_str(&html[cursor..edit.start]);
            out.push_str(&edit.replacement);
            cursor = edit.end;
        }
        out.push_str(&html[cursor..]);

        Extraction {
            html: out,
            islands: self.islands,
        }
    }
}

fn classify(capture: &Capture) -> Option<Island> {
    let trimmed = capture.text.trim();
    let fenced = capture.parent.as_deref() == Some("pre");

    if fenced && capture.mermaid {
        return Some(Island::diagram(trimmed));
    }
    if fenced && trimmed.len() > 4 && trimmed.starts_with("$$") && trimmed.ends_with("$$") {
        return Some(Island::math(trimmed[2..trimmed.len() - 2].trim(), true));
    }
    if !capture.in_pre
        && trimmed.len() > 2
        && trimmed.starts_with('$')
        && trimmed.ends_with('$')
        && !trimmed.starts_with("$$")
    {
        return Some(Island::math(&trimmed[1..trimmed.len() - 1], false));
    }
    None
}

struct Attribute<'a> {
    name: String,
    value: Option<&'a str>,
    raw: &'a str,
}

struct StartTag<'a> {
    name: String,
    attrs: Vec<Attribute<'a>>,
    self_closing: bool,
    len: usize,
}

impl StartTag<'_> {
    fn has_class(&self, class: &str) -> bool {
        self.attrs
            .iter()
            .filter(|attr| attr.name == "class")
            .filter_map(|attr| attr.value)
            .any(|value| value.split_ascii_whitespace().any(|token| token == class))
    }

    fn without_placeholder_attr(&self) -> String {
        let mut out = format!("<{}", self.name);
        for attr in self.attrs.iter().filter(|attr| attr.name != PLACEHOLDER_ATTR) {
            out.push(' ');
            out.push_str(attr.raw);
        }
        if self.self_closing {
            out.push_str(" /");
        }
        out.push('>');
        out
    }
}

const fn is_tag_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'/' || byte == b'>'
}

fn parse_start_tag(rest: &str) -> Option<StartTag<'_>> {
    let bytes = rest.as_bytes();
    if !bytes.get(1).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() && !is_tag_delimiter(bytes[i]) {
        i += 1;
    }
    let name = rest[1..i].to_ascii_lowercase();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match *bytes.get(i)? {
            b'>' => {
                return Some(StartTag {
                    name,
                    attrs,
                    self_closing,
                    len: i + 1,
                });
            }
            b'/' => {
                self_closing = true;
                i += 1;
                continue;
            }
            _ => self_closing = false,
        }

        let attr_start = i;
        while i < bytes.len() && !is_tag_delimiter(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        let attr_name = rest[attr_start..i].to_ascii_lowercase();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if bytes.get(j) == Some(&b'=') {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            match *bytes.get(j)? {
                quote @ (b'"' | b'\'') => {
                    let close = rest[j + 1..].find(char::from(quote))? + j + 1;
                    value = Some(&rest[j + 1..close]);
                    i = close + 1;
                }
                _ => {
                    let value_start = j;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    value = Some(&rest[value_start..j]);
                    i = j;
                }
            }
        }
        attrs.push(Attribute {
            name: attr_name,
            value,
            raw: &rest[attr_start..i],
        });
    }
}

fn parse_end_tag(rest: &str) -> Option<(String, usize)> {
    let bytes = rest.as_bytes();
    if !rest.starts_with("</") || !bytes.get(2).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    let mut i = 2;
    while i < bytes.len() && !is_tag_delimiter(bytes[i]) {
        i += 1;
    }
    let name = rest[2..i].to_ascii_lowercase();
    let close = rest[i..].find('>')? + i;
    Some((name, close + 1))
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Decode the entities an HTML serializer emits in text content.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .get(1..rest.len().min(12))
            .and_then(|window| window.find(';'))
            .and_then(|semi| decode_entity(&rest[1..=semi]).map(|ch| (ch, semi + 2)));
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

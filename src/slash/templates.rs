//! Template catalog for the slash-command palette.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A snippet insertable from the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub template: String,
}

impl TemplateItem {
    pub fn new(id: &str, title: &str, description: Option<&str>, template: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            template: template.to_string(),
        }
    }

    /// Whether the item stays listed for a typed `query`.
    ///
    /// Matches when the id, or any word of the title, starts with the query
    /// (ASCII case-insensitive). The empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.id.to_lowercase().starts_with(&query)
            || self
                .title
                .split_whitespace()
                .any(|word| word.to_lowercase().starts_with(&query))
    }
}

/// Loading a template catalog failed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read template catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid template catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("template catalog is empty")]
    Empty,
    #[error("duplicate template id '{0}'")]
    DuplicateId(String),
}

/// Ordered, read-only list of templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCatalog {
    items: Vec<TemplateItem>,
}

impl TemplateCatalog {
    /// Build a catalog, checking ids are unique and the list is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Empty`] or [`CatalogError::DuplicateId`].
    pub fn from_items(items: Vec<TemplateItem>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id.as_str()) {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    /// Parse a JSON array of templates.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or an invalid item list.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<TemplateItem> = serde_json::from_str(json)?;
        Self::from_items(items)
    }

    /// Load a JSON catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The built-in markdown snippets.
    pub fn builtin() -> Self {
        let items = vec![
            TemplateItem::new("h1", "Heading 1", Some("# Heading 1"), "# Heading 1\n\n"),
            TemplateItem::new("h2", "Heading 2", Some("## Heading 2"), "## Heading 2\n\n"),
            TemplateItem::new("h3", "Heading 3", Some("### Heading 3"), "### Heading 3\n\n"),
            TemplateItem::new("bold", "Bold text", Some("**bold**"), "**Bold text**"),
            TemplateItem::new("italic", "Italic text", Some("*italic*"), "*Italic text*"),
            TemplateItem::new(
                "link",
                "Link",
                Some("[label](https://example.com)"),
                "[Example](https://example.com)",
            ),
            TemplateItem::new(
                "image",
                "Image",
                Some("![alt](https://example.com/image.png)"),
                "![Alt text](https://example.com/image.png)\n\n",
            ),
            TemplateItem::new(
                "ul",
                "Unordered list",
                Some("- item"),
                "- Item 1\n- Item 2\n- Item 3\n\n",
            ),
            TemplateItem::new(
                "ol",
                "Ordered list",
                Some("1. item"),
                "1. First item\n2. Second item\n3. Third item\n\n",
            ),
            TemplateItem::new(
                "tasks",
                "Task list",
                Some("- [ ] task"),
                "- [ ] Todo item 1\n- [x] Completed item\n\n",
            ),
            TemplateItem::new(
                "blockquote",
                "Blockquote",
                Some("> quote"),
                "> A short quote or note.\n\n",
            ),
            TemplateItem::new(
                "table",
                "Table",
                Some("Simple 2-column table"),
                "| Header 1 | Header 2 |\n| --- | --- |\n| Cell 1 | Cell 2 |\n\n",
            ),
            TemplateItem::new("hr", "Horizontal rule", Some("---"), "---\n\n"),
            TemplateItem::new(
                "codeblock",
                "Code block",
                Some("```lang\\ncode\\n```"),
                "```js\nconsole.log(\"hello\")\n```\n\n",
            ),
            TemplateItem::new("inline-code", "Inline code", Some("`code`"), "`const x = 1;`"),
            TemplateItem::new(
                "inline-math",
                "Inline math",
                Some("$...$"),
                "`$e^{i\\pi} + 1 = 0$`",
            ),
            TemplateItem::new(
                "display-math",
                "Display math",
                Some("$$...$$"),
                "```\n$$\n\\frac{a}{b} = c\n$$\n```\n\n",
            ),
            TemplateItem::new(
                "mermaid",
                "Mermaid diagram",
                Some("mermaid sequence diagram"),
                "```mermaid\nsequenceDiagram\n    Alice->>Bob: Hello Bob, how are you?\n```\n\n",
            ),
        ];
        Self { items }
    }

    pub fn items(&self) -> &[TemplateItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&TemplateItem> {
        self.items.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&TemplateItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indices of the items matching `query`, in catalog order.
    pub fn filter(&self, query: &str) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.matches(query))
            .map(|(index, _)| index)
            .collect()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

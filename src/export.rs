//! Writing the document out as a `.md` file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name used when none is given.
pub const DEFAULT_EXPORT_NAME: &str = "document";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to export {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File name for an export: blank names become `document.md`, and `.md`
/// is appended unless already present in any case.
pub fn export_file_name(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_EXPORT_NAME } else { name };
    if name.to_lowercase().ends_with(".md") {
        name.to_string()
    } else {
        format!("{name}.md")
    }
}

/// Write `text` to `dir` under [`export_file_name`]`(name)`.
///
/// # Errors
///
/// Returns [`ExportError::Write`] if the file cannot be written.
pub fn export_markdown(dir: &Path, name: &str, text: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(name));
    fs::write(&path, text).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "exported markdown");
    Ok(path)
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::{App, Message, Model, ToastLevel};
use crate::editor::HostEditor;
use crate::islands::escape_html;
use crate::watcher::{DEFAULT_DEBOUNCE, DocumentWatcher};

impl App {
    pub(super) fn make_watcher(&self) -> notify::Result<DocumentWatcher> {
        DocumentWatcher::new(&self.file_path, DEFAULT_DEBOUNCE)
    }

    pub(super) fn handle_message_side_effects(
        &self,
        model: &mut Model,
        watcher: &mut Option<DocumentWatcher>,
        msg: &Message,
    ) {
        match msg {
            Message::ToggleWatch => {
                if model.watch_enabled {
                    match self.make_watcher() {
                        Ok(w) => {
                            *watcher = Some(w);
                            model.show_toast(ToastLevel::Info, "Watching file changes");
                        }
                        Err(err) => {
                            model.watch_enabled = false;
                            *watcher = None;
                            model.show_toast(
                                ToastLevel::Warning,
                                format!("Watch unavailable: {err}"),
                            );
                            crate::perf::log_event(
                                "watcher.error",
                                format!("failed path={} err={err}", model.file_path.display()),
                            );
                        }
                    }
                } else {
                    *watcher = None;
                    model.show_toast(ToastLevel::Info, "Watch disabled");
                }
            }
            Message::FileChanged => match model.reload_from_disk() {
                Ok(true) => model.show_toast(ToastLevel::Info, "Reloaded"),
                Ok(false) => {}
                Err(err) => {
                    model.show_toast(ToastLevel::Error, format!("Reload failed: {err:#}"));
                    crate::perf::log_event(
                        "reload.error",
                        format!("failed path={} err={err}", model.file_path.display()),
                    );
                }
            },
            Message::Save => match model.save_to_disk() {
                Ok(()) => model.show_toast(ToastLevel::Info, "Saved"),
                Err(err) => model.show_toast(ToastLevel::Error, format!("Save failed: {err:#}")),
            },
            Message::Export(name) => {
                let dir = document_dir(&model.file_path);
                match crate::export::export_markdown(&dir, name, &model.editor.text()) {
                    Ok(path) => {
                        model.show_toast(ToastLevel::Info, format!("Exported {}", path.display()));
                    }
                    Err(err) => model.show_toast(ToastLevel::Error, err.to_string()),
                }
            }
            _ => {}
        }
    }
}

/// Rebuild the preview if the editor has moved on since the last pass.
///
/// Renders and sanitizes the text, extracts islands, commits the pass and
/// starts mounting. Returns the new pass generation. Must run inside a
/// [`tokio::task::LocalSet`].
pub fn refresh_preview(model: &mut Model) -> Option<u64> {
    if !model.preview_dirty() || model.preview.is_torn_down() {
        return None;
    }
    let _scope = crate::perf::scope("pipeline.refresh");
    let text = model.editor.text();
    let html = crate::render::render(&text);
    let extraction = crate::islands::extract(&html);
    crate::perf::log_event(
        "pipeline.refresh",
        format!(
            "revision={} chars={} islands={}",
            model.editor.revision(),
            text.chars().count(),
            extraction.islands.len()
        ),
    );

    let context = model.render_context();
    model.preview.set_context(context);
    let generation = model.preview.commit(extraction);
    model.preview.mount();
    model.mark_rendered();
    Some(generation)
}

/// Standalone HTML page for the current preview.
pub fn page_html(model: &Model) -> String {
    let title = model
        .file_path
        .file_name()
        .map_or_else(|| "livemark".to_string(), |name| name.to_string_lossy().into_owned());
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\" class=\"{root}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<article class=\"{class}\">\n{body}</article>\n\
         </body>\n</html>\n",
        root = model.settings.root_class(),
        title = escape_html(&title),
        class = model.settings.preview_class(),
        body = model.preview.html(),
    )
}

/// Write [`page_html`] to `path`.
///
/// # Errors
///
/// Returns an error if the page cannot be written.
pub fn write_page(model: &Model, path: &Path) -> Result<()> {
    let page = page_html(model);
    std::fs::write(path, &page)
        .with_context(|| format!("Failed to write preview {}", path.display()))?;
    crate::perf::log_event(
        "pipeline.write",
        format!("path={} bytes={}", path.display(), page.len()),
    );
    Ok(())
}

/// Default page path for a document: same name, `.html` extension.
pub fn default_output_path(file_path: &Path) -> PathBuf {
    file_path.with_extension("html")
}

pub(super) fn document_dir(file_path: &Path) -> PathBuf {
    file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

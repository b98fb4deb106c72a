//! Watching the open document for external edits.
//!
//! Events come from `notify` on the document's parent directory, are
//! filtered to the document, and are debounced so a burst of writes from
//! one save reloads once.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Quiet period after the last relevant event before a reload.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// How often the watch loop polls for changes.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Debounced change notifications for one document.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    document: PathBuf,
    document_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl DocumentWatcher {
    /// Watch `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or the parent
    /// directory cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // OS event paths are canonical.
        let document = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let document_name = document.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&document);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        tracing::debug!(document = %document.display(), "watching document");

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            document,
            document_name,
            debounce,
            pending_since: None,
        })
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Drain pending events; true once a debounced change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut relevant = 0u32;
        let mut total = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            total += 1;
            match event {
                Ok(ev) if self.is_relevant(&ev) => relevant += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "document watcher error");
                    crate::perf::log_event("watcher.error", err.to_string());
                }
            }
        }

        if total > 0 {
            crate::perf::log_event(
                "watcher.poll",
                format!(
                    "total={total} relevant={relevant} document={}",
                    self.document.display()
                ),
            );
        }
        if relevant > 0 {
            self.pending_since = Some(Instant::now());
        }

        match self.pending_since {
            Some(since) if since.elapsed() >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Read the watched document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8.
    pub fn read_document(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.document)
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.document
                || self
                    .document_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

impl std::fmt::Debug for DocumentWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWatcher")
            .field("document", &self.document)
            .field("debounce", &self.debounce)
            .field("pending", &self.pending_since.is_some())
            .finish_non_exhaustive()
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    fn event(paths: Vec<PathBuf>) -> Event {
        Event {
            kind: EventKind::Any,
            paths,
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_directory_event_is_relevant() {
        let dir = tempdir().unwrap();
        let canonical_dir = dir.path().canonicalize().unwrap();
        let path = canonical_dir.join("doc.md");
        std::fs::write(&path, "hi").unwrap();
        let watcher = DocumentWatcher::new(&path, Duration::from_millis(10)).unwrap();

        assert!(watcher.is_relevant(&event(vec![canonical_dir])));
        assert_eq!(watcher.document(), path.as_path());
    }

    #[test]
    fn test_sibling_file_event_is_ignored() {
        let dir = tempdir().unwrap();
        let canonical_dir = dir.path().canonicalize().unwrap();
        let path = canonical_dir.join("doc.md");
        std::fs::write(&path, "hi").unwrap();
        let watcher = DocumentWatcher::new(&path, Duration::from_millis(10)).unwrap();

        assert!(!watcher.is_relevant(&event(vec![canonical_dir.join("other.md")])));
    }

    #[test]
    fn test_watch_root_for_relative_file_is_dot() {
        assert_eq!(watch_root_for(Path::new("notes.md")), PathBuf::from("."));
    }

    #[test]
    fn test_modification_detected_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().canonicalize().unwrap().join("watched.md");
        std::fs::write(&path, "# one").unwrap();
        let mut watcher = DocumentWatcher::new(&path, DEFAULT_DEBOUNCE).unwrap();

        std::thread::sleep(Duration::from_millis(500));
        std::fs::write(&path, "# two").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        assert!(detected, "edit should be reported within 5 seconds");
        assert_eq!(watcher.read_document().unwrap(), "# two");
    }
}

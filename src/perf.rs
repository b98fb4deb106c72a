//! Lightweight performance instrumentation.
//!
//! Two independent sinks: timing scopes printed to stderr when enabled with
//! [`set_enabled`], and a render debug log file fed by [`log_event`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

/// Environment variable naming a render debug log file.
pub const DEBUG_LOG_ENV: &str = "LIVEMARK_RENDER_DEBUG_LOG";

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOGGER: LazyLock<Mutex<DebugLogger>> =
    LazyLock::new(|| Mutex::new(DebugLogger::new()));

/// Times a region; reports on drop.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Scope {
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.elapsed_ms();
        eprintln!("[perf] {}: {elapsed_ms:.2} ms", self.name);
        log_event(self.name, format!("elapsed={elapsed_ms:.3}ms"));
    }
}

#[derive(Debug)]
struct DebugLogger {
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLogger {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            writer: None,
        }
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// The debug log path: `explicit` if set, else [`DEBUG_LOG_ENV`].
pub fn debug_log_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(DEBUG_LOG_ENV).map(PathBuf::from))
}

/// Start logging to `path`, or stop when `None`.
///
/// # Errors
///
/// Returns an error if the log file cannot be created.
///
/// # Panics
///
/// Panics if the logger mutex is poisoned.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut logger = DEBUG_LOGGER.lock().expect("debug logger lock poisoned");
    let Some(path) = path else {
        logger.writer = None;
        return Ok(());
    };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "livemark render debug log start")?;
    writer.flush()?;
    logger.start = Instant::now();
    logger.writer = Some(writer);
    Ok(())
}

/// # Panics
///
/// Panics if the logger mutex is poisoned.
pub fn is_debug_log_enabled() -> bool {
    DEBUG_LOGGER
        .lock()
        .expect("debug logger lock poisoned")
        .writer
        .is_some()
}

/// Append `name: detail` with a timestamp to the debug log, if open.
///
/// # Panics
///
/// Panics if the logger mutex is poisoned.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut logger = DEBUG_LOGGER.lock().expect("debug logger lock poisoned");
    let elapsed_ms = logger.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = logger.writer.as_mut() {
        let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {}", detail.as_ref());
        let _ = writer.flush();
    }
}

//! On-demand engine loading, cached by island kind.

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;

#[cfg(feature = "diagrams")]
use super::DiagramEngine;
use super::{IslandEngine, IslandKind, MathEngine};

/// Loading an engine failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("{} engine is not available in this build", .0.name())]
    Unavailable(IslandKind),
    #[error("{} engine failed to load: {message}", .kind.name())]
    Failed { kind: IslandKind, message: String },
}

/// Where engines come from.
///
/// Loads are asynchronous and may complete after the requesting pipeline pass
/// has been replaced; the loader caches results, callers check staleness.
#[async_trait(?Send)]
pub trait EngineSource {
    async fn load(&self, kind: IslandKind) -> Result<Rc<dyn IslandEngine>, LoadError>;
}

/// The engines compiled into this build.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinEngines;

#[async_trait(?Send)]
impl EngineSource for BuiltinEngines {
    async fn load(&self, kind: IslandKind) -> Result<Rc<dyn IslandEngine>, LoadError> {
        // Engines are constructed off the current tick, like a deferred import.
        tokio::task::yield_now().await;
        match kind {
            IslandKind::Math => Ok(Rc::new(MathEngine)),
            IslandKind::Diagram => diagram_engine(),
        }
    }
}

#[cfg(feature = "diagrams")]
fn diagram_engine() -> Result<Rc<dyn IslandEngine>, LoadError> {
    Ok(Rc::new(DiagramEngine))
}

#[cfg(not(feature = "diagrams"))]
fn diagram_engine() -> Result<Rc<dyn IslandEngine>, LoadError> {
    Err(LoadError::Unavailable(IslandKind::Diagram))
}

/// Loads each engine kind at most once and shares it afterwards.
///
/// Concurrent requests for the same kind wait on the first load. A failed
/// load is not cached, so a later pass retries it.
pub struct EngineLoader {
    source: Box<dyn EngineSource>,
    math: OnceCell<Rc<dyn IslandEngine>>,
    diagram: OnceCell<Rc<dyn IslandEngine>>,
    loads: Cell<usize>,
}

impl EngineLoader {
    pub fn new(source: impl EngineSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            math: OnceCell::new(),
            diagram: OnceCell::new(),
            loads: Cell::new(0),
        }
    }

    /// Loader over [`BuiltinEngines`].
    pub fn builtin() -> Self {
        Self::new(BuiltinEngines)
    }

    const fn cell(&self, kind: IslandKind) -> &OnceCell<Rc<dyn IslandEngine>> {
        match kind {
            IslandKind::Math => &self.math,
            IslandKind::Diagram => &self.diagram,
        }
    }

    /// Get the engine for `kind`, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns the source's [`LoadError`] when the engine cannot be loaded.
    pub async fn get(&self, kind: IslandKind) -> Result<Rc<dyn IslandEngine>, LoadError> {
        let engine = self
            .cell(kind)
            .get_or_try_init(|| async {
                self.loads.set(self.loads.get() + 1);
                crate::perf::log_event("islands.engine.load", format!("kind={}", kind.name()));
                let result = self.source.load(kind).await;
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "island engine load failed");
                }
                result
            })
            .await?;
        Ok(Rc::clone(engine))
    }

    /// Whether the engine for `kind` has been loaded.
    pub fn is_loaded(&self, kind: IslandKind) -> bool {
        self.cell(kind).initialized()
    }

    /// Number of load attempts made against the source.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl Default for EngineLoader {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for EngineLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLoader")
            .field("math_loaded", &self.is_loaded(IslandKind::Math))
            .field("diagram_loaded", &self.is_loaded(IslandKind::Diagram))
            .field("loads", &self.loads.get())
            .finish_non_exhaustive()
    }
}

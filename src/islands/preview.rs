//! The preview pane: processed HTML plus the islands mounted into it.
//!
//! [`PreviewPane::commit`] installs a new pass synchronously.
//! [`PreviewPane::mount`] then spawns one local task per island. Each task
//! loads its engine, renders, and writes back only if its pass is still the
//! current one. Islands of the replaced pass are unmounted one scheduling tick
//! later, and always before the next pass commits.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    EngineLoader, Extraction, Island, IslandKind, IslandRenderError, LoadError, PLACEHOLDER_ATTR,
    RenderContext, escape_html,
};
use crate::scroll::ScrollRegion;

/// Why an island could not be mounted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MountError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] IslandRenderError),
}

/// Observable state of one island slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Engine load or render still pending.
    Loading,
    /// Rendered output is live in the slot.
    Mounted,
    /// Rendering failed; the slot shows the island source.
    Fallback,
}

/// A rendered island. Counts itself as a live instance until dropped.
struct MountedIsland {
    html: String,
    live: Rc<Cell<usize>>,
}

impl MountedIsland {
    fn new(html: String, live: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Self {
            html,
            live: Rc::clone(live),
        }
    }
}

impl Drop for MountedIsland {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

enum SlotContent {
    Loading,
    Mounted(MountedIsland),
    Fallback,
}

struct Slot {
    island: Island,
    content: SlotContent,
}

impl Slot {
    const fn state(&self) -> SlotState {
        match self.content {
            SlotContent::Loading => SlotState::Loading,
            SlotContent::Mounted(_) => SlotState::Mounted,
            SlotContent::Fallback => SlotState::Fallback,
        }
    }

    fn markup(&self, index: usize) -> String {
        let island = &self.island;
        let tag = island.tag();
        let kind = island.kind.name();
        let body = match &self.content {
            SlotContent::Loading => match island.kind {
                IslandKind::Math => {
                    "<span class=\"island-loading\">Loading math...</span>".to_string()
                }
                IslandKind::Diagram => {
                    "<div class=\"island-loading\">Loading diagram...</div>".to_string()
                }
            },
            SlotContent::Mounted(mounted) => mounted.html.clone(),
            SlotContent::Fallback => match island.kind {
                IslandKind::Math => escape_html(&island.content),
                IslandKind::Diagram => format!("<pre>{}</pre>", escape_html(&island.content)),
            },
        };
        format!("<{tag} {PLACEHOLDER_ATTR}=\"{index}\" class=\"island island-{kind}\">{body}</{tag}>")
    }
}

struct PreviewState {
    generation: u64,
    html: String,
    slots: Vec<Slot>,
    /// Slots of replaced passes awaiting their deferred unmount.
    retired: Vec<Slot>,
    cancel: CancellationToken,
    pending: Vec<JoinHandle<()>>,
    torn_down: bool,
}

impl PreviewState {
    fn complete(
        &mut self,
        generation: u64,
        index: usize,
        island: &Island,
        outcome: Result<String, MountError>,
        live: &Rc<Cell<usize>>,
    ) {
        let current = !self.torn_down
            && generation == self.generation
            && self.slots.get(index).is_some_and(|slot| slot.island == *island);
        if !current {
            tracing::debug!(generation, index, "dropping stale island completion");
            crate::perf::log_event(
                "islands.stale",
                format!("generation={generation} index={index}"),
            );
            return;
        }

        let content = match outcome {
            Ok(html) => SlotContent::Mounted(MountedIsland::new(html, live)),
            Err(e) => {
                tracing::warn!(kind = island.kind.name(), error = %e, "island render failed, showing source");
                SlotContent::Fallback
            }
        };
        self.slots[index].content = content;
    }
}

/// Preview pane owning the current pass's HTML and island slots.
///
/// Mounting spawns tasks with [`tokio::task::spawn_local`], so
/// [`PreviewPane::mount`] must run inside a [`tokio::task::LocalSet`].
pub struct PreviewPane {
    state: Rc<RefCell<PreviewState>>,
    loader: Rc<EngineLoader>,
    context: RenderContext,
    live: Rc<Cell<usize>>,
    scroll: ScrollRegion,
}

impl PreviewPane {
    pub fn new(loader: Rc<EngineLoader>) -> Self {
        Self {
            state: Rc::new(RefCell::new(PreviewState {
                generation: 0,
                html: String::new(),
                slots: Vec::new(),
                retired: Vec::new(),
                cancel: CancellationToken::new(),
                pending: Vec::new(),
                torn_down: false,
            })),
            loader,
            context: RenderContext::default(),
            live: Rc::new(Cell::new(0)),
            scroll: ScrollRegion::default(),
        }
    }

    /// Set what later mounts render with.
    pub const fn set_context(&mut self, context: RenderContext) {
        self.context = context;
    }

    pub const fn context(&self) -> RenderContext {
        self.context
    }

    /// Install a new pass and return its generation.
    ///
    /// Cancels the previous pass's in-flight mounts and retires its islands.
    /// Islands retired by an earlier pass that were not yet unmounted are
    /// dropped now. After [`PreviewPane::teardown`] this does nothing.
    pub fn commit(&self, extraction: Extraction) -> u64 {
        let mut state = self.state.borrow_mut();
        if state.torn_down {
            tracing::debug!("commit after teardown ignored");
            return state.generation;
        }

        state.retired.clear();
        state.cancel.cancel();
        state.cancel = CancellationToken::new();
        state.generation += 1;

        let previous = std::mem::take(&mut state.slots);
        state.retired.extend(previous);
        state.slots = extraction
            .islands
            .into_iter()
            .map(|island| Slot {
                island,
                content: SlotContent::Loading,
            })
            .collect();
        state.html = extraction.html;
        state.generation
    }

    /// Start mounting the current pass's islands.
    ///
    /// # Panics
    ///
    /// Panics if called outside a [`tokio::task::LocalSet`].
    pub fn mount(&self) {
        let _scope = crate::perf::scope("islands.mount");
        let (generation, cancel, islands) = {
            let state = self.state.borrow();
            if state.torn_down {
                return;
            }
            let islands: Vec<Island> = state.slots.iter().map(|slot| slot.island.clone()).collect();
            (state.generation, state.cancel.clone(), islands)
        };
        crate::perf::log_event(
            "islands.mount",
            format!("generation={generation} islands={}", islands.len()),
        );

        let mut handles = Vec::with_capacity(islands.len() + 1);
        handles.push(tokio::task::spawn_local(unmount_retired(Rc::downgrade(
            &self.state,
        ))));

        for (index, island) in islands.into_iter().enumerate() {
            let state = Rc::downgrade(&self.state);
            let loader = Rc::clone(&self.loader);
            let live = Rc::clone(&self.live);
            let context = self.context;
            let cancel = cancel.clone();
            handles.push(tokio::task::spawn_local(async move {
                let outcome = tokio::select! {
                    () = cancel.cancelled() => return,
                    outcome = render_island(&loader, &island, &context) => outcome,
                };
                // The pane may be gone by the time the engine answers.
                let Some(state) = state.upgrade() else {
                    return;
                };
                state
                    .borrow_mut()
                    .complete(generation, index, &island, outcome, &live);
            }));
        }

        self.state.borrow_mut().pending.extend(handles);
    }

    /// Wait for every spawned mount and unmount task to finish.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut self.state.borrow_mut().pending);
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    if !e.is_cancelled() {
                        tracing::warn!(error = %e, "island task failed");
                    }
                }
            }
        }
    }

    /// Unmount everything and refuse further passes.
    ///
    /// Mounts still in flight are aborted; any that resolve anyway are
    /// discarded.
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        state.torn_down = true;
        state.cancel.cancel();
        for handle in state.pending.drain(..) {
            handle.abort();
        }
        state.slots.clear();
        state.retired.clear();
        state.html.clear();
        crate::perf::log_event("islands.teardown", format!("generation={}", state.generation));
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.borrow().torn_down
    }

    /// Current pass generation. Starts at 0 and increments on each commit.
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Islands of the current pass.
    pub fn islands(&self) -> Vec<Island> {
        self.state
            .borrow()
            .slots
            .iter()
            .map(|slot| slot.island.clone())
            .collect()
    }

    pub fn slot_states(&self) -> Vec<SlotState> {
        self.state.borrow().slots.iter().map(Slot::state).collect()
    }

    /// Number of rendered islands alive, current and retired.
    pub fn live_instances(&self) -> usize {
        self.live.get()
    }

    /// Number of islands waiting for their deferred unmount.
    pub fn retired_count(&self) -> usize {
        self.state.borrow().retired.len()
    }

    /// The processed HTML with placeholders, as committed.
    pub fn processed_html(&self) -> String {
        self.state.borrow().html.clone()
    }

    /// The preview as displayed: placeholders filled with each island's
    /// loading, rendered or fallback markup.
    pub fn html(&self) -> String {
        let state = self.state.borrow();
        let mut html = state.html.clone();
        for (index, slot) in state.slots.iter().enumerate() {
            html = html.replacen(&slot.island.placeholder(index), &slot.markup(index), 1);
        }
        html
    }

    pub const fn scroll_region(&self) -> &ScrollRegion {
        &self.scroll
    }

    pub const fn scroll_region_mut(&mut self) -> &mut ScrollRegion {
        &mut self.scroll
    }
}

impl Drop for PreviewPane {
    fn drop(&mut self) {
        if let Ok(state) = self.state.try_borrow() {
            state.cancel.cancel();
            for handle in &state.pending {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for PreviewPane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("PreviewPane")
            .field("generation", &state.generation)
            .field("islands", &state.slots.len())
            .field("retired", &state.retired.len())
            .field("live", &self.live.get())
            .field("torn_down", &state.torn_down)
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}

async fn render_island(
    loader: &EngineLoader,
    island: &Island,
    context: &RenderContext,
) -> Result<String, MountError> {
    let engine = loader.get(island.kind).await?;
    Ok(engine.render(island, context)?)
}

async fn unmount_retired(state: Weak<RefCell<PreviewState>>) {
    tokio::task::yield_now().await;
    let Some(state) = state.upgrade() else {
        return;
    };
    let retired = std::mem::take(&mut state.borrow_mut().retired);
    if !retired.is_empty() {
        crate::perf::log_event("islands.unmount", format!("count={}", retired.len()));
    }
    drop(retired);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::islands::{EngineSource, IslandEngine, extract};
    use async_trait::async_trait;
    use tokio::task::LocalSet;

    struct StubEngine;

    impl IslandEngine for StubEngine {
        fn kind(&self) -> IslandKind {
            IslandKind::Diagram
        }

        fn render(&self, island: &Island, _ctx: &RenderContext) -> Result<String, IslandRenderError> {
            if island.content.contains("bad") {
                return Err(IslandRenderError::new(IslandKind::Diagram, "syntax"));
            }
            Ok(format!("<svg>{}</svg>", escape_html(&island.content)))
        }
    }

    struct StubSource;

    #[async_trait(?Send)]
    impl EngineSource for StubSource {
        async fn load(&self, _kind: IslandKind) -> Result<Rc<dyn IslandEngine>, LoadError> {
            tokio::task::yield_now().await;
            Ok(Rc::new(StubEngine))
        }
    }

    fn pane() -> PreviewPane {
        PreviewPane::new(Rc::new(EngineLoader::new(StubSource)))
    }

    fn diagrams(contents: &[&str]) -> Extraction {
        let islands: Vec<Island> = contents.iter().map(|c| Island::diagram(*c)).collect();
        let html = islands
            .iter()
            .enumerate()
            .map(|(i, island)| island.placeholder(i))
            .collect();
        Extraction { html, islands }
    }

    #[tokio::test]
    async fn test_commit_starts_in_loading_state() {
        let pane = pane();
        assert_eq!(pane.commit(diagrams(&["a"])), 1);
        assert_eq!(pane.slot_states(), vec![SlotState::Loading]);
        assert!(pane.html().contains("Loading diagram..."));
    }

    #[tokio::test]
    async fn test_mount_renders_islands() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let pane = pane();
                pane.commit(diagrams(&["a", "b"]));
                pane.mount();
                pane.settle().await;
                assert_eq!(pane.slot_states(), vec![SlotState::Mounted; 2]);
                assert_eq!(pane.live_instances(), 2);
                let html = pane.html();
                assert!(html.contains("<svg>a</svg>"));
                assert!(html.contains("<svg>b</svg>"));
            })
            .await;
    }

    #[tokio::test]
    async fn test_render_failure_falls_back_to_source() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let pane = pane();
                pane.commit(diagrams(&["bad <x>"]));
                pane.mount();
                pane.settle().await;
                assert_eq!(pane.slot_states(), vec![SlotState::Fallback]);
                assert!(pane.html().contains("<pre>bad &lt;x&gt;</pre>"));
                assert_eq!(pane.live_instances(), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_new_pass_unmounts_previous_islands() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let pane = pane();
                pane.commit(diagrams(&["a", "b"]));
                pane.mount();
                pane.settle().await;

                pane.commit(diagrams(&["c"]));
                assert_eq!(pane.retired_count(), 2);
                pane.mount();
                pane.settle().await;

                assert_eq!(pane.retired_count(), 0);
                assert_eq!(pane.live_instances(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_stale_completions_are_discarded() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let pane = pane();
                pane.commit(diagrams(&["old"]));
                pane.mount();
                // Replace the pass before the first mount resolves.
                pane.commit(diagrams(&["new"]));
                pane.mount();
                pane.settle().await;

                assert_eq!(pane.generation(), 2);
                let html = pane.html();
                assert!(html.contains("<svg>new</svg>"));
                assert!(!html.contains("old"));
                assert_eq!(pane.live_instances(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_teardown_tolerates_in_flight_mounts() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let pane = pane();
                pane.commit(diagrams(&["a"]));
                pane.mount();
                pane.teardown();
                pane.settle().await;
                tokio::task::yield_now().await;

                assert!(pane.is_torn_down());
                assert_eq!(pane.live_instances(), 0);
                assert!(pane.html().is_empty());
                assert_eq!(pane.commit(diagrams(&["b"])), 1);
                assert!(pane.islands().is_empty());
            })
            .await;
    }

    #[tokio::test]
    async fn test_mount_with_builtin_math_engine() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let pane = PreviewPane::new(Rc::new(EngineLoader::builtin()));
                pane.commit(extract("<p><code>$x^2$</code></p>"));
                pane.mount();
                pane.settle().await;
                let html = pane.html();
                assert!(html.starts_with("<p><span data-island=\"0\" class=\"island island-math\">"));
                assert!(html.contains("<math"));
            })
            .await;
    }
}

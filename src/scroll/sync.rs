use super::ScrollRegion;

/// One of the two synchronized panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Editor,
    Preview,
}

impl Pane {
    pub const fn other(self) -> Self {
        match self {
            Self::Editor => Self::Preview,
            Self::Preview => Self::Editor,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Preview => "preview",
        }
    }
}

/// Which pane last initiated a synchronized scroll write.
///
/// Held until the next frame boundary ([`ScrollSync::on_frame`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncLock {
    #[default]
    None,
    Editor,
    Preview,
}

impl SyncLock {
    const fn held_by(pane: Pane) -> Self {
        match pane {
            Pane::Editor => Self::Editor,
            Pane::Preview => Self::Preview,
        }
    }
}

/// What a scroll event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// Syncing is switched off.
    Disabled,
    /// The other pane holds the lock; this event is its echo.
    Ignored,
    /// No target pane to write to; the lock was released immediately.
    Released,
    /// The target pane was written. Carries its new scroll offset.
    Synced { target_scroll_top: f64 },
}

/// Proportional editor/preview scroll synchronizer.
///
/// # Example
///
/// ```
/// use livemark::scroll::{Pane, ScrollRegion, ScrollSync, SyncOutcome};
///
/// let mut sync = ScrollSync::new(true);
/// let mut editor = ScrollRegion::new(150.0, 50.0);
/// let mut preview = ScrollRegion::new(250.0, 50.0);
///
/// editor.set_scroll_top(50.0);
/// let outcome = sync.on_scroll(Pane::Editor, &editor, Some(&mut preview));
/// assert_eq!(outcome, SyncOutcome::Synced { target_scroll_top: 100.0 });
///
/// // The preview's echo event is ignored until the next frame.
/// assert_eq!(sync.on_scroll(Pane::Preview, &preview, Some(&mut editor)), SyncOutcome::Ignored);
/// sync.on_frame();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollSync {
    lock: SyncLock,
    enabled: bool,
}

impl ScrollSync {
    pub const fn new(enabled: bool) -> Self {
        Self {
            lock: SyncLock::None,
            enabled,
        }
    }

    pub const fn lock(&self) -> SyncLock {
        self.lock
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch syncing on or off. Switching off releases the lock.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.lock = SyncLock::None;
        }
    }

    /// Handle a scroll event from `source`, writing `target` when allowed.
    ///
    /// Maps `source`'s scroll ratio onto `target`'s scrollable range when
    /// both panes can scroll. Otherwise a source at the top forces the
    /// target to the top. The lock stays held until [`ScrollSync::on_frame`],
    /// or is released at once when there is no target.
    pub fn on_scroll(
        &mut self,
        source: Pane,
        source_region: &ScrollRegion,
        target: Option<&mut ScrollRegion>,
    ) -> SyncOutcome {
        if !self.enabled {
            return SyncOutcome::Disabled;
        }
        if self.lock == SyncLock::held_by(source.other()) {
            tracing::debug!(source = source.name(), "scroll echo ignored");
            return SyncOutcome::Ignored;
        }

        self.lock = SyncLock::held_by(source);
        let Some(target) = target else {
            self.lock = SyncLock::None;
            return SyncOutcome::Released;
        };

        match source_region.ratio() {
            Some(ratio) if !target.is_unscrollable() => {
                target.set_scroll_top(ratio * target.scrollable_range());
            }
            _ if source_region.is_at_top() => target.scroll_to_top(),
            _ => {}
        }
        SyncOutcome::Synced {
            target_scroll_top: target.scroll_top(),
        }
    }

    /// Frame boundary: release the lock.
    pub fn on_frame(&mut self) {
        if self.lock != SyncLock::None {
            tracing::debug!(lock = ?self.lock, "scroll lock released");
        }
        self.lock = SyncLock::None;
    }
}

impl Default for ScrollSync {
    fn default() -> Self {
        Self::new(true)
    }
}

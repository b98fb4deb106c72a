//! Proportional scroll synchronization between the editor and the preview.
//!
//! Each pane exposes a [`ScrollRegion`]. A scroll in one pane maps the
//! source's scroll ratio onto the other pane's scrollable range. The
//! [`SyncLock`] records which side initiated the write until the next frame,
//! so the echo scroll event from the target pane is ignored.

mod region;
mod sync;

pub use region::ScrollRegion;
pub use sync::{Pane, ScrollSync, SyncLock, SyncOutcome};

//! Slash commands: typing `/` opens a palette of markdown snippets at the
//! cursor.
//!
//! The session is a small state machine over a [`HostEditor`]:
//!
//! - a bare `/` inserts the slash and opens the palette ([`SlashCommands::trigger`])
//! - arrow keys move the selection, Enter or a click resolves, Escape or a
//!   click outside cancels and removes the command span
//! - typed letters narrow the list until nothing matches, at which point the
//!   palette closes and the text stays
//! - any edit that removes the slash closes the session without touching the
//!   document
//!
//! [`HostEditor`]: crate::editor::HostEditor

mod palette;
mod session;
mod templates;

pub use palette::{
    CommandPalette, PALETTE_OFFSET, PALETTE_ROW_HEIGHT, PALETTE_WIDTH, PaletteBounds,
};
pub use session::{
    CloseReason, KeyDisposition, PointerEvent, SlashCommands, SlashSession, is_bare, is_trigger,
};
pub use templates::{CatalogError, TemplateCatalog, TemplateItem};

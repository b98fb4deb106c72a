use crate::editor::Anchor;

/// Gap between the cursor anchor and the palette's top edge.
pub const PALETTE_OFFSET: f64 = 6.0;
/// Palette width.
pub const PALETTE_WIDTH: f64 = 320.0;
/// Height of one item row.
pub const PALETTE_ROW_HEIGHT: f64 = 40.0;

/// Screen rectangle occupied by the open palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteBounds {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl PaletteBounds {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }
}

/// The selectable command list.
///
/// `position` is `None` while closed. While open, `selected` indexes into
/// `visible`, which holds catalog indices of the listed items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPalette {
    position: Option<Anchor>,
    selected: usize,
    visible: Vec<usize>,
}

impl CommandPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open at `anchor` listing `visible`, with the first item selected.
    pub fn open(&mut self, anchor: Anchor, visible: Vec<usize>) {
        self.position = Some(anchor);
        self.visible = visible;
        self.selected = 0;
    }

    pub fn close(&mut self) {
        self.position = None;
        self.visible.clear();
        self.selected = 0;
    }

    pub const fn is_open(&self) -> bool {
        self.position.is_some()
    }

    pub const fn position(&self) -> Option<Anchor> {
        self.position
    }

    pub const fn selected_index(&self) -> usize {
        self.selected
    }

    /// Catalog indices of the listed items.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    /// Catalog index of the selected item.
    pub fn selected_item(&self) -> Option<usize> {
        self.visible.get(self.selected).copied()
    }

    /// Replace the listed items and reset the selection.
    pub fn set_visible(&mut self, visible: Vec<usize>) {
        if visible != self.visible {
            self.selected = 0;
        }
        self.visible = visible;
    }

    /// Move the selection down one item, stopping at the last.
    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1).min(self.visible.len().saturating_sub(1));
    }

    /// Move the selection up one item, stopping at the first.
    pub const fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Pointer hover over row `row`.
    pub fn hover(&mut self, row: usize) {
        if row < self.visible.len() {
            self.selected = row;
        }
    }

    pub fn bounds(&self) -> Option<PaletteBounds> {
        #[allow(clippy::cast_precision_loss)]
        let height = self.visible.len() as f64 * PALETTE_ROW_HEIGHT;
        self.position.map(|anchor| PaletteBounds {
            top: anchor.top + PALETTE_OFFSET,
            left: anchor.left,
            width: PALETTE_WIDTH,
            height,
        })
    }

    /// Whether `(x, y)` is inside the open palette.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.bounds().is_some_and(|bounds| bounds.contains(x, y))
    }

    /// Row under `(x, y)`, if any.
    pub fn row_at(&self, x: f64, y: f64) -> Option<usize> {
        let bounds = self.bounds()?;
        if !bounds.contains(x, y) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let row = ((y - bounds.top) / PALETTE_ROW_HEIGHT) as usize;
        (row < self.visible.len()).then_some(row)
    }
}

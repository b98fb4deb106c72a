//! Scroll metrics for one pane.

/// Scroll metrics of a scrollable pane.
///
/// Units are whatever the pane measures in (pixels, rows); only ratios
/// between `scroll_top` and the scrollable range matter for syncing.
///
/// # Example
///
/// ```
/// use livemark::scroll::ScrollRegion;
///
/// let mut region = ScrollRegion::new(150.0, 50.0);
/// assert_eq!(region.scrollable_range(), 100.0);
///
/// region.set_scroll_top(500.0);
/// assert_eq!(region.scroll_top(), 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollRegion {
    scroll_top: f64,
    scroll_height: f64,
    client_height: f64,
}

impl ScrollRegion {
    /// Create a region scrolled to the top.
    ///
    /// # Arguments
    ///
    /// * `scroll_height` - Total content height
    /// * `client_height` - Visible height
    pub const fn new(scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top: 0.0,
            scroll_height,
            client_height,
        }
    }

    /// Get the current scroll offset.
    pub const fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub const fn scroll_height(&self) -> f64 {
        self.scroll_height
    }

    pub const fn client_height(&self) -> f64 {
        self.client_height
    }

    /// How far the content can scroll: `scroll_height - client_height`.
    ///
    /// Zero or negative when the content fits.
    pub fn scrollable_range(&self) -> f64 {
        self.scroll_height - self.client_height
    }

    /// Check if the region is at the top.
    #[allow(clippy::float_cmp)]
    pub fn is_at_top(&self) -> bool {
        self.scroll_top == 0.0
    }

    /// Check if the content fits and nothing can scroll.
    pub fn is_unscrollable(&self) -> bool {
        self.scrollable_range() <= 0.0
    }

    /// Scroll position as a fraction of the scrollable range.
    ///
    /// `None` when the region is unscrollable.
    pub fn ratio(&self) -> Option<f64> {
        if self.is_unscrollable() {
            return None;
        }
        Some(self.scroll_top / self.scrollable_range())
    }

    /// Set the scroll offset, clamped to `[0, scrollable_range]`.
    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        let max = self.scrollable_range().max(0.0);
        self.scroll_top = if scroll_top.is_nan() {
            0.0
        } else {
            scroll_top.clamp(0.0, max)
        };
    }

    /// Update content and visible heights, keeping the offset valid.
    pub fn resize(&mut self, scroll_height: f64, client_height: f64) {
        self.scroll_height = scroll_height;
        self.client_height = client_height;
        self.set_scroll_top(self.scroll_top);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_top = 0.0;
    }
}

//! Navigation state for the full-screen article reader.
//!
//! The reader is either closed or open on one catalog index. Entering an
//! article (open, next, previous) always starts from fresh scroll state;
//! scroll samples update progress and back-to-top visibility level-triggered,
//! recomputed from each sample without regard to earlier ones.

/// Scrolled distance past which the back-to-top control is shown.
pub const BACK_TO_TOP_THRESHOLD: f64 = 300.0;

/// Which article, if any, the reader shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderPosition {
    #[default]
    Closed,
    Open(usize),
}

/// One scroll-position reading from the reader viewport.
///
/// Units are whatever the host measures in (pixels, terminal rows); only
/// ratios and the threshold comparison use them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    /// Distance scrolled from the top.
    pub offset: f64,
    /// Total height of the content.
    pub content_height: f64,
    /// Height of the visible viewport.
    pub viewport_height: f64,
}

impl ScrollSample {
    /// Scroll progress as a percentage in `0.0..=100.0`.
    ///
    /// Content that fits in the viewport has nothing to scroll and reports 0.
    pub fn progress(&self) -> f64 {
        let scrollable = self.content_height - self.viewport_height;
        if scrollable <= 0.0 || !scrollable.is_finite() {
            return 0.0;
        }
        let progress = self.offset / scrollable * 100.0;
        if progress.is_nan() {
            return 0.0;
        }
        progress.clamp(0.0, 100.0)
    }
}

/// Discrete inputs to the reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReaderEvent {
    Open(usize),
    Next,
    Previous,
    Close,
    Scroll(ScrollSample),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReaderState {
    position: ReaderPosition,
    scroll_progress: f64,
    back_to_top_visible: bool,
    back_to_top_threshold: f64,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderState {
    pub fn new() -> Self {
        Self::with_back_to_top_threshold(BACK_TO_TOP_THRESHOLD)
    }

    /// Reader whose back-to-top control appears past `threshold` units.
    pub fn with_back_to_top_threshold(threshold: f64) -> Self {
        Self {
            position: ReaderPosition::Closed,
            scroll_progress: 0.0,
            back_to_top_visible: false,
            back_to_top_threshold: threshold,
        }
    }

    pub fn position(&self) -> ReaderPosition {
        self.position
    }

    pub fn open_index(&self) -> Option<usize> {
        match self.position {
            ReaderPosition::Open(i) => Some(i),
            ReaderPosition::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open_index().is_some()
    }

    pub fn scroll_progress(&self) -> f64 {
        self.scroll_progress
    }

    pub fn back_to_top_visible(&self) -> bool {
        self.back_to_top_visible
    }

    /// Apply an event against a catalog of `len` articles.
    ///
    /// Returns whether the position or scroll state changed. Guarded
    /// transitions (next at the end, previous at the start, open out of range)
    /// are no-ops.
    pub fn apply(&mut self, event: ReaderEvent, len: usize) -> bool {
        match event {
            ReaderEvent::Open(index) => self.open(index, len),
            ReaderEvent::Next => self.next(len),
            ReaderEvent::Previous => self.previous(),
            ReaderEvent::Close => self.close(),
            ReaderEvent::Scroll(sample) => self.on_scroll(sample),
        }
    }

    /// Open (or jump to) `index`. Re-entering resets scroll state.
    pub fn open(&mut self, index: usize, len: usize) -> bool {
        if index >= len {
            tracing::debug!(index, len, "Ignoring open for out-of-range article");
            return false;
        }
        self.enter(index);
        true
    }

    pub fn next(&mut self, len: usize) -> bool {
        match self.position {
            ReaderPosition::Open(i) if i + 1 < len => {
                self.enter(i + 1);
                true
            }
            _ => false,
        }
    }

    pub fn previous(&mut self) -> bool {
        match self.position {
            ReaderPosition::Open(i) if i > 0 => {
                self.enter(i - 1);
                true
            }
            _ => false,
        }
    }

    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.position = ReaderPosition::Closed;
        self.scroll_progress = 0.0;
        self.back_to_top_visible = false;
        was_open
    }

    /// Recompute scroll-derived state. Samples while closed are ignored.
    pub fn on_scroll(&mut self, sample: ScrollSample) -> bool {
        if !self.is_open() {
            return false;
        }
        let progress = sample.progress();
        let visible = sample.offset > self.back_to_top_threshold;
        let changed = progress != self.scroll_progress || visible != self.back_to_top_visible;
        self.scroll_progress = progress;
        self.back_to_top_visible = visible;
        changed
    }

    /// Jump back to the top of the open article.
    ///
    /// Returns the sample the host should apply to its viewport (offset 0);
    /// derived state is recomputed from it like any other scroll.
    pub fn scroll_to_top(&mut self, content_height: f64, viewport_height: f64) -> ScrollSample {
        let sample = ScrollSample {
            offset: 0.0,
            content_height,
            viewport_height,
        };
        self.on_scroll(sample);
        sample
    }

    pub fn has_next(&self, len: usize) -> bool {
        matches!(self.position, ReaderPosition::Open(i) if i + 1 < len)
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.position, ReaderPosition::Open(i) if i > 0)
    }

    /// "Article 3 of 10", or `None` while closed.
    pub fn position_label(&self, len: usize) -> Option<String> {
        self.open_index()
            .map(|i| format!("Article {} of {}", i + 1, len))
    }

    fn enter(&mut self, index: usize) {
        self.position = ReaderPosition::Open(index);
        self.scroll_progress = 0.0;
        self.back_to_top_visible = false;
    }
}

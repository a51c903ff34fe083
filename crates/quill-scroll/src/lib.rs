//! Scroll synchronization between an editor pane and the shared preview.
//!
//! The editor's vertical scroll position maps onto the preview scrollbar
//! by ratio: how far through the scrollable range the editor sits is how
//! far through its own range the preview is placed. Only one preview
//! exists for potentially many editor panes, so the scrollbar model lives
//! behind a mutex and each pane's [`ScrollSynchronizer`] carries its own
//! enabled flag — bound to pane selection by the host — so background
//! panes do not fight over the shared bar.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use quill_scroll::{PreviewScrollbar, ScrollSynchronizer};
//!
//! let preview = Arc::new(Mutex::new(PreviewScrollbar::new(1000.0, 200.0)));
//! let mut sync = ScrollSynchronizer::new(Arc::clone(&preview));
//! sync.set_enabled(true);
//!
//! // Editor scrolled halfway through its range.
//! sync.on_scroll(400.0, 1000.0, 200.0);
//! assert_eq!(preview.lock().unwrap().value(), 400.0);
//! ```

use std::sync::{Arc, Mutex};

/// How far through the editor's scrollable range the viewport sits, in
/// `[0, 1]`.
///
/// Returns `0` when the content fits inside the viewport (non-positive
/// denominator), `1` when scrolled to or past the end.
#[must_use]
pub fn scroll_ratio(scroll_y: f64, content_height: f64, viewport_height: f64) -> f64 {
    let range = content_height - viewport_height;
    if range <= 0.0 {
        return 0.0;
    }
    (scroll_y / range).clamp(0.0, 1.0)
}

/// Model of the single preview scrollbar shared by all editor panes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PreviewScrollbar {
    max: f64,
    viewport_height: f64,
    value: f64,
}

impl PreviewScrollbar {
    /// Create a scrollbar with the given maximum and viewport height.
    #[must_use]
    pub fn new(max: f64, viewport_height: f64) -> Self {
        Self {
            max,
            viewport_height,
            value: 0.0,
        }
    }

    /// Update the scrollable geometry, e.g. after the preview re-renders.
    pub fn set_range(&mut self, max: f64, viewport_height: f64) {
        self.max = max;
        self.viewport_height = viewport_height;
        self.value = self.value.clamp(0.0, self.scrollable());
    }

    /// Current scrollbar position.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Place the scrollbar at `ratio` of its scrollable range.
    pub fn scroll_to_ratio(&mut self, ratio: f64) {
        self.value = self.scrollable() * ratio.clamp(0.0, 1.0);
    }

    fn scrollable(&self) -> f64 {
        (self.max - self.viewport_height).max(0.0)
    }
}

/// Per-pane synchronizer driving the shared preview scrollbar.
///
/// Scroll callbacks may arrive concurrently from several panes; the
/// scrollbar mutex serializes them. A disabled synchronizer ignores its
/// events entirely.
pub struct ScrollSynchronizer {
    preview: Arc<Mutex<PreviewScrollbar>>,
    enabled: bool,
}

impl ScrollSynchronizer {
    /// Create a synchronizer targeting the shared preview scrollbar.
    /// Starts disabled; the host enables it when its pane is selected.
    #[must_use]
    pub fn new(preview: Arc<Mutex<PreviewScrollbar>>) -> Self {
        Self {
            preview,
            enabled: false,
        }
    }

    /// Enable or disable scroll forwarding for this pane.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether this pane currently drives the preview.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Handle an editor scroll or content-height change event.
    pub fn on_scroll(&self, scroll_y: f64, content_height: f64, viewport_height: f64) {
        if !self.enabled {
            return;
        }

        let ratio = scroll_ratio(scroll_y, content_height, viewport_height);

        match self.preview.lock() {
            Ok(mut preview) => preview.scroll_to_ratio(ratio),
            Err(poisoned) => {
                tracing::warn!("preview scrollbar mutex poisoned");
                poisoned.into_inner().scroll_to_ratio(ratio);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_ratio_zero_when_content_fits() {
        assert_eq!(scroll_ratio(50.0, 200.0, 200.0), 0.0);
        assert_eq!(scroll_ratio(50.0, 100.0, 200.0), 0.0);
    }

    #[test]
    fn test_ratio_one_at_or_past_end() {
        assert_eq!(scroll_ratio(800.0, 1000.0, 200.0), 1.0);
        assert_eq!(scroll_ratio(900.0, 1000.0, 200.0), 1.0);
    }

    #[test]
    fn test_ratio_midpoint() {
        assert_eq!(scroll_ratio(400.0, 1000.0, 200.0), 0.5);
    }

    #[test]
    fn test_ratio_clamps_negative_scroll() {
        assert_eq!(scroll_ratio(-10.0, 1000.0, 200.0), 0.0);
    }

    #[test]
    fn test_preview_position_scales_to_range() {
        let mut bar = PreviewScrollbar::new(600.0, 100.0);
        bar.scroll_to_ratio(0.5);
        assert_eq!(bar.value(), 250.0);
        bar.scroll_to_ratio(1.0);
        assert_eq!(bar.value(), 500.0);
    }

    #[test]
    fn test_set_range_clamps_value() {
        let mut bar = PreviewScrollbar::new(600.0, 100.0);
        bar.scroll_to_ratio(1.0);
        bar.set_range(300.0, 100.0);
        assert_eq!(bar.value(), 200.0);
    }

    #[test]
    fn test_disabled_pane_does_not_move_preview() {
        let preview = Arc::new(Mutex::new(PreviewScrollbar::new(600.0, 100.0)));
        let sync = ScrollSynchronizer::new(Arc::clone(&preview));

        sync.on_scroll(400.0, 1000.0, 200.0);
        assert_eq!(preview.lock().unwrap().value(), 0.0);
    }

    #[test]
    fn test_enabled_pane_moves_preview() {
        let preview = Arc::new(Mutex::new(PreviewScrollbar::new(600.0, 100.0)));
        let mut sync = ScrollSynchronizer::new(Arc::clone(&preview));
        sync.set_enabled(true);

        sync.on_scroll(800.0, 1000.0, 200.0);
        assert_eq!(preview.lock().unwrap().value(), 500.0);
    }

    #[test]
    fn test_concurrent_panes_serialize_on_mutex() {
        use std::thread;

        let preview = Arc::new(Mutex::new(PreviewScrollbar::new(600.0, 100.0)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let preview = Arc::clone(&preview);
                thread::spawn(move || {
                    let mut sync = ScrollSynchronizer::new(preview);
                    sync.set_enabled(true);
                    sync.on_scroll(f64::from(i) * 100.0, 1000.0, 200.0);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let value = preview.lock().unwrap().value();
        assert!((0.0..=500.0).contains(&value));
    }
}

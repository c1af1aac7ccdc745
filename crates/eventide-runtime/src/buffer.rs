//! Per-window event buffering.
//!
//! A `WindowBuffer` maps a window start to the events assigned to that
//! window, in insertion order. Each operator owns one buffer per input
//! source. A window entry is created on first insert, grows by append, and
//! is deleted exactly once when the watermark closes it; a removed window
//! is never resurrected.

use rustc_hash::FxHashMap;

use eventide_core::{Event, Timestamp};

use crate::assigner::WindowId;

/// Window-id keyed event buffer for one (operator, source) pair.
#[derive(Debug, Default)]
pub struct WindowBuffer {
    windows: FxHashMap<WindowId, Vec<Event>>,
}

impl WindowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to a window, creating the window entry on first use.
    pub fn insert(&mut self, window: WindowId, event: Event) {
        self.windows.entry(window).or_default().push(event);
    }

    /// Events buffered for a window, in insertion order.
    pub fn get(&self, window: WindowId) -> Option<&[Event]> {
        self.windows.get(&window).map(Vec::as_slice)
    }

    /// Remove a window entry, returning its events. The only deletion path.
    pub fn remove(&mut self, window: WindowId) -> Option<Vec<Event>> {
        self.windows.remove(&window)
    }

    /// Buffered windows whose end has passed the watermark
    /// (`w + length ≤ watermark`), ascending by window id.
    pub fn closed_by(&self, watermark: Timestamp, length: i64) -> Vec<WindowId> {
        let mut closed: Vec<WindowId> = self
            .windows
            .keys()
            .copied()
            .filter(|w| w + length <= watermark)
            .collect();
        closed.sort_unstable();
        closed
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn event_count(&self) -> usize {
        self.windows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }
}

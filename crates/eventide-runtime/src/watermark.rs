//! Per-source watermark tracking.
//!
//! Each operator tracks one watermark per input source: the running maximum
//! of the timestamps carried by that source's Watermark events. The combined
//! watermark — the one windows are closed against — is the minimum across
//! sources, so no window is finalized while a slower source could still
//! contribute to it. Until every source has reported at least once the
//! combined watermark is undefined and nothing may be closed or evicted.

use eventide_core::Timestamp;

/// Monotonic per-source watermark state for a fixed set of sources.
#[derive(Debug, Clone)]
pub struct WatermarkTracker {
    sources: Vec<Option<Timestamp>>,
}

impl WatermarkTracker {
    /// Create a tracker for `num_sources` input sources, none of which has
    /// reported yet.
    pub fn new(num_sources: usize) -> Self {
        Self {
            sources: vec![None; num_sources],
        }
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Record a watermark observation for a source. The stored value never
    /// decreases; a smaller timestamp arriving later is ignored.
    pub fn observe(&mut self, source: usize, timestamp: Timestamp) {
        let slot = &mut self.sources[source];
        match slot {
            Some(current) if timestamp <= *current => {}
            _ => *slot = Some(timestamp),
        }
    }

    /// The watermark last observed for a source, if any.
    pub fn get(&self, source: usize) -> Option<Timestamp> {
        self.sources[source]
    }

    /// The combined watermark: the minimum across all sources, or `None`
    /// while any source has yet to report.
    pub fn combined(&self) -> Option<Timestamp> {
        self.sources
            .iter()
            .copied()
            .try_fold(Timestamp::MAX, |min, wm| wm.map(|w| min.min(w)))
            .filter(|_| !self.sources.is_empty())
    }
}

//! Sliding-window assignment.
//!
//! A sliding window of length `L` and slide `S` (with `L` an exact multiple
//! of `S`) places a timestamp `t` into every window whose start `w`
//! satisfies `w ≤ t < w + L` and `w ≡ 0 (mod S)`. Assignment is a pure
//! function of the timestamp and the window geometry; it holds no state.

use serde::Deserialize;

use eventide_core::{EngineError, Timestamp};

/// A window is identified by its start timestamp. Window `w` spans
/// `[w, w + length)`.
pub type WindowId = i64;

/// Validated sliding-window geometry.
///
/// Constructed through [`WindowSpec::new`], which rejects a length that is
/// not a positive exact multiple of the slide, before any event is
/// processed. Deserializing a spec from configuration applies the same
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawWindowSpec")]
pub struct WindowSpec {
    slide: i64,
    length: i64,
}

#[derive(Deserialize)]
struct RawWindowSpec {
    slide: i64,
    length: i64,
}

impl TryFrom<RawWindowSpec> for WindowSpec {
    type Error = EngineError;

    fn try_from(raw: RawWindowSpec) -> Result<Self, Self::Error> {
        WindowSpec::new(raw.slide, raw.length)
    }
}

impl WindowSpec {
    pub fn new(slide: i64, length: i64) -> Result<Self, EngineError> {
        if slide <= 0 || length <= 0 || length % slide != 0 {
            return Err(EngineError::InvalidWindow { slide, length });
        }
        Ok(Self { slide, length })
    }

    pub fn slide(&self) -> i64 {
        self.slide
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    /// Number of overlapping windows any sufficiently late timestamp falls
    /// into (`length / slide`).
    pub fn windows_per_event(&self) -> i64 {
        self.length / self.slide
    }

    /// End of window `w`, exclusive: `w + length`.
    pub fn end(&self, window: WindowId) -> Timestamp {
        window + self.length
    }

    /// Closing timestamp of window `w`: the largest timestamp inside it.
    pub fn close_timestamp(&self, window: WindowId) -> Timestamp {
        window + self.length - 1
    }

    /// All window starts containing `timestamp`, ascending, negatives
    /// discarded.
    pub fn windows(&self, timestamp: Timestamp) -> WindowIter {
        let first = (timestamp - self.length + self.slide).div_euclid(self.slide) * self.slide;
        let last = timestamp.div_euclid(self.slide) * self.slide;
        WindowIter {
            next: first.max(0),
            last,
            slide: self.slide,
        }
    }
}

/// Iterator over the window starts a timestamp belongs to.
#[derive(Debug, Clone)]
pub struct WindowIter {
    next: WindowId,
    last: WindowId,
    slide: i64,
}

impl Iterator for WindowIter {
    type Item = WindowId;

    fn next(&mut self) -> Option<WindowId> {
        if self.next > self.last {
            return None;
        }
        let window = self.next;
        self.next += self.slide;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next > self.last {
            0
        } else {
            ((self.last - self.next) / self.slide + 1) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowIter {}

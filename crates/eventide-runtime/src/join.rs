//! Two-stream windowed join operator.
//!
//! Keeps one window buffer per input side. Every newly inserted Regular
//! event immediately probes the opposite side's buffer for the same window
//! and emits matches as they are found; a join result depends only on the
//! pair, so there is no reason to wait for window closure. Watermark
//! progression drives buffer eviction and watermark forwarding, not
//! emission.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use eventide_core::{EngineError, Event, EventKind, Timestamp};

use crate::assigner::WindowSpec;
use crate::buffer::WindowBuffer;
use crate::functions::JoinFn;
use crate::metrics::Metrics;
use crate::stream::{Stream, StreamSender};
use crate::watermark::WatermarkTracker;

/// Which input side an event arrived on. Left is the first source; its
/// events are always passed as the first argument to the join function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Left,
    Right,
}

impl JoinSide {
    pub fn index(self) -> usize {
        match self {
            JoinSide::Left => 0,
            JoinSide::Right => 1,
        }
    }

    pub fn opposite(self) -> JoinSide {
        match self {
            JoinSide::Left => JoinSide::Right,
            JoinSide::Right => JoinSide::Left,
        }
    }

    fn label(self) -> &'static str {
        match self {
            JoinSide::Left => "left",
            JoinSide::Right => "right",
        }
    }
}

/// Two-input operator joining event pairs within shared sliding windows.
pub struct WindowJoinOperator {
    name: String,
    spec: WindowSpec,
    watermarks: WatermarkTracker,
    left: WindowBuffer,
    right: WindowBuffer,
    join: Arc<dyn JoinFn>,
    output: StreamSender,
    metrics: Option<Metrics>,
}

impl WindowJoinOperator {
    pub fn new(
        name: impl Into<String>,
        spec: WindowSpec,
        join: Arc<dyn JoinFn>,
        output: StreamSender,
    ) -> Self {
        Self {
            name: name.into(),
            spec,
            watermarks: WatermarkTracker::new(2),
            left: WindowBuffer::new(),
            right: WindowBuffer::new(),
            join,
            output,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Events currently buffered for a side.
    pub fn buffered(&self, side: JoinSide) -> usize {
        match side {
            JoinSide::Left => self.left.event_count(),
            JoinSide::Right => self.right.event_count(),
        }
    }

    /// Process one event from the given side, in that side's arrival order.
    pub async fn on_event(&mut self, event: Event, side: JoinSide) -> Result<(), EngineError> {
        if let Some(metrics) = &self.metrics {
            metrics
                .events_received
                .with_label_values(&[self.name.as_str(), kind_label(event.kind)])
                .inc();
        }
        match event.kind {
            EventKind::Regular => self.on_regular(event, side).await,
            EventKind::Watermark => self.on_watermark(event.timestamp, side).await,
        }
    }

    async fn on_regular(&mut self, event: Event, side: JoinSide) -> Result<(), EngineError> {
        let source = side.index();
        if let Some(watermark) = self.watermarks.get(source) {
            if event.timestamp <= watermark {
                return Err(EngineError::OrderingViolation {
                    source_id: source,
                    timestamp: event.timestamp,
                    watermark,
                });
            }
        }

        for window in self.spec.windows(event.timestamp) {
            match side {
                JoinSide::Left => self.left.insert(window, event.clone()),
                JoinSide::Right => self.right.insert(window, event.clone()),
            }

            let close_timestamp = self.spec.close_timestamp(window);
            let opposite = match side {
                JoinSide::Left => &self.right,
                JoinSide::Right => &self.left,
            };
            let Some(candidates) = opposite.get(window) else {
                continue;
            };
            trace!(
                operator = %self.name,
                side = side.label(),
                window,
                candidates = candidates.len(),
                "probing opposite buffer"
            );

            for candidate in candidates {
                let (left, right) = match side {
                    JoinSide::Left => (&event, candidate),
                    JoinSide::Right => (candidate, &event),
                };
                if let Some(joined) = self.join.apply(close_timestamp, left, right)? {
                    if let Some(metrics) = &self.metrics {
                        metrics.join_matches.with_label_values(&[self.name.as_str()]).inc();
                        metrics
                            .results_emitted
                            .with_label_values(&[self.name.as_str()])
                            .inc();
                    }
                    self.output.send(joined).await?;
                }
            }
        }
        Ok(())
    }

    async fn on_watermark(
        &mut self,
        timestamp: Timestamp,
        side: JoinSide,
    ) -> Result<(), EngineError> {
        self.watermarks.observe(side.index(), timestamp);
        let Some(combined) = self.watermarks.combined() else {
            trace!(
                operator = %self.name,
                side = side.label(),
                timestamp,
                "watermark buffered, other source has not reported yet"
            );
            return Ok(());
        };

        // A window is dropped only once neither source can still reach it,
        // which is what the combined (minimum) watermark asserts.
        let opposite = match side {
            JoinSide::Left => &mut self.right,
            JoinSide::Right => &mut self.left,
        };
        let closed = opposite.closed_by(combined, self.spec.length());
        for window in &closed {
            opposite.remove(*window);
        }
        if !closed.is_empty() {
            debug!(
                operator = %self.name,
                side = side.opposite().label(),
                combined,
                evicted = closed.len(),
                "evicted closed windows"
            );
            if let Some(metrics) = &self.metrics {
                metrics
                    .windows_closed
                    .with_label_values(&[self.name.as_str()])
                    .inc_by(closed.len() as f64);
            }
        }

        self.output.send(Event::watermark(combined)).await
    }

    /// Run the operator: consume both input streams until exhaustion.
    /// The two sources may deliver concurrently, but handler execution is
    /// serialized here — buffer mutation and probing never race.
    pub fn spawn(mut self, mut left: Stream, mut right: Stream) -> JoinHandle<Result<(), EngineError>> {
        tokio::spawn(async move {
            let mut left_open = true;
            let mut right_open = true;
            while left_open || right_open {
                tokio::select! {
                    event = left.next(), if left_open => match event {
                        Some(event) => self.on_event(event, JoinSide::Left).await?,
                        None => left_open = false,
                    },
                    event = right.next(), if right_open => match event {
                        Some(event) => self.on_event(event, JoinSide::Right).await?,
                        None => right_open = false,
                    },
                }
            }
            debug!(operator = %self.name, "both input streams exhausted");
            Ok(())
        })
    }
}

fn kind_label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Regular => "regular",
        EventKind::Watermark => "watermark",
    }
}

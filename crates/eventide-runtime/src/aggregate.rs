//! Windowed aggregation operator.
//!
//! Buffers Regular events into every sliding window they fall into and runs
//! the query-supplied aggregation over each window exactly once, at the
//! moment a watermark closes it. Emission is deferred to window closure
//! because the aggregation needs the window's full event set; contrast the
//! eager [`crate::join::WindowJoinOperator`].

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use eventide_core::{EngineError, Event, EventKind, Timestamp};

use crate::assigner::WindowSpec;
use crate::buffer::WindowBuffer;
use crate::functions::AggregateFn;
use crate::metrics::Metrics;
use crate::stream::{Stream, StreamSender};
use crate::watermark::WatermarkTracker;

/// Single-input operator computing batch aggregates over closed windows.
pub struct WindowAggregateOperator {
    name: String,
    spec: WindowSpec,
    watermark: WatermarkTracker,
    buffer: WindowBuffer,
    aggregate: Arc<dyn AggregateFn>,
    output: StreamSender,
    metrics: Option<Metrics>,
}

impl WindowAggregateOperator {
    pub fn new(
        name: impl Into<String>,
        spec: WindowSpec,
        aggregate: Arc<dyn AggregateFn>,
        output: StreamSender,
    ) -> Self {
        Self {
            name: name.into(),
            spec,
            watermark: WatermarkTracker::new(1),
            buffer: WindowBuffer::new(),
            aggregate,
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

    /// Number of windows currently buffered (watermark has not closed them).
    pub fn open_windows(&self) -> usize {
        self.buffer.window_count()
    }

    /// Process one input event in arrival order.
    pub async fn on_event(&mut self, event: Event) -> Result<(), EngineError> {
        if let Some(metrics) = &self.metrics {
            metrics
                .events_received
                .with_label_values(&[self.name.as_str(), kind_label(event.kind)])
                .inc();
        }
        match event.kind {
            EventKind::Regular => self.on_regular(event),
            EventKind::Watermark => self.on_watermark(event.timestamp).await,
        }
    }

    fn on_regular(&mut self, event: Event) -> Result<(), EngineError> {
        if let Some(watermark) = self.watermark.get(0) {
            if event.timestamp <= watermark {
                return Err(EngineError::OrderingViolation {
                    source_id: 0,
                    timestamp: event.timestamp,
                    watermark,
                });
            }
        }

        for window in self.spec.windows(event.timestamp) {
            trace!(
                operator = %self.name,
                window,
                timestamp = event.timestamp,
                "buffering event"
            );
            self.buffer.insert(window, event.clone());
        }
        Ok(())
    }

    async fn on_watermark(&mut self, timestamp: Timestamp) -> Result<(), EngineError> {
        self.watermark.observe(0, timestamp);
        let Some(watermark) = self.watermark.combined() else {
            return Ok(());
        };

        for window in self.buffer.closed_by(watermark, self.spec.length()) {
            let results = {
                let events = self.buffer.get(window).unwrap_or(&[]);
                self.aggregate.apply(window, events)?
            };
            debug!(
                operator = %self.name,
                window,
                watermark,
                results = results.len(),
                "window closed"
            );
            let emitted = results.len();
            for result in results {
                self.output.send(result).await?;
            }
            self.buffer.remove(window);

            if let Some(metrics) = &self.metrics {
                metrics
                    .windows_closed
                    .with_label_values(&[self.name.as_str()])
                    .inc();
                metrics
                    .results_emitted
                    .with_label_values(&[self.name.as_str()])
                    .inc_by(emitted as f64);
            }
        }
        Ok(())
    }

    /// Run the operator: consume the input stream to exhaustion, processing
    /// events one at a time in delivery order.
    pub fn spawn(mut self, mut input: Stream) -> JoinHandle<Result<(), EngineError>> {
        tokio::spawn(async move {
            while let Some(event) = input.next().await {
                self.on_event(event).await?;
            }
            debug!(operator = %self.name, "input stream exhausted");
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

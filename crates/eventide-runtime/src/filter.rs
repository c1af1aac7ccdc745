//! Stateless filter operator.
//!
//! Forwards Regular events that pass the query-supplied predicate and drops
//! the rest. Watermark events are always forwarded unchanged: the filter
//! removes data, never progress.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use eventide_core::{EngineError, Event, EventKind};

use crate::functions::FilterFn;
use crate::metrics::Metrics;
use crate::stream::{Stream, StreamSender};

pub struct FilterOperator {
    name: String,
    predicate: Arc<dyn FilterFn>,
    output: StreamSender,
    metrics: Option<Metrics>,
}

impl FilterOperator {
    pub fn new(
        name: impl Into<String>,
        predicate: Arc<dyn FilterFn>,
        output: StreamSender,
    ) -> Self {
        Self {
            name: name.into(),
            predicate,
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

    pub async fn on_event(&mut self, event: Event) -> Result<(), EngineError> {
        if let Some(metrics) = &self.metrics {
            let kind = match event.kind {
                EventKind::Regular => "regular",
                EventKind::Watermark => "watermark",
            };
            metrics
                .events_received
                .with_label_values(&[self.name.as_str(), kind])
                .inc();
        }

        match event.kind {
            EventKind::Regular => {
                if self.predicate.apply(&event)? {
                    if let Some(metrics) = &self.metrics {
                        metrics
                            .results_emitted
                            .with_label_values(&[self.name.as_str()])
                            .inc();
                    }
                    self.output.send(event).await
                } else {
                    trace!(
                        operator = %self.name,
                        timestamp = event.timestamp,
                        "event dropped by predicate"
                    );
                    Ok(())
                }
            }
            EventKind::Watermark => self.output.send(event).await,
        }
    }

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

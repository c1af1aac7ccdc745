//! Prometheus metrics for Eventide operators.

use std::sync::Arc;

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

/// Metrics handle shared by the operators of one pipeline.
///
/// Operators take an optional handle via `with_metrics`; without one they
/// record nothing.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    pub events_received: CounterVec,
    pub windows_closed: CounterVec,
    pub join_matches: CounterVec,
    pub results_emitted: CounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let events_received = CounterVec::new(
            Opts::new("eventide_events_received_total", "Events received"),
            &["operator", "kind"],
        )
        .expect("failed to create events_received counter");

        let windows_closed = CounterVec::new(
            Opts::new("eventide_windows_closed_total", "Windows closed and evicted"),
            &["operator"],
        )
        .expect("failed to create windows_closed counter");

        let join_matches = CounterVec::new(
            Opts::new("eventide_join_matches_total", "Join pairs matched"),
            &["operator"],
        )
        .expect("failed to create join_matches counter");

        let results_emitted = CounterVec::new(
            Opts::new("eventide_results_emitted_total", "Result events emitted"),
            &["operator"],
        )
        .expect("failed to create results_emitted counter");

        registry
            .register(Box::new(events_received.clone()))
            .expect("failed to register events_received");
        registry
            .register(Box::new(windows_closed.clone()))
            .expect("failed to register windows_closed");
        registry
            .register(Box::new(join_matches.clone()))
            .expect("failed to register join_matches");
        registry
            .register(Box::new(results_emitted.clone()))
            .expect("failed to register results_emitted");

        Self {
            registry: Arc::new(registry),
            events_received,
            windows_closed,
            join_matches,
            results_emitted,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            tracing::error!("failed to encode metrics: {}", e);
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

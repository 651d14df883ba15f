// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers the event store's two hot paths:
// - Saves (per event type)
// - Point-in-time retrievals (events returned, latency)
// - Failures by operation and error kind
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub events_saved: IntCounterVec,
    pub events_retrieved: IntCounter,
    pub retrieval_duration: Histogram,
    pub failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let events_saved = IntCounterVec::new(
            Opts::new("event_store_events_saved_total", "Total domain events saved"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_saved.clone()))?;

        let events_retrieved = IntCounter::new(
            "event_store_events_retrieved_total",
            "Total domain events materialized by point-in-time retrievals",
        )?;
        registry.register(Box::new(events_retrieved.clone()))?;

        let retrieval_duration = Histogram::with_opts(
            HistogramOpts::new(
                "event_store_retrieval_duration_seconds",
                "Point-in-time retrieval duration",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(retrieval_duration.clone()))?;

        let failures = IntCounterVec::new(
            Opts::new("event_store_failures_total", "Total failed event store operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            registry,
            events_saved,
            events_retrieved,
            retrieval_duration,
            failures,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_saved(&self, event_type: &str) {
        self.events_saved.with_label_values(&[event_type]).inc();
    }

    pub fn record_retrieval(&self, event_count: usize, duration_secs: f64) {
        self.events_retrieved.inc_by(event_count as u64);
        self.retrieval_duration.observe(duration_secs);
    }

    pub fn record_failure(&self, operation: &str, kind: &str) {
        self.failures.with_label_values(&[operation, kind]).inc();
    }
}

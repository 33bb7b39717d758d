//! Prometheus metrics for webhook dispatch.

use prometheus_client::metrics::{counter::Counter, gauge::Gauge, histogram::Histogram};
use prometheus_client::registry::Registry;
use std::time::Duration;

use crate::error::{WebhookError, WebhookResult};

/// Latency buckets in seconds, matching the usual HTTP client defaults.
const LATENCY_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Dispatch metrics.
///
/// Cloning shares the underlying values, so the same instance can be handed
/// to the worker and registered with an application registry.
#[derive(Debug, Clone)]
pub struct WebhookMetrics {
    /// Latency of webhook calls in seconds.
    pub latency_seconds: Histogram,
    /// Event IDs waiting in the dispatch queue.
    pub queue_current: Gauge,
    /// Every webhook call attempt.
    pub calls_total: Counter,
    /// Webhook call attempts that failed.
    pub calls_error: Counter,
}

impl WebhookMetrics {
    /// Creates a fresh set of metrics.
    pub fn new() -> Self {
        Self {
            latency_seconds: Histogram::new(LATENCY_BUCKETS.into_iter()),
            queue_current: Gauge::default(),
            calls_total: Counter::default(),
            calls_error: Counter::default(),
        }
    }

    /// Registers every metric with `registry`.
    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "webhooks_latency_seconds",
            "The latency for webhooks requests in seconds",
            self.latency_seconds.clone(),
        );
        registry.register(
            "webhooks_event_queue_current",
            "The current number of queued events waiting for webhooks processing",
            self.queue_current.clone(),
        );
        registry.register(
            "webhooks_calls",
            "The total number of webhooks calls",
            self.calls_total.clone(),
        );
        registry.register(
            "webhooks_calls_error",
            "The total number of webhooks calls with error",
            self.calls_error.clone(),
        );
    }

    /// Renders the metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> WebhookResult<String> {
        let mut registry = Registry::default();
        self.register(&mut registry);

        let mut buf = String::new();
        prometheus_client::encoding::text::encode(&mut buf, &registry)
            .map_err(|e| WebhookError::Internal(format!("failed to encode metrics: {e}")))?;
        Ok(buf)
    }

    pub(crate) fn observe_latency(&self, elapsed: Duration) {
        self.latency_seconds.observe(elapsed.as_secs_f64());
    }

    pub(crate) fn set_queue_len(&self, len: usize) {
        self.queue_current.set(len as i64);
    }

    pub(crate) fn record_call(&self, success: bool) {
        self.calls_total.inc();
        if !success {
            self.calls_error.inc();
        }
    }
}

impl Default for WebhookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

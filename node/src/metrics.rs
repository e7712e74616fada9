//! # Prometheus Metrics
//!
//! Exposes operational metrics for the settlement node. Scraped by
//! Prometheus at the `/metrics` HTTP endpoint on the configured metrics
//! port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] under
//! the `keel` prefix so they do not collide with any default global
//! registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of instruction batches accepted for dispatch.
    pub batches_submitted_total: IntCounter,
    /// Total number of instruction batches that failed dispatch or commit.
    pub batches_failed_total: IntCounter,
    /// Total number of instructions applied by committed batches.
    pub instructions_applied_total: IntCounter,
    /// Total number of audit events emitted by committed batches.
    pub events_emitted_total: IntCounter,
    /// Number of currently connected WebSocket subscribers.
    pub ws_subscribers: IntGauge,
    /// Histogram of batch apply latency (dispatch plus commit) in seconds.
    pub batch_apply_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("keel".into()), None)
            .expect("failed to create prometheus registry");

        let batches_submitted_total = IntCounter::new(
            "batches_submitted_total",
            "Total number of instruction batches accepted for dispatch",
        )
        .expect("metric creation");
        registry
            .register(Box::new(batches_submitted_total.clone()))
            .expect("metric registration");

        let batches_failed_total = IntCounter::new(
            "batches_failed_total",
            "Total number of instruction batches that failed dispatch or commit",
        )
        .expect("metric creation");
        registry
            .register(Box::new(batches_failed_total.clone()))
            .expect("metric registration");

        let instructions_applied_total = IntCounter::new(
            "instructions_applied_total",
            "Total number of instructions applied by committed batches",
        )
        .expect("metric creation");
        registry
            .register(Box::new(instructions_applied_total.clone()))
            .expect("metric registration");

        let events_emitted_total = IntCounter::new(
            "events_emitted_total",
            "Total number of audit events emitted by committed batches",
        )
        .expect("metric creation");
        registry
            .register(Box::new(events_emitted_total.clone()))
            .expect("metric registration");

        let ws_subscribers = IntGauge::new(
            "ws_subscribers",
            "Number of currently connected WebSocket subscribers",
        )
        .expect("metric creation");
        registry
            .register(Box::new(ws_subscribers.clone()))
            .expect("metric registration");

        let batch_apply_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "batch_apply_seconds",
                "Batch apply latency (dispatch plus commit) in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(batch_apply_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            batches_submitted_total,
            batches_failed_total,
            instructions_applied_total,
            events_emitted_total,
            ws_subscribers,
            batch_apply_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

/// Shared metrics state passed to axum handlers via extension.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

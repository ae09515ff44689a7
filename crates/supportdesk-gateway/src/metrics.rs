//! Prometheus metrics for SupportDesk Gateway
//!
//! Exposes metrics for monitoring chat traffic and reply generation.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, register_histogram, Counter,
    CounterVec, GaugeVec, Histogram,
};

lazy_static! {
    // ============================================================================
    // Chat Metrics
    // ============================================================================

    /// Chat messages received
    pub static ref CHAT_REQUESTS_TOTAL: Counter =
        register_counter!("supportdesk_chat_requests_total", "Total chat messages received").unwrap();

    /// Chat failures by error kind
    pub static ref CHAT_ERRORS: CounterVec =
        register_counter_vec!("supportdesk_chat_errors_total", "Chat failures by error kind", &["kind"]).unwrap();

    /// End-to-end reply latency, retries and backoff included
    pub static ref REPLY_LATENCY: Histogram = register_histogram!(
        "supportdesk_reply_latency_seconds",
        "Reply generation latency in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0]
    ).unwrap();

    // ============================================================================
    // History Metrics
    // ============================================================================

    /// History lookups
    pub static ref HISTORY_REQUESTS_TOTAL: Counter =
        register_counter!("supportdesk_history_requests_total", "Total history lookups").unwrap();

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Build info
    pub static ref BUILD_INFO: GaugeVec =
        register_gauge_vec!("supportdesk_build_info", "Build information", &["version", "commit"]).unwrap();
}

/// Initialize metrics with build info
pub fn init_metrics() {
    BUILD_INFO
        .with_label_values(&[
            env!("CARGO_PKG_VERSION"),
            option_env!("GIT_COMMIT_SHA").unwrap_or("unknown"),
        ])
        .set(1.0);
}

/// Export metrics in Prometheus format
pub fn export() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

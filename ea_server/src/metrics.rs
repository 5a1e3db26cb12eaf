//! Prometheus metrics for monitoring the arena server.
//!
//! Metrics are recorded through the `metrics` facade and exposed in
//! Prometheus text format when an exporter address is configured. Without
//! an installed exporter every call is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ea_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/auth/login", 200);
//! metrics::tournament_joins_total("reserved");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request with method, route and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Arena Metrics
// ============================================================================

/// Record a join attempt: `reserved` or the rejection kind.
pub fn tournament_joins_total(outcome: &str) {
    metrics::counter!("tournament_joins_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record an admin approval of a deposit (`add`) or withdrawal (`withdraw`).
pub fn request_approvals_total(kind: &str, outcome: &str) {
    metrics::counter!("request_approvals_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Increment prizes awarded counter.
pub fn prizes_awarded_total() {
    metrics::counter!("prizes_awarded_total").increment(1);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(endpoint: &str) {
    metrics::counter!("rate_limit_hits_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

//! Prometheus Metrics HTTP Handler

use super::handlers::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    // Update system metrics before encoding
    update_system_metrics();

    match state.metrics.encode() {
        Ok(metrics) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            metrics,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

/// Count and time every routed request
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    crate::metrics::record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Initialize metrics with default values
pub fn init_metrics() {
    // Force initialization of all metrics by accessing them
    let _ = &*crate::metrics::CACHE_FLUSH_TOTAL;
    let _ = &*crate::metrics::CACHE_FLUSH_DURATION;
    let _ = &*crate::metrics::CACHE_FLUSHED_ENTITIES_TOTAL;
    let _ = &*crate::metrics::CACHE_DROPPED_ENTITIES_TOTAL;
    let _ = &*crate::metrics::HTTP_REQUESTS_TOTAL;
    let _ = &*crate::metrics::HTTP_REQUEST_DURATION;
    let _ = &*crate::metrics::PROCESS_MEMORY_BYTES;
    let _ = &*crate::metrics::PROCESS_CPU_USAGE;

    tracing::info!("Prometheus metrics initialized (8 metric types registered)");
}

/// Update system metrics (called on every scrape)
pub fn update_system_metrics() {
    if let Ok(usage) = sys_info::mem_info() {
        crate::metrics::PROCESS_MEMORY_BYTES
            .with_label_values(&["used"])
            .set((usage.total - usage.avail) as i64 * 1024);
        crate::metrics::PROCESS_MEMORY_BYTES
            .with_label_values(&["total"])
            .set(usage.total as i64 * 1024);
    }

    if let Ok(load) = sys_info::loadavg() {
        crate::metrics::PROCESS_CPU_USAGE
            .with_label_values(&["1min"])
            .set((load.one * 100.0) as i64);
        crate::metrics::PROCESS_CPU_USAGE
            .with_label_values(&["5min"])
            .set((load.five * 100.0) as i64);
    }
}

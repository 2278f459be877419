//! `GET /metrics` and `GET /health` route fragments, merged into every
//! service's own `Router` (spec §2 "Supplemented features": health checks
//! everywhere).

use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderName},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};

async fn metrics_handler() -> ([(HeaderName, String); 1], Bytes) {
    let metric_families = prometheus::gather();
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder.encode(&metric_families, &mut buf).ok();
    (
        [(CONTENT_TYPE, encoder.format_type().to_string())],
        Bytes::from(buf),
    )
}

async fn health_handler() -> &'static str {
    "OK"
}

/// A `Router<S>` fragment exposing `/metrics` and `/health`; merge it into a
/// service's main router with [`axum::Router::merge`].
pub fn observability_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
}

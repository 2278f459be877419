//! Shared `serve()` helper: layers every service's router with the same
//! timeout/concurrency/panic-containment stack and a graceful shutdown on
//! Ctrl+C, grounded in the teacher's `http-rpc-gateway::run_server` and
//! `telemetry::http::run_server`.

use axum::{error_handling::HandleErrorLayer, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower::{limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONCURRENCY: usize = 256;
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

async fn handle_middleware_error(err: BoxError) -> (axum::http::StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (axum::http::StatusCode::REQUEST_TIMEOUT, "request timed out".into())
    } else {
        (axum::http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// Wraps `app` with the ambient middleware stack and serves it on `addr`
/// until Ctrl+C is received.
pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let app = app
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(LoadShedLayer::new())
                .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENCY))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install CTRL+C handler");
        }
        tracing::info!("shutting down gracefully");
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }
    Ok(())
}

mod audit;
mod cert_client;
mod config;
mod freeze;
mod handlers;
mod idempotency;
mod state;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use config::Config;
use dashmap::DashMap;
use dgc_client::ServiceClient;
use dgc_storage::RecordStore;
use dgc_telemetry::ServiceMetrics;
use dgc_trust::{service_auth_middleware, ServiceAuthConfig};
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dgc_telemetry::init_tracing("marketplace")?;
    let config = Config::from_env();

    let store = RecordStore::open(&config.db_path)?;
    let client_for = |url: &Option<String>| url.as_ref().map(|u| ServiceClient::new(u.clone(), config.service_token.clone()));

    let state = AppState {
        store,
        cert_client: client_for(&config.certificate_service_url),
        recon_client: client_for(&config.reconciliation_service_url),
        risk_client: client_for(&config.risk_stream_url),
        dispute_client: client_for(&config.dispute_service_url),
        metrics: Arc::new(ServiceMetrics::new("marketplace")?),
        write_lock: Arc::new(Mutex::new(())),
        key_locks: Arc::new(DashMap::new()),
    };

    let auth_config = ServiceAuthConfig::new(config.service_token.clone());

    let app = Router::new()
        .route("/listings/create", post(handlers::create_listing))
        .route("/listings", get(handlers::list_listings))
        .route("/listings/:id", get(handlers::get_listing))
        .route("/listings/:id/audit", get(handlers::get_audit))
        .route("/listings/:id/dispute/open", post(handlers::open_dispute))
        .route("/escrow/lock", post(handlers::lock_escrow))
        .route("/escrow/settle", post(handlers::settle_escrow))
        .route("/escrow/cancel", post(handlers::cancel_escrow))
        .route_layer(middleware::from_fn_with_state(auth_config, service_auth_middleware))
        .with_state(state)
        .merge(dgc_telemetry::observability_routes());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    dgc_telemetry::serve(app, addr).await
}

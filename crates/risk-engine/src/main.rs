mod config;
mod handlers;
mod heuristics;
mod state;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use config::Config;
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
    dgc_telemetry::init_tracing("risk-engine")?;
    let config = Config::from_env();

    let store = RecordStore::open(&config.db_path)?;
    let webhook_client = config.alert_webhook_url.as_ref().map(|url| ServiceClient::new(url.clone(), config.service_token.clone()));

    let state = AppState {
        store,
        webhook_client,
        alert_threshold: config.alert_threshold,
        metrics: Arc::new(ServiceMetrics::new("risk_engine")?),
        write_lock: Arc::new(Mutex::new(())),
    };

    let auth_config = ServiceAuthConfig::new(config.service_token.clone());

    let app = Router::new()
        .route("/ingest/ledger-event", post(handlers::ingest_ledger_event))
        .route("/ingest/listing-audit-event", post(handlers::ingest_listing_audit_event))
        .route("/ingest/reconciliation-alert", post(handlers::ingest_reconciliation_alert))
        .route("/risk/certificates/:id", get(handlers::get_certificate_profile))
        .route("/risk/listings/:id", get(handlers::get_listing_profile))
        .route("/risk/summary", get(handlers::summary))
        .route("/risk/alerts", get(handlers::alerts))
        .route_layer(middleware::from_fn_with_state(auth_config, service_auth_middleware))
        .with_state(state)
        .merge(dgc_telemetry::observability_routes());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    dgc_telemetry::serve(app, addr).await
}

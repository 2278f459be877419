mod config;
mod handlers;
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
use dgc_trust::{service_auth_middleware, AllowedRoles, ServiceAuthConfig, UNFREEZE_DEFAULT_ROLES};
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dgc_telemetry::init_tracing("reconciliation")?;
    let config = Config::from_env();

    let store = RecordStore::open(&config.db_path)?;
    let cert_client = config
        .certificate_service_url
        .as_ref()
        .map(|url| ServiceClient::new(url.clone(), config.service_token.clone()));
    let risk_client = config
        .risk_stream_url
        .as_ref()
        .map(|url| ServiceClient::new(url.clone(), config.service_token.clone()));

    let state = AppState {
        store,
        cert_client,
        risk_client,
        custody_total_gram: config.custody_total_gram.clone(),
        mismatch_threshold_gram: config.mismatch_threshold_gram.clone(),
        unfreeze_allowed_roles: AllowedRoles::parse(config.unfreeze_allowed_roles.as_deref().unwrap_or(UNFREEZE_DEFAULT_ROLES)),
        metrics: Arc::new(ServiceMetrics::new("reconciliation")?),
        write_lock: Arc::new(Mutex::new(())),
    };

    let auth_config = ServiceAuthConfig::new(config.service_token.clone());

    let app = Router::new()
        .route("/reconcile/run", post(handlers::run))
        .route("/reconcile/latest", get(handlers::latest))
        .route("/reconcile/history", get(handlers::history))
        .route("/freeze/unfreeze", post(handlers::unfreeze))
        .route("/freeze/overrides", get(handlers::overrides))
        .route_layer(middleware::from_fn_with_state(auth_config, service_auth_middleware))
        .with_state(state)
        .merge(dgc_telemetry::observability_routes());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    dgc_telemetry::serve(app, addr).await
}

mod config;
mod handlers;
mod ledger_client;
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
    dgc_telemetry::init_tracing("certificate-authority")?;
    let config = Config::from_env()?;

    let store = RecordStore::open(&config.db_path)?;
    let issuer_pk_hex = dgc_crypto::derive_pk(&config.issuer_sk_hex)?;
    let ledger_client = config
        .ledger_adapter_url
        .as_ref()
        .map(|url| ServiceClient::new(url.clone(), config.service_token.clone()));

    let state = AppState {
        store,
        issuer_sk_hex: Arc::new(config.issuer_sk_hex.clone()),
        issuer_pk_hex: Arc::new(issuer_pk_hex),
        ledger_client,
        metrics: Arc::new(ServiceMetrics::new("certificate_authority")?),
        write_lock: Arc::new(Mutex::new(())),
    };

    let auth_config = ServiceAuthConfig::new(config.service_token.clone());

    let app = Router::new()
        .route("/certificates/issue", post(handlers::issue))
        .route("/certificates/verify", post(handlers::verify))
        .route("/certificates/transfer", post(handlers::transfer))
        .route("/certificates/split", post(handlers::split))
        .route("/certificates/status", post(handlers::set_status))
        .route("/certificates/:cert_id", get(handlers::get_certificate))
        .route("/certificates/:cert_id/timeline", get(handlers::timeline))
        .route("/certificates", get(handlers::list_certificates))
        .route("/openapi.json", get(handlers::openapi))
        .route_layer(middleware::from_fn_with_state(auth_config, service_auth_middleware))
        .with_state(state)
        .merge(dgc_telemetry::observability_routes());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    dgc_telemetry::serve(app, addr).await
}

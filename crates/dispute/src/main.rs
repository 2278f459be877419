mod config;
mod handlers;
mod state;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use config::Config;
use dgc_storage::RecordStore;
use dgc_telemetry::ServiceMetrics;
use dgc_trust::{
    service_auth_middleware, AllowedRoles, ServiceAuthConfig, DISPUTE_ASSIGN_DEFAULT_ROLES,
    DISPUTE_RESOLVE_DEFAULT_ROLES,
};
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dgc_telemetry::init_tracing("dispute")?;
    let config = Config::from_env();

    let store = RecordStore::open(&config.db_path)?;

    let state = AppState {
        store,
        assign_allowed_roles: AllowedRoles::parse(config.assign_allowed_roles.as_deref().unwrap_or(DISPUTE_ASSIGN_DEFAULT_ROLES)),
        resolve_allowed_roles: AllowedRoles::parse(config.resolve_allowed_roles.as_deref().unwrap_or(DISPUTE_RESOLVE_DEFAULT_ROLES)),
        metrics: Arc::new(ServiceMetrics::new("dispute")?),
        write_lock: Arc::new(Mutex::new(())),
    };

    let auth_config = ServiceAuthConfig::new(config.service_token.clone());

    let app = Router::new()
        .route("/disputes/open", post(handlers::open))
        .route("/disputes/:id/assign", post(handlers::assign))
        .route("/disputes/:id/resolve", post(handlers::resolve))
        .route("/disputes/:id", get(handlers::get_dispute))
        .route("/disputes", get(handlers::list))
        .route_layer(middleware::from_fn_with_state(auth_config, service_auth_middleware))
        .with_state(state)
        .merge(dgc_telemetry::observability_routes());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    dgc_telemetry::serve(app, addr).await
}

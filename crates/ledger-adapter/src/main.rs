mod config;
mod handlers;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use config::Config;
use dgc_chain_sink::{ChainWriter, HttpChainWriter};
use dgc_client::ServiceClient;
use dgc_storage::RecordStore;
use dgc_telemetry::{init_tracing, observability_routes, ServiceMetrics};
use state::AppState;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("ledger-adapter")?;
    let config = Config::from_env();

    let store = RecordStore::open(&config.db_path)?;
    let metrics = Arc::new(ServiceMetrics::new("ledger_adapter")?);

    let chain_writer: Option<Arc<dyn ChainWriter>> = config.chain_rpc_url.as_ref().map(|url| {
        Arc::new(HttpChainWriter::new(
            url.clone(),
            config.chain_registry_address.clone(),
            config.chain_signer_address.clone(),
        )) as Arc<dyn ChainWriter>
    });

    let risk_client = config
        .risk_stream_url
        .as_ref()
        .map(|url| ServiceClient::new(url.clone(), config.service_token.clone()));

    let state = AppState {
        store,
        chain_writer,
        risk_client,
        metrics,
        write_lock: Arc::new(Mutex::new(())),
    };

    let service_auth = dgc_trust::ServiceAuthConfig::new(config.service_token.clone());

    let app = Router::new()
        .route("/proofs/anchor", post(handlers::anchor))
        .route("/proofs/:cert_id", get(handlers::get_proof))
        .route("/events/record", post(handlers::record_event))
        .route("/events/:cert_id", get(handlers::get_timeline))
        .route("/chain/status", get(handlers::chain_status))
        .route_layer(axum::middleware::from_fn_with_state(
            service_auth,
            dgc_trust::service_auth_middleware,
        ))
        .with_state(state)
        .merge(observability_routes());

    let addr = format!("0.0.0.0:{}", config.port).parse()?;
    dgc_telemetry::serve(app, addr).await
}

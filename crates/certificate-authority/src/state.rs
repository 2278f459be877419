use dgc_client::ServiceClient;
use dgc_storage::RecordStore;
use dgc_telemetry::ServiceMetrics;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CERTIFICATES_TABLE: &str = "certificates";

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub issuer_sk_hex: Arc<String>,
    pub issuer_pk_hex: Arc<String>,
    pub ledger_client: Option<ServiceClient>,
    pub metrics: Arc<ServiceMetrics>,
    /// Serializes issue/transfer/split/status so a concurrent pair of
    /// mutations on the same certId cannot both read the pre-mutation
    /// payload before either persists (spec §5).
    pub write_lock: Arc<Mutex<()>>,
}

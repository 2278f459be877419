use dgc_chain_sink::ChainWriter;
use dgc_client::ServiceClient;
use dgc_storage::RecordStore;
use dgc_telemetry::ServiceMetrics;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const PROOFS_TABLE: &str = "proofs";
pub const TIMELINE_TABLE: &str = "timeline";

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub chain_writer: Option<Arc<dyn ChainWriter>>,
    pub risk_client: Option<ServiceClient>,
    pub metrics: Arc<ServiceMetrics>,
    /// Serializes the read-modify-write timeline append sequence so two
    /// concurrent `record()` calls for the same certId cannot both observe
    /// the pre-append list before either writes (spec §5).
    pub write_lock: Arc<Mutex<()>>,
}

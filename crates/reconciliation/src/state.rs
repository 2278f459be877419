use dgc_client::ServiceClient;
use dgc_storage::RecordStore;
use dgc_telemetry::ServiceMetrics;
use dgc_trust::AllowedRoles;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const RUNS_TABLE: &str = "runs";
pub const RUNS_ALL_KEY: &str = "all";
pub const FREEZE_TABLE: &str = "freeze";
pub const FREEZE_KEY: &str = "singleton";
pub const OVERRIDES_TABLE: &str = "overrides";
pub const OVERRIDES_ALL_KEY: &str = "all";

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub cert_client: Option<ServiceClient>,
    pub risk_client: Option<ServiceClient>,
    pub custody_total_gram: Option<String>,
    pub mismatch_threshold_gram: String,
    pub unfreeze_allowed_roles: AllowedRoles,
    pub metrics: Arc<ServiceMetrics>,
    pub write_lock: Arc<Mutex<()>>,
}

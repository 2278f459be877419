use dgc_storage::RecordStore;
use dgc_telemetry::ServiceMetrics;
use dgc_trust::AllowedRoles;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DISPUTES_TABLE: &str = "disputes";

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub assign_allowed_roles: AllowedRoles,
    pub resolve_allowed_roles: AllowedRoles,
    pub metrics: Arc<ServiceMetrics>,
    pub write_lock: Arc<Mutex<()>>,
}

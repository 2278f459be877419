use dgc_client::ServiceClient;
use dgc_storage::RecordStore;
use dgc_telemetry::ServiceMetrics;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const LEDGER_EVENTS_TABLE: &str = "ledger_events";
pub const LISTING_AUDIT_TABLE: &str = "listing_audit";
pub const LISTING_AUDIT_ALL_KEY: &str = "all";
pub const CERT_PROFILE_TABLE: &str = "cert_profiles";
pub const LISTING_PROFILE_TABLE: &str = "listing_profiles";
pub const ALERTS_TABLE: &str = "alerts";
pub const ALERTS_ALL_KEY: &str = "all";

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub webhook_client: Option<ServiceClient>,
    pub alert_threshold: u32,
    pub metrics: Arc<ServiceMetrics>,
    /// Serializes recompute-then-persist per target; the source places no
    /// formal requirement on this (spec §9 Open Question iii) but per-target
    /// serialization is the recommended, and simplest, way to keep profiles
    /// monotonically consistent under concurrent ingests.
    pub write_lock: Arc<Mutex<()>>,
}

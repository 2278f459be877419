use dashmap::DashMap;
use dgc_client::ServiceClient;
use dgc_storage::RecordStore;
use dgc_telemetry::ServiceMetrics;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const LISTINGS_TABLE: &str = "listings";
pub const AUDIT_TABLE: &str = "listing_audit";
pub const IDEMPOTENCY_TABLE: &str = "idempotency";

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub cert_client: Option<ServiceClient>,
    pub recon_client: Option<ServiceClient>,
    pub risk_client: Option<ServiceClient>,
    pub dispute_client: Option<ServiceClient>,
    pub metrics: Arc<ServiceMetrics>,
    /// Serializes individual idempotency-check-then-persist sequences that
    /// don't carry their own per-key lock (e.g. listing creation).
    pub write_lock: Arc<Mutex<()>>,
    /// Per-(action,key) locks for the idempotent escrow mutations (spec §5:
    /// "idempotency keys on marketplace mutations serialize duplicate
    /// attempts at the application level"). Keyed on `"{action}:{key}"`;
    /// held across the full check-act-write span of a single request, not
    /// just its storage touches, so two concurrent requests sharing a key
    /// can't both pass the idempotency check and race to persist.
    pub key_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    /// Returns the mutex guarding `action:key`, creating it on first use.
    pub fn key_lock(&self, action: &str, key: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(format!("{action}:{key}"))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

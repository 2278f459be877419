//! Per-listing audit log, and best-effort fan-out of each persisted audit
//! event to the risk engine (spec §4.H: "each persisted audit event is
//! posted to the risk engine... failure silent").

use crate::state::{AppState, AUDIT_TABLE};
use dgc_client::BEST_EFFORT_DEADLINE;
use dgc_storage::Write;
use dgc_trust::AppError;
use dgc_types::error::StorageError;
use dgc_types::listing::{ListingAuditEvent, ListingAuditType, MarketplaceListing};
use dgc_types::time::now_iso;
use serde_json::json;

fn storage_error(e: impl std::fmt::Display) -> AppError {
    StorageError::Backend(e.to_string()).into()
}

pub fn load_audit(state: &AppState, listing_id: &str) -> Result<Vec<ListingAuditEvent>, AppError> {
    state
        .store
        .get::<Vec<ListingAuditEvent>>(AUDIT_TABLE, listing_id)
        .map(|opt| opt.unwrap_or_default())
        .map_err(storage_error)
}

/// Builds the `Write` that appends `event_type` to `listing_id`'s audit log;
/// the caller folds this into the same `write_batch` as the listing/
/// idempotency writes so both land in one transaction.
pub fn append_write(
    state: &AppState,
    listing: &MarketplaceListing,
    event_type: ListingAuditType,
    actor: Option<String>,
    details: Option<serde_json::Value>,
) -> Result<(Write<'static>, ListingAuditEvent), AppError> {
    let mut audit = load_audit(state, &listing.listing_id)?;
    let event = ListingAuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        listing_id: listing.listing_id.clone(),
        cert_id: listing.cert_id.clone(),
        event_type,
        actor,
        occurred_at: now_iso(),
        details,
    };
    audit.push(event.clone());
    let write = Write::new(AUDIT_TABLE, listing.listing_id.clone(), &audit).map_err(|e| StorageError::Codec(e.to_string()))?;
    Ok((write, event))
}

pub fn fan_out(state: &AppState, listing: &MarketplaceListing, event: &ListingAuditEvent) {
    let Some(risk_client) = state.risk_client.clone() else {
        return;
    };
    let body = json!({ "auditEvent": event, "listing": listing });
    tokio::spawn(async move {
        if let Err(e) = risk_client.post("/ingest/listing-audit-event", &body, BEST_EFFORT_DEADLINE).await {
            tracing::debug!(error = %e, "risk engine audit fan-out failed (best-effort)");
        }
    });
}

use crate::idempotency::{self, IdempotencyCheck};
use crate::state::{AppState, LISTINGS_TABLE};
use crate::{audit, cert_client, freeze};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dgc_client::PRIMARY_DEADLINE;
use dgc_storage::Write;
use dgc_trust::AppError;
use dgc_types::error::{MarketplaceError, StorageError};
use dgc_types::listing::{ListingAuditEvent, ListingAuditType, ListingStatus, MarketplaceListing};
use dgc_types::time::now_iso;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn storage_error(e: impl std::fmt::Display) -> AppError {
    StorageError::Backend(e.to_string()).into()
}

fn idempotency_key(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| MarketplaceError::MissingIdempotencyKey.into())
}

fn load_listing(state: &AppState, listing_id: &str) -> Result<MarketplaceListing, AppError> {
    let listing: Option<MarketplaceListing> = state.store.get(LISTINGS_TABLE, listing_id).map_err(storage_error)?;
    listing.ok_or_else(|| MarketplaceError::ListingNotFound(listing_id.to_string()).into())
}

fn listing_write(listing: &MarketplaceListing) -> Result<Write<'static>, AppError> {
    Write::new(LISTINGS_TABLE, listing.listing_id.clone(), listing).map_err(|e| StorageError::Codec(e.to_string()).into())
}

// --- create ---

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    #[serde(rename = "certId")]
    pub cert_id: String,
    pub seller: String,
    #[serde(rename = "askPrice")]
    pub ask_price: String,
}

pub async fn create_listing(
    State(state): State<AppState>,
    Json(req): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<MarketplaceListing>), AppError> {
    freeze::check(state.recon_client.as_ref()).await?;

    let cert_client = state
        .cert_client
        .as_ref()
        .ok_or_else(|| MarketplaceError::CertificateServiceUnreachable("certificate service not configured".to_string()))?;
    let certificate = cert_client::get_certificate(cert_client, &req.cert_id).await?;

    if certificate.payload.owner != req.seller {
        return Err(MarketplaceError::OwnerMismatch.into());
    }
    if certificate.payload.status != dgc_types::certificate::CertStatus::Active {
        return Err(MarketplaceError::StateConflict.into());
    }

    let now = now_iso();
    let listing = MarketplaceListing {
        listing_id: format!("LST-{}", uuid::Uuid::new_v4().simple()),
        cert_id: req.cert_id,
        seller: req.seller,
        ask_price: req.ask_price,
        status: ListingStatus::Open,
        created_at: now.clone(),
        updated_at: now,
        locked_by: None,
        locked_at: None,
        settled_at: None,
        settled_price: None,
        cancelled_at: None,
        cancel_reason: None,
        under_dispute: false,
        dispute_id: None,
        dispute_status: None,
        dispute_opened_at: None,
        dispute_resolved_at: None,
    };

    let audit_event = {
        let _guard = state.write_lock.lock().await;
        let (audit_write, audit_event) = audit::append_write(&state, &listing, ListingAuditType::Created, Some(listing.seller.clone()), None)?;
        state
            .store
            .write_batch(vec![listing_write(&listing)?, audit_write])
            .map_err(storage_error)?;
        audit_event
    };
    audit::fan_out(&state, &listing, &audit_event);

    Ok((StatusCode::CREATED, Json(listing)))
}

// --- reads ---

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MarketplaceListing>>, AppError> {
    let mut all: Vec<(String, MarketplaceListing)> = state.store.scan(LISTINGS_TABLE).map_err(storage_error)?;
    all.sort_by(|a, b| b.1.updated_at.cmp(&a.1.updated_at));
    let mut listings: Vec<MarketplaceListing> = all.into_iter().map(|(_, v)| v).collect();
    if let Some(status) = query.status {
        let wanted = status.to_uppercase();
        listings.retain(|l| l.status.as_str() == wanted);
    }
    Ok(Json(listings))
}

pub async fn get_listing(State(state): State<AppState>, Path(listing_id): Path<String>) -> Result<Json<MarketplaceListing>, AppError> {
    Ok(Json(load_listing(&state, &listing_id)?))
}

pub async fn get_audit(State(state): State<AppState>, Path(listing_id): Path<String>) -> Result<Json<Vec<ListingAuditEvent>>, AppError> {
    load_listing(&state, &listing_id)?;
    Ok(Json(audit::load_audit(&state, &listing_id)?))
}

// --- lock ---

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LockEscrowRequest {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    pub buyer: String,
}

pub async fn lock_escrow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let key = idempotency_key(&headers)?;
    let req: LockEscrowRequest = serde_json::from_value(raw.clone()).map_err(|e| MarketplaceError::InvalidRequest(e.to_string()))?;

    let lock = state.key_lock("lock", &key);
    let _key_guard = lock.lock().await;

    let request_hash = match idempotency::check(&state, "lock", &key, &raw)? {
        IdempotencyCheck::Replay { status, body } => return Ok((status, Json(body))),
        IdempotencyCheck::Fresh { request_hash } => request_hash,
    };

    freeze::check(state.recon_client.as_ref()).await?;

    let mut listing = load_listing(&state, &req.listing_id)?;
    if listing.status != ListingStatus::Open {
        return Err(MarketplaceError::StateConflict.into());
    }

    let cert_client = state
        .cert_client
        .as_ref()
        .ok_or_else(|| MarketplaceError::CertificateServiceUnreachable("certificate service not configured".to_string()))?;
    cert_client::set_status(cert_client, &listing.cert_id, "LOCKED").await?;

    listing.status = ListingStatus::Locked;
    listing.locked_by = Some(req.buyer.clone());
    listing.locked_at = Some(now_iso());
    listing.updated_at = now_iso();

    let response_body = json!({ "listing": listing });

    let (audit_write, audit_event) = audit::append_write(&state, &listing, ListingAuditType::Locked, Some(req.buyer), None)?;
    let idem_write = idempotency::record_write("lock", &key, request_hash, StatusCode::OK, &response_body)?;
    state
        .store
        .write_batch(vec![listing_write(&listing)?, audit_write, idem_write])
        .map_err(storage_error)?;
    drop(_key_guard);

    audit::fan_out(&state, &listing, &audit_event);
    Ok((StatusCode::OK, Json(response_body)))
}

// --- settle ---

#[derive(Debug, Deserialize)]
pub struct SettleEscrowRequest {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    pub buyer: String,
    #[serde(default, rename = "settledPrice")]
    pub settled_price: Option<String>,
}

pub async fn settle_escrow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let key = idempotency_key(&headers)?;
    let req: SettleEscrowRequest = serde_json::from_value(raw.clone()).map_err(|e| MarketplaceError::InvalidRequest(e.to_string()))?;

    let lock = state.key_lock("settle", &key);
    let _key_guard = lock.lock().await;

    let request_hash = match idempotency::check(&state, "settle", &key, &raw)? {
        IdempotencyCheck::Replay { status, body } => return Ok((status, Json(body))),
        IdempotencyCheck::Fresh { request_hash } => request_hash,
    };

    freeze::check(state.recon_client.as_ref()).await?;

    let mut listing = load_listing(&state, &req.listing_id)?;
    if listing.status != ListingStatus::Locked {
        return Err(MarketplaceError::StateConflict.into());
    }
    if listing.locked_by.as_deref() != Some(req.buyer.as_str()) {
        return Err(MarketplaceError::BuyerMismatch.into());
    }

    let cert_client = state
        .cert_client
        .as_ref()
        .ok_or_else(|| MarketplaceError::CertificateServiceUnreachable("certificate service not configured".to_string()))?;

    cert_client::set_status(cert_client, &listing.cert_id, "ACTIVE").await?;

    let price = req.settled_price.clone().unwrap_or_else(|| listing.ask_price.clone());
    let transfer_result = cert_client::transfer(cert_client, &listing.cert_id, &req.buyer, Some(&price)).await;

    let certificate = match transfer_result {
        Ok(certificate) => certificate,
        Err(transfer_err) => {
            // Best-effort compensating rollback: LOCKED was unlocked to ACTIVE
            // above so the transfer could run; if the transfer itself fails
            // we try to put the certificate back to LOCKED. Its own failure
            // is swallowed; the original transfer error is what's surfaced.
            if let Err(rollback_err) = cert_client::set_status(cert_client, &listing.cert_id, "LOCKED").await {
                tracing::warn!(error = %rollback_err, "compensating rollback to LOCKED failed after settle transfer error");
            }
            return Err(transfer_err);
        }
    };

    listing.status = ListingStatus::Settled;
    listing.settled_at = Some(now_iso());
    listing.settled_price = Some(price);
    listing.updated_at = now_iso();

    let response_body = json!({ "listing": listing, "transfer": certificate });

    let (audit_write, audit_event) = audit::append_write(&state, &listing, ListingAuditType::Settled, Some(req.buyer), None)?;
    let idem_write = idempotency::record_write("settle", &key, request_hash, StatusCode::OK, &response_body)?;
    state
        .store
        .write_batch(vec![listing_write(&listing)?, audit_write, idem_write])
        .map_err(storage_error)?;
    drop(_key_guard);

    audit::fan_out(&state, &listing, &audit_event);
    Ok((StatusCode::OK, Json(response_body)))
}

// --- cancel ---

#[derive(Debug, Deserialize)]
pub struct CancelEscrowRequest {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn cancel_escrow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let key = idempotency_key(&headers)?;
    let req: CancelEscrowRequest = serde_json::from_value(raw.clone()).map_err(|e| MarketplaceError::InvalidRequest(e.to_string()))?;

    let lock = state.key_lock("cancel", &key);
    let _key_guard = lock.lock().await;

    let request_hash = match idempotency::check(&state, "cancel", &key, &raw)? {
        IdempotencyCheck::Replay { status, body } => return Ok((status, Json(body))),
        IdempotencyCheck::Fresh { request_hash } => request_hash,
    };

    // Cancel is deliberately not freeze-gated (spec §4.H) so escrows can unwind.
    let mut listing = load_listing(&state, &req.listing_id)?;
    if listing.status.is_terminal() {
        return Err(MarketplaceError::StateConflict.into());
    }

    let actor = listing.locked_by.clone().unwrap_or_else(|| listing.seller.clone());

    if listing.status == ListingStatus::Locked {
        if let Some(cert_client) = state.cert_client.as_ref() {
            cert_client::set_status(cert_client, &listing.cert_id, "ACTIVE").await?;
        }
    }

    listing.status = ListingStatus::Cancelled;
    listing.cancelled_at = Some(now_iso());
    listing.cancel_reason = req.reason.clone();
    listing.updated_at = now_iso();

    let response_body = json!({ "listing": listing });

    let (audit_write, audit_event) = audit::append_write(&state, &listing, ListingAuditType::Cancelled, Some(actor), req.reason.map(|r| json!({ "reason": r })))?;
    let idem_write = idempotency::record_write("cancel", &key, request_hash, StatusCode::OK, &response_body)?;
    state
        .store
        .write_batch(vec![listing_write(&listing)?, audit_write, idem_write])
        .map_err(storage_error)?;
    drop(_key_guard);

    audit::fan_out(&state, &listing, &audit_event);
    Ok((StatusCode::OK, Json(response_body)))
}

// --- dispute ---

#[derive(Debug, Deserialize)]
pub struct OpenDisputeRequest {
    #[serde(rename = "openedBy")]
    pub opened_by: String,
    pub reason: String,
    #[serde(default)]
    pub evidence: Option<String>,
}

pub async fn open_dispute(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
    Json(req): Json<OpenDisputeRequest>,
) -> Result<Json<Value>, AppError> {
    let mut listing = load_listing(&state, &listing_id)?;
    if listing.status != ListingStatus::Settled {
        return Err(MarketplaceError::StateConflict.into());
    }
    if listing.under_dispute {
        return Err(MarketplaceError::DisputeAlreadyOpen.into());
    }

    let dispute_client = state
        .dispute_client
        .as_ref()
        .ok_or_else(|| MarketplaceError::DisputeServiceError("dispute service not configured".to_string()))?;

    let body = json!({
        "listingId": listing.listing_id,
        "certId": listing.cert_id,
        "openedBy": req.opened_by,
        "reason": req.reason,
        "evidence": req.evidence,
    });
    let resp = dispute_client
        .post("/disputes/open", &body, PRIMARY_DEADLINE)
        .await
        .map_err(|e| MarketplaceError::DisputeServiceError(e.to_string()))?;
    if !resp.is_success() {
        return Err(MarketplaceError::DisputeServiceError(format!("dispute service returned status {}", resp.status)).into());
    }

    let now = now_iso();
    let dispute_id = resp.body.get("disputeId").and_then(|v| v.as_str()).map(|s| s.to_string());
    listing.under_dispute = true;
    listing.dispute_id = dispute_id;
    listing.dispute_status = Some("OPEN".to_string());
    listing.dispute_opened_at = Some(now.clone());
    listing.updated_at = now;

    let response_body = json!({ "listing": listing, "dispute": resp.body });

    let _guard = state.write_lock.lock().await;
    let (audit_write, audit_event) = audit::append_write(&state, &listing, ListingAuditType::DisputeOpened, Some(req.opened_by), None)?;
    state
        .store
        .write_batch(vec![listing_write(&listing)?, audit_write])
        .map_err(storage_error)?;
    drop(_guard);

    audit::fan_out(&state, &listing, &audit_event);
    Ok(Json(response_body))
}

use crate::heuristics::{score_certificate, score_listing};
use crate::state::{
    AppState, ALERTS_ALL_KEY, ALERTS_TABLE, CERT_PROFILE_TABLE, LEDGER_EVENTS_TABLE, LISTING_AUDIT_ALL_KEY, LISTING_AUDIT_TABLE, LISTING_PROFILE_TABLE,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use dgc_client::BEST_EFFORT_DEADLINE;
use dgc_trust::AppError;
use dgc_types::error::{RiskError, StorageError};
use dgc_types::ledger_event::LedgerEvent;
use dgc_types::listing::ListingAuditEvent;
use dgc_types::risk::{CertificateRiskProfile, ListingRiskProfile, RiskAlert, RiskLevel, RiskTargetType};
use dgc_types::time::now_iso;
use serde::Deserialize;
use serde_json::{json, Value};

fn storage_error(e: impl std::fmt::Display) -> AppError {
    StorageError::Backend(e.to_string()).into()
}

fn load_cert_events(state: &AppState, cert_id: &str) -> Result<Vec<LedgerEvent>, AppError> {
    state.store.get::<Vec<LedgerEvent>>(LEDGER_EVENTS_TABLE, cert_id).map(|o| o.unwrap_or_default()).map_err(storage_error)
}

fn load_all_audit(state: &AppState) -> Result<Vec<ListingAuditEvent>, AppError> {
    state.store.get::<Vec<ListingAuditEvent>>(LISTING_AUDIT_TABLE, LISTING_AUDIT_ALL_KEY).map(|o| o.unwrap_or_default()).map_err(storage_error)
}

fn load_alerts(state: &AppState) -> Result<Vec<RiskAlert>, AppError> {
    state.store.get::<Vec<RiskAlert>>(ALERTS_TABLE, ALERTS_ALL_KEY).map(|o| o.unwrap_or_default()).map_err(storage_error)
}

fn append_alert(state: &AppState, alert: RiskAlert) -> Result<(), AppError> {
    let mut alerts = load_alerts(state)?;
    alerts.push(alert);
    state.store.put(ALERTS_TABLE, ALERTS_ALL_KEY, &alerts).map_err(storage_error)
}

fn fan_out_webhook(state: &AppState, alert: &RiskAlert) {
    let Some(client) = state.webhook_client.clone() else {
        return;
    };
    let body = json!(alert);
    tokio::spawn(async move {
        if let Err(e) = client.post("", &body, BEST_EFFORT_DEADLINE).await {
            tracing::debug!(error = %e, "risk alert webhook fan-out failed (best-effort)");
        }
    });
}

/// Recomputes the certificate profile, emitting an edge-triggered alert when
/// the score crosses `threshold` upward from below (spec §4.E).
fn recompute_certificate(state: &AppState, cert_id: &str) -> Result<CertificateRiskProfile, AppError> {
    let events = load_cert_events(state, cert_id)?;
    let all_audit = load_all_audit(state)?;
    let cancellations: Vec<ListingAuditEvent> = all_audit
        .into_iter()
        .filter(|e| e.cert_id == cert_id && e.event_type == dgc_types::listing::ListingAuditType::Cancelled)
        .collect();

    let previous: Option<CertificateRiskProfile> = state.store.get(CERT_PROFILE_TABLE, cert_id).map_err(storage_error)?;
    let profile = score_certificate(cert_id, &events, &cancellations, Utc::now());

    let crossed = profile.score >= state.alert_threshold && previous.as_ref().map(|p| p.score).unwrap_or(0) < state.alert_threshold;
    state.store.put(CERT_PROFILE_TABLE, cert_id, &profile).map_err(storage_error)?;

    if crossed {
        let alert = RiskAlert {
            alert_id: format!("ALERT-CERT-{}-{}", cert_id, uuid::Uuid::new_v4().simple()),
            target_type: RiskTargetType::Certificate,
            target_id: cert_id.to_string(),
            score: profile.score,
            level: profile.level,
            reasons: profile.reasons.clone(),
            created_at: now_iso(),
        };
        append_alert(state, alert.clone())?;
        fan_out_webhook(state, &alert);
    }

    Ok(profile)
}

fn recompute_listing(state: &AppState, listing_id: &str, cert_id: Option<&str>) -> Result<ListingRiskProfile, AppError> {
    let all_audit = load_all_audit(state)?;
    let listing_audit: Vec<ListingAuditEvent> = all_audit.iter().filter(|e| e.listing_id == listing_id).cloned().collect();

    let previous: Option<ListingRiskProfile> = state.store.get(LISTING_PROFILE_TABLE, listing_id).map_err(storage_error)?;
    let profile = score_listing(listing_id, cert_id, &listing_audit, &all_audit, Utc::now());

    let crossed = profile.score >= state.alert_threshold && previous.as_ref().map(|p| p.score).unwrap_or(0) < state.alert_threshold;
    state.store.put(LISTING_PROFILE_TABLE, listing_id, &profile).map_err(storage_error)?;

    if crossed {
        let alert = RiskAlert {
            alert_id: format!("ALERT-LISTING-{}-{}", listing_id, uuid::Uuid::new_v4().simple()),
            target_type: RiskTargetType::Listing,
            target_id: listing_id.to_string(),
            score: profile.score,
            level: profile.level,
            reasons: profile.reasons.clone(),
            created_at: now_iso(),
        };
        append_alert(state, alert.clone())?;
        fan_out_webhook(state, &alert);
    }

    Ok(profile)
}

pub async fn ingest_ledger_event(State(state): State<AppState>, Json(event): Json<LedgerEvent>) -> Result<StatusCode, AppError> {
    let cert_id = event.cert_id().to_string();
    let _guard = state.write_lock.lock().await;
    let mut events = load_cert_events(&state, &cert_id)?;
    events.push(event);
    state.store.put(LEDGER_EVENTS_TABLE, &cert_id, &events).map_err(storage_error)?;
    recompute_certificate(&state, &cert_id)?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
pub struct IngestAuditRequest {
    #[serde(rename = "auditEvent")]
    pub audit_event: ListingAuditEvent,
}

pub async fn ingest_listing_audit_event(State(state): State<AppState>, Json(req): Json<IngestAuditRequest>) -> Result<StatusCode, AppError> {
    let event = req.audit_event;
    let listing_id = event.listing_id.clone();
    let cert_id = event.cert_id.clone();

    let _guard = state.write_lock.lock().await;
    let mut all_audit = load_all_audit(&state)?;
    all_audit.push(event);
    state.store.put(LISTING_AUDIT_TABLE, LISTING_AUDIT_ALL_KEY, &all_audit).map_err(storage_error)?;

    recompute_listing(&state, &listing_id, Some(&cert_id))?;
    recompute_certificate(&state, &cert_id)?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
pub struct IngestReconciliationAlertRequest {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "absMismatchGram")]
    pub abs_mismatch_gram: String,
    #[serde(rename = "thresholdGram")]
    pub threshold_gram: String,
}

pub async fn ingest_reconciliation_alert(State(state): State<AppState>, Json(req): Json<IngestReconciliationAlertRequest>) -> Result<StatusCode, AppError> {
    let abs_mismatch = dgc_types::amount::ScaledAmount::parse(&req.abs_mismatch_gram).map_err(|e| RiskError::InvalidEvent(e.to_string()))?;
    let threshold = dgc_types::amount::ScaledAmount::parse(&req.threshold_gram).map_err(|e| RiskError::InvalidEvent(e.to_string()))?;

    let ratio = if threshold.0 == 0 { 100.0 } else { (abs_mismatch.0 as f64 / threshold.0 as f64) * 100.0 };
    let score = ratio.clamp(0.0, 100.0).round() as u32;

    let alert = RiskAlert {
        alert_id: format!("ALERT-RECON-{}", req.run_id),
        target_type: RiskTargetType::Reconciliation,
        target_id: req.run_id,
        score,
        level: RiskLevel::from_score(score),
        reasons: Vec::new(),
        created_at: now_iso(),
    };

    let _guard = state.write_lock.lock().await;
    append_alert(&state, alert.clone())?;
    drop(_guard);

    fan_out_webhook(&state, &alert);
    Ok(StatusCode::ACCEPTED)
}

pub async fn get_certificate_profile(State(state): State<AppState>, Path(cert_id): Path<String>) -> Result<Json<CertificateRiskProfile>, AppError> {
    let profile: Option<CertificateRiskProfile> = state.store.get(CERT_PROFILE_TABLE, &cert_id).map_err(storage_error)?;
    profile.map(Json).ok_or_else(|| RiskError::ProfileNotFound(cert_id).into())
}

pub async fn get_listing_profile(State(state): State<AppState>, Path(listing_id): Path<String>) -> Result<Json<ListingRiskProfile>, AppError> {
    let profile: Option<ListingRiskProfile> = state.store.get(LISTING_PROFILE_TABLE, &listing_id).map_err(storage_error)?;
    profile.map(Json).ok_or_else(|| RiskError::ProfileNotFound(listing_id).into())
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

pub async fn summary(State(state): State<AppState>, Query(query): Query<LimitQuery>) -> Result<Json<Value>, AppError> {
    let limit = query.limit.unwrap_or(10);

    let mut certificates: Vec<CertificateRiskProfile> = state.store.scan(CERT_PROFILE_TABLE).map_err(storage_error)?.into_iter().map(|(_, v)| v).collect();
    certificates.sort_by(|a, b| b.score.cmp(&a.score));
    certificates.truncate(limit);

    let mut listings: Vec<ListingRiskProfile> = state.store.scan(LISTING_PROFILE_TABLE).map_err(storage_error)?.into_iter().map(|(_, v)| v).collect();
    listings.sort_by(|a, b| b.score.cmp(&a.score));
    listings.truncate(limit);

    Ok(Json(json!({ "certificates": certificates, "listings": listings })))
}

pub async fn alerts(State(state): State<AppState>, Query(query): Query<LimitQuery>) -> Result<Json<Vec<RiskAlert>>, AppError> {
    let limit = query.limit.unwrap_or(50);
    let mut all = load_alerts(&state)?;
    all.reverse();
    all.truncate(limit);
    Ok(Json(all))
}

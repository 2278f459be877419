use crate::state::{AppState, DISPUTES_TABLE};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dgc_trust::AppError;
use dgc_types::dispute::{DisputeRecord, DisputeResolution, DisputeStatus};
use dgc_types::error::{DisputeError, StorageError};
use dgc_types::time::now_iso;
use serde::Deserialize;

fn storage_error(e: impl std::fmt::Display) -> AppError {
    StorageError::Backend(e.to_string()).into()
}

fn load_dispute(state: &AppState, dispute_id: &str) -> Result<DisputeRecord, AppError> {
    let record: Option<DisputeRecord> = state.store.get(DISPUTES_TABLE, dispute_id).map_err(storage_error)?;
    record.ok_or_else(|| DisputeError::NotFound(dispute_id.to_string()).into())
}

fn persist_dispute(state: &AppState, record: &DisputeRecord) -> Result<(), AppError> {
    state.store.put(DISPUTES_TABLE, &record.dispute_id, record).map_err(storage_error)
}

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    #[serde(rename = "certId")]
    pub cert_id: String,
    #[serde(rename = "openedBy")]
    pub opened_by: String,
    pub reason: String,
    #[serde(default)]
    pub evidence: Option<String>,
}

pub async fn open(State(state): State<AppState>, Json(req): Json<OpenRequest>) -> Result<(StatusCode, Json<DisputeRecord>), AppError> {
    if req.opened_by.trim().is_empty() || req.reason.trim().is_empty() {
        return Err(DisputeError::InvalidRequest("openedBy and reason are required".to_string()).into());
    }
    let dispute_id = format!("DSP-{}", uuid::Uuid::new_v4().simple());
    let record = DisputeRecord {
        dispute_id,
        listing_id: req.listing_id,
        cert_id: req.cert_id,
        status: DisputeStatus::Open,
        opened_by: req.opened_by,
        reason: req.reason,
        evidence: req.evidence,
        opened_at: now_iso(),
        assigned_to: None,
        assigned_at: None,
        resolved_by: None,
        resolved_at: None,
        resolution: None,
        resolution_notes: None,
    };

    let _guard = state.write_lock.lock().await;
    persist_dispute(&state, &record)?;
    drop(_guard);

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[serde(rename = "assignedBy")]
    pub assigned_by: String,
    pub assignee: String,
}

pub async fn assign(
    State(state): State<AppState>,
    Path(dispute_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AssignRequest>,
) -> Result<Json<DisputeRecord>, AppError> {
    dgc_trust::require_governance_role(&headers, &state.assign_allowed_roles)?;
    dgc_trust::require_actor_consistency(&headers, &req.assigned_by)?;

    let _guard = state.write_lock.lock().await;
    let mut record = load_dispute(&state, &dispute_id)?;
    if record.status == DisputeStatus::Resolved {
        return Err(DisputeError::AlreadyResolved.into());
    }
    record.status = DisputeStatus::Assigned;
    record.assigned_to = Some(req.assignee);
    record.assigned_at = Some(now_iso());
    persist_dispute(&state, &record)?;
    drop(_guard);

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(rename = "resolvedBy")]
    pub resolved_by: String,
    pub resolution: DisputeResolution,
    #[serde(default, rename = "resolutionNotes")]
    pub resolution_notes: Option<String>,
}

pub async fn resolve(
    State(state): State<AppState>,
    Path(dispute_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<DisputeRecord>, AppError> {
    dgc_trust::require_governance_role(&headers, &state.resolve_allowed_roles)?;
    dgc_trust::require_actor_consistency(&headers, &req.resolved_by)?;

    let _guard = state.write_lock.lock().await;
    let mut record = load_dispute(&state, &dispute_id)?;
    if record.status == DisputeStatus::Resolved {
        return Err(DisputeError::AlreadyResolved.into());
    }
    record.status = DisputeStatus::Resolved;
    record.resolved_by = Some(req.resolved_by);
    record.resolved_at = Some(now_iso());
    record.resolution = Some(req.resolution);
    record.resolution_notes = req.resolution_notes;
    persist_dispute(&state, &record)?;
    drop(_guard);

    Ok(Json(record))
}

pub async fn get_dispute(State(state): State<AppState>, Path(dispute_id): Path<String>) -> Result<Json<DisputeRecord>, AppError> {
    Ok(Json(load_dispute(&state, &dispute_id)?))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Result<Json<Vec<DisputeRecord>>, AppError> {
    let mut records: Vec<DisputeRecord> = state
        .store
        .scan::<DisputeRecord>(DISPUTES_TABLE)
        .map_err(storage_error)?
        .into_iter()
        .map(|(_, v)| v)
        .collect();

    if let Some(status) = query.status.as_deref() {
        let wanted = match status.to_uppercase().as_str() {
            "OPEN" => DisputeStatus::Open,
            "ASSIGNED" => DisputeStatus::Assigned,
            "RESOLVED" => DisputeStatus::Resolved,
            _ => return Err(DisputeError::InvalidRequest(format!("invalid status filter: {status}")).into()),
        };
        records.retain(|r| r.status == wanted);
    }

    records.sort_by(|a, b| a.opened_at.cmp(&b.opened_at));
    Ok(Json(records))
}

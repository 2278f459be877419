use crate::state::{AppState, PROOFS_TABLE, TIMELINE_TABLE};
use axum::{
    extract::{Path, State},
    Json,
};
use dgc_client::BEST_EFFORT_DEADLINE;
use dgc_trust::AppError;
use dgc_types::certificate::ProofAnchor;
use dgc_types::error::{LedgerError, StorageError};
use dgc_types::ledger_event::LedgerEvent;
use dgc_types::time::now_iso;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct AnchorRequest {
    #[serde(rename = "certId")]
    pub cert_id: String,
    #[serde(rename = "payloadHash")]
    pub payload_hash: String,
    #[serde(rename = "occurredAt")]
    pub occurred_at: String,
}

pub async fn anchor(
    State(state): State<AppState>,
    Json(req): Json<AnchorRequest>,
) -> Result<Json<ProofAnchor>, AppError> {
    let anchored_at = now_iso();
    let proof_hash = dgc_crypto::hash_canonical(&json!({
        "certId": req.cert_id,
        "payloadHash": req.payload_hash,
        "occurredAt": req.occurred_at,
        "anchoredAt": anchored_at,
    }))
    .map_err(|e| AppError::bad_request(e.to_string()))?;

    let record = ProofAnchor {
        cert_id: req.cert_id.clone(),
        payload_hash: req.payload_hash,
        proof_hash,
        anchored_at,
    };
    state.store.put(PROOFS_TABLE, &req.cert_id, &record).map_err(|e| StorageError::Backend(e.to_string()))?;
    Ok(Json(record))
}

pub async fn get_proof(
    State(state): State<AppState>,
    Path(cert_id): Path<String>,
) -> Result<Json<ProofAnchor>, AppError> {
    let record: Option<ProofAnchor> = state.store.get(PROOFS_TABLE, &cert_id).map_err(|e| StorageError::Backend(e.to_string()))?;
    record.map(Json).ok_or_else(|| LedgerError::ProofNotFound(cert_id).into())
}

fn load_timeline(state: &AppState, cert_id: &str) -> Result<Vec<LedgerEvent>, AppError> {
    state
        .store
        .get::<Vec<LedgerEvent>>(TIMELINE_TABLE, cert_id)
        .map(|opt| opt.unwrap_or_default())
        .map_err(|e| StorageError::Backend(e.to_string()).into())
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub event: LedgerEvent,
    #[serde(rename = "eventHash")]
    pub event_hash: String,
    #[serde(rename = "ledgerTxRef", skip_serializing_if = "Option::is_none")]
    pub ledger_tx_ref: Option<String>,
}

/// Validates shape per variant per spec §4.C: every `LedgerEvent` variant
/// already enforces its own required fields structurally, so the only
/// residual shape check is that string fields used downstream aren't empty.
fn validate_event(event: &LedgerEvent) -> Result<(), AppError> {
    if event.cert_id().trim().is_empty() {
        return Err(LedgerError::InvalidEvent("certId must not be empty".to_string()).into());
    }
    if event.occurred_at().trim().is_empty() {
        return Err(LedgerError::InvalidEvent("occurredAt must not be empty".to_string()).into());
    }
    Ok(())
}

pub async fn record_event(
    State(state): State<AppState>,
    Json(event): Json<LedgerEvent>,
) -> Result<Json<RecordResponse>, AppError> {
    validate_event(&event)?;

    let ledger_tx_ref = if let Some(chain_writer) = &state.chain_writer {
        match chain_writer.write_event(&event).await {
            Ok(tx_ref) => Some(tx_ref),
            Err(e) => {
                return Err(LedgerError::ChainWriteFailed(e.to_string()).into());
            }
        }
    } else {
        None
    };

    let event_hash = dgc_crypto::hash_canonical(&event).map_err(|e| AppError::bad_request(e.to_string()))?;

    {
        let _guard = state.write_lock.lock().await;
        let cert_id = event.cert_id().to_string();
        let mut timeline = load_timeline(&state, &cert_id)?;
        timeline.push(event.clone());
        state
            .store
            .put(TIMELINE_TABLE, &cert_id, &timeline)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        if let Some(child_cert_id) = event.child_cert_id() {
            let mut child_timeline = load_timeline(&state, child_cert_id)?;
            child_timeline.push(event.clone());
            state
                .store
                .put(TIMELINE_TABLE, child_cert_id, &child_timeline)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
    }

    if let Some(risk_client) = &state.risk_client {
        let body = serde_json::to_value(&event).unwrap_or(serde_json::Value::Null);
        let client = risk_client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post("/ingest/ledger-event", &body, BEST_EFFORT_DEADLINE).await {
                tracing::debug!(error = %e, "risk engine fan-out failed (best-effort)");
            }
        });
    }

    Ok(Json(RecordResponse {
        event,
        event_hash,
        ledger_tx_ref,
    }))
}

pub async fn get_timeline(
    State(state): State<AppState>,
    Path(cert_id): Path<String>,
) -> Result<Json<Vec<LedgerEvent>>, AppError> {
    Ok(Json(load_timeline(&state, &cert_id)?))
}

pub async fn chain_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = match &state.chain_writer {
        Some(writer) => writer.status().await,
        None => dgc_chain_sink::ChainStatus::unconfigured(),
    };
    Json(serde_json::to_value(status).unwrap_or(serde_json::Value::Null))
}

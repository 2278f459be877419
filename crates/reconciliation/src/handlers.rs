use crate::state::{AppState, FREEZE_KEY, FREEZE_TABLE, OVERRIDES_ALL_KEY, OVERRIDES_TABLE, RUNS_ALL_KEY, RUNS_TABLE};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use dgc_client::{BEST_EFFORT_DEADLINE, PRIMARY_DEADLINE};
use dgc_trust::AppError;
use dgc_types::amount::ScaledAmount;
use dgc_types::certificate::{CertStatus, SignedCertificate};
use dgc_types::error::{ReconciliationError, StorageError};
use dgc_types::reconciliation::{FreezeOverride, FreezeState, ReconciliationRun};
use dgc_types::time::now_iso;
use serde::Deserialize;
use serde_json::{json, Value};

fn storage_error(e: impl std::fmt::Display) -> AppError {
    StorageError::Backend(e.to_string()).into()
}

fn load_runs(state: &AppState) -> Result<Vec<ReconciliationRun>, AppError> {
    state.store.get::<Vec<ReconciliationRun>>(RUNS_TABLE, RUNS_ALL_KEY).map(|o| o.unwrap_or_default()).map_err(storage_error)
}

fn load_freeze(state: &AppState) -> Result<FreezeState, AppError> {
    let freeze: Option<FreezeState> = state.store.get(FREEZE_TABLE, FREEZE_KEY).map_err(storage_error)?;
    Ok(freeze.unwrap_or_else(|| FreezeState::inactive(&now_iso())))
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default, rename = "inventoryTotalGram")]
    pub inventory_total_gram: Option<String>,
}

pub async fn run(State(state): State<AppState>, Json(req): Json<RunRequest>) -> Result<Json<ReconciliationRun>, AppError> {
    let cert_client = state
        .cert_client
        .as_ref()
        .ok_or_else(|| ReconciliationError::CertificateServiceUnavailable("certificate service not configured".to_string()))?;

    let resp = cert_client
        .get("/certificates", PRIMARY_DEADLINE)
        .await
        .map_err(|e| ReconciliationError::CertificateServiceUnavailable(e.to_string()))?;
    if !resp.is_success() {
        return Err(ReconciliationError::CertificateServiceUnavailable(format!("certificate authority returned status {}", resp.status)).into());
    }
    let certificates: Vec<SignedCertificate> = serde_json::from_value(resp.body).map_err(|e| ReconciliationError::CertificateServiceUnavailable(e.to_string()))?;

    let mut outstanding = ScaledAmount::ZERO;
    let mut active_certificates = 0u64;
    let mut locked_certificates = 0u64;
    for cert in &certificates {
        match cert.payload.status {
            CertStatus::Active | CertStatus::Locked => {
                let amount = ScaledAmount::parse(&cert.payload.amount_gram)
                    .map_err(|e| ReconciliationError::InvalidRequest(format!("certificate {} carries an invalid amount: {e}", cert.payload.cert_id)))?;
                outstanding = outstanding
                    .checked_add(amount)
                    .ok_or_else(|| ReconciliationError::InvalidRequest("outstanding total overflowed".to_string()))?;
                if cert.payload.status == CertStatus::Active {
                    active_certificates += 1;
                } else {
                    locked_certificates += 1;
                }
            }
            _ => {}
        }
    }

    let custody_source = req.inventory_total_gram.or_else(|| state.custody_total_gram.clone()).unwrap_or_else(|| "0.0000".to_string());
    let custody = ScaledAmount::parse(&custody_source).map_err(|e| ReconciliationError::InvalidRequest(e.to_string()))?;
    let threshold = ScaledAmount::parse(&state.mismatch_threshold_gram).map_err(|e| ReconciliationError::InvalidRequest(e.to_string()))?;

    let mismatch_scaled = outstanding.0 as i128 - custody.0 as i128;
    let abs_mismatch_scaled = mismatch_scaled.unsigned_abs() as u64;
    let abs_mismatch = ScaledAmount(abs_mismatch_scaled);
    let freeze_triggered = abs_mismatch.0 >= threshold.0;

    let run_id = format!("RUN-{}", uuid::Uuid::new_v4().simple());
    let record = ReconciliationRun {
        run_id: run_id.clone(),
        created_at: now_iso(),
        custody_total_gram: custody.format(),
        outstanding_total_gram: outstanding.format(),
        mismatch_gram: format_signed(mismatch_scaled),
        abs_mismatch_gram: abs_mismatch.format(),
        threshold_gram: threshold.format(),
        freeze_triggered,
        certificates_evaluated: certificates.len() as u64,
        active_certificates,
        locked_certificates,
    };

    let _guard = state.write_lock.lock().await;
    let mut runs = load_runs(&state)?;
    runs.push(record.clone());
    state.store.put(RUNS_TABLE, RUNS_ALL_KEY, &runs).map_err(storage_error)?;

    let new_freeze = if freeze_triggered {
        FreezeState {
            active: true,
            reason: Some(format!("Mismatch {}g exceeded threshold {}g", abs_mismatch.format(), threshold.format())),
            updated_at: now_iso(),
            last_run_id: Some(run_id.clone()),
        }
    } else {
        FreezeState {
            active: false,
            reason: None,
            updated_at: now_iso(),
            last_run_id: Some(run_id.clone()),
        }
    };
    state.store.put(FREEZE_TABLE, FREEZE_KEY, &new_freeze).map_err(storage_error)?;
    drop(_guard);

    if freeze_triggered {
        if let Some(risk_client) = state.risk_client.clone() {
            let body = json!({
                "runId": record.run_id,
                "absMismatchGram": record.abs_mismatch_gram,
                "thresholdGram": record.threshold_gram,
            });
            tokio::spawn(async move {
                if let Err(e) = risk_client.post("/ingest/reconciliation-alert", &body, BEST_EFFORT_DEADLINE).await {
                    tracing::debug!(error = %e, "risk engine reconciliation-alert fan-out failed (best-effort)");
                }
            });
        }
    }

    Ok(Json(record))
}

fn format_signed(scaled: i128) -> String {
    let sign = if scaled < 0 { "-" } else { "" };
    let amount = ScaledAmount(scaled.unsigned_abs() as u64);
    format!("{sign}{}", amount.format())
}

pub async fn latest(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let runs = load_runs(&state)?;
    let freeze_state = load_freeze(&state)?;
    Ok(Json(json!({ "run": runs.last(), "freezeState": freeze_state })))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

pub async fn history(State(state): State<AppState>, Query(query): Query<LimitQuery>) -> Result<Json<Vec<ReconciliationRun>>, AppError> {
    let limit = query.limit.unwrap_or(100).min(100);
    let mut runs = load_runs(&state)?;
    runs.reverse();
    runs.truncate(limit);
    Ok(Json(runs))
}

#[derive(Debug, Deserialize)]
pub struct UnfreezeRequest {
    pub actor: String,
    pub reason: String,
}

pub async fn unfreeze(State(state): State<AppState>, headers: HeaderMap, Json(req): Json<UnfreezeRequest>) -> Result<Json<FreezeState>, AppError> {
    dgc_trust::require_governance_role(&headers, &state.unfreeze_allowed_roles)?;
    dgc_trust::require_actor_consistency(&headers, &req.actor)?;

    let _guard = state.write_lock.lock().await;
    let current = load_freeze(&state)?;
    if !current.active {
        return Err(ReconciliationError::NotFrozen.into());
    }

    let next = FreezeState {
        active: false,
        reason: Some(format!("Manual unfreeze by {}: {}", req.actor, req.reason)),
        updated_at: now_iso(),
        last_run_id: current.last_run_id.clone(),
    };
    state.store.put(FREEZE_TABLE, FREEZE_KEY, &next).map_err(storage_error)?;

    let mut overrides = state
        .store
        .get::<Vec<FreezeOverride>>(OVERRIDES_TABLE, OVERRIDES_ALL_KEY)
        .map_err(storage_error)?
        .unwrap_or_default();
    overrides.push(FreezeOverride {
        override_id: format!("OVR-{}", uuid::Uuid::new_v4().simple()),
        action: "UNFREEZE".to_string(),
        actor: req.actor,
        reason: req.reason,
        previous_active: true,
        next_active: false,
        created_at: now_iso(),
        run_id: current.last_run_id,
    });
    state.store.put(OVERRIDES_TABLE, OVERRIDES_ALL_KEY, &overrides).map_err(storage_error)?;

    Ok(Json(next))
}

pub async fn overrides(State(state): State<AppState>, Query(query): Query<LimitQuery>) -> Result<Json<Vec<FreezeOverride>>, AppError> {
    let limit = query.limit.unwrap_or(100);
    let mut overrides = state
        .store
        .get::<Vec<FreezeOverride>>(OVERRIDES_TABLE, OVERRIDES_ALL_KEY)
        .map_err(storage_error)?
        .unwrap_or_default();
    overrides.reverse();
    overrides.truncate(limit);
    Ok(Json(overrides))
}

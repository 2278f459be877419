use crate::ledger_client;
use crate::state::{AppState, CERTIFICATES_TABLE};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use dgc_trust::AppError;
use dgc_types::amount::{purity_to_basis_points, ScaledAmount};
use dgc_types::certificate::{CertStatus, GoldCertificatePayload, OutboundOutcome, SignedCertificate};
use dgc_types::error::{CertificateError, StorageError};
use dgc_types::ledger_event::LedgerEvent;
use dgc_types::time::now_iso;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn storage_error(e: impl std::fmt::Display) -> AppError {
    StorageError::Backend(e.to_string()).into()
}

fn generate_cert_id() -> String {
    let stamp: String = now_iso().chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("DGC-{stamp}-{}", &suffix[..8])
}

fn sign_payload(payload: GoldCertificatePayload, issuer_sk_hex: &str) -> Result<SignedCertificate, AppError> {
    let payload_hash =
        dgc_crypto::hash_canonical(&payload).map_err(|e| AppError::bad_request(e.to_string()))?;
    let signature =
        dgc_crypto::sign(&payload_hash, issuer_sk_hex).map_err(|e| AppError::bad_request(e.to_string()))?;
    Ok(SignedCertificate { payload, payload_hash, signature })
}

fn load_certificate(state: &AppState, cert_id: &str) -> Result<SignedCertificate, AppError> {
    let record: Option<SignedCertificate> = state
        .store
        .get(CERTIFICATES_TABLE, cert_id)
        .map_err(storage_error)?;
    record.ok_or_else(|| CertificateError::NotFound(cert_id.to_string()).into())
}

fn persist_certificate(state: &AppState, cert: &SignedCertificate) -> Result<(), AppError> {
    state
        .store
        .put(CERTIFICATES_TABLE, &cert.payload.cert_id, cert)
        .map_err(storage_error)
}

// --- issue ---

#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub owner: String,
    #[serde(rename = "amountGram")]
    pub amount_gram: String,
    pub purity: String,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub certificate: SignedCertificate,
    #[serde(rename = "anchorStatus")]
    pub anchor_status: OutboundOutcome,
    #[serde(rename = "eventStatus")]
    pub event_status: OutboundOutcome,
}

pub async fn issue(
    State(state): State<AppState>,
    Json(req): Json<IssueRequest>,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    ScaledAmount::parse(&req.amount_gram).map_err(|e| CertificateError::InvalidAmount(e.to_string()))?;
    purity_to_basis_points(&req.purity).map_err(|e| CertificateError::InvalidPurity(e.to_string()))?;

    let cert_id = generate_cert_id();
    let issued_at = now_iso();
    let payload = GoldCertificatePayload {
        cert_id: cert_id.clone(),
        issuer: state.issuer_pk_hex.as_str().to_string(),
        owner: req.owner.clone(),
        amount_gram: req.amount_gram.clone(),
        purity: req.purity.clone(),
        issued_at: issued_at.clone(),
        status: CertStatus::Active,
        metadata: req.metadata,
    };
    let signed = sign_payload(payload, &state.issuer_sk_hex)?;

    {
        let _guard = state.write_lock.lock().await;
        persist_certificate(&state, &signed)?;
    }

    let (anchor_status, proof_hash) = ledger_client::anchor(state.ledger_client.as_ref(), &cert_id, &signed.payload_hash, &issued_at).await;
    let mut event = LedgerEvent::Issued {
        cert_id: cert_id.clone(),
        occurred_at: issued_at,
        proof_hash: None,
        owner: req.owner,
        amount_gram: req.amount_gram,
        purity: req.purity,
    };
    event.set_proof_hash(proof_hash);
    let event_status = ledger_client::record(state.ledger_client.as_ref(), &event).await;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse { certificate: signed, anchor_status, event_status }),
    ))
}

pub async fn get_certificate(
    State(state): State<AppState>,
    Path(cert_id): Path<String>,
) -> Result<Json<SignedCertificate>, AppError> {
    Ok(Json(load_certificate(&state, &cert_id)?))
}

pub async fn list_certificates(State(state): State<AppState>) -> Result<Json<Vec<SignedCertificate>>, AppError> {
    let mut all: Vec<(String, SignedCertificate)> = state.store.scan(CERTIFICATES_TABLE).map_err(storage_error)?;
    all.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(Json(all.into_iter().map(|(_, v)| v).collect()))
}

// --- verify ---

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default, rename = "certId")]
    pub cert_id: Option<String>,
    #[serde(default)]
    pub certificate: Option<SignedCertificate>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(rename = "hashMatches")]
    pub hash_matches: bool,
    #[serde(rename = "signatureValid")]
    pub signature_valid: bool,
    pub status: CertStatus,
}

pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let cert = match (req.cert_id, req.certificate) {
        (_, Some(cert)) => cert,
        (Some(cert_id), None) => load_certificate(&state, &cert_id)?,
        (None, None) => return Err(CertificateError::InvalidRequest("either certId or certificate is required".to_string()).into()),
    };

    let recomputed = dgc_crypto::hash_canonical(&cert.payload).unwrap_or_default();
    let hash_matches = recomputed == cert.payload_hash;
    let signature_valid = hash_matches && dgc_crypto::verify(&cert.payload_hash, &cert.signature, &cert.payload.issuer);
    let valid = hash_matches && signature_valid;

    Ok(Json(VerifyResponse { valid, hash_matches, signature_valid, status: cert.payload.status }))
}

// --- transfer ---

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    #[serde(rename = "certId")]
    pub cert_id: String,
    #[serde(rename = "toOwner")]
    pub to_owner: String,
    #[serde(default)]
    pub price: Option<String>,
}

pub async fn transfer(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let _guard = state.write_lock.lock().await;
    let existing = load_certificate(&state, &req.cert_id)?;
    if existing.payload.status != CertStatus::Active {
        return Err(CertificateError::StateConflict {
            from: existing.payload.status.as_str().to_string(),
            to: "LOCKED|REDEEMED|REVOKED".to_string(),
        }
        .into());
    }

    let old_owner = existing.payload.owner.clone();
    let amount_gram = existing.payload.amount_gram.clone();
    let now = now_iso();
    let mut metadata = existing.payload.metadata.unwrap_or_default();
    metadata.insert("lastTransferAt".into(), Value::String(now.clone()));
    if let Some(price) = &req.price {
        metadata.insert("lastTransferPrice".into(), Value::String(price.clone()));
    }

    let mut payload = existing.payload;
    payload.owner = req.to_owner.clone();
    payload.metadata = Some(metadata);
    let signed = sign_payload(payload, &state.issuer_sk_hex)?;
    persist_certificate(&state, &signed)?;
    drop(_guard);

    let (anchor_status, proof_hash) = ledger_client::anchor(state.ledger_client.as_ref(), &req.cert_id, &signed.payload_hash, &now).await;
    let mut event = LedgerEvent::Transfer {
        cert_id: req.cert_id,
        occurred_at: now,
        proof_hash: None,
        from: old_owner,
        to: req.to_owner,
        amount_gram,
        price: req.price,
    };
    event.set_proof_hash(proof_hash);
    let event_status = ledger_client::record(state.ledger_client.as_ref(), &event).await;

    Ok(Json(MutationResponse { certificate: signed, anchor_status, event_status }))
}

// --- split ---

#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    #[serde(rename = "parentCertId")]
    pub parent_cert_id: String,
    #[serde(rename = "toOwner")]
    pub to_owner: String,
    #[serde(rename = "amountChildGram")]
    pub amount_child_gram: String,
    #[serde(default)]
    pub price: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SplitResponse {
    pub parent: SignedCertificate,
    pub child: SignedCertificate,
    #[serde(rename = "anchorStatus")]
    pub anchor_status: OutboundOutcome,
    #[serde(rename = "eventStatus")]
    pub event_status: OutboundOutcome,
}

pub async fn split(
    State(state): State<AppState>,
    Json(req): Json<SplitRequest>,
) -> Result<Json<SplitResponse>, AppError> {
    let _guard = state.write_lock.lock().await;
    let parent_existing = load_certificate(&state, &req.parent_cert_id)?;
    if parent_existing.payload.status != CertStatus::Active {
        return Err(CertificateError::StateConflict {
            from: parent_existing.payload.status.as_str().to_string(),
            to: "ACTIVE required for split".to_string(),
        }
        .into());
    }

    let parent_amount = ScaledAmount::parse(&parent_existing.payload.amount_gram).map_err(|e| CertificateError::InvalidAmount(e.to_string()))?;
    let child_amount = ScaledAmount::parse(&req.amount_child_gram).map_err(|e| CertificateError::InvalidAmount(e.to_string()))?;
    if child_amount.0 == 0 || child_amount.0 >= parent_amount.0 {
        return Err(CertificateError::InvalidAmount("amountChildGram must be > 0 and < parent amountGram".to_string()).into());
    }
    let remainder = parent_amount
        .checked_sub(child_amount)
        .ok_or_else(|| CertificateError::InvalidAmount("amount underflow".to_string()))?;

    let now = now_iso();
    let child_id = generate_cert_id();
    let parent_owner = parent_existing.payload.owner.clone();

    let mut parent_metadata = parent_existing.payload.metadata.clone().unwrap_or_default();
    parent_metadata.insert("lastSplitChildCertId".into(), Value::String(child_id.clone()));
    parent_metadata.insert("lastSplitAt".into(), Value::String(now.clone()));

    let mut parent_payload = parent_existing.payload.clone();
    parent_payload.amount_gram = remainder.format();
    parent_payload.metadata = Some(parent_metadata);
    let signed_parent = sign_payload(parent_payload, &state.issuer_sk_hex)?;

    let mut child_metadata = BTreeMap::new();
    child_metadata.insert("parentCertId".into(), Value::String(req.parent_cert_id.clone()));
    if let Some(price) = &req.price {
        child_metadata.insert("splitPrice".into(), Value::String(price.clone()));
    }
    let child_payload = GoldCertificatePayload {
        cert_id: child_id.clone(),
        issuer: parent_existing.payload.issuer.clone(),
        owner: req.to_owner.clone(),
        amount_gram: req.amount_child_gram.clone(),
        purity: parent_existing.payload.purity.clone(),
        issued_at: now.clone(),
        status: CertStatus::Active,
        metadata: Some(child_metadata),
    };
    let signed_child = sign_payload(child_payload, &state.issuer_sk_hex)?;

    persist_certificate(&state, &signed_parent)?;
    persist_certificate(&state, &signed_child)?;
    drop(_guard);

    let (parent_anchor, parent_proof_hash) = ledger_client::anchor(state.ledger_client.as_ref(), &req.parent_cert_id, &signed_parent.payload_hash, &now).await;
    let (child_anchor, _child_proof_hash) = ledger_client::anchor(state.ledger_client.as_ref(), &child_id, &signed_child.payload_hash, &now).await;
    let anchor_status = OutboundOutcome::combine([parent_anchor, child_anchor]);

    let mut event = LedgerEvent::Split {
        cert_id: req.parent_cert_id.clone(),
        occurred_at: now,
        proof_hash: None,
        parent_cert_id: req.parent_cert_id,
        child_cert_id: child_id,
        from: parent_owner,
        to: req.to_owner,
        amount_child_gram: req.amount_child_gram,
    };
    event.set_proof_hash(parent_proof_hash);
    let event_status = ledger_client::record(state.ledger_client.as_ref(), &event).await;

    Ok(Json(SplitResponse { parent: signed_parent, child: signed_child, anchor_status, event_status }))
}

// --- status ---

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(rename = "certId")]
    pub cert_id: String,
    pub next: CertStatus,
}

pub async fn set_status(
    State(state): State<AppState>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let _guard = state.write_lock.lock().await;
    let existing = load_certificate(&state, &req.cert_id)?;
    let current = existing.payload.status;
    if !current.can_transition_to(req.next) {
        return Err(CertificateError::StateConflict { from: current.as_str().to_string(), to: req.next.as_str().to_string() }.into());
    }

    let now = now_iso();
    let mut metadata = existing.payload.metadata.unwrap_or_default();
    metadata.insert("lastStatusChangeAt".into(), Value::String(now.clone()));

    let mut payload = existing.payload;
    payload.status = req.next;
    payload.metadata = Some(metadata);
    let signed = sign_payload(payload, &state.issuer_sk_hex)?;
    persist_certificate(&state, &signed)?;
    drop(_guard);

    let (anchor_status, proof_hash) = ledger_client::anchor(state.ledger_client.as_ref(), &req.cert_id, &signed.payload_hash, &now).await;
    let mut event = LedgerEvent::StatusChanged {
        cert_id: req.cert_id,
        occurred_at: now,
        proof_hash: None,
        status: req.next.as_str().to_string(),
    };
    event.set_proof_hash(proof_hash);
    let event_status = ledger_client::record(state.ledger_client.as_ref(), &event).await;

    Ok(Json(MutationResponse { certificate: signed, anchor_status, event_status }))
}

// --- timeline ---

pub async fn timeline(
    State(state): State<AppState>,
    Path(cert_id): Path<String>,
) -> Result<Json<Vec<LedgerEvent>>, AppError> {
    let Some(client) = state.ledger_client.as_ref() else {
        return Err(CertificateError::LedgerNotConfigured.into());
    };
    match client.get(&format!("/events/{cert_id}"), dgc_client::PRIMARY_DEADLINE).await {
        Ok(resp) if resp.status == 404 => Ok(Json(Vec::new())),
        Ok(resp) if resp.is_success() => {
            let events: Vec<LedgerEvent> = serde_json::from_value(resp.body).map_err(|e| CertificateError::LedgerUnreachable(e.to_string()))?;
            Ok(Json(events))
        }
        Ok(resp) => Err(CertificateError::LedgerUnreachable(format!("ledger adapter returned status {}", resp.status)).into()),
        Err(e) => Err(CertificateError::LedgerUnreachable(e.to_string()).into()),
    }
}

pub async fn openapi() -> Json<Value> {
    Json(serde_json::json!({
        "openapi": "3.0.3",
        "info": { "title": "DGC Certificate Authority", "version": "1" },
        "paths": {
            "/certificates/issue": {},
            "/certificates/verify": {},
            "/certificates/transfer": {},
            "/certificates/split": {},
            "/certificates/status": {},
            "/certificates/{id}": {},
            "/certificates": {},
            "/certificates/{id}/timeline": {},
        }
    }))
}

//! Idempotency protocol for escrow mutations (spec §4.H): `requestHash =
//! SHA256(canonicalJSON(parsedBody))`, keyed by `(action, key)`. A replay
//! with a matching hash returns the stored response byte-for-byte; a
//! differing hash is a conflict.

use crate::state::{AppState, IDEMPOTENCY_TABLE};
use axum::http::StatusCode;
use dgc_storage::Write;
use dgc_trust::AppError;
use dgc_types::error::{MarketplaceError, StorageError};
use dgc_types::listing::IdempotencyRecord;
use dgc_types::time::now_iso;
use serde_json::Value;

pub enum IdempotencyCheck {
    Fresh { request_hash: String },
    Replay { status: StatusCode, body: Value },
}

fn record_key(action: &str, key: &str) -> String {
    format!("{action}:{key}")
}

pub fn check(state: &AppState, action: &str, key: &str, body: &Value) -> Result<IdempotencyCheck, AppError> {
    let request_hash = dgc_crypto::hash_canonical(body).map_err(|e| AppError::bad_request(e.to_string()))?;
    let existing: Option<IdempotencyRecord> =
        state.store.get(IDEMPOTENCY_TABLE, &record_key(action, key)).map_err(|e| StorageError::Backend(e.to_string()))?;

    match existing {
        Some(record) if record.request_hash == request_hash => Ok(IdempotencyCheck::Replay {
            status: StatusCode::from_u16(record.response_status).unwrap_or(StatusCode::OK),
            body: record.response_body,
        }),
        Some(_) => Err(MarketplaceError::IdempotencyKeyReuseConflict.into()),
        None => Ok(IdempotencyCheck::Fresh { request_hash }),
    }
}

pub fn record_write(action: &str, key: &str, request_hash: String, status: StatusCode, body: &Value) -> Result<Write<'static>, AppError> {
    let record = IdempotencyRecord {
        action: action.to_string(),
        key: key.to_string(),
        request_hash,
        response_status: status.as_u16(),
        response_body: body.clone(),
        created_at: now_iso(),
    };
    Write::new(IDEMPOTENCY_TABLE, record_key(action, key), &record).map_err(|e| StorageError::Codec(e.to_string()).into())
}

//! `AppError`: the single `IntoResponse` error type every DGC service
//! handler returns, mirroring the teacher's `http-rpc-gateway::AppError`
//! (status + machine code + optional message, serialized as JSON) but keyed
//! off the domain error codes in `dgc_types::error::ErrorCode` instead of a
//! fixed three-variant enum, since the backbone's status contract (spec §7)
//! assigns a status per error *code*, not per service.

use axum::{http::StatusCode, response::{IntoResponse, Json, Response}};
use dgc_types::error::ErrorCode;
use serde_json::Value;
use std::fmt;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: Option<String>,
    /// Extra fields merged into the response body, e.g. a freeze response's
    /// `freezeState` snapshot (spec §4.H "freeze gate").
    pub extra: Option<Value>,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str) -> Self {
        AppError { status, code, message: None, extra: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::new(StatusCode::BAD_REQUEST, "invalid_request").with_message(message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.status)
    }
}

impl std::error::Error for AppError {}

/// Maps a stable error code to its HTTP status per the backbone's contract
/// (spec §7): "200 ... 201 create; 202 best-effort ingests; 400 invalid
/// request; 401 unauthorized service token; 403 governance denied; 404
/// not-found; 409 state conflict ...; 423 marketplace frozen; 502
/// collaborator error; 503 collaborator unreachable/unconfigured."
fn status_for_code(code: &str) -> StatusCode {
    match code {
        "certificate_not_found" | "proof_not_found" | "listing_not_found"
        | "risk_profile_not_found" | "dispute_not_found" => StatusCode::NOT_FOUND,
        "invalid_amount" | "invalid_request" | "missing_idempotency_key" => {
            StatusCode::BAD_REQUEST
        }
        "state_conflict" | "idempotency_key_reuse_conflict" | "owner_mismatch"
        | "buyer_mismatch" => StatusCode::CONFLICT,
        "marketplace_frozen" => StatusCode::LOCKED,
        "ledger_adapter_unreachable" | "chain_write_failed" | "certificate_service_unreachable"
        | "certificate_service_error" | "reconciliation_service_error"
        | "reconciliation_service_invalid_response" | "dispute_service_error"
        | "certificate_service_unavailable" => StatusCode::BAD_GATEWAY,
        "ledger_adapter_not_configured" | "reconciliation_service_unreachable" => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        "unauthorized_service" => StatusCode::UNAUTHORIZED,
        "forbidden" => StatusCode::FORBIDDEN,
        "storage_backend_error" | "storage_codec_error" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<E> From<E> for AppError
where
    E: ErrorCode + fmt::Display,
{
    fn from(err: E) -> Self {
        let code = err.code();
        let status = status_for_code(code);
        if status.is_server_error() {
            tracing::error!(code, status = status.as_u16(), "{}", err);
        }
        AppError::new(status, code).with_message(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.code });
        if let Some(message) = self.message {
            body["message"] = Value::String(message);
        }
        body["statusCode"] = Value::from(self.status.as_u16());
        if let Some(extra) = self.extra {
            if let (Value::Object(base), Value::Object(more)) = (&mut body, extra) {
                for (k, v) in more {
                    base.insert(k, v);
                }
            }
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgc_types::error::MarketplaceError;

    #[test]
    fn domain_error_maps_to_documented_status() {
        let err: AppError = MarketplaceError::Frozen.into();
        assert_eq!(err.status, StatusCode::LOCKED);
        assert_eq!(err.code, "marketplace_frozen");
    }

    #[test]
    fn state_conflict_maps_to_409() {
        let err: AppError = MarketplaceError::BuyerMismatch.into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}

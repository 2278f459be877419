//! Shared-secret service-token gate (spec §4.I): "when a shared token is
//! configured, each protected request must carry header `x-service-token`
//! equal to the token (case-sensitive, exact). Absent/mismatch → 401
//! `unauthorized_service`. When token is unset, the gate permits all."

use crate::AppError;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use dgc_types::error::TrustError;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ServiceAuthConfig {
    token: Option<Arc<String>>,
}

impl ServiceAuthConfig {
    pub fn new(token: Option<String>) -> Self {
        ServiceAuthConfig { token: token.map(Arc::new) }
    }
}

pub async fn service_auth_middleware(
    State(config): State<ServiceAuthConfig>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = &config.token {
        let supplied = req
            .headers()
            .get("x-service-token")
            .and_then(|v| v.to_str().ok());
        if supplied != Some(expected.as_str()) {
            return Err(TrustError::UnauthorizedService.into());
        }
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_token_permits_all() {
        let config = ServiceAuthConfig::new(None);
        assert!(config.token.is_none());
    }
}

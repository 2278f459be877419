//! Calls from the marketplace into the certificate authority (spec §4.H):
//! confirm ownership/status at listing creation, and drive the
//! LOCKED/ACTIVE/transfer sequence during escrow lock and settlement.

use dgc_client::{ServiceClient, PRIMARY_DEADLINE};
use dgc_trust::AppError;
use dgc_types::certificate::SignedCertificate;
use dgc_types::error::{CertificateError, MarketplaceError};
use serde_json::json;

fn unreachable_error(message: impl Into<String>) -> AppError {
    MarketplaceError::CertificateServiceUnreachable(message.into()).into()
}

pub async fn get_certificate(client: &ServiceClient, cert_id: &str) -> Result<SignedCertificate, AppError> {
    let resp = client
        .get(&format!("/certificates/{cert_id}"), PRIMARY_DEADLINE)
        .await
        .map_err(|e| unreachable_error(e.to_string()))?;
    if resp.status == 404 {
        return Err(CertificateError::NotFound(cert_id.to_string()).into());
    }
    if !resp.is_success() {
        return Err(MarketplaceError::CertificateServiceError(format!("certificate authority returned status {}", resp.status)).into());
    }
    serde_json::from_value(resp.body).map_err(|e| MarketplaceError::CertificateServiceError(e.to_string()).into())
}

/// Maps a D-collaborator response per the marketplace's documented policy:
/// 404→404, 409→409, anything else→502 `certificate_service_error`.
fn map_mutation_status(cert_id: &str, status: u16) -> Option<AppError> {
    match status {
        200..=299 => None,
        404 => Some(CertificateError::NotFound(cert_id.to_string()).into()),
        409 => Some(MarketplaceError::StateConflict.into()),
        other => Some(MarketplaceError::CertificateServiceError(format!("certificate authority returned status {other}")).into()),
    }
}

pub async fn set_status(client: &ServiceClient, cert_id: &str, next: &str) -> Result<(), AppError> {
    let body = json!({ "certId": cert_id, "next": next });
    let resp = client
        .post("/certificates/status", &body, PRIMARY_DEADLINE)
        .await
        .map_err(|e| unreachable_error(e.to_string()))?;
    if let Some(err) = map_mutation_status(cert_id, resp.status) {
        return Err(err);
    }
    Ok(())
}

pub async fn transfer(
    client: &ServiceClient,
    cert_id: &str,
    to_owner: &str,
    price: Option<&str>,
) -> Result<SignedCertificate, AppError> {
    let body = json!({ "certId": cert_id, "toOwner": to_owner, "price": price });
    let resp = client
        .post("/certificates/transfer", &body, PRIMARY_DEADLINE)
        .await
        .map_err(|e| unreachable_error(e.to_string()))?;
    if let Some(err) = map_mutation_status(cert_id, resp.status) {
        return Err(err);
    }
    let certificate = resp
        .body
        .get("certificate")
        .cloned()
        .ok_or_else(|| MarketplaceError::CertificateServiceError("missing certificate in transfer response".to_string()))?;
    serde_json::from_value(certificate).map_err(|e| MarketplaceError::CertificateServiceError(e.to_string()).into())
}

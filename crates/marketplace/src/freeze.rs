//! Freeze-gate consultation (spec §4.H): if a reconciliation service URL is
//! configured, every create/lock/settle first calls `/reconcile/latest`.
//! Cancel is deliberately exempt so a stuck escrow can still unwind.

use dgc_client::{ServiceClient, PRIMARY_DEADLINE};
use dgc_trust::AppError;
use dgc_types::error::MarketplaceError;
use dgc_types::reconciliation::FreezeState;

pub async fn check(recon_client: Option<&ServiceClient>) -> Result<(), AppError> {
    let Some(client) = recon_client else {
        return Ok(());
    };

    let resp = client
        .get("/reconcile/latest", PRIMARY_DEADLINE)
        .await
        .map_err(|e| MarketplaceError::ReconciliationServiceUnreachable(e.to_string()))?;

    if !resp.is_success() {
        return Err(MarketplaceError::ReconciliationServiceError(format!("reconciliation service returned status {}", resp.status)).into());
    }

    let freeze_state: FreezeState = resp.body.get("freezeState").cloned().and_then(|v| serde_json::from_value(v).ok()).ok_or_else(|| {
        MarketplaceError::ReconciliationInvalidResponse("missing or invalid freezeState.active in reconciliation response".to_string())
    })?;

    if freeze_state.active {
        let extra = serde_json::json!({ "freezeState": freeze_state });
        return Err(AppError::from(MarketplaceError::Frozen).with_extra(extra));
    }
    Ok(())
}

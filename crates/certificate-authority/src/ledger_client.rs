//! Outbound calls to the ledger adapter (component C), classified per spec
//! §4.D/§9: "each outbound call is bounded by a 5-second deadline; failure
//! is recorded as FAILED, absence-of-config as SKIPPED; ANCHORED/RECORDED
//! only on 2xx."

use dgc_client::{ServiceClient, PRIMARY_DEADLINE};
use dgc_types::certificate::OutboundOutcome;
use dgc_types::ledger_event::LedgerEvent;
use serde_json::json;

/// Anchors a payload hash with the ledger adapter, returning both the
/// outcome and the `proofHash` the adapter computed (spec §3: timeline
/// events carry the proof hash of their anchor, when one exists).
pub async fn anchor(
    client: Option<&ServiceClient>,
    cert_id: &str,
    payload_hash: &str,
    occurred_at: &str,
) -> (OutboundOutcome, Option<String>) {
    let Some(client) = client else {
        return (OutboundOutcome::Skipped, None);
    };
    let body = json!({ "certId": cert_id, "payloadHash": payload_hash, "occurredAt": occurred_at });
    match client.post("/proofs/anchor", &body, PRIMARY_DEADLINE).await {
        Ok(resp) if resp.is_success() => {
            let proof_hash = resp.body.get("proofHash").and_then(|v| v.as_str()).map(str::to_string);
            (OutboundOutcome::Anchored, proof_hash)
        }
        Ok(resp) => {
            tracing::warn!(status = resp.status, "ledger adapter rejected anchor request");
            (OutboundOutcome::Failed, None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "ledger adapter unreachable during anchor");
            (OutboundOutcome::Failed, None)
        }
    }
}

pub async fn record(client: Option<&ServiceClient>, event: &LedgerEvent) -> OutboundOutcome {
    let Some(client) = client else {
        return OutboundOutcome::Skipped;
    };
    let body = match serde_json::to_value(event) {
        Ok(v) => v,
        Err(_) => return OutboundOutcome::Failed,
    };
    match client.post("/events/record", &body, PRIMARY_DEADLINE).await {
        Ok(resp) if resp.is_success() => OutboundOutcome::Recorded,
        Ok(resp) => {
            tracing::warn!(status = resp.status, "ledger adapter rejected record request");
            OutboundOutcome::Failed
        }
        Err(e) => {
            tracing::warn!(error = %e, "ledger adapter unreachable during record");
            OutboundOutcome::Failed
        }
    }
}

//! The DGC backbone's chain sink (spec component B): "an optional adapter
//! that accepts a lineage event and returns a transaction reference, or
//! reports unconfigured." The on-chain smart contract itself is out of
//! scope (spec §1); this crate owns only the `ChainWriter` contract, the
//! deterministic encoding rules in [`encoding`], and a thin HTTP adapter
//! that submits the encoded event to whatever RPC endpoint is configured.

pub mod encoding;

use async_trait::async_trait;
use dgc_client::{ServiceClient, PRIMARY_DEADLINE};
use dgc_types::ledger_event::LedgerEvent;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainSinkError {
    #[error("chain write failed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChainStatus {
    pub fn unconfigured() -> Self {
        ChainStatus {
            configured: false,
            rpc_url: None,
            registry_address: None,
            signer_address: None,
            latest_block: None,
            error: None,
        }
    }
}

/// A lineage event sink external to the DGC backbone proper. The ledger
/// adapter (component C) consults `Option<Arc<dyn ChainWriter>>`; `None`
/// means "sink absent", per spec §4.C's success-without-a-sink path.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    async fn write_event(&self, event: &LedgerEvent) -> Result<String, ChainSinkError>;
    async fn status(&self) -> ChainStatus;
}

/// Encodes `event` into the wire payload the chain encoding rules define,
/// so both the HTTP sink and tests can inspect exactly what would be sent.
#[derive(Debug, Serialize)]
struct ChainEventPayload {
    #[serde(rename = "type")]
    event_type: &'static str,
    #[serde(rename = "certIdHex")]
    cert_id_hex: String,
    #[serde(rename = "childCertIdHex", skip_serializing_if = "Option::is_none")]
    child_cert_id_hex: Option<String>,
    #[serde(rename = "fromHex", skip_serializing_if = "Option::is_none")]
    from_hex: Option<String>,
    #[serde(rename = "toHex", skip_serializing_if = "Option::is_none")]
    to_hex: Option<String>,
    #[serde(rename = "amountScaled", skip_serializing_if = "Option::is_none")]
    amount_scaled: Option<u64>,
    #[serde(rename = "purityBasisPoints", skip_serializing_if = "Option::is_none")]
    purity_basis_points: Option<u32>,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    status_code: Option<u8>,
    #[serde(rename = "occurredAt")]
    occurred_at: String,
}

fn encode_event(event: &LedgerEvent) -> Result<ChainEventPayload, ChainSinkError> {
    use dgc_types::amount::{purity_to_basis_points, ScaledAmount};
    use encoding::{encode_actor, encode_cert_id, status_code_from_str};

    let cert_id_hex = hex::encode(encode_cert_id(event.cert_id()));
    let occurred_at = event.occurred_at().to_string();

    let payload = match event {
        LedgerEvent::Issued { owner, amount_gram, purity, .. } => {
            let amount = ScaledAmount::parse(amount_gram)
                .map_err(|e| ChainSinkError::WriteFailed(e.to_string()))?;
            let basis_points = purity_to_basis_points(purity)
                .map_err(|e| ChainSinkError::WriteFailed(e.to_string()))?;
            ChainEventPayload {
                event_type: "ISSUED",
                cert_id_hex,
                child_cert_id_hex: None,
                from_hex: None,
                to_hex: Some(hex::encode(encode_actor(owner))),
                amount_scaled: Some(amount.0),
                purity_basis_points: Some(basis_points),
                status_code: None,
                occurred_at,
            }
        }
        LedgerEvent::Transfer { from, to, amount_gram, .. } => {
            let amount = ScaledAmount::parse(amount_gram)
                .map_err(|e| ChainSinkError::WriteFailed(e.to_string()))?;
            ChainEventPayload {
                event_type: "TRANSFER",
                cert_id_hex,
                child_cert_id_hex: None,
                from_hex: Some(hex::encode(encode_actor(from))),
                to_hex: Some(hex::encode(encode_actor(to))),
                amount_scaled: Some(amount.0),
                purity_basis_points: None,
                status_code: None,
                occurred_at,
            }
        }
        LedgerEvent::Split { child_cert_id, from, to, amount_child_gram, .. } => {
            let amount = ScaledAmount::parse(amount_child_gram)
                .map_err(|e| ChainSinkError::WriteFailed(e.to_string()))?;
            ChainEventPayload {
                event_type: "SPLIT",
                cert_id_hex,
                child_cert_id_hex: Some(hex::encode(encode_cert_id(child_cert_id))),
                from_hex: Some(hex::encode(encode_actor(from))),
                to_hex: Some(hex::encode(encode_actor(to))),
                amount_scaled: Some(amount.0),
                purity_basis_points: None,
                status_code: None,
                occurred_at,
            }
        }
        LedgerEvent::StatusChanged { status, .. } => ChainEventPayload {
            event_type: "STATUS_CHANGED",
            cert_id_hex,
            child_cert_id_hex: None,
            from_hex: None,
            to_hex: None,
            amount_scaled: None,
            purity_basis_points: None,
            status_code: status_code_from_str(status),
            occurred_at,
        },
    };
    Ok(payload)
}

/// Submits encoded events to a configured RPC endpoint over HTTP. The
/// endpoint's wire contract is opaque per spec §1; this adapter only
/// guarantees it sends the deterministic encoding and surfaces a
/// `ledgerTxRef`-shaped field back as the transaction reference.
pub struct HttpChainWriter {
    client: ServiceClient,
    rpc_url: String,
    registry_address: Option<String>,
    signer_address: Option<String>,
}

impl HttpChainWriter {
    pub fn new(rpc_url: impl Into<String>, registry_address: Option<String>, signer_address: Option<String>) -> Self {
        let rpc_url = rpc_url.into();
        HttpChainWriter {
            client: ServiceClient::new(rpc_url.clone(), None),
            rpc_url,
            registry_address,
            signer_address,
        }
    }
}

#[async_trait]
impl ChainWriter for HttpChainWriter {
    async fn write_event(&self, event: &LedgerEvent) -> Result<String, ChainSinkError> {
        let payload = encode_event(event)?;
        let body = serde_json::to_value(&payload)
            .map_err(|e| ChainSinkError::WriteFailed(e.to_string()))?;
        let response = self
            .client
            .post("/submit", &body, PRIMARY_DEADLINE)
            .await
            .map_err(|e| ChainSinkError::WriteFailed(e.to_string()))?;
        if !response.is_success() {
            return Err(ChainSinkError::WriteFailed(format!(
                "chain RPC returned status {}",
                response.status
            )));
        }
        response
            .body
            .get("txRef")
            .or_else(|| response.body.get("transactionHash"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ChainSinkError::WriteFailed("response missing txRef".into()))
    }

    async fn status(&self) -> ChainStatus {
        ChainStatus {
            configured: true,
            rpc_url: Some(self.rpc_url.clone()),
            registry_address: self.registry_address.clone(),
            signer_address: self.signer_address.clone(),
            latest_block: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_event_encodes_amount_and_purity() {
        let event = LedgerEvent::Issued {
            cert_id: "DGC-1".into(),
            occurred_at: "2026-01-01T00:00:00Z".into(),
            proof_hash: None,
            owner: "alice".into(),
            amount_gram: "1.2500".into(),
            purity: "999.9".into(),
        };
        let payload = encode_event(&event).unwrap();
        assert_eq!(payload.amount_scaled, Some(12_500));
        assert_eq!(payload.purity_basis_points, Some(9999));
    }

    #[test]
    fn status_changed_event_encodes_status_code() {
        let event = LedgerEvent::StatusChanged {
            cert_id: "DGC-1".into(),
            occurred_at: "2026-01-01T00:00:00Z".into(),
            proof_hash: None,
            status: "LOCKED".into(),
        };
        let payload = encode_event(&event).unwrap();
        assert_eq!(payload.status_code, Some(1));
    }

    #[test]
    fn unconfigured_status_reports_false() {
        let status = ChainStatus::unconfigured();
        assert!(!status.configured);
    }
}

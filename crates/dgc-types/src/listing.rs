//! Marketplace listing state machine types (spec §3, §4.H).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingStatus {
    Open,
    Locked,
    Settled,
    Cancelled,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Open => "OPEN",
            ListingStatus::Locked => "LOCKED",
            ListingStatus::Settled => "SETTLED",
            ListingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ListingStatus::Settled | ListingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceListing {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    #[serde(rename = "certId")]
    pub cert_id: String,
    pub seller: String,
    #[serde(rename = "askPrice")]
    pub ask_price: String,
    pub status: ListingStatus,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "lockedBy")]
    pub locked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "lockedAt")]
    pub locked_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "settledAt")]
    pub settled_at: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "settledPrice"
    )]
    pub settled_price: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "cancelledAt"
    )]
    pub cancelled_at: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "cancelReason"
    )]
    pub cancel_reason: Option<String>,

    #[serde(default, rename = "underDispute")]
    pub under_dispute: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "disputeId")]
    pub dispute_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "disputeStatus"
    )]
    pub dispute_status: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "disputeOpenedAt"
    )]
    pub dispute_opened_at: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "disputeResolvedAt"
    )]
    pub dispute_resolved_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingAuditType {
    Created,
    Locked,
    Settled,
    Cancelled,
    #[serde(rename = "DISPUTE_OPENED")]
    DisputeOpened,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingAuditEvent {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "listingId")]
    pub listing_id: String,
    #[serde(rename = "certId")]
    pub cert_id: String,
    #[serde(rename = "type")]
    pub event_type: ListingAuditType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(rename = "occurredAt")]
    pub occurred_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub action: String,
    pub key: String,
    #[serde(rename = "requestHash")]
    pub request_hash: String,
    #[serde(rename = "responseStatus")]
    pub response_status: u16,
    #[serde(rename = "responseBody")]
    pub response_body: Value,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ListingStatus::Settled.is_terminal());
        assert!(ListingStatus::Cancelled.is_terminal());
        assert!(!ListingStatus::Open.is_terminal());
        assert!(!ListingStatus::Locked.is_terminal());
    }
}

//! Dispute orchestrator types (spec §3, §4.F).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisputeStatus {
    Open,
    Assigned,
    Resolved,
}

impl DisputeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DisputeStatus::Open => "OPEN",
            DisputeStatus::Assigned => "ASSIGNED",
            DisputeStatus::Resolved => "RESOLVED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisputeResolution {
    RefundBuyer,
    ReleaseSeller,
    ManualReview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeRecord {
    #[serde(rename = "disputeId")]
    pub dispute_id: String,
    #[serde(rename = "listingId")]
    pub listing_id: String,
    #[serde(rename = "certId")]
    pub cert_id: String,
    pub status: DisputeStatus,
    #[serde(rename = "openedBy")]
    pub opened_by: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(rename = "openedAt")]
    pub opened_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "assignedAt")]
    pub assigned_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "resolvedBy")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "resolvedAt")]
    pub resolved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<DisputeResolution>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "resolutionNotes"
    )]
    pub resolution_notes: Option<String>,
}

//! Certificate payload, signed envelope, and proof anchor (spec §3).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CertStatus {
    Active,
    Locked,
    Redeemed,
    Revoked,
}

impl CertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CertStatus::Active => "ACTIVE",
            CertStatus::Locked => "LOCKED",
            CertStatus::Redeemed => "REDEEMED",
            CertStatus::Revoked => "REVOKED",
        }
    }

    /// Allowed successors per spec §4.D; terminal states return an empty set.
    pub fn allowed_next(self) -> &'static [CertStatus] {
        match self {
            CertStatus::Active => &[CertStatus::Locked, CertStatus::Redeemed, CertStatus::Revoked],
            CertStatus::Locked => &[CertStatus::Active, CertStatus::Redeemed, CertStatus::Revoked],
            CertStatus::Redeemed => &[],
            CertStatus::Revoked => &[],
        }
    }

    pub fn can_transition_to(self, next: CertStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}

/// The un-signed body of a certificate. Canonicalizing and hashing this is
/// what `payloadHash` is computed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldCertificatePayload {
    #[serde(rename = "certId")]
    pub cert_id: String,
    pub issuer: String,
    pub owner: String,
    #[serde(rename = "amountGram")]
    pub amount_gram: String,
    pub purity: String,
    #[serde(rename = "issuedAt")]
    pub issued_at: String,
    pub status: CertStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
}

/// A certificate plus its hash and issuer signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedCertificate {
    pub payload: GoldCertificatePayload,
    #[serde(rename = "payloadHash")]
    pub payload_hash: String,
    pub signature: String,
}

/// `{certId, payloadHash, proofHash, anchoredAt}` — one latest anchor per certId.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofAnchor {
    #[serde(rename = "certId")]
    pub cert_id: String,
    #[serde(rename = "payloadHash")]
    pub payload_hash: String,
    #[serde(rename = "proofHash")]
    pub proof_hash: String,
    #[serde(rename = "anchoredAt")]
    pub anchored_at: String,
}

/// Outcome of a best-effort anchor/record call (spec §4.D, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutboundOutcome {
    Anchored,
    Recorded,
    Skipped,
    Failed,
}

impl OutboundOutcome {
    /// Combines several per-child outcomes into one, per spec §4.D split rule:
    /// FAILED if any failed, else ANCHORED if any anchored, else SKIPPED.
    pub fn combine(outcomes: impl IntoIterator<Item = OutboundOutcome>) -> OutboundOutcome {
        let mut any_anchored = false;
        for o in outcomes {
            match o {
                OutboundOutcome::Failed => return OutboundOutcome::Failed,
                OutboundOutcome::Anchored | OutboundOutcome::Recorded => any_anchored = true,
                OutboundOutcome::Skipped => {}
            }
        }
        if any_anchored {
            OutboundOutcome::Anchored
        } else {
            OutboundOutcome::Skipped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_transitions() {
        assert!(CertStatus::Active.can_transition_to(CertStatus::Locked));
        assert!(CertStatus::Active.can_transition_to(CertStatus::Redeemed));
        assert!(CertStatus::Active.can_transition_to(CertStatus::Revoked));
        assert!(!CertStatus::Active.can_transition_to(CertStatus::Active));
    }

    #[test]
    fn terminal_states_are_closed() {
        assert!(CertStatus::Redeemed.allowed_next().is_empty());
        assert!(CertStatus::Revoked.allowed_next().is_empty());
        assert!(!CertStatus::Redeemed.can_transition_to(CertStatus::Active));
    }

    #[test]
    fn combine_prefers_failed_over_anchored() {
        let combined = OutboundOutcome::combine([
            OutboundOutcome::Anchored,
            OutboundOutcome::Failed,
            OutboundOutcome::Skipped,
        ]);
        assert_eq!(combined, OutboundOutcome::Failed);
    }

    #[test]
    fn combine_all_skipped_is_skipped() {
        let combined =
            OutboundOutcome::combine([OutboundOutcome::Skipped, OutboundOutcome::Skipped]);
        assert_eq!(combined, OutboundOutcome::Skipped);
    }
}

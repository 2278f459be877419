//! `LedgerEvent` — tagged union over `{ISSUED, TRANSFER, SPLIT, STATUS_CHANGED}`
//! (spec §3, §9: "implementations should decode by discriminator and reject
//! unknown variants").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum LedgerEvent {
    Issued {
        #[serde(rename = "certId")]
        cert_id: String,
        #[serde(rename = "occurredAt")]
        occurred_at: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(rename = "proofHash")]
        proof_hash: Option<String>,
        owner: String,
        #[serde(rename = "amountGram")]
        amount_gram: String,
        purity: String,
    },
    Transfer {
        #[serde(rename = "certId")]
        cert_id: String,
        #[serde(rename = "occurredAt")]
        occurred_at: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(rename = "proofHash")]
        proof_hash: Option<String>,
        from: String,
        to: String,
        #[serde(rename = "amountGram")]
        amount_gram: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        price: Option<String>,
    },
    Split {
        #[serde(rename = "certId")]
        cert_id: String,
        #[serde(rename = "occurredAt")]
        occurred_at: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(rename = "proofHash")]
        proof_hash: Option<String>,
        #[serde(rename = "parentCertId")]
        parent_cert_id: String,
        #[serde(rename = "childCertId")]
        child_cert_id: String,
        from: String,
        to: String,
        #[serde(rename = "amountChildGram")]
        amount_child_gram: String,
    },
    StatusChanged {
        #[serde(rename = "certId")]
        cert_id: String,
        #[serde(rename = "occurredAt")]
        occurred_at: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(rename = "proofHash")]
        proof_hash: Option<String>,
        status: String,
    },
}

impl LedgerEvent {
    pub fn cert_id(&self) -> &str {
        match self {
            LedgerEvent::Issued { cert_id, .. }
            | LedgerEvent::Transfer { cert_id, .. }
            | LedgerEvent::Split { cert_id, .. }
            | LedgerEvent::StatusChanged { cert_id, .. } => cert_id,
        }
    }

    pub fn occurred_at(&self) -> &str {
        match self {
            LedgerEvent::Issued { occurred_at, .. }
            | LedgerEvent::Transfer { occurred_at, .. }
            | LedgerEvent::Split { occurred_at, .. }
            | LedgerEvent::StatusChanged { occurred_at, .. } => occurred_at,
        }
    }

    pub fn proof_hash(&self) -> Option<&str> {
        match self {
            LedgerEvent::Issued { proof_hash, .. }
            | LedgerEvent::Transfer { proof_hash, .. }
            | LedgerEvent::Split { proof_hash, .. }
            | LedgerEvent::StatusChanged { proof_hash, .. } => proof_hash.as_deref(),
        }
    }

    pub fn set_proof_hash(&mut self, hash: Option<String>) {
        match self {
            LedgerEvent::Issued { proof_hash, .. }
            | LedgerEvent::Transfer { proof_hash, .. }
            | LedgerEvent::Split { proof_hash, .. }
            | LedgerEvent::StatusChanged { proof_hash, .. } => *proof_hash = hash,
        }
    }

    /// Child certId for a SPLIT event, so the adapter can append it to both timelines.
    pub fn child_cert_id(&self) -> Option<&str> {
        match self {
            LedgerEvent::Split { child_cert_id, .. } => Some(child_cert_id),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            LedgerEvent::Issued { .. } => "ISSUED",
            LedgerEvent::Transfer { .. } => "TRANSFER",
            LedgerEvent::Split { .. } => "SPLIT",
            LedgerEvent::StatusChanged { .. } => "STATUS_CHANGED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_by_discriminator() {
        let ev = LedgerEvent::Transfer {
            cert_id: "DGC-1".into(),
            occurred_at: "2026-01-01T00:00:00Z".into(),
            proof_hash: None,
            from: "0xA".into(),
            to: "0xB".into(),
            amount_gram: "1.0000".into(),
            price: None,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"TRANSFER\""));
        let back: LedgerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let raw = r#"{"type":"MYSTERY","certId":"x"}"#;
        let result: Result<LedgerEvent, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn split_exposes_child_cert_id() {
        let ev = LedgerEvent::Split {
            cert_id: "DGC-P".into(),
            occurred_at: "2026-01-01T00:00:00Z".into(),
            proof_hash: None,
            parent_cert_id: "DGC-P".into(),
            child_cert_id: "DGC-C".into(),
            from: "0xA".into(),
            to: "0xB".into(),
            amount_child_gram: "1.0000".into(),
        };
        assert_eq!(ev.child_cert_id(), Some("DGC-C"));
        assert_eq!(ev.cert_id(), "DGC-P");
    }
}

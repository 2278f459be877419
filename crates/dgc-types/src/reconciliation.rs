//! Reconciliation run, freeze state, and freeze override types (spec §3, §4.G).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationRun {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "custodyTotalGram")]
    pub custody_total_gram: String,
    #[serde(rename = "outstandingTotalGram")]
    pub outstanding_total_gram: String,
    #[serde(rename = "mismatchGram")]
    pub mismatch_gram: String,
    #[serde(rename = "absMismatchGram")]
    pub abs_mismatch_gram: String,
    #[serde(rename = "thresholdGram")]
    pub threshold_gram: String,
    #[serde(rename = "freezeTriggered")]
    pub freeze_triggered: bool,
    #[serde(rename = "certificatesEvaluated")]
    pub certificates_evaluated: u64,
    #[serde(rename = "activeCertificates")]
    pub active_certificates: u64,
    #[serde(rename = "lockedCertificates")]
    pub locked_certificates: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreezeState {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "lastRunId")]
    pub last_run_id: Option<String>,
}

impl FreezeState {
    pub fn inactive(now: &str) -> Self {
        FreezeState {
            active: false,
            reason: None,
            updated_at: now.to_string(),
            last_run_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreezeOverride {
    #[serde(rename = "overrideId")]
    pub override_id: String,
    pub action: String,
    pub actor: String,
    pub reason: String,
    #[serde(rename = "previousActive")]
    pub previous_active: bool,
    #[serde(rename = "nextActive")]
    pub next_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "runId")]
    pub run_id: Option<String>,
}

//! Risk engine profile, reason, and alert types (spec §3, §4.E).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// HIGH >= 60, MEDIUM >= 25, else LOW.
    pub fn from_score(score: u32) -> RiskLevel {
        if score >= 60 {
            RiskLevel::High
        } else if score >= 25 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReason {
    pub code: String,
    #[serde(rename = "scoreImpact")]
    pub score_impact: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRiskProfile {
    pub target: String,
    pub score: u32,
    pub level: RiskLevel,
    pub reasons: Vec<RiskReason>,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "certId")]
    pub cert_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRiskProfile {
    pub target: String,
    pub score: u32,
    pub level: RiskLevel,
    pub reasons: Vec<RiskReason>,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "certId")]
    pub cert_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTargetType {
    Certificate,
    Listing,
    Reconciliation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    #[serde(rename = "alertId")]
    pub alert_id: String,
    #[serde(rename = "targetType")]
    pub target_type: RiskTargetType,
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub score: u32,
    pub level: RiskLevel,
    pub reasons: Vec<RiskReason>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Clamps a raw additive score to `[0, 100]` and rounds (scores are already
/// integral here, but this keeps the clamp policy in one place).
pub fn clamp_score(raw: i32) -> u32 {
    raw.clamp(0, 100) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(24), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_score(-10), 0);
        assert_eq!(clamp_score(150), 100);
        assert_eq!(clamp_score(42), 42);
    }
}

//! Governance RBAC (spec §4.I): role-allow-list check on `x-governance-role`
//! plus an actor-consistency guard against `x-governance-actor`. Applied
//! inline by handlers rather than as blanket middleware, since the allowed
//! role set and the body's actor field differ per governance-gated
//! operation (dispute assign/resolve, reconciliation unfreeze).

use crate::AppError;
use axum::http::HeaderMap;
use dgc_types::error::TrustError;
use std::collections::HashSet;

pub const DISPUTE_ASSIGN_DEFAULT_ROLES: &str = "ops_admin,ops_agent,admin";
pub const DISPUTE_RESOLVE_DEFAULT_ROLES: &str = "ops_admin,ops_lead,admin";
pub const UNFREEZE_DEFAULT_ROLES: &str = "ops_admin,admin";

#[derive(Clone, Debug)]
pub struct AllowedRoles {
    allow_any: bool,
    roles: HashSet<String>,
}

impl AllowedRoles {
    /// Parses a comma-separated allow-list; `*` anywhere in the list means
    /// allow-any. Entries are normalized to lowercase/trimmed, matching how
    /// the incoming header is normalized before comparison.
    pub fn parse(csv: &str) -> Self {
        let mut roles = HashSet::new();
        let mut allow_any = false;
        for entry in csv.split(',') {
            let entry = entry.trim().to_lowercase();
            if entry.is_empty() {
                continue;
            }
            if entry == "*" {
                allow_any = true;
            }
            roles.insert(entry);
        }
        AllowedRoles { allow_any, roles }
    }

    pub fn permits(&self, role: &str) -> bool {
        self.allow_any || self.roles.contains(&role.trim().to_lowercase())
    }
}

/// Enforces that the request's `x-governance-role` header (normalized
/// lowercase/trimmed) is in `allowed`. Missing header normalizes to the
/// empty string, which never matches a configured role list.
pub fn require_governance_role(headers: &HeaderMap, allowed: &AllowedRoles) -> Result<(), AppError> {
    let role = headers
        .get("x-governance-role")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if allowed.permits(role) {
        Ok(())
    } else {
        Err(TrustError::Forbidden.into())
    }
}

/// If `x-governance-actor` is present, it must equal `body_actor` (spec
/// §4.I: "it must equal the body's actor field"). Absent header is not an
/// error — the guard is optional, not required.
pub fn require_actor_consistency(headers: &HeaderMap, body_actor: &str) -> Result<(), AppError> {
    if let Some(actor_header) = headers.get("x-governance-actor").and_then(|v| v.to_str().ok()) {
        if actor_header != body_actor {
            return Err(TrustError::ActorMismatch.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn wildcard_allows_any_role() {
        let allowed = AllowedRoles::parse("*");
        assert!(allowed.permits("anything"));
    }

    #[test]
    fn role_is_normalized_before_matching() {
        let allowed = AllowedRoles::parse(DISPUTE_ASSIGN_DEFAULT_ROLES);
        assert!(allowed.permits("  OPS_Admin "));
        assert!(!allowed.permits("ops_lead"));
    }

    #[test]
    fn missing_role_header_is_denied() {
        let headers = HeaderMap::new();
        let allowed = AllowedRoles::parse(UNFREEZE_DEFAULT_ROLES);
        assert!(require_governance_role(&headers, &allowed).is_err());
    }

    #[test]
    fn mismatched_actor_header_is_forbidden() {
        let mut headers = HeaderMap::new();
        headers.insert("x-governance-actor", HeaderValue::from_static("alice"));
        assert!(require_actor_consistency(&headers, "bob").is_err());
        assert!(require_actor_consistency(&headers, "alice").is_ok());
    }

    #[test]
    fn absent_actor_header_is_permitted() {
        let headers = HeaderMap::new();
        assert!(require_actor_consistency(&headers, "anyone").is_ok());
    }
}

//! The DGC backbone's inter-service trust fabric (spec §4.I, component I):
//! a shared-secret service-token gate and governance RBAC, plus the
//! `AppError` type every service's handlers return.

mod error;
mod governance;
mod service_auth;

pub use error::AppError;
pub use governance::{
    require_actor_consistency, require_governance_role, AllowedRoles,
    DISPUTE_ASSIGN_DEFAULT_ROLES, DISPUTE_RESOLVE_DEFAULT_ROLES, UNFREEZE_DEFAULT_ROLES,
};
pub use service_auth::{service_auth_middleware, ServiceAuthConfig};

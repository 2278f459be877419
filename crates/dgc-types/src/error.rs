//! Shared error kinds for the DGC backbone, following the teacher's
//! `ErrorCode` convention: every error variant carries a stable,
//! machine-readable code independent of its `Display` message.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the certificate authority (component D).
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate not found: {0}")]
    NotFound(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid purity: {0}")]
    InvalidPurity(String),
    #[error("Transition {from} -> {to} is not allowed")]
    StateConflict { from: String, to: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("ledger adapter unreachable: {0}")]
    LedgerUnreachable(String),
    #[error("ledger adapter not configured")]
    LedgerNotConfigured,
}

impl ErrorCode for CertificateError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "certificate_not_found",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidPurity(_) => "invalid_amount",
            Self::StateConflict { .. } => "state_conflict",
            Self::InvalidRequest(_) => "invalid_request",
            Self::LedgerUnreachable(_) => "ledger_adapter_unreachable",
            Self::LedgerNotConfigured => "ledger_adapter_not_configured",
        }
    }
}

/// Errors raised by the ledger adapter (component C).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("proof not found for certId: {0}")]
    ProofNotFound(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("chain write failed: {0}")]
    ChainWriteFailed(String),
}

impl ErrorCode for LedgerError {
    fn code(&self) -> &'static str {
        match self {
            Self::ProofNotFound(_) => "proof_not_found",
            Self::InvalidEvent(_) => "invalid_request",
            Self::ChainWriteFailed(_) => "chain_write_failed",
        }
    }
}

/// Errors raised by the marketplace engine (component H).
#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("listing not found: {0}")]
    ListingNotFound(String),
    #[error("missing idempotency-key header")]
    MissingIdempotencyKey,
    #[error("idempotency key reuse with a different request body")]
    IdempotencyKeyReuseConflict,
    #[error("owner does not match seller")]
    OwnerMismatch,
    #[error("listing is not in the expected state")]
    StateConflict,
    #[error("buyer does not match the lock holder")]
    BuyerMismatch,
    #[error("marketplace is frozen")]
    Frozen,
    #[error("certificate service unreachable: {0}")]
    CertificateServiceUnreachable(String),
    #[error("certificate service returned an error: {0}")]
    CertificateServiceError(String),
    #[error("reconciliation service unreachable: {0}")]
    ReconciliationServiceUnreachable(String),
    #[error("reconciliation service returned an error: {0}")]
    ReconciliationServiceError(String),
    #[error("reconciliation service returned an invalid response: {0}")]
    ReconciliationInvalidResponse(String),
    #[error("dispute already open for this listing")]
    DisputeAlreadyOpen,
    #[error("dispute service error: {0}")]
    DisputeServiceError(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ErrorCode for MarketplaceError {
    fn code(&self) -> &'static str {
        match self {
            Self::ListingNotFound(_) => "listing_not_found",
            Self::MissingIdempotencyKey => "missing_idempotency_key",
            Self::IdempotencyKeyReuseConflict => "idempotency_key_reuse_conflict",
            Self::OwnerMismatch => "owner_mismatch",
            Self::StateConflict => "state_conflict",
            Self::BuyerMismatch => "buyer_mismatch",
            Self::Frozen => "marketplace_frozen",
            Self::CertificateServiceUnreachable(_) => "certificate_service_unreachable",
            Self::CertificateServiceError(_) => "certificate_service_error",
            Self::ReconciliationServiceUnreachable(_) => "reconciliation_service_unreachable",
            Self::ReconciliationServiceError(_) => "reconciliation_service_error",
            Self::ReconciliationInvalidResponse(_) => "reconciliation_service_invalid_response",
            Self::DisputeAlreadyOpen => "state_conflict",
            Self::DisputeServiceError(_) => "dispute_service_error",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Errors raised by the risk engine (component E).
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("profile not found for target: {0}")]
    ProfileNotFound(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

impl ErrorCode for RiskError {
    fn code(&self) -> &'static str {
        match self {
            Self::ProfileNotFound(_) => "risk_profile_not_found",
            Self::InvalidEvent(_) => "invalid_request",
        }
    }
}

/// Errors raised by the reconciliation & freeze controller (component G).
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("certificate service unavailable: {0}")]
    CertificateServiceUnavailable(String),
    #[error("freeze state is not active")]
    NotFrozen,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ErrorCode for ReconciliationError {
    fn code(&self) -> &'static str {
        match self {
            Self::CertificateServiceUnavailable(_) => "certificate_service_unavailable",
            Self::NotFrozen => "state_conflict",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Errors raised by the dispute orchestrator (component F).
#[derive(Debug, Error)]
pub enum DisputeError {
    #[error("dispute not found: {0}")]
    NotFound(String),
    #[error("dispute is already resolved")]
    AlreadyResolved,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ErrorCode for DisputeError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "dispute_not_found",
            Self::AlreadyResolved => "state_conflict",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Errors raised by the trust fabric (component I), shared across services.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("missing or invalid x-service-token")]
    UnauthorizedService,
    #[error("governance role not permitted for this action")]
    Forbidden,
    #[error("x-governance-actor does not match the request body actor")]
    ActorMismatch,
}

impl ErrorCode for TrustError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnauthorizedService => "unauthorized_service",
            Self::Forbidden => "forbidden",
            Self::ActorMismatch => "forbidden",
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Codec(String),
}

impl ErrorCode for StorageError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "storage_backend_error",
            Self::Codec(_) => "storage_codec_error",
        }
    }
}

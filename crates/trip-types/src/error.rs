//! Error taxonomy: user-correctable validation failures, blocked gate
//! transitions, and propagated persistence failures.

use serde::{Deserialize, Serialize};

use crate::{AuditStoreError, InvestigationStatus, StoreError, TripStatus};

/// One user-correctable input problem. Failures are always returned as the
/// full simultaneous list so the caller can surface them together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A lifecycle transition blocked by an invariant. Always reports the
/// specific blocking reason; never silently ignored or auto-resolved.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GateViolation {
    #[error("{count} unresolved flagged cost entries must be resolved before completion")]
    UnresolvedFlags { count: usize },
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: TripStatus, to: TripStatus },
    #[error("operation requires a {expected} trip (currently {actual})")]
    WrongStatus {
        expected: TripStatus,
        actual: TripStatus,
    },
    #[error("cost entries are immutable once the trip leaves active (currently {status})")]
    CostsFrozen { status: TripStatus },
    #[error("additional costs may only be added once the trip is completed (currently {status})")]
    TooEarlyForAdditionalCosts { status: TripStatus },
    #[error("payment amount must be recorded before advancing to paid")]
    PaymentAmountMissing,
    #[error("partial payment does not advance the trip past invoiced")]
    PaymentNotReconciled,
    #[error("investigation cannot move from {from} to {to}")]
    InvalidInvestigation {
        from: InvestigationStatus,
        to: InvestigationStatus,
    },
    #[error("cost entry is not flagged; no investigation to advance")]
    NotUnderInvestigation,
    #[error("system-generated entries cannot be edited or flagged manually")]
    SystemEntryImmutable,
    #[error("cost entry is already flagged")]
    AlreadyFlagged,
}

/// Umbrella error for the engine surface.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Gate(#[from] GateViolation),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Audit(#[from] AuditStoreError),
    #[error("trip not found: {0}")]
    TripNotFound(String),
    #[error("cost entry not found: {0}")]
    CostNotFound(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl EngineError {
    /// The validation failure list, when this is a validation error.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            EngineError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

//! Case domain errors

use thiserror::Error;

/// Errors that can occur in the case domain
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Case is already assigned to a vendor")]
    AlreadyAssigned,

    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CaseError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        CaseError::UnknownValue { kind, value: value.to_string() }
    }
}

//! Dispatch domain errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Case already assigned")]
    AlreadyAssigned,

    #[error("Case does not have valid location coordinates")]
    MissingCoordinates,

    #[error("No active vendors with location data are available")]
    NoVendorsAvailable,

    #[error("Vendor not found: {0}")]
    VendorNotFound(String),

    #[error("Invalid vendor data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Case(#[from] domain_cases::CaseError),
}

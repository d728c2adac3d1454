//! Case Management Domain
//!
//! This crate implements the lifecycle of an insurance investigation case,
//! from receipt (manual entry or email intake) through field work, report
//! dispatch and closure.
//!
//! # Case Lifecycle
//!
//! ```text
//! Open -> WIP -> Completed -> Dispatch -> Closed
//!   \______\_________\____________________/ (close early)
//! Closed -> Open (reopen)
//! ```

pub mod case;
pub mod status;
pub mod client;
pub mod document;
pub mod checklist;
pub mod dashboard;
pub mod error;

pub use case::{
    InsuranceCase, NewCase, CaseCategory, CaseType, Priority, CaseSource,
    PartyDetails, DocumentChecks, SpotDetails, PoliceDetails, DispatchDetails,
    IncidentLocation, SLA_WITHIN, SLA_BREACHED, DEFAULT_DUE_DAYS,
};
pub use status::{CaseStatus, ReportStatus};
pub use client::{Client, InvestigationRates};
pub use document::{CaseDocument, DocumentType, classify_document};
pub use checklist::InvestigationChecklist;
pub use dashboard::{CaseStats, CaseVolume, StatusCount, RecentActivity, case_volume_window};
pub use error::CaseError;

//! Core Kernel - Foundational types shared by every claims desk crate
//!
//! This crate provides the building blocks used across all domain modules:
//! - Strongly-typed identifiers for users, vendors, cases and intake records
//! - Geographic points and great-circle distance (Haversine)
//! - Calendar helpers for receipt months, due dates and elapsed-time labels

pub mod identifiers;
pub mod geo;
pub mod calendar;
pub mod error;

pub use identifiers::{
    UserId, VendorId, CaseId, ClientId, DocumentId, EmailIntakeId,
    AttachmentId, EvidenceId, AuthTokenId, VerificationCodeId, MailboxId,
};
pub use geo::{GeoPoint, GeoError, haversine_km, EARTH_RADIUS_KM};
pub use calendar::{receipt_month, add_days, humanize_elapsed};
pub use error::CoreError;

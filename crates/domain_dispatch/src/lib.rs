//! Dispatch Domain
//!
//! Field vendors who investigate cases on the ground, the geographic
//! matching that picks the closest vendor for a case, and the GPS checks
//! applied to evidence photos uploaded from the field.

pub mod vendor;
pub mod assignment;
pub mod exif_gps;
pub mod evidence;
pub mod error;

pub use vendor::{Vendor, NewVendor, DEFAULT_COUNTRY};
pub use assignment::{find_nearest_vendor, auto_assign, VendorMatch};
pub use exif_gps::read_gps;
pub use evidence::{
    validate_evidence, Evidence, EvidenceVerdict, RejectionReason, DEFAULT_GEOFENCE_RADIUS_KM,
};
pub use error::DispatchError;

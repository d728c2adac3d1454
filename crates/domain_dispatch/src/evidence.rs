//! Geofenced evidence photos

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{CaseId, EvidenceId, GeoPoint, VendorId};
use crate::exif_gps::read_gps;

/// Distance from the incident within which a photo counts as on-site
pub const DEFAULT_GEOFENCE_RADIUS_KM: f64 = 1.0;

/// Why a photo was refused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The photo carries no GPS tags
    NoGpsData,
    /// The case has no coordinates to compare against
    CaseHasNoLocation,
    OutsideGeofence { distance_km: f64, radius_km: f64 },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NoGpsData => {
                f.write_str("GPS Required: photo has no GPS location data")
            }
            RejectionReason::CaseHasNoLocation => {
                f.write_str("Case does not have valid location coordinates")
            }
            RejectionReason::OutsideGeofence { distance_km, radius_km } => write!(
                f,
                "Photo was taken {:.2} km from the incident, outside the {:.2} km radius",
                distance_km, radius_km
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum EvidenceVerdict {
    Accepted { point: GeoPoint, distance_km: f64 },
    Rejected(RejectionReason),
}

impl EvidenceVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EvidenceVerdict::Accepted { .. })
    }
}

/// Checks that a photo was taken within `radius_km` of the case location
///
/// GPS is checked before the case location, so a photo without GPS is
/// always reported as such.
pub fn validate_evidence(photo: &[u8], case_point: Option<GeoPoint>, radius_km: f64) -> EvidenceVerdict {
    let Some(point) = read_gps(photo) else {
        return EvidenceVerdict::Rejected(RejectionReason::NoGpsData);
    };
    let Some(case_point) = case_point else {
        return EvidenceVerdict::Rejected(RejectionReason::CaseHasNoLocation);
    };

    let distance_km = (case_point.distance_km(&point) * 100.0).round() / 100.0;
    if distance_km <= radius_km {
        EvidenceVerdict::Accepted { point, distance_km }
    } else {
        EvidenceVerdict::Rejected(RejectionReason::OutsideGeofence { distance_km, radius_km })
    }
}

/// An accepted photo stored against a case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EvidenceId,
    pub case_id: CaseId,
    pub vendor_id: VendorId,
    pub file_name: String,
    pub content_type: String,
    pub file_path: String,
    pub size_bytes: i64,
    pub point: GeoPoint,
    pub distance_km: f64,
    pub uploaded_at: DateTime<Utc>,
}

impl Evidence {
    #[allow(clippy::too_many_arguments)]
    pub fn accepted(
        case_id: CaseId,
        vendor_id: VendorId,
        file_name: &str,
        content_type: &str,
        file_path: String,
        size_bytes: i64,
        point: GeoPoint,
        distance_km: f64,
    ) -> Self {
        Self {
            id: EvidenceId::new_v7(),
            case_id,
            vendor_id,
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            file_path,
            size_bytes,
            point,
            distance_km,
            uploaded_at: Utc::now(),
        }
    }
}

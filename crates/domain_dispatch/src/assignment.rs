//! Nearest-vendor matching

use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{GeoPoint, VendorId};
use domain_cases::InsuranceCase;
use crate::error::DispatchError;
use crate::vendor::Vendor;

/// The vendor picked for a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorMatch {
    pub vendor_id: VendorId,
    pub company_name: String,
    /// Great-circle distance, rounded to two decimals
    pub distance_km: f64,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Closest active, geolocated vendor; on a tie the earlier vendor wins
pub fn find_nearest_vendor(case_point: &GeoPoint, vendors: &[Vendor]) -> Option<VendorMatch> {
    let mut best: Option<(&Vendor, f64)> = None;
    for vendor in vendors.iter().filter(|v| v.is_active) {
        let Some(point) = vendor.location else { continue };
        let distance = case_point.distance_km(&point);
        if best.map_or(true, |(_, min)| distance < min) {
            best = Some((vendor, distance));
        }
    }

    best.map(|(vendor, distance)| VendorMatch {
        vendor_id: vendor.id,
        company_name: vendor.company_name.clone(),
        distance_km: (distance * 100.0).round() / 100.0,
        city: vendor.city.clone(),
        state: vendor.state.clone(),
    })
}

/// Assigns an unassigned, geolocated case to its nearest vendor
pub fn auto_assign(case: &mut InsuranceCase, vendors: &[Vendor]) -> Result<VendorMatch, DispatchError> {
    if case.assigned_vendor_id.is_some() {
        return Err(DispatchError::AlreadyAssigned);
    }
    let point = case.point().ok_or(DispatchError::MissingCoordinates)?;
    let matched = find_nearest_vendor(&point, vendors).ok_or(DispatchError::NoVendorsAvailable)?;

    case.assign_vendor(matched.vendor_id)?;
    info!(
        case_number = %case.case_number,
        vendor = %matched.company_name,
        distance_km = matched.distance_km,
        "case auto-assigned to nearest vendor"
    );
    Ok(matched)
}

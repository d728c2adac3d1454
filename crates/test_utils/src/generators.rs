//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use proptest::prelude::*;

use core_kernel::GeoPoint;
use domain_cases::{CaseCategory, CaseStatus, InvestigationChecklist, Priority};
use domain_identity::Role;

/// Kilometres per degree of latitude
const KM_PER_DEGREE: f64 = 111.32;

/// Strategy for any valid point on the globe
pub fn geo_point_strategy() -> impl Strategy<Value = GeoPoint> {
    (-90.0f64..=90.0, -180.0f64..=180.0)
        .prop_map(|(latitude, longitude)| GeoPoint { latitude, longitude })
}

/// Strategy for points in India, away from the poles and the antimeridian
pub fn indian_point_strategy() -> impl Strategy<Value = GeoPoint> {
    (8.0f64..=35.0, 68.0f64..=97.0)
        .prop_map(|(latitude, longitude)| GeoPoint { latitude, longitude })
}

/// Strategy for a point offset from `center` by at most `max_km` along each axis
///
/// The offset is scaled by the cosine of the latitude so that east-west
/// distances stay in kilometres. Use centres well away from the poles.
pub fn point_near(center: GeoPoint, max_km: f64) -> impl Strategy<Value = GeoPoint> {
    (-1.0f64..=1.0, -1.0f64..=1.0).prop_map(move |(dy, dx)| {
        let lat_offset = dy * max_km / KM_PER_DEGREE;
        let lon_offset = dx * max_km / (KM_PER_DEGREE * center.latitude.to_radians().cos());
        GeoPoint {
            latitude: center.latitude + lat_offset,
            longitude: center.longitude + lon_offset,
        }
    })
}

/// Strategy for insurer claim numbers such as `2526005829`
pub fn claim_number_strategy() -> impl Strategy<Value = String> {
    "[1-9][0-9]{9}"
}

/// Strategy for case statuses
pub fn case_status_strategy() -> impl Strategy<Value = CaseStatus> {
    prop::sample::select(CaseStatus::ALL.to_vec())
}

pub fn case_category_strategy() -> impl Strategy<Value = CaseCategory> {
    prop_oneof![
        Just(CaseCategory::Mact),
        Just(CaseCategory::Civil),
        Just(CaseCategory::Criminal),
        Just(CaseCategory::Other),
    ]
}

pub fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::Urgent),
    ]
}

pub fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

/// Strategy for checklists with any combination of ticked items
pub fn checklist_strategy() -> impl Strategy<Value = InvestigationChecklist> {
    prop::collection::vec(any::<bool>(), InvestigationChecklist::ITEMS).prop_map(|flags| InvestigationChecklist {
        spot: flags[0],
        hospital: flags[1],
        claimant: flags[2],
        insured: flags[3],
        witness: flags[4],
        driver: flags[5],
        dl: flags[6],
        rc: flags[7],
        permit: flags[8],
        court: flags[9],
        notice: flags[10],
        notice_134: flags[11],
        rti: flags[12],
        medical_verification: flags[13],
        income: flags[14],
    })
}

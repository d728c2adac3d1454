//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::GeoPoint;
use domain_cases::{CaseStatus, InsuranceCase};
use domain_dispatch::{EvidenceVerdict, RejectionReason};
use domain_intake::{IngestOutcome, MappingOutcome};

/// Asserts that two points are within `tolerance_km` of each other
///
/// # Panics
///
/// Panics if the great-circle distance exceeds the tolerance
pub fn assert_within_km(actual: &GeoPoint, expected: &GeoPoint, tolerance_km: f64) {
    let distance = actual.distance_km(expected);
    assert!(
        distance <= tolerance_km,
        "Points are {:.4} km apart, more than {} km: actual=({}, {}), expected=({}, {})",
        distance,
        tolerance_km,
        actual.latitude,
        actual.longitude,
        expected.latitude,
        expected.longitude
    );
}

/// Asserts that a case is in the given status
pub fn assert_case_status(case: &InsuranceCase, expected: CaseStatus) {
    assert_eq!(
        case.status, expected,
        "Case {} is {}, expected {}",
        case.case_number, case.status, expected
    );
}

/// Asserts the case number has the `CASE-XXXXXXXX` shape
pub fn assert_case_number_format(case_number: &str) {
    let suffix = case_number
        .strip_prefix("CASE-")
        .unwrap_or_else(|| panic!("Case number {} lacks the CASE- prefix", case_number));
    assert_eq!(suffix.len(), 8, "Case number {} has a suffix of the wrong length", case_number);
    assert!(
        suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
        "Case number {} has invalid characters",
        case_number
    );
}

/// Asserts that a photo was accepted and returns its distance from the case
pub fn assert_accepted(verdict: &EvidenceVerdict) -> f64 {
    match verdict {
        EvidenceVerdict::Accepted { distance_km, .. } => *distance_km,
        EvidenceVerdict::Rejected(reason) => panic!("Expected the photo to be accepted, rejected with: {}", reason),
    }
}

/// Asserts that a photo was rejected and returns the reason
pub fn assert_rejected(verdict: &EvidenceVerdict) -> &RejectionReason {
    match verdict {
        EvidenceVerdict::Rejected(reason) => reason,
        EvidenceVerdict::Accepted { distance_km, .. } => {
            panic!("Expected the photo to be rejected, accepted at {} km", distance_km)
        }
    }
}

/// Asserts that ingesting a message mapped it and returns the mapping
pub fn assert_processed(outcome: &IngestOutcome) -> &MappingOutcome {
    match outcome {
        IngestOutcome::Processed { mapping, .. } => mapping,
        IngestOutcome::Duplicate => panic!("Expected the message to be processed, it was a duplicate"),
    }
}

/// Asserts that a mapping opened a new case for `claim_number`
pub fn assert_case_created(mapping: &MappingOutcome, claim_number: &str) {
    match mapping {
        MappingOutcome::Created { claim_number: actual, .. } => assert_eq!(actual, claim_number),
        other => panic!("Expected a case to be created for {}, got {:?}", claim_number, other),
    }
}

/// Asserts that a mapping updated the case for `claim_number`
pub fn assert_case_updated(mapping: &MappingOutcome, claim_number: &str) {
    match mapping {
        MappingOutcome::Updated { claim_number: actual, .. } => assert_eq!(actual, claim_number),
        other => panic!("Expected the case for {} to be updated, got {:?}", claim_number, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{CaseFixtures, GeoFixtures};

    #[test]
    fn test_assert_within_km_passes() {
        assert_within_km(&GeoFixtures::thane(), &GeoFixtures::near_thane(), 1.0);
    }

    #[test]
    #[should_panic(expected = "km apart")]
    fn test_assert_within_km_fails() {
        assert_within_km(&GeoFixtures::thane(), &GeoFixtures::pune(), 1.0);
    }

    #[test]
    fn test_case_number_format() {
        assert_case_number_format(&CaseFixtures::open("CLM-1").case_number);
    }

    #[test]
    #[should_panic(expected = "lacks the CASE- prefix")]
    fn test_case_number_format_rejects_claim_numbers() {
        assert_case_number_format("2526005829");
    }

    #[test]
    #[should_panic(expected = "rejected with")]
    fn test_assert_accepted_on_rejection() {
        assert_accepted(&EvidenceVerdict::Rejected(RejectionReason::NoGpsData));
    }
}

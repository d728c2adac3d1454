//! Dispatch Workflow Tests
//!
//! Follows a case from assignment to the nearest vendor through geofenced
//! evidence and the status workflow.

use chrono::NaiveDate;

use domain_cases::{CaseStats, CaseStatus};
use domain_dispatch::{
    auto_assign, validate_evidence, DispatchError, Evidence, RejectionReason, DEFAULT_GEOFENCE_RADIUS_KM,
};
use test_utils::{
    assert_accepted, assert_case_status, assert_rejected, CaseFixtures, GeoFixtures, PhotoFixtures, TestCaseBuilder,
    VendorFixtures,
};

// ============================================================================
// Assignment
// ============================================================================

mod assignment {
    use super::*;

    #[test]
    fn test_case_goes_to_closest_vendor() {
        let vendors = vec![
            VendorFixtures::at("Pune Surveyors", GeoFixtures::pune()),
            VendorFixtures::at("Thane Investigations", GeoFixtures::thane()),
            VendorFixtures::at("Mumbai Field Services", GeoFixtures::mumbai()),
            VendorFixtures::unlocated("Remote Desk"),
        ];
        let mut case = CaseFixtures::located("2526005829", GeoFixtures::near_thane());

        let matched = auto_assign(&mut case, &vendors).unwrap();

        assert_eq!(matched.company_name, "Thane Investigations");
        assert_eq!(case.assigned_vendor_id, Some(vendors[1].id));
        assert!(matched.distance_km < 1.0);
    }

    #[test]
    fn test_inactive_vendor_is_passed_over() {
        let mut nearby = VendorFixtures::at("Thane Investigations", GeoFixtures::thane());
        nearby.deactivate();
        let vendors = vec![nearby, VendorFixtures::at("Mumbai Field Services", GeoFixtures::mumbai())];
        let mut case = CaseFixtures::located("2526005830", GeoFixtures::near_thane());

        let matched = auto_assign(&mut case, &vendors).unwrap();
        assert_eq!(matched.company_name, "Mumbai Field Services");
    }

    #[test]
    fn test_second_assignment_is_refused() {
        let vendors = vec![VendorFixtures::at("Thane Investigations", GeoFixtures::thane())];
        let mut case = CaseFixtures::located("2526005831", GeoFixtures::thane());
        auto_assign(&mut case, &vendors).unwrap();

        assert!(matches!(auto_assign(&mut case, &vendors), Err(DispatchError::AlreadyAssigned)));
    }

    #[test]
    fn test_case_without_location_cannot_be_assigned() {
        let vendors = vec![VendorFixtures::at("Thane Investigations", GeoFixtures::thane())];
        let mut case = CaseFixtures::open("2526005832");

        assert!(matches!(auto_assign(&mut case, &vendors), Err(DispatchError::MissingCoordinates)));
        assert_eq!(case.assigned_vendor_id, None);
    }

    #[test]
    fn test_no_geolocated_vendors() {
        let vendors = vec![VendorFixtures::unlocated("Remote Desk")];
        let mut case = CaseFixtures::located("2526005833", GeoFixtures::thane());

        assert!(matches!(auto_assign(&mut case, &vendors), Err(DispatchError::NoVendorsAvailable)));
    }
}

// ============================================================================
// Evidence
// ============================================================================

mod evidence {
    use super::*;

    #[test]
    fn test_photo_on_site_is_accepted() {
        let case = CaseFixtures::located("2526005829", GeoFixtures::thane());
        let photo = PhotoFixtures::geotagged(GeoFixtures::near_thane());

        let verdict = validate_evidence(&photo, case.point(), DEFAULT_GEOFENCE_RADIUS_KM);

        let distance = assert_accepted(&verdict);
        assert!(distance > 0.2 && distance < 0.6, "unexpected distance {}", distance);
    }

    #[test]
    fn test_photo_from_elsewhere_is_rejected() {
        let case = CaseFixtures::located("2526005829", GeoFixtures::thane());
        let photo = PhotoFixtures::geotagged(GeoFixtures::mumbai());

        let verdict = validate_evidence(&photo, case.point(), DEFAULT_GEOFENCE_RADIUS_KM);

        match assert_rejected(&verdict) {
            RejectionReason::OutsideGeofence { distance_km, radius_km } => {
                assert!(*distance_km > 20.0);
                assert_eq!(*radius_km, DEFAULT_GEOFENCE_RADIUS_KM);
            }
            other => panic!("unexpected rejection {:?}", other),
        }
    }

    #[test]
    fn test_wider_radius_admits_distant_photo() {
        let case = CaseFixtures::located("2526005829", GeoFixtures::thane());
        let photo = PhotoFixtures::geotagged(GeoFixtures::mumbai());

        assert!(validate_evidence(&photo, case.point(), 50.0).is_accepted());
    }

    #[test]
    fn test_photo_without_gps_is_rejected() {
        let case = CaseFixtures::located("2526005829", GeoFixtures::thane());

        let verdict = validate_evidence(&PhotoFixtures::untagged(), case.point(), DEFAULT_GEOFENCE_RADIUS_KM);

        assert_eq!(assert_rejected(&verdict), &RejectionReason::NoGpsData);
        assert!(assert_rejected(&verdict).to_string().starts_with("GPS Required"));
    }

    #[test]
    fn test_case_without_location_rejects_tagged_photo() {
        let case = CaseFixtures::open("2526005829");
        let photo = PhotoFixtures::geotagged(GeoFixtures::thane());

        let verdict = validate_evidence(&photo, case.point(), DEFAULT_GEOFENCE_RADIUS_KM);
        assert_eq!(assert_rejected(&verdict), &RejectionReason::CaseHasNoLocation);
    }
}

// ============================================================================
// End to end
// ============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn test_assigned_case_is_investigated_and_closed() {
        let vendor = VendorFixtures::at("Thane Investigations", GeoFixtures::thane());
        let mut case = TestCaseBuilder::new("2526005829")
            .with_receipt_date(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
            .at(GeoFixtures::near_thane())
            .build();

        auto_assign(&mut case, std::slice::from_ref(&vendor)).unwrap();
        case.update_status(CaseStatus::Wip).unwrap();

        let photo = PhotoFixtures::geotagged(GeoFixtures::thane());
        let verdict = validate_evidence(&photo, case.point(), DEFAULT_GEOFENCE_RADIUS_KM);
        let distance = assert_accepted(&verdict);
        let evidence = Evidence::accepted(
            case.id,
            vendor.id,
            "spot.jpg",
            "image/jpeg",
            format!("evidence/{}/spot.jpg", case.id),
            photo.len() as i64,
            GeoFixtures::thane(),
            distance,
        );
        assert_eq!(evidence.case_id, case.id);
        assert_eq!(evidence.vendor_id, vendor.id);

        case.update_status(CaseStatus::Completed).unwrap();
        assert!(case.completion_date.is_some());
        assert!(case.tat_days.is_some());

        case.update_status(CaseStatus::Dispatch).unwrap();
        case.update_status(CaseStatus::Closed).unwrap();
        assert_case_status(&case, CaseStatus::Closed);
        assert!(case.closed_at.is_some());
    }

    #[test]
    fn test_open_case_cannot_skip_to_dispatch() {
        let mut case = CaseFixtures::open("2526005829");
        assert!(case.update_status(CaseStatus::Dispatch).is_err());
        assert_case_status(&case, CaseStatus::Open);
    }

    #[test]
    fn test_dashboard_counts_follow_the_workflow() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let open = CaseFixtures::open("1000000001");
        let mut wip = CaseFixtures::open("1000000002");
        wip.update_status(CaseStatus::Wip).unwrap();
        let mut closed = CaseFixtures::open("1000000003");
        closed.update_status(CaseStatus::Closed).unwrap();

        let stats = CaseStats::compute(&[open, wip, closed], today);

        assert_eq!(stats.total_cases, 3);
        assert_eq!(stats.pending_cases, 1);
        assert_eq!(stats.active_investigations, 1);
        assert_eq!(stats.completed_cases, 1);
        assert_eq!(stats.overdue_cases, 0);
    }
}

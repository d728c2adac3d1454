//! Comprehensive tests for domain_cases

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{EmailIntakeId, GeoPoint, VendorId};

use domain_cases::case::{
    CaseCategory, CaseSource, InsuranceCase, NewCase, Priority, SLA_BREACHED, SLA_WITHIN,
};
use domain_cases::checklist::InvestigationChecklist;
use domain_cases::client::Client;
use domain_cases::dashboard::{case_volume_window, CaseStats, RecentActivity, StatusCount};
use domain_cases::document::{classify_document, CaseDocument, DocumentType};
use domain_cases::status::{CaseStatus, ReportStatus};
use domain_cases::CaseError;

fn receipt() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
}

fn create_test_case() -> InsuranceCase {
    let mut new = NewCase::new("CLM-2025-0001", "ICICI Lombard", receipt());
    new.category = CaseCategory::Mact;
    new.claimant_name = Some("Ramesh Kumar".to_string());
    InsuranceCase::new_manual(new).unwrap()
}

// ============================================================================
// Case Tests
// ============================================================================

mod case_tests {
    use super::*;

    #[test]
    fn test_new_manual_case_defaults() {
        let case = create_test_case();

        assert_eq!(case.status, CaseStatus::Open);
        assert_eq!(case.report_status, ReportStatus::Pending);
        assert_eq!(case.source, CaseSource::Manual);
        assert_eq!(case.priority, Priority::Medium);
        assert_eq!(case.receipt_month, "Jan-25");
        assert_eq!(case.due_date, NaiveDate::from_ymd_opt(2025, 2, 9));
        assert!(case.case_number.starts_with("CASE-"));
        assert_eq!(case.claimant.name.as_deref(), Some("Ramesh Kumar"));
        assert!(case.assigned_vendor_id.is_none());
    }

    #[test]
    fn test_new_case_requires_claim_number() {
        let new = NewCase::new("   ", "ICICI Lombard", receipt());
        let result = InsuranceCase::new_manual(new);
        assert!(matches!(result, Err(CaseError::Validation(_))));
    }

    #[test]
    fn test_new_from_email_links_source() {
        let email_id = EmailIntakeId::new();
        let new = NewCase::new("CLM-9", "SBI General", receipt());
        let case = InsuranceCase::new_from_email(new, email_id).unwrap();

        assert_eq!(case.source, CaseSource::Email);
        assert_eq!(case.source_email_id, Some(email_id));
    }

    #[test]
    fn test_case_numbers_are_unique() {
        let a = create_test_case();
        let b = create_test_case();
        assert_ne!(a.case_number, b.case_number);
    }

    #[test]
    fn test_append_note() {
        let mut case = create_test_case();
        case.append_note("First");
        case.append_note("Second");
        assert_eq!(case.notes, "First\n\nSecond");
    }
}

// ============================================================================
// Status Workflow Tests
// ============================================================================

mod status_tests {
    use super::*;

    #[test]
    fn test_open_to_wip() {
        let mut case = create_test_case();
        assert!(case.update_status(CaseStatus::Wip).is_ok());
        assert_eq!(case.status, CaseStatus::Wip);
    }

    #[test]
    fn test_open_to_completed_is_rejected() {
        let mut case = create_test_case();
        let result = case.update_status(CaseStatus::Completed);
        assert!(matches!(result, Err(CaseError::InvalidStatusTransition { .. })));
        assert_eq!(case.status, CaseStatus::Open);
    }

    #[test]
    fn test_completed_stamps_completion() {
        let mut case = create_test_case();
        case.update_status(CaseStatus::Wip).unwrap();
        case.update_status(CaseStatus::Completed).unwrap();

        assert!(case.completion_date.is_some());
        assert!(case.completion_month.is_some());
        assert!(case.tat_days.is_some());
        assert_eq!(case.report_status, ReportStatus::Completed);
    }

    #[test]
    fn test_dispatch_stamps_dispatch_date() {
        let mut case = create_test_case();
        case.update_status(CaseStatus::Wip).unwrap();
        case.update_status(CaseStatus::Completed).unwrap();
        case.update_status(CaseStatus::Dispatch).unwrap();

        assert_eq!(case.dispatch.date, Some(Utc::now().date_naive()));
        assert_eq!(case.report_status, ReportStatus::Dispatch);
    }

    #[test]
    fn test_close_and_reopen() {
        let mut case = create_test_case();
        case.update_status(CaseStatus::Closed).unwrap();
        assert!(case.closed_at.is_some());

        case.update_status(CaseStatus::Open).unwrap();
        assert!(case.closed_at.is_none());
        assert_eq!(case.status, CaseStatus::Open);
    }

    #[test]
    fn test_transition_table() {
        use CaseStatus::*;
        let allowed = [
            (Open, Wip),
            (Open, Closed),
            (Wip, Completed),
            (Wip, Closed),
            (Completed, Dispatch),
            (Completed, Closed),
            (Dispatch, Closed),
            (Closed, Open),
        ];
        for from in CaseStatus::ALL {
            for to in CaseStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_status_parsing_accepts_legacy_values() {
        assert_eq!("IN_PROGRESS".parse::<CaseStatus>().unwrap(), CaseStatus::Wip);
        assert_eq!("wip".parse::<CaseStatus>().unwrap(), CaseStatus::Wip);
        assert!("RESOLVED".parse::<CaseStatus>().is_err());
    }
}

// ============================================================================
// Vendor Assignment Tests
// ============================================================================

mod assignment_tests {
    use super::*;

    #[test]
    fn test_assign_vendor_once() {
        let mut case = create_test_case();
        let vendor = VendorId::new();

        assert!(case.assign_vendor(vendor).is_ok());
        assert_eq!(case.assigned_vendor_id, Some(vendor));

        let again = case.assign_vendor(VendorId::new());
        assert!(matches!(again, Err(CaseError::AlreadyAssigned)));
        assert_eq!(case.assigned_vendor_id, Some(vendor));
    }

    #[test]
    fn test_reassign_vendor_returns_previous() {
        let mut case = create_test_case();
        let first = VendorId::new();
        let second = VendorId::new();
        case.assign_vendor(first).unwrap();

        assert_eq!(case.reassign_vendor(second), Some(first));
        assert_eq!(case.assigned_vendor_id, Some(second));
    }
}

// ============================================================================
// TAT / SLA Tests
// ============================================================================

mod tat_tests {
    use super::*;

    #[test]
    fn test_tat_while_open_uses_today() {
        let case = create_test_case();
        let today = NaiveDate::from_ymd_opt(2025, 1, 25).unwrap();
        assert_eq!(case.calculate_tat(today), 15);
    }

    #[test]
    fn test_tat_uses_completion_date() {
        let mut case = create_test_case();
        case.completion_date = Some(Utc.with_ymd_and_hms(2025, 1, 20, 9, 0, 0).unwrap());
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(case.calculate_tat(today), 10);
    }

    #[test]
    fn test_overdue_only_when_unfinished() {
        let mut case = create_test_case();
        let late = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(case.is_overdue(late));
        assert!(!case.is_overdue(receipt()));

        case.status = CaseStatus::Closed;
        assert!(!case.is_overdue(late));
    }

    #[test]
    fn test_sla_status() {
        let case = create_test_case();
        assert_eq!(case.sla_status(NaiveDate::from_ymd_opt(2025, 2, 9).unwrap()), SLA_WITHIN);
        assert_eq!(case.sla_status(NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()), SLA_BREACHED);
    }
}

// ============================================================================
// Document Classification Tests
// ============================================================================

mod document_tests {
    use super::*;

    #[test]
    fn test_filename_rules() {
        assert_eq!(classify_document("Policy_Schedule.pdf", ""), DocumentType::Policy);
        assert_eq!(classify_document("petition copy.pdf", ""), DocumentType::Petition);
        assert_eq!(classify_document("FIR-123.pdf", ""), DocumentType::Fir);
        assert_eq!(classify_document("hospital_bill.pdf", ""), DocumentType::Medical);
        assert_eq!(classify_document("spot.jpg", ""), DocumentType::SpotPhoto);
        assert_eq!(classify_document("driving_licence.pdf", ""), DocumentType::Dl);
        assert_eq!(classify_document("vehicle_registration.pdf", ""), DocumentType::Rc);
        assert_eq!(classify_document("permit.pdf", ""), DocumentType::Permit);
        assert_eq!(classify_document("misc.pdf", ""), DocumentType::Other);
    }

    #[test]
    fn test_text_rules_only_for_policy_and_fir() {
        assert_eq!(classify_document("scan.pdf", "This POLICY schedule"), DocumentType::Policy);
        assert_eq!(classify_document("scan.pdf", "First Information Report (FIR)"), DocumentType::Fir);
        assert_eq!(classify_document("scan.pdf", "hospital discharge summary"), DocumentType::Other);
    }

    #[test]
    fn test_text_beyond_500_chars_is_ignored() {
        let text = format!("{}policy", "x".repeat(500));
        assert_eq!(classify_document("scan.pdf", &text), DocumentType::Other);
    }

    #[test]
    fn test_policy_wins_over_petition() {
        assert_eq!(classify_document("petition_policy.pdf", ""), DocumentType::Policy);
    }

    #[test]
    fn test_classified_document() {
        let case = create_test_case();
        let doc = CaseDocument::classified(case.id, None, "FIR.pdf", "text");
        assert_eq!(doc.document_type, DocumentType::Fir);
        assert_eq!(doc.case_id, case.id);
        assert_eq!(doc.document_type.as_str().parse::<DocumentType>().unwrap(), DocumentType::Fir);
    }
}

// ============================================================================
// Client & Checklist Tests
// ============================================================================

mod client_tests {
    use super::*;

    #[test]
    fn test_client_validation() {
        assert!(Client::new("", "Name").is_err());
        assert!(Client::new("ABC", "  ").is_err());
        assert!(Client::new(&"X".repeat(21), "Name").is_err());

        let client = Client::new("sbig", "SBI General Insurance").unwrap();
        assert_eq!(client.client_code, "SBIG");
        assert!(client.is_active);
    }

    #[test]
    fn test_matches_name_is_case_insensitive_containment() {
        let client = Client::new("ICICI", "ICICI Lombard General Insurance").unwrap();
        assert!(client.matches_name("icici lombard"));
        assert!(!client.matches_name("HDFC ERGO"));
        assert!(!client.matches_name(""));
    }

    #[test]
    fn test_investigation_charges() {
        let mut client = Client::new("TATA", "TATA AIG").unwrap();
        client.rates.spot = Some(dec!(1500));
        client.rates.claimant = Some(dec!(750.50));
        client.rates.rti = Some(dec!(300));

        let checklist = InvestigationChecklist {
            spot: true,
            claimant: true,
            witness: true,
            ..Default::default()
        };

        assert_eq!(client.investigation_charges(&checklist), dec!(2250.50));
    }

    #[test]
    fn test_checklist_progress() {
        let mut checklist = InvestigationChecklist::default();
        assert_eq!(checklist.progress(), 0);

        checklist.spot = true;
        checklist.dl = true;
        checklist.rc = true;
        assert_eq!(checklist.completed(), 3);
        assert_eq!(checklist.progress(), 20);
    }
}

// ============================================================================
// Dashboard Tests
// ============================================================================

mod dashboard_tests {
    use super::*;

    #[test]
    fn test_stats_from_counts() {
        let stats = CaseStats::from_status_counts(
            &[
                (CaseStatus::Open, 4),
                (CaseStatus::Wip, 3),
                (CaseStatus::Completed, 2),
                (CaseStatus::Dispatch, 1),
                (CaseStatus::Closed, 5),
            ],
            2,
        );

        assert_eq!(stats.total_cases, 15);
        assert_eq!(stats.pending_cases, 4);
        assert_eq!(stats.active_investigations, 3);
        assert_eq!(stats.completed_cases, 8);
        assert_eq!(stats.overdue_cases, 2);
    }

    #[test]
    fn test_stats_compute_counts_overdue() {
        let open = create_test_case();
        let mut closed = create_test_case();
        closed.status = CaseStatus::Closed;

        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let stats = CaseStats::compute(&[open, closed], today);
        assert_eq!(stats.total_cases, 2);
        assert_eq!(stats.overdue_cases, 1);
    }

    #[test]
    fn test_volume_window_zero_fills() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let rows = vec![(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 7, 3)];
        let volume = case_volume_window(&rows, today);

        let months: Vec<&str> = volume.iter().map(|v| v.month.as_str()).collect();
        assert_eq!(months, vec!["Oct", "Nov", "Dec", "Jan", "Feb", "Mar"]);
        assert_eq!(volume[3].total, 7);
        assert_eq!(volume[3].completed, 3);
        assert!(volume.iter().enumerate().all(|(i, v)| i == 3 || v.total == 0));
    }

    #[test]
    fn test_status_distribution_sorted() {
        let slices = StatusCount::distribution(&[
            (CaseStatus::Open, 2),
            (CaseStatus::Wip, 5),
            (CaseStatus::Closed, 0),
        ]);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].label, "In Progress");
        assert_eq!(slices[1].label, "New");
    }

    #[test]
    fn test_recent_activity_text() {
        let now = Utc::now();
        let activity = RecentActivity::for_case("CASE-AB12CD34", "Claim X", now - Duration::hours(2), now);
        assert_eq!(activity.text, "Case CASE-AB12CD34 - Claim X");
        assert_eq!(activity.time, "2 hours ago");

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "status_change");
    }

    #[test]
    fn test_case_point() {
        let mut case = create_test_case();
        assert!(case.point().is_none());
        case.location.point = Some(GeoPoint::new(18.52, 73.85).unwrap());
        assert!(case.point().is_some());
    }
}

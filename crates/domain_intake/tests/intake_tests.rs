//! Tests for domain_intake

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;

use core_kernel::EmailIntakeId;
use domain_cases::{CaseCategory, CaseStatus, CaseType, DocumentType, InsuranceCase, NewCase, ReportStatus};
use domain_intake::extractor::FULL_INVESTIGATION;
use domain_intake::{
    apply_update, build_case, link_documents, parse_gmail_message, AttachmentSource, CaseExtraction,
    GmailMessage, InboundAttachment, InboundEmail, SourceTexts, StoredAttachment, PENDING, TO_BE_VERIFIED,
    UNKNOWN_INSURER,
};

const POLICY_TEXT: &str = "SBI General Insurance Company Limited\n\
Policy Schedule\n\
Policy No: 0001234567890\n\
Insured Name: Ramesh Kumar\n\
Address: 12 Lake Road, Naupada\n\
Thane West, Maharashtra 400602\n\
Registration No: MH04AB1234\n\
Coverage: Comprehensive\n";

const PETITION_TEXT: &str = "BEFORE THE MOTOR ACCIDENT CLAIMS TRIBUNAL, THANE\n\
Petitioner Name - Sunita Devi\n\
Address: House No 5, Gandhi Nagar, Thane";

const BODY_TEXT: &str = "Dear Sir,\n\n\
Please find the claim details below.\n\
Driver Name: Mohan Lal\n\
Date of Accident: 12/03/2024\n\
District: Thane\n\n\
Regards,\nClaims Team";

fn email(subject: &str, body: &str) -> InboundEmail {
    InboundEmail {
        message_id: "18d2f0c9a1b2c3d4".to_string(),
        thread_id: Some("18d2f0c9a1b2c3d4".to_string()),
        subject: subject.to_string(),
        sender_email: "claims@sbigeneral.example".to_string(),
        sender_name: "Claims Team".to_string(),
        recipient_email: "desk@example.com".to_string(),
        cc: String::new(),
        bcc: String::new(),
        body_text: body.to_string(),
        body_html: String::new(),
        received_at: Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap(),
        has_attachments: false,
    }
}

fn pdf(name: &str, text: &str) -> InboundAttachment {
    InboundAttachment::with_text(name, "application/pdf", text)
}

fn intimation() -> (InboundEmail, Vec<InboundAttachment>) {
    let email = email(
        "Intimation - Claim no. 2526005829 / MACT No 245/2024 / Location - Thane / File No W6607",
        BODY_TEXT,
    );
    let attachments = vec![
        pdf("Policy_Schedule.pdf", POLICY_TEXT),
        pdf("mact_petition.pdf", PETITION_TEXT),
        pdf("fir_copy.pdf", "FIR No 123/2024 registered at Naupada police station"),
    ];
    (email, attachments)
}

fn extract(email: &InboundEmail, attachments: &[InboundAttachment]) -> CaseExtraction {
    CaseExtraction::extract(email, attachments, 30)
}

fn no_attachments() -> Vec<InboundAttachment> {
    Vec::new()
}

// ============================================================================
// Source Text Tests
// ============================================================================

mod source_text_tests {
    use super::*;

    #[test]
    fn test_pdfs_are_grouped_by_filename() {
        let (email, attachments) = intimation();
        let texts = SourceTexts::gather(&email, &attachments);

        assert_eq!(texts.policy_pdf, POLICY_TEXT);
        assert_eq!(texts.petition_pdf, PETITION_TEXT);
        assert!(texts.body.starts_with(BODY_TEXT));
        assert!(texts.body.ends_with("Naupada police station"));
        assert!(texts.all_text.starts_with(&email.subject));
    }

    #[test]
    fn test_non_pdf_attachments_are_ignored() {
        let email = email("Photos", "see attached");
        let attachments = vec![InboundAttachment::with_text("policy.jpg", "image/jpeg", "Policy No: 99999999")];
        let texts = SourceTexts::gather(&email, &attachments);
        assert!(texts.policy_pdf.is_empty());
        assert_eq!(texts.body, "see attached");
    }

    #[test]
    fn test_nul_characters_are_stripped() {
        let mut email = email("Claim No: 2526005829\0", "Insured\0 vehicle");
        email.thread_id = Some("t\0-1".to_string());
        let email = email.sanitized();
        assert_eq!(email.subject, "Claim No: 2526005829");
        assert_eq!(email.body_text, "Insured vehicle");
        assert_eq!(email.thread_id.as_deref(), Some("t-1"));

        let attachment = InboundAttachment::from_bytes("scan\0.jpg", "image/jpeg", vec![1]);
        assert_eq!(attachment.filename, "scan.jpg");
    }

    #[test]
    fn test_html_body_used_when_plain_is_missing() {
        let mut email = email("Re: documents", "");
        email.body_html = "<div><p>Claim Number: ABC-778899</p></div>".to_string();
        let extraction = extract(&email, &no_attachments());
        assert_eq!(extraction.claim_number.as_deref(), Some("ABC-778899"));
    }
}

// ============================================================================
// Extraction Tests
// ============================================================================

mod extraction_tests {
    use super::*;

    #[test]
    fn test_full_intimation() {
        let (email, attachments) = intimation();
        let x = extract(&email, &attachments);

        assert_eq!(x.claim_number.as_deref(), Some("2526005829"));
        assert_eq!(x.policy_number.as_deref(), Some("0001234567890"));
        assert_eq!(x.crn.as_deref(), Some("245/2024"));
        assert_eq!(x.file_number.as_deref(), Some("W6607"));
        assert_eq!(x.insured_name.as_deref(), Some("Ramesh Kumar"));
        assert!(x.insured_address.as_deref().unwrap().starts_with("12 Lake Road, Naupada"));
        assert_eq!(x.claimant_name.as_deref(), Some("Sunita Devi"));
        assert_eq!(x.claimant_address.as_deref(), Some("House No 5, Gandhi Nagar, Thane"));
        assert_eq!(x.driver_name.as_deref(), Some("Mohan Lal"));
        assert_eq!(x.spot_location.as_deref(), Some("Thane"));
        assert_eq!(x.spot_district.as_deref(), Some("Thane"));
        assert_eq!(x.claimant_district.as_deref(), Some("Thane"));
        assert_eq!(x.vehicle_registration.as_deref(), Some("MH04AB1234"));
        assert_eq!(x.client_name, "SBI General");
        assert_eq!(x.accident_date, NaiveDate::from_ymd_opt(2024, 3, 12));
        assert_eq!(x.category, CaseCategory::Mact);
        assert_eq!(x.case_type, Some(CaseType::FullCase));
        assert_eq!(x.scope_of_work.as_deref(), Some(FULL_INVESTIGATION));
        assert_eq!(x.receipt_date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(x.receipt_month, "Jan-25");
        assert_eq!(x.due_date, NaiveDate::from_ymd_opt(2025, 2, 5).unwrap());
        assert!(x.populated_fields() >= 14);
    }

    #[test]
    fn test_claim_number_from_subject_beats_body() {
        let email = email("Claim No: SUBJ-1", "Claim No: BODY-2");
        assert_eq!(extract(&email, &no_attachments()).claim_number.as_deref(), Some("SUBJ-1"));
    }

    #[test]
    fn test_claim_number_found_in_body() {
        let email = email("New instruction", "Kindly investigate.\nClaim # 77889900\nThanks");
        assert_eq!(extract(&email, &no_attachments()).claim_number.as_deref(), Some("77889900"));
    }

    #[test]
    fn test_claim_number_only_searched_near_top() {
        let padding = "x".repeat(2100);
        let email = email("New instruction", &format!("{}\nClaim No: LATE-1", padding));
        assert_eq!(extract(&email, &no_attachments()).claim_number, None);
    }

    #[test]
    fn test_mtp_and_tribunal_formats() {
        let mtp = email("Fwd: MTP-N-2526-005829 accident claim", "");
        assert_eq!(extract(&mtp, &no_attachments()).claim_number.as_deref(), Some("2526-005829"));

        let mvc = email("MVC 2142/2025 hearing notice", "");
        assert_eq!(extract(&mvc, &no_attachments()).claim_number.as_deref(), Some("2142/2025"));
    }

    #[test]
    fn test_claimant_from_versus_subject() {
        let email = email("Ramesh Kumar VS SBI General Insurance - Claim No 4455", "");
        let x = extract(&email, &no_attachments());
        assert_eq!(x.claimant_name.as_deref(), Some("Ramesh Kumar"));
        assert_eq!(x.claim_number.as_deref(), Some("4455"));
    }

    #[test]
    fn test_category_from_subject_keyword() {
        let email = email("MACT notice for Claim No 1001", "");
        let x = extract(&email, &no_attachments());
        assert_eq!(x.crn, None);
        assert_eq!(x.category, CaseCategory::Mact);

        let plain = super::email("Claim No 1002", "");
        assert_eq!(extract(&plain, &no_attachments()).category, CaseCategory::Other);
    }

    #[test]
    fn test_full_case_marker_in_text() {
        let email = email("Claim No 1003", "Scope: Full Case investigation required");
        let x = extract(&email, &no_attachments());
        assert_eq!(x.case_type, Some(CaseType::FullCase));

        let partial = super::email("Claim No 1004", "Scope: partial");
        let x = extract(&partial, &no_attachments());
        assert_eq!(x.case_type, None);
        assert_eq!(x.scope_of_work, None);
    }

    #[test]
    fn test_unknown_insurer() {
        let email = email("Claim No 1005", "No company mentioned");
        assert_eq!(extract(&email, &no_attachments()).client_name, UNKNOWN_INSURER);
    }

    #[test]
    fn test_insurer_prefers_policy_document() {
        let email = email("Claim No 1006 - ICICI Lombard reference", "");
        let attachments = vec![pdf("policy.pdf", "HDFC ERGO General Insurance\nPolicy No: 55556666")];
        assert_eq!(extract(&email, &attachments).client_name, "HDFC ERGO");
    }

    #[test]
    fn test_registration_is_normalised() {
        let email = email("Claim No 1007", "Vehicle No: mh 12 de 4567\n");
        assert_eq!(
            extract(&email, &no_attachments()).vehicle_registration.as_deref(),
            Some("MH12DE4567")
        );
    }

    #[test]
    fn test_short_names_rejected() {
        let email = email("Claim No 1008", "Driver Name: Raj\n");
        assert_eq!(extract(&email, &no_attachments()).driver_name, None);
    }

    #[test]
    fn test_district_from_text_when_subject_has_no_location() {
        let email = email("Claim No 1009", "District: Pune\n");
        let x = extract(&email, &no_attachments());
        assert_eq!(x.claimant_district.as_deref(), Some("Pune"));
        assert_eq!(x.spot_location, None);
    }

    #[test]
    fn test_no_claim_number() {
        let email = email("Lunch on Friday?", "See you there");
        let x = extract(&email, &no_attachments());
        assert_eq!(x.claim_number, None);
        assert_eq!(x.category, CaseCategory::Other);
    }
}

// ============================================================================
// Mapping Tests
// ============================================================================

mod mapping_tests {
    use super::*;

    fn stored(email_id: EmailIntakeId, attachments: &[InboundAttachment]) -> Vec<StoredAttachment> {
        attachments
            .iter()
            .map(|a| StoredAttachment::from_inbound(email_id, a, Some(format!("intake/{}", a.filename))))
            .collect()
    }

    #[test]
    fn test_build_case_from_intimation() {
        let (email, attachments) = intimation();
        let x = extract(&email, &attachments);
        let email_id = EmailIntakeId::new();

        let case = build_case(&x, None, email_id, &email.subject, 30).unwrap();

        assert_eq!(case.claim_number, "2526005829");
        assert_eq!(case.client_name, "SBI General");
        assert_eq!(case.source_email_id, Some(email_id));
        assert_eq!(case.status, CaseStatus::Open);
        assert_eq!(case.report_status, ReportStatus::Pending);
        assert_eq!(case.category, CaseCategory::Mact);
        assert_eq!(case.crn.as_deref(), Some("245/2024"));
        assert_eq!(case.claimant.status.as_deref(), Some(TO_BE_VERIFIED));
        assert_eq!(case.insured.status.as_deref(), Some(TO_BE_VERIFIED));
        assert_eq!(case.insured.district.as_deref(), Some("Thane"));
        assert_eq!(case.driver.status.as_deref(), Some(TO_BE_VERIFIED));
        assert_eq!(case.spot.status.as_deref(), Some(PENDING));
        assert_eq!(case.documents.dl.as_deref(), Some(PENDING));
        assert_eq!(case.documents.fitness.as_deref(), Some(PENDING));
        assert_eq!(case.police.rti_status.as_deref(), Some(PENDING));
        assert_eq!(case.police.chargesheet_status.as_deref(), Some(PENDING));
        assert_eq!(case.due_date, NaiveDate::from_ymd_opt(2025, 2, 5));
        assert!(case.notes.starts_with("Auto-created from email: Intimation"));
        assert!(case.notes.contains("Policy#0001234567890, MACT#245/2024"));
    }

    #[test]
    fn test_build_case_without_driver_or_location() {
        let email = email("Claim No 2001", "");
        let x = extract(&email, &no_attachments());
        let case = build_case(&x, None, EmailIntakeId::new(), &email.subject, 30).unwrap();
        assert_eq!(case.driver.status, None);
        assert_eq!(case.spot.status, None);
    }

    #[test]
    fn test_build_case_requires_claim_number() {
        let email = email("hello", "");
        let x = extract(&email, &no_attachments());
        assert!(build_case(&x, None, EmailIntakeId::new(), &email.subject, 30).is_err());
    }

    #[test]
    fn test_update_fills_only_gaps() {
        let mut case = InsuranceCase::new_manual(NewCase::new(
            "2526005829",
            "SBI General",
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        ))
        .unwrap();
        case.policy_number = Some("KEEP-ME-123".to_string());

        let (email, attachments) = intimation();
        let x = extract(&email, &attachments);
        let filled = apply_update(&mut case, &x, &email.subject, Utc::now());

        assert_eq!(case.policy_number.as_deref(), Some("KEEP-ME-123"));
        assert_eq!(case.claimant.name.as_deref(), Some("Sunita Devi"));
        assert_eq!(case.insured.name.as_deref(), Some("Ramesh Kumar"));
        assert_eq!(case.spot.location.as_deref(), Some("Thane"));
        assert!(!filled.contains(&"policy_number"));
        assert!(filled.contains(&"claimant_name"));
        assert!(case.notes.starts_with("Updated from email: Intimation"));

        apply_update(&mut case, &x, "Reminder", Utc::now());
        assert!(case.notes.contains("\n\nUpdated from email on "));
        assert!(case.notes.ends_with(": Reminder"));
    }

    #[test]
    fn test_documents_are_classified_and_linked() {
        let (_, attachments) = intimation();
        let email_id = EmailIntakeId::new();
        let stored = stored(email_id, &attachments);
        let case_id = core_kernel::CaseId::new();

        let documents = link_documents(case_id, &stored);

        assert_eq!(documents.len(), 3);
        assert!(documents.iter().all(|d| d.case_id == case_id));
        let types: Vec<DocumentType> = documents.iter().map(|d| d.document_type).collect();
        assert_eq!(types, vec![DocumentType::Policy, DocumentType::Petition, DocumentType::Fir]);
        assert_eq!(documents[0].attachment_id, Some(stored[0].id));
        assert_eq!(documents[0].file_path.as_deref(), Some("intake/Policy_Schedule.pdf"));
    }
}

// ============================================================================
// Gmail Payload Tests
// ============================================================================

mod gmail_tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn b64(text: &str) -> String {
        URL_SAFE_NO_PAD.encode(text)
    }

    #[test]
    fn test_multipart_message() {
        let message: GmailMessage = serde_json::from_value(json!({
            "id": "18d2f0c9a1b2c3d4",
            "threadId": "18d2f0c9a1b2c3d4",
            "labelIds": ["UNREAD", "INBOX"],
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [
                    { "name": "Subject", "value": "Claim No: 2526005829" },
                    { "name": "From", "value": "Claims Team <claims@sbigeneral.example>" },
                    { "name": "To", "value": "desk@example.com" },
                    { "name": "Date", "value": "Mon, 6 Jan 2025 15:00:00 +0530" }
                ],
                "body": { "size": 0 },
                "parts": [
                    {
                        "mimeType": "multipart/alternative",
                        "filename": "",
                        "body": { "size": 0 },
                        "parts": [
                            { "mimeType": "text/plain", "filename": "", "body": { "size": 5, "data": b64("plain") } },
                            { "mimeType": "text/html", "filename": "", "body": { "size": 11, "data": b64("<b>html</b>") } }
                        ]
                    },
                    {
                        "mimeType": "application/pdf",
                        "filename": "policy.pdf",
                        "body": { "size": 48213, "attachmentId": "ANGjdJ8" }
                    },
                    {
                        "mimeType": "text/plain",
                        "filename": "notes.txt",
                        "body": { "size": 4, "data": b64("note") }
                    }
                ]
            }
        }))
        .unwrap();

        let parsed = parse_gmail_message(&message).unwrap();
        let email = &parsed.email;
        assert_eq!(email.subject, "Claim No: 2526005829");
        assert_eq!(email.sender_email, "claims@sbigeneral.example");
        assert_eq!(email.sender_name, "Claims Team");
        assert_eq!(email.body_html, "<b>html</b>");
        assert_eq!(email.received_at, Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap());
        assert!(email.has_attachments);

        assert_eq!(parsed.attachments.len(), 2);
        assert_eq!(parsed.attachments[0].source, AttachmentSource::Remote("ANGjdJ8".to_string()));
        assert_eq!(parsed.attachments[0].size, 48213);
        assert_eq!(parsed.attachments[1].source, AttachmentSource::Inline(b"note".to_vec()));
    }

    #[test]
    fn test_single_part_message() {
        let message: GmailMessage = serde_json::from_value(json!({
            "id": "abc",
            "payload": {
                "mimeType": "text/plain",
                "headers": [],
                "body": { "size": 5, "data": b64("hello") }
            }
        }))
        .unwrap();

        let parsed = parse_gmail_message(&message).unwrap();
        assert_eq!(parsed.email.body_text, "hello");
        assert_eq!(parsed.email.subject, "(No Subject)");
        assert!(!parsed.email.has_attachments);
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn test_message_without_id_is_rejected() {
        assert!(parse_gmail_message(&GmailMessage::default()).is_err());
    }
}

//! Intake Workflow Tests
//!
//! Runs the intake service end to end against in-memory stores and a
//! scripted mailbox: polling, case creation and update, duplicates,
//! failures and reprocessing.

use std::sync::Arc;

use chrono::NaiveDate;

use domain_cases::{CaseSource, CaseStatus};
use domain_intake::{
    AttachmentPart, AttachmentSource, IngestOutcome, IntakeService, MappingOutcome, ProcessingStatus,
    ProviderMessage,
};
use test_utils::{
    assert_case_created, assert_case_number_format, assert_case_updated, assert_processed, CaseFixtures,
    ClientFixtures, EmailFixtures, MemoryCaseStore, MemoryIntakeStore, ScriptedMailbox, TestEmailBuilder,
    INTIMATION_CLAIM_NUMBER,
};

fn service(intake: &MemoryIntakeStore, cases: &MemoryCaseStore) -> IntakeService {
    IntakeService::new(Arc::new(intake.clone()), Arc::new(cases.clone()))
}

fn text_file(name: &str) -> (String, String, Vec<u8>) {
    (name.to_string(), "text/plain".to_string(), b"scanned copy".to_vec())
}

mod polling {
    use super::*;

    #[tokio::test]
    async fn test_poll_creates_case_from_intimation() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let mailbox = ScriptedMailbox::new();
        mailbox.deliver(EmailFixtures::intimation("msg-1"), vec![text_file("FIR_copy.txt")]);

        let report = service(&intake, &cases).poll(&mailbox, None, 25).await.unwrap();

        assert_eq!(report.fetched, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(report.cases_created, 1);
        assert_eq!(report.failed, 0);
        assert!(mailbox.is_read("msg-1"));

        let case = cases.case(INTIMATION_CLAIM_NUMBER).expect("case created");
        assert_case_number_format(&case.case_number);
        assert_eq!(case.source, CaseSource::Email);
        assert_eq!(case.status, CaseStatus::Open);
        assert_eq!(case.driver.name.as_deref(), Some("Mohan Lal"));
        assert_eq!(case.accident_date, NaiveDate::from_ymd_opt(2024, 3, 12));
        assert_eq!(case.receipt_date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());

        let records = intake.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].intake.status, ProcessingStatus::Completed);
        assert_eq!(records[0].intake.case_id, Some(case.id));
        assert_eq!(case.source_email_id, Some(records[0].intake.id));
        assert_eq!(cases.documents_for(case.id).len(), 1);
    }

    #[tokio::test]
    async fn test_poll_respects_max() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let mailbox = ScriptedMailbox::new();
        for (i, claim) in ["1111111111", "2222222222", "3333333333"].iter().enumerate() {
            mailbox.deliver(EmailFixtures::email(&format!("m-{}", i), &format!("Claim No: {}", claim), ""), Vec::new());
        }

        let report = service(&intake, &cases).poll(&mailbox, None, 2).await.unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(cases.cases().len(), 2);

        let report = service(&intake, &cases).poll(&mailbox, None, 2).await.unwrap();
        assert_eq!(report.fetched, 1);
        assert_eq!(cases.cases().len(), 3);
    }

    #[tokio::test]
    async fn test_broken_message_does_not_stop_batch() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let mailbox = ScriptedMailbox::new();
        mailbox.deliver(EmailFixtures::email("bad", "Claim No: 9999999999", ""), Vec::new());
        mailbox.deliver(EmailFixtures::intimation("good"), Vec::new());
        mailbox.break_message("bad");

        let report = service(&intake, &cases).poll(&mailbox, None, 25).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 1);
        assert!(!mailbox.is_read("bad"));
        assert!(mailbox.is_read("good"));
        assert!(cases.case("9999999999").is_none());
    }

    #[tokio::test]
    async fn test_mapping_failure_still_marks_message_read() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let mailbox = ScriptedMailbox::new();
        mailbox.deliver(EmailFixtures::intimation("flaky"), Vec::new());
        cases.set_fail_inserts(true);
        let service = service(&intake, &cases);

        let report = service.poll(&mailbox, None, 25).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 0);
        assert!(mailbox.is_read("flaky"));
        let record = intake.records().remove(0);
        assert_eq!(record.intake.status, ProcessingStatus::Failed);

        let again = service.poll(&mailbox, None, 25).await.unwrap();
        assert_eq!(again.fetched, 0);
        assert_eq!(intake.records().len(), 1);

        cases.set_fail_inserts(false);
        let mapping = service.reprocess(record.intake.id).await.unwrap();
        assert_case_created(&mapping, INTIMATION_CLAIM_NUMBER);
    }

    #[tokio::test]
    async fn test_nul_characters_never_reach_storage() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let mailbox = ScriptedMailbox::new();
        let mut email = EmailFixtures::intimation("nul");
        email.subject.push('\0');
        email.body_text.insert(0, '\0');
        mailbox.deliver(email, Vec::new());

        let report = service(&intake, &cases).poll(&mailbox, None, 25).await.unwrap();

        assert_eq!(report.cases_created, 1);
        let stored = &intake.records()[0].intake.email;
        assert!(!stored.subject.contains('\0'));
        assert!(!stored.body_text.contains('\0'));
    }

    #[tokio::test]
    async fn test_expired_remote_attachment_is_noted() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let mailbox = ScriptedMailbox::new();
        mailbox.deliver_with_remote(EmailFixtures::intimation("msg-r"), "petition.pdf", "att-1", None);

        let report = service(&intake, &cases).poll(&mailbox, None, 25).await.unwrap();
        assert_eq!(report.cases_created, 1);

        let record = &intake.records()[0];
        assert_eq!(record.intake.status, ProcessingStatus::Completed);
        assert!(record.attachments.is_empty());
        let note = record.intake.processing_error.as_deref().unwrap();
        assert!(note.starts_with("Attachment processing error: petition.pdf"));
    }

    #[tokio::test]
    async fn test_remote_attachment_is_downloaded() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let mailbox = ScriptedMailbox::new();
        mailbox.deliver_with_remote(EmailFixtures::intimation("msg-d"), "photo.jpg", "att-2", Some(vec![1, 2, 3]));

        service(&intake, &cases).poll(&mailbox, None, 25).await.unwrap();

        let record = &intake.records()[0];
        assert_eq!(record.attachments.len(), 1);
        assert_eq!(record.attachments[0].size, 3);
        assert_eq!(record.intake.processing_error, None);
    }
}

mod mapping {
    use super::*;

    #[tokio::test]
    async fn test_follow_up_updates_existing_case() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let existing = CaseFixtures::open(INTIMATION_CLAIM_NUMBER);
        let existing_id = existing.id;
        cases.seed_case(existing);

        let mailbox = ScriptedMailbox::new();
        mailbox.deliver(EmailFixtures::intimation("follow-up"), vec![text_file("hospital_bill.txt")]);

        let report = service(&intake, &cases).poll(&mailbox, None, 25).await.unwrap();
        assert_eq!(report.cases_updated, 1);
        assert_eq!(report.cases_created, 0);

        let case = cases.case(INTIMATION_CLAIM_NUMBER).unwrap();
        assert_eq!(case.id, existing_id);
        assert_eq!(case.source, CaseSource::Manual);
        assert!(case.notes.contains("Updated from email"));
        assert_eq!(cases.documents_for(existing_id).len(), 1);
        assert_eq!(intake.records()[0].intake.case_id, Some(existing_id));
    }

    #[tokio::test]
    async fn test_email_without_claim_number_is_skipped() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let (email, _) = TestEmailBuilder::new("lunch").with_subject("Lunch on Friday?").with_body("See you").build();

        let outcome = service(&intake, &cases)
            .ingest(ProviderMessage { email, attachments: Vec::new() }, None)
            .await
            .unwrap();

        assert_eq!(assert_processed(&outcome), &MappingOutcome::Skipped);
        assert!(cases.cases().is_empty());
        assert_eq!(intake.count_with_status(ProcessingStatus::Completed), 1);
    }

    #[tokio::test]
    async fn test_case_linked_to_known_client() {
        let client = ClientFixtures::sbi_general();
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::with_clients(vec![client.clone()]);
        let email = TestEmailBuilder::new("sbi")
            .with_subject("Claim No: 4545454545")
            .with_body("Instruction from SBI General Insurance Company Limited")
            .email();

        let outcome = service(&intake, &cases)
            .ingest(ProviderMessage { email, attachments: Vec::new() }, None)
            .await
            .unwrap();

        assert_case_created(assert_processed(&outcome), "4545454545");
        let case = cases.case("4545454545").unwrap();
        assert_eq!(case.client_id, Some(client.id));
        assert_eq!(case.client_name, "SBI General");
    }

    #[tokio::test]
    async fn test_due_days_are_configurable() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let service = service(&intake, &cases).with_due_days(10);

        service
            .ingest(ProviderMessage { email: EmailFixtures::intimation("due"), attachments: Vec::new() }, None)
            .await
            .unwrap();

        let case = cases.case(INTIMATION_CLAIM_NUMBER).unwrap();
        assert_eq!(case.due_date, NaiveDate::from_ymd_opt(2025, 1, 16));
    }

    #[tokio::test]
    async fn test_html_only_email_is_readable() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let email = TestEmailBuilder::new("html")
            .with_subject("New instruction")
            .with_html_body("<html><body><p>Kindly investigate.</p><p>Claim No: 6060606060</p></body></html>")
            .email();

        let outcome = service(&intake, &cases)
            .ingest(ProviderMessage { email, attachments: Vec::new() }, None)
            .await
            .unwrap();

        assert_case_created(assert_processed(&outcome), "6060606060");
    }
}

mod ingestion {
    use super::*;

    #[tokio::test]
    async fn test_same_message_twice_is_duplicate() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let service = service(&intake, &cases);
        let message = ProviderMessage { email: EmailFixtures::intimation("dup"), attachments: Vec::new() };

        let first = service.ingest(message.clone(), None).await.unwrap();
        let second = service.ingest(message, None).await.unwrap();

        assert!(matches!(first, IngestOutcome::Processed { .. }));
        assert_eq!(second, IngestOutcome::Duplicate);
        assert_eq!(intake.records().len(), 1);
        assert_eq!(cases.cases().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_parts_are_not_downloaded_on_ingest() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let message = ProviderMessage {
            email: EmailFixtures::intimation("pushed"),
            attachments: vec![
                AttachmentPart {
                    filename: "inline.txt".to_string(),
                    content_type: "text/plain".to_string(),
                    size: 4,
                    source: AttachmentSource::Inline(b"data".to_vec()),
                },
                AttachmentPart {
                    filename: "big.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    size: 9_000_000,
                    source: AttachmentSource::Remote("AAMkAG".to_string()),
                },
            ],
        };

        service(&intake, &cases).ingest(message, None).await.unwrap();

        let record = &intake.records()[0];
        assert_eq!(record.attachments.len(), 1);
        assert_eq!(record.attachments[0].filename, "inline.txt");
        assert_eq!(record.intake.processing_error.as_deref(), Some("Attachment not downloaded: big.pdf"));
    }

    #[tokio::test]
    async fn test_failed_mapping_is_recorded_and_reprocessed() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let service = service(&intake, &cases);
        cases.set_fail_inserts(true);

        let result = service
            .ingest(ProviderMessage { email: EmailFixtures::intimation("flaky"), attachments: Vec::new() }, None)
            .await;
        assert!(result.is_err());

        let record = intake.records().remove(0);
        assert_eq!(record.intake.status, ProcessingStatus::Failed);
        assert!(record.intake.processing_error.as_deref().unwrap().contains("case table unavailable"));

        cases.set_fail_inserts(false);
        let mapping = service.reprocess(record.intake.id).await.unwrap();
        assert_case_created(&mapping, INTIMATION_CLAIM_NUMBER);

        let record = intake.find(record.intake.id).unwrap();
        assert_eq!(record.intake.status, ProcessingStatus::Completed);
        assert_eq!(record.intake.processing_error, None);
        assert_eq!(record.intake.case_id, mapping.case_id());
    }

    #[tokio::test]
    async fn test_reprocess_existing_case_does_not_relink_documents() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let service = service(&intake, &cases);
        let mailbox = ScriptedMailbox::new();
        mailbox.deliver(EmailFixtures::intimation("again"), vec![text_file("dl_copy.txt")]);
        service.poll(&mailbox, None, 25).await.unwrap();
        let id = intake.records()[0].intake.id;

        let mapping = service.reprocess(id).await.unwrap();

        assert_case_updated(&mapping, INTIMATION_CLAIM_NUMBER);
        let case = cases.case(INTIMATION_CLAIM_NUMBER).unwrap();
        assert_eq!(cases.documents_for(case.id).len(), 1);
    }

    #[tokio::test]
    async fn test_reprocess_unknown_email() {
        let intake = MemoryIntakeStore::new();
        let cases = MemoryCaseStore::new();
        let result = service(&intake, &cases).reprocess(core_kernel::EmailIntakeId::new_v7()).await;
        assert!(matches!(result, Err(domain_intake::IntakeError::NotFound(_))));
    }
}

//! In-Memory Ports
//!
//! Doubles for the intake pipeline's stores, a scripted mailbox and a
//! notifier that records what it was asked to send. They keep state behind
//! a `Mutex` so a test can inspect it after the service ran.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use core_kernel::{CaseId, EmailIntakeId, MailboxId};
use domain_cases::{CaseDocument, Client, InsuranceCase};
use domain_identity::{IdentityError, Notifier, OutgoingMessage};
use domain_intake::{
    AttachmentPart, AttachmentSource, CaseStore, EmailIntake, InboundAttachment, InboundEmail, IntakeError,
    IntakeRecord, IntakeStore, MailProvider, MailProviderKind, ProcessingStatus, ProviderMessage, StoredAttachment,
};

/// Intake store backed by a map of records
#[derive(Debug, Clone, Default)]
pub struct MemoryIntakeStore {
    records: Arc<Mutex<Vec<IntakeRecord>>>,
}

impl MemoryIntakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored email, oldest first
    pub fn records(&self) -> Vec<IntakeRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn find(&self, id: EmailIntakeId) -> Option<IntakeRecord> {
        self.records.lock().unwrap().iter().find(|r| r.intake.id == id).cloned()
    }

    pub fn count_with_status(&self, status: ProcessingStatus) -> usize {
        self.records.lock().unwrap().iter().filter(|r| r.intake.status == status).count()
    }

    fn update<F: FnOnce(&mut EmailIntake)>(&self, id: EmailIntakeId, f: F) -> Result<(), IntakeError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.intake.id == id)
            .ok_or_else(|| IntakeError::NotFound(id.to_string()))?;
        f(&mut record.intake);
        Ok(())
    }
}

#[async_trait]
impl IntakeStore for MemoryIntakeStore {
    async fn is_processed(&self, message_id: &str) -> Result<bool, IntakeError> {
        Ok(self.records.lock().unwrap().iter().any(|r| r.intake.email.message_id == message_id))
    }

    async fn record(
        &self,
        mailbox_id: Option<MailboxId>,
        email: &InboundEmail,
        attachments: &[InboundAttachment],
    ) -> Result<IntakeRecord, IntakeError> {
        let intake = EmailIntake::received(email.clone(), mailbox_id);
        let attachments = attachments
            .iter()
            .map(|a| StoredAttachment::from_inbound(intake.id, a, None))
            .collect();
        let record = IntakeRecord { intake, attachments };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn load(&self, id: EmailIntakeId) -> Result<Option<IntakeRecord>, IntakeError> {
        Ok(self.find(id))
    }

    async fn mark_completed(&self, id: EmailIntakeId, note: Option<String>) -> Result<(), IntakeError> {
        self.update(id, |intake| {
            intake.status = ProcessingStatus::Completed;
            intake.processing_error = note;
            intake.processed_at = Some(Utc::now());
        })
    }

    async fn mark_failed(&self, id: EmailIntakeId, error: &str) -> Result<(), IntakeError> {
        self.update(id, |intake| {
            intake.status = ProcessingStatus::Failed;
            intake.processing_error = Some(error.to_string());
            intake.processed_at = Some(Utc::now());
        })
    }

    async fn link_case(&self, id: EmailIntakeId, case_id: CaseId) -> Result<(), IntakeError> {
        self.update(id, |intake| intake.case_id = Some(case_id))
    }
}

/// Case book held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCaseStore {
    cases: Arc<Mutex<Vec<InsuranceCase>>>,
    clients: Arc<Mutex<Vec<Client>>>,
    documents: Arc<Mutex<Vec<CaseDocument>>>,
    /// Makes inserts fail, e.g. to exercise the failed-email path
    fail_inserts: Arc<Mutex<bool>>,
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clients(clients: Vec<Client>) -> Self {
        let store = Self::default();
        *store.clients.lock().unwrap() = clients;
        store
    }

    pub fn seed_case(&self, case: InsuranceCase) {
        self.cases.lock().unwrap().push(case);
    }

    pub fn cases(&self) -> Vec<InsuranceCase> {
        self.cases.lock().unwrap().clone()
    }

    pub fn case(&self, claim_number: &str) -> Option<InsuranceCase> {
        self.cases.lock().unwrap().iter().find(|c| c.claim_number == claim_number).cloned()
    }

    pub fn documents_for(&self, case_id: CaseId) -> Vec<CaseDocument> {
        self.documents.lock().unwrap().iter().filter(|d| d.case_id == case_id).cloned().collect()
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().unwrap() = fail;
    }
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
    async fn find_by_claim_number(&self, claim_number: &str) -> Result<Option<InsuranceCase>, IntakeError> {
        Ok(self.case(claim_number))
    }

    async fn find_client_by_name(&self, name: &str) -> Result<Option<Client>, IntakeError> {
        Ok(self.clients.lock().unwrap().iter().find(|c| c.matches_name(name)).cloned())
    }

    async fn insert_case(&self, case: &InsuranceCase) -> Result<(), IntakeError> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(IntakeError::Storage("case table unavailable".to_string()));
        }
        let mut cases = self.cases.lock().unwrap();
        if cases.iter().any(|c| c.claim_number == case.claim_number) {
            return Err(IntakeError::Storage(format!("duplicate claim number {}", case.claim_number)));
        }
        cases.push(case.clone());
        Ok(())
    }

    async fn update_case(&self, case: &InsuranceCase) -> Result<(), IntakeError> {
        let mut cases = self.cases.lock().unwrap();
        let slot = cases
            .iter_mut()
            .find(|c| c.id == case.id)
            .ok_or_else(|| IntakeError::Storage(format!("case {} not found", case.id)))?;
        *slot = case.clone();
        Ok(())
    }

    async fn add_documents(&self, documents: &[CaseDocument]) -> Result<(), IntakeError> {
        self.documents.lock().unwrap().extend_from_slice(documents);
        Ok(())
    }
}

/// A mailbox whose unread messages are set up by the test
#[derive(Debug, Clone, Default)]
pub struct ScriptedMailbox {
    messages: Arc<Mutex<Vec<ProviderMessage>>>,
    remote: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    read: Arc<Mutex<HashSet<String>>>,
    broken: Arc<Mutex<HashSet<String>>>,
}

impl ScriptedMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an unread message with inline attachments
    pub fn deliver(&self, email: InboundEmail, attachments: Vec<(String, String, Vec<u8>)>) {
        let attachments = attachments
            .into_iter()
            .map(|(filename, content_type, data)| AttachmentPart {
                filename,
                content_type,
                size: data.len() as i64,
                source: AttachmentSource::Inline(data),
            })
            .collect();
        self.messages.lock().unwrap().push(ProviderMessage { email, attachments });
    }

    /// Queues an unread message whose attachment must be downloaded
    pub fn deliver_with_remote(&self, email: InboundEmail, filename: &str, attachment_id: &str, data: Option<Vec<u8>>) {
        if let Some(data) = data {
            self.remote.lock().unwrap().insert(attachment_id.to_string(), data);
        }
        let part = AttachmentPart {
            filename: filename.to_string(),
            content_type: "application/octet-stream".to_string(),
            size: 0,
            source: AttachmentSource::Remote(attachment_id.to_string()),
        };
        self.messages.lock().unwrap().push(ProviderMessage { email, attachments: vec![part] });
    }

    /// Makes fetching this message fail
    pub fn break_message(&self, message_id: &str) {
        self.broken.lock().unwrap().insert(message_id.to_string());
    }

    pub fn is_read(&self, message_id: &str) -> bool {
        self.read.lock().unwrap().contains(message_id)
    }
}

#[async_trait]
impl MailProvider for ScriptedMailbox {
    fn kind(&self) -> MailProviderKind {
        MailProviderKind::Gmail
    }

    async fn list_unread(&self, max: usize) -> Result<Vec<String>, IntakeError> {
        let read = self.read.lock().unwrap();
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.email.message_id.clone())
            .filter(|id| !read.contains(id))
            .take(max)
            .collect())
    }

    async fn fetch_message(&self, message_id: &str) -> Result<ProviderMessage, IntakeError> {
        if self.broken.lock().unwrap().contains(message_id) {
            return Err(IntakeError::Provider(format!("message {} unavailable", message_id)));
        }
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.email.message_id == message_id)
            .cloned()
            .ok_or_else(|| IntakeError::Provider(format!("message {} not found", message_id)))
    }

    async fn fetch_attachment(&self, _message_id: &str, attachment_id: &str) -> Result<Vec<u8>, IntakeError> {
        self.remote
            .lock()
            .unwrap()
            .get(attachment_id)
            .cloned()
            .ok_or_else(|| IntakeError::Provider(format!("attachment {} expired", attachment_id)))
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), IntakeError> {
        self.read.lock().unwrap().insert(message_id.to_string());
        Ok(())
    }
}

/// Notifier that keeps every message instead of sending it
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries always fail
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Last message sent to `to`
    pub fn last_to(&self, to: &str) -> Option<OutgoingMessage> {
        self.sent.lock().unwrap().iter().rev().find(|m| m.to == to).cloned()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, message: OutgoingMessage) -> Result<(), IdentityError> {
        if self.failing {
            return Err(IdentityError::Delivery("mailbox offline".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::EmailFixtures;

    #[tokio::test]
    async fn test_scripted_mailbox_hides_read_messages() {
        let mailbox = ScriptedMailbox::new();
        mailbox.deliver(EmailFixtures::email("a", "one", ""), Vec::new());
        mailbox.deliver(EmailFixtures::email("b", "two", ""), Vec::new());

        assert_eq!(mailbox.list_unread(10).await.unwrap(), vec!["a", "b"]);
        mailbox.mark_read("a").await.unwrap();
        assert_eq!(mailbox.list_unread(10).await.unwrap(), vec!["b"]);
        assert_eq!(mailbox.list_unread(0).await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_memory_intake_store_status_changes() {
        let store = MemoryIntakeStore::new();
        let record = store.record(None, &EmailFixtures::email("m", "s", ""), &[]).await.unwrap();
        assert_eq!(store.count_with_status(ProcessingStatus::Processing), 1);

        store.mark_failed(record.intake.id, "boom").await.unwrap();
        let stored = store.find(record.intake.id).unwrap();
        assert_eq!(stored.intake.status, ProcessingStatus::Failed);
        assert_eq!(stored.intake.processing_error.as_deref(), Some("boom"));
        assert!(store.is_processed("m").await.unwrap());
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        let message = OutgoingMessage { to: "a@b.test".into(), subject: "s".into(), body: "b".into() };
        notifier.deliver(message.clone()).await.unwrap();
        assert_eq!(notifier.last_to("a@b.test"), Some(message.clone()));

        assert!(RecordingNotifier::failing().deliver(message).await.is_err());
    }
}

//! Intake Ports
//!
//! The intake pipeline talks to three outside systems, each behind a
//! trait so that the service can run against PostgreSQL and live mail
//! providers in production and against in-memory doubles in tests.
//!
//! - [`MailProvider`]: a mailbox at Gmail or Microsoft Graph
//! - [`IntakeStore`]: stored emails and their attachments
//! - [`CaseStore`]: the case book and client list
//!
//! ```rust,ignore
//! let service = IntakeService::new(Arc::new(PgIntakeStore::new(pool.clone(), dir)), Arc::new(PgCaseStore::new(pool)));
//! let report = service.poll(&gmail_client, Some(mailbox.id), 25).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{CaseId, EmailIntakeId, MailboxId};
use domain_cases::{CaseDocument, Client, InsuranceCase};

use crate::error::IntakeError;
use crate::mailbox::MailProviderKind;
use crate::message::{InboundAttachment, InboundEmail, IntakeRecord, ProviderMessage};

/// A remote mailbox
#[async_trait]
pub trait MailProvider: Send + Sync {
    fn kind(&self) -> MailProviderKind;

    /// Ids of unread messages, newest first, at most `max`
    async fn list_unread(&self, max: usize) -> Result<Vec<String>, IntakeError>;

    async fn fetch_message(&self, message_id: &str) -> Result<ProviderMessage, IntakeError>;

    /// Downloads an attachment listed as [`crate::AttachmentSource::Remote`]
    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, IntakeError>;

    async fn mark_read(&self, message_id: &str) -> Result<(), IntakeError>;
}

/// Persistence for inbound email
#[async_trait]
pub trait IntakeStore: Send + Sync {
    /// Whether a message id has been stored before
    async fn is_processed(&self, message_id: &str) -> Result<bool, IntakeError>;

    /// Stores an email in `PROCESSING` state together with its attachments
    async fn record(
        &self,
        mailbox_id: Option<MailboxId>,
        email: &InboundEmail,
        attachments: &[InboundAttachment],
    ) -> Result<IntakeRecord, IntakeError>;

    async fn load(&self, id: EmailIntakeId) -> Result<Option<IntakeRecord>, IntakeError>;

    /// Marks processing done, keeping a non-fatal note such as a failed attachment
    async fn mark_completed(&self, id: EmailIntakeId, note: Option<String>) -> Result<(), IntakeError>;

    async fn mark_failed(&self, id: EmailIntakeId, error: &str) -> Result<(), IntakeError>;

    async fn link_case(&self, id: EmailIntakeId, case_id: CaseId) -> Result<(), IntakeError>;
}

/// The case book as seen from intake
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn find_by_claim_number(&self, claim_number: &str) -> Result<Option<InsuranceCase>, IntakeError>;

    /// First client whose name contains `name`, ignoring case
    async fn find_client_by_name(&self, name: &str) -> Result<Option<Client>, IntakeError>;

    async fn insert_case(&self, case: &InsuranceCase) -> Result<(), IntakeError>;

    async fn update_case(&self, case: &InsuranceCase) -> Result<(), IntakeError>;

    async fn add_documents(&self, documents: &[CaseDocument]) -> Result<(), IntakeError>;
}

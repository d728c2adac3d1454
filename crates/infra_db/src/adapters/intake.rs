//! PostgreSQL intake store
//!
//! Persists inbound emails for the intake pipeline. Attachment bytes are
//! written to the upload directory when one is configured; the rows keep
//! the extracted text either way.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{instrument, warn};

use core_kernel::{CaseId, EmailIntakeId, MailboxId};
use domain_intake::{
    EmailIntake, InboundAttachment, InboundEmail, IntakeError, IntakeRecord, IntakeStore, StoredAttachment,
};

use crate::files::FileStore;
use crate::repositories::IntakeRepository;

/// PostgreSQL-backed implementation of the IntakeStore port
#[derive(Debug, Clone)]
pub struct PgIntakeStore {
    repository: IntakeRepository,
    files: Option<FileStore>,
}

impl PgIntakeStore {
    /// Creates the store
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    /// * `files` - Where attachment bytes go; `None` keeps only metadata and text
    pub fn new(pool: PgPool, files: Option<FileStore>) -> Self {
        Self { repository: IntakeRepository::new(pool), files }
    }

    async fn store_file(&self, email_id: EmailIntakeId, index: usize, attachment: &InboundAttachment) -> Option<String> {
        let files = self.files.as_ref()?;
        let folder = format!("intake/{}", email_id.as_uuid());
        match files.save(&folder, &format!("{:02}", index), &attachment.filename, &attachment.data).await {
            Ok(path) => Some(path),
            Err(e) => {
                // the text is already extracted, so the email is still usable
                warn!(%email_id, filename = %attachment.filename, error = %e, "failed to write attachment file");
                None
            }
        }
    }
}

#[async_trait]
impl IntakeStore for PgIntakeStore {
    async fn is_processed(&self, message_id: &str) -> Result<bool, IntakeError> {
        Ok(self.repository.message_exists(message_id).await?)
    }

    #[instrument(skip(self, email, attachments), fields(message_id = %email.message_id, attachments = attachments.len()))]
    async fn record(
        &self,
        mailbox_id: Option<MailboxId>,
        email: &InboundEmail,
        attachments: &[InboundAttachment],
    ) -> Result<IntakeRecord, IntakeError> {
        let intake = EmailIntake::received(email.clone(), mailbox_id);

        let mut stored = Vec::with_capacity(attachments.len());
        for (index, attachment) in attachments.iter().enumerate() {
            let path = self.store_file(intake.id, index + 1, attachment).await;
            stored.push(StoredAttachment::from_inbound(intake.id, attachment, path));
        }

        self.repository.insert_email(&intake, &stored).await?;
        Ok(IntakeRecord { intake, attachments: stored })
    }

    async fn load(&self, id: EmailIntakeId) -> Result<Option<IntakeRecord>, IntakeError> {
        Ok(self.repository.get(id).await?)
    }

    async fn mark_completed(&self, id: EmailIntakeId, note: Option<String>) -> Result<(), IntakeError> {
        Ok(self.repository.mark_completed(id, note.as_deref(), Utc::now()).await?)
    }

    async fn mark_failed(&self, id: EmailIntakeId, error: &str) -> Result<(), IntakeError> {
        Ok(self.repository.mark_failed(id, error, Utc::now()).await?)
    }

    async fn link_case(&self, id: EmailIntakeId, case_id: CaseId) -> Result<(), IntakeError> {
        Ok(self.repository.link_case(id, case_id).await?)
    }
}

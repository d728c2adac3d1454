//! Intake service: mailbox to case book
//!
//! For every unread message the service downloads the message and its
//! attachments, extracts PDF text off the async runtime and stores the
//! email. Once stored, the message is marked read at the provider and
//! mapped onto a new or existing case; a mapping failure is recorded on
//! the stored email for reprocessing. A failing message is counted and
//! never stops the rest of the batch.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use core_kernel::{CaseId, EmailIntakeId, MailboxId};
use domain_cases::DEFAULT_DUE_DAYS;

use crate::error::IntakeError;
use crate::extractor::CaseExtraction;
use crate::mapper::{apply_update, build_case, link_documents, MappingOutcome};
use crate::message::{AttachmentSource, InboundAttachment, InboundEmail, IntakeRecord, ProviderMessage};
use crate::ports::{CaseStore, IntakeStore, MailProvider};

/// Counters for one polling run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub fetched: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cases_created: usize,
    pub cases_updated: usize,
}

impl PollReport {
    fn tally(&mut self, outcome: &IngestOutcome) {
        match outcome {
            IngestOutcome::Duplicate => self.skipped += 1,
            IngestOutcome::Processed { mapping, .. } => {
                self.processed += 1;
                match mapping {
                    MappingOutcome::Created { .. } => self.cases_created += 1,
                    MappingOutcome::Updated { .. } => self.cases_updated += 1,
                    MappingOutcome::Skipped => {}
                }
            }
        }
    }

    /// Adds the counters of another run, e.g. another mailbox
    pub fn merge(&mut self, other: &PollReport) {
        self.fetched += other.fetched;
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.cases_created += other.cases_created;
        self.cases_updated += other.cases_updated;
    }
}

/// Result of ingesting a single message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The message id was already stored
    Duplicate,
    Processed {
        intake_id: EmailIntakeId,
        mapping: MappingOutcome,
    },
}

/// Downloaded attachment bytes: filename, content type, data
pub type AttachmentFile = (String, String, Vec<u8>);

/// Builds attachments on a blocking thread, extracting PDF text
pub async fn prepare_attachments(files: Vec<AttachmentFile>) -> Result<Vec<InboundAttachment>, IntakeError> {
    if files.is_empty() {
        return Ok(Vec::new());
    }
    tokio::task::spawn_blocking(move || {
        files
            .into_iter()
            .map(|(filename, content_type, data)| InboundAttachment::from_bytes(&filename, &content_type, data))
            .collect()
    })
    .await
    .map_err(|e| IntakeError::Decode(format!("attachment processing aborted: {}", e)))
}

#[derive(Clone)]
pub struct IntakeService {
    intake: Arc<dyn IntakeStore>,
    cases: Arc<dyn CaseStore>,
    due_days: i64,
}

impl IntakeService {
    pub fn new(intake: Arc<dyn IntakeStore>, cases: Arc<dyn CaseStore>) -> Self {
        Self { intake, cases, due_days: DEFAULT_DUE_DAYS }
    }

    /// Days between receipt and the due date of cases opened from mail
    pub fn with_due_days(mut self, due_days: i64) -> Self {
        self.due_days = due_days;
        self
    }

    /// Processes up to `max` unread messages from a provider
    ///
    /// Only a failure to list the mailbox is returned as an error.
    #[instrument(skip(self, provider), fields(provider = %provider.kind()))]
    pub async fn poll(
        &self,
        provider: &dyn MailProvider,
        mailbox_id: Option<MailboxId>,
        max: usize,
    ) -> Result<PollReport, IntakeError> {
        let ids = provider.list_unread(max).await?;
        let mut report = PollReport { fetched: ids.len(), ..Default::default() };
        info!(count = ids.len(), "fetched unread messages");

        for message_id in ids {
            match self.intake.is_processed(&message_id).await {
                Ok(true) => {
                    debug!(%message_id, "skipping already processed message");
                    report.skipped += 1;
                    mark_read(provider, &message_id).await;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(%message_id, error = %e, "failed to check message history");
                    report.failed += 1;
                    continue;
                }
            }

            let stored = match self.download(provider, &message_id).await {
                Ok((email, files, notes)) => self.store(email, files, mailbox_id).await.map(|r| (r, notes)),
                Err(e) => Err(e),
            };
            let (record, notes) = match stored {
                Ok((Some(record), notes)) => (record, notes),
                Ok((None, _)) => {
                    report.tally(&IngestOutcome::Duplicate);
                    mark_read(provider, &message_id).await;
                    continue;
                }
                Err(e) => {
                    warn!(%message_id, error = %e, "failed to store message");
                    report.failed += 1;
                    continue;
                }
            };

            // stored emails are retried through reprocess, not by polling them again
            mark_read(provider, &message_id).await;

            let intake_id = record.intake.id;
            match self.settle(&record, join_notes(notes)).await {
                Ok(mapping) => report.tally(&IngestOutcome::Processed { intake_id, mapping }),
                Err(e) => {
                    warn!(%message_id, %intake_id, error = %e, "failed to map message to a case");
                    report.failed += 1;
                }
            }
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            cases_created = report.cases_created,
            cases_updated = report.cases_updated,
            "poll finished"
        );
        Ok(report)
    }

    /// Fetches a message and downloads its remote attachments
    ///
    /// A failed download becomes a note on the email rather than an error.
    async fn download(
        &self,
        provider: &dyn MailProvider,
        message_id: &str,
    ) -> Result<(InboundEmail, Vec<AttachmentFile>, Vec<String>), IntakeError> {
        let message = provider.fetch_message(message_id).await?;

        let mut files = Vec::with_capacity(message.attachments.len());
        let mut notes = Vec::new();
        for part in message.attachments {
            match part.source {
                AttachmentSource::Inline(data) => files.push((part.filename, part.content_type, data)),
                AttachmentSource::Remote(attachment_id) => {
                    match provider.fetch_attachment(message_id, &attachment_id).await {
                        Ok(data) => files.push((part.filename, part.content_type, data)),
                        Err(e) => {
                            warn!(%message_id, filename = %part.filename, error = %e, "attachment download failed");
                            notes.push(format!("Attachment processing error: {}: {}", part.filename, e));
                        }
                    }
                }
            }
        }

        Ok((message.email, files, notes))
    }

    /// Runs the pipeline for a message that was parsed elsewhere
    ///
    /// Attachments that still need a provider download are skipped and
    /// noted on the stored email. A mapping failure is returned after the
    /// email has been stored as failed.
    #[instrument(skip(self, message), fields(message_id = %message.email.message_id))]
    pub async fn ingest(
        &self,
        message: ProviderMessage,
        mailbox_id: Option<MailboxId>,
    ) -> Result<IngestOutcome, IntakeError> {
        let files = message.inline_attachments();
        let notes: Vec<String> = message
            .attachments
            .iter()
            .filter(|part| matches!(part.source, AttachmentSource::Remote(_)))
            .map(|part| format!("Attachment not downloaded: {}", part.filename))
            .collect();

        let Some(record) = self.store(message.email, files, mailbox_id).await? else {
            return Ok(IngestOutcome::Duplicate);
        };
        let intake_id = record.intake.id;
        let mapping = self.settle(&record, join_notes(notes)).await?;
        Ok(IngestOutcome::Processed { intake_id, mapping })
    }

    /// Stores the email and its attachments; `None` when the message id is known
    async fn store(
        &self,
        email: InboundEmail,
        files: Vec<AttachmentFile>,
        mailbox_id: Option<MailboxId>,
    ) -> Result<Option<IntakeRecord>, IntakeError> {
        let email = email.sanitized();
        if self.intake.is_processed(&email.message_id).await? {
            return Ok(None);
        }

        let attachments = prepare_attachments(files).await?;
        let record = self.intake.record(mailbox_id, &email, &attachments).await?;
        info!(
            message_id = %email.message_id,
            intake_id = %record.intake.id,
            attachments = record.attachments.len(),
            "stored inbound email"
        );
        Ok(Some(record))
    }

    /// Maps the email to a case again, e.g. after fixing a client record
    #[instrument(skip(self))]
    pub async fn reprocess(&self, id: EmailIntakeId) -> Result<MappingOutcome, IntakeError> {
        let record = self
            .intake
            .load(id)
            .await?
            .ok_or_else(|| IntakeError::NotFound(id.to_string()))?;
        self.settle(&record, None).await
    }

    /// Maps a stored email and records the processing result
    async fn settle(&self, record: &IntakeRecord, note: Option<String>) -> Result<MappingOutcome, IntakeError> {
        let id = record.intake.id;
        match self.map_to_case(record).await {
            Ok(mapping) => {
                self.intake.mark_completed(id, note).await?;
                Ok(mapping)
            }
            Err(e) => {
                if let Err(mark_err) = self.intake.mark_failed(id, &e.to_string()).await {
                    warn!(intake_id = %id, error = %mark_err, "failed to record processing error");
                }
                Err(e)
            }
        }
    }

    async fn map_to_case(&self, record: &IntakeRecord) -> Result<MappingOutcome, IntakeError> {
        let email = &record.intake.email;
        let extraction = CaseExtraction::extract(email, &record.attachments, self.due_days);

        let Some(claim_number) = extraction.claim_number.clone() else {
            warn!(message_id = %email.message_id, "no claim number found");
            return Ok(MappingOutcome::Skipped);
        };

        if let Some(mut case) = self.cases.find_by_claim_number(&claim_number).await? {
            let filled = apply_update(&mut case, &extraction, &email.subject, Utc::now());
            self.cases.update_case(&case).await?;
            // a reprocessed email already has its documents on the case
            if record.intake.case_id != Some(case.id) {
                self.link(record, case.id).await?;
            }
            info!(%claim_number, case_id = %case.id, ?filled, "updated existing case from email");
            return Ok(MappingOutcome::Updated { case_id: case.id, claim_number });
        }

        let client = self.cases.find_client_by_name(&extraction.client_name).await?;
        let case = build_case(&extraction, client.as_ref(), record.intake.id, &email.subject, self.due_days)?;
        self.cases.insert_case(&case).await?;
        self.link(record, case.id).await?;
        info!(
            %claim_number,
            case_id = %case.id,
            populated = extraction.populated_fields(),
            "created case from email"
        );
        Ok(MappingOutcome::Created { case_id: case.id, claim_number })
    }

    async fn link(&self, record: &IntakeRecord, case_id: CaseId) -> Result<(), IntakeError> {
        let documents = link_documents(case_id, &record.attachments);
        if !documents.is_empty() {
            self.cases.add_documents(&documents).await?;
            for document in &documents {
                debug!(document_type = document.document_type.as_str(), name = %document.document_name, "linked document");
            }
        }
        self.intake.link_case(record.intake.id, case_id).await
    }
}

async fn mark_read(provider: &dyn MailProvider, message_id: &str) {
    if let Err(e) = provider.mark_read(message_id).await {
        warn!(%message_id, error = %e, "failed to mark message read");
    }
}

fn join_notes(notes: Vec<String>) -> Option<String> {
    if notes.is_empty() { None } else { Some(notes.join("; ")) }
}

//! Email intake repository implementation
//!
//! Stored inbound emails with their attachments, and the mailboxes they
//! are polled from. An email is written together with its attachments in a
//! single transaction so a record is never half stored.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{AttachmentId, CaseId, EmailIntakeId, MailboxId};
use domain_intake::{
    EmailIntake, InboundEmail, IntakeRecord, Mailbox, MailProviderKind, ProcessingStatus, StoredAttachment,
};

use crate::error::DatabaseError;
use crate::repositories::{parse_column, Page, Pagination};

const EMAIL_COLUMNS: &str = r#"
    id, mailbox_id, message_id, thread_id, subject, sender_email, sender_name,
    recipient_email, cc, bcc, body_text, body_html, received_at, has_attachments,
    status, processing_error, processed_at, case_id, created_at
"#;

const ATTACHMENT_COLUMNS: &str = r#"
    id, email_id, filename, content_type, size, is_pdf, extracted_text, file_path, created_at
"#;

const MAILBOX_COLUMNS: &str = r#"
    id, provider, email_address, access_token, refresh_token, token_expires_at,
    is_active, last_synced_at, created_at
"#;

/// Repository for inbound email and connected mailboxes
#[derive(Debug, Clone)]
pub struct IntakeRepository {
    pool: PgPool,
}

impl IntakeRepository {
    /// Creates a new IntakeRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether a provider message id has been stored
    pub async fn message_exists(&self, message_id: &str) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM email_intakes WHERE message_id = $1)")
            .bind(message_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Stores an email and its attachments in one transaction
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateEntry` when the message id was stored before
    pub async fn insert_email(&self, intake: &EmailIntake, attachments: &[StoredAttachment]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let email = &intake.email;

        let sql = format!(
            r#"
            INSERT INTO email_intakes ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
            EMAIL_COLUMNS
        );
        sqlx::query(&sql)
            .bind(intake.id.as_uuid())
            .bind(intake.mailbox_id.map(Uuid::from))
            .bind(&email.message_id)
            .bind(&email.thread_id)
            .bind(&email.subject)
            .bind(&email.sender_email)
            .bind(&email.sender_name)
            .bind(&email.recipient_email)
            .bind(&email.cc)
            .bind(&email.bcc)
            .bind(&email.body_text)
            .bind(&email.body_html)
            .bind(email.received_at)
            .bind(email.has_attachments)
            .bind(intake.status.as_str())
            .bind(&intake.processing_error)
            .bind(intake.processed_at)
            .bind(intake.case_id.map(Uuid::from))
            .bind(intake.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| match DatabaseError::classify(e) {
                DatabaseError::DuplicateEntry(_) => DatabaseError::duplicate("Email", "message id", &email.message_id),
                other => other,
            })?;

        let sql = format!(
            "INSERT INTO email_attachments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            ATTACHMENT_COLUMNS
        );
        for attachment in attachments {
            sqlx::query(&sql)
                .bind(attachment.id.as_uuid())
                .bind(attachment.email_id.as_uuid())
                .bind(&attachment.filename)
                .bind(&attachment.content_type)
                .bind(attachment.size)
                .bind(attachment.is_pdf)
                .bind(&attachment.extracted_text)
                .bind(&attachment.file_path)
                .bind(attachment.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Loads an email with its attachments
    pub async fn get(&self, id: EmailIntakeId) -> Result<Option<IntakeRecord>, DatabaseError> {
        let sql = format!("SELECT {} FROM email_intakes WHERE id = $1", EMAIL_COLUMNS);
        let Some(row) = sqlx::query_as::<_, EmailIntakeRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let attachments = self.attachments(id).await?;
        Ok(Some(IntakeRecord { intake: row.into_domain()?, attachments }))
    }

    pub async fn attachments(&self, email_id: EmailIntakeId) -> Result<Vec<StoredAttachment>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM email_attachments WHERE email_id = $1 ORDER BY created_at",
            ATTACHMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AttachmentRow>(&sql)
            .bind(email_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AttachmentRow::into_domain).collect())
    }

    /// Lists stored emails, newest received first
    pub async fn list(
        &self,
        status: Option<ProcessingStatus>,
        pagination: Pagination,
    ) -> Result<Page<EmailIntake>, DatabaseError> {
        let status = status.map(|s| s.as_str());
        let sql = format!(
            r#"
            SELECT {} FROM email_intakes
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY received_at DESC
            LIMIT $2 OFFSET $3
            "#,
            EMAIL_COLUMNS
        );
        let rows = sqlx::query_as::<_, EmailIntakeRow>(&sql)
            .bind(status)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM email_intakes WHERE ($1::TEXT IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        let emails = rows
            .into_iter()
            .map(EmailIntakeRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(emails, total, pagination))
    }

    /// Marks an email processed, replacing any earlier error with `note`
    pub async fn mark_completed(&self, id: EmailIntakeId, note: Option<&str>, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.set_status(id, ProcessingStatus::Completed, note, at).await
    }

    pub async fn mark_failed(&self, id: EmailIntakeId, error: &str, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.set_status(id, ProcessingStatus::Failed, Some(error), at).await
    }

    async fn set_status(
        &self,
        id: EmailIntakeId,
        status: ProcessingStatus,
        message: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE email_intakes SET status = $2, processing_error = $3, processed_at = $4 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(message)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Email", id));
        }
        Ok(())
    }

    /// Records the case an email was mapped to
    pub async fn link_case(&self, id: EmailIntakeId, case_id: CaseId) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE email_intakes SET case_id = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(case_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::classify)?;
        Ok(())
    }

    /// Emails per processing status
    pub async fn status_counts(&self) -> Result<Vec<(ProcessingStatus, i64)>, DatabaseError> {
        let rows: Vec<(String, i64)> = sqlx::query_as("SELECT status, COUNT(*) FROM email_intakes GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|(status, count)| Ok((parse_column("email_intakes", &status)?, count)))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Mailboxes
    // ------------------------------------------------------------------------

    /// Stores a newly connected mailbox
    ///
    /// Reconnecting an address already on file replaces its tokens and
    /// reactivates it; the stored row is returned either way.
    pub async fn upsert_mailbox(&self, mailbox: &Mailbox) -> Result<Mailbox, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO mailboxes ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (provider, email_address) DO UPDATE
            SET access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, mailboxes.refresh_token),
                token_expires_at = EXCLUDED.token_expires_at,
                is_active = TRUE
            RETURNING {cols}
            "#,
            cols = MAILBOX_COLUMNS
        );
        let row = sqlx::query_as::<_, MailboxRow>(&sql)
            .bind(mailbox.id.as_uuid())
            .bind(mailbox.provider.as_str())
            .bind(&mailbox.email_address)
            .bind(&mailbox.access_token)
            .bind(&mailbox.refresh_token)
            .bind(mailbox.token_expires_at)
            .bind(mailbox.is_active)
            .bind(mailbox.last_synced_at)
            .bind(mailbox.created_at)
            .fetch_one(&self.pool)
            .await?;

        row.into_domain()
    }

    pub async fn get_mailbox(&self, id: MailboxId) -> Result<Mailbox, DatabaseError> {
        let sql = format!("SELECT {} FROM mailboxes WHERE id = $1", MAILBOX_COLUMNS);
        sqlx::query_as::<_, MailboxRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Mailbox", id))?
            .into_domain()
    }

    /// Connected mailboxes, oldest first
    pub async fn list_mailboxes(&self, active_only: bool) -> Result<Vec<Mailbox>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM mailboxes WHERE (NOT $1 OR is_active) ORDER BY created_at",
            MAILBOX_COLUMNS
        );
        let rows = sqlx::query_as::<_, MailboxRow>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MailboxRow::into_domain).collect()
    }

    /// The first active mailbox with an address, used for outgoing notifications
    pub async fn find_mailbox_by_address(&self, email_address: &str) -> Result<Option<Mailbox>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM mailboxes WHERE lower(email_address) = lower($1) AND is_active ORDER BY created_at LIMIT 1",
            MAILBOX_COLUMNS
        );
        let row = sqlx::query_as::<_, MailboxRow>(&sql)
            .bind(email_address.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(MailboxRow::into_domain).transpose()
    }

    /// Saves refreshed credentials
    pub async fn update_mailbox_tokens(&self, mailbox: &Mailbox) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE mailboxes SET access_token = $2, refresh_token = $3, token_expires_at = $4 WHERE id = $1",
        )
        .bind(mailbox.id.as_uuid())
        .bind(&mailbox.access_token)
        .bind(&mailbox.refresh_token)
        .bind(mailbox.token_expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_sync(&self, id: MailboxId, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE mailboxes SET last_synced_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_mailbox_active(&self, id: MailboxId, is_active: bool) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE mailboxes SET is_active = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Mailbox", id));
        }
        Ok(())
    }
}

// ============================================================================
// Type definitions
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct EmailIntakeRow {
    pub id: Uuid,
    pub mailbox_id: Option<Uuid>,
    pub message_id: String,
    pub thread_id: Option<String>,
    pub subject: String,
    pub sender_email: String,
    pub sender_name: String,
    pub recipient_email: String,
    pub cc: String,
    pub bcc: String,
    pub body_text: String,
    pub body_html: String,
    pub received_at: DateTime<Utc>,
    pub has_attachments: bool,
    pub status: String,
    pub processing_error: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub case_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl EmailIntakeRow {
    pub fn into_domain(self) -> Result<EmailIntake, DatabaseError> {
        Ok(EmailIntake {
            id: EmailIntakeId::from_uuid(self.id),
            mailbox_id: self.mailbox_id.map(MailboxId::from_uuid),
            email: InboundEmail {
                message_id: self.message_id,
                thread_id: self.thread_id,
                subject: self.subject,
                sender_email: self.sender_email,
                sender_name: self.sender_name,
                recipient_email: self.recipient_email,
                cc: self.cc,
                bcc: self.bcc,
                body_text: self.body_text,
                body_html: self.body_html,
                received_at: self.received_at,
                has_attachments: self.has_attachments,
            },
            status: parse_column("email_intakes", &self.status)?,
            processing_error: self.processing_error,
            processed_at: self.processed_at,
            case_id: self.case_id.map(CaseId::from_uuid),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AttachmentRow {
    pub id: Uuid,
    pub email_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub is_pdf: bool,
    pub extracted_text: String,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttachmentRow {
    pub fn into_domain(self) -> StoredAttachment {
        StoredAttachment {
            id: AttachmentId::from_uuid(self.id),
            email_id: EmailIntakeId::from_uuid(self.email_id),
            filename: self.filename,
            content_type: self.content_type,
            size: self.size,
            is_pdf: self.is_pdf,
            extracted_text: self.extracted_text,
            file_path: self.file_path,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MailboxRow {
    pub id: Uuid,
    pub provider: String,
    pub email_address: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MailboxRow {
    pub fn into_domain(self) -> Result<Mailbox, DatabaseError> {
        Ok(Mailbox {
            id: MailboxId::from_uuid(self.id),
            provider: parse_column::<MailProviderKind>("mailboxes", &self.provider)?,
            email_address: self.email_address,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_expires_at: self.token_expires_at,
            is_active: self.is_active,
            last_synced_at: self.last_synced_at,
            created_at: self.created_at,
        })
    }
}

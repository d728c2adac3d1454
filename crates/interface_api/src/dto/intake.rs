//! Email intake DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CaseId, MailboxId};
use domain_intake::{
    EmailIntake, GmailMessage, GraphAttachment, GraphMessage, IntakeRecord, MappingOutcome, PollReport,
    ProcessingStatus, StoredAttachment,
};

#[derive(Debug, Default, Deserialize)]
pub struct EmailListQuery {
    pub status: Option<String>,
}

/// Row of the intake list
#[derive(Debug, Serialize)]
pub struct EmailSummary {
    pub id: Uuid,
    pub mailbox_id: Option<MailboxId>,
    pub message_id: String,
    pub subject: String,
    pub sender_email: String,
    pub sender_name: String,
    pub received_at: DateTime<Utc>,
    pub has_attachments: bool,
    pub status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub case_id: Option<CaseId>,
}

impl From<EmailIntake> for EmailSummary {
    fn from(intake: EmailIntake) -> Self {
        Self {
            id: *intake.id.as_uuid(),
            mailbox_id: intake.mailbox_id,
            message_id: intake.email.message_id,
            subject: intake.email.subject,
            sender_email: intake.email.sender_email,
            sender_name: intake.email.sender_name,
            received_at: intake.email.received_at,
            has_attachments: intake.email.has_attachments,
            status: intake.status,
            processing_error: intake.processing_error,
            processed_at: intake.processed_at,
            case_id: intake.case_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub is_pdf: bool,
    pub extracted_text: String,
    pub file_path: Option<String>,
}

impl From<StoredAttachment> for AttachmentResponse {
    fn from(a: StoredAttachment) -> Self {
        Self {
            id: *a.id.as_uuid(),
            filename: a.filename,
            content_type: a.content_type,
            size: a.size,
            is_pdf: a.is_pdf,
            extracted_text: a.extracted_text,
            file_path: a.file_path,
        }
    }
}

/// A stored email with its bodies and attachments
#[derive(Debug, Serialize)]
pub struct EmailDetail {
    #[serde(flatten)]
    pub summary: EmailSummary,
    pub recipient_email: String,
    pub cc: String,
    pub body_text: String,
    pub body_html: String,
    pub attachments: Vec<AttachmentResponse>,
}

impl From<IntakeRecord> for EmailDetail {
    fn from(record: IntakeRecord) -> Self {
        let email = &record.intake.email;
        Self {
            recipient_email: email.recipient_email.clone(),
            cc: email.cc.clone(),
            body_text: email.body_text.clone(),
            body_html: email.body_html.clone(),
            summary: EmailSummary::from(record.intake),
            attachments: record.attachments.into_iter().map(AttachmentResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmailStatsResponse {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

impl EmailStatsResponse {
    pub fn from_counts(counts: &[(ProcessingStatus, i64)]) -> Self {
        let count = |status: ProcessingStatus| {
            counts.iter().filter(|(s, _)| *s == status).map(|(_, n)| *n).sum::<i64>()
        };
        Self {
            total: counts.iter().map(|(_, n)| n).sum(),
            pending: count(ProcessingStatus::Pending),
            processing: count(ProcessingStatus::Processing),
            completed: count(ProcessingStatus::Completed),
            failed: count(ProcessingStatus::Failed),
        }
    }
}

/// A provider payload pushed in by a webhook or an operator
#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum IngestRequest {
    Gmail {
        message: GmailMessage,
        mailbox_id: Option<MailboxId>,
    },
    Graph {
        message: GraphMessage,
        #[serde(default)]
        attachments: Vec<GraphAttachment>,
        mailbox_id: Option<MailboxId>,
    },
}

#[derive(Debug, Serialize)]
pub struct ReprocessResponse {
    pub message: String,
    pub mapping: MappingOutcome,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub message: String,
    pub report: PollReport,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeUrlResponse {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConnectMailboxRequest {
    #[validate(length(min = 1, message = "Authorization code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_stats_from_counts() {
        let stats = EmailStatsResponse::from_counts(&[
            (ProcessingStatus::Completed, 7),
            (ProcessingStatus::Failed, 2),
            (ProcessingStatus::Pending, 1),
        ]);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.completed, 7);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.processing, 0);
    }

    #[test]
    fn test_ingest_request_is_tagged_by_provider() {
        let body = serde_json::json!({
            "provider": "gmail",
            "message": { "id": "18c2f", "payload": { "headers": [] } }
        });
        let request: IngestRequest = serde_json::from_value(body).unwrap();
        assert!(matches!(request, IngestRequest::Gmail { ref message, mailbox_id: None } if message.id == "18c2f"));

        let body = serde_json::json!({ "provider": "graph", "message": { "id": "AAMk" } });
        let request: IngestRequest = serde_json::from_value(body).unwrap();
        assert!(matches!(request, IngestRequest::Graph { ref attachments, .. } if attachments.is_empty()));
    }
}

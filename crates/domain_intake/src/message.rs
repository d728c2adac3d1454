//! Inbound mail as the intake pipeline sees it
//!
//! `InboundEmail` and `InboundAttachment` are provider-neutral: the Gmail
//! and Graph parsers both produce them, and everything downstream
//! (persistence, extraction, mapping) works only with these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AttachmentId, CaseId, EmailIntakeId, MailboxId};
use crate::error::IntakeError;
use crate::html::strip_html;
use crate::pdf::{extract_pdf_text, is_pdf};

/// Subject stored for messages that arrive without one
pub const NO_SUBJECT: &str = "(No Subject)";

/// A parsed inbound email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEmail {
    /// Provider message id, unique per mailbox provider
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
}

impl InboundEmail {
    /// Removes NUL characters, which PostgreSQL refuses in text columns
    pub fn sanitized(mut self) -> Self {
        for field in [
            &mut self.message_id,
            &mut self.subject,
            &mut self.sender_email,
            &mut self.sender_name,
            &mut self.recipient_email,
            &mut self.cc,
            &mut self.bcc,
            &mut self.body_text,
            &mut self.body_html,
        ] {
            strip_nul(field);
        }
        if let Some(thread_id) = self.thread_id.as_mut() {
            strip_nul(thread_id);
        }
        self
    }

    /// Plain body, falling back to the HTML body with tags removed
    pub fn readable_body(&self) -> String {
        if self.body_text.trim().is_empty() && !self.body_html.is_empty() {
            strip_html(&self.body_html)
        } else {
            self.body_text.clone()
        }
    }
}

fn strip_nul(text: &mut String) {
    if text.contains('\0') {
        text.retain(|c| c != '\0');
    }
}

/// Normalises a subject header, substituting [`NO_SUBJECT`] when blank
pub fn normalize_subject(subject: Option<&str>) -> String {
    match subject.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NO_SUBJECT.to_string(),
    }
}

/// Where an attachment's bytes can be found
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentSource {
    /// Bytes were embedded in the message payload
    Inline(Vec<u8>),
    /// Bytes must be downloaded from the provider with this id
    Remote(String),
}

/// An attachment as listed by the provider, before download
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPart {
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub source: AttachmentSource,
}

/// A message fetched from a provider, attachments not yet resolved
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    pub email: InboundEmail,
    pub attachments: Vec<AttachmentPart>,
}

impl ProviderMessage {
    /// Attachments whose bytes are already available
    pub fn inline_attachments(&self) -> Vec<(String, String, Vec<u8>)> {
        self.attachments
            .iter()
            .filter_map(|part| match &part.source {
                AttachmentSource::Inline(data) => {
                    Some((part.filename.clone(), part.content_type.clone(), data.clone()))
                }
                AttachmentSource::Remote(_) => None,
            })
            .collect()
    }
}

/// A downloaded attachment with its extracted text
#[derive(Debug, Clone, PartialEq)]
pub struct InboundAttachment {
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub data: Vec<u8>,
    pub is_pdf: bool,
    pub extracted_text: String,
}

impl InboundAttachment {
    /// Wraps downloaded bytes, extracting text when the attachment is a PDF
    ///
    /// PDF parsing is CPU bound; async callers should run this on a
    /// blocking thread.
    pub fn from_bytes(filename: &str, content_type: &str, data: Vec<u8>) -> Self {
        let is_pdf = is_pdf(content_type);
        let extracted_text = if is_pdf {
            extract_pdf_text(&data)
        } else {
            String::new()
        };
        tracing::debug!(filename, chars = extracted_text.len(), is_pdf, "attachment prepared");
        Self {
            filename: match filename.replace('\0', "") {
                name if name.is_empty() => "unnamed_attachment".to_string(),
                name => name,
            },
            content_type: content_type.to_string(),
            size: data.len() as i64,
            data,
            is_pdf,
            extracted_text,
        }
    }

    /// Builds an attachment from text that was extracted earlier
    pub fn with_text(filename: &str, content_type: &str, extracted_text: &str) -> Self {
        Self {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            size: 0,
            data: Vec::new(),
            is_pdf: is_pdf(content_type),
            extracted_text: extracted_text.to_string(),
        }
    }
}

/// Processing state of a stored email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "PENDING",
            ProcessingStatus::Processing => "PROCESSING",
            ProcessingStatus::Completed => "COMPLETED",
            ProcessingStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ProcessingStatus::Pending),
            "PROCESSING" => Ok(ProcessingStatus::Processing),
            "COMPLETED" => Ok(ProcessingStatus::Completed),
            "FAILED" => Ok(ProcessingStatus::Failed),
            other => Err(IntakeError::MalformedMessage(format!("unknown processing status: {}", other))),
        }
    }
}

/// A stored inbound email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailIntake {
    pub id: EmailIntakeId,
    pub mailbox_id: Option<MailboxId>,
    #[serde(flatten)]
    pub email: InboundEmail,
    pub status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub case_id: Option<CaseId>,
    pub created_at: DateTime<Utc>,
}

impl EmailIntake {
    /// A freshly received email, about to be processed
    pub fn received(email: InboundEmail, mailbox_id: Option<MailboxId>) -> Self {
        Self {
            id: EmailIntakeId::new_v7(),
            mailbox_id,
            email,
            status: ProcessingStatus::Processing,
            processing_error: None,
            processed_at: None,
            case_id: None,
            created_at: Utc::now(),
        }
    }
}

/// A stored attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAttachment {
    pub id: AttachmentId,
    pub email_id: EmailIntakeId,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub is_pdf: bool,
    pub extracted_text: String,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredAttachment {
    pub fn from_inbound(email_id: EmailIntakeId, attachment: &InboundAttachment, file_path: Option<String>) -> Self {
        Self {
            id: AttachmentId::new_v7(),
            email_id,
            filename: attachment.filename.clone(),
            content_type: attachment.content_type.clone(),
            size: attachment.size,
            is_pdf: attachment.is_pdf,
            extracted_text: attachment.extracted_text.clone(),
            file_path,
            created_at: Utc::now(),
        }
    }
}

/// An email with its attachments, as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub intake: EmailIntake,
    pub attachments: Vec<StoredAttachment>,
}

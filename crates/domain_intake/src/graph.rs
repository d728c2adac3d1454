//! Microsoft Graph message payloads (Outlook / Microsoft 365)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::IntakeError;
use crate::message::{normalize_subject, AttachmentPart, AttachmentSource, InboundEmail, ProviderMessage};

/// `@odata.type` of attachments that carry file bytes
pub const FILE_ATTACHMENT_TYPE: &str = "#microsoft.graph.fileAttachment";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMessage {
    pub id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<GraphRecipient>,
    #[serde(default)]
    pub to_recipients: Vec<GraphRecipient>,
    #[serde(default)]
    pub cc_recipients: Vec<GraphRecipient>,
    #[serde(default)]
    pub bcc_recipients: Vec<GraphRecipient>,
    #[serde(default)]
    pub body: Option<GraphBody>,
    #[serde(default)]
    pub received_date_time: Option<String>,
    #[serde(default)]
    pub has_attachments: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecipient {
    pub email_address: GraphEmailAddress,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphEmailAddress {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphBody {
    /// `text` or `html`
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAttachment {
    #[serde(rename = "@odata.type", default)]
    pub odata_type: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub content_bytes: Option<String>,
}

impl GraphAttachment {
    /// File attachments become parts; item and reference attachments are skipped
    pub fn into_part(self) -> Option<AttachmentPart> {
        if self.odata_type != FILE_ATTACHMENT_TYPE {
            return None;
        }
        let source = match self.content_bytes.as_deref() {
            Some(encoded) => match STANDARD.decode(encoded.trim()) {
                Ok(bytes) => AttachmentSource::Inline(bytes),
                Err(e) => {
                    warn!(filename = %self.name, error = %e, "skipping undecodable Graph attachment");
                    return None;
                }
            },
            None => AttachmentSource::Remote(self.id.clone()),
        };
        Some(AttachmentPart {
            filename: self.name,
            content_type: self
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size: self.size,
            source,
        })
    }
}

fn join_addresses(recipients: &[GraphRecipient]) -> String {
    recipients
        .iter()
        .map(|r| r.email_address.address.as_str())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses a Graph message and its already fetched attachments
pub fn parse_graph_message(
    message: &GraphMessage,
    attachments: Vec<GraphAttachment>,
) -> Result<ProviderMessage, IntakeError> {
    if message.id.trim().is_empty() {
        return Err(IntakeError::MalformedMessage("message has no id".to_string()));
    }

    let (body_text, body_html) = match &message.body {
        Some(body) if body.content_type.eq_ignore_ascii_case("html") => (String::new(), body.content.clone()),
        Some(body) => (body.content.clone(), String::new()),
        None => (String::new(), String::new()),
    };

    let received_at = message
        .received_date_time
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let (sender_email, sender_name) = message
        .from
        .as_ref()
        .map(|f| (f.email_address.address.clone(), f.email_address.name.clone()))
        .unwrap_or_default();

    let parts: Vec<AttachmentPart> = attachments.into_iter().filter_map(GraphAttachment::into_part).collect();

    let email = InboundEmail {
        message_id: message.id.clone(),
        thread_id: message.conversation_id.clone(),
        subject: normalize_subject(message.subject.as_deref()),
        sender_email,
        sender_name,
        recipient_email: join_addresses(&message.to_recipients),
        cc: join_addresses(&message.cc_recipients),
        bcc: join_addresses(&message.bcc_recipients),
        body_text,
        body_html,
        received_at,
        has_attachments: message.has_attachments || !parts.is_empty(),
    };
    Ok(ProviderMessage { email, attachments: parts })
}

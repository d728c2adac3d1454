//! Gmail API message payloads
//!
//! Parses the `format=full` JSON returned by
//! `users.messages.get` into an [`InboundEmail`] plus the list of
//! attachment parts. Bodies and inline attachments are base64url encoded,
//! sometimes without padding.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::IntakeError;
use crate::message::{normalize_subject, AttachmentPart, AttachmentSource, InboundEmail, ProviderMessage};

/// base64url that accepts padded and unpadded input
pub const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub payload: GmailPart,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailPart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub headers: Vec<GmailHeader>,
    #[serde(default)]
    pub body: GmailBody,
    #[serde(default)]
    pub parts: Vec<GmailPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmailHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailBody {
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub data: Option<String>,
}

impl GmailBody {
    fn encoded(&self) -> Option<&str> {
        self.data.as_deref().filter(|d| !d.is_empty())
    }
}

/// Decodes Gmail's base64url encoding
pub fn decode_base64url(data: &str) -> Result<Vec<u8>, IntakeError> {
    Ok(URL_SAFE_LENIENT.decode(data.trim())?)
}

fn decode_text(data: &str) -> String {
    match decode_base64url(data) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(error = %e, "undecodable body part");
            String::new()
        }
    }
}

/// Header value by case-insensitive name
pub fn header<'a>(headers: &'a [GmailHeader], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Splits `Name <address>` into `(address, name)`
pub fn parse_address(value: &str) -> (String, String) {
    let value = value.trim();
    match (value.rfind('<'), value.rfind('>')) {
        (Some(start), Some(end)) if start < end => {
            let address = value[start + 1..end].trim().to_string();
            let name = value[..start].trim().trim_matches('"').trim().to_string();
            (address, name)
        }
        _ => (value.to_string(), String::new()),
    }
}

/// Parses an RFC 2822 `Date` header
///
/// Trailing zone comments such as `(UTC)` are ignored.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let value = match value.rfind('(') {
        Some(idx) if value.ends_with(')') => value[..idx].trim_end(),
        _ => value,
    };
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Plain and HTML bodies of a payload
///
/// A body on the payload itself is a single-part message. Otherwise
/// direct `text/plain` and `text/html` parts win, and nested multiparts
/// only fill a slot that is still empty.
pub fn extract_bodies(payload: &GmailPart) -> (String, String) {
    let mut text = String::new();
    let mut html = String::new();

    if let Some(data) = payload.body.encoded() {
        let decoded = decode_text(data);
        if payload.mime_type.contains("text/plain") {
            text = decoded;
        } else if payload.mime_type.contains("text/html") {
            html = decoded;
        }
        return (text, html);
    }

    for part in &payload.parts {
        match part.body.encoded() {
            Some(data) if part.mime_type.contains("text/plain") => text = decode_text(data),
            Some(data) if part.mime_type.contains("text/html") => html = decode_text(data),
            _ if !part.parts.is_empty() => {
                let (nested_text, nested_html) = extract_bodies(part);
                if text.is_empty() {
                    text = nested_text;
                }
                if html.is_empty() {
                    html = nested_html;
                }
            }
            _ => {}
        }
    }
    (text, html)
}

/// Every part below the payload, depth first
fn all_parts(payload: &GmailPart) -> Vec<&GmailPart> {
    let mut parts = Vec::new();
    for part in &payload.parts {
        parts.push(part);
        parts.extend(all_parts(part));
    }
    parts
}

/// Parts that carry a filename
pub fn attachment_parts(payload: &GmailPart) -> Vec<AttachmentPart> {
    all_parts(payload)
        .into_iter()
        .filter(|part| !part.filename.is_empty())
        .filter_map(|part| {
            let source = if let Some(id) = part.body.attachment_id.as_ref().filter(|id| !id.is_empty()) {
                AttachmentSource::Remote(id.clone())
            } else {
                let data = part.body.encoded()?;
                match decode_base64url(data) {
                    Ok(bytes) => AttachmentSource::Inline(bytes),
                    Err(e) => {
                        warn!(filename = %part.filename, error = %e, "skipping undecodable inline attachment");
                        return None;
                    }
                }
            };
            let content_type = if part.mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                part.mime_type.clone()
            };
            Some(AttachmentPart {
                filename: part.filename.clone(),
                content_type,
                size: part.body.size,
                source,
            })
        })
        .collect()
}

/// Parses a full Gmail message
pub fn parse_gmail_message(message: &GmailMessage) -> Result<ProviderMessage, IntakeError> {
    if message.id.trim().is_empty() {
        return Err(IntakeError::MalformedMessage("message has no id".to_string()));
    }
    let headers = &message.payload.headers;
    let (sender_email, sender_name) = header(headers, "From").map(parse_address).unwrap_or_default();

    let received_at = match header(headers, "Date") {
        Some(raw) => parse_date(raw).unwrap_or_else(|| {
            warn!(message_id = %message.id, date = raw, "unparseable Date header, using now");
            Utc::now()
        }),
        None => Utc::now(),
    };

    let (body_text, body_html) = extract_bodies(&message.payload);
    let attachments = attachment_parts(&message.payload);

    let email = InboundEmail {
        message_id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        subject: normalize_subject(header(headers, "Subject")),
        sender_email,
        sender_name,
        recipient_email: header(headers, "To").unwrap_or_default().to_string(),
        cc: header(headers, "Cc").unwrap_or_default().to_string(),
        bcc: header(headers, "Bcc").unwrap_or_default().to_string(),
        body_text,
        body_html,
        received_at,
        has_attachments: !attachments.is_empty(),
    };
    Ok(ProviderMessage { email, attachments })
}

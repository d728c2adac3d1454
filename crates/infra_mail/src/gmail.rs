//! Gmail REST API client

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use domain_identity::OutgoingMessage;
use domain_intake::{
    decode_base64url, parse_gmail_message, GmailMessage, IntakeError, MailProvider, MailProviderKind,
    ProviderMessage,
};

use crate::error::MailError;
use crate::http::check;
use crate::notifier::MailSender;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Search used to find messages that still need processing
pub const UNREAD_QUERY: &str = "is:unread";

/// A Gmail mailbox reached with an OAuth access token
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct AttachmentBody {
    #[serde(default)]
    data: String,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self::with_base_url(http, access_token, GMAIL_API_BASE)
    }

    /// Points the client at another API root, e.g. a local stub
    pub fn with_base_url(http: reqwest::Client, access_token: String, base_url: &str) -> Self {
        Self { http, access_token, base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{}", self.base_url, path)
    }

    /// Address of the authorized account
    pub async fn profile_address(&self) -> Result<String, MailError> {
        let response = self.http.get(self.url("profile")).bearer_auth(&self.access_token).send().await?;
        let profile: Profile = check(response, "Gmail profile").await?.json().await?;
        Ok(profile.email_address)
    }

    async fn list_unread_ids(&self, max: usize) -> Result<Vec<String>, MailError> {
        let response = self
            .http
            .get(self.url("messages"))
            .bearer_auth(&self.access_token)
            .query(&[("q", UNREAD_QUERY), ("maxResults", &max.to_string())])
            .send()
            .await?;
        let list: MessageList = check(response, "Gmail list").await?.json().await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn get_message(&self, message_id: &str) -> Result<GmailMessage, MailError> {
        let response = self
            .http
            .get(self.url(&format!("messages/{}", message_id)))
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .send()
            .await?;
        Ok(check(response, "Gmail get message").await?.json().await?)
    }

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String, MailError> {
        let response = self
            .http
            .get(self.url(&format!("messages/{}/attachments/{}", message_id, attachment_id)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let body: AttachmentBody = check(response, "Gmail get attachment").await?.json().await?;
        Ok(body.data)
    }

    async fn remove_unread_label(&self, message_id: &str) -> Result<(), MailError> {
        let response = self
            .http
            .post(self.url(&format!("messages/{}/modify", message_id)))
            .bearer_auth(&self.access_token)
            .json(&json!({ "removeLabelIds": ["UNREAD"] }))
            .send()
            .await?;
        check(response, "Gmail modify").await?;
        Ok(())
    }
}

#[async_trait]
impl MailProvider for GmailClient {
    fn kind(&self) -> MailProviderKind {
        MailProviderKind::Gmail
    }

    async fn list_unread(&self, max: usize) -> Result<Vec<String>, IntakeError> {
        Ok(self.list_unread_ids(max).await?)
    }

    #[instrument(skip(self))]
    async fn fetch_message(&self, message_id: &str) -> Result<ProviderMessage, IntakeError> {
        let message = self.get_message(message_id).await?;
        parse_gmail_message(&message)
    }

    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, IntakeError> {
        let data = self.get_attachment(message_id, attachment_id).await?;
        decode_base64url(&data)
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), IntakeError> {
        Ok(self.remove_unread_label(message_id).await?)
    }
}

#[async_trait]
impl MailSender for GmailClient {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError> {
        let raw = URL_SAFE_NO_PAD.encode(rfc822(message));
        let response = self
            .http
            .post(self.url("messages/send"))
            .bearer_auth(&self.access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?;
        check(response, "Gmail send").await?;
        debug!(to = %message.to, "sent mail through Gmail");
        Ok(())
    }
}

/// Minimal plain-text RFC 822 message
pub fn rfc822(message: &OutgoingMessage) -> String {
    let subject = message.subject.replace(['\r', '\n'], " ");
    let to = message.to.replace(['\r', '\n'], "");
    format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
        to, subject, message.body
    )
}

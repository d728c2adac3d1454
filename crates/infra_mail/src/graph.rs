//! Microsoft Graph client for Outlook / Microsoft 365 mailboxes

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use domain_identity::OutgoingMessage;
use domain_intake::{
    parse_graph_message, GraphAttachment, GraphMessage, IntakeError, MailProvider, MailProviderKind,
    ProviderMessage,
};

use crate::error::MailError;
use crate::http::check;
use crate::notifier::MailSender;

pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    #[serde(default)]
    mail: Option<String>,
    #[serde(default)]
    user_principal_name: Option<String>,
}

impl GraphClient {
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self::with_base_url(http, access_token, GRAPH_API_BASE)
    }

    pub fn with_base_url(http: reqwest::Client, access_token: String, base_url: &str) -> Self {
        Self { http, access_token, base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/me/{}", self.base_url, path)
    }

    /// Address of the signed-in account
    pub async fn profile_address(&self) -> Result<String, MailError> {
        let response = self
            .http
            .get(format!("{}/me", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let profile: Profile = check(response, "Graph profile").await?.json().await?;
        profile
            .mail
            .or(profile.user_principal_name)
            .ok_or_else(|| MailError::Decode("profile has no mail address".to_string()))
    }

    async fn list_unread_ids(&self, max: usize) -> Result<Vec<String>, MailError> {
        let response = self
            .http
            .get(self.url("mailFolders/inbox/messages"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("$filter", "isRead eq false"),
                ("$select", "id"),
                ("$orderby", "receivedDateTime desc"),
                ("$top", &max.to_string()),
            ])
            .send()
            .await?;
        let list: Collection<MessageRef> = check(response, "Graph list").await?.json().await?;
        Ok(list.value.into_iter().map(|m| m.id).collect())
    }

    async fn get_message(&self, message_id: &str) -> Result<GraphMessage, MailError> {
        let response = self
            .http
            .get(self.url(&format!("messages/{}", message_id)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(check(response, "Graph get message").await?.json().await?)
    }

    async fn get_attachments(&self, message_id: &str) -> Result<Vec<GraphAttachment>, MailError> {
        let response = self
            .http
            .get(self.url(&format!("messages/{}/attachments", message_id)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let list: Collection<GraphAttachment> = check(response, "Graph attachments").await?.json().await?;
        Ok(list.value)
    }

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<GraphAttachment, MailError> {
        let response = self
            .http
            .get(self.url(&format!("messages/{}/attachments/{}", message_id, attachment_id)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(check(response, "Graph get attachment").await?.json().await?)
    }

    async fn set_read(&self, message_id: &str) -> Result<(), MailError> {
        let response = self
            .http
            .patch(self.url(&format!("messages/{}", message_id)))
            .bearer_auth(&self.access_token)
            .json(&json!({ "isRead": true }))
            .send()
            .await?;
        check(response, "Graph mark read").await?;
        Ok(())
    }
}

#[async_trait]
impl MailProvider for GraphClient {
    fn kind(&self) -> MailProviderKind {
        MailProviderKind::Outlook
    }

    async fn list_unread(&self, max: usize) -> Result<Vec<String>, IntakeError> {
        Ok(self.list_unread_ids(max).await?)
    }

    #[instrument(skip(self))]
    async fn fetch_message(&self, message_id: &str) -> Result<ProviderMessage, IntakeError> {
        let message = self.get_message(message_id).await?;
        let attachments = if message.has_attachments {
            self.get_attachments(message_id).await?
        } else {
            Vec::new()
        };
        parse_graph_message(&message, attachments)
    }

    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, IntakeError> {
        let attachment = self.get_attachment(message_id, attachment_id).await?;
        let encoded = attachment
            .content_bytes
            .ok_or_else(|| IntakeError::MalformedMessage(format!("attachment {} has no content", attachment_id)))?;
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| IntakeError::MalformedMessage(format!("attachment {}: {}", attachment_id, e)))
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), IntakeError> {
        Ok(self.set_read(message_id).await?)
    }
}

#[async_trait]
impl MailSender for GraphClient {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError> {
        let response = self
            .http
            .post(self.url("sendMail"))
            .bearer_auth(&self.access_token)
            .json(&send_mail_body(message))
            .send()
            .await?;
        check(response, "Graph sendMail").await?;
        debug!(to = %message.to, "sent mail through Graph");
        Ok(())
    }
}

fn send_mail_body(message: &OutgoingMessage) -> serde_json::Value {
    json!({
        "message": {
            "subject": message.subject,
            "body": { "contentType": "Text", "content": message.body },
            "toRecipients": [{ "emailAddress": { "address": message.to } }],
        },
        "saveToSentItems": false,
    })
}

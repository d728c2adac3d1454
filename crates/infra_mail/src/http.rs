//! Shared HTTP plumbing for the provider clients

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use tracing::debug;

use domain_intake::{MailProvider, MailProviderKind, Mailbox};

use crate::error::MailError;
use crate::gmail::GmailClient;
use crate::graph::GraphClient;
use crate::notifier::MailSender;

/// Request timeout for provider calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest error body kept in an error message
const MAX_ERROR_BODY: usize = 300;

/// Builds the client shared by all provider calls
pub fn build_http_client() -> Result<reqwest::Client, MailError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .user_agent(concat!("claims-desk/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| MailError::NotConfigured(e.to_string()))
}

/// Passes successful responses through and classifies failures
pub(crate) async fn check(response: Response, what: &str) -> Result<Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = format!("{} returned {}: {}", what, status, truncate(&body));
    debug!(%status, what, "provider request failed");
    Err(classify(status, detail))
}

pub(crate) fn classify(status: StatusCode, detail: String) -> MailError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MailError::Unauthorized(detail),
        StatusCode::NOT_FOUND => MailError::NotFound(detail),
        StatusCode::TOO_MANY_REQUESTS => MailError::RateLimited,
        s if s.is_server_error() => MailError::Unavailable(detail),
        _ => MailError::Request(detail),
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

/// Provider client for a connected mailbox, using its current access token
pub fn client_for(http: reqwest::Client, mailbox: &Mailbox) -> Arc<dyn MailProvider> {
    match mailbox.provider {
        MailProviderKind::Gmail => Arc::new(GmailClient::new(http, mailbox.access_token.clone())),
        MailProviderKind::Outlook => Arc::new(GraphClient::new(http, mailbox.access_token.clone())),
    }
}

/// Mail sender for a connected mailbox
pub fn sender_for(http: reqwest::Client, mailbox: &Mailbox) -> Arc<dyn MailSender> {
    match mailbox.provider {
        MailProviderKind::Gmail => Arc::new(GmailClient::new(http, mailbox.access_token.clone())),
        MailProviderKind::Outlook => Arc::new(GraphClient::new(http, mailbox.access_token.clone())),
    }
}

//! Connected mailboxes

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::MailboxId;
use crate::error::IntakeError;

/// Refresh access tokens this long before they expire
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MailProviderKind {
    Gmail,
    Outlook,
}

impl MailProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailProviderKind::Gmail => "GMAIL",
            MailProviderKind::Outlook => "OUTLOOK",
        }
    }
}

impl fmt::Display for MailProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MailProviderKind {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" | "google" => Ok(MailProviderKind::Gmail),
            "outlook" | "microsoft" | "graph" | "office365" => Ok(MailProviderKind::Outlook),
            _ => Err(IntakeError::UnknownProvider(s.to_string())),
        }
    }
}

/// A mailbox the desk polls, with its OAuth credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mailbox {
    pub id: MailboxId,
    pub provider: MailProviderKind,
    pub email_address: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Mailbox {
    pub fn connect(
        provider: MailProviderKind,
        email_address: &str,
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MailboxId::new_v7(),
            provider,
            email_address: email_address.trim().to_lowercase(),
            access_token,
            refresh_token,
            token_expires_at: expires_in_secs.map(|secs| now + Duration::seconds(secs)),
            is_active: true,
            last_synced_at: None,
            created_at: now,
        }
    }

    /// Whether the access token must be refreshed before use
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.token_expires_at {
            Some(expires_at) => expires_at - Duration::seconds(REFRESH_MARGIN_SECS) <= now,
            None => false,
        }
    }

    pub fn update_tokens(&mut self, access_token: String, refresh_token: Option<String>, expires_in_secs: Option<i64>) {
        self.access_token = access_token;
        // providers omit the refresh token on refresh grants
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.token_expires_at = expires_in_secs.map(|secs| Utc::now() + Duration::seconds(secs));
    }

    pub fn record_sync(&mut self, at: DateTime<Utc>) {
        self.last_synced_at = Some(at);
    }
}

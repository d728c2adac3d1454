//! Account notification delivery

use async_trait::async_trait;
use tracing::warn;

use domain_identity::{IdentityError, Notification, Notifier, OutgoingMessage, User};
use infra_db::repositories::IntakeRepository;
use infra_mail::{sender_for, MailboxNotifier, OAuthClient};

use crate::error::ApiError;
use crate::AppState;

/// Sends through the connected mailbox configured as the notifier
///
/// The mailbox is looked up on every send so reconnecting it through the
/// intake endpoints takes effect without a restart.
#[derive(Clone)]
pub struct DeskNotifier {
    mailboxes: IntakeRepository,
    http: reqwest::Client,
    oauth: OAuthClient,
    address: String,
}

impl DeskNotifier {
    pub fn new(mailboxes: IntakeRepository, http: reqwest::Client, oauth: OAuthClient, address: &str) -> Self {
        Self { mailboxes, http, oauth, address: address.trim().to_lowercase() }
    }
}

#[async_trait]
impl Notifier for DeskNotifier {
    async fn deliver(&self, message: OutgoingMessage) -> Result<(), IdentityError> {
        let mut mailbox = self
            .mailboxes
            .find_mailbox_by_address(&self.address)
            .await
            .map_err(|e| IdentityError::Delivery(e.to_string()))?
            .filter(|m| m.is_active)
            .ok_or_else(|| IdentityError::Delivery(format!("mailbox {} is not connected", self.address)))?;

        if self.oauth.ensure_fresh(&mut mailbox).await? {
            self.mailboxes
                .update_mailbox_tokens(&mailbox)
                .await
                .map_err(|e| IdentityError::Delivery(e.to_string()))?;
        }

        MailboxNotifier::new(sender_for(self.http.clone(), &mailbox))
            .deliver(message)
            .await
    }
}

/// Renders and sends a notification; delivery failures are returned
pub async fn send(state: &AppState, user: &User, notification: Notification) -> Result<(), ApiError> {
    let message = notification.render(user, &state.config.site_name, &state.config.frontend_url);
    state.notifier.deliver(message).await?;
    Ok(())
}

/// Renders and sends a notification the request does not depend on
pub async fn send_quietly(state: &AppState, user: &User, notification: Notification) {
    if let Err(e) = send(state, user, notification).await {
        warn!(user = %user.username, error = %e, "notification not delivered");
    }
}

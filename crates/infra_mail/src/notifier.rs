//! Account notifications sent through a connected mailbox

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use domain_identity::{IdentityError, Notifier, OutgoingMessage};

use crate::error::MailError;

/// Something that can send a plain-text email
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError>;
}

/// Delivers identity notifications through a mailbox's provider
#[derive(Clone)]
pub struct MailboxNotifier {
    sender: Arc<dyn MailSender>,
}

impl MailboxNotifier {
    pub fn new(sender: Arc<dyn MailSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Notifier for MailboxNotifier {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn deliver(&self, message: OutgoingMessage) -> Result<(), IdentityError> {
        if message.to.trim().is_empty() {
            return Err(IdentityError::Delivery("recipient has no email address".to_string()));
        }
        self.sender.send(&message).await.map_err(|e| {
            warn!(error = %e, "notification delivery failed");
            IdentityError::from(e)
        })
    }
}

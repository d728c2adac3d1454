//! Outbound account notifications
//!
//! The domain renders plain-text messages; delivery is behind the
//! [`Notifier`] port so the API can send through a connected mailbox or
//! just log them in development.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::IdentityError;
use crate::user::User;
use crate::verification::CODE_TTL_MINUTES;

pub const DEFAULT_SITE_NAME: &str = "Claims Desk";

/// What happened that the user must hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    TwoFactorCode { code: String },
    ResetCode { code: String },
    ResetLink { token: String },
    PasswordChanged,
    TwoFactorEnabled,
    Welcome,
}

/// A rendered plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Renders the message for a user
    ///
    /// `frontend_url` is only used by reset links.
    pub fn render(&self, user: &User, site_name: &str, frontend_url: &str) -> OutgoingMessage {
        let greeting = format!("Hello {},", user.display_name());
        let (subject, text) = match self {
            Notification::TwoFactorCode { code } => (
                format!("Your verification code - {}", site_name),
                format!(
                    "Your verification code is: {}\n\nThis code will expire in {} minutes.\n\n\
                     If you didn't request this code, please ignore this email and consider changing your password.",
                    code, CODE_TTL_MINUTES
                ),
            ),
            Notification::ResetCode { code } => (
                format!("Password Reset Code - {}", site_name),
                format!(
                    "Your password reset code is: {}\n\nThis code will expire in {} minutes.",
                    code, CODE_TTL_MINUTES
                ),
            ),
            Notification::ResetLink { token } => {
                let url = format!("{}/reset-password?token={}", frontend_url.trim_end_matches('/'), token);
                (
                    format!("Password Reset Request - {}", site_name),
                    format!(
                        "We received a request to reset your password. Open this link to proceed:\n\n{}\n\n\
                         This link will expire in 1 hour.",
                        url
                    ),
                )
            }
            Notification::PasswordChanged => (
                format!("Password Changed - {}", site_name),
                "Your password was changed. If this wasn't you, contact an administrator immediately.".to_string(),
            ),
            Notification::TwoFactorEnabled => (
                format!("Two-Factor Authentication Enabled - {}", site_name),
                "Two-factor authentication is now enabled on your account.".to_string(),
            ),
            Notification::Welcome => (
                format!("Welcome to {}!", site_name),
                format!("Your {} account is ready. You can sign in as {}.", site_name, user.username),
            ),
        };

        OutgoingMessage {
            to: user.email.clone(),
            subject,
            body: format!("{}\n\n{}\n\n{}", greeting, text, site_name),
        }
    }
}

/// Port for delivering account notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: OutgoingMessage) -> Result<(), IdentityError>;
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, message: OutgoingMessage) -> Result<(), IdentityError> {
        info!(to = %message.to, subject = %message.subject, "notification not sent, no mailbox configured");
        debug!(body = %message.body, "notification body");
        Ok(())
    }
}

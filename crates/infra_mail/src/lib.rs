//! Mail Provider Infrastructure
//!
//! HTTP clients for the two mail platforms insurers use to send claims:
//!
//! - [`GmailClient`] for Google Workspace / Gmail via the Gmail REST API
//! - [`GraphClient`] for Outlook / Microsoft 365 via Microsoft Graph
//!
//! Both implement the intake pipeline's [`domain_intake::MailProvider`]
//! port and the [`MailSender`] trait used by [`MailboxNotifier`] to deliver
//! verification codes and password-reset links.
//!
//! Mailboxes are connected with the OAuth authorization-code flow handled
//! by [`OAuthClient`], which also refreshes expiring access tokens.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_mail::{client_for, OAuthClient};
//!
//! let refreshed = oauth.ensure_fresh(&mut mailbox).await?;
//! let provider = client_for(http.clone(), &mailbox);
//! let report = intake_service.poll(provider.as_ref(), Some(mailbox.id), 25).await?;
//! ```

pub mod error;
pub mod http;
pub mod gmail;
pub mod graph;
pub mod oauth;
pub mod notifier;

pub use error::MailError;
pub use gmail::GmailClient;
pub use graph::GraphClient;
pub use oauth::{OAuthClient, OAuthCredentials, TokenGrant};
pub use notifier::{MailSender, MailboxNotifier};
pub use http::{build_http_client, client_for, sender_for};

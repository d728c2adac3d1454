//! Mail provider errors

use thiserror::Error;

/// Errors talking to a mail provider
///
/// HTTP failures are classified by status code:
/// - 401/403 -> `Unauthorized`
/// - 404 -> `NotFound`
/// - 429 -> `RateLimited`
/// - 5xx -> `Unavailable`
/// - Timeouts -> `Timeout`
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail provider rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("Not found at mail provider: {0}")]
    NotFound(String),

    #[error("Mail provider rate limit reached")]
    RateLimited,

    #[error("Mail provider unavailable: {0}")]
    Unavailable(String),

    #[error("Mail provider request timed out")]
    Timeout,

    #[error("Mail provider request failed: {0}")]
    Request(String),

    #[error("Unexpected mail provider response: {0}")]
    Decode(String),

    #[error("Mail provider not configured: {0}")]
    NotConfigured(String),
}

impl MailError {
    /// Whether a retry later might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, MailError::RateLimited | MailError::Unavailable(_) | MailError::Timeout)
    }
}

impl From<reqwest::Error> for MailError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            MailError::Timeout
        } else if error.is_decode() {
            MailError::Decode(error.to_string())
        } else {
            MailError::Request(error.to_string())
        }
    }
}

impl From<MailError> for domain_intake::IntakeError {
    fn from(error: MailError) -> Self {
        domain_intake::IntakeError::Provider(error.to_string())
    }
}

impl From<MailError> for domain_identity::IdentityError {
    fn from(error: MailError) -> Self {
        domain_identity::IdentityError::Delivery(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(MailError::RateLimited.is_transient());
        assert!(MailError::Timeout.is_transient());
        assert!(MailError::Unavailable("502".to_string()).is_transient());
        assert!(!MailError::Unauthorized("expired".to_string()).is_transient());
    }

    #[test]
    fn test_into_intake_error() {
        let err: domain_intake::IntakeError = MailError::RateLimited.into();
        assert!(matches!(err, domain_intake::IntakeError::Provider(_)));
    }
}

//! Identity domain errors

use thiserror::Error;

/// Errors that can occur in the identity domain
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Invalid or expired verification code")]
    InvalidCode,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password policy violation: {0}")]
    WeakPassword(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Role {0} cannot be self-registered")]
    RoleNotRegistrable(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid user data: {0}")]
    InvalidData(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

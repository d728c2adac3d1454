//! Intake domain errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Mail provider error: {0}")]
    Provider(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Decoding failed: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Email not found: {0}")]
    NotFound(String),

    #[error("Unknown mail provider: {0}")]
    UnknownProvider(String),

    #[error(transparent)]
    Case(#[from] domain_cases::CaseError),
}

impl From<base64::DecodeError> for IntakeError {
    fn from(err: base64::DecodeError) -> Self {
        IntakeError::Decode(err.to_string())
    }
}

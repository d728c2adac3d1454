//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_cases::CaseError;
use domain_dispatch::DispatchError;
use domain_identity::IdentityError;
use domain_intake::IntakeError;
use infra_db::DatabaseError;
use infra_mail::MailError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {message}")]
    Validation { message: String, details: Vec<String> },

    #[error("Too many requests: {0}")]
    RateLimited(String),

    /// A mail provider failed or rejected the request
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn not_authenticated() -> Self {
        ApiError::Unauthorized("Not authenticated".to_string())
    }

    pub fn forbidden(message: &str) -> Self {
        ApiError::Forbidden(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal error");
                ("internal_error", "An internal error occurred".to_string(), None)
            }
            ApiError::Database(msg) => {
                error!(error = %msg, "database error");
                ("database_error", "A database error occurred".to_string(), None)
            }
            ApiError::Validation { message, details } => ("validation_error", message, Some(details)),
            ApiError::RateLimited(msg) => ("rate_limited", msg, None),
            ApiError::Upstream(msg) => ("upstream_error", msg, None),
            ApiError::Unavailable(msg) => ("unavailable", msg, None),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::NotFound(msg),
            DatabaseError::DuplicateEntry(msg) => ApiError::Conflict(msg),
            DatabaseError::ForeignKeyViolation(msg) | DatabaseError::ConstraintViolation(msg) => {
                ApiError::BadRequest(msg)
            }
            DatabaseError::ConnectionFailed(msg) => ApiError::Unavailable(msg),
            DatabaseError::PoolExhausted => ApiError::Unavailable("database pool exhausted".to_string()),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::UserNotFound(msg) => ApiError::NotFound(format!("User not found: {}", msg)),
            IdentityError::InvalidCredentials | IdentityError::AccountDisabled => {
                ApiError::Unauthorized(err.to_string())
            }
            IdentityError::Hashing(msg) => ApiError::Internal(msg),
            IdentityError::Delivery(msg) => ApiError::Upstream(format!("Could not send email: {}", msg)),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<CaseError> for ApiError {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::CaseNotFound(_) => ApiError::NotFound(err.to_string()),
            CaseError::AlreadyAssigned => ApiError::Conflict(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Case(inner) => inner.into(),
            DispatchError::AlreadyAssigned => ApiError::Conflict(err.to_string()),
            DispatchError::VendorNotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Case(inner) => inner.into(),
            IntakeError::NotFound(_) => ApiError::NotFound(err.to_string()),
            IntakeError::Provider(msg) => ApiError::Upstream(msg),
            IntakeError::Storage(msg) => ApiError::Database(msg),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::RateLimited => ApiError::RateLimited(err.to_string()),
            MailError::NotConfigured(msg) => ApiError::Unavailable(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::Validation { message: "Request validation failed".to_string(), details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_map_to_statuses() {
        assert_eq!(ApiError::from(DatabaseError::not_found("Case", "x")).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(DatabaseError::duplicate("Case", "claim number", "123")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::from(DatabaseError::PoolExhausted).status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_domain_errors_map_to_statuses() {
        assert_eq!(ApiError::from(IdentityError::InvalidCredentials).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(IdentityError::PasswordMismatch).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(CaseError::AlreadyAssigned).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(DispatchError::MissingCoordinates).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(DispatchError::Case(CaseError::CaseNotFound("c".to_string()))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::from(IntakeError::Provider("502".to_string())).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::from(MailError::RateLimited).status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let response = ApiError::Database("relation \"cases\" does not exist".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

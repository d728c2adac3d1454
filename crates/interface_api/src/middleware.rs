//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::AppState;
use crate::auth::{extract_token, validate_token, AuthError, CurrentUser};
use crate::error::ApiError;

/// Username of the authenticated caller, passed back to the audit layer
#[derive(Debug, Clone)]
pub struct AuditUser(pub String);

/// Authentication middleware
///
/// Accepts the session JWT from the `Authorization` header or the session
/// cookie, checks the stored session it names is still live, and loads the
/// caller into the request extensions as a [`CurrentUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        warn!("Missing session token");
        ApiError::not_authenticated()
    })?;

    let claims = validate_token(&token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = %e, "Token validation failed");
        ApiError::from(e)
    })?;

    let tokens = state.tokens();
    let session = tokens
        .find_auth_token(&claims.jti)
        .await?
        .ok_or(AuthError::Revoked)?;

    let now = Utc::now();
    if session.is_expired(now) {
        tokens.delete_auth_token(&session.token).await?;
        return Err(AuthError::TokenExpired.into());
    }
    if session.user_id.as_uuid().to_string() != claims.sub {
        warn!(jti = %claims.jti, "Token subject does not match its session");
        return Err(AuthError::InvalidToken.into());
    }
    tokens.touch_auth_token(&session.token, now).await?;

    let user = state
        .users()
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(ApiError::not_authenticated)?;
    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is disabled".to_string()));
    }

    let audit_user = AuditUser(user.username.clone());
    request.extensions_mut().insert(CurrentUser {
        user,
        session_token: session.token,
        session_expires_at: session.expires_at,
    });

    let mut response = next.run(request).await;
    response.extensions_mut().insert(audit_user);
    Ok(response)
}

/// Audit logging middleware
///
/// Logs all API requests for compliance and debugging
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();
    let user = response
        .extensions()
        .get::<AuditUser>()
        .map(|u| u.0.as_str())
        .unwrap_or("anonymous");

    info!(
        method = %method,
        uri = %uri,
        user = %user,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}

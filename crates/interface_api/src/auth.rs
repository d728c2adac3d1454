//! Authentication and authorization
//!
//! A session is an [`AuthToken`] row plus a signed JWT whose `jti` is the
//! row's token. Deleting the row (logout, password change) revokes every
//! copy of the JWT even though its signature is still valid.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use domain_identity::{AuthToken, Role, User};
use domain_intake::MailProviderKind;

use crate::error::ApiError;

/// Cookie carrying the session JWT for browser clients
pub const SESSION_COOKIE: &str = "sessionid";

/// Lifetime of the OAuth `state` parameter
const OAUTH_STATE_TTL_MINUTES: i64 = 10;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Token of the stored session
    pub jti: String,
    /// User's role at issue time
    pub role: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Session has been revoked")]
    Revoked,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Signs a session JWT for a stored auth token
///
/// # Arguments
///
/// * `user` - The account the session belongs to
/// * `session` - Stored token row; its token becomes the `jti`
/// * `secret` - JWT secret key
pub fn create_token(user: &User, session: &AuthToken, secret: &str) -> Result<String, AuthError> {
    let expires_at = session.expires_at.unwrap_or_else(|| Utc::now() + Duration::days(365));
    let claims = Claims {
        sub: user.id.as_uuid().to_string(),
        jti: session.token.clone(),
        role: user.role.as_str().to_string(),
        exp: expires_at.timestamp(),
        iat: session.created_at.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Validates a JWT token
///
/// # Arguments
///
/// * `token` - The JWT token to validate
/// * `secret` - JWT secret key
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Session JWT from `Authorization: Bearer` or the session cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value that stores the session JWT
pub fn session_cookie(jwt: &str, max_age_secs: u64) -> Result<HeaderValue, ApiError> {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}", SESSION_COOKIE, jwt, max_age_secs)
        .parse()
        .map_err(|_| ApiError::Internal("failed to build session cookie".to_string()))
}

/// `Set-Cookie` value that clears the session cookie
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("sessionid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// The authenticated caller, inserted by the auth middleware
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    /// Token of the session used for this request
    pub session_token: String,
    pub session_expires_at: Option<DateTime<Utc>>,
}

impl CurrentUser {
    pub fn require_super_admin(&self) -> Result<(), ApiError> {
        if self.user.is_super_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Super admin access required"))
        }
    }

    /// ADMIN or SUPER_ADMIN
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.user.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }

    pub fn require_vendor(&self) -> Result<(), ApiError> {
        if self.user.is_vendor() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Vendor access required"))
        }
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(ApiError::not_authenticated)
    }
}

/// Claims of the signed `state` round-tripped through the OAuth consent page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthState {
    pub sub: String,
    pub provider: MailProviderKind,
    pub exp: i64,
    pub nonce: String,
}

pub fn sign_oauth_state(user: &User, provider: MailProviderKind, secret: &str) -> Result<String, AuthError> {
    let state = OAuthState {
        sub: user.id.as_uuid().to_string(),
        provider,
        exp: (Utc::now() + Duration::minutes(OAUTH_STATE_TTL_MINUTES)).timestamp(),
        nonce: format!("{:016x}", rand::random::<u64>()),
    };
    encode(&Header::default(), &state, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Checks a returned `state` was issued to this user for this provider
pub fn verify_oauth_state(
    state: &str,
    user: &User,
    provider: MailProviderKind,
    secret: &str,
) -> Result<(), AuthError> {
    let data = decode::<OAuthState>(state, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;
    if data.claims.sub != user.id.as_uuid().to_string() || data.claims.provider != provider {
        return Err(AuthError::InvalidToken);
    }
    Ok(())
}

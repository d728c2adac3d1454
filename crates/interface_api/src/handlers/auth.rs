//! Authentication handlers
//!
//! Login with optional emailed second factor, self registration, password
//! reset by code or by link, session management and two-factor settings.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use tracing::info;
use validator::Validate;

use domain_dispatch::{NewVendor, Vendor};
use domain_identity::{
    hash_password, validate_new_password, verify_password, AuthToken, CodeCheck, CodePurpose, IdentityError,
    NewUser, Notification, PasswordResetToken, Role, User, VerificationCode,
};

use crate::{AppState, error::ApiError};
use crate::auth::{clear_session_cookie, create_token, session_cookie, CurrentUser};
use crate::dto::auth::*;
use crate::dto::MessageResponse;
use crate::notify::{send, send_quietly};

const RESET_REQUESTED: &str = "If an account exists with this email, a password reset code has been sent.";
const RESET_LINK_REQUESTED: &str = "If an account exists with this email, a password reset link has been sent.";

// ----------------------------------------------------------------------------
// Shared helpers
// ----------------------------------------------------------------------------

/// Looks up the account for a username or email and checks its password
async fn authenticate(state: &AppState, login: &str, password: &str) -> Result<User, ApiError> {
    let user = state
        .users()
        .find_by_login(login)
        .await?
        .filter(|u| verify_password(password, &u.password_hash))
        .ok_or(IdentityError::InvalidCredentials)?;

    if !user.is_active {
        return Err(IdentityError::AccountDisabled.into());
    }
    Ok(user)
}

/// Stores a new session for the user and signs its bearer token
pub(crate) async fn start_session(state: &AppState, user: &User) -> Result<(AuthToken, String), ApiError> {
    let ttl = Duration::seconds(state.config.jwt_expiration_secs.min(u64::from(u32::MAX)) as i64);
    let session = AuthToken::issue_with_ttl(user.id, ttl);
    state.tokens().insert_auth_token(&session).await?;
    let jwt = create_token(user, &session, &state.config.jwt_secret)?;
    Ok((session, jwt))
}

/// Login-style response: body plus the session cookie
fn session_response(
    state: &AppState,
    status: StatusCode,
    message: &str,
    user: &User,
    session: &AuthToken,
    jwt: String,
) -> Result<Response, ApiError> {
    let cookie = session_cookie(&jwt, state.config.jwt_expiration_secs)?;
    let body = LoginResponse {
        message: message.to_string(),
        user: UserResponse::from(user),
        token: TokenResponse { token: jwt, token_type: "Bearer", expires_at: session.expires_at },
    };
    Ok((status, [(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Creates the company profile a vendor login needs to work cases
pub(crate) async fn ensure_vendor_profile(state: &AppState, user: &User) -> Result<(), ApiError> {
    if user.role != Role::Vendor {
        return Ok(());
    }
    let vendors = state.vendors();
    if vendors.find_by_user(user.id).await?.is_some() {
        return Ok(());
    }

    let company_name = match user.full_name() {
        name if name.is_empty() => user.username.clone(),
        name => name,
    };
    let vendor = Vendor::new(NewVendor {
        user_id: Some(user.id),
        company_name,
        contact_email: Some(user.email.clone()),
        ..Default::default()
    })?;
    vendors.insert(&vendor).await?;
    info!(user = %user.username, vendor_id = %vendor.id, "created vendor profile");
    Ok(())
}

/// Issues a fresh code and emails it
async fn issue_code(state: &AppState, user: &User, purpose: CodePurpose) -> Result<(), ApiError> {
    let code = VerificationCode::issue(user.id, purpose);
    state.tokens().issue_code(&code).await?;

    let notification = match purpose {
        CodePurpose::PasswordReset => Notification::ResetCode { code: code.code },
        _ => Notification::TwoFactorCode { code: code.code },
    };
    send(state, user, notification).await
}

/// Checks a submitted code against the latest one issued
///
/// Wrong guesses are counted. With `consume` an accepted code is marked
/// used. Returns whether the code was accepted.
async fn check_code(
    state: &AppState,
    user: &User,
    purpose: CodePurpose,
    submitted: &str,
    consume: bool,
) -> Result<bool, ApiError> {
    let tokens = state.tokens();
    let Some(code) = tokens.latest_code(user.id, purpose).await? else {
        return Ok(false);
    };

    let now = Utc::now();
    if !code.is_valid(now) {
        return Ok(false);
    }
    let outcome = tokens.attempt_code(code.id, submitted, consume, now).await?;
    if outcome == CodeCheck::Mismatch {
        info!(user = %user.username, purpose = purpose.as_str(), "wrong verification code");
    }
    Ok(outcome == CodeCheck::Accepted)
}

/// Sets a new password and ends every session of the account
async fn replace_password(state: &AppState, user: &User, new_password: &str) -> Result<(), ApiError> {
    let hash = hash_password(new_password)?;
    state.users().set_password(user.id, &hash).await?;
    let revoked = state.tokens().delete_auth_tokens_for_user(user.id).await?;
    info!(user = %user.username, sessions_revoked = revoked, "password replaced");
    send_quietly(state, user, Notification::PasswordChanged).await;
    Ok(())
}

fn invalid_code() -> ApiError {
    ApiError::BadRequest(IdentityError::InvalidCode.to_string())
}

// ----------------------------------------------------------------------------
// Login and registration
// ----------------------------------------------------------------------------

/// Logs in with username or email
///
/// Accounts with two-factor login get a 202 and an emailed code on the
/// first call; the second call repeats the credentials with the code.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;
    let mut user = authenticate(&state, &request.username, &request.password).await?;

    if user.is_2fa_enabled {
        match request.code.as_deref() {
            None => {
                issue_code(&state, &user, CodePurpose::TwoFactor).await?;
                let body = TwoFactorRequiredResponse {
                    message: "Two-factor authentication required. Code sent to your email.".to_string(),
                    requires_2fa: true,
                    username: user.username.clone(),
                };
                return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
            }
            Some(code) => {
                if !check_code(&state, &user, CodePurpose::TwoFactor, code, true).await? {
                    return Err(ApiError::Unauthorized(IdentityError::InvalidCode.to_string()));
                }
            }
        }
    }

    ensure_vendor_profile(&state, &user).await?;
    let (session, jwt) = start_session(&state, &user).await?;
    let now = Utc::now();
    state.users().record_login(user.id, now).await?;
    user.last_login = Some(now);

    info!(user = %user.username, role = %user.role, "login");
    session_response(&state, StatusCode::OK, "Login successful", &user, &session, jwt)
}

/// Sends a new two-factor code for a login in progress
pub async fn resend_two_factor_code(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    let user = authenticate(&state, &request.username, &request.password).await?;
    if !user.is_2fa_enabled {
        return Err(ApiError::BadRequest("2FA is not enabled for this account".to_string()));
    }

    issue_code(&state, &user, CodePurpose::TwoFactor).await?;
    Ok(Json(MessageResponse::new("A new verification code has been sent to your email.")))
}

/// Creates an account and logs it in
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;
    let role = Role::for_registration(request.role.as_deref())?;

    let users = state.users();
    if users.find_by_login(&request.username).await?.is_some() {
        return Err(ApiError::BadRequest("Username already taken".to_string()));
    }
    if users.find_by_email(&request.email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let hash = hash_password(&request.password)?;
    let user = User::new(
        NewUser {
            username: request.username,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            role,
            sub_role: None,
        },
        hash,
    )?;
    users.insert(&user).await?;
    ensure_vendor_profile(&state, &user).await?;

    let (session, jwt) = start_session(&state, &user).await?;
    info!(user = %user.username, role = %user.role, "registered");
    send_quietly(&state, &user, Notification::Welcome).await;

    session_response(&state, StatusCode::CREATED, "Registration successful", &user, &session, jwt)
}

// ----------------------------------------------------------------------------
// Password reset
// ----------------------------------------------------------------------------

/// Emails a reset code; the response never reveals whether the account exists
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    if let Some(user) = state.users().find_by_email(&request.email).await?.filter(|u| u.is_active) {
        issue_code(&state, &user, CodePurpose::PasswordReset).await?;
        info!(user = %user.username, "password reset code issued");
    }
    Ok(Json(MessageResponse::new(RESET_REQUESTED)))
}

/// Emails a reset link; the response never reveals whether the account exists
pub async fn forgot_password_link(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    if let Some(user) = state.users().find_by_email(&request.email).await?.filter(|u| u.is_active) {
        let token = PasswordResetToken::issue(user.id);
        state.tokens().issue_reset_token(&token).await?;
        send(&state, &user, Notification::ResetLink { token: token.token }).await?;
        info!(user = %user.username, "password reset link issued");
    }
    Ok(Json(MessageResponse::new(RESET_LINK_REQUESTED)))
}

/// Checks a reset code without using it up
pub async fn verify_reset_code(
    State(state): State<AppState>,
    Json(request): Json<VerifyResetCodeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    let user = state
        .users()
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid email or code".to_string()))?;

    if !check_code(&state, &user, CodePurpose::PasswordReset, &request.code, false).await? {
        return Err(invalid_code());
    }
    Ok(Json(MessageResponse::new("Code verified. You can now set a new password.")))
}

/// Resets the password with an emailed code
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    validate_new_password(&request.new_password, &request.confirm_password)?;

    let user = state
        .users()
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid email or code".to_string()))?;
    if !check_code(&state, &user, CodePurpose::PasswordReset, &request.code, true).await? {
        return Err(invalid_code());
    }

    replace_password(&state, &user, &request.new_password).await?;
    Ok(Json(MessageResponse::new(
        "Password has been reset successfully. You can now login with your new password.",
    )))
}

/// Resets the password with the token from an emailed link
pub async fn reset_password_with_token(
    State(state): State<AppState>,
    Json(request): Json<ResetWithTokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    validate_new_password(&request.new_password, &request.confirm_password)?;

    let tokens = state.tokens();
    let token = tokens
        .find_reset_token(&request.token)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired reset link".to_string()))?;
    if !token.is_valid(Utc::now()) || !tokens.consume_reset_token(&token.token).await? {
        return Err(ApiError::BadRequest("This reset link has expired or already been used".to_string()));
    }

    let user = state.users().get_by_id(token.user_id).await?;
    replace_password(&state, &user, &request.new_password).await?;
    Ok(Json(MessageResponse::new(
        "Password has been reset successfully. You can now login with your new password.",
    )))
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// Ends the current session
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, ApiError> {
    state.tokens().delete_auth_token(&current.session_token).await?;
    info!(user = %current.user.username, "logout");
    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        Json(MessageResponse::new("Logout successful")),
    )
        .into_response())
}

/// Ends every session of the caller
pub async fn logout_all(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, ApiError> {
    let revoked = state.tokens().delete_auth_tokens_for_user(current.user.id).await?;
    info!(user = %current.user.username, sessions_revoked = revoked, "logout from all sessions");
    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        Json(MessageResponse::new("Logged out from all sessions")),
    )
        .into_response())
}

pub async fn me(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&current.user))
}

pub async fn session(current: CurrentUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        message: "Session is valid".to_string(),
        expires_at: current.session_expires_at,
    })
}

/// Swaps the current session for a new one
pub async fn refresh_token(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, ApiError> {
    state.tokens().delete_auth_token(&current.session_token).await?;
    let (session, jwt) = start_session(&state, &current.user).await?;
    let cookie = session_cookie(&jwt, state.config.jwt_expiration_secs)?;
    let body = TokenResponse { token: jwt, token_type: "Bearer", expires_at: session.expires_at };
    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Changes the password; every session, this one included, is ended
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    let user = &current.user;
    if !verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }
    validate_new_password(&request.new_password, &request.confirm_password)?;
    if request.new_password == request.current_password {
        return Err(ApiError::BadRequest(
            "New password must be different from current password".to_string(),
        ));
    }

    replace_password(&state, user, &request.new_password).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

// ----------------------------------------------------------------------------
// Two-factor settings
// ----------------------------------------------------------------------------

pub async fn two_factor_status(current: CurrentUser) -> Json<TwoFactorStatusResponse> {
    let enabled = current.user.is_2fa_enabled;
    let message = if enabled { "2FA is enabled" } else { "2FA is disabled" };
    Json(TwoFactorStatusResponse::new(enabled, message))
}

/// Starts enabling two-factor login by emailing a code
pub async fn enable_two_factor(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    let user = &current.user;
    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::BadRequest("Invalid password".to_string()));
    }
    if user.is_2fa_enabled {
        return Err(ApiError::BadRequest("2FA is already enabled".to_string()));
    }

    issue_code(&state, user, CodePurpose::TwoFactor).await?;
    Ok(Json(MessageResponse::new(
        "Verification code sent to your email. Use /2fa/verify to complete setup.",
    )))
}

/// Completes enabling two-factor login with the emailed code
pub async fn verify_two_factor(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CodeRequest>,
) -> Result<Json<TwoFactorStatusResponse>, ApiError> {
    request.validate()?;
    let user = &current.user;
    if !check_code(&state, user, CodePurpose::TwoFactor, &request.code, true).await? {
        return Err(invalid_code());
    }

    state.users().set_two_factor(user.id, true).await?;
    info!(user = %user.username, "two-factor login enabled");
    send_quietly(&state, user, Notification::TwoFactorEnabled).await;
    Ok(Json(TwoFactorStatusResponse::new(true, "2FA has been enabled successfully")))
}

pub async fn disable_two_factor(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<TwoFactorStatusResponse>, ApiError> {
    request.validate()?;
    let user = &current.user;
    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::BadRequest("Invalid password".to_string()));
    }
    if !user.is_2fa_enabled {
        return Err(ApiError::BadRequest("2FA is not enabled".to_string()));
    }

    state.users().set_two_factor(user.id, false).await?;
    info!(user = %user.username, "two-factor login disabled");
    Ok(Json(TwoFactorStatusResponse::new(false, "2FA has been disabled")))
}

//! User management handlers (super admin only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::UserId;
use domain_identity::{hash_password, AdminSubRole, NewUser, Role, User};

use crate::{AppState, error::ApiError};
use crate::auth::CurrentUser;
use crate::dto::auth::UserResponse;
use crate::dto::users::*;
use crate::dto::{MessageResponse, PageQuery, PageResponse};
use crate::handlers::auth::ensure_vendor_profile;

fn parse_sub_role(value: Option<&str>) -> Result<Option<AdminSubRole>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => Ok(Some(v.to_ascii_uppercase().parse()?)),
    }
}

/// Lists users, newest first
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(filter): Query<UserListQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<UserResponse>>, ApiError> {
    current.require_super_admin()?;
    let role = filter
        .role
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(str::parse::<Role>)
        .transpose()?;

    let users = state.users().list(role, page.pagination()).await?;
    Ok(Json(PageResponse::from_page(users, UserResponse::from)))
}

/// Creates a user with any role
pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    current.require_super_admin()?;
    request.validate()?;

    let role: Role = request.role.parse()?;
    let sub_role = parse_sub_role(request.sub_role.as_deref())?;

    let users = state.users();
    if users.login_taken(&request.username, &request.email).await? {
        return Err(ApiError::BadRequest("Username or email already registered".to_string()));
    }

    let hash = hash_password(&request.password)?;
    let user = User::new(
        NewUser {
            username: request.username,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            role,
            sub_role,
        },
        hash,
    )?;
    users.insert(&user).await?;
    ensure_vendor_profile(&state, &user).await?;

    info!(by = %current.user.username, user = %user.username, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    current.require_super_admin()?;
    let user = state.users().get_by_id(UserId::from_uuid(id)).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Updates profile fields, role and access of a user
///
/// Deactivating a user ends all of their sessions.
pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    current.require_super_admin()?;
    request.validate()?;

    let users = state.users();
    let mut user = users.get_by_id(UserId::from_uuid(id)).await?;

    if let Some(email) = request.email {
        let email = email.trim().to_lowercase();
        if email != user.email {
            if users.find_by_email(&email).await?.is_some_and(|other| other.id != user.id) {
                return Err(ApiError::BadRequest("Email already in use".to_string()));
            }
            user.email = email;
        }
    }
    if let Some(first_name) = request.first_name {
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = request.last_name {
        user.last_name = last_name.trim().to_string();
    }
    if let Some(role) = request.role {
        user.role = role.parse()?;
    }
    if let Some(sub_role) = request.sub_role {
        user.sub_role = parse_sub_role(Some(&sub_role))?;
    }
    if user.role != Role::Admin && user.sub_role.is_some() {
        return Err(ApiError::BadRequest("Sub-role only applies to admins".to_string()));
    }
    if let Some(permissions) = request.permissions {
        user.permissions = permissions;
    }
    let deactivated = request.is_active == Some(false) && user.is_active;
    if let Some(is_active) = request.is_active {
        user.is_active = is_active;
    }

    users.update(&user).await?;
    if deactivated {
        state.tokens().delete_auth_tokens_for_user(user.id).await?;
    }
    ensure_vendor_profile(&state, &user).await?;

    info!(by = %current.user.username, user = %user.username, "user updated");
    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    current.require_super_admin()?;
    let id = UserId::from_uuid(id);
    if id == current.user.id {
        return Err(ApiError::BadRequest("Cannot delete yourself".to_string()));
    }

    let users = state.users();
    let user = users.get_by_id(id).await?;
    users.delete(id).await?;

    info!(by = %current.user.username, user = %user.username, "user deleted");
    Ok(Json(MessageResponse::new(format!("User {} deleted successfully", user.username))))
}

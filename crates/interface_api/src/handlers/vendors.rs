//! Vendor management handlers (super admin only)
//!
//! A vendor is a company profile plus the VENDOR login its investigators
//! use for the vendor portal; both are created, toggled and deleted together.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{GeoPoint, VendorId};
use domain_dispatch::{NewVendor, Vendor};
use domain_identity::{hash_password, NewUser, Role, User};

use crate::{AppState, error::ApiError};
use crate::auth::CurrentUser;
use crate::dto::vendors::*;
use crate::dto::{MessageResponse, PageQuery, PageResponse};

async fn linked_user(state: &AppState, vendor: &Vendor) -> Result<Option<User>, ApiError> {
    match vendor.user_id {
        Some(user_id) => Ok(state.users().find_by_id(user_id).await?),
        None => Ok(None),
    }
}

/// Sets the active flag on the vendor and its login
async fn set_active(state: &AppState, id: Uuid, active: bool) -> Result<VendorResponse, ApiError> {
    let mut vendor = state.vendors().get_by_id(VendorId::from_uuid(id)).await?;
    if active {
        vendor.activate();
    } else {
        vendor.deactivate();
    }
    state.vendors().update(&vendor).await?;

    let mut user = linked_user(state, &vendor).await?;
    if let Some(user) = user.as_mut() {
        user.is_active = active;
        state.users().update(user).await?;
        if !active {
            state.tokens().delete_auth_tokens_for_user(user.id).await?;
        }
    }

    info!(vendor = %vendor.company_name, active, "vendor status changed");
    Ok(VendorResponse::new(vendor, user.as_ref()))
}

pub async fn list_vendors(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(filter): Query<VendorListQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<VendorResponse>>, ApiError> {
    current.require_super_admin()?;
    let vendors = state.vendors().list(filter.is_active, page.pagination()).await?;

    let mut users = Vec::with_capacity(vendors.items.len());
    for vendor in &vendors.items {
        users.push(linked_user(&state, vendor).await?);
    }
    let mut users = users.into_iter();
    Ok(Json(PageResponse::from_page(vendors, |vendor| {
        let user = users.next().flatten();
        VendorResponse::new(vendor, user.as_ref())
    })))
}

/// Creates a vendor login and company profile
pub async fn create_vendor(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateVendorRequest>,
) -> Result<(StatusCode, Json<VendorResponse>), ApiError> {
    current.require_super_admin()?;
    request.validate()?;

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
            email: request.email.clone(),
            first_name: request.first_name,
            last_name: request.last_name,
            role: Role::Vendor,
            sub_role: None,
        },
        hash,
    )?;
    let vendor = Vendor::new(NewVendor {
        user_id: Some(user.id),
        company_name: request.company_name,
        contact_email: request.contact_email.or(Some(request.email)),
        contact_phone: request.contact_phone,
        address: request.address,
        city: request.city,
        state: request.state,
        postal_code: request.postal_code,
        country: request.country,
        latitude: request.latitude,
        longitude: request.longitude,
    })?;

    users.insert(&user).await?;
    state.vendors().insert(&vendor).await?;

    info!(by = %current.user.username, vendor = %vendor.company_name, user = %user.username, "vendor created");
    Ok((StatusCode::CREATED, Json(VendorResponse::new(vendor, Some(&user)))))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorResponse>, ApiError> {
    current.require_super_admin()?;
    let vendor = state.vendors().get_by_id(VendorId::from_uuid(id)).await?;
    let user = linked_user(&state, &vendor).await?;
    Ok(Json(VendorResponse::new(vendor, user.as_ref())))
}

/// Updates the company profile and, when given, the linked login's name and email
pub async fn update_vendor(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVendorRequest>,
) -> Result<Json<VendorResponse>, ApiError> {
    current.require_super_admin()?;
    request.validate()?;

    let mut vendor = state.vendors().get_by_id(VendorId::from_uuid(id)).await?;
    if let Some(company_name) = request.company_name {
        vendor.company_name = company_name.trim().to_string();
    }
    if request.contact_email.is_some() {
        vendor.contact_email = request.contact_email;
    }
    if request.contact_phone.is_some() {
        vendor.contact_phone = request.contact_phone;
    }
    if request.address.is_some() {
        vendor.address = request.address;
    }
    if request.city.is_some() {
        vendor.city = request.city;
    }
    if request.state.is_some() {
        vendor.state = request.state;
    }
    if request.postal_code.is_some() {
        vendor.postal_code = request.postal_code;
    }
    if let Some(country) = request.country {
        vendor.country = country;
    }
    if request.latitude.is_some() || request.longitude.is_some() {
        let latitude = request.latitude.or(vendor.location.map(|p| p.latitude));
        let longitude = request.longitude.or(vendor.location.map(|p| p.longitude));
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(ApiError::BadRequest("Latitude and longitude must be given together".to_string()));
        };
        vendor.location =
            Some(GeoPoint::new(latitude, longitude).map_err(|e| ApiError::BadRequest(e.to_string()))?);
    }
    vendor.updated_at = Utc::now();
    state.vendors().update(&vendor).await?;

    let mut user = linked_user(&state, &vendor).await?;
    if let Some(user) = user.as_mut() {
        let mut changed = false;
        if let Some(email) = request.email {
            let email = email.trim().to_lowercase();
            if email != user.email {
                if state.users().find_by_email(&email).await?.is_some_and(|other| other.id != user.id) {
                    return Err(ApiError::BadRequest("Email already in use".to_string()));
                }
                user.email = email;
                changed = true;
            }
        }
        if let Some(first_name) = request.first_name {
            user.first_name = first_name.trim().to_string();
            changed = true;
        }
        if let Some(last_name) = request.last_name {
            user.last_name = last_name.trim().to_string();
            changed = true;
        }
        if changed {
            state.users().update(user).await?;
        }
    }

    info!(by = %current.user.username, vendor = %vendor.company_name, "vendor updated");
    Ok(Json(VendorResponse::new(vendor, user.as_ref())))
}

/// Deletes the vendor and its login
pub async fn delete_vendor(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    current.require_super_admin()?;
    let vendor = state.vendors().get_by_id(VendorId::from_uuid(id)).await?;

    state.vendors().delete(vendor.id).await?;
    if let Some(user_id) = vendor.user_id {
        state.users().delete(user_id).await?;
    }

    info!(by = %current.user.username, vendor = %vendor.company_name, "vendor deleted");
    Ok(Json(MessageResponse::new(format!(
        "Vendor '{}' deleted successfully",
        vendor.company_name
    ))))
}

pub async fn activate_vendor(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorResponse>, ApiError> {
    current.require_super_admin()?;
    Ok(Json(set_active(&state, id, true).await?))
}

pub async fn deactivate_vendor(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorResponse>, ApiError> {
    current.require_super_admin()?;
    Ok(Json(set_active(&state, id, false).await?))
}

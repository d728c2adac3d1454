//! Vendor DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_dispatch::Vendor;
use domain_identity::User;

/// Creates the vendor's login together with its company profile
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVendorRequest {
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub company_name: String,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    #[validate(length(max = 20))]
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVendorRequest {
    #[validate(length(min = 1, max = 255))]
    pub company_name: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    #[validate(length(max = 20))]
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    // Linked login
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VendorListQuery {
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct VendorUserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct VendorResponse {
    pub id: Uuid,
    pub company_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Option<VendorUserResponse>,
}

impl VendorResponse {
    pub fn new(vendor: Vendor, user: Option<&User>) -> Self {
        Self {
            id: *vendor.id.as_uuid(),
            latitude: vendor.location.map(|p| p.latitude),
            longitude: vendor.location.map(|p| p.longitude),
            company_name: vendor.company_name,
            contact_email: vendor.contact_email,
            contact_phone: vendor.contact_phone,
            address: vendor.address,
            city: vendor.city,
            state: vendor.state,
            postal_code: vendor.postal_code,
            country: vendor.country,
            is_active: vendor.is_active,
            created_at: vendor.created_at,
            updated_at: vendor.updated_at,
            user: user.map(|u| VendorUserResponse {
                id: *u.id.as_uuid(),
                username: u.username.clone(),
                email: u.email.clone(),
                first_name: u.first_name.clone(),
                last_name: u.last_name.clone(),
                is_active: u.is_active,
                date_joined: u.created_at,
                last_login: u.last_login,
            }),
        }
    }
}

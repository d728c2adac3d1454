//! Field vendors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{GeoPoint, UserId, VendorId};
use crate::error::DispatchError;

pub const DEFAULT_COUNTRY: &str = "USA";

/// An investigation firm that takes field work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    /// Login account for the vendor portal
    pub user_id: Option<UserId>,
    pub company_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub location: Option<GeoPoint>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewVendor {
    pub user_id: Option<UserId>,
    pub company_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Vendor {
    pub fn new(input: NewVendor) -> Result<Self, DispatchError> {
        let company_name = input.company_name.trim().to_string();
        if company_name.is_empty() {
            return Err(DispatchError::InvalidData("company name is required".to_string()));
        }
        let location = match (input.latitude, input.longitude) {
            (None, None) => None,
            (Some(lat), Some(lon)) => Some(
                GeoPoint::new(lat, lon).map_err(|e| DispatchError::InvalidData(e.to_string()))?,
            ),
            _ => {
                return Err(DispatchError::InvalidData(
                    "latitude and longitude must be given together".to_string(),
                ))
            }
        };

        let now = Utc::now();
        Ok(Self {
            id: VendorId::new_v7(),
            user_id: input.user_id,
            company_name,
            contact_email: input.contact_email,
            contact_phone: input.contact_phone,
            address: input.address,
            city: input.city,
            state: input.state,
            postal_code: input.postal_code,
            country: input.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            location,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Active and geolocated
    pub fn is_dispatchable(&self) -> bool {
        self.is_active && self.location.is_some()
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

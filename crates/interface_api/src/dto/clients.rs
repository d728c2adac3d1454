//! Client DTOs

use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use domain_cases::InvestigationRates;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 20, message = "Client code must be 1-20 characters"))]
    pub client_code: String,
    #[validate(length(min = 1, max = 255, message = "Client name is required"))]
    pub client_name: String,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub date_of_commencement: Option<NaiveDate>,
    #[serde(default)]
    pub rates: InvestigationRates,
}

/// Partial update; `rates` replaces the whole rate card when present
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 255))]
    pub client_name: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub date_of_commencement: Option<NaiveDate>,
    pub rates: Option<InvestigationRates>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientListQuery {
    #[serde(default)]
    pub active_only: bool,
}

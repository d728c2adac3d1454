//! Case handlers
//!
//! Admins open, move and assign cases; lawyers get read access. The
//! checklist can also be ticked by the vendor working the case.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CaseId, ClientId, GeoPoint, VendorId};
use domain_cases::{
    CaseCategory, CaseStatus, CaseType, IncidentLocation, InsuranceCase, InvestigationChecklist, NewCase, Priority,
};
use domain_dispatch::auto_assign;
use infra_db::repositories::CaseFilter;

use crate::{AppState, error::ApiError};
use crate::auth::CurrentUser;
use crate::dto::cases::*;
use crate::dto::{PageQuery, PageResponse};

fn require_case_reader(current: &CurrentUser) -> Result<(), ApiError> {
    if current.user.is_admin_or_lawyer() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin or lawyer access required"))
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<&str>, default: T) -> Result<T, T::Err> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse(),
        None => Ok(default),
    }
}

/// Resolves the client by id, else by name, else keeps the given name unlinked
async fn resolve_client(
    state: &AppState,
    request: &CreateCaseRequest,
) -> Result<(Option<ClientId>, String), ApiError> {
    if let Some(client_id) = request.client_id {
        let client = state.clients().get_by_id(client_id).await?;
        return Ok((Some(client.id), client.client_name));
    }

    let name = request
        .client_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Client is required".to_string()))?;
    match state.clients().find_by_name(name).await? {
        Some(client) => Ok((Some(client.id), client.client_name)),
        None => Ok((None, name.to_string())),
    }
}

pub async fn list_cases(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(filter): Query<CaseFilter>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<CaseSummary>>, ApiError> {
    require_case_reader(&current)?;
    let cases = state.cases().list(&filter, page.pagination()).await?;
    Ok(Json(PageResponse::from_page(cases, CaseSummary::from)))
}

/// Opens a case by hand
pub async fn create_case(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), ApiError> {
    current.require_admin()?;
    request.validate()?;

    let claim_number = request.claim_number.trim();
    if state.cases().find_by_claim_number(claim_number).await?.is_some() {
        return Err(ApiError::Conflict(format!("Case with claim number {} already exists", claim_number)));
    }

    let (client_id, client_name) = resolve_client(&state, &request).await?;
    let point = match (request.latitude, request.longitude) {
        (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon).map_err(|e| ApiError::BadRequest(e.to_string()))?),
        (None, None) => None,
        _ => return Err(ApiError::BadRequest("Latitude and longitude must be given together".to_string())),
    };

    let receipt_date = request.receipt_date.unwrap_or_else(|| Utc::now().date_naive());
    let mut new = NewCase::new(claim_number, client_name, receipt_date);
    if !request.title.trim().is_empty() {
        new.title = request.title.trim().to_string();
    }
    new.description = request.description.clone();
    new.client_id = client_id;
    new.category = parse_or(request.category.as_deref(), CaseCategory::Other)?;
    new.case_type = request.case_type.as_deref().map(str::parse::<CaseType>).transpose()?;
    new.priority = parse_or(request.priority.as_deref(), Priority::default())?;
    new.claimant_name = request.claimant_name.clone();
    new.insured_name = request.insured_name.clone();
    new.location = IncidentLocation {
        address: request.incident_address.clone(),
        city: request.incident_city.clone(),
        state: request.incident_state.clone(),
        postal_code: request.incident_postal_code.clone(),
        country: request.incident_country.clone().unwrap_or_else(|| IncidentLocation::default().country),
        point,
    };
    new.due_days = state.config.case_due_days;
    new.created_by = Some(current.user.id);

    let case = InsuranceCase::new_manual(new)?;
    state.cases().insert(&case).await?;

    info!(by = %current.user.username, case_number = %case.case_number, claim_number = %case.claim_number, "case created");
    Ok((StatusCode::CREATED, Json(CaseResponse::from(case))))
}

pub async fn get_case(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseResponse>, ApiError> {
    require_case_reader(&current)?;
    let case = state.cases().get_by_id(CaseId::from_uuid(id)).await?;
    Ok(Json(CaseResponse::from(case)))
}

/// Moves a case along the status workflow
pub async fn update_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<CaseResponse>, ApiError> {
    current.require_admin()?;
    request.validate()?;

    let target: CaseStatus = request.status.parse()?;
    let mut case = state.cases().get_by_id(CaseId::from_uuid(id)).await?;
    let previous = case.status;
    case.update_status(target)?;
    if let Some(note) = request.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        case.append_note(note);
    }
    state.cases().update(&case).await?;

    info!(by = %current.user.username, case_number = %case.case_number, from = %previous, to = %target, "case status changed");
    Ok(Json(CaseResponse::from(case)))
}

/// Assigns a chosen vendor to the case
pub async fn assign_vendor(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignVendorRequest>,
) -> Result<Json<CaseResponse>, ApiError> {
    current.require_admin()?;

    let vendor = state.vendors().get_by_id(request.vendor_id).await?;
    if !vendor.is_active {
        return Err(ApiError::BadRequest(format!("Vendor {} is not active", vendor.company_name)));
    }

    let mut case = state.cases().get_by_id(CaseId::from_uuid(id)).await?;
    if request.reassign {
        case.reassign_vendor(vendor.id);
    } else {
        case.assign_vendor(vendor.id)?;
    }
    state.cases().update(&case).await?;

    info!(by = %current.user.username, case_number = %case.case_number, vendor = %vendor.company_name, "vendor assigned");
    Ok(Json(CaseResponse::from(case)))
}

/// Assigns the nearest active vendor by distance to the incident
pub async fn auto_assign_vendor(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AutoAssignResponse>, ApiError> {
    current.require_admin()?;

    let mut case = state.cases().get_by_id(CaseId::from_uuid(id)).await?;
    let vendors = state.vendors().list_dispatchable().await?;
    let matched = auto_assign(&mut case, &vendors)?;
    state.cases().update(&case).await?;

    Ok(Json(AutoAssignResponse::new(&case.case_number, matched)))
}

/// Replaces the investigation checklist
///
/// Open to admins and to the vendor the case is assigned to.
pub async fn update_checklist(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(checklist): Json<InvestigationChecklist>,
) -> Result<Json<CaseResponse>, ApiError> {
    let mut case = state.cases().get_by_id(CaseId::from_uuid(id)).await?;
    if !current.user.is_admin() {
        current.require_vendor()?;
        let vendor_id: Option<VendorId> = state.vendors().find_by_user(current.user.id).await?.map(|v| v.id);
        if vendor_id.is_none() || case.assigned_vendor_id != vendor_id {
            return Err(ApiError::forbidden("Case is not assigned to you"));
        }
    }

    case.checklist = checklist;
    case.updated_at = Utc::now();
    state.cases().update(&case).await?;

    info!(by = %current.user.username, case_number = %case.case_number, progress = case.investigation_progress(), "checklist updated");
    Ok(Json(CaseResponse::from(case)))
}

pub async fn list_documents(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    require_case_reader(&current)?;
    let case_id = CaseId::from_uuid(id);
    state.cases().get_by_id(case_id).await?;
    let documents = state.cases().list_documents(case_id).await?;
    Ok(Json(documents.into_iter().map(DocumentResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_defaults_blank_values() {
        assert_eq!(parse_or(None, Priority::Medium).unwrap(), Priority::Medium);
        assert_eq!(parse_or(Some("  "), CaseCategory::Other).unwrap(), CaseCategory::Other);
        assert_eq!(parse_or(Some("mact"), CaseCategory::Other).unwrap(), CaseCategory::Mact);
        assert!(parse_or(Some("sideways"), Priority::Medium).is_err());
    }
}

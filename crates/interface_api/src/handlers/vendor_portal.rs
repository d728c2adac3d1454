//! Vendor portal handlers
//!
//! A vendor sees only the cases assigned to it. Evidence photos must carry
//! EXIF GPS tags placing them within the geofence around the incident.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use core_kernel::CaseId;
use domain_cases::InsuranceCase;
use domain_dispatch::{validate_evidence, Evidence, EvidenceVerdict, Vendor};
use infra_db::repositories::CaseFilter;

use crate::{AppState, error::ApiError};
use crate::auth::CurrentUser;
use crate::dto::cases::{CaseResponse, CaseSummary, EvidenceUploadResponse};
use crate::dto::{PageQuery, PageResponse};

/// Largest accepted request body on the vendor portal
pub const MAX_EVIDENCE_BYTES: usize = 20 * 1024 * 1024;

/// Multipart field names accepted for the photo
const PHOTO_FIELDS: [&str; 3] = ["photo", "file", "image"];

async fn current_vendor(state: &AppState, current: &CurrentUser) -> Result<Vendor, ApiError> {
    current.require_vendor()?;
    let vendor = state
        .vendors()
        .find_by_user(current.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vendor profile not found".to_string()))?;
    if !vendor.is_active {
        return Err(ApiError::forbidden("Vendor account is inactive"));
    }
    Ok(vendor)
}

/// Loads a case, hiding cases assigned to someone else
async fn assigned_case(state: &AppState, vendor: &Vendor, id: Uuid) -> Result<InsuranceCase, ApiError> {
    let case = state.cases().get_by_id(CaseId::from_uuid(id)).await?;
    if case.assigned_vendor_id != Some(vendor.id) {
        return Err(ApiError::NotFound("Case not found".to_string()));
    }
    Ok(case)
}

pub async fn list_cases(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(filter): Query<CaseFilter>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<CaseSummary>>, ApiError> {
    let vendor = current_vendor(&state, &current).await?;
    let filter = CaseFilter { assigned_vendor_id: Some(vendor.id), ..filter };
    let cases = state.cases().list(&filter, page.pagination()).await?;
    Ok(Json(PageResponse::from_page(cases, CaseSummary::from)))
}

pub async fn get_case(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseResponse>, ApiError> {
    let vendor = current_vendor(&state, &current).await?;
    let case = assigned_case(&state, &vendor, id).await?;
    Ok(Json(CaseResponse::from(case)))
}

pub async fn list_evidence(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Evidence>>, ApiError> {
    let vendor = current_vendor(&state, &current).await?;
    let case = assigned_case(&state, &vendor, id).await?;
    Ok(Json(state.evidence().list_for_case(case.id).await?))
}

/// Uploads a geotagged photo for an assigned case
///
/// The photo is stored only when its GPS position lies within the
/// configured radius of the incident location.
pub async fn upload_evidence(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<EvidenceUploadResponse>), ApiError> {
    let vendor = current_vendor(&state, &current).await?;
    let case = assigned_case(&state, &vendor, id).await?;

    let mut photo = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        if !field.name().is_some_and(|name| PHOTO_FIELDS.contains(&name)) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("photo.jpg").to_string();
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
        photo = Some((file_name, content_type, data));
        break;
    }

    let (file_name, content_type, data) =
        photo.ok_or_else(|| ApiError::BadRequest("A photo file is required".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("The photo file is empty".to_string()));
    }
    if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
        return Err(ApiError::BadRequest(format!("Unsupported file type: {}", content_type)));
    }

    let (point, distance_km) = match validate_evidence(&data, case.point(), state.config.geofence_radius_km) {
        EvidenceVerdict::Accepted { point, distance_km } => (point, distance_km),
        EvidenceVerdict::Rejected(reason) => {
            warn!(case_number = %case.case_number, vendor = %vendor.company_name, %reason, "evidence rejected");
            return Err(ApiError::BadRequest(reason.to_string()));
        }
    };

    let evidence_id = Uuid::now_v7();
    let file_path = state
        .files
        .save(&format!("evidence/{}", case.id.as_uuid()), &evidence_id.simple().to_string(), &file_name, &data)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to store evidence: {}", e)))?;

    let evidence = Evidence::accepted(
        case.id,
        vendor.id,
        &file_name,
        &content_type,
        file_path,
        data.len() as i64,
        point,
        distance_km,
    );
    state.evidence().insert(&evidence).await?;

    info!(
        case_number = %case.case_number,
        vendor = %vendor.company_name,
        distance_km,
        "evidence accepted"
    );
    Ok((
        StatusCode::CREATED,
        Json(EvidenceUploadResponse {
            message: format!("Photo accepted, taken {:.2} km from the incident", distance_km),
            evidence,
        }),
    ))
}

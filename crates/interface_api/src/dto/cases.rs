//! Case DTOs

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClientId, VendorId};
use domain_cases::{CaseDocument, InsuranceCase};
use domain_dispatch::{Evidence, VendorMatch};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCaseRequest {
    #[validate(length(min = 1, max = 100, message = "Claim number is required"))]
    pub claim_number: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Client by id; falls back to `client_name`
    pub client_id: Option<ClientId>,
    pub client_name: Option<String>,
    pub category: Option<String>,
    pub case_type: Option<String>,
    pub priority: Option<String>,
    pub claimant_name: Option<String>,
    pub insured_name: Option<String>,
    #[serde(default)]
    pub incident_address: String,
    #[serde(default)]
    pub incident_city: String,
    #[serde(default)]
    pub incident_state: String,
    #[serde(default)]
    pub incident_postal_code: String,
    pub incident_country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    /// Defaults to today
    pub receipt_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: String,
    /// Appended to the case notes
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignVendorRequest {
    pub vendor_id: VendorId,
    /// Replace a vendor already on the case
    #[serde(default)]
    pub reassign: bool,
}

/// A case with the figures the case screens show next to it
#[derive(Debug, Serialize)]
pub struct CaseResponse {
    #[serde(flatten)]
    pub case: InsuranceCase,
    pub formatted_address: String,
    pub investigation_progress: u8,
    pub is_overdue: bool,
}

impl From<InsuranceCase> for CaseResponse {
    fn from(case: InsuranceCase) -> Self {
        let today = Utc::now().date_naive();
        Self {
            formatted_address: case.location.formatted(),
            investigation_progress: case.investigation_progress(),
            is_overdue: case.is_overdue(today),
            case,
        }
    }
}

/// Condensed row for case lists
#[derive(Debug, Serialize)]
pub struct CaseSummary {
    pub id: Uuid,
    pub case_number: String,
    pub claim_number: String,
    pub title: String,
    pub client_name: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub source: String,
    pub receipt_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub assigned_vendor_id: Option<VendorId>,
    pub investigation_progress: u8,
    pub is_overdue: bool,
}

impl From<InsuranceCase> for CaseSummary {
    fn from(case: InsuranceCase) -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: *case.id.as_uuid(),
            investigation_progress: case.investigation_progress(),
            is_overdue: case.is_overdue(today),
            category: case.category.as_str().to_string(),
            priority: case.priority.as_str().to_string(),
            status: case.status.to_string(),
            source: case.source.as_str().to_string(),
            case_number: case.case_number,
            claim_number: case.claim_number,
            title: case.title,
            client_name: case.client_name,
            receipt_date: case.receipt_date,
            due_date: case.due_date,
            assigned_vendor_id: case.assigned_vendor_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssignedVendor {
    pub id: VendorId,
    pub company_name: String,
    pub distance_km: f64,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AutoAssignResponse {
    pub success: bool,
    pub message: String,
    pub assigned_vendor: AssignedVendor,
}

impl AutoAssignResponse {
    pub fn new(case_number: &str, matched: VendorMatch) -> Self {
        Self {
            success: true,
            message: format!("Case #{} assigned to {}", case_number, matched.company_name),
            assigned_vendor: AssignedVendor {
                id: matched.vendor_id,
                company_name: matched.company_name,
                distance_km: matched.distance_km,
                city: matched.city,
                state: matched.state,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub document_type: String,
    pub document_label: String,
    pub document_name: String,
    pub file_path: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<CaseDocument> for DocumentResponse {
    fn from(doc: CaseDocument) -> Self {
        Self {
            id: *doc.id.as_uuid(),
            document_type: doc.document_type.as_str().to_string(),
            document_label: doc.document_type.label().to_string(),
            document_name: doc.document_name,
            file_path: doc.file_path,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EvidenceUploadResponse {
    pub message: String,
    pub evidence: Evidence,
}

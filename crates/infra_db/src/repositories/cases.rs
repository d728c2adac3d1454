//! Case repository implementation
//!
//! This module provides database access for investigation cases and their
//! documents, plus the aggregate queries behind the admin dashboard.
//!
//! Nested sections of the aggregate (claimant, insured, police, checklist,
//! location, ...) are stored as JSONB columns; everything the desk filters
//! or sorts on is a plain column.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{AttachmentId, CaseId, ClientId, DocumentId, EmailIntakeId, UserId, VendorId};
use domain_cases::{
    case_volume_window, CaseCategory, CaseDocument, CaseStats, CaseStatus, CaseVolume,
    DispatchDetails, DocumentChecks, IncidentLocation, InsuranceCase, InvestigationChecklist,
    PartyDetails, PoliceDetails, RecentActivity, SpotDetails, StatusCount,
};

use crate::error::DatabaseError;
use crate::repositories::clients::escape_like;
use crate::repositories::{parse_column, Page, Pagination};

const CASE_COLUMNS: &str = r#"
    id, case_number, claim_number, title, description, client_id, client_name,
    category, case_type, priority, source, status, report_status,
    crn, policy_number, file_number, vehicle_registration, accident_date,
    receipt_date, receipt_month, due_date, completion_date, completion_month,
    tat_days, sla_status, scope_of_work, notes,
    claimant, income, insured, notice_132, driver, hospital,
    document_checks, spot, police, dispatch, location, checklist,
    assigned_vendor_id, source_email_id, created_by, created_at, updated_at, closed_at
"#;

/// Predicate shared by the list and count queries; binds $1..$5
const CASE_FILTER: &str = r#"
    ($1::TEXT IS NULL OR status = $1)
    AND ($2::UUID IS NULL OR client_id = $2)
    AND ($3::UUID IS NULL OR assigned_vendor_id = $3)
    AND ($4::TEXT IS NULL OR category = $4)
    AND ($5::TEXT IS NULL
         OR claim_number ILIKE '%' || $5 || '%'
         OR case_number ILIKE '%' || $5 || '%'
         OR title ILIKE '%' || $5 || '%'
         OR client_name ILIKE '%' || $5 || '%')
"#;

/// Criteria for listing cases; unset fields do not filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub client_id: Option<ClientId>,
    pub assigned_vendor_id: Option<VendorId>,
    pub category: Option<CaseCategory>,
    /// Substring of claim number, case number, title or client name
    pub search: Option<String>,
}

impl CaseFilter {
    /// Cases assigned to one vendor
    pub fn for_vendor(vendor_id: VendorId) -> Self {
        Self { assigned_vendor_id: Some(vendor_id), ..Default::default() }
    }

    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(escape_like)
    }
}

/// Repository for investigation cases
///
/// The CaseRepository handles all database operations for the case
/// lifecycle, from receipt through dispatch and closure.
#[derive(Debug, Clone)]
pub struct CaseRepository {
    pool: PgPool,
}

impl CaseRepository {
    /// Creates a new CaseRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a case by its identifier
    ///
    /// # Returns
    ///
    /// The case or NotFound error
    pub async fn get_by_id(&self, id: CaseId) -> Result<InsuranceCase, DatabaseError> {
        let sql = format!("SELECT {} FROM cases WHERE id = $1", CASE_COLUMNS);
        let row = sqlx::query_as::<_, CaseRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Case", id))?;

        row.into_domain()
    }

    /// Finds the case for an insurer claim number
    pub async fn find_by_claim_number(&self, claim_number: &str) -> Result<Option<InsuranceCase>, DatabaseError> {
        let sql = format!("SELECT {} FROM cases WHERE claim_number = $1", CASE_COLUMNS);
        let row = sqlx::query_as::<_, CaseRow>(&sql)
            .bind(claim_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(CaseRow::into_domain).transpose()
    }

    /// Lists cases matching a filter, most recently created first
    ///
    /// # Arguments
    ///
    /// * `filter` - Status, client, vendor, category and search criteria
    /// * `pagination` - Page to return
    pub async fn list(&self, filter: &CaseFilter, pagination: Pagination) -> Result<Page<InsuranceCase>, DatabaseError> {
        let search = filter.search_pattern();

        let sql = format!(
            "SELECT {} FROM cases WHERE {} ORDER BY created_at DESC LIMIT $6 OFFSET $7",
            CASE_COLUMNS, CASE_FILTER
        );
        let rows = sqlx::query_as::<_, CaseRow>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.client_id.map(Uuid::from))
            .bind(filter.assigned_vendor_id.map(Uuid::from))
            .bind(filter.category.map(|c| c.as_str()))
            .bind(search.as_deref())
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM cases WHERE {}", CASE_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.client_id.map(Uuid::from))
            .bind(filter.assigned_vendor_id.map(Uuid::from))
            .bind(filter.category.map(|c| c.as_str()))
            .bind(search.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let cases = rows
            .into_iter()
            .map(CaseRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(cases, total, pagination))
    }

    /// Inserts a new case
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateEntry` when the claim number is already on file
    pub async fn insert(&self, case: &InsuranceCase) -> Result<(), DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO cases ({})
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                $31, $32, $33, $34, $35, $36, $37, $38, $39, $40, $41, $42, $43, $44, $45
            )
            "#,
            CASE_COLUMNS
        );

        sqlx::query(&sql)
            .bind(case.id.as_uuid())
            .bind(&case.case_number)
            .bind(&case.claim_number)
            .bind(&case.title)
            .bind(&case.description)
            .bind(case.client_id.map(Uuid::from))
            .bind(&case.client_name)
            .bind(case.category.as_str())
            .bind(case.case_type.map(|t| t.as_str()))
            .bind(case.priority.as_str())
            .bind(case.source.as_str())
            .bind(case.status.as_str())
            .bind(case.report_status.as_str())
            .bind(&case.crn)
            .bind(&case.policy_number)
            .bind(&case.file_number)
            .bind(&case.vehicle_registration)
            .bind(case.accident_date)
            .bind(case.receipt_date)
            .bind(&case.receipt_month)
            .bind(case.due_date)
            .bind(case.completion_date)
            .bind(&case.completion_month)
            .bind(case.tat_days)
            .bind(&case.sla_status)
            .bind(&case.scope_of_work)
            .bind(&case.notes)
            .bind(Json(&case.claimant))
            .bind(Json(&case.income))
            .bind(Json(&case.insured))
            .bind(&case.notice_132)
            .bind(Json(&case.driver))
            .bind(Json(&case.hospital))
            .bind(Json(&case.documents))
            .bind(Json(&case.spot))
            .bind(Json(&case.police))
            .bind(Json(&case.dispatch))
            .bind(Json(&case.location))
            .bind(Json(&case.checklist))
            .bind(case.assigned_vendor_id.map(Uuid::from))
            .bind(case.source_email_id.map(Uuid::from))
            .bind(case.created_by.map(Uuid::from))
            .bind(case.created_at)
            .bind(case.updated_at)
            .bind(case.closed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DatabaseError::classify(e) {
                DatabaseError::DuplicateEntry(_) => {
                    DatabaseError::duplicate("Case", "claim number", &case.claim_number)
                }
                other => other,
            })?;

        Ok(())
    }

    /// Saves every mutable field of a case
    ///
    /// Identity, case number, source and creation data never change.
    pub async fn update(&self, case: &InsuranceCase) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE cases SET
                claim_number = $2, title = $3, description = $4, client_id = $5, client_name = $6,
                category = $7, case_type = $8, priority = $9, status = $10, report_status = $11,
                crn = $12, policy_number = $13, file_number = $14, vehicle_registration = $15,
                accident_date = $16, receipt_date = $17, receipt_month = $18, due_date = $19,
                completion_date = $20, completion_month = $21, tat_days = $22, sla_status = $23,
                scope_of_work = $24, notes = $25, claimant = $26, income = $27, insured = $28,
                notice_132 = $29, driver = $30, hospital = $31, document_checks = $32, spot = $33,
                police = $34, dispatch = $35, location = $36, checklist = $37,
                assigned_vendor_id = $38, updated_at = $39, closed_at = $40
            WHERE id = $1
            "#,
        )
        .bind(case.id.as_uuid())
        .bind(&case.claim_number)
        .bind(&case.title)
        .bind(&case.description)
        .bind(case.client_id.map(Uuid::from))
        .bind(&case.client_name)
        .bind(case.category.as_str())
        .bind(case.case_type.map(|t| t.as_str()))
        .bind(case.priority.as_str())
        .bind(case.status.as_str())
        .bind(case.report_status.as_str())
        .bind(&case.crn)
        .bind(&case.policy_number)
        .bind(&case.file_number)
        .bind(&case.vehicle_registration)
        .bind(case.accident_date)
        .bind(case.receipt_date)
        .bind(&case.receipt_month)
        .bind(case.due_date)
        .bind(case.completion_date)
        .bind(&case.completion_month)
        .bind(case.tat_days)
        .bind(&case.sla_status)
        .bind(&case.scope_of_work)
        .bind(&case.notes)
        .bind(Json(&case.claimant))
        .bind(Json(&case.income))
        .bind(Json(&case.insured))
        .bind(&case.notice_132)
        .bind(Json(&case.driver))
        .bind(Json(&case.hospital))
        .bind(Json(&case.documents))
        .bind(Json(&case.spot))
        .bind(Json(&case.police))
        .bind(Json(&case.dispatch))
        .bind(Json(&case.location))
        .bind(Json(&case.checklist))
        .bind(case.assigned_vendor_id.map(Uuid::from))
        .bind(case.updated_at)
        .bind(case.closed_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Case", case.id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------------

    /// Links documents to their cases in one transaction
    pub async fn add_documents(&self, documents: &[CaseDocument]) -> Result<(), DatabaseError> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for document in documents {
            sqlx::query(
                r#"
                INSERT INTO case_documents (
                    id, case_id, attachment_id, document_type, document_name, file_path,
                    extracted_text, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(document.id.as_uuid())
            .bind(document.case_id.as_uuid())
            .bind(document.attachment_id.map(Uuid::from))
            .bind(document.document_type.as_str())
            .bind(&document.document_name)
            .bind(&document.file_path)
            .bind(&document.extracted_text)
            .bind(document.created_at)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::classify)?;
        }
        tx.commit().await?;

        Ok(())
    }

    pub async fn list_documents(&self, case_id: CaseId) -> Result<Vec<CaseDocument>, DatabaseError> {
        let rows = sqlx::query_as::<_, CaseDocumentRow>(
            r#"
            SELECT id, case_id, attachment_id, document_type, document_name, file_path,
                   extracted_text, created_at
            FROM case_documents
            WHERE case_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(case_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CaseDocumentRow::into_domain).collect()
    }

    // ------------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------------

    /// Number of cases per status
    pub async fn status_counts(&self) -> Result<Vec<(CaseStatus, i64)>, DatabaseError> {
        let rows: Vec<(String, i64)> = sqlx::query_as("SELECT status, COUNT(*) FROM cases GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|(status, count)| Ok((parse_column("cases", &status)?, count)))
            .collect()
    }

    /// Unfinished cases whose due date has passed
    pub async fn overdue_count(&self, today: NaiveDate) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM cases
            WHERE due_date < $1 AND status NOT IN ('Completed', 'Dispatch', 'Closed')
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Headline counters for the dashboard
    pub async fn stats(&self, today: NaiveDate) -> Result<CaseStats, DatabaseError> {
        let counts = self.status_counts().await?;
        let overdue = self.overdue_count(today).await?;
        Ok(CaseStats::from_status_counts(&counts, overdue))
    }

    /// Cases created per month over the last six months, zero-filled
    pub async fn monthly_volume(&self, today: NaiveDate) -> Result<Vec<CaseVolume>, DatabaseError> {
        let window_start = volume_window_start(today);
        let rows: Vec<(NaiveDate, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                date_trunc('month', created_at)::DATE AS month,
                COUNT(*),
                COUNT(*) FILTER (WHERE status IN ('Completed', 'Dispatch', 'Closed'))
            FROM cases
            WHERE created_at >= $1
            GROUP BY 1
            "#,
        )
        .bind(window_start)
        .fetch_all(&self.pool)
        .await?;

        Ok(case_volume_window(&rows, today))
    }

    /// Status slices for the distribution chart
    pub async fn status_distribution(&self) -> Result<Vec<StatusCount>, DatabaseError> {
        let counts = self.status_counts().await?;
        Ok(StatusCount::distribution(&counts))
    }

    /// Most recently touched cases as activity entries
    pub async fn recent_activity(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<RecentActivity>, DatabaseError> {
        let rows: Vec<(String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT case_number, title, updated_at FROM cases ORDER BY updated_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(case_number, title, updated_at)| RecentActivity::for_case(&case_number, &title, updated_at, now))
            .collect())
    }
}

/// First day of the month five months before `today`
fn volume_window_start(today: NaiveDate) -> DateTime<Utc> {
    let first = today.with_day(1).unwrap_or(today);
    let start = first.checked_sub_months(Months::new(5)).unwrap_or(first);
    start.and_time(chrono::NaiveTime::MIN).and_utc()
}

// ============================================================================
// Type definitions
// ============================================================================

/// Case database row
#[derive(Debug, Clone, FromRow)]
pub struct CaseRow {
    pub id: Uuid,
    pub case_number: String,
    pub claim_number: String,
    pub title: String,
    pub description: String,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub category: String,
    pub case_type: Option<String>,
    pub priority: String,
    pub source: String,
    pub status: String,
    pub report_status: String,
    pub crn: Option<String>,
    pub policy_number: Option<String>,
    pub file_number: Option<String>,
    pub vehicle_registration: Option<String>,
    pub accident_date: Option<NaiveDate>,
    pub receipt_date: NaiveDate,
    pub receipt_month: String,
    pub due_date: Option<NaiveDate>,
    pub completion_date: Option<DateTime<Utc>>,
    pub completion_month: Option<String>,
    pub tat_days: Option<i64>,
    pub sla_status: Option<String>,
    pub scope_of_work: Option<String>,
    pub notes: String,
    pub claimant: Json<PartyDetails>,
    pub income: Json<PartyDetails>,
    pub insured: Json<PartyDetails>,
    pub notice_132: Option<String>,
    pub driver: Json<PartyDetails>,
    pub hospital: Json<PartyDetails>,
    pub document_checks: Json<DocumentChecks>,
    pub spot: Json<SpotDetails>,
    pub police: Json<PoliceDetails>,
    pub dispatch: Json<DispatchDetails>,
    pub location: Json<IncidentLocation>,
    pub checklist: Json<InvestigationChecklist>,
    pub assigned_vendor_id: Option<Uuid>,
    pub source_email_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl CaseRow {
    pub fn into_domain(self) -> Result<InsuranceCase, DatabaseError> {
        Ok(InsuranceCase {
            id: CaseId::from_uuid(self.id),
            case_number: self.case_number,
            claim_number: self.claim_number,
            title: self.title,
            description: self.description,
            client_id: self.client_id.map(ClientId::from_uuid),
            client_name: self.client_name,
            category: parse_column("cases", &self.category)?,
            case_type: self.case_type.as_deref().map(|t| parse_column("cases", t)).transpose()?,
            priority: parse_column("cases", &self.priority)?,
            source: parse_column("cases", &self.source)?,
            status: parse_column("cases", &self.status)?,
            report_status: parse_column("cases", &self.report_status)?,
            crn: self.crn,
            policy_number: self.policy_number,
            file_number: self.file_number,
            vehicle_registration: self.vehicle_registration,
            accident_date: self.accident_date,
            receipt_date: self.receipt_date,
            receipt_month: self.receipt_month,
            due_date: self.due_date,
            completion_date: self.completion_date,
            completion_month: self.completion_month,
            tat_days: self.tat_days,
            sla_status: self.sla_status,
            scope_of_work: self.scope_of_work,
            notes: self.notes,
            claimant: self.claimant.0,
            income: self.income.0,
            insured: self.insured.0,
            notice_132: self.notice_132,
            driver: self.driver.0,
            hospital: self.hospital.0,
            documents: self.document_checks.0,
            spot: self.spot.0,
            police: self.police.0,
            dispatch: self.dispatch.0,
            location: self.location.0,
            checklist: self.checklist.0,
            assigned_vendor_id: self.assigned_vendor_id.map(VendorId::from_uuid),
            source_email_id: self.source_email_id.map(EmailIntakeId::from_uuid),
            created_by: self.created_by.map(UserId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
            closed_at: self.closed_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CaseDocumentRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub attachment_id: Option<Uuid>,
    pub document_type: String,
    pub document_name: String,
    pub file_path: Option<String>,
    pub extracted_text: String,
    pub created_at: DateTime<Utc>,
}

impl CaseDocumentRow {
    pub fn into_domain(self) -> Result<CaseDocument, DatabaseError> {
        Ok(CaseDocument {
            id: DocumentId::from_uuid(self.id),
            case_id: CaseId::from_uuid(self.case_id),
            attachment_id: self.attachment_id.map(AttachmentId::from_uuid),
            document_type: parse_column("case_documents", &self.document_type)?,
            document_name: self.document_name,
            file_path: self.file_path,
            extracted_text: self.extracted_text,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_cases::{CaseSource, CaseType, DocumentType, Priority, ReportStatus};

    fn row() -> CaseRow {
        let now = Utc::now();
        CaseRow {
            id: Uuid::new_v4(),
            case_number: "CASE-0A1B2C3D".to_string(),
            claim_number: "2526005829".to_string(),
            title: "Claim 2526005829".to_string(),
            description: String::new(),
            client_id: None,
            client_name: "ICICI Lombard".to_string(),
            category: "MACT".to_string(),
            case_type: Some("Full Case".to_string()),
            priority: "HIGH".to_string(),
            source: "EMAIL".to_string(),
            status: "WIP".to_string(),
            report_status: "Pending".to_string(),
            crn: Some("245/2024".to_string()),
            policy_number: None,
            file_number: None,
            vehicle_registration: None,
            accident_date: None,
            receipt_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            receipt_month: "Jan-25".to_string(),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 14),
            completion_date: None,
            completion_month: None,
            tat_days: None,
            sla_status: None,
            scope_of_work: None,
            notes: String::new(),
            claimant: Json(PartyDetails { name: Some("Ramesh Patil".to_string()), ..Default::default() }),
            income: Json(PartyDetails::default()),
            insured: Json(PartyDetails::default()),
            notice_132: None,
            driver: Json(PartyDetails::default()),
            hospital: Json(PartyDetails::default()),
            document_checks: Json(DocumentChecks::default()),
            spot: Json(SpotDetails::default()),
            police: Json(PoliceDetails::default()),
            dispatch: Json(DispatchDetails::default()),
            location: Json(IncidentLocation::default()),
            checklist: Json(InvestigationChecklist::default()),
            assigned_vendor_id: None,
            source_email_id: None,
            created_by: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    #[test]
    fn test_row_into_domain_parses_enumerations() {
        let case = row().into_domain().unwrap();
        assert_eq!(case.category, CaseCategory::Mact);
        assert_eq!(case.case_type, Some(CaseType::FullCase));
        assert_eq!(case.priority, Priority::High);
        assert_eq!(case.source, CaseSource::Email);
        assert_eq!(case.status, CaseStatus::Wip);
        assert_eq!(case.report_status, ReportStatus::Pending);
        assert_eq!(case.claimant.name.as_deref(), Some("Ramesh Patil"));
    }

    #[test]
    fn test_row_with_bad_status_is_corrupt() {
        let mut bad = row();
        bad.status = "Archived".to_string();
        assert!(matches!(bad.into_domain(), Err(DatabaseError::CorruptRow { table: "cases", .. })));
    }

    #[test]
    fn test_document_row_into_domain() {
        let doc = CaseDocumentRow {
            id: Uuid::new_v4(),
            case_id: Uuid::new_v4(),
            attachment_id: Some(Uuid::new_v4()),
            document_type: "PETITION".to_string(),
            document_name: "petition.pdf".to_string(),
            file_path: Some("uploads/intake/petition.pdf".to_string()),
            extracted_text: "BEFORE THE MACT".to_string(),
            created_at: Utc::now(),
        }
        .into_domain()
        .unwrap();
        assert_eq!(doc.document_type, DocumentType::Petition);
        assert!(doc.attachment_id.is_some());
    }

    #[test]
    fn test_volume_window_starts_five_months_back() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 18).unwrap();
        let start = volume_window_start(today);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
    }

    #[test]
    fn test_search_pattern_ignores_blank() {
        let filter = CaseFilter { search: Some("   ".to_string()), ..Default::default() };
        assert!(filter.search_pattern().is_none());

        let filter = CaseFilter { search: Some(" 2526_ ".to_string()), ..Default::default() };
        assert_eq!(filter.search_pattern().as_deref(), Some("2526\\_"));
    }
}

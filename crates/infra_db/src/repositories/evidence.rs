//! Evidence repository implementation

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{CaseId, EvidenceId, GeoPoint, VendorId};
use domain_dispatch::Evidence;

use crate::error::DatabaseError;

/// Repository for geofenced field photos
#[derive(Debug, Clone)]
pub struct EvidenceRepository {
    pool: PgPool,
}

impl EvidenceRepository {
    /// Creates a new EvidenceRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records an accepted photo
    pub async fn insert(&self, evidence: &Evidence) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO evidence (
                id, case_id, vendor_id, file_name, content_type, file_path, size_bytes,
                latitude, longitude, distance_km, uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(evidence.id.as_uuid())
        .bind(evidence.case_id.as_uuid())
        .bind(evidence.vendor_id.as_uuid())
        .bind(&evidence.file_name)
        .bind(&evidence.content_type)
        .bind(&evidence.file_path)
        .bind(evidence.size_bytes)
        .bind(evidence.point.latitude)
        .bind(evidence.point.longitude)
        .bind(evidence.distance_km)
        .bind(evidence.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    /// Photos for a case, oldest first
    pub async fn list_for_case(&self, case_id: CaseId) -> Result<Vec<Evidence>, DatabaseError> {
        let rows = sqlx::query_as::<_, EvidenceRow>(
            r#"
            SELECT id, case_id, vendor_id, file_name, content_type, file_path, size_bytes,
                   latitude, longitude, distance_km, uploaded_at
            FROM evidence
            WHERE case_id = $1
            ORDER BY uploaded_at
            "#,
        )
        .bind(case_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EvidenceRow::into_domain).collect()
    }
}

// ============================================================================
// Type definitions
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct EvidenceRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub vendor_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub file_path: String,
    pub size_bytes: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub uploaded_at: DateTime<Utc>,
}

impl EvidenceRow {
    pub fn into_domain(self) -> Result<Evidence, DatabaseError> {
        let point = GeoPoint::new(self.latitude, self.longitude).map_err(|e| DatabaseError::corrupt("evidence", e))?;
        Ok(Evidence {
            id: EvidenceId::from_uuid(self.id),
            case_id: CaseId::from_uuid(self.case_id),
            vendor_id: VendorId::from_uuid(self.vendor_id),
            file_name: self.file_name,
            content_type: self.content_type,
            file_path: self.file_path,
            size_bytes: self.size_bytes,
            point,
            distance_km: self.distance_km,
            uploaded_at: self.uploaded_at,
        })
    }
}

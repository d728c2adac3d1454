//! Vendor repository implementation

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{GeoPoint, UserId, VendorId};
use domain_dispatch::Vendor;

use crate::error::DatabaseError;
use crate::repositories::{Page, Pagination};

const VENDOR_COLUMNS: &str = r#"
    id, user_id, company_name, contact_email, contact_phone, address, city, state,
    postal_code, country, latitude, longitude, is_active, created_at, updated_at
"#;

/// Repository for field vendors
#[derive(Debug, Clone)]
pub struct VendorRepository {
    pool: PgPool,
}

impl VendorRepository {
    /// Creates a new VendorRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, vendor: &Vendor) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO vendors (
                id, user_id, company_name, contact_email, contact_phone, address, city, state,
                postal_code, country, latitude, longitude, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(vendor.id.as_uuid())
        .bind(vendor.user_id.map(Uuid::from))
        .bind(&vendor.company_name)
        .bind(&vendor.contact_email)
        .bind(&vendor.contact_phone)
        .bind(&vendor.address)
        .bind(&vendor.city)
        .bind(&vendor.state)
        .bind(&vendor.postal_code)
        .bind(&vendor.country)
        .bind(vendor.location.map(|p| p.latitude))
        .bind(vendor.location.map(|p| p.longitude))
        .bind(vendor.is_active)
        .bind(vendor.created_at)
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: VendorId) -> Result<Vendor, DatabaseError> {
        let sql = format!("SELECT {} FROM vendors WHERE id = $1", VENDOR_COLUMNS);
        let row = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Vendor", id))?;

        Ok(row.into_domain())
    }

    /// The vendor profile linked to a login account
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<Vendor>, DatabaseError> {
        let sql = format!("SELECT {} FROM vendors WHERE user_id = $1", VENDOR_COLUMNS);
        let row = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(VendorRow::into_domain))
    }

    /// Lists vendors by company name
    ///
    /// # Arguments
    ///
    /// * `is_active` - Only vendors with this activation state, if given
    /// * `pagination` - Page to return
    pub async fn list(&self, is_active: Option<bool>, pagination: Pagination) -> Result<Page<Vendor>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {} FROM vendors
            WHERE ($1::BOOLEAN IS NULL OR is_active = $1)
            ORDER BY company_name
            LIMIT $2 OFFSET $3
            "#,
            VENDOR_COLUMNS
        );
        let rows = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(is_active)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors WHERE ($1::BOOLEAN IS NULL OR is_active = $1)")
            .bind(is_active)
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(rows.into_iter().map(VendorRow::into_domain).collect(), total, pagination))
    }

    /// Active vendors with coordinates, candidates for auto-assignment
    pub async fn list_dispatchable(&self) -> Result<Vec<Vendor>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {} FROM vendors
            WHERE is_active AND latitude IS NOT NULL AND longitude IS NOT NULL
            ORDER BY created_at
            "#,
            VENDOR_COLUMNS
        );
        let rows = sqlx::query_as::<_, VendorRow>(&sql).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(VendorRow::into_domain).collect())
    }

    pub async fn update(&self, vendor: &Vendor) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE vendors
            SET user_id = $2, company_name = $3, contact_email = $4, contact_phone = $5,
                address = $6, city = $7, state = $8, postal_code = $9, country = $10,
                latitude = $11, longitude = $12, is_active = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(vendor.id.as_uuid())
        .bind(vendor.user_id.map(Uuid::from))
        .bind(&vendor.company_name)
        .bind(&vendor.contact_email)
        .bind(&vendor.contact_phone)
        .bind(&vendor.address)
        .bind(&vendor.city)
        .bind(&vendor.state)
        .bind(&vendor.postal_code)
        .bind(&vendor.country)
        .bind(vendor.location.map(|p| p.latitude))
        .bind(vendor.location.map(|p| p.longitude))
        .bind(vendor.is_active)
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Vendor", vendor.id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: VendorId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM vendors WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Vendor", id));
        }
        Ok(())
    }

    /// Vendor totals for the super-admin dashboard
    pub async fn stats(&self) -> Result<VendorStats, DatabaseError> {
        let (total_vendors, active_vendors, geolocated_vendors, assigned_cases): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE is_active),
                COUNT(*) FILTER (WHERE latitude IS NOT NULL),
                (SELECT COUNT(*) FROM cases WHERE assigned_vendor_id IS NOT NULL)
            FROM vendors
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(VendorStats { total_vendors, active_vendors, geolocated_vendors, assigned_cases })
    }
}

// ============================================================================
// Type definitions
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct VendorStats {
    pub total_vendors: i64,
    pub active_vendors: i64,
    /// Vendors that can be auto-assigned
    pub geolocated_vendors: i64,
    pub assigned_cases: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct VendorRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
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
}

impl VendorRow {
    pub fn into_domain(self) -> Vendor {
        Vendor {
            id: VendorId::from_uuid(self.id),
            user_id: self.user_id.map(UserId::from_uuid),
            company_name: self.company_name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            address: self.address,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            location: GeoPoint::from_optional(self.latitude, self.longitude),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

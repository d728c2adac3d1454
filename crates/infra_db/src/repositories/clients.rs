//! Client (insurer) repository implementation

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::ClientId;
use domain_cases::{Client, InvestigationRates};

use crate::error::DatabaseError;

const CLIENT_COLUMNS: &str = r#"
    id, client_code, client_name, location, date_of_commencement, rates,
    is_active, created_at, updated_at
"#;

/// Repository for insurers the desk works for
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    /// Creates a new ClientRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a client
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateEntry` when the client code is taken
    pub async fn insert(&self, client: &Client) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO clients (
                id, client_code, client_name, location, date_of_commencement, rates,
                is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(client.id.as_uuid())
        .bind(&client.client_code)
        .bind(&client.client_name)
        .bind(&client.location)
        .bind(client.date_of_commencement)
        .bind(Json(&client.rates))
        .bind(client.is_active)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: ClientId) -> Result<Client, DatabaseError> {
        let sql = format!("SELECT {} FROM clients WHERE id = $1", CLIENT_COLUMNS);
        let row = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Client", id))?;

        Ok(row.into_domain())
    }

    /// All clients ordered by name
    ///
    /// # Arguments
    ///
    /// * `active_only` - Skip clients that were switched off
    pub async fn list(&self, active_only: bool) -> Result<Vec<Client>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM clients WHERE (NOT $1 OR is_active) ORDER BY client_name",
            CLIENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ClientRow::into_domain).collect())
    }

    /// First active client whose name contains `name`, ignoring case
    ///
    /// Used to resolve the insurer named in an inbound email.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Client>, DatabaseError> {
        let needle = name.trim();
        if needle.is_empty() {
            return Ok(None);
        }
        let sql = format!(
            r#"
            SELECT {} FROM clients
            WHERE is_active AND client_name ILIKE '%' || $1 || '%'
            ORDER BY created_at
            LIMIT 1
            "#,
            CLIENT_COLUMNS
        );
        let row = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(escape_like(needle))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ClientRow::into_domain))
    }

    pub async fn update(&self, client: &Client) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET client_code = $2, client_name = $3, location = $4, date_of_commencement = $5,
                rates = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(client.id.as_uuid())
        .bind(&client.client_code)
        .bind(&client.client_name)
        .bind(&client.location)
        .bind(client.date_of_commencement)
        .bind(Json(&client.rates))
        .bind(client.is_active)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Client", client.id));
        }
        Ok(())
    }
}

/// Escapes LIKE wildcards so a name matches literally
pub(crate) fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

// ============================================================================
// Type definitions
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub client_code: String,
    pub client_name: String,
    pub location: Option<String>,
    pub date_of_commencement: Option<NaiveDate>,
    pub rates: Json<InvestigationRates>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClientRow {
    pub fn into_domain(self) -> Client {
        Client {
            id: ClientId::from_uuid(self.id),
            client_code: self.client_code,
            client_name: self.client_name,
            location: self.location,
            date_of_commencement: self.date_of_commencement,
            rates: self.rates.0,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

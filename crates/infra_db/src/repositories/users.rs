//! User repository implementation
//!
//! This module provides database access for user accounts: lookup by id or
//! login name, listing for the super-admin console, and the narrow updates
//! the auth flows make (password, 2FA flag, last login).

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::UserId;
use domain_identity::{AdminSubRole, Role, User};

use crate::error::DatabaseError;
use crate::repositories::{parse_column, Page, Pagination};

const USER_COLUMNS: &str = r#"
    id, username, email, first_name, last_name, role, sub_role, permissions,
    is_active, is_2fa_enabled, password_hash, last_login, created_at
"#;

/// Repository for managing user accounts
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new account
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateEntry` when the username or email is taken
    pub async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, first_name, last_name, role, sub_role, permissions,
                is_active, is_2fa_enabled, password_hash, last_login, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.sub_role.map(|r| r.as_str()))
        .bind(&user.permissions)
        .bind(user.is_active)
        .bind(user.is_2fa_enabled)
        .bind(&user.password_hash)
        .bind(user.last_login)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    /// Retrieves a user by id
    ///
    /// # Returns
    ///
    /// The user or a NotFound error
    pub async fn get_by_id(&self, id: UserId) -> Result<User, DatabaseError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", id))
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_domain).transpose()
    }

    /// Finds a user by username or email, ignoring case
    ///
    /// # Arguments
    ///
    /// * `login` - What the user typed into the login form
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM users WHERE lower(username) = lower($1) OR lower(email) = lower($1) LIMIT 1",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(login.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_domain).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_domain).transpose()
    }

    /// Checks whether a username or email is already registered
    pub async fn login_taken(&self, username: &str, email: &str) -> Result<bool, DatabaseError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE lower(username) = lower($1) OR lower(email) = lower($2)
            )
            "#,
        )
        .bind(username.trim())
        .bind(email.trim())
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    /// Lists users, newest first, optionally narrowed to one role
    pub async fn list(&self, role: Option<Role>, pagination: Pagination) -> Result<Page<User>, DatabaseError> {
        let role = role.map(|r| r.as_str());
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE ($1::TEXT IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR role = $1)")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(UserRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(users, total, pagination))
    }

    /// Saves profile, role and flag changes
    pub async fn update(&self, user: &User) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, first_name = $4, last_name = $5,
                role = $6, sub_role = $7, permissions = $8,
                is_active = $9, is_2fa_enabled = $10, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.sub_role.map(|r| r.as_str()))
        .bind(&user.permissions)
        .bind(user.is_active)
        .bind(user.is_2fa_enabled)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", user.id));
        }
        Ok(())
    }

    /// Replaces the stored password hash
    pub async fn set_password(&self, id: UserId, password_hash: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", id));
        }
        Ok(())
    }

    pub async fn set_two_factor(&self, id: UserId, enabled: bool) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET is_2fa_enabled = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(enabled)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: UserId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", id));
        }
        Ok(())
    }

    /// Account totals for the super-admin dashboard
    pub async fn stats(&self) -> Result<UserStats, DatabaseError> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT role, COUNT(*), COUNT(*) FILTER (WHERE is_active)
            FROM users
            GROUP BY role
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = UserStats::default();
        for (role, total, active) in rows {
            let role: Role = parse_column("users", &role)?;
            stats.total_users += total;
            stats.active_users += active;
            stats.by_role.push(RoleCount { role, count: total });
        }
        stats.by_role.sort_by_key(|c| Role::ALL.iter().position(|r| *r == c.role));
        Ok(stats)
    }
}

// ============================================================================
// Type definitions
// ============================================================================

/// Number of accounts holding a role
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub by_role: Vec<RoleCount>,
}

/// User database row
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub sub_role: Option<String>,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub is_2fa_enabled: bool,
    pub password_hash: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_domain(self) -> Result<User, DatabaseError> {
        Ok(User {
            id: UserId::from_uuid(self.id),
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: parse_column("users", &self.role)?,
            sub_role: self
                .sub_role
                .as_deref()
                .map(|s| parse_column::<AdminSubRole>("users", s))
                .transpose()?,
            permissions: self.permissions,
            is_active: self.is_active,
            is_2fa_enabled: self.is_2fa_enabled,
            password_hash: self.password_hash,
            last_login: self.last_login,
            created_at: self.created_at,
        })
    }
}

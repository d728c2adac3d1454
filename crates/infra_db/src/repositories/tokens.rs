//! Token repository implementation
//!
//! Session tokens, emailed verification codes and password-reset tokens.
//! Issuing a code or reset token retires the older unused ones for the same
//! user in the same transaction, so only the latest one can ever be redeemed.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{AuthTokenId, UserId, VerificationCodeId};
use domain_identity::{AuthToken, CodeCheck, CodePurpose, PasswordResetToken, VerificationCode, MAX_CODE_ATTEMPTS};

use crate::error::DatabaseError;
use crate::repositories::parse_column;

/// Repository for session and verification tokens
#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    /// Creates a new TokenRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------------
    // Session tokens
    // ------------------------------------------------------------------------

    pub async fn insert_auth_token(&self, token: &AuthToken) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (id, user_id, token, created_at, expires_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(&token.token)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.last_used_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    /// Looks up a session by its token value
    pub async fn find_auth_token(&self, token: &str) -> Result<Option<AuthToken>, DatabaseError> {
        let row = sqlx::query_as::<_, AuthTokenRow>(
            r#"
            SELECT id, user_id, token, created_at, expires_at, last_used_at
            FROM auth_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AuthTokenRow::into_domain))
    }

    /// Records that a session was used
    pub async fn touch_auth_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE auth_tokens SET last_used_at = $2 WHERE token = $1")
            .bind(token)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Revokes a single session
    ///
    /// # Returns
    ///
    /// Whether a session was removed
    pub async fn delete_auth_token(&self, token: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revokes every session of a user
    pub async fn delete_auth_tokens_for_user(&self, user_id: UserId) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_expired_auth_tokens(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at IS NOT NULL AND expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ------------------------------------------------------------------------
    // Verification codes
    // ------------------------------------------------------------------------

    /// Stores a new code, retiring unused codes for the same user and purpose
    pub async fn issue_code(&self, code: &VerificationCode) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE verification_codes
            SET is_used = TRUE
            WHERE user_id = $1 AND purpose = $2 AND is_used = FALSE
            "#,
        )
        .bind(code.user_id.as_uuid())
        .bind(code.purpose.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO verification_codes (id, user_id, code, purpose, created_at, expires_at, is_used, attempts)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(code.id.as_uuid())
        .bind(code.user_id.as_uuid())
        .bind(&code.code)
        .bind(code.purpose.as_str())
        .bind(code.created_at)
        .bind(code.expires_at)
        .bind(code.is_used)
        .bind(code.attempts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// The most recent unused code for a user and purpose
    pub async fn latest_code(
        &self,
        user_id: UserId,
        purpose: CodePurpose,
    ) -> Result<Option<VerificationCode>, DatabaseError> {
        let row = sqlx::query_as::<_, VerificationCodeRow>(
            r#"
            SELECT id, user_id, code, purpose, created_at, expires_at, is_used, attempts
            FROM verification_codes
            WHERE user_id = $1 AND purpose = $2 AND is_used = FALSE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VerificationCodeRow::into_domain).transpose()
    }

    /// Checks a submitted code against the stored one in a single statement
    ///
    /// A wrong guess bumps the attempt counter; a match with `consume` set
    /// marks the code used. The row lock taken by the update serializes
    /// concurrent submissions, so at most [`MAX_CODE_ATTEMPTS`] wrong guesses
    /// are ever counted and a code is redeemed at most once.
    pub async fn attempt_code(
        &self,
        id: VerificationCodeId,
        submitted: &str,
        consume: bool,
        now: DateTime<Utc>,
    ) -> Result<CodeCheck, DatabaseError> {
        let matched = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE verification_codes
            SET attempts = attempts + CASE WHEN code = $2 THEN 0 ELSE 1 END,
                is_used = is_used OR (code = $2 AND $3)
            WHERE id = $1 AND is_used = FALSE AND attempts < $4 AND expires_at >= $5
            RETURNING code = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(submitted.trim())
        .bind(consume)
        .bind(MAX_CODE_ATTEMPTS)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match matched {
            Some(true) => CodeCheck::Accepted,
            Some(false) => CodeCheck::Mismatch,
            None => CodeCheck::Unusable,
        })
    }

    // ------------------------------------------------------------------------
    // Password reset tokens
    // ------------------------------------------------------------------------

    /// Stores a reset token, retiring the user's older ones
    pub async fn issue_reset_token(&self, token: &PasswordResetToken) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE password_reset_tokens SET is_used = TRUE WHERE user_id = $1 AND is_used = FALSE")
            .bind(token.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (token, user_id, created_at, expires_at, is_used)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id.as_uuid())
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.is_used)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_reset_token(&self, token: &str) -> Result<Option<PasswordResetToken>, DatabaseError> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r#"
            SELECT token, user_id, created_at, expires_at, is_used
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ResetTokenRow::into_domain))
    }

    /// Marks a reset token used
    ///
    /// # Returns
    ///
    /// `false` if the token was already used or does not exist
    pub async fn consume_reset_token(&self, token: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE password_reset_tokens SET is_used = TRUE WHERE token = $1 AND is_used = FALSE")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

// ============================================================================
// Type definitions
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct AuthTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl AuthTokenRow {
    pub fn into_domain(self) -> AuthToken {
        AuthToken {
            id: AuthTokenId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            token: self.token,
            created_at: self.created_at,
            expires_at: self.expires_at,
            last_used_at: self.last_used_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VerificationCodeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub attempts: i32,
}

impl VerificationCodeRow {
    pub fn into_domain(self) -> Result<VerificationCode, DatabaseError> {
        Ok(VerificationCode {
            id: VerificationCodeId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            code: self.code,
            purpose: parse_column("verification_codes", &self.purpose)?,
            created_at: self.created_at,
            expires_at: self.expires_at,
            is_used: self.is_used,
            attempts: self.attempts,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ResetTokenRow {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
}

impl ResetTokenRow {
    pub fn into_domain(self) -> PasswordResetToken {
        PasswordResetToken {
            user_id: UserId::from_uuid(self.user_id),
            token: self.token,
            created_at: self.created_at,
            expires_at: self.expires_at,
            is_used: self.is_used,
        }
    }
}

//! Session and password-reset tokens

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use core_kernel::{AuthTokenId, UserId};

pub const AUTH_TOKEN_TTL_DAYS: i64 = 7;
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Server-side record of an issued session
///
/// The signed bearer token handed to clients carries `token` as its id,
/// so deleting this row revokes the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub id: AuthTokenId,
    pub user_id: UserId,
    /// 64 lowercase hex characters
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn issue(user_id: UserId) -> Self {
        Self::issue_with_ttl(user_id, Duration::days(AUTH_TOKEN_TTL_DAYS))
    }

    pub fn issue_with_ttl(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            id: AuthTokenId::new_v7(),
            user_id,
            token: bytes.iter().map(|b| format!("{:02x}", b)).collect(),
            created_at: now,
            expires_at: Some(now + ttl),
            last_used_at: None,
        }
    }

    /// Tokens without an expiry never expire
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| now > expires)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used_at = Some(now);
    }
}

/// Single-use token for link-based password reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub user_id: UserId,
    /// URL-safe base64 of 48 random bytes
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
}

impl PasswordResetToken {
    pub fn issue(user_id: UserId) -> Self {
        let now = Utc::now();
        let mut bytes = [0u8; 48];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            user_id,
            token: URL_SAFE_NO_PAD.encode(bytes),
            created_at: now,
            expires_at: now + Duration::hours(RESET_TOKEN_TTL_HOURS),
            is_used: false,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && now <= self.expires_at
    }
}

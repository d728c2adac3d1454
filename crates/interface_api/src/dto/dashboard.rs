//! Dashboard DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_cases::CaseStats;
use domain_identity::User;
use infra_db::repositories::users::UserStats;
use infra_db::repositories::vendors::VendorStats;

use crate::dto::intake::EmailStatsResponse;

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 10;
pub const MAX_ACTIVITY_LIMIT: i64 = 50;
pub const RECENT_USERS: i64 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct RecentActivityQuery {
    pub limit: Option<i64>,
}

impl RecentActivityQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, MAX_ACTIVITY_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatistics {
    pub cases: CaseStats,
    pub emails: EmailStatsResponse,
    pub active_mailboxes: usize,
}

#[derive(Debug, Serialize)]
pub struct RecentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub sub_role: Option<String>,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for RecentUser {
    fn from(user: User) -> Self {
        let full_name = match user.full_name() {
            name if name.is_empty() => user.username.clone(),
            name => name,
        };
        Self {
            id: *user.id.as_uuid(),
            full_name,
            role: user.role.as_str().to_string(),
            sub_role: user.sub_role.map(|s| s.as_str().to_string()),
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            date_joined: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuperAdminDashboard {
    pub user_statistics: UserStats,
    pub vendor_statistics: VendorStats,
    pub system_statistics: SystemStatistics,
    pub recent_users: Vec<RecentUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_limit_is_clamped() {
        assert_eq!(RecentActivityQuery::default().limit(), 10);
        assert_eq!(RecentActivityQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(RecentActivityQuery { limit: Some(500) }.limit(), 50);
        assert_eq!(RecentActivityQuery { limit: Some(25) }.limit(), 25);
    }
}

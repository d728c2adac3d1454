//! Super admin dashboard handlers

use axum::{extract::State, Json};
use chrono::Utc;

use infra_db::repositories::users::UserStats;
use infra_db::repositories::vendors::VendorStats;
use infra_db::Pagination;

use crate::{AppState, error::ApiError};
use crate::auth::CurrentUser;
use crate::dto::dashboard::{RecentUser, SuperAdminDashboard, SystemStatistics, RECENT_USERS};
use crate::dto::intake::EmailStatsResponse;

/// Account, vendor and system counters with the newest accounts
pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<SuperAdminDashboard>, ApiError> {
    current.require_super_admin()?;

    let users = state.users();
    let user_statistics = users.stats().await?;
    let vendor_statistics = state.vendors().stats().await?;

    let records = state.intake_records();
    let system_statistics = SystemStatistics {
        cases: state.cases().stats(Utc::now().date_naive()).await?,
        emails: EmailStatsResponse::from_counts(&records.status_counts().await?),
        active_mailboxes: records.list_mailboxes(true).await?.len(),
    };

    let recent = users.list(None, Pagination::new(Some(1), Some(RECENT_USERS as u32))).await?;
    Ok(Json(SuperAdminDashboard {
        user_statistics,
        vendor_statistics,
        system_statistics,
        recent_users: recent.items.into_iter().map(RecentUser::from).collect(),
    }))
}

pub async fn user_stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UserStats>, ApiError> {
    current.require_super_admin()?;
    Ok(Json(state.users().stats().await?))
}

pub async fn vendor_stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<VendorStats>, ApiError> {
    current.require_super_admin()?;
    Ok(Json(state.vendors().stats().await?))
}

//! Admin dashboard handlers

use axum::{extract::{Query, State}, Json};
use chrono::Utc;

use domain_cases::{CaseStats, CaseVolume, RecentActivity, StatusCount};

use crate::{AppState, error::ApiError};
use crate::auth::CurrentUser;
use crate::dto::dashboard::RecentActivityQuery;

/// Total, active, completed, overdue and pending case counts
pub async fn stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<CaseStats>, ApiError> {
    current.require_admin()?;
    Ok(Json(state.cases().stats(Utc::now().date_naive()).await?))
}

/// Cases opened per month over the last six months
pub async fn case_volume(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<CaseVolume>>, ApiError> {
    current.require_admin()?;
    Ok(Json(state.cases().monthly_volume(Utc::now().date_naive()).await?))
}

pub async fn case_status(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<StatusCount>>, ApiError> {
    current.require_admin()?;
    Ok(Json(state.cases().status_distribution().await?))
}

pub async fn recent_activity(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<RecentActivityQuery>,
) -> Result<Json<Vec<RecentActivity>>, ApiError> {
    current.require_admin()?;
    Ok(Json(state.cases().recent_activity(query.limit(), Utc::now()).await?))
}

//! Email intake handlers
//!
//! Stored emails and their processing results, manual ingestion of
//! provider payloads, on-demand polling and the OAuth flow that connects
//! a desk mailbox.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::EmailIntakeId;
use domain_intake::{
    parse_gmail_message, parse_graph_message, IngestOutcome, MailProviderKind, Mailbox, ProcessingStatus,
};
use infra_mail::{GmailClient, GraphClient};

use crate::{AppState, error::ApiError};
use crate::auth::{sign_oauth_state, verify_oauth_state, CurrentUser};
use crate::dto::intake::*;
use crate::dto::{PageQuery, PageResponse};
use crate::poller::poll_all_mailboxes;

pub async fn list_emails(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(filter): Query<EmailListQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<EmailSummary>>, ApiError> {
    current.require_admin()?;
    let status = filter
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<ProcessingStatus>)
        .transpose()?;

    let emails = state.intake_records().list(status, page.pagination()).await?;
    Ok(Json(PageResponse::from_page(emails, EmailSummary::from)))
}

pub async fn email_stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<EmailStatsResponse>, ApiError> {
    current.require_admin()?;
    let counts = state.intake_records().status_counts().await?;
    Ok(Json(EmailStatsResponse::from_counts(&counts)))
}

pub async fn get_email(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EmailDetail>, ApiError> {
    current.require_admin()?;
    let record = state
        .intake_records()
        .get(EmailIntakeId::from_uuid(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Email not found".to_string()))?;
    Ok(Json(EmailDetail::from(record)))
}

/// Maps a stored email to a case again
pub async fn reprocess_email(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReprocessResponse>, ApiError> {
    current.require_admin()?;
    let mapping = state.intake.reprocess(EmailIntakeId::from_uuid(id)).await?;

    info!(by = %current.user.username, email_id = %id, "email reprocessed");
    Ok(Json(ReprocessResponse { message: "Email reprocessed".to_string(), mapping }))
}

/// Runs the intake pipeline on a provider message posted to the API
pub async fn ingest_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestOutcome>), ApiError> {
    current.require_admin()?;
    let (message, mailbox_id) = match request {
        IngestRequest::Gmail { message, mailbox_id } => (parse_gmail_message(&message)?, mailbox_id),
        IngestRequest::Graph { message, attachments, mailbox_id } => {
            (parse_graph_message(&message, attachments)?, mailbox_id)
        }
    };

    let outcome = state.intake.ingest(message, mailbox_id).await?;
    let status = match outcome {
        IngestOutcome::Duplicate => StatusCode::OK,
        IngestOutcome::Processed { .. } => StatusCode::CREATED,
    };
    Ok((status, Json(outcome)))
}

/// Polls every connected mailbox now
pub async fn poll_mailboxes(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<PollResponse>, ApiError> {
    current.require_admin()?;
    let report = poll_all_mailboxes(&state).await?;

    info!(by = %current.user.username, processed = report.processed, failed = report.failed, "manual mailbox poll");
    Ok(Json(PollResponse {
        message: format!(
            "Processed {} of {} messages: {} cases created, {} updated",
            report.processed, report.fetched, report.cases_created, report.cases_updated
        ),
        report,
    }))
}

pub async fn list_mailboxes(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Mailbox>>, ApiError> {
    current.require_admin()?;
    Ok(Json(state.intake_records().list_mailboxes(false).await?))
}

/// Consent URL for connecting a mailbox, with a signed `state`
pub async fn authorize_url(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(provider): Path<String>,
) -> Result<Json<AuthorizeUrlResponse>, ApiError> {
    current.require_admin()?;
    let kind: MailProviderKind = provider.parse()?;

    let signed = sign_oauth_state(&current.user, kind, &state.config.jwt_secret)?;
    let url = state.oauth.authorize_url(kind, &signed)?;
    Ok(Json(AuthorizeUrlResponse { url: url.to_string(), state: signed }))
}

/// Completes the OAuth flow and stores the mailbox
///
/// Reconnecting an address already on file replaces its tokens.
pub async fn connect_mailbox(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(provider): Path<String>,
    Json(request): Json<ConnectMailboxRequest>,
) -> Result<(StatusCode, Json<Mailbox>), ApiError> {
    current.require_admin()?;
    request.validate()?;
    let kind: MailProviderKind = provider.parse()?;
    verify_oauth_state(&request.state, &current.user, kind, &state.config.jwt_secret)?;

    let grant = state.oauth.exchange_code(kind, &request.code).await?;
    let address = match kind {
        MailProviderKind::Gmail => {
            GmailClient::new(state.http.clone(), grant.access_token.clone()).profile_address().await?
        }
        MailProviderKind::Outlook => {
            GraphClient::new(state.http.clone(), grant.access_token.clone()).profile_address().await?
        }
    };

    let mailbox = Mailbox::connect(kind, &address, grant.access_token, grant.refresh_token, grant.expires_in);
    let stored = state.intake_records().upsert_mailbox(&mailbox).await?;

    info!(by = %current.user.username, provider = %kind, mailbox = %stored.email_address, "mailbox connected");
    Ok((StatusCode::CREATED, Json(stored)))
}

//! Mailbox polling
//!
//! One cycle refreshes each active mailbox's access token when needed,
//! runs the intake pipeline over its unread messages and records the sync
//! time. A mailbox whose refresh token has been revoked is deactivated so
//! later cycles stop retrying it; reconnecting it reactivates it.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use domain_intake::{Mailbox, PollReport};
use infra_mail::{client_for, MailError};

use crate::error::ApiError;
use crate::AppState;

/// Polls every active mailbox once
///
/// A failing mailbox is logged and counted as one failure; the others are
/// still polled.
pub async fn poll_all_mailboxes(state: &AppState) -> Result<PollReport, ApiError> {
    let mailboxes = state.intake_records().list_mailboxes(true).await?;
    let mut total = PollReport::default();

    for mut mailbox in mailboxes {
        match poll_mailbox(state, &mut mailbox).await {
            Ok(report) => total.merge(&report),
            Err(e) => {
                warn!(mailbox = %mailbox.email_address, error = %e, "mailbox poll failed");
                total.failed += 1;
            }
        }
    }

    Ok(total)
}

/// Polls one mailbox
pub async fn poll_mailbox(state: &AppState, mailbox: &mut Mailbox) -> Result<PollReport, ApiError> {
    let records = state.intake_records();

    match state.oauth.ensure_fresh(mailbox).await {
        Ok(true) => records.update_mailbox_tokens(mailbox).await?,
        Ok(false) => {}
        Err(MailError::Unauthorized(reason)) => {
            warn!(mailbox = %mailbox.email_address, %reason, "mailbox authorization revoked, deactivating");
            records.set_mailbox_active(mailbox.id, false).await?;
            return Err(ApiError::Unauthorized(reason));
        }
        Err(e) => return Err(e.into()),
    }

    let provider = client_for(state.http.clone(), mailbox);
    let report = state
        .intake
        .poll(provider.as_ref(), Some(mailbox.id), state.config.poll_max_messages)
        .await?;

    let now = Utc::now();
    records.record_sync(mailbox.id, now).await?;
    mailbox.record_sync(now);

    info!(
        mailbox = %mailbox.email_address,
        fetched = report.fetched,
        processed = report.processed,
        skipped = report.skipped,
        failed = report.failed,
        cases_created = report.cases_created,
        cases_updated = report.cases_updated,
        "mailbox polled"
    );
    Ok(report)
}

/// Starts the background poller when an interval is configured
pub fn spawn_poller(state: AppState) -> Option<JoinHandle<()>> {
    let secs = state.config.poll_interval_secs;
    if secs == 0 {
        return None;
    }

    info!(interval_secs = secs, "starting mailbox poller");
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = poll_all_mailboxes(&state).await {
                error!(error = %e, "mailbox poll cycle failed");
            }
        }
    }))
}

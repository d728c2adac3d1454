//! Claims Desk - Mailbox Poller Binary
//!
//! Polls every connected mailbox once and exits, or keeps polling on an
//! interval when started with `--loop`. Shares configuration with the API
//! server.
//!
//! # Usage
//!
//! ```bash
//! # One cycle, e.g. from cron
//! cargo run --bin intake-poller
//!
//! # Long-running
//! API_POLL_INTERVAL_SECS=120 cargo run --bin intake-poller -- --loop
//! ```

use std::time::Duration;

use anyhow::Context;
use interface_api::{config::ApiConfig, poller::poll_all_mailboxes, AppState};
use infra_db::{create_pool, run_migrations};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Interval used with `--loop` when none is configured
const DEFAULT_LOOP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading API_* configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let run_forever = std::env::args().skip(1).any(|arg| arg == "--loop");
    let interval_secs = match config.poll_interval_secs {
        0 => DEFAULT_LOOP_INTERVAL_SECS,
        secs => secs,
    };

    let pool = create_pool(config.database_config())
        .await
        .context("connecting to the database")?;
    run_migrations(&pool).await.context("applying migrations")?;
    let state = AppState::new(pool, config).context("building the mail provider client")?;

    if !run_forever {
        let report = poll_all_mailboxes(&state).await.context("polling mailboxes")?;
        tracing::info!(
            fetched = report.fetched,
            processed = report.processed,
            failed = report.failed,
            cases_created = report.cases_created,
            cases_updated = report.cases_updated,
            "poll complete"
        );
        return Ok(());
    }

    tracing::info!(interval_secs, "polling mailboxes until interrupted");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = poll_all_mailboxes(&state).await {
                    tracing::error!(error = %e, "mailbox poll cycle failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, stopping poller");
                return Ok(());
            }
        }
    }
}

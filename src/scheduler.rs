//! Periodic pull-triggered reconciliation.
//!
//! Each pass refreshes every user with stored credentials. A failing user is
//! logged and recorded in its sync state; the pass moves on to the next one.

use crate::error::AppResult;
use crate::service::SyncService;
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Outcome of one pass over all users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub synced: usize,
    pub failed: usize,
}

pub async fn sync_pass(service: &SyncService, shutdown: &CancellationToken) -> AppResult<PassReport> {
    let user_ids = service.database().users_with_credentials().await?;
    let mut report = PassReport::default();

    for user_id in user_ids {
        if shutdown.is_cancelled() {
            info!("Shutdown requested, ending sync pass early");
            break;
        }

        match service.refresh_all(user_id).await {
            Ok(summary) => {
                debug!("User {} synced ({} changes)", user_id, summary.total());
                report.synced += 1;
            }
            Err(e) => {
                warn!("Skipping user {} for this pass: {}", user_id, e.to_safe_string());
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Runs a pass immediately and then every `interval` until `shutdown` is
/// cancelled.
pub async fn run_sync_loop(service: SyncService, interval: Duration, shutdown: CancellationToken) {
    info!("Starting sync loop (every {}s)", interval.as_secs());

    loop {
        if shutdown.is_cancelled() {
            info!("Shutdown signal received, stopping sync loop");
            break;
        }

        match sync_pass(&service, &shutdown).await {
            Ok(report) => info!(
                "Sync pass finished: {} users synced, {} failed",
                report.synced, report.failed
            ),
            Err(e) => error!("Sync pass failed: {}", e),
        }

        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown.cancelled() => {
                info!("Shutdown signal received during sleep, stopping sync loop");
                break;
            }
        }
    }

    info!("Sync loop stopped");
}

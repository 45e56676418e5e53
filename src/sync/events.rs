// file: src/sync/events.rs
use super::remote_ids;
use crate::calendar::{EventOrder, RemoteCalendarGateway, TimeWindow};
use crate::clock::Clock;
use crate::database::{events, Database, Upserted};
use crate::error::AppResult;
use crate::models::{Calendar, SyncSummary};
use log::{debug, info};

/// Replaces the events of each of the user's active calendars with the
/// remote snapshot for the refresh window.
///
/// The window is computed once, so every calendar in a pass shares it. Each
/// calendar is committed in its own transaction; a failure stops the pass
/// and leaves calendars already committed in place.
pub async fn reconcile_events(
    db: &Database,
    gateway: &dyn RemoteCalendarGateway,
    clock: &dyn Clock,
    user_id: i64,
) -> AppResult<SyncSummary> {
    let active = db.active_calendars(user_id).await?;
    if active.is_empty() {
        debug!("No active calendars for user {}, skipping event refresh", user_id);
        return Ok(SyncSummary::default());
    }

    let window = TimeWindow::refresh_window(clock.now());
    let mut summary = SyncSummary::default();

    for calendar in &active {
        summary.merge(reconcile_calendar_events(db, gateway, calendar, &window).await?);
    }

    info!(
        "Events reconciled for user {} across {} calendars: {} added, {} updated, {} removed",
        user_id,
        active.len(),
        summary.added,
        summary.updated,
        summary.removed
    );
    Ok(summary)
}

async fn reconcile_calendar_events(
    db: &Database,
    gateway: &dyn RemoteCalendarGateway,
    calendar: &Calendar,
    window: &TimeWindow,
) -> AppResult<SyncSummary> {
    // Fetch before opening the transaction so no lock is held across the
    // remote call.
    let remote = gateway
        .list_events(&calendar.remote_id, window, EventOrder::StartTime)
        .await?;

    let mut summary = SyncSummary::default();
    let mut tx = db.pool.begin().await?;

    for event in &remote {
        match events::upsert(&mut *tx, calendar.id, event).await? {
            Upserted::Inserted => summary.added += 1,
            Upserted::Updated => summary.updated += 1,
        }
    }

    let keep = remote_ids(remote.iter().map(|e| e.id.as_str()));
    summary.removed = events::delete_missing(&mut *tx, calendar.id, &keep).await? as usize;

    tx.commit().await?;

    debug!(
        "Calendar '{}' ({}): {} remote events, {} added, {} updated, {} removed",
        calendar.name,
        calendar.id,
        remote.len(),
        summary.added,
        summary.updated,
        summary.removed
    );
    Ok(summary)
}

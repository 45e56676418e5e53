//! Outward interface over the reconcilers.
//!
//! `SyncService` resolves a user's stored credentials, asks the connector for
//! an authenticated gateway and runs the reconcilers. Every refresh records
//! its outcome in the user's sync state before the result is returned.

use crate::calendar::{EventOrder, GatewayConnector, RemoteCalendarGateway, RemoteEvent, TimeWindow};
use crate::clock::Clock;
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Calendar, Event, SyncState, SyncSummary};
use crate::sync::{reconcile_calendars, reconcile_events};
use crate::utils::logging::log_reconcile;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct SyncService {
    db: Database,
    connector: Arc<dyn GatewayConnector>,
    clock: Arc<dyn Clock>,
}

impl SyncService {
    pub fn new(db: Database, connector: Arc<dyn GatewayConnector>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            connector,
            clock,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn refresh_calendars(&self, user_id: i64) -> AppResult<SyncSummary> {
        let started = Instant::now();
        let result = self.run_calendar_refresh(user_id).await;
        self.track(user_id, "calendar refresh", started, result).await
    }

    pub async fn refresh_events(&self, user_id: i64) -> AppResult<SyncSummary> {
        let started = Instant::now();
        let result = self.run_event_refresh(user_id).await;
        self.track(user_id, "event refresh", started, result).await
    }

    /// Calendars first, then events, through one gateway. Stops at the first
    /// failure.
    pub async fn refresh_all(&self, user_id: i64) -> AppResult<SyncSummary> {
        let started = Instant::now();
        let result = self.run_full_refresh(user_id).await;
        self.track(user_id, "full refresh", started, result).await
    }

    pub async fn calendars(&self, user_id: i64) -> AppResult<Vec<Calendar>> {
        self.db.calendars_for_user(user_id).await
    }

    /// Events of active calendars that have not ended yet.
    pub async fn upcoming_events(&self, user_id: i64) -> AppResult<Vec<Event>> {
        self.db.upcoming_events(user_id, self.clock.now()).await
    }

    pub async fn sync_state(&self, user_id: i64) -> AppResult<Option<SyncState>> {
        self.db.sync_state(user_id).await
    }

    /// Opts a calendar in or out of event refreshes.
    pub async fn set_calendar_active(
        &self,
        user_id: i64,
        calendar_id: i64,
        active: bool,
    ) -> AppResult<Calendar> {
        let calendar = self.owned_calendar(user_id, calendar_id).await?;
        self.db.set_calendar_active(user_id, calendar_id, active).await?;
        info!(
            "Calendar '{}' ({}) for user {} is now {}",
            calendar.name,
            calendar.id,
            user_id,
            if active { "active" } else { "inactive" }
        );
        Ok(Calendar { active, ..calendar })
    }

    /// Lists remote events of an owned calendar without touching the local
    /// store. The bounds are validated before any remote call.
    pub async fn remote_events(
        &self,
        user_id: i64,
        calendar_id: i64,
        start: &str,
        end: &str,
    ) -> AppResult<Vec<RemoteEvent>> {
        let calendar = self.owned_calendar(user_id, calendar_id).await?;
        let window = TimeWindow::parse(start, end)?;
        let gateway = self.gateway(user_id).await?;
        gateway
            .list_events(&calendar.remote_id, &window, EventOrder::StartTime)
            .await
    }

    /// Forgets the user's credentials. Calendars and events are kept.
    pub async fn revoke(&self, user_id: i64) -> AppResult<bool> {
        let removed = self.db.delete_credentials(user_id).await?;
        if removed {
            info!("Revoked credentials for user {}", user_id);
        }
        Ok(removed)
    }

    async fn run_calendar_refresh(&self, user_id: i64) -> AppResult<SyncSummary> {
        let gateway = self.gateway(user_id).await?;
        reconcile_calendars(&self.db, gateway.as_ref(), user_id).await
    }

    async fn run_event_refresh(&self, user_id: i64) -> AppResult<SyncSummary> {
        let gateway = self.gateway(user_id).await?;
        reconcile_events(&self.db, gateway.as_ref(), self.clock.as_ref(), user_id).await
    }

    async fn run_full_refresh(&self, user_id: i64) -> AppResult<SyncSummary> {
        let gateway = self.gateway(user_id).await?;
        let mut summary = reconcile_calendars(&self.db, gateway.as_ref(), user_id).await?;
        summary.merge(reconcile_events(&self.db, gateway.as_ref(), self.clock.as_ref(), user_id).await?);
        Ok(summary)
    }

    async fn owned_calendar(&self, user_id: i64, calendar_id: i64) -> AppResult<Calendar> {
        self.db
            .owned_calendar(user_id, calendar_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("calendar {} for user {}", calendar_id, user_id))
            })
    }

    /// Connects with the stored credentials, persisting them again if the
    /// connector refreshed the token.
    async fn gateway(&self, user_id: i64) -> AppResult<Box<dyn RemoteCalendarGateway>> {
        let stored = self
            .db
            .credentials(user_id)
            .await?
            .ok_or_else(|| AppError::auth(format!("no credentials stored for user {}", user_id)))?;

        let mut credentials = stored.clone();
        let gateway = self.connector.connect(&mut credentials).await?;

        if credentials != stored {
            self.db.save_credentials(&credentials).await?;
            info!("Stored refreshed credentials for user {}", user_id);
        }
        Ok(gateway)
    }

    /// Records the outcome in the user's sync state. A failed bookkeeping
    /// write is logged and never replaces the refresh result.
    async fn track(
        &self,
        user_id: i64,
        operation: &str,
        started: Instant,
        result: AppResult<SyncSummary>,
    ) -> AppResult<SyncSummary> {
        let at = self.clock.now();
        match result {
            Ok(summary) => {
                if let Err(record_err) = self.db.record_sync_success(user_id, at).await {
                    error!(
                        "Could not record {} success for user {}: {}",
                        operation, user_id, record_err
                    );
                }
                log_reconcile(operation, user_id, &summary, started.elapsed().as_millis());
                Ok(summary)
            }
            Err(e) => {
                warn!("{} failed for user {}: {}", operation, user_id, e);
                if let Err(record_err) = self
                    .db
                    .record_sync_failure(user_id, at, &e.to_safe_string())
                    .await
                {
                    error!(
                        "Could not record {} failure for user {}: {}",
                        operation, user_id, record_err
                    );
                }
                Err(e)
            }
        }
    }
}

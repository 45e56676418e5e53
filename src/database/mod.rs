// file: src/database/mod.rs

use crate::error::AppResult;
use crate::models::{Calendar, Credentials, Event, SyncState, User};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

// Declare submodules
pub mod calendars;
pub mod credentials;
pub mod events;
pub mod sync_state;
pub mod users;

/// Outcome of a keyed upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated,
}

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL '{}'", database_url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        run_schema(&pool).await.context("Failed to run database schema")?;

        info!("Database initialized successfully");

        Ok(Database { pool })
    }

    // --- User Delegates ---

    pub async fn create_user(&self, username: &str) -> AppResult<User> {
        users::create(&self.pool, username).await
    }

    pub async fn user(&self, user_id: i64) -> AppResult<Option<User>> {
        users::get(&self.pool, user_id).await
    }

    // --- Credential Delegates ---

    pub async fn save_credentials(&self, credentials: &Credentials) -> AppResult<()> {
        credentials::save(&self.pool, credentials).await
    }

    pub async fn credentials(&self, user_id: i64) -> AppResult<Option<Credentials>> {
        credentials::get(&self.pool, user_id).await
    }

    pub async fn delete_credentials(&self, user_id: i64) -> AppResult<bool> {
        credentials::delete(&self.pool, user_id).await
    }

    pub async fn users_with_credentials(&self) -> AppResult<Vec<i64>> {
        credentials::user_ids(&self.pool).await
    }

    // --- Calendar Delegates ---

    pub async fn calendars_for_user(&self, user_id: i64) -> AppResult<Vec<Calendar>> {
        calendars::for_user(&self.pool, user_id).await
    }

    pub async fn active_calendars(&self, user_id: i64) -> AppResult<Vec<Calendar>> {
        calendars::active_for_user(&self.pool, user_id).await
    }

    pub async fn owned_calendar(&self, user_id: i64, calendar_id: i64) -> AppResult<Option<Calendar>> {
        calendars::get_owned(&self.pool, user_id, calendar_id).await
    }

    pub async fn set_calendar_active(
        &self,
        user_id: i64,
        calendar_id: i64,
        active: bool,
    ) -> AppResult<bool> {
        calendars::set_active(&self.pool, user_id, calendar_id, active).await
    }

    // --- Event Delegates ---

    pub async fn events_for_calendar(&self, calendar_id: i64) -> AppResult<Vec<Event>> {
        events::for_calendar(&self.pool, calendar_id).await
    }

    pub async fn upcoming_events(&self, user_id: i64, from: DateTime<Utc>) -> AppResult<Vec<Event>> {
        events::upcoming_for_user(&self.pool, user_id, from).await
    }

    // --- Sync State Delegates ---

    pub async fn sync_state(&self, user_id: i64) -> AppResult<Option<SyncState>> {
        sync_state::get(&self.pool, user_id).await
    }

    pub async fn record_sync_success(&self, user_id: i64, at: DateTime<Utc>) -> AppResult<()> {
        sync_state::record_success(&self.pool, user_id, at).await
    }

    pub async fn record_sync_failure(
        &self,
        user_id: i64,
        at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<()> {
        sync_state::record_failure(&self.pool, user_id, at, error).await
    }
}

async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();

    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            sqlx::query(&current_statement).execute(pool).await?;
            current_statement.clear();
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::TempDir;

    /// Database in a fresh temporary directory. Keep the `TempDir` alive for
    /// as long as the database is used.
    pub async fn create_test_database() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let db = Database::connect(&url).await.unwrap();
        (db, dir)
    }
}

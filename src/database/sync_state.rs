// file: src/database/sync_state.rs
use crate::error::AppResult;
use crate::models::SyncState;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub async fn get(pool: &SqlitePool, user_id: i64) -> AppResult<Option<SyncState>> {
    let state = sqlx::query_as::<_, SyncState>(
        r#"
        SELECT user_id, last_synced_at, last_attempt_at, last_error, consecutive_failures
        FROM sync_state
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(state)
}

pub async fn record_success(pool: &SqlitePool, user_id: i64, at: DateTime<Utc>) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sync_state (user_id, last_synced_at, last_attempt_at, last_error, consecutive_failures)
        VALUES (?, ?, ?, NULL, 0)
        ON CONFLICT(user_id) DO UPDATE SET
            last_synced_at = excluded.last_synced_at,
            last_attempt_at = excluded.last_attempt_at,
            last_error = NULL,
            consecutive_failures = 0
        "#,
    )
    .bind(user_id)
    .bind(at)
    .bind(at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn record_failure(
    pool: &SqlitePool,
    user_id: i64,
    at: DateTime<Utc>,
    error: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sync_state (user_id, last_synced_at, last_attempt_at, last_error, consecutive_failures)
        VALUES (?, NULL, ?, ?, 1)
        ON CONFLICT(user_id) DO UPDATE SET
            last_attempt_at = excluded.last_attempt_at,
            last_error = excluded.last_error,
            consecutive_failures = sync_state.consecutive_failures + 1
        "#,
    )
    .bind(user_id)
    .bind(at)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(())
}

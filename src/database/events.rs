// file: src/database/events.rs
// Every query is scoped by calendar_id: a remote id is only unique per
// calendar.
use super::Upserted;
use crate::calendar::RemoteEvent;
use crate::error::AppResult;
use crate::models::Event;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

pub async fn find(
    conn: &mut SqliteConnection,
    calendar_id: i64,
    remote_id: &str,
) -> AppResult<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, remote_id, calendar_id, title, start_time, end_time
        FROM events
        WHERE remote_id = ? AND calendar_id = ?
        "#,
    )
    .bind(remote_id)
    .bind(calendar_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(event)
}

/// Inserts or overwrites the event keyed by `(remote.id, calendar_id)`.
pub async fn upsert(
    conn: &mut SqliteConnection,
    calendar_id: i64,
    remote: &RemoteEvent,
) -> AppResult<Upserted> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO events (remote_id, calendar_id, title, start_time, end_time)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(remote_id, calendar_id) DO NOTHING
        "#,
    )
    .bind(&remote.id)
    .bind(calendar_id)
    .bind(&remote.title)
    .bind(remote.start)
    .bind(remote.end)
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() > 0 {
        return Ok(Upserted::Inserted);
    }

    sqlx::query(
        r#"
        UPDATE events SET title = ?, start_time = ?, end_time = ?
        WHERE remote_id = ? AND calendar_id = ?
        "#,
    )
    .bind(&remote.title)
    .bind(remote.start)
    .bind(remote.end)
    .bind(&remote.id)
    .bind(calendar_id)
    .execute(&mut *conn)
    .await?;
    Ok(Upserted::Updated)
}

/// Deletes every event of `calendar_id` whose remote id is not in
/// `keep_ids`. An empty `keep_ids` clears the calendar.
pub async fn delete_missing(
    conn: &mut SqliteConnection,
    calendar_id: i64,
    keep_ids: &[String],
) -> AppResult<u64> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM events WHERE calendar_id = ");
    builder.push_bind(calendar_id);

    if !keep_ids.is_empty() {
        builder.push(" AND remote_id NOT IN (");
        let mut separated = builder.separated(", ");
        for id in keep_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");
    }

    let result = builder.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

pub async fn for_calendar(pool: &SqlitePool, calendar_id: i64) -> AppResult<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, remote_id, calendar_id, title, start_time, end_time
        FROM events
        WHERE calendar_id = ?
        ORDER BY start_time ASC, id ASC
        "#,
    )
    .bind(calendar_id)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Events of the user's active calendars that have not ended by `from`.
pub async fn upcoming_for_user(
    pool: &SqlitePool,
    user_id: i64,
    from: DateTime<Utc>,
) -> AppResult<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT e.id, e.remote_id, e.calendar_id, e.title, e.start_time, e.end_time
        FROM events e
        JOIN calendars c ON c.id = e.calendar_id
        WHERE c.user_id = ?
            AND c.active = 1
            AND e.end_time > ?
        ORDER BY e.start_time ASC, e.id ASC
        "#,
    )
    .bind(user_id)
    .bind(from)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

// file: src/database/calendars.rs
// Every query is scoped by user_id: a remote id is only unique per owner.
use super::Upserted;
use crate::calendar::RemoteCalendar;
use crate::error::AppResult;
use crate::models::Calendar;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

pub async fn find(
    conn: &mut SqliteConnection,
    user_id: i64,
    remote_id: &str,
) -> AppResult<Option<Calendar>> {
    let calendar = sqlx::query_as::<_, Calendar>(
        "SELECT id, remote_id, user_id, name, active FROM calendars WHERE remote_id = ? AND user_id = ?",
    )
    .bind(remote_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(calendar)
}

/// Inserts a newly seen calendar as inactive, or renames a known one.
/// The `active` flag of an existing calendar is never changed here.
///
/// The insert is conflict-tolerant, so two refreshes of the same user may
/// run at once without tripping the unique key.
pub async fn upsert(
    conn: &mut SqliteConnection,
    user_id: i64,
    remote: &RemoteCalendar,
) -> AppResult<Upserted> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO calendars (remote_id, user_id, name, active)
        VALUES (?, ?, ?, 0)
        ON CONFLICT(remote_id, user_id) DO NOTHING
        "#,
    )
    .bind(&remote.id)
    .bind(user_id)
    .bind(&remote.name)
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() > 0 {
        return Ok(Upserted::Inserted);
    }

    sqlx::query("UPDATE calendars SET name = ? WHERE remote_id = ? AND user_id = ?")
        .bind(&remote.name)
        .bind(&remote.id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(Upserted::Updated)
}

/// Marks inactive every active calendar of `user_id` whose remote id is not
/// in `keep_ids`. Returns the number of calendars deactivated.
pub async fn deactivate_missing(
    conn: &mut SqliteConnection,
    user_id: i64,
    keep_ids: &[String],
) -> AppResult<u64> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("UPDATE calendars SET active = 0 WHERE active = 1 AND user_id = ");
    builder.push_bind(user_id);

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

pub async fn for_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Calendar>> {
    let calendars = sqlx::query_as::<_, Calendar>(
        "SELECT id, remote_id, user_id, name, active FROM calendars WHERE user_id = ? ORDER BY name, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(calendars)
}

pub async fn active_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Calendar>> {
    let calendars = sqlx::query_as::<_, Calendar>(
        "SELECT id, remote_id, user_id, name, active FROM calendars WHERE user_id = ? AND active = 1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(calendars)
}

pub async fn get_owned(
    pool: &SqlitePool,
    user_id: i64,
    calendar_id: i64,
) -> AppResult<Option<Calendar>> {
    let calendar = sqlx::query_as::<_, Calendar>(
        "SELECT id, remote_id, user_id, name, active FROM calendars WHERE id = ? AND user_id = ?",
    )
    .bind(calendar_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(calendar)
}

/// Returns false when the calendar does not exist for this user.
pub async fn set_active(
    pool: &SqlitePool,
    user_id: i64,
    calendar_id: i64,
    active: bool,
) -> AppResult<bool> {
    let result = sqlx::query("UPDATE calendars SET active = ? WHERE id = ? AND user_id = ?")
        .bind(active)
        .bind(calendar_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

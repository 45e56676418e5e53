// file: src/database/credentials.rs
// Tokens are stored as issued; the remote provider is the only consumer.
use crate::error::AppResult;
use crate::models::Credentials;
use sqlx::SqlitePool;

pub async fn save(pool: &SqlitePool, credentials: &Credentials) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO credentials (user_id, access_token, refresh_token, expires_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(credentials.user_id)
    .bind(&credentials.access_token)
    .bind(&credentials.refresh_token)
    .bind(credentials.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, user_id: i64) -> AppResult<Option<Credentials>> {
    let credentials = sqlx::query_as::<_, Credentials>(
        "SELECT user_id, access_token, refresh_token, expires_at FROM credentials WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(credentials)
}

/// Returns whether a row was removed.
pub async fn delete(pool: &SqlitePool, user_id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM credentials WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn user_ids(pool: &SqlitePool) -> AppResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT user_id FROM credentials ORDER BY user_id")
        .fetch_all(pool)
        .await?;

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::create_test_database;
    use crate::database::users;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_save_and_get_credentials() {
        let (db, _dir) = create_test_database().await;
        let user = users::create(&db.pool, "alice").await.unwrap();
        let expires_at = Utc.with_ymd_and_hms(2021, 10, 15, 11, 0, 0).unwrap();
        let credentials = Credentials::new(user.id, "token".to_string(), Some("refresh".to_string()))
            .expiring_at(expires_at);

        save(&db.pool, &credentials).await.unwrap();

        let stored = get(&db.pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored, credentials);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_tokens() {
        let (db, _dir) = create_test_database().await;
        let user = users::create(&db.pool, "alice").await.unwrap();

        save(&db.pool, &Credentials::new(user.id, "old".to_string(), Some("refresh".to_string())))
            .await
            .unwrap();
        save(&db.pool, &Credentials::new(user.id, "new".to_string(), None))
            .await
            .unwrap();

        let stored = get(&db.pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored.access_token, "new");
        assert_eq!(stored.refresh_token, None);
        assert_eq!(user_ids(&db.pool).await.unwrap(), vec![user.id]);
    }

    #[tokio::test]
    async fn test_delete_credentials() {
        let (db, _dir) = create_test_database().await;
        let user = users::create(&db.pool, "alice").await.unwrap();
        save(&db.pool, &Credentials::new(user.id, "token".to_string(), None))
            .await
            .unwrap();

        assert!(delete(&db.pool, user.id).await.unwrap());
        assert!(!delete(&db.pool, user.id).await.unwrap());
        assert!(get(&db.pool, user.id).await.unwrap().is_none());
        assert!(user_ids(&db.pool).await.unwrap().is_empty());
    }
}

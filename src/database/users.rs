// file: src/database/users.rs
use crate::error::{AppError, AppResult};
use crate::models::User;
use sqlx::SqlitePool;

pub async fn create(pool: &SqlitePool, username: &str) -> AppResult<User> {
    if username.trim().is_empty() {
        return Err(AppError::invalid_argument("Username cannot be empty"));
    }

    let result = sqlx::query("INSERT INTO users (username) VALUES (?)")
        .bind(username)
        .execute(pool)
        .await?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: username.to_string(),
    })
}

pub async fn get(pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

//! User queries

use crate::timestamps;
use soul_core::{error::Result, types::*, SoulError};
use sqlx::{Row, SqlitePool};

/// Create a user
pub async fn create(pool: &SqlitePool, name: &str) -> Result<User> {
    let result = sqlx::query("INSERT INTO users (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(timestamps::now())
        .execute(pool)
        .await?;

    let id = UserId::new(result.last_insert_rowid());
    get_by_id(pool, id).await?.ok_or(SoulError::UserNotFound(id))
}

/// Get user by ID
pub async fn get_by_id(pool: &SqlitePool, id: UserId) -> Result<Option<User>> {
    let row = sqlx::query("SELECT id, name, created_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: timestamps::get(&row, "created_at")?,
    }))
}

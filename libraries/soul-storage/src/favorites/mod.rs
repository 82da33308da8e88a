//! Favorite song queries

use crate::timestamps;
use soul_core::{error::Result, types::*};
use sqlx::{Row, SqlitePool};

/// Mark a song as favorite, returning `false` if it already was
pub async fn add(pool: &SqlitePool, user_id: UserId, song_id: SongId) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO favorites (user_id, song_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(song_id)
    .bind(timestamps::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Unmark a favorite, returning `false` if it was not set
pub async fn remove(pool: &SqlitePool, user_id: UserId, song_id: SongId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND song_id = ?")
        .bind(user_id)
        .bind(song_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Check whether a user favorited a song
pub async fn is_favorite(pool: &SqlitePool, user_id: UserId, song_id: SongId) -> Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM favorites WHERE user_id = ? AND song_id = ?")
            .bind(user_id)
            .bind(song_id)
            .fetch_optional(pool)
            .await?;

    Ok(found.is_some())
}

/// All favorites of a user, newest first
pub async fn for_user(pool: &SqlitePool, user_id: UserId) -> Result<Vec<Favorite>> {
    let rows = sqlx::query(
        "SELECT user_id, song_id, created_at FROM favorites WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<Favorite> {
            Ok(Favorite {
                user_id: row.try_get("user_id")?,
                song_id: row.try_get("song_id")?,
                created_at: timestamps::get(row, "created_at")?,
            })
        })
        .collect()
}

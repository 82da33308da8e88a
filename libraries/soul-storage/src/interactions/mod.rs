//! Play statistics per (user, song)

use crate::timestamps;
use chrono::{DateTime, Utc};
use soul_core::{error::Result, types::*, SoulError};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn from_row(row: &SqliteRow) -> Result<Interaction> {
    Ok(Interaction {
        user_id: row.try_get("user_id")?,
        song_id: row.try_get("song_id")?,
        play_count: row.try_get("play_count")?,
        last_played_at: timestamps::get_opt(row, "last_played_at")?,
    })
}

/// Get the interaction record for a user and song
pub async fn get(pool: &SqlitePool, user_id: UserId, song_id: SongId) -> Result<Option<Interaction>> {
    let row = sqlx::query(
        "SELECT user_id, song_id, play_count, last_played_at FROM interactions \
         WHERE user_id = ? AND song_id = ?",
    )
    .bind(user_id)
    .bind(song_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Record one play at `played_at`, returning the updated record
pub async fn record_play(
    pool: &SqlitePool,
    user_id: UserId,
    song_id: SongId,
    played_at: DateTime<Utc>,
) -> Result<Interaction> {
    let row = sqlx::query(
        r#"
        INSERT INTO interactions (user_id, song_id, play_count, last_played_at)
        VALUES (?, ?, 1, ?)
        ON CONFLICT(user_id, song_id) DO UPDATE SET
            play_count = play_count + 1,
            last_played_at = MAX(COALESCE(last_played_at, ''), excluded.last_played_at)
        RETURNING user_id, song_id, play_count, last_played_at
        "#,
    )
    .bind(user_id)
    .bind(song_id)
    .bind(timestamps::encode(played_at))
    .fetch_one(pool)
    .await?;

    from_row(&row)
}

/// Overwrite the interaction record (imports, corrections)
pub async fn upsert(pool: &SqlitePool, interaction: &Interaction) -> Result<()> {
    if interaction.play_count < 0 {
        return Err(SoulError::invalid_input("play_count cannot be negative"));
    }

    sqlx::query(
        r#"
        INSERT INTO interactions (user_id, song_id, play_count, last_played_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, song_id) DO UPDATE SET
            play_count = excluded.play_count,
            last_played_at = excluded.last_played_at
        "#,
    )
    .bind(interaction.user_id)
    .bind(interaction.song_id)
    .bind(interaction.play_count)
    .bind(interaction.last_played_at.map(timestamps::encode))
    .execute(pool)
    .await?;

    Ok(())
}

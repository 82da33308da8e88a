//! Smart playlist membership writes
//!
//! Full materialization swaps the whole membership in one transaction.
//! Incremental updates touch a single row, appending new members after the
//! current last position.

use crate::timestamps;
use chrono::{DateTime, Utc};
use soul_core::{error::Result, types::*, SoulError};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashSet;

// Four bound values per row keeps each insert well under SQLite's variable limit.
const INSERT_BATCH: usize = 500;

/// Membership rows ordered by position
pub async fn songs(pool: &SqlitePool, id: &PlaylistId) -> Result<Vec<PlaylistSong>> {
    let rows = sqlx::query(
        "SELECT song_id, position, added_at FROM playlist_songs \
         WHERE playlist_id = ? ORDER BY position, song_id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<PlaylistSong> {
            Ok(PlaylistSong {
                song_id: row.try_get("song_id")?,
                position: row.try_get("position")?,
                added_at: timestamps::get(row, "added_at")?,
            })
        })
        .collect()
}

/// Replace every membership row and stamp `materialized_at`
///
/// Duplicate song IDs keep their first position.
pub async fn replace(
    pool: &SqlitePool,
    id: &PlaylistId,
    song_ids: &[SongId],
    materialized_at: DateTime<Utc>,
) -> Result<()> {
    let stamp = timestamps::encode(materialized_at);
    let mut seen = HashSet::with_capacity(song_ids.len());
    let ordered: Vec<SongId> = song_ids.iter().copied().filter(|s| seen.insert(*s)).collect();

    let mut tx = pool.begin().await?;

    // Write first so the transaction holds the write lock from the start.
    let updated = sqlx::query("UPDATE playlists SET materialized_at = ?, updated_at = ? WHERE id = ?")
        .bind(&stamp)
        .bind(&stamp)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(SoulError::PlaylistNotFound(id.clone()));
    }

    sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    for (batch_index, batch) in ordered.chunks(INSERT_BATCH).enumerate() {
        let offset = (batch_index * INSERT_BATCH) as i64;
        let mut insert: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO playlist_songs (playlist_id, song_id, position, added_at) ");
        insert.push_values(batch.iter().enumerate(), |mut row, (i, song_id)| {
            row.push_bind(id.clone())
                .push_bind(*song_id)
                .push_bind(offset + i as i64)
                .push_bind(stamp.clone());
        });
        insert.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    tracing::debug!(playlist_id = %id, members = ordered.len(), "Replaced playlist membership");
    Ok(())
}

/// Make `song_id` a member (`member = true`) or non-member of a playlist
pub async fn apply(
    pool: &SqlitePool,
    id: &PlaylistId,
    song_id: SongId,
    member: bool,
) -> Result<MembershipChange> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM playlists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(SoulError::PlaylistNotFound(id.clone()));
    }

    if !member {
        let removed = sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ? AND song_id = ?")
            .bind(id)
            .bind(song_id)
            .execute(pool)
            .await?
            .rows_affected();

        return Ok(if removed > 0 {
            MembershipChange::Removed
        } else {
            MembershipChange::Unchanged
        });
    }

    let mut tx = pool.begin().await?;

    // Single statement: position is computed under the write lock it takes.
    let inserted = sqlx::query(
        r#"
        INSERT INTO playlist_songs (playlist_id, song_id, position, added_at)
        SELECT ?, ?, COALESCE(MAX(position), -1) + 1, ?
        FROM playlist_songs WHERE playlist_id = ?
        ON CONFLICT(playlist_id, song_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(song_id)
    .bind(timestamps::now())
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if inserted == 0 {
        tx.commit().await?;
        return Ok(MembershipChange::Unchanged);
    }

    let position: i64 = sqlx::query_scalar(
        "SELECT position FROM playlist_songs WHERE playlist_id = ? AND song_id = ?",
    )
    .bind(id)
    .bind(song_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(MembershipChange::Added { position })
}

/// Remove a song from every smart playlist, returning the playlists touched
pub async fn detach_from_smart(pool: &SqlitePool, song_id: SongId) -> Result<Vec<PlaylistId>> {
    let rows = sqlx::query(
        r#"
        DELETE FROM playlist_songs
        WHERE song_id = ?
          AND playlist_id IN (SELECT id FROM playlists WHERE is_smart = 1)
        RETURNING playlist_id
        "#,
    )
    .bind(song_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<PlaylistId> { Ok(PlaylistId::new(row.try_get::<String, _>("playlist_id")?)) })
        .collect()
}

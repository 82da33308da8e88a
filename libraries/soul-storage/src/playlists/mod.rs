//! Playlist queries
//!
//! Manual playlists are edited song by song. Smart playlists reject manual
//! edits; their membership is written only through [`crate::membership`].

use crate::timestamps;
use chrono::{DateTime, Utc};
use soul_core::{error::Result, types::*, SoulError};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, is_smart, rules, \
     rules_changed_at, materialized_at, created_at, updated_at";

fn decode_rules(id: &str, raw: Option<String>) -> Option<serde_json::Value> {
    raw.map(|raw| match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            // Keep the raw text; rule parsing rejects it and the playlist fails closed.
            tracing::warn!(playlist_id = %id, error = %e, "Stored rules are not valid JSON");
            serde_json::Value::String(raw)
        }
    })
}

fn from_row(row: &SqliteRow) -> Result<Playlist> {
    let id: String = row.try_get("id")?;
    let rules = decode_rules(&id, row.try_get("rules")?);

    Ok(Playlist {
        id: PlaylistId::new(id),
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_smart: row.try_get::<i64, _>("is_smart")? != 0,
        rules,
        rules_changed_at: timestamps::get_opt(row, "rules_changed_at")?,
        materialized_at: timestamps::get_opt(row, "materialized_at")?,
        created_at: timestamps::get(row, "created_at")?,
        updated_at: timestamps::get(row, "updated_at")?,
    })
}

async fn fetch_many(pool: &SqlitePool, filter: &str) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE {filter} ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Get playlist by ID
pub async fn get_by_id(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<Playlist>> {
    let row = sqlx::query(&format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get a user's playlists, most recently updated first
pub async fn get_user_playlists(pool: &SqlitePool, owner_id: UserId) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE owner_id = ? ORDER BY updated_at DESC, id"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Create new playlist
///
/// Smart playlists require a rule document and start unmaterialized.
pub async fn create(pool: &SqlitePool, playlist: CreatePlaylist) -> Result<Playlist> {
    let rules = match (playlist.is_smart, &playlist.rules) {
        (true, Some(rules)) => Some(rules.to_string()),
        (true, None) => {
            return Err(SoulError::invalid_input("Smart playlist requires rules"));
        }
        (false, Some(_)) => {
            return Err(SoulError::invalid_input("Manual playlist cannot carry rules"));
        }
        (false, None) => None,
    };

    let id = PlaylistId::generate();
    let now = timestamps::now();
    let rules_changed_at = playlist.is_smart.then(|| now.clone());

    sqlx::query(
        r#"
        INSERT INTO playlists (
            id, owner_id, name, description, is_smart, rules,
            rules_changed_at, materialized_at, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(playlist.owner_id)
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(playlist.is_smart)
    .bind(rules)
    .bind(rules_changed_at)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SoulError::storage("Failed to retrieve created playlist"))
}

/// Replace the rules of a smart playlist and bump `rules_changed_at`
///
/// The existing snapshot is kept; it is stale until the next materialization.
pub async fn update_rules(
    pool: &SqlitePool,
    id: &PlaylistId,
    rules: &serde_json::Value,
) -> Result<Playlist> {
    let playlist = get_by_id(pool, id)
        .await?
        .ok_or_else(|| SoulError::PlaylistNotFound(id.clone()))?;

    if !playlist.is_smart {
        return Err(SoulError::invalid_input(format!(
            "Playlist {id} is not a smart playlist"
        )));
    }

    let now = timestamps::now();
    sqlx::query("UPDATE playlists SET rules = ?, rules_changed_at = ?, updated_at = ? WHERE id = ?")
        .bind(rules.to_string())
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(pool)
        .await?;

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SoulError::PlaylistNotFound(id.clone()))
}

/// Every smart playlist
pub async fn all_smart(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    fetch_many(pool, "is_smart = 1").await
}

/// Smart playlists with a snapshot, optionally for one owner
pub async fn materialized_smart(pool: &SqlitePool, owner: Option<UserId>) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists \
         WHERE is_smart = 1 AND materialized_at IS NOT NULL AND (? IS NULL OR owner_id = ?) \
         ORDER BY created_at, id"
    ))
    .bind(owner)
    .bind(owner)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Smart playlists that are unmaterialized, outdated by a rule edit, or older
/// than `stale_before`
pub async fn needing_refresh(pool: &SqlitePool, stale_before: DateTime<Utc>) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists \
         WHERE is_smart = 1 AND ( \
             materialized_at IS NULL \
             OR materialized_at < ? \
             OR (rules_changed_at IS NOT NULL AND materialized_at < rules_changed_at) \
         ) \
         ORDER BY created_at, id"
    ))
    .bind(timestamps::encode(stale_before))
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

async fn require_manual(pool: &SqlitePool, id: &PlaylistId) -> Result<()> {
    let is_smart: Option<i64> = sqlx::query_scalar("SELECT is_smart FROM playlists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match is_smart {
        None => Err(SoulError::PlaylistNotFound(id.clone())),
        Some(0) => Ok(()),
        Some(_) => Err(SoulError::SmartPlaylistModification(id.clone())),
    }
}

/// Append a song to a manual playlist
pub async fn add_song(pool: &SqlitePool, id: &PlaylistId, song_id: SongId) -> Result<()> {
    require_manual(pool, id).await?;

    let now = timestamps::now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO playlist_songs (playlist_id, song_id, position, added_at)
        SELECT ?, ?, COALESCE(MAX(position), -1) + 1, ?
        FROM playlist_songs WHERE playlist_id = ?
        ON CONFLICT(playlist_id, song_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(song_id)
    .bind(&now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE playlists SET updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Remove a song from a manual playlist
pub async fn remove_song(pool: &SqlitePool, id: &PlaylistId, song_id: SongId) -> Result<bool> {
    require_manual(pool, id).await?;

    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ? AND song_id = ?")
        .bind(id)
        .bind(song_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    if removed {
        sqlx::query("UPDATE playlists SET updated_at = ? WHERE id = ?")
            .bind(timestamps::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(removed)
}

/// Reorder a manual playlist; `order` must list exactly its current songs
pub async fn reorder_songs(pool: &SqlitePool, id: &PlaylistId, order: &[SongId]) -> Result<()> {
    require_manual(pool, id).await?;

    let mut tx = pool.begin().await?;

    // Park positions out of the way before renumbering.
    sqlx::query("UPDATE playlist_songs SET position = -1 - position WHERE playlist_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    for (position, song_id) in order.iter().enumerate() {
        let updated = sqlx::query(
            "UPDATE playlist_songs SET position = ? WHERE playlist_id = ? AND song_id = ?",
        )
        .bind(position as i64)
        .bind(id)
        .bind(*song_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(SoulError::invalid_input(format!(
                "Song {song_id} is not in playlist {id}"
            )));
        }
    }

    let leftover: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM playlist_songs WHERE playlist_id = ? AND position < 0",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if leftover > 0 {
        return Err(SoulError::invalid_input(
            "Reorder must list every song in the playlist",
        ));
    }

    sqlx::query("UPDATE playlists SET updated_at = ? WHERE id = ?")
        .bind(timestamps::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

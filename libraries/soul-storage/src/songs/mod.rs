//! Song queries

use crate::{tags, timestamps};
use soul_core::{error::Result, types::*, SoulError};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

const SONG_COLUMNS: &str = "s.id, s.title, s.artist_name, s.album_name, s.genre, s.year, \
     s.length_seconds, s.audio_format, s.created_at, s.updated_at";

/// Map a row selected with the song columns (aliased `s`) into a `Song`
///
/// Tags are left empty; callers load them separately.
pub(crate) fn from_row(row: &SqliteRow) -> Result<Song> {
    Ok(Song {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        artist_name: row.try_get("artist_name")?,
        album_name: row.try_get("album_name")?,
        genre: row.try_get("genre")?,
        year: row.try_get("year")?,
        length_seconds: row.try_get("length_seconds")?,
        audio_format: row.try_get("audio_format")?,
        created_at: timestamps::get(row, "created_at")?,
        updated_at: timestamps::get(row, "updated_at")?,
        tags: Vec::new(),
    })
}

pub(crate) fn columns() -> &'static str {
    SONG_COLUMNS
}

/// Get song by ID, tags included
pub async fn get_by_id(pool: &SqlitePool, id: SongId) -> Result<Option<Song>> {
    let row = sqlx::query(&format!("SELECT {SONG_COLUMNS} FROM songs s WHERE s.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut song = from_row(&row)?;
    song.tags = tags::for_song(pool, id).await?;
    Ok(Some(song))
}

/// Create a new song
pub async fn create(pool: &SqlitePool, song: CreateSong) -> Result<Song> {
    let now = timestamps::now();
    let created_at = song.created_at.map(timestamps::encode).unwrap_or_else(|| now.clone());

    let result = sqlx::query(
        r#"
        INSERT INTO songs (
            title, artist_name, album_name, genre, year, length_seconds,
            audio_format, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&song.title)
    .bind(&song.artist_name)
    .bind(&song.album_name)
    .bind(&song.genre)
    .bind(song.year)
    .bind(song.length_seconds)
    .bind(&song.audio_format)
    .bind(&created_at)
    .bind(&now)
    .execute(pool)
    .await?;

    let id = SongId::new(result.last_insert_rowid());
    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SoulError::storage("Failed to retrieve created song"))
}

/// Update song attributes; fields left `None` keep their value
pub async fn update(pool: &SqlitePool, id: SongId, update: UpdateSong) -> Result<Song> {
    let result = sqlx::query(
        r#"
        UPDATE songs SET
            title = COALESCE(?, title),
            artist_name = COALESCE(?, artist_name),
            album_name = COALESCE(?, album_name),
            genre = COALESCE(?, genre),
            year = COALESCE(?, year),
            length_seconds = COALESCE(?, length_seconds),
            audio_format = COALESCE(?, audio_format),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.title)
    .bind(&update.artist_name)
    .bind(&update.album_name)
    .bind(&update.genre)
    .bind(update.year)
    .bind(update.length_seconds)
    .bind(&update.audio_format)
    .bind(timestamps::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(SoulError::SongNotFound(id));
    }

    get_by_id(pool, id)
        .await?
        .ok_or(SoulError::SongNotFound(id))
}

/// Delete a song
///
/// Returns `false` if no song had this ID.
pub async fn delete(pool: &SqlitePool, id: SongId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Total number of songs
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

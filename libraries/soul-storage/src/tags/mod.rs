//! Hierarchical tag queries
//!
//! A tag's depth is its parent's depth plus one. Attaching a child tag to a
//! song does not attach its ancestors.

use soul_core::{error::Result, types::*, SoulError};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;

fn from_row(row: &SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        parent_id: row.try_get("parent_id")?,
        depth: row.try_get("depth")?,
    })
}

/// Get tag by ID
pub async fn get_by_id(pool: &SqlitePool, id: TagId) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, slug, parent_id, depth FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Create a tag, deriving slug and depth
pub async fn create(pool: &SqlitePool, tag: CreateTag) -> Result<Tag> {
    let depth = match tag.parent_id {
        Some(parent_id) => {
            let parent = get_by_id(pool, parent_id)
                .await?
                .ok_or_else(|| SoulError::not_found("Tag", parent_id.to_string()))?;
            parent.depth + 1
        }
        None => 0,
    };

    let result = sqlx::query("INSERT INTO tags (name, slug, parent_id, depth) VALUES (?, ?, ?, ?)")
        .bind(&tag.name)
        .bind(tag.slug())
        .bind(tag.parent_id)
        .bind(depth)
        .execute(pool)
        .await?;

    get_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| SoulError::storage("Failed to retrieve created tag"))
}

/// Find tags whose name or slug equals `value`
pub async fn find_by_name(pool: &SqlitePool, value: &str) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        "SELECT id, name, slug, parent_id, depth FROM tags WHERE name = ? OR slug = ? ORDER BY id",
    )
    .bind(value)
    .bind(value)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Attach a tag to a song (no-op if already attached)
pub async fn attach(pool: &SqlitePool, song_id: SongId, tag_id: TagId) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO song_tags (song_id, tag_id) VALUES (?, ?)")
        .bind(song_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Detach a tag from a song, returning whether it was attached
pub async fn detach(pool: &SqlitePool, song_id: SongId, tag_id: TagId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM song_tags WHERE song_id = ? AND tag_id = ?")
        .bind(song_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Tags attached to one song
pub async fn for_song(pool: &SqlitePool, song_id: SongId) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.slug, t.parent_id, t.depth
        FROM song_tags st
        INNER JOIN tags t ON st.tag_id = t.id
        WHERE st.song_id = ?
        ORDER BY t.id
        "#,
    )
    .bind(song_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Tags for a batch of songs, keyed by song
pub async fn for_songs(pool: &SqlitePool, song_ids: &[SongId]) -> Result<HashMap<SongId, Vec<Tag>>> {
    let mut by_song: HashMap<SongId, Vec<Tag>> = HashMap::new();
    if song_ids.is_empty() {
        return Ok(by_song);
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT st.song_id, t.id, t.name, t.slug, t.parent_id, t.depth \
         FROM song_tags st INNER JOIN tags t ON st.tag_id = t.id \
         WHERE st.song_id IN (",
    );
    let mut separated = query.separated(", ");
    for id in song_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY st.song_id, t.id");

    let rows = query.build().fetch_all(pool).await?;
    for row in &rows {
        let song_id: SongId = row.try_get("song_id")?;
        by_song.entry(song_id).or_default().push(from_row(row)?);
    }

    Ok(by_song)
}

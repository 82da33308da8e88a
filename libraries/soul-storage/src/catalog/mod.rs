//! User-scoped song facts
//!
//! One query joins each song with the user's favorite flag and interaction;
//! tags for the page are loaded in a second batched query.

use crate::{songs, tags, timestamps};
use soul_core::{error::Result, types::*};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn facts_query(filter: &str) -> String {
    format!(
        r#"
        SELECT {columns},
               f.song_id IS NOT NULL AS is_favorite,
               i.play_count AS play_count,
               i.last_played_at AS last_played_at
        FROM songs s
        LEFT JOIN favorites f ON f.song_id = s.id AND f.user_id = ?
        LEFT JOIN interactions i ON i.song_id = s.id AND i.user_id = ?
        WHERE {filter}
        ORDER BY s.id
        "#,
        columns = songs::columns(),
    )
}

fn facts_from_row(row: &SqliteRow, user_id: UserId) -> Result<SongFacts> {
    let song = songs::from_row(row)?;
    let play_count: Option<i64> = row.try_get("play_count")?;
    let interaction = match play_count {
        Some(play_count) => Some(Interaction {
            user_id,
            song_id: song.id,
            play_count,
            last_played_at: timestamps::get_opt(row, "last_played_at")?,
        }),
        None => None,
    };

    Ok(SongFacts {
        song,
        is_favorite: row.try_get::<i64, _>("is_favorite")? != 0,
        interaction,
    })
}

async fn attach_tags(pool: &SqlitePool, facts: &mut [SongFacts]) -> Result<()> {
    let ids: Vec<SongId> = facts.iter().map(SongFacts::id).collect();
    let mut by_song = tags::for_songs(pool, &ids).await?;
    for fact in facts.iter_mut() {
        fact.song.tags = by_song.remove(&fact.song.id).unwrap_or_default();
    }
    Ok(())
}

/// One page of songs after `after`, in ascending ID order
pub async fn scan(
    pool: &SqlitePool,
    user_id: UserId,
    after: Option<SongId>,
    limit: usize,
) -> Result<Vec<SongFacts>> {
    let sql = format!("{} LIMIT ?", facts_query("(? IS NULL OR s.id > ?)"));
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(after)
        .bind(after)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;

    let mut facts = rows
        .iter()
        .map(|row| facts_from_row(row, user_id))
        .collect::<Result<Vec<_>>>()?;
    attach_tags(pool, &mut facts).await?;
    Ok(facts)
}

/// Facts for a single song, `None` if it does not exist
pub async fn facts(pool: &SqlitePool, song_id: SongId, user_id: UserId) -> Result<Option<SongFacts>> {
    let sql = facts_query("s.id = ?");
    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(song_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut fact = facts_from_row(&row, user_id)?;
    fact.song.tags = tags::for_song(pool, song_id).await?;
    Ok(Some(fact))
}

//! Test helpers and fixtures for storage integration tests
//!
//! These helpers create test databases using REAL SQLite files (NOT in-memory)
//! to match production behavior and properly test migrations, constraints, and indexes.

#![allow(dead_code)]

use soul_core::types::*;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let pool = soul_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");

        soul_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            _temp_dir: temp_dir,
        }
    }

    /// Get the pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Test fixture: Create a test user
pub async fn create_test_user(pool: &SqlitePool, name: &str) -> UserId {
    soul_storage::users::create(pool, name)
        .await
        .expect("Failed to create test user")
        .id
}

/// Test fixture: Create a song with a title and optional genre
pub async fn create_test_song(pool: &SqlitePool, title: &str, genre: Option<&str>) -> SongId {
    soul_storage::songs::create(
        pool,
        CreateSong {
            genre: genre.map(str::to_string),
            ..CreateSong::titled(title)
        },
    )
    .await
    .expect("Failed to create test song")
    .id
}

/// Test fixture: Create a root tag
pub async fn create_test_tag(pool: &SqlitePool, name: &str) -> Tag {
    soul_storage::tags::create(pool, CreateTag::root(name))
        .await
        .expect("Failed to create test tag")
}

/// Test fixture: Create a manual playlist
pub async fn create_test_playlist(pool: &SqlitePool, name: &str, owner_id: UserId) -> Playlist {
    soul_storage::playlists::create(pool, CreatePlaylist::manual(owner_id, name))
        .await
        .expect("Failed to create test playlist")
}

/// Test fixture: Create a smart playlist with the given rules
pub async fn create_test_smart_playlist(
    pool: &SqlitePool,
    name: &str,
    owner_id: UserId,
    rules: serde_json::Value,
) -> Playlist {
    soul_storage::playlists::create(pool, CreatePlaylist::smart(owner_id, name, rules))
        .await
        .expect("Failed to create smart playlist")
}

/// Song IDs of a playlist in position order
pub async fn member_ids(pool: &SqlitePool, id: &PlaylistId) -> Vec<SongId> {
    soul_storage::membership::songs(pool, id)
        .await
        .expect("Failed to load membership")
        .into_iter()
        .map(|row| row.song_id)
        .collect()
}

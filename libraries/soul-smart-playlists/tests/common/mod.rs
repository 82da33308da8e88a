//! Shared fixtures for smart playlist integration tests
//!
//! Every test gets its own REAL SQLite file in a temp directory, migrated with
//! the production schema, and an engine wired to it.

#![allow(dead_code)]

use chrono::{Duration, SecondsFormat};
use serde_json::{json, Value};
use soul_core::types::*;
use soul_smart_playlists::{
    JobSink, RetryConfig, SmartPlaylistConfig, SmartPlaylistEngine, SmartPlaylistJob,
};
use soul_storage::LocalStorageContext;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
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

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Sink that records jobs instead of running them
#[derive(Default)]
pub struct RecordingSink {
    jobs: Mutex<Vec<SmartPlaylistJob>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<SmartPlaylistJob> {
        std::mem::take(&mut *self.jobs.lock().unwrap())
    }
}

impl JobSink for RecordingSink {
    fn schedule(&self, job: SmartPlaylistJob) -> soul_smart_playlists::Result<()> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

/// Small chunks exercise pagination; short retries keep failures fast
pub fn test_config() -> SmartPlaylistConfig {
    SmartPlaylistConfig {
        scan_chunk_size: 3,
        materialize_timeout_secs: 10,
        retry: RetryConfig {
            initial_interval_ms: 5,
            max_interval_ms: 20,
            max_elapsed_secs: 1,
        },
        ..SmartPlaylistConfig::default()
    }
}

/// Database, storage and an engine whose jobs land in a [`RecordingSink`]
pub struct Harness {
    pub db: TestDb,
    pub storage: Arc<LocalStorageContext>,
    pub sink: Arc<RecordingSink>,
    pub engine: Arc<SmartPlaylistEngine>,
}

impl Harness {
    pub async fn new() -> Self {
        let db = TestDb::new().await;
        let storage = Arc::new(LocalStorageContext::new(db.pool.clone()));
        let sink = Arc::new(RecordingSink::default());
        let engine = Arc::new(SmartPlaylistEngine::new(
            storage.clone(),
            storage.clone(),
            sink.clone(),
            test_config(),
        ));

        Self {
            db,
            storage,
            sink,
            engine,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    pub async fn user(&self, name: &str) -> UserId {
        soul_storage::users::create(self.pool(), name)
            .await
            .expect("Failed to create test user")
            .id
    }

    pub async fn song(&self, song: CreateSong) -> SongId {
        soul_storage::songs::create(self.pool(), song)
            .await
            .expect("Failed to create test song")
            .id
    }

    pub async fn song_by(&self, title: &str, artist: &str) -> SongId {
        self.song(CreateSong {
            artist_name: Some(artist.to_string()),
            ..CreateSong::titled(title)
        })
        .await
    }

    pub async fn tag(&self, name: &str) -> Tag {
        soul_storage::tags::create(self.pool(), CreateTag::root(name))
            .await
            .expect("Failed to create test tag")
    }

    pub async fn smart_playlist(&self, owner: UserId, name: &str, rules: Value) -> Playlist {
        soul_storage::playlists::create(self.pool(), CreatePlaylist::smart(owner, name, rules))
            .await
            .expect("Failed to create smart playlist")
    }

    pub async fn playlist(&self, id: &PlaylistId) -> Playlist {
        soul_storage::playlists::get_by_id(self.pool(), id)
            .await
            .expect("Failed to load playlist")
            .expect("Playlist missing")
    }

    /// Membership rows as (song, position), in position order
    pub async fn members(&self, id: &PlaylistId) -> Vec<(SongId, i64)> {
        soul_storage::membership::songs(self.pool(), id)
            .await
            .expect("Failed to load membership")
            .into_iter()
            .map(|row| (row.song_id, row.position))
            .collect()
    }

    pub async fn member_ids(&self, id: &PlaylistId) -> Vec<SongId> {
        self.members(id).await.into_iter().map(|(song, _)| song).collect()
    }

    /// Pretend the rules were set and the snapshot taken `age` ago
    pub async fn backdate(&self, id: &PlaylistId, age: Duration) {
        let then = (soul_core::time::now() - age).to_rfc3339_opts(SecondsFormat::Micros, true);
        sqlx::query("UPDATE playlists SET rules_changed_at = ?, materialized_at = ? WHERE id = ?")
            .bind(&then)
            .bind(&then)
            .bind(id)
            .execute(self.pool())
            .await
            .expect("Failed to backdate playlist");
    }
}

pub fn clause(field: &str, operator: &str, value: Value) -> Value {
    json!({ "field": field, "operator": operator, "value": value })
}

pub fn group(logic: &str, clauses: Vec<Value>) -> Value {
    json!({ "logic": logic, "rules": clauses })
}

/// A rule document with a single AND group
pub fn all_of(clauses: Vec<Value>) -> Value {
    json!([group("and", clauses)])
}

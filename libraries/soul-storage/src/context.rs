use crate::{catalog, membership, playlists};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use soul_core::{
    error::Result,
    storage::{LibraryCatalog, PlaylistStore},
    types::*,
};
use sqlx::SqlitePool;

/// Local storage context using `SQLite`
#[derive(Clone)]
pub struct LocalStorageContext {
    pool: SqlitePool,
}

impl LocalStorageContext {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LibraryCatalog for LocalStorageContext {
    async fn scan_song_facts(
        &self,
        user: UserId,
        after: Option<SongId>,
        limit: usize,
    ) -> Result<Vec<SongFacts>> {
        catalog::scan(&self.pool, user, after, limit).await
    }

    async fn song_facts(&self, song: SongId, user: UserId) -> Result<Option<SongFacts>> {
        catalog::facts(&self.pool, song, user).await
    }
}

#[async_trait]
impl PlaylistStore for LocalStorageContext {
    // Playlists
    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        playlists::get_by_id(&self.pool, id).await
    }

    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist> {
        playlists::create(&self.pool, playlist).await
    }

    async fn update_rules(&self, id: &PlaylistId, rules: serde_json::Value) -> Result<Playlist> {
        playlists::update_rules(&self.pool, id, &rules).await
    }

    async fn all_smart_playlists(&self) -> Result<Vec<Playlist>> {
        playlists::all_smart(&self.pool).await
    }

    async fn materialized_smart_playlists(&self, owner: Option<UserId>) -> Result<Vec<Playlist>> {
        playlists::materialized_smart(&self.pool, owner).await
    }

    async fn smart_playlists_needing_refresh(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Playlist>> {
        playlists::needing_refresh(&self.pool, stale_before).await
    }

    // Membership
    async fn playlist_songs(&self, id: &PlaylistId) -> Result<Vec<PlaylistSong>> {
        membership::songs(&self.pool, id).await
    }

    async fn replace_membership(
        &self,
        id: &PlaylistId,
        songs: &[SongId],
        materialized_at: DateTime<Utc>,
    ) -> Result<()> {
        membership::replace(&self.pool, id, songs, materialized_at).await
    }

    async fn apply_membership(
        &self,
        id: &PlaylistId,
        song: SongId,
        member: bool,
    ) -> Result<MembershipChange> {
        membership::apply(&self.pool, id, song, member).await
    }

    async fn detach_song_from_smart_playlists(&self, song: SongId) -> Result<Vec<PlaylistId>> {
        membership::detach_from_smart(&self.pool, song).await
    }
}

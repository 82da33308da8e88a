//! Storage seams for the smart playlist engine
//!
//! The engine only talks to storage through these traits so it can run against
//! the `SQLite` backend or an in-memory fake in tests.

use crate::error::Result;
use crate::types::{
    CreatePlaylist, MembershipChange, Playlist, PlaylistId, PlaylistSong, SongFacts, SongId, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read access to the library from one user's point of view
#[async_trait]
pub trait LibraryCatalog: Send + Sync {
    /// Page through every song in ascending ID order
    ///
    /// Returns up to `limit` songs with an ID greater than `after`, each with
    /// tags, the user's favorite flag, and the user's interaction loaded.
    async fn scan_song_facts(
        &self,
        user: UserId,
        after: Option<SongId>,
        limit: usize,
    ) -> Result<Vec<SongFacts>>;

    /// Facts for a single song, `None` if the song does not exist
    async fn song_facts(&self, song: SongId, user: UserId) -> Result<Option<SongFacts>>;
}

/// Playlists and their membership rows
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    // ========================================================================
    // Playlists
    // ========================================================================

    /// Get playlist by ID
    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    /// Create a new playlist
    ///
    /// Smart playlists start with `rules_changed_at` set and no snapshot.
    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist>;

    /// Replace the rule document of a smart playlist and bump `rules_changed_at`
    async fn update_rules(&self, id: &PlaylistId, rules: serde_json::Value) -> Result<Playlist>;

    /// Every smart playlist
    async fn all_smart_playlists(&self) -> Result<Vec<Playlist>>;

    /// Smart playlists that have a snapshot, optionally limited to one owner
    async fn materialized_smart_playlists(&self, owner: Option<UserId>) -> Result<Vec<Playlist>>;

    /// Smart playlists never materialized, materialized before their latest
    /// rule edit, or materialized before `stale_before`
    async fn smart_playlists_needing_refresh(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Playlist>>;

    // ========================================================================
    // Membership
    // ========================================================================

    /// Membership rows ordered by position
    async fn playlist_songs(&self, id: &PlaylistId) -> Result<Vec<PlaylistSong>>;

    /// Atomically replace all membership rows and stamp `materialized_at`
    ///
    /// Positions follow the order of `songs`, starting at 0. Readers see either
    /// the old rows or the new rows, never a mix.
    async fn replace_membership(
        &self,
        id: &PlaylistId,
        songs: &[SongId],
        materialized_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Make one song a member or non-member of a playlist
    ///
    /// New members are appended after the current last position.
    async fn apply_membership(
        &self,
        id: &PlaylistId,
        song: SongId,
        member: bool,
    ) -> Result<MembershipChange>;

    /// Remove a song from every smart playlist, returning the playlists touched
    async fn detach_song_from_smart_playlists(&self, song: SongId) -> Result<Vec<PlaylistId>>;
}

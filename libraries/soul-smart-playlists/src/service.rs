//! Read path and entry points for the mutation layer
//!
//! [`SmartPlaylistService`] answers "which songs are in this playlist" from the
//! materialized snapshot when it is fresh and owned by the reader, and
//! evaluates the rules on the fly otherwise. [`SmartPlaylistTriggers`] turns
//! committed library mutations into background jobs.

use crate::engine::SmartPlaylistEngine;
use crate::error::{Result, SmartPlaylistError};
use crate::rules::RuleSet;
use crate::state::MaterializationState;
use crate::worker::{JobSink, SmartPlaylistJob};
use soul_core::types::{CreatePlaylist, Interaction, Playlist, PlaylistId, SongId, UserId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct SmartPlaylistService {
    engine: Arc<SmartPlaylistEngine>,
}

impl SmartPlaylistService {
    pub fn new(engine: Arc<SmartPlaylistEngine>) -> Self {
        Self { engine }
    }

    async fn playlist(&self, id: &PlaylistId) -> Result<Playlist> {
        self.engine
            .store()
            .get_playlist(id)
            .await?
            .ok_or_else(|| SmartPlaylistError::NotFound(id.clone()))
    }

    fn state_of(&self, playlist: &Playlist) -> MaterializationState {
        MaterializationState::of(
            playlist,
            self.engine.materializer().is_materializing(&playlist.id),
            self.engine.config().stale_after(),
            soul_core::time::now(),
        )
    }

    /// Current materialization state of a smart playlist
    pub async fn state(&self, id: &PlaylistId) -> Result<MaterializationState> {
        let playlist = self.playlist(id).await?;
        Ok(self.state_of(&playlist))
    }

    /// Songs of a playlist as seen by `user`, in position order
    pub async fn songs(&self, id: &PlaylistId, user: UserId) -> Result<Vec<SongId>> {
        let playlist = self.playlist(id).await?;

        if !playlist.is_smart {
            return self.cached(id).await;
        }

        if playlist.owner_id == user && self.state_of(&playlist).is_fresh() {
            match self.cached(id).await {
                Ok(songs) => return Ok(songs),
                Err(e) => {
                    warn!(playlist_id = %id, error = %e, "Cached membership unreadable, evaluating");
                }
            }
        }

        self.dynamic(&playlist, user).await
    }

    /// Number of songs [`songs`](Self::songs) would return
    pub async fn count(&self, id: &PlaylistId, user: UserId) -> Result<usize> {
        Ok(self.songs(id, user).await?.len())
    }

    async fn cached(&self, id: &PlaylistId) -> Result<Vec<SongId>> {
        let rows = self.engine.store().playlist_songs(id).await?;
        Ok(rows.into_iter().map(|row| row.song_id).collect())
    }

    async fn dynamic(&self, playlist: &Playlist, user: UserId) -> Result<Vec<SongId>> {
        let rules = match RuleSet::from_stored(playlist.rules.as_ref()) {
            Ok(rules) => rules,
            Err(e) => {
                error!(playlist_id = %playlist.id, error = %e, "Invalid rules, playlist matches nothing");
                return Ok(Vec::new());
            }
        };

        debug!(playlist_id = %playlist.id, user_id = %user, "Evaluating smart playlist");
        self.engine
            .evaluator()
            .evaluate_ids_at(&rules, user, soul_core::time::now())
            .await
    }

    /// Create a smart playlist and schedule its first materialization
    ///
    /// Invalid rules are rejected before anything is stored.
    pub async fn create_smart_playlist(
        &self,
        owner: UserId,
        name: impl Into<String>,
        rules: serde_json::Value,
    ) -> Result<Playlist> {
        RuleSet::parse(&rules)?;

        let playlist = self
            .engine
            .store()
            .create_playlist(CreatePlaylist::smart(owner, name, rules))
            .await?;

        info!(playlist_id = %playlist.id, owner_id = %owner, "Created smart playlist");
        self.refresh(&playlist.id)?;
        Ok(playlist)
    }

    /// Replace the rules of a smart playlist and schedule a rematerialization
    pub async fn update_rules(&self, id: &PlaylistId, rules: serde_json::Value) -> Result<Playlist> {
        RuleSet::parse(&rules)?;

        let playlist = self.engine.store().update_rules(id, rules).await?;
        info!(playlist_id = %id, "Smart playlist rules changed");
        self.refresh(id)?;
        Ok(playlist)
    }

    /// Schedule a full rematerialization of `id`
    pub fn refresh(&self, id: &PlaylistId) -> Result<()> {
        self.engine
            .sink()
            .schedule(SmartPlaylistJob::Materialize(id.clone()))
    }
}

/// Hooks the mutation layer calls after a successful commit
///
/// Each call only enqueues a job, so it never blocks on rule evaluation.
#[derive(Clone)]
pub struct SmartPlaylistTriggers {
    sink: Arc<dyn JobSink>,
}

impl SmartPlaylistTriggers {
    pub fn new(sink: Arc<dyn JobSink>) -> Self {
        Self { sink }
    }

    /// A song was created, edited, retagged or deleted
    pub fn on_song_changed(&self, song: SongId, removing: bool) -> Result<()> {
        self.sink
            .schedule(SmartPlaylistJob::SongChanged { song, removing })
    }

    pub fn on_favorite_changed(&self, user: UserId, song: SongId) -> Result<()> {
        self.sink
            .schedule(SmartPlaylistJob::FavoriteChanged { user, song })
    }

    pub fn on_interaction_changed(&self, interaction: &Interaction) -> Result<()> {
        self.sink.schedule(SmartPlaylistJob::InteractionChanged {
            user: interaction.user_id,
            song: interaction.song_id,
        })
    }
}

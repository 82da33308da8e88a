//! Incremental updaters
//!
//! Each trigger re-tests one song against the materialized smart playlists
//! that the change can affect and adds or removes that one membership row.
//! Unmaterialized playlists are skipped; reads evaluate them dynamically.

use crate::error::{Result, SmartPlaylistError};
use crate::evaluator::RuleEvaluator;
use crate::inflight::InFlight;
use crate::locks::KeyedLocks;
use crate::retry::RetryPolicy;
use crate::rules::RuleSet;
use chrono::{DateTime, Utc};
use soul_core::storage::PlaylistStore;
use soul_core::types::{MembershipChange, Playlist, PlaylistId, SongId, UserId};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Outcome of one trigger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Playlists whose rules were tested against the song
    pub examined: usize,
    pub added: Vec<PlaylistId>,
    pub removed: Vec<PlaylistId>,
    /// Playlists mid-materialization; their rerun picks up the change
    pub deferred: Vec<PlaylistId>,
    /// Playlists left for the sweeper after retries ran out
    pub failed: Vec<PlaylistId>,
}

impl UpdateReport {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Which playlists a change can affect
#[derive(Debug, Clone, Copy)]
enum Scope {
    /// Song attributes or tags: every owner
    Song,
    /// A favorite toggle by this owner
    Favorite(UserId),
    /// A play recorded by this owner
    Interaction(UserId),
}

impl Scope {
    fn owner(self) -> Option<UserId> {
        match self {
            Self::Song => None,
            Self::Favorite(user) | Self::Interaction(user) => Some(user),
        }
    }

    fn affects(self, rules: &RuleSet) -> bool {
        match self {
            Self::Song => true,
            Self::Favorite(_) => rules.references_favorites(),
            Self::Interaction(_) => rules.references_interactions(),
        }
    }
}

pub struct IncrementalUpdater {
    store: Arc<dyn PlaylistStore>,
    evaluator: RuleEvaluator,
    in_flight: InFlight<PlaylistId>,
    song_locks: KeyedLocks<SongId>,
    retry: RetryPolicy,
}

impl IncrementalUpdater {
    pub(crate) fn new(
        store: Arc<dyn PlaylistStore>,
        evaluator: RuleEvaluator,
        in_flight: InFlight<PlaylistId>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            evaluator,
            in_flight,
            song_locks: KeyedLocks::new(),
            retry,
        }
    }

    /// A song was created, edited, retagged or (with `removing`) deleted
    #[instrument(skip_all, fields(song_id = %song, removing = removing))]
    pub async fn on_song_changed(&self, song: SongId, removing: bool) -> Result<UpdateReport> {
        let _lock = self.song_locks.lock(song).await;

        if removing {
            let removed = self
                .retry
                .run("detach song", move || async move {
                    Ok(self.store.detach_song_from_smart_playlists(song).await?)
                })
                .await?;
            debug!(playlists = removed.len(), "Detached removed song");
            return Ok(UpdateReport {
                removed,
                ..UpdateReport::default()
            });
        }

        self.update(song, Scope::Song).await
    }

    /// `user` favorited or unfavorited `song`
    #[instrument(skip_all, fields(user_id = %user, song_id = %song))]
    pub async fn on_favorite_changed(&self, user: UserId, song: SongId) -> Result<UpdateReport> {
        let _lock = self.song_locks.lock(song).await;
        self.update(song, Scope::Favorite(user)).await
    }

    /// `user` played `song`
    #[instrument(skip_all, fields(user_id = %user, song_id = %song))]
    pub async fn on_interaction_changed(&self, user: UserId, song: SongId) -> Result<UpdateReport> {
        let _lock = self.song_locks.lock(song).await;
        self.update(song, Scope::Interaction(user)).await
    }

    async fn update(&self, song: SongId, scope: Scope) -> Result<UpdateReport> {
        let owner = scope.owner();
        let playlists = self
            .retry
            .run("list materialized playlists", move || async move {
                Ok(self.store.materialized_smart_playlists(owner).await?)
            })
            .await?;

        let now = soul_core::time::now();
        let mut report = UpdateReport::default();

        for playlist in playlists {
            let rules = match RuleSet::from_stored(playlist.rules.as_ref()) {
                Ok(rules) => rules,
                Err(e) => {
                    // Materialized empty; stays that way until the rules are fixed.
                    debug!(playlist_id = %playlist.id, error = %e, "Skipping playlist with invalid rules");
                    continue;
                }
            };
            if !scope.affects(&rules) {
                continue;
            }
            report.examined += 1;

            if self.in_flight.request_rerun(&playlist.id) {
                debug!(playlist_id = %playlist.id, "Playlist is materializing, deferring to rerun");
                report.deferred.push(playlist.id);
                continue;
            }

            let change = self
                .retry
                .run("apply membership", || self.apply(&playlist, &rules, song, now))
                .await;

            match change {
                Ok(MembershipChange::Added { position }) => {
                    debug!(playlist_id = %playlist.id, position, "Song added");
                    report.added.push(playlist.id);
                }
                Ok(MembershipChange::Removed) => {
                    debug!(playlist_id = %playlist.id, "Song removed");
                    report.removed.push(playlist.id);
                }
                Ok(MembershipChange::Unchanged) => {}
                // Deleted between listing and applying
                Err(SmartPlaylistError::NotFound(_)) => {}
                Err(e) if e.is_transient() => {
                    warn!(playlist_id = %playlist.id, error = %e, "Incremental update abandoned");
                    report.failed.push(playlist.id);
                }
                Err(e) => {
                    error!(playlist_id = %playlist.id, error = %e, "Incremental update failed");
                    report.failed.push(playlist.id);
                }
            }
        }

        Ok(report)
    }

    async fn apply(
        &self,
        playlist: &Playlist,
        rules: &RuleSet,
        song: SongId,
        now: DateTime<Utc>,
    ) -> Result<MembershipChange> {
        let member = self
            .evaluator
            .matches_at(rules, song, playlist.owner_id, now)
            .await?;
        Ok(self
            .store
            .apply_membership(&playlist.id, song, member)
            .await?)
    }
}

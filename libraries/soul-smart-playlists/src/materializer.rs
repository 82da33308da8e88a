//! Full materialization
//!
//! Re-evaluates a smart playlist for its owner and swaps the stored membership
//! in one transaction. Runs for the same playlist never overlap; a request that
//! arrives mid-run is folded into one extra pass.

use crate::error::{Result, SmartPlaylistError};
use crate::evaluator::RuleEvaluator;
use crate::inflight::{Claim, InFlight};
use crate::retry::RetryPolicy;
use crate::rules::{RuleError, RuleSet};
use chrono::{DateTime, Utc};
use soul_core::storage::PlaylistStore;
use soul_core::types::PlaylistId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// What a `materialize` call did
#[derive(Debug, Clone, PartialEq)]
pub enum MaterializeOutcome {
    /// Not a smart playlist; nothing to do
    Skipped,
    /// Membership replaced
    Materialized { members: usize, at: DateTime<Utc> },
    /// Rules are invalid; membership cleared so the playlist matches nothing
    FailedClosed { error: RuleError, at: DateTime<Utc> },
    /// Another run for this playlist is in flight and will pass again
    Coalesced,
}

pub struct Materializer {
    store: Arc<dyn PlaylistStore>,
    evaluator: RuleEvaluator,
    in_flight: InFlight<PlaylistId>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Materializer {
    pub fn new(
        store: Arc<dyn PlaylistStore>,
        evaluator: RuleEvaluator,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            evaluator,
            in_flight: InFlight::new(),
            timeout,
            retry,
        }
    }

    pub(crate) fn in_flight(&self) -> &InFlight<PlaylistId> {
        &self.in_flight
    }

    /// Whether a run for `id` is in progress
    pub fn is_materializing(&self, id: &PlaylistId) -> bool {
        self.in_flight.contains(id)
    }

    /// Recompute and store the membership of `id`
    #[instrument(skip_all, fields(playlist_id = %id))]
    pub async fn materialize(&self, id: &PlaylistId) -> Result<MaterializeOutcome> {
        let mut guard = match self.in_flight.claim(id.clone()) {
            Claim::Acquired(guard) => guard,
            Claim::Coalesced => {
                debug!("Materialization already running, coalesced");
                return Ok(MaterializeOutcome::Coalesced);
            }
        };

        let mut rerunning = false;
        loop {
            let outcome = match self
                .retry
                .run("materialize", || self.attempt_with_timeout(id))
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    if guard.abandon() || rerunning {
                        warn!(
                            error = %e,
                            "Materialization failed with deferred changes pending, \
                             membership may lag until the playlist goes stale"
                        );
                    }
                    return Err(e);
                }
            };

            if !guard.finish_or_rerun() {
                return Ok(outcome);
            }
            rerunning = true;
            debug!("Rerun requested during materialization");
        }
    }

    async fn attempt_with_timeout(&self, id: &PlaylistId) -> Result<MaterializeOutcome> {
        tokio::time::timeout(self.timeout, self.attempt(id))
            .await
            .map_err(|_| SmartPlaylistError::Timeout(id.clone()))?
    }

    async fn attempt(&self, id: &PlaylistId) -> Result<MaterializeOutcome> {
        let playlist = self
            .store
            .get_playlist(id)
            .await?
            .ok_or_else(|| SmartPlaylistError::NotFound(id.clone()))?;

        if !playlist.is_smart {
            debug!("Not a smart playlist, skipping");
            return Ok(MaterializeOutcome::Skipped);
        }

        let at = soul_core::time::now();
        match RuleSet::from_stored(playlist.rules.as_ref()) {
            Ok(rules) => {
                let songs = self
                    .evaluator
                    .evaluate_ids_at(&rules, playlist.owner_id, at)
                    .await?;
                self.store.replace_membership(id, &songs, at).await?;

                info!(members = songs.len(), "Materialized smart playlist");
                Ok(MaterializeOutcome::Materialized {
                    members: songs.len(),
                    at,
                })
            }
            Err(rule_error) => {
                error!(error = %rule_error, "Invalid rules, playlist will match nothing");
                self.store.replace_membership(id, &[], at).await?;
                Ok(MaterializeOutcome::FailedClosed {
                    error: rule_error,
                    at,
                })
            }
        }
    }
}

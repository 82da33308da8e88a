//! Staleness sweeper
//!
//! Periodically schedules full rematerialization for smart playlists that were
//! never materialized, were edited after their last snapshot, or have a
//! snapshot older than the staleness window. This is the backstop for missed
//! triggers and abandoned retries.

use crate::error::Result;
use crate::worker::{JobSink, SmartPlaylistJob};
use chrono::Duration;
use soul_core::storage::PlaylistStore;
use soul_core::types::{Playlist, PlaylistId};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Playlists scheduled by one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scheduled: Vec<PlaylistId>,
}

pub struct Sweeper {
    store: Arc<dyn PlaylistStore>,
    sink: Arc<dyn JobSink>,
}

impl Sweeper {
    pub fn new(store: Arc<dyn PlaylistStore>, sink: Arc<dyn JobSink>) -> Self {
        Self { store, sink }
    }

    /// Schedule a materialization for every playlist needing one
    pub async fn sweep(&self, stale_after: Duration) -> Result<SweepReport> {
        let stale_before = soul_core::time::now() - stale_after;
        let due = self.store.smart_playlists_needing_refresh(stale_before).await?;
        let report = self.schedule_all(due)?;

        info!(
            scheduled = report.scheduled.len(),
            stale_after_hours = stale_after.num_hours(),
            "Sweep complete"
        );
        Ok(report)
    }

    /// Schedule a materialization for every smart playlist
    pub async fn rematerialize_all(&self) -> Result<SweepReport> {
        let all = self.store.all_smart_playlists().await?;
        let report = self.schedule_all(all)?;
        info!(scheduled = report.scheduled.len(), "Scheduled rematerialization of all smart playlists");
        Ok(report)
    }

    fn schedule_all(&self, playlists: Vec<Playlist>) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        for playlist in playlists {
            self.sink
                .schedule(SmartPlaylistJob::Materialize(playlist.id.clone()))?;
            report.scheduled.push(playlist.id);
        }
        Ok(report)
    }

    /// Sweep every `interval` until `shutdown` flips to true
    pub async fn run(
        &self,
        interval: std::time::Duration,
        stale_after: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = interval.as_secs(), "Sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep(stale_after).await {
                        error!(error = %e, "Sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Sweeper stopped");
    }
}

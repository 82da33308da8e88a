use crate::config::SmartPlaylistConfig;
use crate::error::Result;
use crate::evaluator::RuleEvaluator;
use crate::incremental::IncrementalUpdater;
use crate::materializer::Materializer;
use crate::retry::RetryPolicy;
use crate::sweeper::Sweeper;
use crate::worker::{JobSink, SmartPlaylistJob};
use soul_core::storage::{LibraryCatalog, PlaylistStore};
use std::sync::Arc;

/// The smart playlist components wired to one storage backend
pub struct SmartPlaylistEngine {
    store: Arc<dyn PlaylistStore>,
    evaluator: RuleEvaluator,
    materializer: Materializer,
    updater: IncrementalUpdater,
    sweeper: Sweeper,
    sink: Arc<dyn JobSink>,
    config: SmartPlaylistConfig,
}

impl SmartPlaylistEngine {
    pub fn new(
        catalog: Arc<dyn LibraryCatalog>,
        store: Arc<dyn PlaylistStore>,
        sink: Arc<dyn JobSink>,
        config: SmartPlaylistConfig,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);
        let evaluator = RuleEvaluator::new(catalog, config.scan_chunk_size);
        let materializer = Materializer::new(
            Arc::clone(&store),
            evaluator.clone(),
            config.materialize_timeout(),
            retry.clone(),
        );
        let updater = IncrementalUpdater::new(
            Arc::clone(&store),
            evaluator.clone(),
            materializer.in_flight().clone(),
            retry,
        );
        let sweeper = Sweeper::new(Arc::clone(&store), Arc::clone(&sink));

        Self {
            store,
            evaluator,
            materializer,
            updater,
            sweeper,
            sink,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn PlaylistStore> {
        &self.store
    }

    pub fn evaluator(&self) -> &RuleEvaluator {
        &self.evaluator
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    pub fn updater(&self) -> &IncrementalUpdater {
        &self.updater
    }

    pub fn sweeper(&self) -> &Sweeper {
        &self.sweeper
    }

    pub fn sink(&self) -> &Arc<dyn JobSink> {
        &self.sink
    }

    pub fn config(&self) -> &SmartPlaylistConfig {
        &self.config
    }

    /// Run one job to completion
    pub async fn run_job(&self, job: SmartPlaylistJob) -> Result<()> {
        match job {
            SmartPlaylistJob::Materialize(id) => {
                self.materializer.materialize(&id).await?;
            }
            SmartPlaylistJob::SongChanged { song, removing } => {
                self.updater.on_song_changed(song, removing).await?;
            }
            SmartPlaylistJob::FavoriteChanged { user, song } => {
                self.updater.on_favorite_changed(user, song).await?;
            }
            SmartPlaylistJob::InteractionChanged { user, song } => {
                self.updater.on_interaction_changed(user, song).await?;
            }
            SmartPlaylistJob::Sweep { stale_after } => {
                self.sweeper.sweep(stale_after).await?;
            }
        }
        Ok(())
    }
}

//! Background job queue and worker pool
//!
//! Triggers and the sweeper enqueue [`SmartPlaylistJob`]s and return at once.
//! A fixed number of worker tasks drain the queue and run each job against
//! the engine.

use crate::engine::SmartPlaylistEngine;
use crate::error::{Result, SmartPlaylistError};
use chrono::Duration;
use soul_core::types::{PlaylistId, SongId, UserId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};

/// Unit of background work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmartPlaylistJob {
    Materialize(PlaylistId),
    SongChanged { song: SongId, removing: bool },
    FavoriteChanged { user: UserId, song: SongId },
    InteractionChanged { user: UserId, song: SongId },
    Sweep { stale_after: Duration },
}

/// Destination for scheduled jobs
pub trait JobSink: Send + Sync {
    fn schedule(&self, job: SmartPlaylistJob) -> Result<()>;
}

#[derive(Default)]
struct Outstanding {
    count: AtomicUsize,
    idle: Notify,
}

impl Outstanding {
    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Sending half of the job channel
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<SmartPlaylistJob>,
    outstanding: Arc<Outstanding>,
}

/// Receiving half, consumed by [`WorkerPool::spawn`]
pub struct JobReceiver {
    receiver: mpsc::UnboundedReceiver<SmartPlaylistJob>,
    outstanding: Arc<Outstanding>,
}

/// Create a connected queue and receiver
pub fn job_queue() -> (JobQueue, JobReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let outstanding = Arc::new(Outstanding::default());
    (
        JobQueue {
            sender,
            outstanding: Arc::clone(&outstanding),
        },
        JobReceiver {
            receiver,
            outstanding,
        },
    )
}

impl JobQueue {
    /// Jobs enqueued or running
    pub fn pending(&self) -> usize {
        self.outstanding.count.load(Ordering::Acquire)
    }

    /// Wait until every enqueued job, including jobs those jobs enqueue, has run
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.outstanding.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            idle.await;
        }
    }
}

impl JobSink for JobQueue {
    fn schedule(&self, job: SmartPlaylistJob) -> Result<()> {
        self.outstanding.count.fetch_add(1, Ordering::AcqRel);
        debug!(?job, "Enqueued smart playlist job");
        self.sender.send(job).map_err(|_| {
            self.outstanding.finish();
            SmartPlaylistError::QueueClosed
        })
    }
}

/// Worker tasks draining a [`JobReceiver`]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `workers` tasks; they stop when `shutdown` flips to true or every
    /// [`JobQueue`] is dropped
    pub fn spawn(
        engine: Arc<SmartPlaylistEngine>,
        receiver: JobReceiver,
        workers: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let outstanding = Arc::clone(&receiver.outstanding);
        let receiver = Arc::new(Mutex::new(receiver.receiver));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let engine = Arc::clone(&engine);
                let receiver = Arc::clone(&receiver);
                let outstanding = Arc::clone(&outstanding);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    info!(worker_id, "Smart playlist worker started");
                    worker_loop(worker_id, &engine, &receiver, &outstanding, shutdown).await;
                    info!(worker_id, "Smart playlist worker stopped");
                })
            })
            .collect();

        Self { handles }
    }

    /// Wait for every worker to stop
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Smart playlist worker panicked");
            }
        }
    }
}

async fn next_job(
    receiver: &Mutex<mpsc::UnboundedReceiver<SmartPlaylistJob>>,
) -> Option<SmartPlaylistJob> {
    receiver.lock().await.recv().await
}

async fn worker_loop(
    worker_id: usize,
    engine: &SmartPlaylistEngine,
    receiver: &Mutex<mpsc::UnboundedReceiver<SmartPlaylistJob>>,
    outstanding: &Outstanding,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let job = tokio::select! {
            job = next_job(receiver) => job,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        let Some(job) = job else {
            break;
        };

        let span = tracing::info_span!("smart_playlist_job", worker_id);
        if let Err(e) = engine.run_job(job.clone()).instrument(span).await {
            // Retries already ran; the sweeper picks up whatever was left behind.
            error!(worker_id, ?job, error = %e, "Smart playlist job failed");
        }
        outstanding.finish();
    }
}

//! Soul Player - Smart Playlists
//!
//! Rule-driven playlists whose membership is computed from song attributes,
//! tags and the owner's listening history.
//!
//! This crate provides:
//! - Rule model and parser (AND/OR groups of typed clauses)
//! - Rule evaluator (dynamic, user-scoped, chunked catalog scan)
//! - Materializer (full recompute, atomic membership swap, coalescing)
//! - Incremental updaters (one song, one favorite, one play)
//! - Staleness sweeper (periodic backstop)
//! - Background worker pool and read path service
//!
//! # Architecture
//!
//! `soul-smart-playlists` never talks to a database directly. Storage is
//! reached through the [`LibraryCatalog`](soul_core::storage::LibraryCatalog)
//! and [`PlaylistStore`](soul_core::storage::PlaylistStore) traits, which
//! `soul-storage` implements for `SQLite`.
//!
//! # Example
//!
//! ```rust,no_run
//! use soul_smart_playlists::{
//!     job_queue, SmartPlaylistConfig, SmartPlaylistEngine, SmartPlaylistService, WorkerPool,
//! };
//! use soul_storage::{create_pool, run_migrations, LocalStorageContext};
//! use soul_core::types::UserId;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://soul.db").await?;
//! run_migrations(&pool).await?;
//! let storage = Arc::new(LocalStorageContext::new(pool));
//!
//! let config = SmartPlaylistConfig::default();
//! let (queue, receiver) = job_queue();
//! let engine = Arc::new(SmartPlaylistEngine::new(
//!     storage.clone(),
//!     storage,
//!     Arc::new(queue.clone()),
//!     config.clone(),
//! ));
//!
//! let (_shutdown, shutdown_rx) = tokio::sync::watch::channel(false);
//! let _pool = WorkerPool::spawn(engine.clone(), receiver, config.workers, shutdown_rx);
//!
//! let service = SmartPlaylistService::new(engine);
//! let rules = serde_json::json!([
//!     { "logic": "and", "rules": [{ "field": "genre", "operator": "is", "value": "Jazz" }] }
//! ]);
//! let playlist = service.create_smart_playlist(UserId::new(1), "Jazz", rules).await?;
//!
//! queue.wait_idle().await;
//! let songs = service.songs(&playlist.id, UserId::new(1)).await?;
//! println!("{} songs", songs.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod incremental;
mod inflight;
mod locks;
pub mod materializer;
pub mod retry;
pub mod rules;
pub mod service;
pub mod state;
pub mod sweeper;
pub mod worker;

pub use config::{RetryConfig, SmartPlaylistConfig};
pub use engine::SmartPlaylistEngine;
pub use error::{Result, SmartPlaylistError};
pub use evaluator::RuleEvaluator;
pub use incremental::{IncrementalUpdater, UpdateReport};
pub use materializer::{MaterializeOutcome, Materializer};
pub use retry::RetryPolicy;
pub use rules::{Clause, Logic, RuleError, RuleGroup, RuleSet};
pub use service::{SmartPlaylistService, SmartPlaylistTriggers};
pub use state::{MaterializationState, StaleReason};
pub use sweeper::{SweepReport, Sweeper};
pub use worker::{job_queue, JobQueue, JobReceiver, JobSink, SmartPlaylistJob, WorkerPool};

//! Rule evaluator
//!
//! `evaluate` pages through the catalog in bounded chunks and keeps the songs
//! that satisfy the rules; `matches` tests a single song. Both apply
//! [`RuleSet::matches`] to the same user-scoped [`SongFacts`], so a song is
//! in `evaluate`'s output exactly when `matches` says so.

use crate::error::Result;
use crate::rules::RuleSet;
use chrono::{DateTime, Utc};
use soul_core::storage::LibraryCatalog;
use soul_core::types::{Song, SongFacts, SongId, UserId};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct RuleEvaluator {
    catalog: Arc<dyn LibraryCatalog>,
    chunk_size: usize,
}

impl RuleEvaluator {
    pub fn new(catalog: Arc<dyn LibraryCatalog>, chunk_size: usize) -> Self {
        Self {
            catalog,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Songs matching `rules` for `user`, in ascending song id order
    pub async fn evaluate(&self, rules: &RuleSet, user: UserId) -> Result<Vec<Song>> {
        self.evaluate_at(rules, user, soul_core::time::now()).await
    }

    pub async fn evaluate_at(
        &self,
        rules: &RuleSet,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Song>> {
        let mut songs = Vec::new();
        self.scan(rules, user, now, |facts| songs.push(facts.song)).await?;
        Ok(songs)
    }

    /// IDs of the songs matching `rules` for `user`, in ascending order
    pub async fn evaluate_ids_at(
        &self,
        rules: &RuleSet,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SongId>> {
        let mut ids = Vec::new();
        self.scan(rules, user, now, |facts| ids.push(facts.song.id)).await?;
        Ok(ids)
    }

    async fn scan(
        &self,
        rules: &RuleSet,
        user: UserId,
        now: DateTime<Utc>,
        mut keep: impl FnMut(SongFacts),
    ) -> Result<()> {
        if rules.is_empty() {
            return Ok(());
        }

        let mut after = None;
        let mut scanned = 0usize;
        loop {
            let page = self
                .catalog
                .scan_song_facts(user, after, self.chunk_size)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id());
            let full = page.len() == self.chunk_size;
            scanned += page.len();

            for facts in page {
                if rules.matches(&facts, now) {
                    keep(facts);
                }
            }

            if !full {
                break;
            }
        }

        debug!(user_id = %user, scanned, "Evaluated rules over catalog");
        Ok(())
    }

    /// Whether one song matches `rules` for `user`; a missing song never matches
    pub async fn matches(&self, rules: &RuleSet, song: SongId, user: UserId) -> Result<bool> {
        self.matches_at(rules, song, user, soul_core::time::now()).await
    }

    pub async fn matches_at(
        &self,
        rules: &RuleSet,
        song: SongId,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if rules.is_empty() {
            return Ok(false);
        }
        let facts = self.catalog.song_facts(song, user).await?;
        Ok(facts.is_some_and(|facts| rules.matches(&facts, now)))
    }
}

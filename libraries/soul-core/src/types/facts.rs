//! User-scoped song snapshot
//!
//! Everything a rule may look at for one song from one user's point of view.
//! Both the full scan and the single-song check evaluate rules against this
//! type, so they cannot disagree.

use super::{Interaction, Song, SongId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A song plus the owning user's favorite flag and interaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongFacts {
    /// The song with its tags loaded
    pub song: Song,

    /// Whether the user has favorited the song
    pub is_favorite: bool,

    /// Play statistics, absent when the user never interacted with the song
    pub interaction: Option<Interaction>,
}

impl SongFacts {
    /// Song ID
    pub fn id(&self) -> SongId {
        self.song.id
    }

    /// Play count, zero when the user never played the song
    pub fn play_count(&self) -> i64 {
        self.interaction.as_ref().map_or(0, |i| i.play_count)
    }

    /// Last play time, if the user has an interaction with one
    pub fn last_played_at(&self) -> Option<DateTime<Utc>> {
        self.interaction.as_ref().and_then(|i| i.last_played_at)
    }
}

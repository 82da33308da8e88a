/// Per-user listening facts
use super::{SongId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A song marked as favorite by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    /// User who favorited the song
    pub user_id: UserId,

    /// Favorited song
    pub song_id: SongId,

    /// When the favorite was recorded
    pub created_at: DateTime<Utc>,
}

/// Play statistics for one (user, song) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Listening user
    pub user_id: UserId,

    /// Played song
    pub song_id: SongId,

    /// Number of recorded plays
    pub play_count: i64,

    /// Time of the most recent play, if any
    pub last_played_at: Option<DateTime<Utc>>,
}

//! Song types
//!
//! Songs carry the attributes rules can match on. Per-user facts (favorites,
//! play counts) live in [`SongFacts`](super::SongFacts).

use super::{SongId, Tag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Song in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist_name: Option<String>, // Denormalized
    pub album_name: Option<String>,  // Denormalized
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub length_seconds: Option<f64>,
    /// Container or codec name, e.g. "flac"
    pub audio_format: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Tags attached to the song (populated when needed)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<Tag>,
}

/// Data for creating a new song
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSong {
    pub title: String,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub length_seconds: Option<f64>,
    pub audio_format: Option<String>,
    /// Overrides the creation time (imports, tests)
    pub created_at: Option<DateTime<Utc>>,
}

impl CreateSong {
    /// Song with only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Data for updating a song (all fields optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSong {
    pub title: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub length_seconds: Option<f64>,
    pub audio_format: Option<String>,
}

impl UpdateSong {
    /// Whether the update touches nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist_name.is_none()
            && self.album_name.is_none()
            && self.genre.is_none()
            && self.year.is_none()
            && self.length_seconds.is_none()
            && self.audio_format.is_none()
    }
}

//! Playlist domain types
//!
//! A playlist is either manual (songs added by hand) or smart (membership
//! derived from stored rules). Smart playlists keep a materialized membership
//! snapshot alongside two timestamps: when the rules last changed and when the
//! snapshot was last written.

use super::{PlaylistId, SongId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Owner user ID
    pub owner_id: UserId,

    /// Playlist name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Whether membership is derived from rules
    pub is_smart: bool,

    /// Stored rule document (smart playlists only)
    pub rules: Option<serde_json::Value>,

    /// Last time the rules were created or edited
    pub rules_changed_at: Option<DateTime<Utc>>,

    /// Last time the membership snapshot was written
    pub materialized_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    /// Whether the stored snapshot reflects the current rules
    ///
    /// A snapshot written before the latest rule edit does not count.
    pub fn has_current_snapshot(&self) -> bool {
        match (self.materialized_at, self.rules_changed_at) {
            (Some(materialized), Some(changed)) => materialized >= changed,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Data for creating a new playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylist {
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub is_smart: bool,
    pub rules: Option<serde_json::Value>,
}

impl CreatePlaylist {
    /// Manual playlist
    pub fn manual(owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            owner_id,
            name: name.into(),
            description: None,
            is_smart: false,
            rules: None,
        }
    }

    /// Smart playlist with the given rule document
    pub fn smart(owner_id: UserId, name: impl Into<String>, rules: serde_json::Value) -> Self {
        Self {
            owner_id,
            name: name.into(),
            description: None,
            is_smart: true,
            rules: Some(rules),
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Song membership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSong {
    /// Member song
    pub song_id: SongId,

    /// Position in the playlist (0-indexed)
    pub position: i64,

    /// When the song was added
    pub added_at: DateTime<Utc>,
}

/// Result of toggling one song's membership in a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipChange {
    /// Song appended at `position`
    Added { position: i64 },
    /// Song removed
    Removed,
    /// Membership already matched
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn playlist() -> Playlist {
        let now = Utc::now();
        Playlist {
            id: PlaylistId::new("p1"),
            owner_id: UserId::new(1),
            name: "Smart".into(),
            description: None,
            is_smart: true,
            rules: Some(serde_json::json!([])),
            rules_changed_at: Some(now),
            materialized_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn never_materialized_has_no_snapshot() {
        assert!(!playlist().has_current_snapshot());
    }

    #[test]
    fn snapshot_older_than_rules_is_not_current() {
        let mut p = playlist();
        p.materialized_at = p.rules_changed_at.map(|t| t - Duration::seconds(1));
        assert!(!p.has_current_snapshot());

        p.materialized_at = p.rules_changed_at.map(|t| t + Duration::seconds(1));
        assert!(p.has_current_snapshot());
    }

    #[test]
    fn smart_constructor_sets_rules() {
        let create = CreatePlaylist::smart(UserId::new(3), "Mix", serde_json::json!([]));
        assert!(create.is_smart);
        assert!(create.rules.is_some());
        assert!(!CreatePlaylist::manual(UserId::new(3), "Mine").is_smart);
    }
}

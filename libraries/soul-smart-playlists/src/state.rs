//! Materialization state of a smart playlist
//!
//! ```text
//! Unmaterialized ──► Materializing ──► Materialized(at) ──► Stale(at, reason)
//!                         ▲                                        │
//!                         └────────────────────────────────────────┘
//! ```
//!
//! The state is derived, not stored: it follows from `materialized_at`,
//! `rules_changed_at`, the staleness window, and whether the materializer
//! currently holds the playlist.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use soul_core::types::Playlist;

/// Why a snapshot no longer counts as fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    /// Rules were edited after the snapshot was taken
    RulesChanged,
    /// The snapshot is older than the staleness window
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MaterializationState {
    Unmaterialized,
    Materializing,
    Materialized { at: DateTime<Utc> },
    Stale { at: DateTime<Utc>, reason: StaleReason },
}

impl MaterializationState {
    /// Derive the state of a smart playlist
    pub fn of(
        playlist: &Playlist,
        in_flight: bool,
        stale_after: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        if in_flight {
            return Self::Materializing;
        }

        let Some(at) = playlist.materialized_at else {
            return Self::Unmaterialized;
        };

        if !playlist.has_current_snapshot() {
            return Self::Stale {
                at,
                reason: StaleReason::RulesChanged,
            };
        }

        if at < now - stale_after {
            return Self::Stale {
                at,
                reason: StaleReason::Expired,
            };
        }

        Self::Materialized { at }
    }

    /// Whether the cached membership may be served
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Materialized { .. })
    }

    /// Whether the sweeper should schedule a run
    pub fn needs_refresh(&self) -> bool {
        matches!(self, Self::Unmaterialized | Self::Stale { .. })
    }
}

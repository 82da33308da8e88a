use crate::rules::RuleError;
use soul_core::{types::PlaylistId, SoulError};
use thiserror::Error;

/// Errors that can occur while maintaining smart playlists
#[derive(Error, Debug)]
pub enum SmartPlaylistError {
    #[error("Invalid smart playlist rules: {0}")]
    Configuration(#[from] RuleError),

    #[error("Storage temporarily unavailable: {0}")]
    TransientStorage(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Playlist not found: {0}")]
    NotFound(PlaylistId),

    #[error("Materialization of playlist {0} timed out")]
    Timeout(PlaylistId),

    #[error("Smart playlist job queue is closed")]
    QueueClosed,
}

impl SmartPlaylistError {
    /// Whether a later attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStorage(_) | Self::Timeout(_))
    }
}

impl From<SoulError> for SmartPlaylistError {
    fn from(err: SoulError) -> Self {
        match err {
            SoulError::PlaylistNotFound(id) => Self::NotFound(id),
            err if err.is_transient() => Self::TransientStorage(err.to_string()),
            err => Self::Storage(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SmartPlaylistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_keep_their_class() {
        let busy: SmartPlaylistError = SoulError::Unavailable("database is locked".into()).into();
        assert!(busy.is_transient());

        let broken: SmartPlaylistError = SoulError::Database("no such table".into()).into();
        assert!(!broken.is_transient());

        let missing: SmartPlaylistError =
            SoulError::PlaylistNotFound(PlaylistId::new("gone")).into();
        assert!(matches!(missing, SmartPlaylistError::NotFound(_)));
    }

    #[test]
    fn configuration_errors_are_never_retried() {
        let err: SmartPlaylistError = RuleError::Malformed("null".into()).into();
        assert!(!err.is_transient());
    }
}

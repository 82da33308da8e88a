//! Soul Player Core
//!
//! Domain types, storage seams, and error handling shared by the smart playlist
//! engine and its storage backend.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Song`, `Tag`, `Favorite`, `Interaction`, `Playlist`, etc.
//! - **Storage Seams**: `LibraryCatalog` (user-scoped song facts) and `PlaylistStore`
//!   (playlists and their membership rows)
//! - **Error Handling**: Unified `SoulError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use soul_core::types::{CreatePlaylist, UserId};
//! use serde_json::json;
//!
//! let owner = UserId::new(1);
//! let playlist = CreatePlaylist::smart(
//!     owner,
//!     "Loud Guitars",
//!     json!([{ "logic": "and", "rules": [
//!         { "field": "tag", "operator": "has", "value": "rock" }
//!     ]}]),
//! );
//! assert!(playlist.is_smart);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod time;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SoulError};
pub use storage::{LibraryCatalog, PlaylistStore};

pub use types::{
    CreatePlaylist, CreateSong, CreateTag, Favorite, Interaction, MembershipChange, Playlist,
    PlaylistId, PlaylistSong, Song, SongFacts, SongId, Tag, TagId, UpdateSong, User, UserId,
};

//! Domain types for the smart playlist engine

mod facts;
mod ids;
mod listening;
mod playlist;
mod song;
mod tag;
mod user;

pub use facts::SongFacts;
pub use ids::{PlaylistId, SongId, TagId, UserId};
pub use listening::{Favorite, Interaction};
pub use playlist::{CreatePlaylist, MembershipChange, Playlist, PlaylistSong};
pub use song::{CreateSong, Song, UpdateSong};
pub use tag::{CreateTag, Tag};
pub use user::User;

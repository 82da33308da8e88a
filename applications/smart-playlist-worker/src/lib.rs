//! Soul Smart Playlist Worker
//!
//! Background process that keeps materialized smart playlists current.

pub mod config;
pub mod error;

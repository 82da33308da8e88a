//! Integration tests for playlists vertical slice
//!
//! Tests playlist operations including:
//! - CRUD with user ownership
//! - Rule storage and `rules_changed_at` bookkeeping
//! - Manual edit guard on smart playlists
//! - Song ordering in manual playlists

mod test_helpers;

use serde_json::json;
use soul_core::{types::*, SoulError};
use test_helpers::*;

fn rock_rules() -> serde_json::Value {
    json!([{ "logic": "and", "rules": [{ "field": "tag", "operator": "has", "value": "rock" }] }])
}

#[tokio::test]
async fn test_create_and_get_playlist() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let user_id = create_test_user(pool, "testuser").await;

    let playlist = soul_storage::playlists::create(
        pool,
        CreatePlaylist::manual(user_id, "My Favorites").with_description("Best songs ever"),
    )
    .await
    .expect("Failed to create playlist");

    assert_eq!(playlist.name, "My Favorites");
    assert_eq!(playlist.description, Some("Best songs ever".to_string()));
    assert_eq!(playlist.owner_id, user_id);
    assert!(!playlist.is_smart);
    assert!(playlist.rules.is_none());

    let retrieved = soul_storage::playlists::get_by_id(pool, &playlist.id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(retrieved, playlist);
}

#[tokio::test]
async fn test_smart_playlist_starts_unmaterialized() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user_id = create_test_user(pool, "owner").await;

    let playlist = create_test_smart_playlist(pool, "Rock", user_id, rock_rules()).await;

    assert!(playlist.is_smart);
    assert_eq!(playlist.rules, Some(rock_rules()));
    assert!(playlist.rules_changed_at.is_some());
    assert!(playlist.materialized_at.is_none());
    assert!(!playlist.has_current_snapshot());
}

#[tokio::test]
async fn test_smart_playlist_requires_rules() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user_id = create_test_user(pool, "owner").await;

    let mut create = CreatePlaylist::smart(user_id, "Broken", json!([]));
    create.rules = None;

    let result = soul_storage::playlists::create(pool, create).await;
    assert!(matches!(result, Err(SoulError::InvalidInput(_))));
}

#[tokio::test]
async fn test_update_rules_bumps_rules_changed_at() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user_id = create_test_user(pool, "owner").await;
    let playlist = create_test_smart_playlist(pool, "Rock", user_id, rock_rules()).await;

    soul_storage::membership::replace(pool, &playlist.id, &[], soul_core::time::now())
        .await
        .unwrap();

    let new_rules = json!([{ "logic": "and", "rules": [{ "field": "is_favorite", "operator": "is", "value": true }] }]);
    let updated = soul_storage::playlists::update_rules(pool, &playlist.id, &new_rules)
        .await
        .unwrap();

    assert_eq!(updated.rules, Some(new_rules));
    assert!(updated.rules_changed_at > playlist.rules_changed_at);
    assert!(updated.materialized_at.is_some());
    assert!(!updated.has_current_snapshot());
}

#[tokio::test]
async fn test_update_rules_rejects_manual_playlist() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user_id = create_test_user(pool, "owner").await;
    let playlist = create_test_playlist(pool, "Mine", user_id).await;

    let result = soul_storage::playlists::update_rules(pool, &playlist.id, &rock_rules()).await;
    assert!(matches!(result, Err(SoulError::InvalidInput(_))));
}

#[tokio::test]
async fn test_get_user_playlists() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let user1 = create_test_user(pool, "user1").await;
    let user2 = create_test_user(pool, "user2").await;

    create_test_playlist(pool, "User 1 Playlist A", user1).await;
    create_test_smart_playlist(pool, "User 1 Smart", user1, rock_rules()).await;
    create_test_playlist(pool, "User 2 Playlist", user2).await;

    let user1_playlists = soul_storage::playlists::get_user_playlists(pool, user1)
        .await
        .unwrap();
    assert_eq!(user1_playlists.len(), 2);
    assert!(user1_playlists.iter().all(|p| p.owner_id == user1));

    let smart = soul_storage::playlists::all_smart(pool).await.unwrap();
    assert_eq!(smart.len(), 1);
    assert_eq!(smart[0].name, "User 1 Smart");
}

#[tokio::test]
async fn test_manual_edits_rejected_on_smart_playlist() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user_id = create_test_user(pool, "owner").await;
    let song = create_test_song(pool, "Song", None).await;
    let playlist = create_test_smart_playlist(pool, "Rock", user_id, rock_rules()).await;

    let add = soul_storage::playlists::add_song(pool, &playlist.id, song).await;
    assert!(matches!(add, Err(SoulError::SmartPlaylistModification(ref id)) if *id == playlist.id));

    let remove = soul_storage::playlists::remove_song(pool, &playlist.id, song).await;
    assert!(matches!(remove, Err(SoulError::SmartPlaylistModification(_))));

    let reorder = soul_storage::playlists::reorder_songs(pool, &playlist.id, &[song]).await;
    assert!(matches!(reorder, Err(SoulError::SmartPlaylistModification(_))));

    assert!(member_ids(pool, &playlist.id).await.is_empty());
}

#[tokio::test]
async fn test_manual_playlist_song_ordering() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user_id = create_test_user(pool, "owner").await;
    let playlist = create_test_playlist(pool, "Mine", user_id).await;

    let a = create_test_song(pool, "A", None).await;
    let b = create_test_song(pool, "B", None).await;
    let c = create_test_song(pool, "C", None).await;

    for song in [a, b, c] {
        soul_storage::playlists::add_song(pool, &playlist.id, song).await.unwrap();
    }
    // Adding twice is a no-op
    soul_storage::playlists::add_song(pool, &playlist.id, a).await.unwrap();
    assert_eq!(member_ids(pool, &playlist.id).await, vec![a, b, c]);

    soul_storage::playlists::reorder_songs(pool, &playlist.id, &[c, a, b])
        .await
        .unwrap();
    assert_eq!(member_ids(pool, &playlist.id).await, vec![c, a, b]);

    assert!(soul_storage::playlists::remove_song(pool, &playlist.id, a).await.unwrap());
    assert!(!soul_storage::playlists::remove_song(pool, &playlist.id, a).await.unwrap());
    assert_eq!(member_ids(pool, &playlist.id).await, vec![c, b]);
}

#[tokio::test]
async fn test_reorder_must_list_every_song() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user_id = create_test_user(pool, "owner").await;
    let playlist = create_test_playlist(pool, "Mine", user_id).await;
    let a = create_test_song(pool, "A", None).await;
    let b = create_test_song(pool, "B", None).await;
    soul_storage::playlists::add_song(pool, &playlist.id, a).await.unwrap();
    soul_storage::playlists::add_song(pool, &playlist.id, b).await.unwrap();

    let result = soul_storage::playlists::reorder_songs(pool, &playlist.id, &[b]).await;
    assert!(matches!(result, Err(SoulError::InvalidInput(_))));

    // Failed reorder rolls back
    assert_eq!(member_ids(pool, &playlist.id).await, vec![a, b]);
}

#[tokio::test]
async fn test_needing_refresh_selects_unmaterialized_outdated_and_stale() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user_id = create_test_user(pool, "owner").await;

    create_test_smart_playlist(pool, "Never", user_id, rock_rules()).await;
    let fresh = create_test_smart_playlist(pool, "Fresh", user_id, rock_rules()).await;
    let old = create_test_smart_playlist(pool, "Old", user_id, rock_rules()).await;
    let edited = create_test_smart_playlist(pool, "Edited", user_id, rock_rules()).await;
    create_test_playlist(pool, "Manual", user_id).await;

    let now = soul_core::time::now();
    soul_storage::membership::replace(pool, &fresh.id, &[], now).await.unwrap();
    soul_storage::membership::replace(pool, &old.id, &[], now - chrono::Duration::hours(48))
        .await
        .unwrap();
    soul_storage::membership::replace(pool, &edited.id, &[], now).await.unwrap();
    soul_storage::playlists::update_rules(pool, &edited.id, &rock_rules())
        .await
        .unwrap();

    let due = soul_storage::playlists::needing_refresh(pool, now - chrono::Duration::hours(24))
        .await
        .unwrap();
    let mut names: Vec<_> = due.into_iter().map(|p| p.name).collect();
    names.sort();
    assert_eq!(names, vec!["Edited", "Never", "Old"]);
}

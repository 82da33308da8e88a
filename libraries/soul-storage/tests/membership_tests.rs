//! Integration tests for smart playlist membership writes

mod test_helpers;

use serde_json::json;
use soul_core::{types::*, SoulError};
use test_helpers::*;

async fn smart_playlist(pool: &sqlx::SqlitePool) -> Playlist {
    let owner = create_test_user(pool, "owner").await;
    create_test_smart_playlist(pool, "Smart", owner, json!([])).await
}

#[tokio::test]
async fn test_replace_assigns_positions_from_zero() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let playlist = smart_playlist(pool).await;

    let a = create_test_song(pool, "A", None).await;
    let b = create_test_song(pool, "B", None).await;
    let c = create_test_song(pool, "C", None).await;

    let at = soul_core::time::now();
    soul_storage::membership::replace(pool, &playlist.id, &[b, a, c], at)
        .await
        .unwrap();

    let rows = soul_storage::membership::songs(pool, &playlist.id).await.unwrap();
    let positions: Vec<_> = rows.iter().map(|r| (r.song_id, r.position)).collect();
    assert_eq!(positions, vec![(b, 0), (a, 1), (c, 2)]);

    let stored = soul_storage::playlists::get_by_id(pool, &playlist.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.materialized_at, Some(at));
}

#[tokio::test]
async fn test_replace_discards_previous_rows() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let playlist = smart_playlist(pool).await;
    let a = create_test_song(pool, "A", None).await;
    let b = create_test_song(pool, "B", None).await;

    let now = soul_core::time::now();
    soul_storage::membership::replace(pool, &playlist.id, &[a, b], now).await.unwrap();
    soul_storage::membership::replace(pool, &playlist.id, &[b], now).await.unwrap();
    assert_eq!(member_ids(pool, &playlist.id).await, vec![b]);

    soul_storage::membership::replace(pool, &playlist.id, &[], now).await.unwrap();
    assert!(member_ids(pool, &playlist.id).await.is_empty());
}

#[tokio::test]
async fn test_replace_handles_batches_larger_than_one_insert() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let playlist = smart_playlist(pool).await;

    let mut songs = Vec::new();
    for i in 0..1_203 {
        songs.push(create_test_song(pool, &format!("Song {i}"), None).await);
    }

    soul_storage::membership::replace(pool, &playlist.id, &songs, soul_core::time::now())
        .await
        .unwrap();

    let rows = soul_storage::membership::songs(pool, &playlist.id).await.unwrap();
    assert_eq!(rows.len(), songs.len());
    assert!(rows.iter().enumerate().all(|(i, r)| r.position == i as i64));
}

#[tokio::test]
async fn test_replace_unknown_playlist_fails() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let result = soul_storage::membership::replace(
        pool,
        &PlaylistId::new("missing"),
        &[],
        soul_core::time::now(),
    )
    .await;
    assert!(matches!(result, Err(SoulError::PlaylistNotFound(_))));
}

#[tokio::test]
async fn test_apply_appends_after_last_position() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let playlist = smart_playlist(pool).await;
    let a = create_test_song(pool, "A", None).await;
    let b = create_test_song(pool, "B", None).await;
    let c = create_test_song(pool, "C", None).await;

    let first = soul_storage::membership::apply(pool, &playlist.id, a, true).await.unwrap();
    assert_eq!(first, MembershipChange::Added { position: 0 });

    soul_storage::membership::apply(pool, &playlist.id, b, true).await.unwrap();
    soul_storage::membership::apply(pool, &playlist.id, a, false).await.unwrap();

    // Gaps are kept; new members go after the highest position.
    let third = soul_storage::membership::apply(pool, &playlist.id, c, true).await.unwrap();
    assert_eq!(third, MembershipChange::Added { position: 2 });
    assert_eq!(member_ids(pool, &playlist.id).await, vec![b, c]);
}

#[tokio::test]
async fn test_apply_is_idempotent() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let playlist = smart_playlist(pool).await;
    let a = create_test_song(pool, "A", None).await;

    soul_storage::membership::apply(pool, &playlist.id, a, true).await.unwrap();
    let again = soul_storage::membership::apply(pool, &playlist.id, a, true).await.unwrap();
    assert_eq!(again, MembershipChange::Unchanged);

    let removed = soul_storage::membership::apply(pool, &playlist.id, a, false).await.unwrap();
    assert_eq!(removed, MembershipChange::Removed);
    let removed_again = soul_storage::membership::apply(pool, &playlist.id, a, false).await.unwrap();
    assert_eq!(removed_again, MembershipChange::Unchanged);
}

#[tokio::test]
async fn test_detach_only_touches_smart_playlists() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let owner = create_test_user(pool, "owner").await;
    let song = create_test_song(pool, "A", None).await;

    let smart_a = create_test_smart_playlist(pool, "Smart A", owner, json!([])).await;
    let smart_b = create_test_smart_playlist(pool, "Smart B", owner, json!([])).await;
    let manual = create_test_playlist(pool, "Manual", owner).await;

    soul_storage::membership::apply(pool, &smart_a.id, song, true).await.unwrap();
    soul_storage::membership::apply(pool, &smart_b.id, song, true).await.unwrap();
    soul_storage::playlists::add_song(pool, &manual.id, song).await.unwrap();

    let mut touched = soul_storage::membership::detach_from_smart(pool, song).await.unwrap();
    touched.sort();
    let mut expected = vec![smart_a.id.clone(), smart_b.id.clone()];
    expected.sort();
    assert_eq!(touched, expected);

    assert!(member_ids(pool, &smart_a.id).await.is_empty());
    assert_eq!(member_ids(pool, &manual.id).await, vec![song]);
}

#[tokio::test]
async fn test_deleting_song_removes_membership_rows() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let playlist = smart_playlist(pool).await;
    let song = create_test_song(pool, "A", None).await;
    soul_storage::membership::apply(pool, &playlist.id, song, true).await.unwrap();

    assert!(soul_storage::songs::delete(pool, song).await.unwrap());
    assert!(member_ids(pool, &playlist.id).await.is_empty());
}

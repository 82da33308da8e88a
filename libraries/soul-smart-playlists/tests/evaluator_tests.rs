//! Integration tests for dynamic rule evaluation against SQLite

mod common;

use chrono::Duration;
use common::*;
use serde_json::{json, Value};
use soul_core::types::*;
use soul_smart_playlists::RuleSet;

fn rules(document: Value) -> RuleSet {
    RuleSet::parse(&document).expect("rules should parse")
}

async fn evaluate_ids(h: &Harness, document: Value, user: UserId) -> Vec<SongId> {
    h.engine
        .evaluator()
        .evaluate(&rules(document), user)
        .await
        .unwrap()
        .into_iter()
        .map(|song| song.id)
        .collect()
}

#[tokio::test]
async fn test_evaluate_scans_past_chunk_boundaries() {
    let h = Harness::new().await;
    let user = h.user("listener").await;

    let mut rock = Vec::new();
    for i in 0..10 {
        let genre = if i % 3 == 0 { "Rock" } else { "Pop" };
        let id = h
            .song(CreateSong {
                genre: Some(genre.to_string()),
                ..CreateSong::titled(format!("Song {i}"))
            })
            .await;
        if genre == "Rock" {
            rock.push(id);
        }
    }

    let found = evaluate_ids(&h, all_of(vec![clause("genre", "is", json!("Rock"))]), user).await;
    assert_eq!(found, rock);
}

#[tokio::test]
async fn test_groups_are_anded_and_clauses_follow_group_logic() {
    let h = Harness::new().await;
    let user = h.user("listener").await;

    let old_jazz = h
        .song(CreateSong {
            genre: Some("Jazz".into()),
            year: Some(1959),
            ..CreateSong::titled("Kind of Blue")
        })
        .await;
    let _new_jazz = h
        .song(CreateSong {
            genre: Some("Jazz".into()),
            year: Some(2015),
            ..CreateSong::titled("The Epic")
        })
        .await;
    let old_blues = h
        .song(CreateSong {
            genre: Some("Blues".into()),
            year: Some(1962),
            ..CreateSong::titled("Blues")
        })
        .await;

    let document = json!([
        group("or", vec![
            clause("genre", "is", json!("Jazz")),
            clause("genre", "is", json!("Blues")),
        ]),
        group("and", vec![clause("year", "less_than", json!(1970))]),
    ]);

    assert_eq!(evaluate_ids(&h, document, user).await, vec![old_jazz, old_blues]);
}

#[tokio::test]
async fn test_tag_is_behaves_like_has() {
    let h = Harness::new().await;
    let user = h.user("listener").await;
    let chill = h.tag("Chill").await;
    let parent = h.tag("Mood").await;
    let child = soul_storage::tags::create(h.pool(), CreateTag::child("Calm", parent.id))
        .await
        .unwrap();

    let tagged = h.song_by("Tagged", "A").await;
    let by_child = h.song_by("Child tag", "A").await;
    let _plain = h.song_by("Plain", "A").await;
    soul_storage::tags::attach(h.pool(), tagged, chill.id).await.unwrap();
    soul_storage::tags::attach(h.pool(), by_child, child.id).await.unwrap();

    let has = evaluate_ids(&h, all_of(vec![clause("tag", "has", json!("Chill"))]), user).await;
    let is = evaluate_ids(&h, all_of(vec![clause("tag", "is", json!("Chill"))]), user).await;
    assert_eq!(has, vec![tagged]);
    assert_eq!(has, is);

    // Parent tags do not pull in songs tagged with a descendant
    let mood = evaluate_ids(&h, all_of(vec![clause("tag", "has", json!("Mood"))]), user).await;
    assert!(mood.is_empty());

    let by_slug = evaluate_ids(&h, all_of(vec![clause("tag", "has", json!(child.slug))]), user).await;
    assert_eq!(by_slug, vec![by_child]);
}

#[tokio::test]
async fn test_play_count_treats_unplayed_as_zero() {
    let h = Harness::new().await;
    let user = h.user("listener").await;
    let played = h.song_by("Played", "A").await;
    let unplayed = h.song_by("Unplayed", "A").await;

    soul_storage::interactions::record_play(h.pool(), user, played, soul_core::time::now())
        .await
        .unwrap();

    let zero = evaluate_ids(&h, all_of(vec![clause("play_count", "is", json!(0))]), user).await;
    assert_eq!(zero, vec![unplayed]);

    let some = evaluate_ids(&h, all_of(vec![clause("play_count", "greater_than", json!(0))]), user).await;
    assert_eq!(some, vec![played]);
}

#[tokio::test]
async fn test_last_played_never_matches_unplayed_songs() {
    let h = Harness::new().await;
    let user = h.user("listener").await;
    let recent = h.song_by("Recent", "A").await;
    let old = h.song_by("Old", "A").await;
    let _never = h.song_by("Never", "A").await;

    let now = soul_core::time::now();
    soul_storage::interactions::record_play(h.pool(), user, recent, now - Duration::days(1))
        .await
        .unwrap();
    soul_storage::interactions::record_play(h.pool(), user, old, now - Duration::days(60))
        .await
        .unwrap();

    let in_last = evaluate_ids(&h, all_of(vec![clause("last_played", "in_last", json!(7))]), user).await;
    assert_eq!(in_last, vec![recent]);

    let not_in_last =
        evaluate_ids(&h, all_of(vec![clause("last_played", "not_in_last", json!(7))]), user).await;
    assert_eq!(not_in_last, vec![old]);
}

#[tokio::test]
async fn test_user_scoped_fields_follow_the_requesting_user() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let song = h.song_by("Shared", "A").await;

    soul_storage::favorites::add(h.pool(), alice, song).await.unwrap();

    let document = all_of(vec![clause("is_favorite", "is", json!(true))]);
    assert_eq!(evaluate_ids(&h, document.clone(), alice).await, vec![song]);
    assert!(evaluate_ids(&h, document, bob).await.is_empty());
}

#[tokio::test]
async fn test_created_at_day_and_text_operators() {
    let h = Harness::new().await;
    let user = h.user("listener").await;
    let day = chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap()
        .and_utc();

    let on_day = h
        .song(CreateSong {
            created_at: Some(day),
            audio_format: Some("FLAC".into()),
            ..CreateSong::titled("Midnight City")
        })
        .await;
    let _later = h
        .song(CreateSong {
            created_at: Some(day + Duration::days(3)),
            audio_format: Some("mp3".into()),
            ..CreateSong::titled("Daylight")
        })
        .await;

    let same_day = evaluate_ids(&h, all_of(vec![clause("date_added", "is", json!("2024-03-15"))]), user).await;
    assert_eq!(same_day, vec![on_day]);

    let contains = evaluate_ids(&h, all_of(vec![clause("title", "contains", json!("city"))]), user).await;
    assert_eq!(contains, vec![on_day]);

    // Exact comparison is case-sensitive
    let exact = evaluate_ids(&h, all_of(vec![clause("audio_format", "is", json!("flac"))]), user).await;
    assert!(exact.is_empty());
}

#[tokio::test]
async fn test_missing_attributes_never_match() {
    let h = Harness::new().await;
    let user = h.user("listener").await;
    let _no_year = h.song(CreateSong::titled("Undated")).await;

    let is_not = evaluate_ids(&h, all_of(vec![clause("year", "is_not", json!(1999))]), user).await;
    assert!(is_not.is_empty());

    let not_contains =
        evaluate_ids(&h, all_of(vec![clause("genre", "not_contains", json!("Rock"))]), user).await;
    assert!(not_contains.is_empty());
}

#[tokio::test]
async fn test_matches_handles_missing_songs_and_empty_rules() {
    let h = Harness::new().await;
    let user = h.user("listener").await;
    let song = h.song_by("Song", "A").await;
    let evaluator = h.engine.evaluator();

    let any = rules(json!([group("and", vec![])]));
    assert!(evaluator.matches(&any, song, user).await.unwrap());
    assert!(!evaluator.matches(&any, SongId::new(9999), user).await.unwrap());
    assert!(!evaluator.matches(&RuleSet::default(), song, user).await.unwrap());
}

//! End-to-end tests over an on-disk data directory.
//!
//! Each test builds `MangaSwap` from a temp dir holding `catalog.json`
//! (and sometimes `config.json`), the way a host app would.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use mangaswap_cache::{CacheLookup, CacheOptions};
use mangaswap_recommend::{Category, Interaction, UserProfile};
use mangaswap_runtime::MangaSwap;

const CATALOG: &str = r#"[
    {"id": "op", "title": "One Piece", "author": "Eiichiro Oda", "genres": ["Action", "Adventure"],
     "demographic": "Shonen", "rating": 9.2, "popularity": 95, "year": 1997,
     "similarMangas": ["nar", "fma"]},
    {"id": "nar", "title": "Naruto", "author": "Masashi Kishimoto", "genres": ["Action"],
     "demographic": "Shonen", "rating": 8.1, "popularity": 90, "year": 1999},
    {"id": "fma", "title": "Fullmetal Alchemist", "author": "Hiromu Arakawa",
     "genres": ["Action", "Fantasy"], "demographic": "Shonen", "rating": 9.1, "popularity": 80,
     "year": 2001},
    {"id": "nana", "title": "Nana", "author": "Ai Yazawa", "genres": ["Romance", "Drama"],
     "demographic": "Shojo", "rating": 8.6, "popularity": 40, "year": 2000},
    {"id": "ber", "title": "Berserk", "author": "Kentaro Miura", "genres": ["Action", "Horror"],
     "demographic": "Seinen", "rating": 9.4, "popularity": 85, "year": 1989},
    {"id": "ws", "title": "Wanted Stamp", "author": "Eiichiro Oda", "genres": ["Action"],
     "demographic": "Shonen", "rating": 6.5, "popularity": 5, "year": 1994}
]"#;

fn data_dir_with_catalog(dir: &Path) {
    std::fs::write(dir.join("catalog.json"), CATALOG).unwrap();
}

fn open_app() -> (MangaSwap, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    data_dir_with_catalog(dir.path());
    let app = MangaSwap::open(dir.path()).unwrap();
    (app, dir)
}

#[test]
fn test_open_loads_catalog_and_config() {
    let dir = tempfile::tempdir().unwrap();
    data_dir_with_catalog(dir.path());
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"cache": {"maxEntries": 3}}"#,
    )
    .unwrap();

    let app = MangaSwap::open(dir.path()).unwrap();
    assert_eq!(app.engine().catalog_len(), 6);
    assert_eq!(app.config().cache.max_entries, 3);
    assert!(dir.path().join("storage").join("mangaswap.db").exists());
}

#[test]
fn test_open_without_catalog_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = MangaSwap::open(dir.path()).unwrap();
    assert_eq!(app.engine().catalog_len(), 0);
    assert!(app.recommendations("anyone", 5).is_empty());
}

#[test]
fn test_cache_round_trip_on_sqlite() {
    let (app, _dir) = open_app();
    let cache = app.cache();

    let value = serde_json::json!({"a": 1, "b": "x"});
    cache.set("obj", &value, CacheOptions::default());
    assert_eq!(cache.get::<serde_json::Value>("obj"), Some(value));

    cache.remove("obj");
    cache.remove("obj");
    assert_eq!(cache.lookup::<serde_json::Value>("obj"), CacheLookup::Miss);
}

#[test]
fn test_cache_bound_on_sqlite() {
    let (app, _dir) = open_app();
    let cache = app.cache();
    for i in 0..55 {
        cache.set(&format!("k{}", i), &i, CacheOptions::with_ttl(Duration::from_secs(60)));
    }
    assert!(cache.len() <= 50);
    assert_eq!(cache.get::<i32>("k54"), Some(54));
}

#[test]
fn test_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    data_dir_with_catalog(dir.path());
    {
        let app = MangaSwap::open(dir.path()).unwrap();
        let mut profile = UserProfile::new("u1");
        profile.preferences.genres = vec!["Romance".into()];
        app.save_profile(profile).unwrap();
    }

    let app = MangaSwap::open(dir.path()).unwrap();
    let recs = app.recommendations("u1", 5);
    assert!(recs
        .iter()
        .any(|r| r.manga_id == "nana" && r.category == Category::GenreMatch));
}

#[test]
fn test_recommendation_properties() {
    let (app, _dir) = open_app();
    let mut profile = UserProfile::new("u1");
    profile.preferences.genres = vec!["Action".into()];
    profile.preferences.authors = vec!["Ai Yazawa".into()];
    let read: serde_json::Value = serde_json::json!({
        "mangaId": "op", "rating": 9, "completed": true, "dateRead": "2024-01-05T10:00:00Z"
    });
    profile.record_reading(serde_json::from_value(read).unwrap());
    app.save_profile(profile).unwrap();

    app.engine().record_interaction("u1", "ber", Interaction::Like).unwrap();
    app.engine().record_interaction("u2", "ber", Interaction::Like).unwrap();
    app.engine().record_interaction("u2", "fma", Interaction::Like).unwrap();

    for limit in [1, 3, 5, 10] {
        let recs = app.recommendations("u1", limit);
        assert!(recs.len() <= limit);
        assert!(recs.iter().all(|r| r.manga_id != "op"));
        let ids: HashSet<&str> = recs.iter().map(|r| r.manga_id.as_str()).collect();
        assert_eq!(ids.len(), recs.len());
        assert!(recs.iter().all(|r| (0.0..=1.0).contains(&r.confidence)));
    }

    // Every unread item is surfaced; duplicates keep their best category.
    let recs = app.recommendations("u1", 10);
    assert_eq!(recs.len(), 5);
    let categories: HashSet<Category> = recs.iter().map(|r| r.category).collect();
    assert!(categories.contains(&Category::AuthorMatch));
    assert!(categories.contains(&Category::Similar));
    assert!(categories.contains(&Category::GenreMatch));
    assert_eq!(recs[0].manga_id, "nana");
}

#[test]
fn test_unknown_user_gets_trending() {
    let (app, _dir) = open_app();
    let recs = app.recommendations("stranger", 3);
    let ids: Vec<&str> = recs.iter().map(|r| r.manga_id.as_str()).collect();
    assert_eq!(ids, vec!["op", "nar", "ber"]);
    assert!(recs.iter().all(|r| r.category == Category::Trending));
}

/// Hosts render recommendations from JSON; field names are camelCase and
/// categories snake_case.
#[test]
fn test_recommendation_json_shape() {
    let (app, _dir) = open_app();
    let mut profile = UserProfile::new("u1");
    profile.preferences.genres = vec!["Fantasy".into()];
    app.save_profile(profile).unwrap();

    let recs = app.recommendations("u1", 5);
    let json = serde_json::to_value(&recs).unwrap();
    let items = json.as_array().unwrap();
    let fma = items.iter().find(|r| r["mangaId"] == "fma").unwrap();
    assert_eq!(fma["category"], "genre_match");
    assert!(fma["score"].is_number());
    assert!(fma["confidence"].is_number());
    assert!(fma["reasons"].is_array());
    assert!(items.iter().any(|r| r["category"] == "trending"));
}

#[test]
fn test_exchange_matches_end_to_end() {
    let (app, _dir) = open_app();
    let mut me = UserProfile::new("me");
    me.preferences.genres = vec!["Action".into()];
    app.save_profile(me).unwrap();

    let partner: UserProfile = serde_json::from_value(serde_json::json!({
        "id": "p1",
        "exchangeHistory": [
            {"mangaId": "fma", "partnerId": "x", "rating": 9, "successful": true},
            {"mangaId": "nana", "partnerId": "y", "rating": 7, "successful": true}
        ]
    }))
    .unwrap();
    app.save_profile(partner).unwrap();

    let matches = app.exchange_matches("me", "nar", 5);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].manga_id, "fma");
    assert_eq!(matches[0].partner_id, "p1");
}

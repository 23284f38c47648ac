//! Integration tests for the catalog API
//!
//! Tests cover:
//! - Song creation (artist gate), update, delete, and ownership checks
//! - Album lifecycle, including song detachment on delete
//! - Likes and the bulk like-status endpoint
//! - Playlist visibility and membership
//! - Genre vocabulary and song tagging
//! - Account deletion cascades

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method
use trill_api::{build_router, AppState};
use trill_common::auth::TokenService;
use trill_common::db::init_database_in_memory;

/// Test helper: fresh app over an in-memory database
async fn setup_app() -> (Router, AppState) {
    let db = init_database_in_memory()
        .await
        .expect("in-memory database should initialize");
    let tokens = TokenService::new("integration-test-signing-key".to_string(), 3600);
    let state = AppState::new(db, tokens);
    (build_router(state.clone()), state)
}

/// Test helper: build a request with optional bearer token and JSON body
fn test_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: register a user and return (guid, token)
async fn signup(app: &Router, username: &str, is_artist: bool) -> (String, String) {
    let request = test_request(
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": format!("{}@example.com", username),
            "username": username,
            "password": "password123",
            "is_artist": is_artist,
        })),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response.into_body()).await;
    let guid = created["guid"].as_str().unwrap().to_string();

    let request = test_request(
        "POST",
        "/auth/login",
        None,
        Some(json!({
            "email": format!("{}@example.com", username),
            "password": "password123",
        })),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    (guid, token)
}

/// Test helper: create a song, asserting success, and return its body
async fn create_song(app: &Router, token: &str, payload: Value) -> Value {
    let response = app
        .clone()
        .oneshot(test_request("POST", "/songs", Some(token), Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

/// Test helper: create an album, asserting success, and return its body
async fn create_album(app: &Router, token: &str, payload: Value) -> Value {
    let response = app
        .clone()
        .oneshot(test_request("POST", "/albums", Some(token), Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

/// Test helper: create a playlist, asserting success, and return its body
async fn create_playlist(app: &Router, token: &str, payload: Value) -> Value {
    let response = app
        .clone()
        .oneshot(test_request("POST", "/playlists", Some(token), Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

// =============================================================================
// Song Tests
// =============================================================================

#[tokio::test]
async fn test_song_creation_requires_artist_role() {
    let (app, _state) = setup_app().await;
    let (_guid, listener_token) = signup(&app, "bob", false).await;

    let payload = json!({"title": "Bootleg", "duration_secs": 120});

    // Listener accounts cannot publish
    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/songs",
            Some(&listener_token),
            Some(payload.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Only artists can create songs");

    // Anonymous requests cannot either
    let response = app
        .clone()
        .oneshot(test_request("POST", "/songs", None, Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_song_crud_round_trip() {
    let (app, _state) = setup_app().await;
    let (alice_guid, alice_token) = signup(&app, "alice", true).await;

    let song = create_song(
        &app,
        &alice_token,
        json!({
            "title": "Neon Rain",
            "duration_secs": 214,
            "audio_ref": "files/neon-rain.ogg",
        }),
    )
    .await;
    assert_eq!(song["title"], "Neon Rain");
    assert_eq!(song["artist_guid"], alice_guid);
    assert_eq!(song["like_count"], 0);
    assert_eq!(song["genres"], json!([]));
    let song_guid = song["guid"].as_str().unwrap();

    // Detail fetch is public
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", song_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = extract_json(response.into_body()).await;
    assert_eq!(fetched["audio_ref"], "files/neon-rain.ogg");

    // Owner updates keep unspecified fields
    let response = app
        .clone()
        .oneshot(test_request(
            "PUT",
            &format!("/songs/{}", song_guid),
            Some(&alice_token),
            Some(json!({"title": "Neon Rain (Remaster)"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["title"], "Neon Rain (Remaster)");
    assert_eq!(updated["duration_secs"], 214);

    // Catalog listing filtered by artist
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs?artist={}", alice_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let listing = extract_json(response.into_body()).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    // The artist's public song page shows it too
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/users/{}/songs", alice_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let listing = extract_json(response.into_body()).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_song_ownership_enforced() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;
    let (_carol_guid, carol_token) = signup(&app, "carol", true).await;

    let song = create_song(&app, &alice_token, json!({"title": "Mine"})).await;
    let song_guid = song["guid"].as_str().unwrap();

    // Another artist cannot modify it
    let response = app
        .clone()
        .oneshot(test_request(
            "PUT",
            &format!("/songs/{}", song_guid),
            Some(&carol_token),
            Some(json!({"title": "Stolen"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Not authorized to modify this song");

    // Nor delete it
    let response = app
        .clone()
        .oneshot(test_request(
            "DELETE",
            &format!("/songs/{}", song_guid),
            Some(&carol_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Not authorized to delete this song");

    // The owner can
    let response = app
        .clone()
        .oneshot(test_request(
            "DELETE",
            &format!("/songs/{}", song_guid),
            Some(&alice_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Song deleted successfully");

    // And it is gone
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", song_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Song not found");
}

#[tokio::test]
async fn test_song_validation_failures() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/songs",
            Some(&alice_token),
            Some(json!({"title": "   "})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Title cannot be empty");

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/songs",
            Some(&alice_token),
            Some(json!({"title": "Zero", "duration_secs": 0})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Song duration must be positive");

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/songs",
            Some(&alice_token),
            Some(json!({"title": "Orphan", "album_guid": "no-such-album"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Album not found");
}

#[tokio::test]
async fn test_song_cannot_join_foreign_album() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;
    let (_carol_guid, carol_token) = signup(&app, "carol", true).await;

    let album = create_album(&app, &carol_token, json!({"title": "Carol's Album"})).await;
    let album_guid = album["guid"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/songs",
            Some(&alice_token),
            Some(json!({"title": "Interloper", "album_guid": album_guid})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Album belongs to a different artist");
}

// =============================================================================
// Album Tests
// =============================================================================

#[tokio::test]
async fn test_album_lifecycle() {
    let (app, _state) = setup_app().await;
    let (alice_guid, alice_token) = signup(&app, "alice", true).await;

    let album = create_album(
        &app,
        &alice_token,
        json!({"title": "Night Drive", "release_date": "2024-03-01"}),
    )
    .await;
    assert_eq!(album["title"], "Night Drive");
    assert_eq!(album["artist_guid"], alice_guid);
    let album_guid = album["guid"].as_str().unwrap();

    create_song(
        &app,
        &alice_token,
        json!({"title": "Headlights", "album_guid": album_guid}),
    )
    .await;
    create_song(
        &app,
        &alice_token,
        json!({"title": "Tail Lights", "album_guid": album_guid}),
    )
    .await;

    // Album song listing is public
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/albums/{}/songs", album_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let songs = extract_json(response.into_body()).await;
    let titles: Vec<&str> = songs
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Headlights"));
    assert!(titles.contains(&"Tail Lights"));

    // Owner can retitle
    let response = app
        .clone()
        .oneshot(test_request(
            "PUT",
            &format!("/albums/{}", album_guid),
            Some(&alice_token),
            Some(json!({"title": "Night Drive (Deluxe)"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["title"], "Night Drive (Deluxe)");
    assert_eq!(updated["release_date"], "2024-03-01");

    // Artist-filtered album listing
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/albums?artist={}", alice_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let listing = extract_json(response.into_body()).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_album_delete_detaches_songs() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;

    let album = create_album(&app, &alice_token, json!({"title": "Ephemeral"})).await;
    let album_guid = album["guid"].as_str().unwrap();

    let song = create_song(
        &app,
        &alice_token,
        json!({"title": "Survivor", "album_guid": album_guid}),
    )
    .await;
    let song_guid = song["guid"].as_str().unwrap();
    assert_eq!(song["album_guid"], *album_guid);

    let response = app
        .clone()
        .oneshot(test_request(
            "DELETE",
            &format!("/albums/{}", album_guid),
            Some(&alice_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Album deleted successfully");

    // The song outlives its album, with the reference cleared
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", song_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let survivor = extract_json(response.into_body()).await;
    assert_eq!(survivor["album_guid"], Value::Null);
}

#[tokio::test]
async fn test_album_ownership_enforced() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;
    let (_carol_guid, carol_token) = signup(&app, "carol", true).await;
    let (_bob_guid, bob_token) = signup(&app, "bob", false).await;

    // Listeners cannot create albums at all
    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/albums",
            Some(&bob_token),
            Some(json!({"title": "Fan Compilation"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Only artists can create albums");

    let album = create_album(&app, &alice_token, json!({"title": "Locked"})).await;
    let album_guid = album["guid"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(test_request(
            "PUT",
            &format!("/albums/{}", album_guid),
            Some(&carol_token),
            Some(json!({"title": "Hijacked"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Not authorized to modify this album");

    let response = app
        .clone()
        .oneshot(test_request(
            "DELETE",
            &format!("/albums/{}", album_guid),
            Some(&carol_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Not authorized to delete this album");
}

// =============================================================================
// Like Tests
// =============================================================================

#[tokio::test]
async fn test_like_lifecycle() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;
    let (_bob_guid, bob_token) = signup(&app, "bob", false).await;

    let song = create_song(&app, &alice_token, json!({"title": "Catchy"})).await;
    let song_guid = song["guid"].as_str().unwrap();

    // Like
    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/songs/{}/like", song_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Song liked successfully");

    // The denormalized count reflects it
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", song_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let detail = extract_json(response.into_body()).await;
    assert_eq!(detail["like_count"], 1);

    // Liking twice conflicts
    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/songs/{}/like", song_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Song already liked");

    // Status endpoint sees the like
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}/is-liked", song_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["is_liked"], true);

    // So does the liked-songs library
    let response = app
        .clone()
        .oneshot(test_request("GET", "/me/songs/liked", Some(&bob_token), None))
        .await
        .unwrap();
    let library = extract_json(response.into_body()).await;
    assert_eq!(library.as_array().unwrap().len(), 1);
    assert_eq!(library[0]["title"], "Catchy");

    // Unlike
    let response = app
        .clone()
        .oneshot(test_request(
            "DELETE",
            &format!("/songs/{}/like", song_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Song unliked successfully");

    // The count drops back and a second unlike has nothing to remove
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", song_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let detail = extract_json(response.into_body()).await;
    assert_eq!(detail["like_count"], 0);

    let response = app
        .clone()
        .oneshot(test_request(
            "DELETE",
            &format!("/songs/{}/like", song_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Song not liked");
}

#[tokio::test]
async fn test_bulk_like_status() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;
    let (_bob_guid, bob_token) = signup(&app, "bob", false).await;

    let liked = create_song(&app, &alice_token, json!({"title": "Liked"})).await;
    let liked_guid = liked["guid"].as_str().unwrap();
    let ignored = create_song(&app, &alice_token, json!({"title": "Ignored"})).await;
    let ignored_guid = ignored["guid"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/songs/{}/like", liked_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // One round trip answers for the whole batch; unknown guids are false
    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/songs/check-likes",
            Some(&bob_token),
            Some(json!([liked_guid, ignored_guid, "no-such-song"])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body[liked_guid], true);
    assert_eq!(body[ignored_guid], false);
    assert_eq!(body["no-such-song"], false);
}

// =============================================================================
// Playlist Tests
// =============================================================================

#[tokio::test]
async fn test_playlist_visibility() {
    let (app, _state) = setup_app().await;
    let (bob_guid, bob_token) = signup(&app, "bob", false).await;
    let (_alice_guid, alice_token) = signup(&app, "alice", false).await;

    let playlist = create_playlist(
        &app,
        &bob_token,
        json!({"name": "Night Owls", "is_public": false}),
    )
    .await;
    let playlist_guid = playlist["guid"].as_str().unwrap();

    // Playlist reads always need a token
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/playlists/{}", playlist_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Another user cannot see a private playlist
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/playlists/{}", playlist_guid),
            Some(&alice_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Not authorized to view this playlist");

    // Nor find it in browse or on the owner's profile
    let response = app
        .clone()
        .oneshot(test_request("GET", "/playlists", Some(&alice_token), None))
        .await
        .unwrap();
    let listing = extract_json(response.into_body()).await;
    assert_eq!(listing.as_array().unwrap().len(), 0);

    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/users/{}/playlists", bob_guid),
            Some(&alice_token),
            None,
        ))
        .await
        .unwrap();
    let listing = extract_json(response.into_body()).await;
    assert_eq!(listing.as_array().unwrap().len(), 0);

    // Flipping the visibility flag opens it up
    let response = app
        .clone()
        .oneshot(test_request(
            "PUT",
            &format!("/playlists/{}", playlist_guid),
            Some(&bob_token),
            Some(json!({"is_public": true})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/playlists/{}", playlist_guid),
            Some(&alice_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let visible = extract_json(response.into_body()).await;
    assert_eq!(visible["name"], "Night Owls");

    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/users/{}/playlists", bob_guid),
            Some(&alice_token),
            None,
        ))
        .await
        .unwrap();
    let listing = extract_json(response.into_body()).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_playlist_membership() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;
    let (_bob_guid, bob_token) = signup(&app, "bob", false).await;

    let first = create_song(&app, &alice_token, json!({"title": "First"})).await;
    let second = create_song(&app, &alice_token, json!({"title": "Second"})).await;
    let third = create_song(&app, &alice_token, json!({"title": "Third"})).await;

    let playlist = create_playlist(
        &app,
        &bob_token,
        json!({"name": "Gym", "is_public": true}),
    )
    .await;
    let playlist_guid = playlist["guid"].as_str().unwrap();

    // Anyone's songs can go on your playlist
    for song in [&first, &second, &third] {
        let uri = format!(
            "/playlists/{}/songs/{}",
            playlist_guid,
            song["guid"].as_str().unwrap()
        );
        let response = app
            .clone()
            .oneshot(test_request("POST", &uri, Some(&bob_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["message"], "Song added to playlist successfully");
    }

    // Membership keeps insertion order
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/playlists/{}/songs", playlist_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    let songs = extract_json(response.into_body()).await;
    let titles: Vec<&str> = songs
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);

    // Adding the same song twice conflicts
    let dup_uri = format!(
        "/playlists/{}/songs/{}",
        playlist_guid,
        first["guid"].as_str().unwrap()
    );
    let response = app
        .clone()
        .oneshot(test_request("POST", &dup_uri, Some(&bob_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Song already in playlist");

    // Public playlists are readable by others but not editable
    let response = app
        .clone()
        .oneshot(test_request("POST", &dup_uri, Some(&alice_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Not authorized to modify this playlist");

    // Removal, then removing again
    let response = app
        .clone()
        .oneshot(test_request("DELETE", &dup_uri, Some(&bob_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Song removed from playlist successfully");

    let response = app
        .clone()
        .oneshot(test_request("DELETE", &dup_uri, Some(&bob_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Song not in playlist");

    // Unknown members and unknown playlists give distinct errors
    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/playlists/{}/songs/no-such-song", playlist_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Song not found");

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/playlists/no-such-playlist/songs/{}", first["guid"].as_str().unwrap()),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Playlist not found");

    // Deleting the playlist leaves the songs themselves alone
    let response = app
        .clone()
        .oneshot(test_request(
            "DELETE",
            &format!("/playlists/{}", playlist_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Playlist deleted successfully");

    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", second["guid"].as_str().unwrap()),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Genre Tests
// =============================================================================

#[tokio::test]
async fn test_genre_vocabulary() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;

    // Creating genres needs a token
    let payload = json!({"name": "Jazz", "description": "Improvised"});
    let response = app
        .clone()
        .oneshot(test_request("POST", "/genres", None, Some(payload.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/genres",
            Some(&alice_token),
            Some(payload.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let genre = extract_json(response.into_body()).await;
    assert_eq!(genre["name"], "Jazz");
    let genre_guid = genre["guid"].as_str().unwrap();

    // Names are unique
    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/genres",
            Some(&alice_token),
            Some(payload),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Genre already exists");

    // Tagging a song in the vocabulary
    let song = create_song(
        &app,
        &alice_token,
        json!({"title": "Blue Hour", "genre_guids": [genre_guid]}),
    )
    .await;
    assert_eq!(song["genres"], json!(["Jazz"]));
    let song_guid = song["guid"].as_str().unwrap();

    // The genre's song listing includes it
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/genres/{}/songs", genre_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let songs = extract_json(response.into_body()).await;
    assert_eq!(songs.as_array().unwrap().len(), 1);
    assert_eq!(songs[0]["title"], "Blue Hour");

    // Deleting the genre untags but keeps the song
    let response = app
        .clone()
        .oneshot(test_request(
            "DELETE",
            &format!("/genres/{}", genre_guid),
            Some(&alice_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Genre deleted successfully");

    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", song_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = extract_json(response.into_body()).await;
    assert_eq!(detail["genres"], json!([]));
}

#[tokio::test]
async fn test_song_with_unknown_genre_rejected() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            "/songs",
            Some(&alice_token),
            Some(json!({"title": "Untaggable", "genre_guids": ["no-such-genre"]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Genre not found");

    // The rejected song was not half-created
    let response = app
        .clone()
        .oneshot(test_request("GET", "/songs", None, None))
        .await
        .unwrap();
    let listing = extract_json(response.into_body()).await;
    assert_eq!(listing.as_array().unwrap().len(), 0);
}

// =============================================================================
// Account Deletion Cascade Tests
// =============================================================================

#[tokio::test]
async fn test_listener_deletion_cascades() {
    let (app, _state) = setup_app().await;
    let (alice_guid, alice_token) = signup(&app, "alice", true).await;
    let (bob_guid, bob_token) = signup(&app, "bob", false).await;

    let song = create_song(&app, &alice_token, json!({"title": "Fan Favorite"})).await;
    let song_guid = song["guid"].as_str().unwrap();

    // Bob engages: like, follow, playlist
    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/songs/{}/like", song_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/users/{}/follow", alice_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let playlist = create_playlist(
        &app,
        &bob_token,
        json!({"name": "Bob's Picks", "is_public": true}),
    )
    .await;
    let playlist_guid = playlist["guid"].as_str().unwrap().to_string();

    // Bob leaves
    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/users/me", Some(&bob_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The profile is gone
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/users/{}", bob_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // His like no longer counts
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", song_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let detail = extract_json(response.into_body()).await;
    assert_eq!(detail["like_count"], 0);

    // He no longer follows anyone
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/users/{}/followers", alice_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let followers = extract_json(response.into_body()).await;
    assert_eq!(followers.as_array().unwrap().len(), 0);

    // His playlist went with him
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/playlists/{}", playlist_guid),
            Some(&alice_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Playlist not found");
}

#[tokio::test]
async fn test_artist_deletion_cascades() {
    let (app, _state) = setup_app().await;
    let (_alice_guid, alice_token) = signup(&app, "alice", true).await;
    let (_bob_guid, bob_token) = signup(&app, "bob", false).await;

    let album = create_album(&app, &alice_token, json!({"title": "Final Album"})).await;
    let album_guid = album["guid"].as_str().unwrap().to_string();
    let song = create_song(
        &app,
        &alice_token,
        json!({"title": "Last Song", "album_guid": album_guid}),
    )
    .await;
    let song_guid = song["guid"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/songs/{}/like", song_guid),
            Some(&bob_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The artist deletes their account
    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/users/me", Some(&alice_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Their whole catalog disappears
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/songs/{}", song_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            &format!("/albums/{}", album_guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Bob's liked library empties rather than dangling
    let response = app
        .clone()
        .oneshot(test_request("GET", "/me/songs/liked", Some(&bob_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let library = extract_json(response.into_body()).await;
    assert_eq!(library.as_array().unwrap().len(), 0);
}

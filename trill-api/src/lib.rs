//! trill-api library - HTTP surface for the Trill catalog service
//!
//! A thin axum layer over the shared store in `trill-common`. Handlers
//! translate requests into store calls and store errors into JSON
//! responses; all business rules live below this crate.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use trill_common::auth::TokenService;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Issues and verifies bearer tokens
    pub tokens: TokenService,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, tokens: TokenService) -> Self {
        Self { db, tokens }
    }
}

/// Build application router
///
/// Routes requiring a caller identity take a `CurrentUser` extractor;
/// everything else is public. Catalog reads (songs, albums, genres,
/// user profiles, search) need no token, playlists always do because
/// visibility depends on who is asking.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        // Accounts and sessions
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/auth/me", get(api::me))
        .route("/users", get(api::list_users))
        .route(
            "/users/me",
            get(api::me).put(api::update_me).delete(api::delete_me),
        )
        .route("/users/:guid", get(api::get_user))
        .route("/users/:guid/songs", get(api::list_user_songs))
        .route("/users/:guid/albums", get(api::list_user_albums))
        .route("/users/:guid/playlists", get(api::list_user_playlists))
        .route(
            "/users/:guid/follow",
            get(api::follow_status)
                .post(api::follow_user)
                .delete(api::unfollow_user),
        )
        .route("/users/:guid/followers", get(api::list_followers))
        .route("/users/:guid/following", get(api::list_following))
        // Songs and likes
        .route("/songs", get(api::list_songs).post(api::create_song))
        .route(
            "/songs/:guid",
            get(api::get_song)
                .put(api::update_song)
                .delete(api::delete_song),
        )
        .route(
            "/songs/:guid/like",
            post(api::like_song).delete(api::unlike_song),
        )
        .route("/songs/:guid/is-liked", get(api::is_song_liked))
        .route("/songs/check-likes", post(api::check_likes))
        .route("/me/songs/liked", get(api::list_liked_songs))
        // Albums
        .route("/albums", get(api::list_albums).post(api::create_album))
        .route(
            "/albums/:guid",
            get(api::get_album)
                .put(api::update_album)
                .delete(api::delete_album),
        )
        .route("/albums/:guid/songs", get(api::list_album_songs))
        // Playlists
        .route(
            "/playlists",
            get(api::list_playlists).post(api::create_playlist),
        )
        .route(
            "/playlists/:guid",
            get(api::get_playlist)
                .put(api::update_playlist)
                .delete(api::delete_playlist),
        )
        .route("/playlists/:guid/songs", get(api::list_playlist_songs))
        .route(
            "/playlists/:guid/songs/:song_guid",
            post(api::add_playlist_song).delete(api::remove_playlist_song),
        )
        // Genres
        .route("/genres", get(api::list_genres).post(api::create_genre))
        .route(
            "/genres/:guid",
            get(api::get_genre)
                .put(api::update_genre)
                .delete(api::delete_genre),
        )
        .route("/genres/:guid/songs", get(api::list_genre_songs))
        // Search
        .route("/search/songs", get(api::search_songs))
        .route("/search/albums", get(api::search_albums))
        .route("/search/playlists", get(api::search_playlists))
        .route("/search/users", get(api::search_users))
        .route("/search/genres", get(api::search_genres))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
        .with_state(state)
}

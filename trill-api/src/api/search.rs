//! Substring search over the catalog
//!
//! All five endpoints are public. Playlist search is the one place
//! where an optional token changes the result: with a valid bearer
//! token the caller's private playlists match too, without one only
//! public playlists do.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use trill_common::db::models::{Album, Genre, Playlist, PublicUser, Song};
use trill_common::db::{albums, genres, playlists, songs, users, Page};

use super::auth::CurrentUser;
use super::error::ApiError;
use crate::AppState;

/// `q` plus pagination; a missing or blank `q` is rejected
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchQuery {
    fn term(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }

    fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

/// GET /search/songs
pub async fn search_songs(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let songs = songs::search_songs(&state.db, query.term(), query.page()).await?;
    Ok(Json(songs))
}

/// GET /search/albums
pub async fn search_albums(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Album>>, ApiError> {
    let albums = albums::search_albums(&state.db, query.term(), query.page()).await?;
    Ok(Json(albums))
}

/// GET /search/playlists
pub async fn search_playlists(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Playlist>>, ApiError> {
    let viewer = viewer.as_ref().map(|CurrentUser(user)| user);
    let playlists =
        playlists::search_playlists(&state.db, viewer, query.term(), query.page()).await?;
    Ok(Json(playlists))
}

/// GET /search/users
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = users::search_users(&state.db, query.term(), query.page()).await?;
    Ok(Json(users))
}

/// GET /search/genres
pub async fn search_genres(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Genre>>, ApiError> {
    let genres = genres::search_genres(&state.db, query.term(), query.page()).await?;
    Ok(Json(genres))
}

//! Playlist endpoints
//!
//! Every route here requires a token; playlist visibility cannot be
//! decided without knowing who is asking.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use trill_common::db::models::{NewPlaylist, Playlist, PlaylistPatch, Song};
use trill_common::db::playlists;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::PageQuery;
use crate::AppState;

/// GET /playlists
pub async fn list_playlists(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Playlist>>, ApiError> {
    let playlists = playlists::list_playlists(&state.db, &user, query.page()).await?;
    Ok(Json(playlists))
}

/// POST /playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<NewPlaylist>,
) -> Result<(StatusCode, Json<Playlist>), ApiError> {
    let playlist = playlists::create_playlist(&state.db, &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// GET /playlists/:guid
pub async fn get_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<Playlist>, ApiError> {
    let playlist = playlists::get_playlist(&state.db, &user, &guid).await?;
    Ok(Json(playlist))
}

/// PUT /playlists/:guid
pub async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
    Json(patch): Json<PlaylistPatch>,
) -> Result<Json<Playlist>, ApiError> {
    let playlist = playlists::update_playlist(&state.db, &user, &guid, &patch).await?;
    Ok(Json(playlist))
}

/// DELETE /playlists/:guid
pub async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    playlists::delete_playlist(&state.db, &user, &guid).await?;
    Ok(Json(json!({"message": "Playlist deleted successfully"})))
}

/// GET /playlists/:guid/songs
pub async fn list_playlist_songs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let songs = playlists::list_songs(&state.db, &user, &guid, query.page()).await?;
    Ok(Json(songs))
}

/// POST /playlists/:guid/songs/:song_guid
pub async fn add_playlist_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((guid, song_guid)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    playlists::add_song(&state.db, &user, &guid, &song_guid).await?;
    Ok(Json(json!({"message": "Song added to playlist successfully"})))
}

/// DELETE /playlists/:guid/songs/:song_guid
pub async fn remove_playlist_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((guid, song_guid)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    playlists::remove_song(&state.db, &user, &guid, &song_guid).await?;
    Ok(Json(
        json!({"message": "Song removed from playlist successfully"}),
    ))
}

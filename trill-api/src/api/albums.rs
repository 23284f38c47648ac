//! Album endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use trill_common::db::albums;
use trill_common::db::models::{Album, AlbumPatch, NewAlbum, Song};
use trill_common::db::Page;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::PageQuery;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AlbumListQuery {
    pub artist: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /albums
pub async fn list_albums(
    State(state): State<AppState>,
    Query(query): Query<AlbumListQuery>,
) -> Result<Json<Vec<Album>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let albums = albums::list_albums(&state.db, query.artist.as_deref(), page).await?;
    Ok(Json(albums))
}

/// GET /albums/:guid
pub async fn get_album(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Album>, ApiError> {
    let album = albums::get_album(&state.db, &guid).await?;
    Ok(Json(album))
}

/// POST /albums (artist-only)
pub async fn create_album(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<NewAlbum>,
) -> Result<(StatusCode, Json<Album>), ApiError> {
    let album = albums::create_album(&state.db, &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(album)))
}

/// PUT /albums/:guid
pub async fn update_album(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
    Json(patch): Json<AlbumPatch>,
) -> Result<Json<Album>, ApiError> {
    let album = albums::update_album(&state.db, &user, &guid, &patch).await?;
    Ok(Json(album))
}

/// DELETE /albums/:guid
///
/// Songs on the album survive with their album reference cleared.
pub async fn delete_album(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    albums::delete_album(&state.db, &user, &guid).await?;
    Ok(Json(json!({"message": "Album deleted successfully"})))
}

/// GET /albums/:guid/songs
pub async fn list_album_songs(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let songs = albums::list_album_songs(&state.db, &guid, query.page()).await?;
    Ok(Json(songs))
}

//! Song catalog and like endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use trill_common::db::models::{NewSong, Song, SongDetail, SongPatch};
use trill_common::db::songs::{self, SongFilter};
use trill_common::db::Page;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::PageQuery;
use crate::AppState;

/// Listing filters plus pagination for GET /songs
#[derive(Debug, Deserialize)]
pub struct SongListQuery {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /songs
pub async fn list_songs(
    State(state): State<AppState>,
    Query(query): Query<SongListQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let filter = SongFilter {
        artist_guid: query.artist,
        album_guid: query.album,
        genre_guid: query.genre,
    };
    let page = Page::new(query.limit, query.offset);

    let songs = songs::list_songs(&state.db, &filter, page).await?;
    Ok(Json(songs))
}

/// GET /songs/:guid
pub async fn get_song(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<SongDetail>, ApiError> {
    let song = songs::get_song(&state.db, &guid).await?;
    Ok(Json(song))
}

/// POST /songs
///
/// Artist-only. An album reference must point at the caller's own
/// album; genre guids must all exist.
pub async fn create_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<NewSong>,
) -> Result<(StatusCode, Json<SongDetail>), ApiError> {
    let song = songs::create_song(&state.db, &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

/// PUT /songs/:guid
pub async fn update_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
    Json(patch): Json<SongPatch>,
) -> Result<Json<SongDetail>, ApiError> {
    let song = songs::update_song(&state.db, &user, &guid, &patch).await?;
    Ok(Json(song))
}

/// DELETE /songs/:guid
pub async fn delete_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    songs::delete_song(&state.db, &user, &guid).await?;
    Ok(Json(json!({"message": "Song deleted successfully"})))
}

/// POST /songs/:guid/like
pub async fn like_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    songs::like_song(&state.db, &user.guid, &guid).await?;
    Ok(Json(json!({"message": "Song liked successfully"})))
}

/// DELETE /songs/:guid/like
pub async fn unlike_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    songs::unlike_song(&state.db, &user.guid, &guid).await?;
    Ok(Json(json!({"message": "Song unliked successfully"})))
}

/// GET /songs/:guid/is-liked
pub async fn is_song_liked(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let liked = songs::is_liked(&state.db, &user.guid, &guid).await?;
    Ok(Json(json!({"is_liked": liked})))
}

/// POST /songs/check-likes
///
/// Body is a bare JSON array of song guids; the response maps each
/// guid to its like state. Unknown guids come back false.
pub async fn check_likes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(guids): Json<Vec<String>>,
) -> Result<Json<HashMap<String, bool>>, ApiError> {
    let map = songs::check_likes(&state.db, &user.guid, &guids).await?;
    Ok(Json(map))
}

/// GET /me/songs/liked
pub async fn list_liked_songs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let songs = songs::list_liked_songs(&state.db, &user.guid, query.page()).await?;
    Ok(Json(songs))
}

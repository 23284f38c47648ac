//! Genre endpoints
//!
//! Genres are a shared vocabulary: any authenticated user may create
//! or edit them, reads are public.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use trill_common::db::genres;
use trill_common::db::models::{Genre, GenrePatch, NewGenre, Song};

use super::auth::CurrentUser;
use super::error::ApiError;
use super::PageQuery;
use crate::AppState;

/// GET /genres
pub async fn list_genres(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Genre>>, ApiError> {
    let genres = genres::list_genres(&state.db, query.page()).await?;
    Ok(Json(genres))
}

/// GET /genres/:guid
pub async fn get_genre(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Genre>, ApiError> {
    let genre = genres::get_genre(&state.db, &guid).await?;
    Ok(Json(genre))
}

/// POST /genres
pub async fn create_genre(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(payload): Json<NewGenre>,
) -> Result<(StatusCode, Json<Genre>), ApiError> {
    let genre = genres::create_genre(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// PUT /genres/:guid
pub async fn update_genre(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(guid): Path<String>,
    Json(patch): Json<GenrePatch>,
) -> Result<Json<Genre>, ApiError> {
    let genre = genres::update_genre(&state.db, &guid, &patch).await?;
    Ok(Json(genre))
}

/// DELETE /genres/:guid
///
/// Songs tagged with the genre keep existing; only the links go.
pub async fn delete_genre(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    genres::delete_genre(&state.db, &guid).await?;
    Ok(Json(json!({"message": "Genre deleted successfully"})))
}

/// GET /genres/:guid/songs
pub async fn list_genre_songs(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let songs = genres::list_genre_songs(&state.db, &guid, query.page()).await?;
    Ok(Json(songs))
}

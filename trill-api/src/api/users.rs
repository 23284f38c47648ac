//! User profile, account, and follow endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use trill_common::db::models::{Album, Playlist, ProfilePatch, PublicUser, Song};
use trill_common::db::songs::SongFilter;
use trill_common::db::{albums, playlists, songs, users};

use super::auth::CurrentUser;
use super::error::ApiError;
use super::PageQuery;
use crate::AppState;

/// Follow state of a target user, from the caller's point of view
#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub is_following: bool,
    pub follower_count: i64,
    pub following_count: i64,
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = users::list_users(&state.db, query.page()).await?;
    Ok(Json(users))
}

/// GET /users/:guid
pub async fn get_user(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = users::get_public_user(&state.db, &guid).await?;
    Ok(Json(user))
}

/// PUT /users/me
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<PublicUser>, ApiError> {
    let updated = users::update_profile(&state.db, &user.guid, &patch).await?;
    Ok(Json(updated))
}

/// DELETE /users/me
///
/// Deletes the account and everything hanging off it: songs, albums,
/// playlists, likes, follows.
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    users::delete_user(&state.db, &user.guid).await?;
    Ok(Json(json!({"message": "User deleted successfully"})))
}

/// GET /users/:guid/songs
pub async fn list_user_songs(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    users::get_public_user(&state.db, &guid).await?;

    let filter = SongFilter {
        artist_guid: Some(guid),
        ..SongFilter::default()
    };
    let songs = songs::list_songs(&state.db, &filter, query.page()).await?;
    Ok(Json(songs))
}

/// GET /users/:guid/albums
pub async fn list_user_albums(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Album>>, ApiError> {
    users::get_public_user(&state.db, &guid).await?;

    let albums = albums::list_albums(&state.db, Some(&guid), query.page()).await?;
    Ok(Json(albums))
}

/// GET /users/:guid/playlists
///
/// The target's playlists as the caller may see them; private ones
/// appear only when the caller is the target.
pub async fn list_user_playlists(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(guid): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Playlist>>, ApiError> {
    users::get_public_user(&state.db, &guid).await?;

    let playlists =
        playlists::list_user_playlists(&state.db, &viewer, &guid, query.page()).await?;
    Ok(Json(playlists))
}

/// POST /users/:guid/follow
pub async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    users::follow(&state.db, &user.guid, &guid).await?;
    follow_response(&state, &guid, true).await
}

/// DELETE /users/:guid/follow
pub async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    users::get_public_user(&state.db, &guid).await?;
    users::unfollow(&state.db, &user.guid, &guid).await?;
    follow_response(&state, &guid, false).await
}

/// GET /users/:guid/follow
pub async fn follow_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    users::get_public_user(&state.db, &guid).await?;
    let is_following = users::is_following(&state.db, &user.guid, &guid).await?;
    follow_response(&state, &guid, is_following).await
}

/// GET /users/:guid/followers
pub async fn list_followers(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let followers = users::list_followers(&state.db, &guid, query.page()).await?;
    Ok(Json(followers))
}

/// GET /users/:guid/following
pub async fn list_following(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let following = users::list_following(&state.db, &guid, query.page()).await?;
    Ok(Json(following))
}

/// Follow counts always describe the target user, not the caller
async fn follow_response(
    state: &AppState,
    target_guid: &str,
    is_following: bool,
) -> Result<Json<FollowResponse>, ApiError> {
    let (follower_count, following_count) = users::follow_counts(&state.db, target_guid).await?;
    Ok(Json(FollowResponse {
        is_following,
        follower_count,
        following_count,
    }))
}

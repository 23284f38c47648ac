//! Playlist resource operations
//!
//! Playlists carry a visibility flag: public ones are readable by any
//! authenticated user, private ones only by their owner. Mutation is
//! always owner-only. Membership keeps insertion order via a position
//! column.

use crate::auth::guard::{self, Action, AuthUser, Ownership};
use crate::db::models::{NewPlaylist, Playlist, PlaylistPatch, Song};
use crate::db::users::like_pattern;
use crate::db::Page;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

pub async fn create_playlist(
    pool: &SqlitePool,
    owner: &AuthUser,
    new: &NewPlaylist,
) -> Result<Playlist> {
    new.validate()?;

    let guid = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO playlists (guid, name, description, owner_guid, is_public, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(new.name.trim())
    .bind(&new.description)
    .bind(&owner.guid)
    .bind(new.is_public)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    info!("Playlist {} created by {}", guid, owner.username);

    fetch_playlist(pool, &guid).await
}

/// Fetch a playlist the viewer is allowed to see
///
/// Private playlists are `Forbidden` for anyone but the owner; the row
/// is not hidden behind a 404 so the caller can distinguish "not yours"
/// from "does not exist".
pub async fn get_playlist(pool: &SqlitePool, viewer: &AuthUser, guid: &str) -> Result<Playlist> {
    let playlist = fetch_playlist(pool, guid).await?;
    guard::authorize(
        viewer,
        Ownership::visible(&playlist.owner_guid, playlist.is_public),
        Action::Read,
        "playlist",
    )?;

    Ok(playlist)
}

/// Playlists visible to the viewer: their own plus every public one
pub async fn list_playlists(pool: &SqlitePool, viewer: &AuthUser, page: Page) -> Result<Vec<Playlist>> {
    let playlists: Vec<Playlist> = sqlx::query_as(
        r#"
        SELECT * FROM playlists
        WHERE is_public = 1 OR owner_guid = ?
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&viewer.guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(playlists)
}

/// One user's playlists as seen by the viewer (all when self, public
/// otherwise)
pub async fn list_user_playlists(
    pool: &SqlitePool,
    viewer: &AuthUser,
    user_guid: &str,
    page: Page,
) -> Result<Vec<Playlist>> {
    let playlists: Vec<Playlist> = sqlx::query_as(
        r#"
        SELECT * FROM playlists
        WHERE owner_guid = ?1 AND (is_public = 1 OR owner_guid = ?2)
        ORDER BY created_at DESC
        LIMIT ?3 OFFSET ?4
        "#,
    )
    .bind(user_guid)
    .bind(&viewer.guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(playlists)
}

/// Case-insensitive substring search over playlist names the viewer
/// may see. Anonymous viewers only match public playlists.
pub async fn search_playlists(
    pool: &SqlitePool,
    viewer: Option<&AuthUser>,
    query: &str,
    page: Page,
) -> Result<Vec<Playlist>> {
    let pattern = like_pattern(query)?;
    // Guids are UUIDs, so the empty string matches no owner
    let viewer_guid = viewer.map(|v| v.guid.as_str()).unwrap_or("");

    let playlists: Vec<Playlist> = sqlx::query_as(
        r#"
        SELECT * FROM playlists
        WHERE name LIKE ? ESCAPE '\' AND (is_public = 1 OR owner_guid = ?)
        ORDER BY name
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&pattern)
    .bind(viewer_guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(playlists)
}

pub async fn update_playlist(
    pool: &SqlitePool,
    acting: &AuthUser,
    guid: &str,
    patch: &PlaylistPatch,
) -> Result<Playlist> {
    let current = fetch_playlist(pool, guid).await?;
    guard::authorize(
        acting,
        Ownership::visible(&current.owner_guid, current.is_public),
        Action::Modify,
        "playlist",
    )?;
    patch.validate()?;

    sqlx::query(
        r#"
        UPDATE playlists
        SET name = COALESCE(?, name),
            description = COALESCE(?, description),
            is_public = COALESCE(?, is_public),
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(patch.name.as_deref().map(str::trim))
    .bind(&patch.description)
    .bind(patch.is_public)
    .bind(Utc::now())
    .bind(guid)
    .execute(pool)
    .await?;

    fetch_playlist(pool, guid).await
}

pub async fn delete_playlist(pool: &SqlitePool, acting: &AuthUser, guid: &str) -> Result<()> {
    let current = fetch_playlist(pool, guid).await?;
    guard::authorize(
        acting,
        Ownership::visible(&current.owner_guid, current.is_public),
        Action::Delete,
        "playlist",
    )?;

    sqlx::query("DELETE FROM playlists WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    info!("Playlist {} deleted by {}", guid, acting.username);
    Ok(())
}

/// Append a song to a playlist (owner only)
///
/// Any user's song can be added to one's own playlist. Re-adding is a
/// conflict, mirroring like-uniqueness. Position is MAX+1 so playback
/// order is insertion order.
pub async fn add_song(
    pool: &SqlitePool,
    acting: &AuthUser,
    playlist_guid: &str,
    song_guid: &str,
) -> Result<()> {
    let playlist = fetch_playlist(pool, playlist_guid).await?;
    guard::authorize(
        acting,
        Ownership::visible(&playlist.owner_guid, playlist.is_public),
        Action::Modify,
        "playlist",
    )?;

    let song_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM songs WHERE guid = ?)")
        .bind(song_guid)
        .fetch_one(pool)
        .await?;
    if !song_exists {
        return Err(Error::NotFound("Song not found".to_string()));
    }

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM playlist_songs WHERE playlist_guid = ? AND song_guid = ?)",
    )
    .bind(playlist_guid)
    .bind(song_guid)
    .fetch_one(pool)
    .await?;
    if already {
        return Err(Error::Conflict("Song already in playlist".to_string()));
    }

    let mut tx = pool.begin().await?;

    let next_position: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM playlist_songs WHERE playlist_guid = ?",
    )
    .bind(playlist_guid)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO playlist_songs (playlist_guid, song_guid, position) VALUES (?, ?, ?)",
    )
    .bind(playlist_guid)
    .bind(song_guid)
    .bind(next_position)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE playlists SET updated_at = ? WHERE guid = ?")
        .bind(Utc::now())
        .bind(playlist_guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Remove a song from a playlist (owner only); absent membership is
/// `NotFound`. Positions of later entries keep their values, order is
/// still correct.
pub async fn remove_song(
    pool: &SqlitePool,
    acting: &AuthUser,
    playlist_guid: &str,
    song_guid: &str,
) -> Result<()> {
    let playlist = fetch_playlist(pool, playlist_guid).await?;
    guard::authorize(
        acting,
        Ownership::visible(&playlist.owner_guid, playlist.is_public),
        Action::Modify,
        "playlist",
    )?;

    let mut tx = pool.begin().await?;

    let result =
        sqlx::query("DELETE FROM playlist_songs WHERE playlist_guid = ? AND song_guid = ?")
            .bind(playlist_guid)
            .bind(song_guid)
            .execute(&mut *tx)
            .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Song not in playlist".to_string()));
    }

    sqlx::query("UPDATE playlists SET updated_at = ? WHERE guid = ?")
        .bind(Utc::now())
        .bind(playlist_guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Songs of a playlist in insertion order (visibility as get)
pub async fn list_songs(
    pool: &SqlitePool,
    viewer: &AuthUser,
    playlist_guid: &str,
    page: Page,
) -> Result<Vec<Song>> {
    let playlist = fetch_playlist(pool, playlist_guid).await?;
    guard::authorize(
        viewer,
        Ownership::visible(&playlist.owner_guid, playlist.is_public),
        Action::Read,
        "playlist",
    )?;

    let songs: Vec<Song> = sqlx::query_as(
        r#"
        SELECT s.* FROM songs s
        JOIN playlist_songs ps ON ps.song_guid = s.guid
        WHERE ps.playlist_guid = ?
        ORDER BY ps.position
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(playlist_guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(songs)
}

/// Row fetch without visibility rules (internal)
async fn fetch_playlist(pool: &SqlitePool, guid: &str) -> Result<Playlist> {
    let playlist: Option<Playlist> = sqlx::query_as("SELECT * FROM playlists WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    playlist.ok_or_else(|| Error::NotFound("Playlist not found".to_string()))
}

//! Album resource operations

use crate::auth::guard::{self, Action, AuthUser, Ownership};
use crate::db::models::{Album, AlbumPatch, NewAlbum, Song};
use crate::db::users::like_pattern;
use crate::db::Page;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Create an album (artist role required)
pub async fn create_album(pool: &SqlitePool, artist: &AuthUser, new: &NewAlbum) -> Result<Album> {
    guard::require_artist(artist, "create albums")?;
    new.validate()?;

    let guid = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO albums (guid, title, artist_guid, cover_ref, release_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(new.title.trim())
    .bind(&artist.guid)
    .bind(&new.cover_ref)
    .bind(&new.release_date)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    info!("Album {} created by {}", guid, artist.username);

    get_album(pool, &guid).await
}

pub async fn get_album(pool: &SqlitePool, guid: &str) -> Result<Album> {
    let album: Option<Album> = sqlx::query_as("SELECT * FROM albums WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    album.ok_or_else(|| Error::NotFound("Album not found".to_string()))
}

/// List albums, newest first, optionally restricted to one artist
pub async fn list_albums(
    pool: &SqlitePool,
    artist_guid: Option<&str>,
    page: Page,
) -> Result<Vec<Album>> {
    let albums: Vec<Album> = sqlx::query_as(
        r#"
        SELECT * FROM albums
        WHERE (?1 IS NULL OR artist_guid = ?1)
        ORDER BY created_at DESC
        LIMIT ?2 OFFSET ?3
        "#,
    )
    .bind(artist_guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(albums)
}

/// Case-insensitive substring search over album titles
pub async fn search_albums(pool: &SqlitePool, query: &str, page: Page) -> Result<Vec<Album>> {
    let pattern = like_pattern(query)?;

    let albums: Vec<Album> = sqlx::query_as(
        r#"
        SELECT * FROM albums
        WHERE title LIKE ? ESCAPE '\'
        ORDER BY title
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&pattern)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(albums)
}

/// Update an album (owner only)
pub async fn update_album(
    pool: &SqlitePool,
    acting: &AuthUser,
    guid: &str,
    patch: &AlbumPatch,
) -> Result<Album> {
    let current = get_album(pool, guid).await?;
    guard::authorize(
        acting,
        Ownership::owned(&current.artist_guid),
        Action::Modify,
        "album",
    )?;
    patch.validate()?;

    sqlx::query(
        r#"
        UPDATE albums
        SET title = COALESCE(?, title),
            cover_ref = COALESCE(?, cover_ref),
            release_date = COALESCE(?, release_date),
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(patch.title.as_deref().map(str::trim))
    .bind(&patch.cover_ref)
    .bind(&patch.release_date)
    .bind(Utc::now())
    .bind(guid)
    .execute(pool)
    .await?;

    get_album(pool, guid).await
}

/// Delete an album (owner only)
///
/// Songs on the album survive: their `album_guid` becomes NULL via the
/// foreign key's ON DELETE SET NULL.
pub async fn delete_album(pool: &SqlitePool, acting: &AuthUser, guid: &str) -> Result<()> {
    let current = get_album(pool, guid).await?;
    guard::authorize(
        acting,
        Ownership::owned(&current.artist_guid),
        Action::Delete,
        "album",
    )?;

    sqlx::query("DELETE FROM albums WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    info!("Album {} deleted by {}", guid, acting.username);
    Ok(())
}

/// Songs on an album, oldest first (track addition order)
pub async fn list_album_songs(pool: &SqlitePool, guid: &str, page: Page) -> Result<Vec<Song>> {
    get_album(pool, guid).await?;

    let songs: Vec<Song> = sqlx::query_as(
        r#"
        SELECT * FROM songs
        WHERE album_guid = ?
        ORDER BY created_at
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(songs)
}

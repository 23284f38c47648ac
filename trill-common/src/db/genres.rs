//! Genre resource operations
//!
//! Genres are a shared vocabulary: any authenticated user may create
//! one, nobody owns one, and names are unique.

use crate::db::models::{Genre, GenrePatch, NewGenre, Song};
use crate::db::users::like_pattern;
use crate::db::Page;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn create_genre(pool: &SqlitePool, new: &NewGenre) -> Result<Genre> {
    new.validate()?;

    let name = new.name.trim();
    if name_taken(pool, name, None).await? {
        return Err(Error::Conflict("Genre already exists".to_string()));
    }

    let guid = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO genres (guid, name, description, created_at) VALUES (?, ?, ?, ?)")
        .bind(&guid)
        .bind(name)
        .bind(&new.description)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    get_genre(pool, &guid).await
}

pub async fn get_genre(pool: &SqlitePool, guid: &str) -> Result<Genre> {
    let genre: Option<Genre> = sqlx::query_as("SELECT * FROM genres WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    genre.ok_or_else(|| Error::NotFound("Genre not found".to_string()))
}

pub async fn list_genres(pool: &SqlitePool, page: Page) -> Result<Vec<Genre>> {
    let genres: Vec<Genre> =
        sqlx::query_as("SELECT * FROM genres ORDER BY name LIMIT ? OFFSET ?")
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool)
            .await?;

    Ok(genres)
}

/// Case-insensitive substring search over genre names
pub async fn search_genres(pool: &SqlitePool, query: &str, page: Page) -> Result<Vec<Genre>> {
    let pattern = like_pattern(query)?;

    let genres: Vec<Genre> = sqlx::query_as(
        r#"
        SELECT * FROM genres
        WHERE name LIKE ? ESCAPE '\'
        ORDER BY name
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&pattern)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(genres)
}

/// Rename or re-describe a genre; the new name must stay unique
pub async fn update_genre(pool: &SqlitePool, guid: &str, patch: &GenrePatch) -> Result<Genre> {
    get_genre(pool, guid).await?;
    patch.validate()?;

    if let Some(name) = &patch.name {
        if name_taken(pool, name.trim(), Some(guid)).await? {
            return Err(Error::Conflict("Genre already exists".to_string()));
        }
    }

    sqlx::query(
        r#"
        UPDATE genres
        SET name = COALESCE(?, name),
            description = COALESCE(?, description)
        WHERE guid = ?
        "#,
    )
    .bind(patch.name.as_deref().map(str::trim))
    .bind(&patch.description)
    .bind(guid)
    .execute(pool)
    .await?;

    get_genre(pool, guid).await
}

/// Delete a genre; song links cascade, songs survive
pub async fn delete_genre(pool: &SqlitePool, guid: &str) -> Result<()> {
    get_genre(pool, guid).await?;

    sqlx::query("DELETE FROM genres WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

/// Songs tagged with a genre, newest first
pub async fn list_genre_songs(pool: &SqlitePool, guid: &str, page: Page) -> Result<Vec<Song>> {
    get_genre(pool, guid).await?;

    let songs: Vec<Song> = sqlx::query_as(
        r#"
        SELECT s.* FROM songs s
        JOIN song_genres sg ON sg.song_guid = s.guid
        WHERE sg.genre_guid = ?
        ORDER BY s.created_at DESC
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

/// Name uniqueness check, optionally excluding one guid (for renames)
async fn name_taken(pool: &SqlitePool, name: &str, exclude_guid: Option<&str>) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM genres WHERE name = ?1 AND (?2 IS NULL OR guid != ?2))",
    )
    .bind(name)
    .bind(exclude_guid)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

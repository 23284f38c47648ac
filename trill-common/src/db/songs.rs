//! Song resource operations: CRUD, likes, genre links, search

use crate::auth::guard::{self, Action, AuthUser, Ownership};
use crate::db::models::{NewSong, Song, SongDetail, SongPatch};
use crate::db::users::like_pattern;
use crate::db::Page;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Optional listing filters; all unset means every song
#[derive(Debug, Clone, Default)]
pub struct SongFilter {
    pub artist_guid: Option<String>,
    pub album_guid: Option<String>,
    pub genre_guid: Option<String>,
}

/// Create a song (artist role required)
///
/// The song row and its genre links are written in one transaction.
pub async fn create_song(pool: &SqlitePool, artist: &AuthUser, new: &NewSong) -> Result<SongDetail> {
    guard::require_artist(artist, "create songs")?;
    new.validate()?;

    if let Some(album_guid) = &new.album_guid {
        check_album_owner(pool, album_guid, &artist.guid).await?;
    }
    check_genres_exist(pool, &new.genre_guids).await?;

    let guid = Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO songs (guid, title, duration_secs, audio_ref, cover_ref, artist_guid, album_guid, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(new.title.trim())
    .bind(new.duration_secs)
    .bind(&new.audio_ref)
    .bind(&new.cover_ref)
    .bind(&artist.guid)
    .bind(&new.album_guid)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for genre_guid in &new.genre_guids {
        sqlx::query("INSERT OR IGNORE INTO song_genres (song_guid, genre_guid) VALUES (?, ?)")
            .bind(&guid)
            .bind(genre_guid)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!("Song {} created by {}", guid, artist.username);

    get_song(pool, &guid).await
}

/// Fetch a song with its genre names
pub async fn get_song(pool: &SqlitePool, guid: &str) -> Result<SongDetail> {
    let song: Option<Song> = sqlx::query_as("SELECT * FROM songs WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    let song = song.ok_or_else(|| Error::NotFound("Song not found".to_string()))?;
    let genres = genre_names(pool, guid).await?;

    Ok(SongDetail { song, genres })
}

/// List songs, newest first, with optional artist/album/genre filters
pub async fn list_songs(pool: &SqlitePool, filter: &SongFilter, page: Page) -> Result<Vec<Song>> {
    let songs: Vec<Song> = sqlx::query_as(
        r#"
        SELECT * FROM songs
        WHERE (?1 IS NULL OR artist_guid = ?1)
          AND (?2 IS NULL OR album_guid = ?2)
          AND (?3 IS NULL OR guid IN (SELECT song_guid FROM song_genres WHERE genre_guid = ?3))
        ORDER BY created_at DESC
        LIMIT ?4 OFFSET ?5
        "#,
    )
    .bind(&filter.artist_guid)
    .bind(&filter.album_guid)
    .bind(&filter.genre_guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(songs)
}

/// Case-insensitive substring search over song titles
pub async fn search_songs(pool: &SqlitePool, query: &str, page: Page) -> Result<Vec<Song>> {
    let pattern = like_pattern(query)?;

    let songs: Vec<Song> = sqlx::query_as(
        r#"
        SELECT * FROM songs
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

    Ok(songs)
}

/// Update a song (owner only)
///
/// `album_guid` is tri-state: absent keeps the current album, null
/// clears it, a value re-links after ownership validation. A present
/// `genre_guids` list replaces the genre set wholesale.
pub async fn update_song(
    pool: &SqlitePool,
    acting: &AuthUser,
    guid: &str,
    patch: &SongPatch,
) -> Result<SongDetail> {
    let current = get_song(pool, guid).await?;
    guard::authorize(
        acting,
        Ownership::owned(&current.song.artist_guid),
        Action::Modify,
        "song",
    )?;
    patch.validate()?;

    if let Some(Some(album_guid)) = &patch.album_guid {
        check_album_owner(pool, album_guid, &current.song.artist_guid).await?;
    }
    if let Some(genre_guids) = &patch.genre_guids {
        check_genres_exist(pool, genre_guids).await?;
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE songs
        SET title = COALESCE(?, title),
            duration_secs = COALESCE(?, duration_secs),
            audio_ref = COALESCE(?, audio_ref),
            cover_ref = COALESCE(?, cover_ref),
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(patch.title.as_deref().map(str::trim))
    .bind(patch.duration_secs)
    .bind(&patch.audio_ref)
    .bind(&patch.cover_ref)
    .bind(Utc::now())
    .bind(guid)
    .execute(&mut *tx)
    .await?;

    if let Some(album_guid) = &patch.album_guid {
        sqlx::query("UPDATE songs SET album_guid = ? WHERE guid = ?")
            .bind(album_guid)
            .bind(guid)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(genre_guids) = &patch.genre_guids {
        sqlx::query("DELETE FROM song_genres WHERE song_guid = ?")
            .bind(guid)
            .execute(&mut *tx)
            .await?;
        for genre_guid in genre_guids {
            sqlx::query("INSERT OR IGNORE INTO song_genres (song_guid, genre_guid) VALUES (?, ?)")
                .bind(guid)
                .bind(genre_guid)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    get_song(pool, guid).await
}

/// Delete a song (owner only)
///
/// Likes, playlist entries, and genre links cascade with the row.
pub async fn delete_song(pool: &SqlitePool, acting: &AuthUser, guid: &str) -> Result<()> {
    let current = get_song(pool, guid).await?;
    guard::authorize(
        acting,
        Ownership::owned(&current.song.artist_guid),
        Action::Delete,
        "song",
    )?;

    sqlx::query("DELETE FROM songs WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    info!("Song {} deleted by {}", guid, acting.username);
    Ok(())
}

// ===== Likes =====

/// Like a song. At most one like per (user, song); a second attempt
/// conflicts. The denormalized counter moves in the same transaction.
pub async fn like_song(pool: &SqlitePool, user_guid: &str, song_guid: &str) -> Result<()> {
    get_song(pool, song_guid).await?;

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM song_likes WHERE user_guid = ? AND song_guid = ?)",
    )
    .bind(user_guid)
    .bind(song_guid)
    .fetch_one(pool)
    .await?;
    if already {
        return Err(Error::Conflict("Song already liked".to_string()));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO song_likes (user_guid, song_guid) VALUES (?, ?)")
        .bind(user_guid)
        .bind(song_guid)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE songs SET like_count = like_count + 1 WHERE guid = ?")
        .bind(song_guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Remove a like; absent like is `NotFound`
pub async fn unlike_song(pool: &SqlitePool, user_guid: &str, song_guid: &str) -> Result<()> {
    get_song(pool, song_guid).await?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM song_likes WHERE user_guid = ? AND song_guid = ?")
        .bind(user_guid)
        .bind(song_guid)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Song not liked".to_string()));
    }

    sqlx::query("UPDATE songs SET like_count = like_count - 1 WHERE guid = ?")
        .bind(song_guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn is_liked(pool: &SqlitePool, user_guid: &str, song_guid: &str) -> Result<bool> {
    get_song(pool, song_guid).await?;

    let liked: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM song_likes WHERE user_guid = ? AND song_guid = ?)",
    )
    .bind(user_guid)
    .bind(song_guid)
    .fetch_one(pool)
    .await?;

    Ok(liked)
}

/// Like status for a batch of song guids in one round trip
///
/// Unknown guids come back as false rather than failing the batch.
pub async fn check_likes(
    pool: &SqlitePool,
    user_guid: &str,
    song_guids: &[String],
) -> Result<HashMap<String, bool>> {
    let mut map: HashMap<String, bool> = song_guids
        .iter()
        .map(|guid| (guid.clone(), false))
        .collect();

    let liked: Vec<String> =
        sqlx::query_scalar("SELECT song_guid FROM song_likes WHERE user_guid = ?")
            .bind(user_guid)
            .fetch_all(pool)
            .await?;

    for guid in liked {
        if let Some(entry) = map.get_mut(&guid) {
            *entry = true;
        }
    }

    Ok(map)
}

/// Songs the user has liked, most recent like first
pub async fn list_liked_songs(pool: &SqlitePool, user_guid: &str, page: Page) -> Result<Vec<Song>> {
    let songs: Vec<Song> = sqlx::query_as(
        r#"
        SELECT s.* FROM songs s
        JOIN song_likes l ON l.song_guid = s.guid
        WHERE l.user_guid = ?
        ORDER BY l.created_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(songs)
}

// ===== Helpers =====

async fn genre_names(pool: &SqlitePool, song_guid: &str) -> Result<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT g.name FROM genres g
        JOIN song_genres sg ON sg.genre_guid = g.guid
        WHERE sg.song_guid = ?
        ORDER BY g.name
        "#,
    )
    .bind(song_guid)
    .fetch_all(pool)
    .await?;

    Ok(names)
}

/// Album must exist and belong to the song's artist
async fn check_album_owner(pool: &SqlitePool, album_guid: &str, artist_guid: &str) -> Result<()> {
    let owner: Option<String> = sqlx::query_scalar("SELECT artist_guid FROM albums WHERE guid = ?")
        .bind(album_guid)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => Err(Error::NotFound("Album not found".to_string())),
        Some(owner) if owner != artist_guid => Err(Error::Validation(
            "Album belongs to a different artist".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

async fn check_genres_exist(pool: &SqlitePool, genre_guids: &[String]) -> Result<()> {
    for genre_guid in genre_guids {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM genres WHERE guid = ?)")
            .bind(genre_guid)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(Error::NotFound("Genre not found".to_string()));
        }
    }
    Ok(())
}

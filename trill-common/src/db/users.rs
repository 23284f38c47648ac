//! User resource operations: accounts, profiles, follows

use crate::auth::password;
use crate::db::models::{ProfilePatch, PublicUser, RegisterUser, User};
use crate::db::Page;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

const PUBLIC_COLUMNS: &str =
    "guid, email, username, display_name, bio, image_ref, is_artist, created_at";

/// Register a new user
///
/// Validates the payload, rejects duplicate email/username with
/// `Conflict`, and stores the Argon2 hash of the password. The
/// plaintext never leaves this function.
pub async fn create_user(pool: &SqlitePool, new: &RegisterUser) -> Result<PublicUser> {
    new.validate()?;

    let email = new.email.trim().to_lowercase();
    let username = new.username.trim().to_string();

    let email_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(&email)
            .fetch_one(pool)
            .await?;
    if email_taken {
        return Err(Error::Conflict("Email already registered".to_string()));
    }

    let username_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
            .bind(&username)
            .fetch_one(pool)
            .await?;
    if username_taken {
        return Err(Error::Conflict("Username already taken".to_string()));
    }

    let guid = Uuid::new_v4().to_string();
    let password_hash = password::hash_password(&new.password)?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (guid, email, username, password_hash, display_name, is_artist, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&email)
    .bind(&username)
    .bind(&password_hash)
    .bind(&new.display_name)
    .bind(new.is_artist)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    info!("Registered user {} ({})", username, guid);

    get_public_user(pool, &guid).await
}

/// Fetch a full user row (internal; includes the password hash)
pub async fn get_user(pool: &SqlitePool, guid: &str) -> Result<User> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    user.ok_or_else(|| Error::NotFound("User not found".to_string()))
}

/// Fetch the response-safe shape of a user
pub async fn get_public_user(pool: &SqlitePool, guid: &str) -> Result<PublicUser> {
    let user: Option<PublicUser> = sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE guid = ?",
        PUBLIC_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    user.ok_or_else(|| Error::NotFound("User not found".to_string()))
}

/// Look up a user by email for login. `None` means unknown email; the
/// caller folds that into a uniform credentials failure.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn list_users(pool: &SqlitePool, page: Page) -> Result<Vec<PublicUser>> {
    let users: Vec<PublicUser> = sqlx::query_as(&format!(
        "SELECT {} FROM users ORDER BY username LIMIT ? OFFSET ?",
        PUBLIC_COLUMNS
    ))
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Case-insensitive substring search over username and display name
pub async fn search_users(pool: &SqlitePool, query: &str, page: Page) -> Result<Vec<PublicUser>> {
    let pattern = like_pattern(query)?;

    let users: Vec<PublicUser> = sqlx::query_as(&format!(
        r#"
        SELECT {} FROM users
        WHERE username LIKE ? ESCAPE '\' OR display_name LIKE ? ESCAPE '\'
        ORDER BY username LIMIT ? OFFSET ?
        "#,
        PUBLIC_COLUMNS
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Update the caller's own profile fields
pub async fn update_profile(
    pool: &SqlitePool,
    guid: &str,
    patch: &ProfilePatch,
) -> Result<PublicUser> {
    patch.validate()?;

    // Existence check keeps the 404 ahead of a no-op UPDATE
    get_public_user(pool, guid).await?;

    sqlx::query(
        r#"
        UPDATE users
        SET display_name = COALESCE(?, display_name),
            bio = COALESCE(?, bio),
            image_ref = COALESCE(?, image_ref),
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&patch.display_name)
    .bind(&patch.bio)
    .bind(&patch.image_ref)
    .bind(Utc::now())
    .bind(guid)
    .execute(pool)
    .await?;

    get_public_user(pool, guid).await
}

/// Delete a user account
///
/// Owned songs, albums, playlists, likes, and follows go with it via
/// foreign-key cascade. Like counters on other users' songs are
/// adjusted in the same transaction before the cascade removes the
/// like rows.
pub async fn delete_user(pool: &SqlitePool, guid: &str) -> Result<()> {
    get_public_user(pool, guid).await?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE songs
        SET like_count = like_count - 1
        WHERE guid IN (SELECT song_guid FROM song_likes WHERE user_guid = ?)
          AND artist_guid != ?
        "#,
    )
    .bind(guid)
    .bind(guid)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM users WHERE guid = ?")
        .bind(guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Deleted user {}", guid);
    Ok(())
}

// ===== Follows =====

pub async fn follow(pool: &SqlitePool, follower_guid: &str, followed_guid: &str) -> Result<()> {
    if follower_guid == followed_guid {
        return Err(Error::Validation("Cannot follow yourself".to_string()));
    }

    // Target must exist
    get_public_user(pool, followed_guid).await?;

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM user_follows WHERE follower_guid = ? AND followed_guid = ?)",
    )
    .bind(follower_guid)
    .bind(followed_guid)
    .fetch_one(pool)
    .await?;
    if already {
        return Err(Error::Conflict("Already following this user".to_string()));
    }

    sqlx::query("INSERT INTO user_follows (follower_guid, followed_guid) VALUES (?, ?)")
        .bind(follower_guid)
        .bind(followed_guid)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn unfollow(pool: &SqlitePool, follower_guid: &str, followed_guid: &str) -> Result<()> {
    let result =
        sqlx::query("DELETE FROM user_follows WHERE follower_guid = ? AND followed_guid = ?")
            .bind(follower_guid)
            .bind(followed_guid)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Not following this user".to_string()));
    }

    Ok(())
}

pub async fn is_following(
    pool: &SqlitePool,
    follower_guid: &str,
    followed_guid: &str,
) -> Result<bool> {
    let following: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM user_follows WHERE follower_guid = ? AND followed_guid = ?)",
    )
    .bind(follower_guid)
    .bind(followed_guid)
    .fetch_one(pool)
    .await?;

    Ok(following)
}

pub async fn list_followers(pool: &SqlitePool, guid: &str, page: Page) -> Result<Vec<PublicUser>> {
    get_public_user(pool, guid).await?;

    let users: Vec<PublicUser> = sqlx::query_as(&format!(
        r#"
        SELECT {} FROM users
        WHERE guid IN (SELECT follower_guid FROM user_follows WHERE followed_guid = ?)
        ORDER BY username LIMIT ? OFFSET ?
        "#,
        PUBLIC_COLUMNS
    ))
    .bind(guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn list_following(pool: &SqlitePool, guid: &str, page: Page) -> Result<Vec<PublicUser>> {
    get_public_user(pool, guid).await?;

    let users: Vec<PublicUser> = sqlx::query_as(&format!(
        r#"
        SELECT {} FROM users
        WHERE guid IN (SELECT followed_guid FROM user_follows WHERE follower_guid = ?)
        ORDER BY username LIMIT ? OFFSET ?
        "#,
        PUBLIC_COLUMNS
    ))
    .bind(guid)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// (followers, following) counts for a user
pub async fn follow_counts(pool: &SqlitePool, guid: &str) -> Result<(i64, i64)> {
    let followers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_follows WHERE followed_guid = ?")
            .bind(guid)
            .fetch_one(pool)
            .await?;
    let following: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_follows WHERE follower_guid = ?")
            .bind(guid)
            .fetch_one(pool)
            .await?;

    Ok((followers, following))
}

/// Escape LIKE wildcards in user input and wrap in `%...%`
///
/// Rejects empty queries so a bare `%%` scan never runs.
pub(crate) fn like_pattern(query: &str) -> Result<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(
            "Search query cannot be empty".to_string(),
        ));
    }

    let escaped = trimmed
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Ok(format!("%{}%", escaped))
}

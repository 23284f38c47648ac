//! Database models and request payloads

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full user row. Deliberately not Serialize: the password hash must
/// never reach a response body. Convert to [`PublicUser`] first.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub guid: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    /// Opaque reference into external file storage
    pub image_ref: Option<String>,
    pub is_artist: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User shape safe for API responses
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicUser {
    pub guid: String,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub image_ref: Option<String>,
    pub is_artist: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            guid: user.guid,
            email: user.email,
            username: user.username,
            display_name: user.display_name,
            bio: user.bio,
            image_ref: user.image_ref,
            is_artist: user.is_artist,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub guid: String,
    pub title: String,
    pub duration_secs: Option<i64>,
    /// Opaque reference into external file storage
    pub audio_ref: Option<String>,
    pub cover_ref: Option<String>,
    pub artist_guid: String,
    pub album_guid: Option<String>,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Song plus its genre names, assembled for detail responses
#[derive(Debug, Clone, Serialize)]
pub struct SongDetail {
    #[serde(flatten)]
    pub song: Song,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Album {
    pub guid: String,
    pub title: String,
    pub artist_guid: String,
    pub cover_ref: Option<String>,
    pub release_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Playlist {
    pub guid: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_guid: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub guid: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ===== Request payloads =====

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_artist: bool,
}

impl RegisterUser {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;

        let username = self.username.trim();
        if username.len() < 3 || username.len() > 50 {
            return Err(Error::Validation(
                "Username must be between 3 and 50 characters".to_string(),
            ));
        }

        if self.password.len() < 8 {
            return Err(Error::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub image_ref: Option<String>,
}

impl ProfilePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.display_name {
            if name.len() > 100 {
                return Err(Error::Validation(
                    "Display name cannot exceed 100 characters".to_string(),
                ));
            }
        }
        if let Some(bio) = &self.bio {
            if bio.len() > 1000 {
                return Err(Error::Validation(
                    "Bio cannot exceed 1000 characters".to_string(),
                ));
            }
        }
        if let Some(image_ref) = &self.image_ref {
            if image_ref.len() > 500 {
                return Err(Error::Validation(
                    "Image reference cannot exceed 500 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub duration_secs: Option<i64>,
    pub audio_ref: Option<String>,
    pub cover_ref: Option<String>,
    pub album_guid: Option<String>,
    #[serde(default)]
    pub genre_guids: Vec<String>,
}

impl NewSong {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;

        if let Some(duration) = self.duration_secs {
            if duration <= 0 {
                return Err(Error::Validation(
                    "Song duration must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Field patch for song updates. `None` leaves a field untouched;
/// `album_guid`/`genre_guids` use a present-vs-absent wrapper so an
/// explicit null can clear the album.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongPatch {
    pub title: Option<String>,
    pub duration_secs: Option<i64>,
    pub audio_ref: Option<String>,
    pub cover_ref: Option<String>,
    #[serde(default, with = "double_option")]
    pub album_guid: Option<Option<String>>,
    pub genre_guids: Option<Vec<String>>,
}

impl SongPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(duration) = self.duration_secs {
            if duration <= 0 {
                return Err(Error::Validation(
                    "Song duration must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    pub cover_ref: Option<String>,
    pub release_date: Option<String>,
}

impl NewAlbum {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumPatch {
    pub title: Option<String>,
    pub cover_ref: Option<String>,
    pub release_date: Option<String>,
}

impl AlbumPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlaylist {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl NewPlaylist {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name, "Playlist name")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl PlaylistPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name, "Playlist name")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGenre {
    pub name: String,
    pub description: Option<String>,
}

impl NewGenre {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name, "Genre name")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenrePatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl GenrePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name, "Genre name")?;
        }
        Ok(())
    }
}

// ===== Validation helpers =====

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let well_formed = email.len() >= 3
        && email.len() <= 254
        && email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@')
        && !email.contains(char::is_whitespace);

    if !well_formed {
        return Err(Error::Validation("Invalid email address".to_string()));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("Title cannot be empty".to_string()));
    }
    if title.len() > 200 {
        return Err(Error::Validation(
            "Title cannot exceed 200 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str, what: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", what)));
    }
    if name.len() > 100 {
        return Err(Error::Validation(format!(
            "{} cannot exceed 100 characters",
            what
        )));
    }
    Ok(())
}

/// Deserialize `Option<Option<T>>` so a JSON null clears the field while
/// an absent key leaves it untouched
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

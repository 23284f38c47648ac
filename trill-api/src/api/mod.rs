//! HTTP API handlers for trill-api

use serde::Deserialize;
use trill_common::db::Page;

pub mod albums;
pub mod auth;
pub mod error;
pub mod genres;
pub mod health;
pub mod playlists;
pub mod search;
pub mod songs;
pub mod users;

pub use albums::{
    create_album, delete_album, get_album, list_album_songs, list_albums, update_album,
};
pub use auth::{login, me, register, CurrentUser};
pub use error::ApiError;
pub use genres::{
    create_genre, delete_genre, get_genre, list_genre_songs, list_genres, update_genre,
};
pub use health::health_routes;
pub use playlists::{
    add_playlist_song, create_playlist, delete_playlist, get_playlist, list_playlist_songs,
    list_playlists, remove_playlist_song, update_playlist,
};
pub use search::{search_albums, search_genres, search_playlists, search_songs, search_users};
pub use songs::{
    check_likes, create_song, delete_song, get_song, is_song_liked, like_song, list_liked_songs,
    list_songs, unlike_song, update_song,
};
pub use users::{
    delete_me, follow_status, follow_user, get_user, list_followers, list_following, list_users,
    list_user_albums, list_user_playlists, list_user_songs, unfollow_user, update_me,
};

/// Pagination query parameters shared by every listing endpoint
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    /// Clamp to store limits (default 50, max 100)
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

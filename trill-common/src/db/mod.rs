//! Database schema, models, and per-entity queries

pub mod albums;
pub mod genres;
pub mod init;
pub mod models;
pub mod playlists;
pub mod settings;
pub mod songs;
pub mod users;

pub use init::*;
pub use models::*;

/// Page window for listing queries
///
/// Limit defaults to 50 and is clamped to 100; offset is clamped to
/// non-negative. Out-of-range input is sanitized rather than rejected.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        Page { limit, offset }
    }
}

//! Access control guard
//!
//! The single place where identity and permission decisions happen.
//! Handlers and resource operations call [`authenticate`] /
//! [`authorize`] / [`require_artist`] instead of comparing guids inline,
//! so the rules stay centrally testable.

use crate::auth::token::TokenService;
use crate::{AuthError, Error, Result};
use sqlx::SqlitePool;

/// Authenticated identity attached to a request
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub guid: String,
    pub username: String,
    pub is_artist: bool,
}

/// What an operation wants to do with a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Modify,
    Delete,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Read => "view",
            Action::Modify => "modify",
            Action::Delete => "delete",
        }
    }
}

/// Ownership and visibility of a resource, as the guard sees it
#[derive(Debug, Clone, Copy)]
pub struct Ownership<'a> {
    pub owner_guid: &'a str,
    pub public: bool,
}

impl<'a> Ownership<'a> {
    /// A resource only its owner may touch
    pub fn owned(owner_guid: &'a str) -> Self {
        Ownership {
            owner_guid,
            public: false,
        }
    }

    /// A resource with a visibility flag (readable by anyone when public)
    pub fn visible(owner_guid: &'a str, public: bool) -> Self {
        Ownership { owner_guid, public }
    }
}

/// Verify a bearer token and load its subject user
///
/// Token failures surface as the corresponding [`AuthError`]; a token
/// whose subject no longer exists (user deleted after issue) is
/// `UserNotFound`. Database faults stay `Error::Database`.
pub async fn authenticate(
    pool: &SqlitePool,
    tokens: &TokenService,
    token: &str,
) -> Result<AuthUser> {
    let claims = tokens.verify(token)?;

    let user: Option<AuthUser> =
        sqlx::query_as("SELECT guid, username, is_artist FROM users WHERE guid = ?")
            .bind(&claims.sub)
            .fetch_optional(pool)
            .await?;

    user.ok_or(Error::Auth(AuthError::UserNotFound))
}

/// Check that `user` may perform `action` on a resource with the given
/// ownership
///
/// Reads succeed for public resources or the owner; modification and
/// deletion are owner-only. `what` names the resource kind in the
/// error message ("song", "playlist", ...).
pub fn authorize(user: &AuthUser, ownership: Ownership<'_>, action: Action, what: &str) -> Result<()> {
    let is_owner = user.guid == ownership.owner_guid;

    let allowed = match action {
        Action::Read => ownership.public || is_owner,
        Action::Modify | Action::Delete => is_owner,
    };

    if allowed {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "Not authorized to {} this {}",
            action.verb(),
            what
        )))
    }
}

/// Gate an operation on the artist role
///
/// `action` completes the error message: "Only artists can {action}".
pub fn require_artist(user: &AuthUser, action: &str) -> Result<()> {
    if user.is_artist {
        Ok(())
    } else {
        Err(Error::InsufficientRole(format!(
            "Only artists can {}",
            action
        )))
    }
}

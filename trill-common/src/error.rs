//! Common error types for Trill

use thiserror::Error;

/// Common result type for Trill operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Trill crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request payload failed validation; nothing was written
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication failure (token or identity)
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authenticated user does not own the target resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Authenticated user lacks the role the operation requires
    #[error("Insufficient role: {0}")]
    InsufficientRole(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write conflicts with existing state (duplicate key or association)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Uniqueness pre-checks are not transactional with their INSERTs; a
/// concurrent writer can lose the race and hit the schema's UNIQUE or
/// primary-key constraint directly. Surface that as a conflict.
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Error::Conflict("Resource already exists".to_string());
            }
        }
        Error::Database(err)
    }
}

/// Token and identity verification failures
///
/// Every variant maps to HTTP 401. The variants are distinct so logs and
/// tests can tell a stale token from a forged one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token expiry timestamp is in the past
    #[error("Token expired")]
    ExpiredToken,

    /// Token signature does not match the payload
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token is structurally invalid (encoding, shape, or claims)
    #[error("Malformed token")]
    MalformedToken,

    /// Token verified but the subject user no longer exists
    #[error("User not found")]
    UserNotFound,
}

//! Store-to-HTTP error mapping
//!
//! Every error leaves as `{"error": "<message>"}` with the status the
//! variant dictates. Database and I/O failures are logged server-side
//! and reported with a generic message; their details never reach the
//! client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;
use trill_common::{AuthError, Error};

/// HTTP-facing error for all handlers
#[derive(Debug)]
pub enum ApiError {
    /// An error from the shared store, mapped by variant
    Store(Error),
    /// Login rejection; one message for bad email and bad password
    Unauthorized(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Store(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Store(Error::Auth(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Store(err) => match err {
                Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
                Error::Auth(auth) => (StatusCode::UNAUTHORIZED, auth.to_string()),
                Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
                Error::InsufficientRole(msg) => (StatusCode::FORBIDDEN, msg),
                Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
                Error::Conflict(msg) => (StatusCode::CONFLICT, msg),
                Error::Database(e) => {
                    error!("Database error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
                Error::Io(e) => {
                    error!("IO error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
                Error::Config(msg) | Error::Internal(msg) => {
                    error!("Internal error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

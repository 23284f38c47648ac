//! Registration, login, and the bearer-token extractor
//!
//! Protected handlers declare a [`CurrentUser`] argument; extraction
//! parses the `Authorization: Bearer` header, verifies the token
//! signature and expiry, and loads the subject row. Any failure
//! rejects the request with 401 before the handler body runs.

use axum::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;
use trill_common::auth::{guard, verify_password, AuthUser};
use trill_common::db::models::{PublicUser, RegisterUser};
use trill_common::db::users;
use trill_common::AuthError;

use super::error::ApiError;
use crate::AppState;

/// One rejection message for unknown email and wrong password
const LOGIN_FAILED: &str = "Incorrect email or password";

/// The authenticated caller, extracted from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = guard::authenticate(&state.db, &state.tokens, &token).await?;
        Ok(CurrentUser(user))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
///
/// A missing header, a non-Bearer scheme, or an empty token all read
/// as a malformed token.
fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MalformedToken)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedToken)?;
    if token.is_empty() {
        return Err(AuthError::MalformedToken.into());
    }

    Ok(token.to_string())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /auth/register
///
/// Creates an account and returns the public profile. Duplicate email
/// or username responds 409.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let user = users::create_user(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login
///
/// Verifies credentials and issues a bearer token. The 401 message
/// does not reveal whether the email exists.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = match users::find_by_email(&state.db, &payload.email).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown email");
            return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
        }
    };

    // An unparseable stored hash fails the login like a wrong password
    let verified = verify_password(&payload.password, &user.password_hash)
        .map_err(|_| ApiError::Unauthorized(LOGIN_FAILED.to_string()))?;
    if !verified {
        warn!("Failed login attempt for user {}", user.username);
        return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
    }

    let access_token = state.tokens.issue(&user.guid, user.is_artist);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.ttl_seconds(),
    }))
}

/// GET /auth/me (also GET /users/me)
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PublicUser>, ApiError> {
    let profile = users::get_public_user(&state.db, &user.guid).await?;
    Ok(Json(profile))
}

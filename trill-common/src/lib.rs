//! # Trill Common Library
//!
//! Shared code for the Trill music catalog service including:
//! - Database schema, models, and per-entity queries
//! - Credential hashing and bearer-token issuing/verification
//! - The access-control guard (ownership and role checks)
//! - Configuration loading
//! - Common error types

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use error::{AuthError, Error, Result};

//! Authentication and authorization
//!
//! - [`password`]: Argon2id credential hashing
//! - [`token`]: stateless signed bearer tokens
//! - [`guard`]: the access-control decisions built on both

pub mod guard;
pub mod password;
pub mod token;

pub use guard::{authenticate, authorize, require_artist, Action, AuthUser, Ownership};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

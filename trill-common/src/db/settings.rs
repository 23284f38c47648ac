//! Settings table access
//!
//! Key-value runtime settings plus the token signing key bootstrap.

use crate::Result;
use rand::RngCore;
use sqlx::SqlitePool;
use tracing::info;

/// Settings key holding the token signing key (64 hex chars)
pub const SIGNING_KEY_SETTING: &str = "token_signing_key";

/// Read a setting value
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?
        .flatten();

    Ok(value)
}

/// Write a setting value, creating it if missing
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read an integer setting, falling back to a default on absence or parse failure
pub async fn get_setting_i64(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    let value = get_setting(pool, key).await?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(default))
}

/// Token lifetime in seconds (settings-backed, default 24 hours)
pub async fn token_ttl_seconds(pool: &SqlitePool) -> Result<i64> {
    get_setting_i64(pool, "token_ttl_seconds", 86400).await
}

/// Load the token signing key, generating and persisting one on first run
///
/// The key is 32 random bytes hex-encoded. INSERT OR IGNORE handles two
/// processes racing to initialize; both then read back the same winner.
pub async fn load_or_init_signing_key(pool: &SqlitePool) -> Result<String> {
    if let Some(key) = get_setting(pool, SIGNING_KEY_SETTING).await? {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let generated = generate_signing_key();

    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(SIGNING_KEY_SETTING)
        .bind(&generated)
        .execute(pool)
        .await?;

    // Re-read in case another process won the insert race
    let key = get_setting(pool, SIGNING_KEY_SETTING)
        .await?
        .unwrap_or(generated);

    info!("Token signing key initialized");
    Ok(key)
}

/// Generate a fresh signing key: 32 random bytes, hex-encoded
pub fn generate_signing_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

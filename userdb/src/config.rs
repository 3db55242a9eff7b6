//! Account manager configuration

use std::str::FromStr;

use serde::Deserialize;
use userdb_core::DEFAULT_BCRYPT_COST;

const DEFAULT_TEMP_USER_TTL_MINUTES: i64 = 24 * 60;

/// Ten years; anything longer is treated as a typo
pub const MAX_TEMP_USER_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_path: String,

    /// bcrypt cost factor for new password hashes
    pub bcrypt_cost: u32,

    /// How long an unverified registration is kept before it may be purged
    pub temp_user_ttl_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "userdb.sqlite3".to_string(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            temp_user_ttl_minutes: DEFAULT_TEMP_USER_TTL_MINUTES,
        }
    }
}

impl Config {
    /// Load configuration from `USERDB_*` environment variables, falling back
    /// to defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_path: std::env::var("USERDB_DATABASE_PATH")
                .unwrap_or(defaults.database_path),
            bcrypt_cost: env_or("USERDB_BCRYPT_COST", defaults.bcrypt_cost),
            temp_user_ttl_minutes: ttl_or_default(
                "USERDB_TEMP_USER_TTL_MINUTES",
                env_or("USERDB_TEMP_USER_TTL_MINUTES", defaults.temp_user_ttl_minutes),
            ),
        }
    }

    /// Age after which an unverified registration may be purged.
    ///
    /// Always positive: a zero or negative TTL would put the purge cutoff at
    /// or after now and delete registrations made a moment ago.
    pub fn temp_user_ttl(&self) -> chrono::Duration {
        let minutes = ttl_or_default("temp_user_ttl_minutes", self.temp_user_ttl_minutes);
        chrono::Duration::minutes(minutes)
    }
}

fn ttl_or_default(key: &str, minutes: i64) -> i64 {
    if (1..=MAX_TEMP_USER_TTL_MINUTES).contains(&minutes) {
        return minutes;
    }
    tracing::warn!(
        key = %key,
        value = minutes,
        max = MAX_TEMP_USER_TTL_MINUTES,
        "Temporary user TTL out of range, using default"
    );
    DEFAULT_TEMP_USER_TTL_MINUTES
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = %key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
        Err(_) => default,
    }
}

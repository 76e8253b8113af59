use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Process configuration, read from the environment (optionally seeded by a `.env` file).
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL, e.g. `sqlite://alkifor.db`.
    pub database_url: String,
    /// Upper bound of the store connection pool.
    pub max_connections: u32,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Root of the upload tree; attachments live in `<upload_dir>/properties`.
    pub upload_dir: PathBuf,
    /// Owner assigned to new properties when the request names none.
    pub default_owner_id: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://alkifor.db".to_string());
        let upload_dir = lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string());

        Ok(Self {
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            port: parse_or(&lookup, "PORT", 3000)?,
            upload_dir: PathBuf::from(upload_dir),
            default_owner_id: parse_or(&lookup, "DEFAULT_OWNER_ID", 1)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}

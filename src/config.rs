use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_pool_size: u32,
    pub db_connect_timeout: Duration,
    pub db_idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `PORT` and `HOST` must parse;
    /// pool settings fall back to their defaults when they don't.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT").unwrap_or_else(|| "3000".to_string()).parse().context("PORT")?;

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite://movies.db?mode=rwc".to_string());

        let db_max_pool_size: u32 =
            var("DB_MAX_POOL_SIZE").and_then(|s| s.parse().ok()).unwrap_or(10);

        let db_connect_timeout_ms: u64 =
            var("DB_CONNECT_TIMEOUT_MS").and_then(|s| s.parse().ok()).unwrap_or(5_000);

        let db_idle_timeout_ms: u64 =
            var("DB_IDLE_TIMEOUT_MS").and_then(|s| s.parse().ok()).unwrap_or(45_000);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_max_pool_size,
            db_connect_timeout: Duration::from_millis(db_connect_timeout_ms),
            db_idle_timeout: Duration::from_millis(db_idle_timeout_ms),
        })
    }

    /// Single-connection in-memory SQLite. Every connection to `sqlite::memory:`
    /// opens its own database, so the pool must never grow past one.
    pub fn in_memory() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: "sqlite::memory:".to_string(),
            db_max_pool_size: 1,
            db_connect_timeout: Duration::from_secs(5),
            db_idle_timeout: Duration::from_secs(3_600),
        }
    }
}

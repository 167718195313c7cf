//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address to listen on (default: 0.0.0.0:4000).
    pub addr: String,

    /// PostgreSQL connection URL. When None, snippets and users are kept in memory.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL. When None, sessions are kept in memory.
    pub redis_url: Option<String>,

    /// Path to the template directory (default: ./templates).
    pub templates_dir: PathBuf,

    /// Path to the static asset directory (default: ./static).
    pub static_dir: PathBuf,

    /// Fixed session lifetime measured from creation (default: 12 hours).
    pub session_lifetime: Duration,

    /// Whether the session cookie carries the `Secure` attribute (default: true).
    pub cookie_secure: bool,

    /// Per-request timeout enforced at the transport boundary (default: 10 seconds).
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let addr = env::var("ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url = env::var("REDIS_URL").ok().filter(|v| !v.is_empty());

        let templates_dir = env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./templates"));

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));

        let session_lifetime_hours: u64 = env::var("SESSION_LIFETIME_HOURS")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .context("SESSION_LIFETIME_HOURS must be a whole number of hours")?;
        let session_lifetime = hours(session_lifetime_hours)
            .context("SESSION_LIFETIME_HOURS is too large")?;

        let cookie_secure = parse_bool(
            &env::var("COOKIE_SECURE").unwrap_or_else(|_| "true".to_string()),
        )
        .context("COOKIE_SECURE must be true or false")?;

        let request_timeout_secs: u64 = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid u64")?;

        Ok(Self {
            addr,
            database_url,
            database_max_connections,
            redis_url,
            templates_dir,
            static_dir,
            session_lifetime,
            cookie_secure,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

fn hours(n: u64) -> Result<Duration> {
    n.checked_mul(3600)
        .map(Duration::from_secs)
        .with_context(|| format!("{n} hours overflows a duration in seconds"))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised boolean value {other:?}"),
    }
}

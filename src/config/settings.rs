//! Application settings loaded from environment variables.

use std::env;

use chrono::{Duration, Utc};
use thiserror::Error;

use super::constants::{
    DEFAULT_AUTH_COOKIE_NAME, DEFAULT_DATABASE_URL, DEFAULT_JWT_EXPIRES_IN, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, MIN_JWT_SECRET_LENGTH,
};

/// Startup configuration errors. The process refuses to start on any of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET environment variable must be set")]
    MissingJwtSecret,

    #[error("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LENGTH)]
    WeakJwtSecret,

    #[error("JWT_EXPIRES_IN is not a valid duration: {0}")]
    InvalidTokenTtl(String),

    #[error("SERVER_PORT is not a valid port: {0}")]
    InvalidPort(String),
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    jwt_secret: String,
    pub token_ttl: Duration,
    pub server_host: String,
    pub server_port: u16,
    pub auth_cookie_name: String,
    pub auth_cookie_secure: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("auth_cookie_name", &self.auth_cookie_name)
            .field("auth_cookie_secure", &self.auth_cookie_secure)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment (after reading `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingJwtSecret)?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::WeakJwtSecret);
        }

        let ttl_raw = lookup("JWT_EXPIRES_IN").unwrap_or_else(|| DEFAULT_JWT_EXPIRES_IN.to_string());
        let token_ttl = parse_ttl(&ttl_raw).ok_or(ConfigError::InvalidTokenTtl(ttl_raw))?;

        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_SERVER_PORT,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            token_ttl,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port,
            auth_cookie_name: lookup("AUTH_COOKIE_NAME")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_AUTH_COOKIE_NAME.to_string()),
            auth_cookie_secure: lookup("AUTH_COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or bare seconds.
///
/// Lifetimes that would push an expiry past the representable date range are rejected.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    if amount <= 0 {
        return None;
    }

    let ttl = match unit.trim() {
        "" | "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    }?;

    Utc::now().checked_add_signed(ttl).map(|_| ttl)
}

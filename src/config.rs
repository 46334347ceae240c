//! Application configuration, read from environment variables. Nothing
//! here parses an HTTP request or applies a rate limiter — this module
//! only holds the values an external transport layer would consult.

use std::env;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// CORS origins a transport should allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Parsed, trimmed, non-empty origins from `CORS_ORIGINS`.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl CorsConfig {
    /// Reads `CORS_ORIGINS` (comma-separated), defaulting to
    /// `http://localhost:8000` if unset.
    #[must_use]
    pub fn from_env() -> Self {
        let raw = env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:8000".to_owned());
        let allowed_origins = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        Self { allowed_origins }
    }
}

/// Rate limiting configuration. The limiter itself is an external
/// collaborator; this crate only carries the configured values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Whether rate limiting should be enforced by the transport layer.
    pub enabled: bool,
    /// Allowed requests per minute, per client.
    pub requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RateLimitConfig {
    /// Reads `RATE_LIMIT_ENABLED` (default true) and `RATE_LIMIT_RPM`
    /// (default 60).
    #[must_use]
    pub fn from_env() -> Self {
        let enabled = match env::var("RATE_LIMIT_ENABLED") {
            Ok(v) => parse_bool(&v, true),
            Err(_) => true,
        };
        let requests_per_minute = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        Self {
            enabled,
            requests_per_minute,
        }
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => default,
    }
}

/// Session-signing configuration: the HMAC secret and the token lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Secret key the process-wide [`crate::session::SessionSigner`] is
    /// keyed with.
    pub secret_key: String,
    /// Session TTL (`SESSION_TTL_SECS`, default 3600s), used both for the
    /// signed token's max age and the store entry's TTL.
    pub session_ttl: Duration,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SecurityConfig {
    /// Reads `SECRET_KEY`, generating a fresh random one if absent — the
    /// secret only needs to be stable for this process's lifetime, not
    /// across restarts, unless the deployer pins it. Reads
    /// `SESSION_TTL_SECS`, defaulting to 3600.
    #[must_use]
    pub fn from_env() -> Self {
        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| generate_secret());
        let session_ttl = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(Duration::from_secs(3600), Duration::from_secs);
        Self {
            secret_key,
            session_ttl,
        }
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Redis connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Redis host.
    pub host: String,
    /// Redis port.
    pub port: u16,
    /// Redis logical database index.
    pub db: u8,
    /// Redis password, if any.
    pub password: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RedisConfig {
    /// Reads `REDIS_HOST`/`REDIS_PORT`/`REDIS_DB`/`REDIS_PASSWORD`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_owned()),
            port: env::var("REDIS_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(6379),
            db: env::var("REDIS_DB").ok().and_then(|v| v.parse().ok()).unwrap_or(0),
            password: env::var("REDIS_PASSWORD").ok(),
        }
    }

    /// Builds a `redis://` connection URL from the configured fields.
    #[must_use]
    pub fn url(&self) -> String {
        let auth = self
            .password
            .as_ref()
            .map_or_else(String::new, |p| format!(":{p}@"));
        format!("redis://{auth}{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Top-level application configuration, assembled from the deployment
/// environment variables plus `SESSION_TTL_SECS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Whether the deployment is running in debug mode (`DEBUG`).
    pub debug: bool,
    /// Bind host (`HOST`, default `0.0.0.0`).
    pub host: String,
    /// Bind port (`PORT`, default `8000`).
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,
    /// Security/session-signing configuration.
    pub security: SecurityConfig,
    /// Redis configuration, consumed by `crate::session::open_store`.
    pub redis: RedisConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl AppConfig {
    /// Loads a local `.env` file if one is present (`dotenvy` is a no-op
    /// otherwise) and assembles the configuration from the process
    /// environment.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            debug: env::var("DEBUG").is_ok_and(|v| parse_bool(&v, false)),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_owned()),
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8000),
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            security: SecurityConfig::from_env(),
            redis: RedisConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CorsConfig, RedisConfig};

    #[test]
    fn redis_url_without_password() {
        let config = RedisConfig {
            host: "localhost".to_owned(),
            port: 6379,
            db: 0,
            password: None,
        };
        assert_eq!(config.url(), "redis://localhost:6379/0");
    }

    #[test]
    fn redis_url_with_password() {
        let config = RedisConfig {
            host: "redis.internal".to_owned(),
            port: 6380,
            db: 2,
            password: Some("hunter2".to_owned()),
        };
        assert_eq!(config.url(), "redis://:hunter2@redis.internal:6380/2");
    }

    #[test]
    fn cors_origins_split_and_trim() {
        // No other test in this crate reads or writes CORS_ORIGINS, so
        // setting then clearing it here can't race a concurrent test.
        unsafe {
            std::env::set_var("CORS_ORIGINS", " http://a.test , http://b.test ");
        }
        let cors = CorsConfig::from_env();
        unsafe {
            std::env::remove_var("CORS_ORIGINS");
        }
        assert_eq!(cors.allowed_origins, vec!["http://a.test", "http://b.test"]);
    }
}

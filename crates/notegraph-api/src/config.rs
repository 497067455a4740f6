//! Server configuration read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/notegraph` |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `FILE_STORAGE_PATH` | `/var/lib/notegraph/files` |
//! | `MAX_UPLOAD_BYTES` | 50 MiB |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000,http://localhost:5173` |
//! | `RUN_MIGRATIONS` | `true` |
//!
//! Logging variables (`LOG_FORMAT`, `LOG_FILE`, `LOG_ANSI`, `RUST_LOG`) are
//! read by the binary before anything else.

use std::str::FromStr;

use axum::http::HeaderValue;
use tracing::warn;

use notegraph_db::pool::DEFAULT_MAX_CONNECTIONS;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/notegraph";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FILE_STORAGE_PATH: &str = "/var/lib/notegraph/files";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Typed server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub file_storage_path: String,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<HeaderValue>,
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let allowed_origins = parse_allowed_origins(
            lookup("ALLOWED_ORIGINS")
                .as_deref()
                .unwrap_or(DEFAULT_ALLOWED_ORIGINS),
        );
        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or_default(&lookup, "PORT", DEFAULT_PORT),
            db_max_connections: parse_or_default(
                &lookup,
                "DB_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            ),
            file_storage_path: lookup("FILE_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_FILE_STORAGE_PATH.to_string()),
            max_upload_bytes: parse_or_default(
                &lookup,
                "MAX_UPLOAD_BYTES",
                DEFAULT_MAX_UPLOAD_BYTES,
            ),
            allowed_origins,
            run_migrations: lookup("RUN_MIGRATIONS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or_default<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "Invalid config value, using default");
            default
        }),
    }
}

/// Parse a comma-separated CORS origin whitelist, dropping invalid entries.
///
/// An empty or all-invalid list falls back to the default origins.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if parsed.is_empty() {
        return DEFAULT_ALLOWED_ORIGINS
            .split(',')
            .map(HeaderValue::from_static)
            .collect();
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("DB_MAX_CONNECTIONS", "25"),
            ("RUN_MIGRATIONS", "false"),
            ("ALLOWED_ORIGINS", "https://notes.example.com"),
        ]);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.db_max_connections, 25);
        assert!(!config.run_migrations);
        assert_eq!(config.allowed_origins, vec![HeaderValue::from_static("https://notes.example.com")]);
    }

    #[test]
    fn test_invalid_number_falls_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("MAX_UPLOAD_BYTES", "-1")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_parse_allowed_origins() {
        let origins = parse_allowed_origins("https://a.example, http://localhost:3000 ,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0].to_str().unwrap(), "https://a.example");

        let origins = parse_allowed_origins("");
        assert_eq!(origins.len(), 2, "empty list falls back to defaults");
    }
}

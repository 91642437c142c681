//! Application configuration loaded from environment variables.

use std::time::Duration;

use order_sync::BatchConfig;

/// Log line format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: Postgres URL; in-memory stores are used when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `BATCH_DEADLINE_MS`: per-batch deadline (default: `25000`)
/// - `BATCH_CONCURRENCY`: messages processed at once (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub batch_deadline_ms: u64,
    pub batch_concurrency: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(lookup("PORT"), defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_or(
                lookup("DATABASE_MAX_CONNECTIONS"),
                defaults.database_max_connections,
            ),
            batch_deadline_ms: parse_or(lookup("BATCH_DEADLINE_MS"), defaults.batch_deadline_ms),
            batch_concurrency: parse_or(lookup("BATCH_CONCURRENCY"), defaults.batch_concurrency),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the limits handed to the batch controller.
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            deadline: Duration::from_millis(self.batch_deadline_ms),
            concurrency: self.batch_concurrency.max(1),
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 5,
            batch_deadline_ms: 25_000,
            batch_concurrency: 10,
        }
    }
}

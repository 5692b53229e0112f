//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use inventory::OutcomeCacheConfig;
use saga::{ResilienceConfig, SagaConfig};

/// Default port of the hotel service.
pub const HOTEL_SERVICE_PORT: u16 = 8081;

/// Default port of the booking service.
pub const BOOKING_SERVICE_PORT: u16 = 8082;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: per service)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; in-memory stores when unset
/// - `HOTEL_SERVICE_URL`: hotel service base URL; the booking service embeds
///   the room owner when unset
/// - `MAX_BOOKING_DAYS` (default: 30)
/// - `IDEMPOTENCY_CACHE_CAPACITY` (default: 10000)
/// - `IDEMPOTENCY_TTL_SECS`: no expiry when unset
/// - `REMOTE_TIMEOUT_MS` (default: 3000)
/// - `REMOTE_MAX_RETRIES` (default: 3)
/// - `REMOTE_RETRY_BACKOFF_MS` (default: 100)
/// - `CIRCUIT_FAILURE_THRESHOLD` (default: 5)
/// - `CIRCUIT_OPEN_SECS` (default: 30)
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub hotel_service_url: Option<String>,
    pub max_booking_days: u32,
    pub idempotency_cache_capacity: usize,
    pub idempotency_ttl: Option<Duration>,
    pub remote_timeout: Duration,
    pub remote_max_retries: u32,
    pub remote_retry_backoff: Duration,
    pub circuit_failure_threshold: u32,
    pub circuit_open: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env(default_port: u16) -> Self {
        Self::from_lookup(default_port, |key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(default_port: u16, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::with_port(default_port);
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse_var(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
            database_url: non_empty("DATABASE_URL"),
            hotel_service_url: non_empty("HOTEL_SERVICE_URL"),
            max_booking_days: parse_var(&lookup, "MAX_BOOKING_DAYS")
                .unwrap_or(defaults.max_booking_days),
            idempotency_cache_capacity: parse_var(&lookup, "IDEMPOTENCY_CACHE_CAPACITY")
                .unwrap_or(defaults.idempotency_cache_capacity),
            idempotency_ttl: parse_var(&lookup, "IDEMPOTENCY_TTL_SECS").map(Duration::from_secs),
            remote_timeout: parse_var(&lookup, "REMOTE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.remote_timeout),
            remote_max_retries: parse_var(&lookup, "REMOTE_MAX_RETRIES")
                .unwrap_or(defaults.remote_max_retries),
            remote_retry_backoff: parse_var(&lookup, "REMOTE_RETRY_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.remote_retry_backoff),
            circuit_failure_threshold: parse_var(&lookup, "CIRCUIT_FAILURE_THRESHOLD")
                .unwrap_or(defaults.circuit_failure_threshold),
            circuit_open: parse_var(&lookup, "CIRCUIT_OPEN_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.circuit_open),
        }
    }

    /// Returns the defaults for a service listening on `port`.
    pub fn with_port(port: u16) -> Self {
        let resilience = ResilienceConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            hotel_service_url: None,
            max_booking_days: SagaConfig::default().max_booking_days,
            idempotency_cache_capacity: OutcomeCacheConfig::default().capacity,
            idempotency_ttl: None,
            remote_timeout: resilience.timeout,
            remote_max_retries: resilience.max_retries,
            remote_retry_backoff: resilience.retry_backoff,
            circuit_failure_threshold: resilience.failure_threshold,
            circuit_open: resilience.open_duration,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn saga_config(&self) -> SagaConfig {
        SagaConfig {
            max_booking_days: self.max_booking_days,
        }
    }

    pub fn cache_config(&self) -> OutcomeCacheConfig {
        OutcomeCacheConfig {
            capacity: self.idempotency_cache_capacity,
            ttl: self.idempotency_ttl,
        }
    }

    pub fn resilience_config(&self) -> ResilienceConfig {
        ResilienceConfig {
            timeout: self.remote_timeout,
            max_retries: self.remote_max_retries,
            retry_backoff: self.remote_retry_backoff,
            failure_threshold: self.circuit_failure_threshold,
            open_duration: self.circuit_open,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self::with_port(HOTEL_SERVICE_PORT)
    }
}

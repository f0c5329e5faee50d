// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Client configuration: credentials, batching, retry, and sampling knobs.
//!
//! All fields are public and the struct implements [`Default`], so call
//! sites can override just what they need:
//!
//! ```rust
//! use driftlog_client::config::Config;
//!
//! let config = Config {
//!     api_url: Some("http://localhost:8080".to_string()),
//!     api_key: Some("dl_test_key".to_string()),
//!     service: Some("checkout".to_string()),
//!     batch_size: 50,
//!     ..Default::default()
//! };
//! ```

use std::env;
use std::time::Duration;

/// Default number of records accumulated before a size-triggered flush.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default interval between timer-driven flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(5000);

/// Default queue capacity; enqueues past this evict the oldest records.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 10_000;

/// Default number of retries after a failed batch send.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential retry backoff.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default consecutive-failure count that opens the circuit breaker.
pub const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 5;

/// Default cooldown before an open breaker admits a trial call.
pub const DEFAULT_CIRCUIT_BREAKER_RESET: Duration = Duration::from_millis(30_000);

/// Default breadcrumb ring-buffer capacity.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// Options consumed once at [`Client`](crate::client::Client) construction.
///
/// Credentials are given either as a single `dsn` connection string or as
/// the explicit `api_url` + `api_key` pair; the DSN wins when both are set.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string, e.g. `https://dl_APIKEY@ingest.example.com`.
    pub dsn: Option<String>,
    /// Collector base URL (alternative to `dsn`).
    pub api_url: Option<String>,
    /// API key (alternative to `dsn`).
    pub api_key: Option<String>,
    /// Service name attached to every log record and span resource.
    pub service: Option<String>,
    /// Deployment environment (e.g. `production`, `staging`).
    pub environment: Option<String>,
    /// Release or version identifier.
    pub release: Option<String>,
    /// Queue length that triggers an immediate flush.
    pub batch_size: usize,
    /// Interval between timer-driven flushes.
    pub flush_interval: Duration,
    /// Queue capacity before FIFO eviction of the oldest records.
    pub max_buffer_size: usize,
    /// Retries after a failed batch send before the batch is dropped.
    pub max_retries: u32,
    /// Base delay for exponential retry backoff.
    pub retry_delay: Duration,
    /// Consecutive send failures that open the circuit breaker.
    pub circuit_breaker_threshold: u32,
    /// Cooldown before an open breaker admits a trial call.
    pub circuit_breaker_reset: Duration,
    /// Breadcrumb ring-buffer capacity (per scope and client-global).
    pub max_breadcrumbs: usize,
    /// Uniform span sampling probability in `[0.0, 1.0]`.
    pub traces_sample_rate: f64,
    /// Upgrade delivery give-up diagnostics to `warn!` level.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dsn: None,
            api_url: None,
            api_key: None,
            service: None,
            environment: None,
            release: None,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            circuit_breaker_threshold: DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
            circuit_breaker_reset: DEFAULT_CIRCUIT_BREAKER_RESET,
            max_breadcrumbs: DEFAULT_MAX_BREADCRUMBS,
            traces_sample_rate: 1.0,
            debug: false,
        }
    }
}

impl Config {
    /// Builds a configuration from the defaults overlaid with the
    /// `DRIFTLOG_*` environment variables.
    ///
    /// Recognized variables: `DRIFTLOG_DSN`, `DRIFTLOG_SERVICE`,
    /// `DRIFTLOG_ENVIRONMENT`, `DRIFTLOG_RELEASE`, `DRIFTLOG_DEBUG`
    /// (`1`/`true` enable debug diagnostics).
    #[must_use]
    pub fn from_env() -> Config {
        Config {
            dsn: env::var("DRIFTLOG_DSN").ok(),
            service: env::var("DRIFTLOG_SERVICE").ok(),
            environment: env::var("DRIFTLOG_ENVIRONMENT").ok(),
            release: env::var("DRIFTLOG_RELEASE").ok(),
            debug: env::var("DRIFTLOG_DEBUG")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.flush_interval, Duration::from_millis(5000));
        assert_eq!(config.max_buffer_size, 10_000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
        assert_eq!(config.circuit_breaker_threshold, 5);
        assert_eq!(config.circuit_breaker_reset, Duration::from_millis(30_000));
        assert_eq!(config.max_breadcrumbs, 100);
        assert!((config.traces_sample_rate - 1.0).abs() < f64::EPSILON);
        assert!(!config.debug);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("DRIFTLOG_DSN", "https://dl_key@ingest.example.com");
        env::set_var("DRIFTLOG_SERVICE", "billing");
        env::set_var("DRIFTLOG_DEBUG", "true");
        let config = Config::from_env();
        assert_eq!(
            config.dsn.as_deref(),
            Some("https://dl_key@ingest.example.com")
        );
        assert_eq!(config.service.as_deref(), Some("billing"));
        assert!(config.debug);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        env::remove_var("DRIFTLOG_DSN");
        env::remove_var("DRIFTLOG_SERVICE");
        env::remove_var("DRIFTLOG_DEBUG");
    }

    #[test]
    #[serial]
    fn test_from_env_unset() {
        env::remove_var("DRIFTLOG_DSN");
        env::remove_var("DRIFTLOG_DEBUG");
        let config = Config::from_env();
        assert!(config.dsn.is_none());
        assert!(!config.debug);
    }
}

//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::limiter::RateLimitConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of entries the recipe cache can hold
    pub max_entries: usize,
    /// Default TTL in milliseconds for cached recipes
    pub default_ttl_ms: u64,
    /// Minimum query similarity for serving a cached recipe to a new query
    pub similarity_threshold: f64,
    /// Generate requests allowed per client within the window
    pub rate_limit_max_attempts: usize,
    /// Sliding window length in milliseconds
    pub rate_limit_window_ms: u64,
    /// How long a client stays blocked once over the limit
    pub rate_limit_block_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds, 0 disables the task
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL_MS` - Recipe TTL in milliseconds (default: 3600000)
    /// - `SIMILARITY_THRESHOLD` - Similar-recipe cutoff (default: 0.85)
    /// - `RATE_LIMIT_MAX_ATTEMPTS` - Requests per window (default: 5)
    /// - `RATE_LIMIT_WINDOW_MS` - Window length (default: 60000)
    /// - `RATE_LIMIT_BLOCK_MS` - Block duration (default: 900000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            similarity_threshold: env_or("SIMILARITY_THRESHOLD", defaults.similarity_threshold),
            rate_limit_max_attempts: env_or(
                "RATE_LIMIT_MAX_ATTEMPTS",
                defaults.rate_limit_max_attempts,
            ),
            rate_limit_window_ms: env_or("RATE_LIMIT_WINDOW_MS", defaults.rate_limit_window_ms),
            rate_limit_block_ms: env_or("RATE_LIMIT_BLOCK_MS", defaults.rate_limit_block_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Limits applied to `POST /recipes/generate`.
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(
            self.rate_limit_max_attempts,
            self.rate_limit_window_ms,
            self.rate_limit_block_ms,
        )
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_ms: 3_600_000,
            similarity_threshold: 0.85,
            rate_limit_max_attempts: 5,
            rate_limit_window_ms: 60_000,
            rate_limit_block_ms: 900_000,
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

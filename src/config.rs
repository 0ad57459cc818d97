//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Shortest allowed sweep interval; zero would busy-loop on the store lock
pub const MIN_CLEANUP_INTERVAL_SECS: u64 = 1;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Soft cap on the number of cached entries
    pub max_entries: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// Soft cap on the estimated memory usage in bytes
    pub memory_limit_bytes: usize,
    /// Expiration sweep interval in seconds
    pub cleanup_interval_secs: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Soft entry cap (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_MEMORY_LIMIT` - Soft memory cap in bytes (default: 50 MB)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds, at least 1 (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries),
            default_ttl_ms: env_or("CACHE_DEFAULT_TTL_MS", defaults.default_ttl_ms),
            memory_limit_bytes: env_or("CACHE_MEMORY_LIMIT", defaults.memory_limit_bytes),
            cleanup_interval_secs: env_or("CACHE_CLEANUP_INTERVAL", defaults.cleanup_interval_secs)
                .max(MIN_CLEANUP_INTERVAL_SECS),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Sweep interval as a Duration, never shorter than one second.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(MIN_CLEANUP_INTERVAL_SECS))
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_ms: 5 * 60 * 1000,
            memory_limit_bytes: 50 * 1024 * 1024,
            cleanup_interval_secs: 60,
            server_port: 3000,
        }
    }
}

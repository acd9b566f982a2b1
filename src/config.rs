//! Configuration Module
//!
//! Handles loading process configuration from environment variables.

use std::env;

/// Process configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection string; `None` selects the in-memory store
    pub redis_url: Option<String>,
    /// Default TTL in seconds for the `app` instance
    pub default_ttl: u64,
    /// Namespace of the `app` instance
    pub default_namespace: String,
    /// Admin HTTP server port
    pub server_port: u16,
    /// Memory store sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis connection string (default: unset, in-memory store)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 600)
    /// - `CACHE_NAMESPACE` - Default namespace (default: "app")
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            default_ttl: parse_var("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            default_namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_namespace),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cleanup_interval),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            default_ttl: 600,
            default_namespace: "app".to_string(),
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

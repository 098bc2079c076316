//! Configuration management for the Doorlist server.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Demo data seeding
    pub seed: SeedConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level filter applied when `RUST_LOG` is unset
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Demo data seeding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Seed a demo event and attendees on startup
    pub demo_data: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a default, so a bare environment always yields a
    /// runnable configuration:
    ///
    /// - `DOORLIST_HOST` (default `0.0.0.0`)
    /// - `DOORLIST_PORT` (default `8080`)
    /// - `DOORLIST_LOG` (default `doorlist_engine=info,tower_http=debug`)
    /// - `DOORLIST_SHUTDOWN_TIMEOUT` seconds (default `30`)
    /// - `DOORLIST_SEED_DEMO_DATA` (default `true`)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("DOORLIST_HOST", "0.0.0.0"),
                port: env_parse_or("DOORLIST_PORT", 8080),
                log_level: env_or("DOORLIST_LOG", "doorlist_engine=info,tower_http=debug"),
                shutdown_timeout: env_parse_or("DOORLIST_SHUTDOWN_TIMEOUT", 30),
            },
            seed: SeedConfig {
                demo_data: env_parse_or("DOORLIST_SEED_DEMO_DATA", true),
            },
        }
    }
}

/// Read an environment variable with a default.
fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable, falling back on the default if
/// unset or unparseable.
fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

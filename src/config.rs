//! Configuration Module
//!
//! Handles loading session and diagnostics-server settings from environment variables.

use std::env;
use std::time::Duration;

/// Session configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Delay in milliseconds before each queued request runs
    pub pacing_ms: u64,
    /// Serialize concurrent instance-data producers for the same key
    pub single_flight: bool,
    /// Diagnostics HTTP server port
    pub server_port: u16,
    /// Stats reporter interval in seconds
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PACING_MS` - Inter-request pacing delay (default: 25)
    /// - `SINGLE_FLIGHT` - `true`/`false`, guard instance producers (default: true)
    /// - `SERVER_PORT` - Diagnostics server port (default: 3000)
    /// - `STATS_INTERVAL` - Stats log frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pacing_ms: parse_var("PACING_MS").unwrap_or(defaults.pacing_ms),
            single_flight: parse_var("SINGLE_FLIGHT").unwrap_or(defaults.single_flight),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            stats_interval: parse_var("STATS_INTERVAL").unwrap_or(defaults.stats_interval),
        }
    }

    /// Pacing interval as a Duration.
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pacing_ms: 25,
            single_flight: true,
            server_port: 3000,
            stats_interval: 30,
        }
    }
}
